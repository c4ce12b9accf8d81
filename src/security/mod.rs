//! Capability checks and per-user security contexts.

pub mod policy;

use crate::model::user::User;

/// Capabilities consulted by the delivery pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Manage files in one's own private area. Required to store anything.
    ManageOwnFiles,
    /// Store files without a quota ceiling.
    IgnoreQuota,
}

impl Capability {
    /// Stable capability name, used in error messages and trace output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManageOwnFiles => "user:manageownfiles",
            Self::IgnoreQuota => "user:ignorequota",
        }
    }
}

/// The per-user security context files are stored against.
///
/// User contexts are the only context class in this crate, so context ids
/// mirror user ids. The id also names the top-level storage directory for
/// the user's file areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserContext {
    /// Context id.
    pub id: u64,
    /// The user this context belongs to.
    pub user_id: u64,
}

impl UserContext {
    /// Resolve the security context for a user.
    pub fn for_user(user: &User) -> Self {
        Self {
            id: user.id,
            user_id: user.id,
        }
    }
}
