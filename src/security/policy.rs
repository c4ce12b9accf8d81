//! Access policy and user directory seams.
//!
//! The delivery handler never inspects grant tables itself; it asks these
//! traits. The shipped implementation is a static, config-backed store.

use std::collections::HashMap;

use super::{Capability, UserContext};
use crate::model::user::User;

/// Answers "does this user hold this capability in this context?".
pub trait AccessPolicy {
    fn has_capability(&self, user: &User, capability: Capability, context: &UserContext) -> bool;
}

/// Resolves the user a validated inbound record refers to.
pub trait UserDirectory {
    fn user(&self, user_id: u64) -> Option<User>;
}

/// Capability grants for one user, as loaded from configuration.
#[derive(Debug, Clone)]
pub struct Grants {
    /// May store files in the own private area.
    pub manage_own_files: bool,
    /// Exempt from the private-area quota ceiling.
    pub ignore_quota: bool,
}

impl Default for Grants {
    fn default() -> Self {
        Self {
            manage_own_files: true,
            ignore_quota: false,
        }
    }
}

/// Static in-memory user store backing both seams.
///
/// Grants only apply within the user's own context: no grant ever lets a
/// user write into someone else's private area.
#[derive(Debug, Default)]
pub struct StaticAccess {
    users: HashMap<u64, (User, Grants)>,
}

impl StaticAccess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with the given grants.
    pub fn insert(&mut self, user: User, grants: Grants) {
        self.users.insert(user.id, (user, grants));
    }

    /// Number of registered users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl AccessPolicy for StaticAccess {
    fn has_capability(&self, user: &User, capability: Capability, context: &UserContext) -> bool {
        if context.user_id != user.id {
            return false;
        }
        match self.users.get(&user.id) {
            Some((_, grants)) => match capability {
                Capability::ManageOwnFiles => grants.manage_own_files,
                Capability::IgnoreQuota => grants.ignore_quota,
            },
            None => false,
        }
    }
}

impl UserDirectory for StaticAccess {
    fn user(&self, user_id: u64) -> Option<User> {
        self.users.get(&user_id).map(|(user, _)| user.clone())
    }
}
