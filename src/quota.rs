//! Private-area quota arithmetic.
//!
//! The ceiling is a per-user byte limit; usage is always read fresh from
//! storage, so files stored earlier in a batch count against the ones that
//! follow it.

use crate::error::Result;
use crate::model::user::User;
use crate::security::policy::AccessPolicy;
use crate::security::{Capability, UserContext};
use crate::storage::{FileAreaKey, FileStorage};

/// The byte ceiling applied to a user's private area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaCeiling {
    /// Hard ceiling in bytes.
    Limited(u64),
    /// No ceiling. Granted by capability, never by a sentinel value.
    Unlimited,
}

impl QuotaCeiling {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }
}

/// Resolve the ceiling for a user: the configured default, lifted entirely
/// when the user holds [`Capability::IgnoreQuota`].
pub fn ceiling_for(
    user: &User,
    context: &UserContext,
    policy: &dyn AccessPolicy,
    default_bytes: u64,
) -> QuotaCeiling {
    if policy.has_capability(user, Capability::IgnoreQuota, context) {
        QuotaCeiling::Unlimited
    } else {
        QuotaCeiling::Limited(default_bytes)
    }
}

/// Pre-flight check: would adding `incoming_bytes` to the area push it over
/// the ceiling?
pub fn would_exceed(
    storage: &dyn FileStorage,
    area: &FileAreaKey,
    ceiling: QuotaCeiling,
    incoming_bytes: u64,
) -> Result<bool> {
    match ceiling {
        QuotaCeiling::Unlimited => Ok(false),
        QuotaCeiling::Limited(max) => {
            let used = storage.area_bytes_used(area)?;
            Ok(used.saturating_add(incoming_bytes) > max)
        }
    }
}
