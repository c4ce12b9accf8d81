//! User identity.

use serde::{Deserialize, Serialize};

/// A platform user able to own private files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Numeric user id, as referenced by inbound records.
    pub id: u64,

    /// Login name.
    pub username: String,

    /// Full display name; recorded as the author on stored files.
    pub full_name: String,

    /// Primary email address.
    pub email: String,
}
