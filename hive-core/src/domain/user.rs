//! Authenticated caller identity

use serde::{Deserialize, Serialize};

/// The caller resolved by a successful `security.validate` call.
///
/// Attached to the request context so downstream handlers know who is
/// calling without re-validating the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
}
