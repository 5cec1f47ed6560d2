//! Backend-owned user accounts.

use serde::{Deserialize, Serialize};

use super::UserId;

/// A user account as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Account key.
    #[serde(rename = "user_id")]
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Job title, free text (e.g. "cashier", "manager").
    pub position: String,
}

/// Payload for creating a user; the backend assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Login name.
    pub username: String,
    /// Job title.
    pub position: String,
}
