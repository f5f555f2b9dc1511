//! Document types for the `users` collection.
//! Field names match the stored layout `{ _id, username, password }`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(rename = "password")]
    pub password_hash: String,
}
