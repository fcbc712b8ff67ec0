use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    #[serde(rename = "user_name")]
    pub username: String,
    pub email: String,
    pub age: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Row to insert; id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub age: Option<i32>,
    pub created_at: OffsetDateTime,
}

/// Replacement values for an existing row.
///
/// `email: None` keeps the stored address, `age: None` clears it.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub username: String,
    pub email: Option<String>,
    pub age: Option<i32>,
}
