use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string
    pub skill: String,
    pub location: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub sport: Option<String>,
    #[serde(skip_serializing)]
    pub verification_code: String,
    pub created_at: OffsetDateTime,
}

/// Fields supplied at registration; `id` and `created_at` come from the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub skill: String,
    pub location: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub sport: Option<String>,
    pub verification_code: String,
}
