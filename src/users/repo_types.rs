use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,                       // unique user ID
    pub email: String,                 // login key, lower-cased
    pub password_hash: String,         // bcrypt hash
    pub refresh_token: Option<String>, // last issued refresh token, None after logout
    pub created_at: OffsetDateTime,    // creation timestamp
}
