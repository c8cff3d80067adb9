/**
 * User Model and Database Operations
 *
 * Users are created on first sign-in and keyed by the `sub` claim of their
 * identity-provider token. Profile fields are refreshed on every request so
 * a changed email or display name shows up without extra endpoints.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::backend::auth::verifier::Claims;
use crate::shared::UserView;

/// User struct representing a row of the `users` table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID)
    pub id: Uuid,
    /// Subject claim of the identity provider (unique)
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture_url: Option<String>,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
    /// Updated at timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            picture_url: user.picture_url,
        }
    }
}

/// Profile data taken from a verified token
#[derive(Debug, Clone)]
pub struct NewUser {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture_url: Option<String>,
}

impl From<&Claims> for NewUser {
    fn from(claims: &Claims) -> Self {
        Self {
            subject: claims.sub.clone(),
            email: claims.email.clone(),
            name: claims.name.clone(),
            picture_url: claims.picture.clone(),
        }
    }
}

/// Insert a user or refresh the profile of an existing one
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `new_user` - Profile from the verified token
///
/// # Returns
/// The stored user; the id never changes for a given subject
pub async fn upsert_user(pool: &SqlitePool, new_user: &NewUser) -> Result<User, sqlx::Error> {
    let now = Utc::now();

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, subject, email, name, picture_url, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (subject) DO UPDATE SET
            email = excluded.email,
            name = excluded.name,
            picture_url = excluded.picture_url,
            updated_at = excluded.updated_at
        RETURNING id, subject, email, name, picture_url, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new_user.subject)
    .bind(&new_user.email)
    .bind(&new_user.name)
    .bind(&new_user.picture_url)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

/// Get user by ID
///
/// # Returns
/// User or None if not found
pub async fn get_user_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, subject, email, name, picture_url, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}
