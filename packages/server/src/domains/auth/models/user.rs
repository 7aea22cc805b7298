use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::UserId;

/// An account holder - an artist, manager, or label rep running promo.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub is_admin: bool,
    pub two_factor_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

impl User {
    /// Find user by ID
    pub async fn find_by_id(id: UserId, pool: &PgPool) -> Result<Self> {
        let user = sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(user)
    }

    /// Find user by email (case-insensitive)
    pub async fn find_by_email(email: &str, pool: &PgPool) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, Self>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    /// Create a new user
    pub async fn create(input: CreateUser, pool: &PgPool) -> Result<Self> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO users (id, email, password_hash, name)
            VALUES ($1, lower($2), $3, $4)
            RETURNING *
            "#,
        )
        .bind(UserId::new())
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(&input.name)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    /// Update profile fields (only the ones provided)
    pub async fn update_profile(
        id: UserId,
        name: Option<String>,
        email: Option<String>,
        pool: &PgPool,
    ) -> Result<Self> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE(lower($3), email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    /// Replace the password hash
    pub async fn update_password(id: UserId, password_hash: &str, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Flip the two-factor flag
    pub async fn set_two_factor_enabled(id: UserId, enabled: bool, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE users SET two_factor_enabled = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(enabled)
            .execute(pool)
            .await?;
        Ok(())
    }
}
