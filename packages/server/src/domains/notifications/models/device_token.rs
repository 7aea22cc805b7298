use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{DeviceTokenId, UserId};

/// An Expo push token registered by the mobile client.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceToken {
    pub id: DeviceTokenId,
    pub user_id: UserId,
    pub token: String,
    pub platform: String,
    pub created_at: DateTime<Utc>,
}

impl DeviceToken {
    /// Register a token. Re-registering an existing token refreshes its
    /// platform instead of erroring.
    pub async fn register(
        user_id: UserId,
        token: &str,
        platform: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        let device_token = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO device_tokens (id, user_id, token, platform)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, token)
            DO UPDATE SET platform = EXCLUDED.platform
            RETURNING *
            "#,
        )
        .bind(DeviceTokenId::new())
        .bind(user_id)
        .bind(token)
        .bind(platform)
        .fetch_one(pool)
        .await?;
        Ok(device_token)
    }

    /// Remove a token. Idempotent.
    pub async fn unregister(user_id: UserId, token: &str, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM device_tokens WHERE user_id = $1 AND token = $2")
            .bind(user_id)
            .bind(token)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// All push tokens for a user
    pub async fn find_for_user(user_id: UserId, pool: &PgPool) -> Result<Vec<Self>> {
        let tokens =
            sqlx::query_as::<_, Self>("SELECT * FROM device_tokens WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(pool)
                .await?;
        Ok(tokens)
    }
}
