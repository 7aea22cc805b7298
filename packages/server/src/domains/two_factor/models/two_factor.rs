use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::UserId;

/// Per-user two-factor state: TOTP secret plus hashed backup codes.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TwoFactor {
    pub user_id: UserId,
    #[serde(skip_serializing)]
    pub totp_secret: String,
    /// JSON array of argon2 hashes; codes are removed as they are used.
    #[serde(skip_serializing)]
    pub backup_codes: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl TwoFactor {
    /// Find the two-factor record for a user
    pub async fn find_for_user(user_id: UserId, pool: &PgPool) -> Result<Option<Self>> {
        let record = sqlx::query_as::<_, Self>("SELECT * FROM two_factor WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        Ok(record)
    }

    /// Create or replace the two-factor record for a user
    pub async fn upsert(
        user_id: UserId,
        totp_secret: &str,
        backup_code_hashes: &[String],
        pool: &PgPool,
    ) -> Result<Self> {
        let record = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO two_factor (user_id, totp_secret, backup_codes)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET totp_secret = EXCLUDED.totp_secret,
                          backup_codes = EXCLUDED.backup_codes
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(totp_secret)
        .bind(serde_json::to_value(backup_code_hashes)?)
        .fetch_one(pool)
        .await?;
        Ok(record)
    }

    /// Replace the stored backup codes (after one is consumed)
    pub async fn update_backup_codes(
        user_id: UserId,
        backup_code_hashes: &[String],
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query("UPDATE two_factor SET backup_codes = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(serde_json::to_value(backup_code_hashes)?)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Delete the two-factor record for a user
    pub async fn delete(user_id: UserId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM two_factor WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// The stored backup code hashes as a vector.
    pub fn backup_code_hashes(&self) -> Result<Vec<String>> {
        serde_json::from_value(self.backup_codes.clone())
            .map_err(|e| anyhow::anyhow!("Corrupt backup codes: {}", e))
    }
}
