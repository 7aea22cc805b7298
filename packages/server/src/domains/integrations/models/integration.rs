use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{IntegrationId, UserId};

/// An outbound webhook endpoint a user has connected.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Integration {
    pub id: IntegrationId,
    pub user_id: UserId,
    pub name: String,
    pub target_url: String,
    /// HMAC key for delivery signatures. Generated server-side on create.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Event names this endpoint subscribes to, e.g. "campaign.sent"
    pub events: Vec<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateIntegration {
    pub name: String,
    pub target_url: String,
    #[serde(default)]
    pub events: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateIntegration {
    pub name: Option<String>,
    pub target_url: Option<String>,
    pub events: Option<Vec<String>>,
    pub enabled: Option<bool>,
}

fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

impl Integration {
    /// Find integration by ID, scoped to its owner
    pub async fn find_by_id(id: IntegrationId, user_id: UserId, pool: &PgPool) -> Result<Self> {
        let integration =
            sqlx::query_as::<_, Self>("SELECT * FROM integrations WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_one(pool)
                .await?;
        Ok(integration)
    }

    /// Create an integration with a fresh signing secret. The secret is
    /// only returned from this call.
    pub async fn create(user_id: UserId, input: CreateIntegration, pool: &PgPool) -> Result<Self> {
        let integration = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO integrations (id, user_id, name, target_url, secret, events)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(IntegrationId::new())
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.target_url)
        .bind(generate_secret())
        .bind(&input.events)
        .fetch_one(pool)
        .await?;
        Ok(integration)
    }

    /// List integrations, newest first, cursor-paginated
    pub async fn list(
        user_id: UserId,
        after: Option<Uuid>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let integrations = sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM integrations
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR id < $2)
            ORDER BY id DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(after)
        .bind(limit + 1)
        .fetch_all(pool)
        .await?;
        Ok(integrations)
    }

    /// Update an integration (only provided fields)
    pub async fn update(
        id: IntegrationId,
        user_id: UserId,
        input: UpdateIntegration,
        pool: &PgPool,
    ) -> Result<Self> {
        let integration = sqlx::query_as::<_, Self>(
            r#"
            UPDATE integrations
            SET name = COALESCE($3, name),
                target_url = COALESCE($4, target_url),
                events = COALESCE($5, events),
                enabled = COALESCE($6, enabled),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(input.name)
        .bind(input.target_url)
        .bind(input.events)
        .bind(input.enabled)
        .fetch_one(pool)
        .await?;
        Ok(integration)
    }

    /// Delete an integration. Idempotent.
    pub async fn delete(id: IntegrationId, user_id: UserId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM integrations WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Enabled integrations of a user subscribed to an event name
    pub async fn find_subscribed(
        user_id: UserId,
        event: &str,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let integrations = sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM integrations
            WHERE user_id = $1 AND enabled = TRUE AND $2 = ANY(events)
            "#,
        )
        .bind(user_id)
        .bind(event)
        .fetch_all(pool)
        .await?;
        Ok(integrations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secret_length_and_charset() {
        let secret = generate_secret();
        assert_eq!(secret.len(), 32);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_secrets_are_unique() {
        assert_ne!(generate_secret(), generate_secret());
    }
}
