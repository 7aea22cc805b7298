use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{NotificationId, UserId};

/// An in-app notification for a user.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a notification row
    pub async fn create(
        user_id: UserId,
        title: &str,
        body: &str,
        data: serde_json::Value,
        pool: &PgPool,
    ) -> Result<Self> {
        let notification = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO notifications (id, user_id, title, body, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(NotificationId::new())
        .bind(user_id)
        .bind(title)
        .bind(body)
        .bind(data)
        .fetch_one(pool)
        .await?;
        Ok(notification)
    }

    /// List notifications, newest first, optionally unread only
    pub async fn list(
        user_id: UserId,
        unread_only: bool,
        after: Option<Uuid>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let notifications = sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM notifications
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR id < $2)
              AND (NOT $3 OR read = FALSE)
            ORDER BY id DESC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(after)
        .bind(unread_only)
        .bind(limit + 1)
        .fetch_all(pool)
        .await?;
        Ok(notifications)
    }

    /// Mark one notification read
    pub async fn mark_read(id: NotificationId, user_id: UserId, pool: &PgPool) -> Result<Self> {
        let notification = sqlx::query_as::<_, Self>(
            "UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(notification)
    }

    /// Mark all of a user's notifications read, returning how many changed
    pub async fn mark_all_read(user_id: UserId, pool: &PgPool) -> Result<u64> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE")
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Delete a notification. Idempotent.
    pub async fn delete(id: NotificationId, user_id: UserId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
