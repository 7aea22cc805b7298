use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{SecurityEventId, UserId};

/// Security event type enum for type-safe querying
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventType {
    LoginSucceeded,
    LoginFailed,
    PasswordChanged,
    TwoFactorEnabled,
    TwoFactorDisabled,
    BackupCodeUsed,
}

impl std::fmt::Display for SecurityEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityEventType::LoginSucceeded => write!(f, "login_succeeded"),
            SecurityEventType::LoginFailed => write!(f, "login_failed"),
            SecurityEventType::PasswordChanged => write!(f, "password_changed"),
            SecurityEventType::TwoFactorEnabled => write!(f, "two_factor_enabled"),
            SecurityEventType::TwoFactorDisabled => write!(f, "two_factor_disabled"),
            SecurityEventType::BackupCodeUsed => write!(f, "backup_code_used"),
        }
    }
}

impl std::str::FromStr for SecurityEventType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "login_succeeded" => Ok(SecurityEventType::LoginSucceeded),
            "login_failed" => Ok(SecurityEventType::LoginFailed),
            "password_changed" => Ok(SecurityEventType::PasswordChanged),
            "two_factor_enabled" => Ok(SecurityEventType::TwoFactorEnabled),
            "two_factor_disabled" => Ok(SecurityEventType::TwoFactorDisabled),
            "backup_code_used" => Ok(SecurityEventType::BackupCodeUsed),
            _ => Err(anyhow::anyhow!("Invalid security event type: {}", s)),
        }
    }
}

/// Append-only audit trail of account security activity.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SecurityEvent {
    pub id: SecurityEventId,
    pub user_id: UserId,
    pub event_type: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SecurityEvent {
    /// Record a security event
    pub async fn record(
        user_id: UserId,
        event_type: SecurityEventType,
        ip_address: Option<String>,
        user_agent: Option<String>,
        pool: &PgPool,
    ) -> Result<Self> {
        let event = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO security_events (id, user_id, event_type, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(SecurityEventId::new())
        .bind(user_id)
        .bind(event_type.to_string())
        .bind(ip_address)
        .bind(user_agent)
        .fetch_one(pool)
        .await?;
        Ok(event)
    }

    /// Recent activity for a user, newest first (cursor-paginated)
    pub async fn list_for_user(
        user_id: UserId,
        after: Option<Uuid>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let events = sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM security_events
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
        Ok(events)
    }

    /// Count failed logins for a user since `since` that are newer than the
    /// last successful login. Used for account lockout.
    pub async fn failed_logins_since(
        user_id: UserId,
        since: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM security_events
            WHERE user_id = $1
              AND event_type = 'login_failed'
              AND created_at > $2
              AND created_at > COALESCE(
                  (SELECT MAX(created_at) FROM security_events
                   WHERE user_id = $1 AND event_type = 'login_succeeded'),
                  'epoch'::timestamptz
              )
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_event_type_roundtrip() {
        for event_type in [
            SecurityEventType::LoginSucceeded,
            SecurityEventType::LoginFailed,
            SecurityEventType::PasswordChanged,
            SecurityEventType::TwoFactorEnabled,
            SecurityEventType::TwoFactorDisabled,
            SecurityEventType::BackupCodeUsed,
        ] {
            let s = event_type.to_string();
            assert_eq!(SecurityEventType::from_str(&s).unwrap(), event_type);
        }
    }

    #[test]
    fn test_event_type_rejects_unknown() {
        assert!(SecurityEventType::from_str("selfie_uploaded").is_err());
    }
}
