use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{CampaignId, ContactId, EmailEventId};

/// Email event type enum - the delivery/engagement funnel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmailEventType {
    Queued,
    Sent,
    Delivered,
    Opened,
    Clicked,
    Bounced,
    Unsubscribed,
    Failed,
}

impl std::fmt::Display for EmailEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmailEventType::Queued => write!(f, "queued"),
            EmailEventType::Sent => write!(f, "sent"),
            EmailEventType::Delivered => write!(f, "delivered"),
            EmailEventType::Opened => write!(f, "opened"),
            EmailEventType::Clicked => write!(f, "clicked"),
            EmailEventType::Bounced => write!(f, "bounced"),
            EmailEventType::Unsubscribed => write!(f, "unsubscribed"),
            EmailEventType::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for EmailEventType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "queued" => Ok(EmailEventType::Queued),
            "sent" => Ok(EmailEventType::Sent),
            "delivered" => Ok(EmailEventType::Delivered),
            "opened" => Ok(EmailEventType::Opened),
            "clicked" => Ok(EmailEventType::Clicked),
            "bounced" => Ok(EmailEventType::Bounced),
            "unsubscribed" => Ok(EmailEventType::Unsubscribed),
            "failed" => Ok(EmailEventType::Failed),
            _ => Err(anyhow::anyhow!("Invalid email event type: {}", s)),
        }
    }
}

/// One delivery or engagement event for a campaign recipient.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmailEvent {
    pub id: EmailEventId,
    pub campaign_id: CampaignId,
    pub contact_id: ContactId,
    pub event_type: String,
    pub provider_message_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl EmailEvent {
    /// Record an event
    pub async fn record(
        campaign_id: CampaignId,
        contact_id: ContactId,
        event_type: EmailEventType,
        provider_message_id: Option<String>,
        pool: &PgPool,
    ) -> Result<Self> {
        let event = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO email_events (id, campaign_id, contact_id, event_type, provider_message_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(EmailEventId::new())
        .bind(campaign_id)
        .bind(contact_id)
        .bind(event_type.to_string())
        .bind(provider_message_id)
        .fetch_one(pool)
        .await?;
        Ok(event)
    }

    /// Find the campaign/contact pair a provider message id belongs to.
    /// Used when ingesting provider webhooks that only carry the id.
    pub async fn find_by_provider_message_id(
        provider_message_id: &str,
        pool: &PgPool,
    ) -> Result<Option<(CampaignId, ContactId)>> {
        let row: Option<(CampaignId, ContactId)> = sqlx::query_as(
            r#"
            SELECT campaign_id, contact_id
            FROM email_events
            WHERE provider_message_id = $1
            ORDER BY occurred_at ASC
            LIMIT 1
            "#,
        )
        .bind(provider_message_id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }
}

/// Count of one event type within a campaign funnel.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct EventCount {
    pub event_type: String,
    pub count: i64,
}

impl EventCount {
    /// Per-event-type counts for one campaign. Opens/clicks count distinct
    /// contacts so repeat opens don't inflate rates.
    pub async fn for_campaign(campaign_id: CampaignId, pool: &PgPool) -> Result<Vec<Self>> {
        let counts = sqlx::query_as::<_, Self>(
            r#"
            SELECT event_type, COUNT(DISTINCT contact_id) AS count
            FROM email_events
            WHERE campaign_id = $1
            GROUP BY event_type
            "#,
        )
        .bind(campaign_id)
        .fetch_all(pool)
        .await?;
        Ok(counts)
    }
}
