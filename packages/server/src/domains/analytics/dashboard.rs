//! Aggregate queries backing the dashboard and per-campaign funnel views.

use anyhow::Result;
use serde::Serialize;
use sqlx::PgPool;

use crate::common::{CampaignId, UserId};
use crate::domains::analytics::models::EventCount;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Top-level dashboard numbers for one user.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub contacts_by_status: Vec<StatusCount>,
    pub campaigns_by_status: Vec<StatusCount>,
    /// Sent / opened / clicked over the trailing 30 days
    pub emails_sent_30d: i64,
    pub emails_opened_30d: i64,
    pub emails_clicked_30d: i64,
}

impl DashboardStats {
    pub async fn load(user_id: UserId, pool: &PgPool) -> Result<Self> {
        let contacts_by_status = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM contacts
            WHERE user_id = $1
            GROUP BY status
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let campaigns_by_status = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM campaigns
            WHERE user_id = $1
            GROUP BY status
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let (emails_sent_30d, emails_opened_30d, emails_clicked_30d): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*) FILTER (WHERE e.event_type = 'sent'),
                    COUNT(DISTINCT (e.campaign_id, e.contact_id))
                        FILTER (WHERE e.event_type = 'opened'),
                    COUNT(DISTINCT (e.campaign_id, e.contact_id))
                        FILTER (WHERE e.event_type = 'clicked')
                FROM email_events e
                JOIN campaigns c ON c.id = e.campaign_id
                WHERE c.user_id = $1
                  AND e.occurred_at > NOW() - INTERVAL '30 days'
                "#,
            )
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(Self {
            contacts_by_status,
            campaigns_by_status,
            emails_sent_30d,
            emails_opened_30d,
            emails_clicked_30d,
        })
    }
}

/// Delivery funnel for a single campaign.
#[derive(Debug, Serialize)]
pub struct CampaignFunnel {
    pub campaign_id: CampaignId,
    pub recipients: i64,
    pub sent: i64,
    pub delivered: i64,
    pub opened: i64,
    pub clicked: i64,
    pub bounced: i64,
    pub unsubscribed: i64,
    pub open_rate: f64,
    pub click_rate: f64,
}

impl CampaignFunnel {
    pub async fn load(campaign_id: CampaignId, pool: &PgPool) -> Result<Self> {
        let counts = EventCount::for_campaign(campaign_id, pool).await?;
        let count_of = |event_type: &str| -> i64 {
            counts
                .iter()
                .find(|c| c.event_type == event_type)
                .map(|c| c.count)
                .unwrap_or(0)
        };

        let recipients: (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT contact_id) FROM email_events WHERE campaign_id = $1",
        )
        .bind(campaign_id)
        .fetch_one(pool)
        .await?;

        let sent = count_of("sent");
        let opened = count_of("opened");
        let clicked = count_of("clicked");

        Ok(Self {
            campaign_id,
            recipients: recipients.0,
            sent,
            delivered: count_of("delivered"),
            opened,
            clicked,
            bounced: count_of("bounced"),
            unsubscribed: count_of("unsubscribed"),
            open_rate: rate(opened, sent),
            click_rate: rate(clicked, sent),
        })
    }
}

/// Fraction of `part` over `total`; 0 when nothing was sent.
fn rate(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
