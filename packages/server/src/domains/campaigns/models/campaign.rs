use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{ApiError, CampaignId, TemplateId, UserId};
use crate::domains::contacts::models::AudienceFilter;

/// Campaign lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Sending,
    Sent,
    Cancelled,
    Failed,
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Draft => write!(f, "draft"),
            CampaignStatus::Scheduled => write!(f, "scheduled"),
            CampaignStatus::Sending => write!(f, "sending"),
            CampaignStatus::Sent => write!(f, "sent"),
            CampaignStatus::Cancelled => write!(f, "cancelled"),
            CampaignStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(CampaignStatus::Draft),
            "scheduled" => Ok(CampaignStatus::Scheduled),
            "sending" => Ok(CampaignStatus::Sending),
            "sent" => Ok(CampaignStatus::Sent),
            "cancelled" => Ok(CampaignStatus::Cancelled),
            "failed" => Ok(CampaignStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid campaign status: {}", s)),
        }
    }
}

/// An email campaign: a template sent to an audience of contacts.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Campaign {
    pub id: CampaignId,
    pub user_id: UserId,
    pub template_id: TemplateId,
    pub name: String,
    pub status: String,
    /// AudienceFilter stored as JSONB
    pub audience: serde_json::Value,
    /// Extra template variables supplied at campaign level
    pub variables: serde_json::Value,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_count: i32,
    pub failed_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaign {
    pub template_id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub audience: AudienceFilter,
    /// Campaign-level `{{variable}}` values, e.g. track_name
    #[serde(default)]
    pub variables: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCampaign {
    pub template_id: Option<TemplateId>,
    pub name: Option<String>,
    pub audience: Option<AudienceFilter>,
    pub variables: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Campaign {
    /// Find campaign by ID, scoped to its owner
    pub async fn find_by_id(id: CampaignId, user_id: UserId, pool: &PgPool) -> Result<Self> {
        let campaign =
            sqlx::query_as::<_, Self>("SELECT * FROM campaigns WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_one(pool)
                .await?;
        Ok(campaign)
    }

    /// Create a new draft campaign
    pub async fn create(user_id: UserId, input: CreateCampaign, pool: &PgPool) -> Result<Self> {
        let campaign = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO campaigns (id, user_id, template_id, name, audience, variables)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(CampaignId::new())
        .bind(user_id)
        .bind(input.template_id)
        .bind(&input.name)
        .bind(serde_json::to_value(&input.audience)?)
        .bind(serde_json::Value::Object(input.variables))
        .fetch_one(pool)
        .await?;
        Ok(campaign)
    }

    /// List campaigns for a user, newest first, cursor-paginated
    pub async fn list(
        user_id: UserId,
        status: Option<CampaignStatus>,
        after: Option<Uuid>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let campaigns = sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM campaigns
            WHERE user_id = $1
              AND ($2::uuid IS NULL OR id < $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY id DESC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(after)
        .bind(status.map(|s| s.to_string()))
        .bind(limit + 1)
        .fetch_all(pool)
        .await?;
        Ok(campaigns)
    }

    /// Update a campaign. Only draft and scheduled campaigns can change.
    pub async fn update(
        id: CampaignId,
        user_id: UserId,
        input: UpdateCampaign,
        pool: &PgPool,
    ) -> Result<Self, ApiError> {
        let audience = match &input.audience {
            Some(audience) => Some(serde_json::to_value(audience).map_err(anyhow::Error::from)?),
            None => None,
        };
        let campaign = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaigns
            SET template_id = COALESCE($3, template_id),
                name = COALESCE($4, name),
                audience = COALESCE($5, audience),
                variables = COALESCE($6, variables),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status IN ('draft', 'scheduled')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(input.template_id)
        .bind(input.name)
        .bind(audience)
        .bind(input.variables.map(serde_json::Value::Object))
        .fetch_optional(pool)
        .await?;

        match campaign {
            Some(campaign) => Ok(campaign),
            None => {
                // Distinguish missing from immutable
                Self::find_by_id(id, user_id, pool).await?;
                Err(ApiError::bad_request(
                    "Only draft or scheduled campaigns can be updated",
                ))
            }
        }
    }

    /// Delete a campaign. Only draft and scheduled campaigns can be removed;
    /// deleting a missing row is a no-op.
    pub async fn delete(id: CampaignId, user_id: UserId, pool: &PgPool) -> Result<(), ApiError> {
        let result = sqlx::query(
            "DELETE FROM campaigns WHERE id = $1 AND user_id = $2 AND status IN ('draft', 'scheduled')",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            if let Ok(campaign) = Self::find_by_id(id, user_id, pool).await {
                return Err(ApiError::bad_request(format!(
                    "Cannot delete a campaign in status {}",
                    campaign.status
                )));
            }
        }
        Ok(())
    }

    /// Schedule a draft (or re-schedule a scheduled) campaign for a future time.
    pub async fn schedule(
        id: CampaignId,
        user_id: UserId,
        scheduled_at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Self, ApiError> {
        if scheduled_at <= Utc::now() {
            return Err(ApiError::bad_request("scheduled_at must be in the future"));
        }

        let campaign = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaigns
            SET status = 'scheduled', scheduled_at = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status IN ('draft', 'scheduled')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(scheduled_at)
        .fetch_optional(pool)
        .await?;

        match campaign {
            Some(campaign) => Ok(campaign),
            None => {
                Self::find_by_id(id, user_id, pool).await?;
                Err(ApiError::bad_request(
                    "Only draft or scheduled campaigns can be scheduled",
                ))
            }
        }
    }

    /// Cancel a scheduled campaign.
    pub async fn cancel(id: CampaignId, user_id: UserId, pool: &PgPool) -> Result<Self, ApiError> {
        let campaign = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaigns
            SET status = 'cancelled', updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status = 'scheduled'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        match campaign {
            Some(campaign) => Ok(campaign),
            None => {
                Self::find_by_id(id, user_id, pool).await?;
                Err(ApiError::bad_request("Only scheduled campaigns can be cancelled"))
            }
        }
    }

    /// Move draft/scheduled → sending. Returns None when the campaign is
    /// already past that point (another worker claimed it).
    pub async fn begin_sending(
        id: CampaignId,
        user_id: UserId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let campaign = sqlx::query_as::<_, Self>(
            r#"
            UPDATE campaigns
            SET status = 'sending', updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status IN ('draft', 'scheduled')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(campaign)
    }

    /// Finish a send run, recording counters and the final status.
    pub async fn finish(
        id: CampaignId,
        status: CampaignStatus,
        sent_count: i32,
        failed_count: i32,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE campaigns
            SET status = $2, sent_count = $3, failed_count = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.to_string())
        .bind(sent_count)
        .bind(failed_count)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Claim scheduled campaigns that are due, flipping them to sending.
    /// SKIP LOCKED keeps concurrent workers from claiming the same rows.
    pub async fn claim_due(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let mut tx = pool.begin().await?;

        let due = sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM campaigns
            WHERE status = 'scheduled' AND scheduled_at <= NOW()
            ORDER BY scheduled_at ASC
            LIMIT $1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *tx)
        .await?;

        let ids: Vec<Uuid> = due.iter().map(|c| *c.id.as_uuid()).collect();
        sqlx::query("UPDATE campaigns SET status = 'sending', updated_at = NOW() WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(due)
    }

    /// The owner of a campaign, without loading the row. Used when a
    /// provider webhook only identifies the campaign.
    pub async fn find_owner(id: CampaignId, pool: &PgPool) -> Result<UserId> {
        let (user_id,): (UserId,) = sqlx::query_as("SELECT user_id FROM campaigns WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(user_id)
    }

    /// The parsed audience filter for this row.
    pub fn audience_filter(&self) -> Result<AudienceFilter> {
        Ok(serde_json::from_value(self.audience.clone())?)
    }

    /// Campaign-level template variables as a string map.
    pub fn variable_map(&self) -> std::collections::HashMap<String, String> {
        match &self.variables {
            serde_json::Value::Object(map) => map
                .iter()
                .map(|(k, v)| {
                    let value = match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), value)
                })
                .collect(),
            _ => Default::default(),
        }
    }

    pub fn status_enum(&self) -> Result<CampaignStatus> {
        self.status.parse()
    }
}
