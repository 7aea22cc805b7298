use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{RuleId, UserId};

/// What fires a rule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RuleTrigger {
    ContactCreated,
    ContactEngaged,
    EmailOpened,
    EmailClicked,
    EmailBounced,
    CampaignSent,
}

impl std::fmt::Display for RuleTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleTrigger::ContactCreated => write!(f, "contact_created"),
            RuleTrigger::ContactEngaged => write!(f, "contact_engaged"),
            RuleTrigger::EmailOpened => write!(f, "email_opened"),
            RuleTrigger::EmailClicked => write!(f, "email_clicked"),
            RuleTrigger::EmailBounced => write!(f, "email_bounced"),
            RuleTrigger::CampaignSent => write!(f, "campaign_sent"),
        }
    }
}

impl std::str::FromStr for RuleTrigger {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "contact_created" => Ok(RuleTrigger::ContactCreated),
            "contact_engaged" => Ok(RuleTrigger::ContactEngaged),
            "email_opened" => Ok(RuleTrigger::EmailOpened),
            "email_clicked" => Ok(RuleTrigger::EmailClicked),
            "email_bounced" => Ok(RuleTrigger::EmailBounced),
            "campaign_sent" => Ok(RuleTrigger::CampaignSent),
            _ => Err(anyhow::anyhow!("Invalid rule trigger: {}", s)),
        }
    }
}

/// What a rule does when it fires
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    AddTag,
    SetStatus,
    Notify,
    Webhook,
}

impl std::fmt::Display for RuleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleAction::AddTag => write!(f, "add_tag"),
            RuleAction::SetStatus => write!(f, "set_status"),
            RuleAction::Notify => write!(f, "notify"),
            RuleAction::Webhook => write!(f, "webhook"),
        }
    }
}

impl std::str::FromStr for RuleAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add_tag" => Ok(RuleAction::AddTag),
            "set_status" => Ok(RuleAction::SetStatus),
            "notify" => Ok(RuleAction::Notify),
            "webhook" => Ok(RuleAction::Webhook),
            _ => Err(anyhow::anyhow!("Invalid rule action: {}", s)),
        }
    }
}

/// A user-defined automation: when `trigger` happens, run `action` with
/// `action_params` (e.g. `{"tag": "warm"}` for add_tag).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AutomationRule {
    pub id: RuleId,
    pub user_id: UserId,
    pub name: String,
    pub trigger: String,
    pub action: String,
    pub action_params: serde_json::Value,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRule {
    pub name: String,
    pub trigger: RuleTrigger,
    pub action: RuleAction,
    #[serde(default)]
    pub action_params: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRule {
    pub name: Option<String>,
    pub trigger: Option<RuleTrigger>,
    pub action: Option<RuleAction>,
    pub action_params: Option<serde_json::Value>,
    pub enabled: Option<bool>,
}

impl AutomationRule {
    /// Find rule by ID, scoped to its owner
    pub async fn find_by_id(id: RuleId, user_id: UserId, pool: &PgPool) -> Result<Self> {
        let rule =
            sqlx::query_as::<_, Self>("SELECT * FROM automation_rules WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_one(pool)
                .await?;
        Ok(rule)
    }

    /// Create a rule (enabled by default)
    pub async fn create(user_id: UserId, input: CreateRule, pool: &PgPool) -> Result<Self> {
        let rule = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO automation_rules (id, user_id, name, trigger, action, action_params)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(RuleId::new())
        .bind(user_id)
        .bind(&input.name)
        .bind(input.trigger.to_string())
        .bind(input.action.to_string())
        .bind(&input.action_params)
        .fetch_one(pool)
        .await?;
        Ok(rule)
    }

    /// List rules, newest first, cursor-paginated
    pub async fn list(
        user_id: UserId,
        after: Option<Uuid>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let rules = sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM automation_rules
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
        Ok(rules)
    }

    /// Update a rule (only provided fields)
    pub async fn update(
        id: RuleId,
        user_id: UserId,
        input: UpdateRule,
        pool: &PgPool,
    ) -> Result<Self> {
        let rule = sqlx::query_as::<_, Self>(
            r#"
            UPDATE automation_rules
            SET name = COALESCE($3, name),
                trigger = COALESCE($4, trigger),
                action = COALESCE($5, action),
                action_params = COALESCE($6, action_params),
                enabled = COALESCE($7, enabled),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(input.name)
        .bind(input.trigger.map(|t| t.to_string()))
        .bind(input.action.map(|a| a.to_string()))
        .bind(input.action_params)
        .bind(input.enabled)
        .fetch_one(pool)
        .await?;
        Ok(rule)
    }

    /// Delete a rule. Idempotent.
    pub async fn delete(id: RuleId, user_id: UserId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM automation_rules WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Enabled rules of a user for one trigger
    pub async fn find_enabled(
        user_id: UserId,
        trigger: RuleTrigger,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let rules = sqlx::query_as::<_, Self>(
            "SELECT * FROM automation_rules WHERE user_id = $1 AND trigger = $2 AND enabled = TRUE",
        )
        .bind(user_id)
        .bind(trigger.to_string())
        .fetch_all(pool)
        .await?;
        Ok(rules)
    }

    pub fn action_enum(&self) -> Result<RuleAction> {
        self.action.parse()
    }
}
