//! The rule engine. `fire` runs every enabled rule of a user for a trigger.
//! Rule failures are logged and skipped; firing never fails the operation
//! that raised the trigger.

use sqlx::PgPool;
use tracing::{debug, warn};

use crate::common::{CampaignId, ContactId, UserId};
use crate::domains::automation::models::{AutomationRule, RuleAction, RuleTrigger};
use crate::domains::contacts::models::{Contact, ContactStatus};
use crate::domains::integrations::fanout;
use crate::kernel::notifier::Notifier;
use crate::kernel::webhooks::WebhookDispatcher;

/// What the trigger was about. Contact-mutating actions are skipped when
/// no contact is attached.
#[derive(Debug, Clone)]
pub struct TriggerContext {
    pub user_id: UserId,
    pub contact_id: Option<ContactId>,
    pub campaign_id: Option<CampaignId>,
    pub payload: serde_json::Value,
}

pub async fn fire(
    trigger: RuleTrigger,
    ctx: TriggerContext,
    notifier: &Notifier,
    webhooks: &WebhookDispatcher,
    pool: &PgPool,
) {
    let rules = match AutomationRule::find_enabled(ctx.user_id, trigger, pool).await {
        Ok(rules) => rules,
        Err(err) => {
            warn!(user_id = %ctx.user_id, %trigger, error = %err, "failed to load rules");
            return;
        }
    };

    for rule in rules {
        if let Err(err) = apply_rule(&rule, &ctx, notifier, webhooks, pool).await {
            warn!(rule_id = %rule.id, %trigger, error = %err, "automation rule failed");
        } else {
            debug!(rule_id = %rule.id, %trigger, "automation rule applied");
        }
    }
}

async fn apply_rule(
    rule: &AutomationRule,
    ctx: &TriggerContext,
    notifier: &Notifier,
    webhooks: &WebhookDispatcher,
    pool: &PgPool,
) -> anyhow::Result<()> {
    match rule.action_enum()? {
        RuleAction::AddTag => {
            let Some(contact_id) = ctx.contact_id else {
                return Ok(());
            };
            let tag = param_str(&rule.action_params, "tag")?;
            Contact::add_tag(contact_id, ctx.user_id, &tag, pool).await?;
        }
        RuleAction::SetStatus => {
            let Some(contact_id) = ctx.contact_id else {
                return Ok(());
            };
            let status: ContactStatus = param_str(&rule.action_params, "status")?.parse()?;
            Contact::set_status(contact_id, status, pool).await?;
        }
        RuleAction::Notify => {
            let message = param_str(&rule.action_params, "message")
                .unwrap_or_else(|_| format!("Rule \"{}\" fired", rule.name));
            notifier
                .notify(ctx.user_id, &rule.name, &message, ctx.payload.clone(), pool)
                .await;
        }
        RuleAction::Webhook => {
            let event = format!("automation.{}", rule.name);
            fanout::emit_event(ctx.user_id, &event, ctx.payload.clone(), webhooks, pool).await;
        }
    }
    Ok(())
}

fn param_str(params: &serde_json::Value, key: &str) -> anyhow::Result<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("rule action params missing \"{}\"", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_str() {
        let params = serde_json::json!({"tag": "warm"});
        assert_eq!(param_str(&params, "tag").unwrap(), "warm");
        assert!(param_str(&params, "status").is_err());
        assert!(param_str(&serde_json::json!({"tag": 7}), "tag").is_err());
    }
}
