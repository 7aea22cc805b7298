//! Campaign scheduler: a background loop that claims due scheduled
//! campaigns and runs the send pipeline for each.

use std::sync::Arc;
use std::time::Duration;

use sendgrid::SendGridService;
use serde_json::json;
use sqlx::PgPool;
use tracing::{error, info};

use crate::domains::automation::{self, RuleTrigger, TriggerContext};
use crate::domains::campaigns::models::{Campaign, CampaignStatus};
use crate::domains::campaigns::{send_campaign, SendOutcome};
use crate::domains::integrations::fanout;
use crate::kernel::notifier::Notifier;
use crate::kernel::webhooks::WebhookDispatcher;

const POLL_INTERVAL: Duration = Duration::from_secs(30);
const CLAIM_BATCH: i64 = 10;

/// Everything that happens after a campaign finished sending: owner push
/// notification, `campaign.sent` integration event, and the campaign_sent
/// automation trigger. Shared by the scheduler and the immediate-send route.
///
/// A run that finished as failed (every send errored) only notifies the
/// owner of the failure; the sent event and trigger do not fire.
pub async fn run_post_send_effects(
    campaign: &Campaign,
    outcome: &SendOutcome,
    notifier: &Notifier,
    webhooks: &WebhookDispatcher,
    pool: &PgPool,
) {
    let payload = json!({
        "campaign_id": campaign.id,
        "name": campaign.name,
        "sent": outcome.sent,
        "failed": outcome.failed,
    });

    if outcome.status != CampaignStatus::Sent {
        notifier
            .notify(
                campaign.user_id,
                "Campaign failed",
                &format!(
                    "\"{}\" failed to send ({} error(s))",
                    campaign.name, outcome.failed
                ),
                payload,
                pool,
            )
            .await;
        return;
    }

    notifier
        .notify(
            campaign.user_id,
            "Campaign sent",
            &format!(
                "\"{}\" went out to {} contact(s)",
                campaign.name, outcome.sent
            ),
            payload.clone(),
            pool,
        )
        .await;

    fanout::emit_event(campaign.user_id, "campaign.sent", payload.clone(), webhooks, pool).await;

    automation::fire(
        RuleTrigger::CampaignSent,
        TriggerContext {
            user_id: campaign.user_id,
            contact_id: None,
            campaign_id: Some(campaign.id),
            payload,
        },
        notifier,
        webhooks,
        pool,
    )
    .await;
}

#[derive(Clone)]
pub struct Scheduler {
    pool: PgPool,
    sendgrid: Arc<SendGridService>,
    notifier: Notifier,
    webhooks: WebhookDispatcher,
}

impl Scheduler {
    pub fn new(
        pool: PgPool,
        sendgrid: Arc<SendGridService>,
        notifier: Notifier,
        webhooks: WebhookDispatcher,
    ) -> Self {
        Self {
            pool,
            sendgrid,
            notifier,
            webhooks,
        }
    }

    /// Spawn the polling loop. Runs until the process exits.
    pub fn spawn(self) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(POLL_INTERVAL);
            loop {
                interval.tick().await;
                if let Err(err) = self.tick().await {
                    error!(error = %err, "campaign scheduler tick failed");
                }
            }
        });
    }

    async fn tick(&self) -> anyhow::Result<()> {
        let due = Campaign::claim_due(CLAIM_BATCH, &self.pool).await?;
        for campaign in due {
            info!(campaign_id = %campaign.id, "running scheduled campaign");
            self.run_campaign(&campaign).await;
        }
        Ok(())
    }

    async fn run_campaign(&self, campaign: &Campaign) {
        match send_campaign(campaign, &self.sendgrid, &self.pool).await {
            Ok(outcome) => {
                run_post_send_effects(campaign, &outcome, &self.notifier, &self.webhooks, &self.pool)
                    .await;
            }
            Err(err) => {
                error!(campaign_id = %campaign.id, error = %err, "scheduled send failed");
                if let Err(err) =
                    Campaign::finish(campaign.id, CampaignStatus::Failed, 0, 0, &self.pool).await
                {
                    error!(campaign_id = %campaign.id, error = %err, "failed to mark campaign failed");
                }
            }
        }
    }
}
