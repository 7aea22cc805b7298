//! The campaign send pipeline. Used by both the immediate-send route and
//! the background scheduler.

use std::collections::HashMap;

use anyhow::Result;
use sendgrid::{OutboundEmail, SendGridService};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::common::ContactId;
use crate::domains::analytics::models::{EmailEvent, EmailEventType};
use crate::domains::auth::models::User;
use crate::domains::campaigns::models::{Campaign, CampaignStatus};
use crate::domains::contacts::models::Contact;
use crate::domains::templates;
use crate::domains::templates::models::EmailTemplate;

/// Result of one send run.
#[derive(Debug)]
pub struct SendOutcome {
    pub recipients: usize,
    pub sent: i32,
    pub failed: i32,
    pub status: CampaignStatus,
}

/// Template context for one recipient: contact fields, the sender's name,
/// then campaign-level variables on top.
fn recipient_context(contact: &Contact, sender_name: &str, campaign: &Campaign) -> HashMap<String, String> {
    let mut context = HashMap::new();
    context.insert("contact_name".to_string(), contact.name.clone());
    context.insert(
        "outlet".to_string(),
        contact.outlet.clone().unwrap_or_default(),
    );
    context.insert("sender_name".to_string(), sender_name.to_string());
    context.extend(campaign.variable_map());
    context
}

/// Run the send for a campaign that has already transitioned to sending.
///
/// Renders the template per contact, sends through the email provider, and
/// records an event per recipient. Per-recipient failures are recorded and
/// counted, never propagated; the run only errors on infrastructure
/// failures (DB, missing template).
pub async fn send_campaign(
    campaign: &Campaign,
    sendgrid: &SendGridService,
    pool: &PgPool,
) -> Result<SendOutcome> {
    let user = User::find_by_id(campaign.user_id, pool).await?;
    let template = EmailTemplate::find_by_id(campaign.template_id, campaign.user_id, pool).await?;
    let audience = Contact::find_audience(campaign.user_id, &campaign.audience_filter()?, pool).await?;

    let mut sent: i32 = 0;
    let mut failed: i32 = 0;
    let mut contacted: Vec<ContactId> = Vec::new();

    for contact in &audience {
        let context = recipient_context(contact, &user.name, campaign);

        let rendered = match templates::render(&template.subject, &template.body, &context) {
            Ok(rendered) => rendered,
            Err(err) => {
                warn!(
                    campaign_id = %campaign.id,
                    contact_id = %contact.id,
                    error = %err,
                    "failed to render campaign email"
                );
                EmailEvent::record(campaign.id, contact.id, EmailEventType::Failed, None, pool)
                    .await?;
                failed += 1;
                continue;
            }
        };

        let email = OutboundEmail {
            to_email: contact.email.clone(),
            to_name: Some(contact.name.clone()),
            subject: rendered.subject,
            text_body: rendered.text_body,
            html_body: rendered.html_body,
        };

        match sendgrid.send(&email).await {
            Ok(message_id) => {
                EmailEvent::record(campaign.id, contact.id, EmailEventType::Sent, message_id, pool)
                    .await?;
                contacted.push(contact.id);
                sent += 1;
            }
            Err(err) => {
                warn!(
                    campaign_id = %campaign.id,
                    contact_id = %contact.id,
                    error = %err,
                    "failed to send campaign email"
                );
                EmailEvent::record(campaign.id, contact.id, EmailEventType::Failed, None, pool)
                    .await?;
                failed += 1;
            }
        }
    }

    if !contacted.is_empty() {
        Contact::mark_contacted(&contacted, pool).await?;
    }

    // Every send erroring means the run failed; an empty audience is a
    // successful no-op.
    let status = if sent == 0 && failed > 0 {
        CampaignStatus::Failed
    } else {
        CampaignStatus::Sent
    };
    Campaign::finish(campaign.id, status, sent, failed, pool).await?;

    info!(
        campaign_id = %campaign.id,
        recipients = audience.len(),
        sent,
        failed,
        status = %status,
        "campaign send finished"
    );

    Ok(SendOutcome {
        recipients: audience.len(),
        sent,
        failed,
        status,
    })
}
