//! SendGrid event webhook ingest. Provider events are matched back to the
//! campaign/contact pair through the message id recorded at send time.

use anyhow::Result;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::warn;

use crate::common::{CampaignId, ContactId};
use crate::domains::analytics::models::{EmailEvent, EmailEventType};
use crate::domains::contacts::models::{Contact, ContactStatus};

/// One entry of the provider's event webhook body (an array of these).
#[derive(Debug, Deserialize)]
pub struct ProviderEvent {
    pub event: String,
    pub sg_message_id: Option<String>,
}

/// An event that was recorded during ingest, reported back to the caller
/// so engagement triggers can fire.
#[derive(Debug)]
pub struct IngestedEvent {
    pub campaign_id: CampaignId,
    pub contact_id: ContactId,
    pub event_type: EmailEventType,
}

/// Map a provider event name onto our funnel. Unknown names are skipped.
fn map_event(name: &str) -> Option<EmailEventType> {
    match name {
        "delivered" => Some(EmailEventType::Delivered),
        "open" => Some(EmailEventType::Opened),
        "click" => Some(EmailEventType::Clicked),
        "bounce" | "dropped" => Some(EmailEventType::Bounced),
        "unsubscribe" | "spamreport" => Some(EmailEventType::Unsubscribed),
        _ => None,
    }
}

/// SendGrid suffixes the message id it returned at send time with
/// ".filter..." in webhook payloads.
fn base_message_id(sg_message_id: &str) -> &str {
    sg_message_id.split('.').next().unwrap_or(sg_message_id)
}

/// Record provider events. Events that cannot be matched to a known
/// message id are logged and skipped; ingest never fails on bad entries.
pub async fn ingest_events(events: Vec<ProviderEvent>, pool: &PgPool) -> Result<Vec<IngestedEvent>> {
    let mut ingested = Vec::new();

    for entry in events {
        let Some(event_type) = map_event(&entry.event) else {
            continue;
        };
        let Some(message_id) = entry.sg_message_id.as_deref() else {
            warn!(event = %entry.event, "provider event without message id, skipping");
            continue;
        };

        let message_id = base_message_id(message_id);
        let Some((campaign_id, contact_id)) =
            EmailEvent::find_by_provider_message_id(message_id, pool).await?
        else {
            warn!(%message_id, "provider event for unknown message id, skipping");
            continue;
        };

        EmailEvent::record(
            campaign_id,
            contact_id,
            event_type,
            Some(message_id.to_string()),
            pool,
        )
        .await?;

        if event_type == EmailEventType::Unsubscribed {
            Contact::set_status(contact_id, ContactStatus::Unsubscribed, pool).await?;
        }

        ingested.push(IngestedEvent {
            campaign_id,
            contact_id,
            event_type,
        });
    }

    Ok(ingested)
}
