//! Fan an event out to every enabled integration subscribed to it.

use sqlx::PgPool;
use tracing::warn;

use crate::common::UserId;
use crate::domains::integrations::models::Integration;
use crate::kernel::webhooks::{WebhookDelivery, WebhookDispatcher};

/// Enqueue a delivery per subscribed integration. Load failures are logged
/// and swallowed so event emission never fails the calling operation.
pub async fn emit_event(
    user_id: UserId,
    event: &str,
    payload: serde_json::Value,
    webhooks: &WebhookDispatcher,
    pool: &PgPool,
) {
    let integrations = match Integration::find_subscribed(user_id, event, pool).await {
        Ok(integrations) => integrations,
        Err(err) => {
            warn!(%user_id, event, error = %err, "failed to load subscribed integrations");
            return;
        }
    };

    for integration in integrations {
        webhooks.enqueue(WebhookDelivery {
            target_url: integration.target_url,
            secret: integration.secret,
            event: event.to_string(),
            payload: payload.clone(),
        });
    }
}
