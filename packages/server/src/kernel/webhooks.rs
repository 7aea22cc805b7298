//! In-process webhook delivery queue.
//!
//! Deliveries go through an mpsc channel to a single worker task, so a slow
//! or failing endpoint never blocks a request handler. Failed deliveries
//! retry with linear backoff (attempt * 30s), at most 3 attempts, then are
//! dropped with a warning. Nothing is persisted across restarts.

use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde_json::json;
use sha2::Sha256;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_STEP: Duration = Duration::from_secs(30);
pub const SIGNATURE_HEADER: &str = "X-Encore-Signature";

/// One delivery job: where to POST, what to sign with, and the event body.
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    pub target_url: String,
    pub secret: String,
    pub event: String,
    pub payload: serde_json::Value,
}

/// Handle for enqueueing deliveries. Cheap to clone.
#[derive(Clone)]
pub struct WebhookDispatcher {
    tx: mpsc::UnboundedSender<WebhookDelivery>,
}

impl WebhookDispatcher {
    /// Spawn the worker task and return the dispatcher handle.
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WebhookDelivery>();
        let client = Client::new();

        tokio::spawn(async move {
            while let Some(delivery) = rx.recv().await {
                deliver_with_retries(&client, delivery).await;
            }
        });

        Self { tx }
    }

    /// Enqueue a delivery. Never fails the caller; a closed queue is logged.
    pub fn enqueue(&self, delivery: WebhookDelivery) {
        if self.tx.send(delivery).is_err() {
            warn!("webhook queue is closed, dropping delivery");
        }
    }
}

/// Hex HMAC-SHA256 of the request body, keyed with the integration secret.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// The JSON body sent to the endpoint.
fn delivery_body(delivery: &WebhookDelivery) -> serde_json::Value {
    json!({
        "event": delivery.event,
        "timestamp": Utc::now().to_rfc3339(),
        "payload": delivery.payload,
    })
}

async fn deliver_with_retries(client: &Client, delivery: WebhookDelivery) {
    let body = match serde_json::to_vec(&delivery_body(&delivery)) {
        Ok(body) => body,
        Err(err) => {
            warn!(error = %err, "failed to serialize webhook body, dropping");
            return;
        }
    };
    let signature = sign(&delivery.secret, &body);

    for attempt in 1..=MAX_ATTEMPTS {
        let result = client
            .post(&delivery.target_url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, &signature)
            .body(body.clone())
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(
                    event = %delivery.event,
                    url = %delivery.target_url,
                    attempt,
                    "webhook delivered"
                );
                return;
            }
            Ok(response) => {
                warn!(
                    event = %delivery.event,
                    url = %delivery.target_url,
                    status = %response.status(),
                    attempt,
                    "webhook delivery rejected"
                );
            }
            Err(err) => {
                warn!(
                    event = %delivery.event,
                    url = %delivery.target_url,
                    error = %err,
                    attempt,
                    "webhook delivery failed"
                );
            }
        }

        if attempt < MAX_ATTEMPTS {
            tokio::time::sleep(BACKOFF_STEP * attempt).await;
        }
    }

    warn!(
        event = %delivery.event,
        url = %delivery.target_url,
        "webhook delivery dropped after {} attempts",
        MAX_ATTEMPTS
    );
}
