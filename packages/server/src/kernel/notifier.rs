//! Notifier: writes the in-app notification row and pushes to the user's
//! registered devices. Failures are logged, never propagated, so callers
//! can notify without worrying about push availability.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::warn;

use crate::common::UserId;
use crate::domains::notifications::models::{DeviceToken, Notification};
use crate::kernel::expo::ExpoClient;

#[derive(Clone)]
pub struct Notifier {
    expo: Arc<ExpoClient>,
}

impl Notifier {
    pub fn new(expo: Arc<ExpoClient>) -> Self {
        Self { expo }
    }

    pub async fn notify(
        &self,
        user_id: UserId,
        title: &str,
        body: &str,
        data: serde_json::Value,
        pool: &PgPool,
    ) {
        if let Err(err) = Notification::create(user_id, title, body, data.clone(), pool).await {
            warn!(%user_id, error = %err, "failed to write notification row");
            return;
        }

        let tokens = match DeviceToken::find_for_user(user_id, pool).await {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!(%user_id, error = %err, "failed to load device tokens");
                return;
            }
        };

        let push_tokens: Vec<String> = tokens.into_iter().map(|t| t.token).collect();
        if let Err(err) = self.expo.send_batch(&push_tokens, title, body, data).await {
            warn!(%user_id, error = %err, "push delivery failed");
        }
    }
}
