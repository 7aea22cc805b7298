use axum::extract::{Extension, Path};
use axum::Json;
use serde_json::{json, Value};

use crate::common::{ApiError, CampaignId, RequestAuth};
use crate::domains::analytics::dashboard::{CampaignFunnel, DashboardStats};
use crate::domains::analytics::ingest::{self, ProviderEvent};
use crate::domains::analytics::EmailEventType;
use crate::domains::automation::{self, RuleTrigger, TriggerContext};
use crate::domains::campaigns::Campaign;
use crate::server::app::AppState;

/// GET /analytics/dashboard
pub async fn dashboard(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
) -> Result<Json<DashboardStats>, ApiError> {
    let user_id = auth.require_auth()?;
    let stats = DashboardStats::load(user_id, &state.db_pool).await?;
    Ok(Json(stats))
}

/// GET /analytics/campaigns/:id
pub async fn campaign_funnel(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<CampaignId>,
) -> Result<Json<CampaignFunnel>, ApiError> {
    let user_id = auth.require_auth()?;
    // Ownership check; missing campaigns 404 here
    Campaign::find_by_id(id, user_id, &state.db_pool).await?;
    let funnel = CampaignFunnel::load(id, &state.db_pool).await?;
    Ok(Json(funnel))
}

/// POST /integrations/email/events - provider event webhook
pub async fn ingest_email_events(
    Extension(state): Extension<AppState>,
    Json(events): Json<Vec<ProviderEvent>>,
) -> Result<Json<Value>, ApiError> {
    let ingested = ingest::ingest_events(events, &state.db_pool).await?;

    // Engagement triggers fire against the campaign owner's rules
    for event in &ingested {
        let trigger = match event.event_type {
            EmailEventType::Opened => RuleTrigger::EmailOpened,
            EmailEventType::Clicked => RuleTrigger::EmailClicked,
            EmailEventType::Bounced => RuleTrigger::EmailBounced,
            _ => continue,
        };
        let Ok(owner) = Campaign::find_owner(event.campaign_id, &state.db_pool).await else {
            continue;
        };
        automation::fire(
            trigger,
            TriggerContext {
                user_id: owner,
                contact_id: Some(event.contact_id),
                campaign_id: Some(event.campaign_id),
                payload: json!({
                    "campaign_id": event.campaign_id,
                    "contact_id": event.contact_id,
                    "event": event.event_type,
                }),
            },
            &state.notifier,
            &state.webhooks,
            &state.db_pool,
        )
        .await;
    }

    Ok(Json(json!({ "processed": ingested.len() })))
}
