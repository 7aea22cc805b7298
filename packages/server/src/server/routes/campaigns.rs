use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::{ApiError, CampaignId, ListParams, Page, RequestAuth};
use crate::domains::campaigns::models::{
    Campaign, CampaignStatus, CreateCampaign, UpdateCampaign,
};
use crate::domains::campaigns::send_campaign;
use crate::domains::templates::models::EmailTemplate;
use crate::kernel::scheduler::run_post_send_effects;
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CampaignFilter {
    pub status: Option<CampaignStatus>,
}

/// POST /campaigns
pub async fn create(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Json(body): Json<CreateCampaign>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    let user_id = auth.require_auth()?;
    // The template must exist and belong to the caller
    EmailTemplate::find_by_id(body.template_id, user_id, &state.db_pool).await?;
    let campaign = Campaign::create(user_id, body, &state.db_pool).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// GET /campaigns
pub async fn list(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Query(params): Query<ListParams>,
    Query(filter): Query<CampaignFilter>,
) -> Result<Json<Page<Campaign>>, ApiError> {
    let user_id = auth.require_auth()?;
    let limit = params.limit();
    let rows = Campaign::list(
        user_id,
        filter.status,
        params.after_id()?,
        limit,
        &state.db_pool,
    )
    .await?;
    Ok(Json(Page::from_rows(rows, limit, |c| *c.id.as_uuid())))
}

/// GET /campaigns/:id
pub async fn get_one(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<CampaignId>,
) -> Result<Json<Campaign>, ApiError> {
    let user_id = auth.require_auth()?;
    let campaign = Campaign::find_by_id(id, user_id, &state.db_pool).await?;
    Ok(Json(campaign))
}

/// PATCH /campaigns/:id
pub async fn update(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<CampaignId>,
    Json(body): Json<UpdateCampaign>,
) -> Result<Json<Campaign>, ApiError> {
    let user_id = auth.require_auth()?;
    if let Some(template_id) = body.template_id {
        EmailTemplate::find_by_id(template_id, user_id, &state.db_pool).await?;
    }
    let campaign = Campaign::update(id, user_id, body, &state.db_pool).await?;
    Ok(Json(campaign))
}

/// DELETE /campaigns/:id
pub async fn delete(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<CampaignId>,
) -> Result<StatusCode, ApiError> {
    let user_id = auth.require_auth()?;
    Campaign::delete(id, user_id, &state.db_pool).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /campaigns/:id/schedule
pub async fn schedule(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<CampaignId>,
    Json(body): Json<ScheduleRequest>,
) -> Result<Json<Campaign>, ApiError> {
    let user_id = auth.require_auth()?;
    let campaign = Campaign::schedule(id, user_id, body.scheduled_at, &state.db_pool).await?;
    Ok(Json(campaign))
}

/// POST /campaigns/:id/cancel
pub async fn cancel(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<CampaignId>,
) -> Result<Json<Campaign>, ApiError> {
    let user_id = auth.require_auth()?;
    let campaign = Campaign::cancel(id, user_id, &state.db_pool).await?;
    Ok(Json(campaign))
}

/// POST /campaigns/:id/send - immediate send
pub async fn send(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<CampaignId>,
) -> Result<Json<Value>, ApiError> {
    let user_id = auth.require_auth()?;

    let Some(campaign) = Campaign::begin_sending(id, user_id, &state.db_pool).await? else {
        // Missing rows surface as 404 through find_by_id
        let campaign = Campaign::find_by_id(id, user_id, &state.db_pool).await?;
        return Err(ApiError::bad_request(format!(
            "Cannot send a campaign in status {}",
            campaign.status
        )));
    };

    let outcome = match send_campaign(&campaign, &state.sendgrid, &state.db_pool).await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(campaign_id = %campaign.id, error = %err, "send failed");
            Campaign::finish(campaign.id, CampaignStatus::Failed, 0, 0, &state.db_pool).await?;
            return Err(ApiError::Internal(err));
        }
    };

    run_post_send_effects(
        &campaign,
        &outcome,
        &state.notifier,
        &state.webhooks,
        &state.db_pool,
    )
    .await;

    Ok(Json(json!({
        "campaign_id": campaign.id,
        "recipients": outcome.recipients,
        "sent": outcome.sent,
        "failed": outcome.failed,
        "status": outcome.status,
    })))
}
