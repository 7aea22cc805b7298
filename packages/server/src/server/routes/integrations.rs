use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::common::{ApiError, IntegrationId, ListParams, Page, RequestAuth};
use crate::domains::integrations::models::{CreateIntegration, Integration, UpdateIntegration};
use crate::kernel::webhooks::WebhookDelivery;
use crate::server::app::AppState;

/// POST /integrations
///
/// The response includes the signing secret; it is not returned again.
pub async fn create(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Json(body): Json<CreateIntegration>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user_id = auth.require_auth()?;
    if body.target_url.parse::<reqwest::Url>().is_err() {
        return Err(ApiError::bad_request("target_url must be a valid URL"));
    }
    let integration = Integration::create(user_id, body, &state.db_pool).await?;
    let secret = integration.secret.clone();
    Ok((
        StatusCode::CREATED,
        Json(json!({ "integration": integration, "secret": secret })),
    ))
}

/// GET /integrations
pub async fn list(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Integration>>, ApiError> {
    let user_id = auth.require_auth()?;
    let limit = params.limit();
    let rows = Integration::list(user_id, params.after_id()?, limit, &state.db_pool).await?;
    Ok(Json(Page::from_rows(rows, limit, |i| *i.id.as_uuid())))
}

/// GET /integrations/:id
pub async fn get_one(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<IntegrationId>,
) -> Result<Json<Integration>, ApiError> {
    let user_id = auth.require_auth()?;
    let integration = Integration::find_by_id(id, user_id, &state.db_pool).await?;
    Ok(Json(integration))
}

/// PATCH /integrations/:id
pub async fn update(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<IntegrationId>,
    Json(body): Json<UpdateIntegration>,
) -> Result<Json<Integration>, ApiError> {
    let user_id = auth.require_auth()?;
    if let Some(url) = &body.target_url {
        if url.parse::<reqwest::Url>().is_err() {
            return Err(ApiError::bad_request("target_url must be a valid URL"));
        }
    }
    let integration = Integration::update(id, user_id, body, &state.db_pool).await?;
    Ok(Json(integration))
}

/// DELETE /integrations/:id
pub async fn delete(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<IntegrationId>,
) -> Result<StatusCode, ApiError> {
    let user_id = auth.require_auth()?;
    Integration::delete(id, user_id, &state.db_pool).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /integrations/:id/test - enqueue a test delivery
pub async fn test(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<IntegrationId>,
) -> Result<Json<Value>, ApiError> {
    let user_id = auth.require_auth()?;
    let integration = Integration::find_by_id(id, user_id, &state.db_pool).await?;

    state.webhooks.enqueue(WebhookDelivery {
        target_url: integration.target_url,
        secret: integration.secret,
        event: "integration.test".to_string(),
        payload: json!({ "integration_id": integration.id }),
    });

    Ok(Json(json!({ "enqueued": true })))
}
