use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::{ApiError, ListParams, NotificationId, Page, RequestAuth};
use crate::domains::notifications::models::{DeviceToken, Notification};
use crate::server::app::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationFilter {
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeviceTokenRequest {
    pub token: String,
    #[serde(default = "default_platform")]
    pub platform: String,
}

fn default_platform() -> String {
    "unknown".to_string()
}

/// GET /notifications
pub async fn list(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Query(params): Query<ListParams>,
    Query(filter): Query<NotificationFilter>,
) -> Result<Json<Page<Notification>>, ApiError> {
    let user_id = auth.require_auth()?;
    let limit = params.limit();
    let rows = Notification::list(
        user_id,
        filter.unread,
        params.after_id()?,
        limit,
        &state.db_pool,
    )
    .await?;
    Ok(Json(Page::from_rows(rows, limit, |n| *n.id.as_uuid())))
}

/// POST /notifications/:id/read
pub async fn mark_read(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<NotificationId>,
) -> Result<Json<Notification>, ApiError> {
    let user_id = auth.require_auth()?;
    let notification = Notification::mark_read(id, user_id, &state.db_pool).await?;
    Ok(Json(notification))
}

/// POST /notifications/read-all
pub async fn mark_all_read(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
) -> Result<Json<Value>, ApiError> {
    let user_id = auth.require_auth()?;
    let updated = Notification::mark_all_read(user_id, &state.db_pool).await?;
    Ok(Json(json!({ "updated": updated })))
}

/// DELETE /notifications/:id
pub async fn delete(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode, ApiError> {
    let user_id = auth.require_auth()?;
    Notification::delete(id, user_id, &state.db_pool).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /device-tokens
pub async fn register_device(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Json(body): Json<DeviceTokenRequest>,
) -> Result<(StatusCode, Json<DeviceToken>), ApiError> {
    let user_id = auth.require_auth()?;
    if body.token.trim().is_empty() {
        return Err(ApiError::bad_request("Push token is required"));
    }
    let token =
        DeviceToken::register(user_id, body.token.trim(), &body.platform, &state.db_pool).await?;
    Ok((StatusCode::CREATED, Json(token)))
}

/// DELETE /device-tokens
pub async fn unregister_device(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Json(body): Json<DeviceTokenRequest>,
) -> Result<StatusCode, ApiError> {
    let user_id = auth.require_auth()?;
    DeviceToken::unregister(user_id, body.token.trim(), &state.db_pool).await?;
    Ok(StatusCode::NO_CONTENT)
}
