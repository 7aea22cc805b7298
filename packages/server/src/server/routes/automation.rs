use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::Json;

use crate::common::{ApiError, ListParams, Page, RequestAuth, RuleId};
use crate::domains::automation::models::{AutomationRule, CreateRule, UpdateRule};
use crate::server::app::AppState;

/// POST /automation/rules
pub async fn create(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Json(body): Json<CreateRule>,
) -> Result<(StatusCode, Json<AutomationRule>), ApiError> {
    let user_id = auth.require_auth()?;
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    let rule = AutomationRule::create(user_id, body, &state.db_pool).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

/// GET /automation/rules
pub async fn list(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<AutomationRule>>, ApiError> {
    let user_id = auth.require_auth()?;
    let limit = params.limit();
    let rows = AutomationRule::list(user_id, params.after_id()?, limit, &state.db_pool).await?;
    Ok(Json(Page::from_rows(rows, limit, |r| *r.id.as_uuid())))
}

/// GET /automation/rules/:id
pub async fn get_one(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<RuleId>,
) -> Result<Json<AutomationRule>, ApiError> {
    let user_id = auth.require_auth()?;
    let rule = AutomationRule::find_by_id(id, user_id, &state.db_pool).await?;
    Ok(Json(rule))
}

/// PATCH /automation/rules/:id
pub async fn update(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<RuleId>,
    Json(body): Json<UpdateRule>,
) -> Result<Json<AutomationRule>, ApiError> {
    let user_id = auth.require_auth()?;
    let rule = AutomationRule::update(id, user_id, body, &state.db_pool).await?;
    Ok(Json(rule))
}

/// DELETE /automation/rules/:id
pub async fn delete(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<RuleId>,
) -> Result<StatusCode, ApiError> {
    let user_id = auth.require_auth()?;
    AutomationRule::delete(id, user_id, &state.db_pool).await?;
    Ok(StatusCode::NO_CONTENT)
}
