use std::collections::HashMap;

use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::common::{ApiError, ListParams, Page, RequestAuth, TemplateId};
use crate::domains::templates::models::{CreateTemplate, EmailTemplate, UpdateTemplate};
use crate::domains::templates::render;
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    /// Example values for the template's variables
    #[serde(default)]
    pub context: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// POST /templates
pub async fn create(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Json(body): Json<CreateTemplate>,
) -> Result<(StatusCode, Json<EmailTemplate>), ApiError> {
    let user_id = auth.require_auth()?;
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    let template = EmailTemplate::create(user_id, body, &state.db_pool).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// GET /templates
pub async fn list(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<EmailTemplate>>, ApiError> {
    let user_id = auth.require_auth()?;
    let limit = params.limit();
    let rows = EmailTemplate::list(user_id, params.after_id()?, limit, &state.db_pool).await?;
    Ok(Json(Page::from_rows(rows, limit, |t| *t.id.as_uuid())))
}

/// GET /templates/:id
pub async fn get_one(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<TemplateId>,
) -> Result<Json<EmailTemplate>, ApiError> {
    let user_id = auth.require_auth()?;
    let template = EmailTemplate::find_by_id(id, user_id, &state.db_pool).await?;
    Ok(Json(template))
}

/// PATCH /templates/:id
pub async fn update(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<TemplateId>,
    Json(body): Json<UpdateTemplate>,
) -> Result<Json<EmailTemplate>, ApiError> {
    let user_id = auth.require_auth()?;
    let template = EmailTemplate::update(id, user_id, body, &state.db_pool).await?;
    Ok(Json(template))
}

/// DELETE /templates/:id
pub async fn delete(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<TemplateId>,
) -> Result<StatusCode, ApiError> {
    let user_id = auth.require_auth()?;
    EmailTemplate::delete(id, user_id, &state.db_pool).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /templates/:id/preview
pub async fn preview(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<TemplateId>,
    Json(body): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let user_id = auth.require_auth()?;
    let template = EmailTemplate::find_by_id(id, user_id, &state.db_pool).await?;
    let rendered = render::render(&template.subject, &template.body, &body.context)?;
    Ok(Json(PreviewResponse {
        subject: rendered.subject,
        text_body: rendered.text_body,
        html_body: rendered.html_body,
    }))
}
