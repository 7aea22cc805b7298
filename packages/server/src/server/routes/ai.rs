use axum::extract::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::common::{ApiError, ContactId, RequestAuth, TemplateId};
use crate::domains::ai::{generate_pitch, generate_subject_lines, improve_draft, PitchDraft};
use crate::domains::contacts::models::Contact;
use crate::domains::templates::models::EmailTemplate;
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct PitchRequest {
    pub contact_id: ContactId,
    /// What is being pitched - a track, release, or show
    pub track_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubjectLinesRequest {
    pub template_id: TemplateId,
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    5
}

#[derive(Debug, Deserialize)]
pub struct ImproveRequest {
    pub body: String,
    pub instructions: String,
}

#[derive(Debug, Serialize)]
pub struct SubjectLinesResponse {
    pub subject_lines: Vec<String>,
}

/// POST /ai/pitch
pub async fn pitch(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Json(body): Json<PitchRequest>,
) -> Result<Json<PitchDraft>, ApiError> {
    let user_id = auth.require_auth()?;
    let contact = Contact::find_by_id(body.contact_id, user_id, &state.db_pool).await?;
    let draft = generate_pitch(
        state.ai.as_ref(),
        &contact,
        body.track_description.as_deref(),
    )
    .await?;
    Ok(Json(draft))
}

/// POST /ai/subject-lines
pub async fn subject_lines(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Json(body): Json<SubjectLinesRequest>,
) -> Result<Json<SubjectLinesResponse>, ApiError> {
    let user_id = auth.require_auth()?;
    let template = EmailTemplate::find_by_id(body.template_id, user_id, &state.db_pool).await?;
    let lines = generate_subject_lines(
        state.ai.as_ref(),
        &template.subject,
        &template.body,
        body.count,
    )
    .await?;
    Ok(Json(SubjectLinesResponse {
        subject_lines: lines,
    }))
}

/// POST /ai/improve
pub async fn improve(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Json(body): Json<ImproveRequest>,
) -> Result<Json<Value>, ApiError> {
    auth.require_auth()?;
    if body.body.trim().is_empty() {
        return Err(ApiError::bad_request("Draft body is required"));
    }
    let rewritten = improve_draft(state.ai.as_ref(), &body.body, &body.instructions).await?;
    Ok(Json(json!({ "body": rewritten })))
}
