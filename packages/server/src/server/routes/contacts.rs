use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::common::{ApiError, ContactId, ListParams, Page, RequestAuth};
use crate::domains::automation::{self, RuleTrigger, TriggerContext};
use crate::domains::contacts::import;
use crate::domains::contacts::models::{
    Contact, ContactFilters, ContactStatus, CreateContact, UpdateContact,
};
use crate::domains::integrations::fanout;
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct AddTagRequest {
    pub tag: String,
}

/// POST /contacts
pub async fn create(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Json(body): Json<CreateContact>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    let user_id = auth.require_auth()?;
    let contact = Contact::create(user_id, body, &state.db_pool).await?;

    let payload = json!({
        "contact_id": contact.id,
        "name": contact.name,
        "email": contact.email,
        "kind": contact.contact_kind,
    });
    fanout::emit_event(
        user_id,
        "contact.created",
        payload.clone(),
        &state.webhooks,
        &state.db_pool,
    )
    .await;
    automation::fire(
        RuleTrigger::ContactCreated,
        TriggerContext {
            user_id,
            contact_id: Some(contact.id),
            campaign_id: None,
            payload,
        },
        &state.notifier,
        &state.webhooks,
        &state.db_pool,
    )
    .await;

    Ok((StatusCode::CREATED, Json(contact)))
}

/// GET /contacts
pub async fn list(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Query(params): Query<ListParams>,
    Query(filters): Query<ContactFilters>,
) -> Result<Json<Page<Contact>>, ApiError> {
    let user_id = auth.require_auth()?;
    let limit = params.limit();
    let rows = Contact::list(user_id, &filters, params.after_id()?, limit, &state.db_pool).await?;
    Ok(Json(Page::from_rows(rows, limit, |c| *c.id.as_uuid())))
}

/// GET /contacts/:id
pub async fn get_one(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<ContactId>,
) -> Result<Json<Contact>, ApiError> {
    let user_id = auth.require_auth()?;
    let contact = Contact::find_by_id(id, user_id, &state.db_pool).await?;
    Ok(Json(contact))
}

/// PATCH /contacts/:id
pub async fn update(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<ContactId>,
    Json(body): Json<UpdateContact>,
) -> Result<Json<Contact>, ApiError> {
    let user_id = auth.require_auth()?;
    let engaged = body.status == Some(ContactStatus::Engaged);
    let contact = Contact::update(id, user_id, body, &state.db_pool).await?;

    if engaged {
        automation::fire(
            RuleTrigger::ContactEngaged,
            TriggerContext {
                user_id,
                contact_id: Some(contact.id),
                campaign_id: None,
                payload: json!({ "contact_id": contact.id, "name": contact.name }),
            },
            &state.notifier,
            &state.webhooks,
            &state.db_pool,
        )
        .await;
    }

    Ok(Json(contact))
}

/// DELETE /contacts/:id
pub async fn delete(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<ContactId>,
) -> Result<StatusCode, ApiError> {
    let user_id = auth.require_auth()?;
    Contact::delete(id, user_id, &state.db_pool).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /contacts/import - CSV body, `name,email,outlet,kind`
pub async fn import(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    body: String,
) -> Result<Json<import::ImportReport>, ApiError> {
    let user_id = auth.require_auth()?;
    let report = import::import_contacts(user_id, &body, &state.db_pool).await?;
    Ok(Json(report))
}

/// POST /contacts/:id/tags
pub async fn add_tag(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path(id): Path<ContactId>,
    Json(body): Json<AddTagRequest>,
) -> Result<Json<Contact>, ApiError> {
    let user_id = auth.require_auth()?;
    let tag = body.tag.trim();
    if tag.is_empty() {
        return Err(ApiError::bad_request("Tag cannot be empty"));
    }
    let contact = Contact::add_tag(id, user_id, tag, &state.db_pool).await?;
    Ok(Json(contact))
}

/// DELETE /contacts/:id/tags/:tag
pub async fn remove_tag(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Path((id, tag)): Path<(ContactId, String)>,
) -> Result<Json<Contact>, ApiError> {
    let user_id = auth.require_auth()?;
    let contact = Contact::remove_tag(id, user_id, &tag, &state.db_pool).await?;
    Ok(Json(contact))
}
