use axum::extract::{Extension, Query};
use axum::Json;

use crate::common::{ApiError, ListParams, Page, RequestAuth};
use crate::domains::security::SecurityEvent;
use crate::server::app::AppState;

/// GET /security/events
pub async fn list_events(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<SecurityEvent>>, ApiError> {
    let user_id = auth.require_auth()?;
    let limit = params.limit();
    let rows =
        SecurityEvent::list_for_user(user_id, params.after_id()?, limit, &state.db_pool).await?;
    Ok(Json(Page::from_rows(rows, limit, |e| *e.id.as_uuid())))
}
