use std::sync::Arc;

use axum::{middleware::Next, response::Response};
use tracing::debug;

use crate::common::{RequestAuth, UserId};
use crate::domains::auth::JwtService;

/// JWT authentication middleware
///
/// Extracts the bearer token from the Authorization header, verifies it,
/// and inserts `RequestAuth` into request extensions. Requests without a
/// valid session token continue as anonymous; handlers decide whether
/// auth is required.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth = extract_request_auth(&request, &jwt_service);

    if let Some(user_id) = auth.user_id {
        debug!(%user_id, is_admin = auth.is_admin, "Authenticated request");
    }
    request.extensions_mut().insert(auth);

    next.run(request).await
}

/// Extract and verify the session token from a request
fn extract_request_auth(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> RequestAuth {
    let Some(auth_header) = request.headers().get("authorization") else {
        return RequestAuth::anonymous();
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return RequestAuth::anonymous();
    };
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);

    // Pending two-factor tokens are not sessions; they are only accepted
    // by the verification endpoint, which reads the raw header itself.
    match jwt_service.verify_session_token(token) {
        Ok(claims) => RequestAuth::authenticated(UserId::from_uuid(claims.user_id), claims.is_admin),
        Err(_) => RequestAuth::anonymous(),
    }
}
