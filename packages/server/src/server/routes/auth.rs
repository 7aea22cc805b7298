use axum::extract::Extension;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::common::{ApiError, RequestAuth};
use crate::domains::auth::models::{CreateUser, User};
use crate::domains::auth::{lockout, password};
use crate::domains::security::{SecurityEvent, SecurityEventType};
use crate::server::app::AppState;
use crate::server::middleware::ClientIp;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

fn client_ip(ip: &Option<Extension<ClientIp>>) -> Option<String> {
    ip.as_ref().map(|Extension(ClientIp(ip))| ip.to_string())
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let trimmed = email.trim();
    if trimmed.len() < 3 || !trimmed.contains('@') || trimmed.contains(char::is_whitespace) {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    Ok(())
}

/// POST /auth/register
pub async fn register(
    Extension(state): Extension<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    validate_email(&body.email)?;
    password::validate_password(&body.password)?;
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }

    let user = User::create(
        CreateUser {
            email: body.email,
            password_hash: password::hash_password(&body.password)?,
            name: body.name.trim().to_string(),
        },
        &state.db_pool,
    )
    .await?;

    let token = state
        .jwt_service
        .create_token(*user.id.as_uuid(), user.email.clone(), user.is_admin)?;

    Ok(Json(SessionResponse { token, user }))
}

/// POST /auth/login
///
/// Two-step when two-factor is enabled: a valid password yields a
/// short-lived pending token instead of a session.
pub async fn login(
    Extension(state): Extension<AppState>,
    ip: Option<Extension<ClientIp>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let invalid = || ApiError::bad_request("Invalid email or password");

    let Some(user) = User::find_by_email(&body.email, &state.db_pool).await? else {
        return Err(invalid());
    };

    if lockout::is_locked_out(user.id, &state.db_pool).await? {
        return Err(ApiError::AccountLocked);
    }

    if password::verify_password(&body.password, &user.password_hash).is_err() {
        SecurityEvent::record(
            user.id,
            SecurityEventType::LoginFailed,
            client_ip(&ip),
            user_agent(&headers),
            &state.db_pool,
        )
        .await?;
        return Err(invalid());
    }

    if user.two_factor_enabled {
        let pending_token = state
            .jwt_service
            .create_pending_token(*user.id.as_uuid(), user.email.clone())?;
        return Ok(Json(json!({
            "two_factor_required": true,
            "pending_token": pending_token,
        })));
    }

    SecurityEvent::record(
        user.id,
        SecurityEventType::LoginSucceeded,
        client_ip(&ip),
        user_agent(&headers),
        &state.db_pool,
    )
    .await?;

    let token = state
        .jwt_service
        .create_token(*user.id.as_uuid(), user.email.clone(), user.is_admin)?;

    Ok(Json(json!({ "token": token, "user": user })))
}

/// GET /auth/me
pub async fn me(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
) -> Result<Json<User>, ApiError> {
    let user_id = auth.require_auth()?;
    let user = User::find_by_id(user_id, &state.db_pool).await?;
    Ok(Json(user))
}

/// PATCH /auth/me
pub async fn update_me(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let user_id = auth.require_auth()?;
    if let Some(email) = &body.email {
        validate_email(email)?;
    }
    let user = User::update_profile(user_id, body.name, body.email, &state.db_pool).await?;
    Ok(Json(user))
}

/// POST /auth/change-password
pub async fn change_password(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    ip: Option<Extension<ClientIp>>,
    headers: HeaderMap,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let user_id = auth.require_auth()?;
    let user = User::find_by_id(user_id, &state.db_pool).await?;

    password::verify_password(&body.current_password, &user.password_hash)
        .map_err(|_| ApiError::bad_request("Current password is incorrect"))?;
    password::validate_password(&body.new_password)?;

    let new_hash = password::hash_password(&body.new_password)?;
    User::update_password(user_id, &new_hash, &state.db_pool).await?;

    SecurityEvent::record(
        user_id,
        SecurityEventType::PasswordChanged,
        client_ip(&ip),
        user_agent(&headers),
        &state.db_pool,
    )
    .await?;

    Ok(Json(json!({ "changed": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("artist@example.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("has space@example.com").is_err());
        assert!(validate_email("a@").is_err());
    }
}
