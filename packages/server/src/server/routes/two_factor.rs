use axum::extract::Extension;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::common::{ApiError, RequestAuth, UserId};
use crate::domains::auth::models::User;
use crate::domains::auth::password;
use crate::domains::security::{SecurityEvent, SecurityEventType};
use crate::domains::two_factor::{totp, TwoFactor};
use crate::server::app::AppState;
use crate::server::middleware::ClientIp;

#[derive(Debug, Deserialize)]
pub struct PasswordCheckRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct EnableResponse {
    pub secret: String,
    pub otpauth_url: String,
    /// Shown exactly once; only hashes are stored
    pub backup_codes: Vec<String>,
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

/// POST /two-factor/enable
pub async fn enable(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    ip: Option<Extension<ClientIp>>,
    headers: HeaderMap,
    Json(body): Json<PasswordCheckRequest>,
) -> Result<Json<EnableResponse>, ApiError> {
    let user_id = auth.require_auth()?;
    let user = User::find_by_id(user_id, &state.db_pool).await?;

    password::verify_password(&body.password, &user.password_hash)
        .map_err(|_| ApiError::bad_request("Password is incorrect"))?;

    let secret = totp::generate_secret()?;
    let otpauth_url = totp::build_totp(&secret, &user.email, &state.totp_issuer)?.get_url();
    let backup_codes = totp::generate_backup_codes();
    let hashes = totp::hash_backup_codes(&backup_codes)?;

    TwoFactor::upsert(user_id, &secret, &hashes, &state.db_pool).await?;
    User::set_two_factor_enabled(user_id, true, &state.db_pool).await?;

    SecurityEvent::record(
        user_id,
        SecurityEventType::TwoFactorEnabled,
        client_ip(&ip),
        user_agent(&headers),
        &state.db_pool,
    )
    .await?;

    Ok(Json(EnableResponse {
        secret,
        otpauth_url,
        backup_codes,
    }))
}

/// POST /two-factor/verify
///
/// Exchanges the pending token from login plus a TOTP code (or a backup
/// code, which is consumed) for a full session token.
pub async fn verify(
    Extension(state): Extension<AppState>,
    ip: Option<Extension<ClientIp>>,
    headers: HeaderMap,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<Value>, ApiError> {
    let claims = pending_claims(&state, &headers)?;
    let user_id = UserId::from_uuid(claims.user_id);
    let user = User::find_by_id(user_id, &state.db_pool).await?;

    let record = TwoFactor::find_for_user(user_id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::bad_request("Two-factor is not enabled"))?;

    let totp_ok = totp::check_code(&record.totp_secret, &user.email, &state.totp_issuer, &body.code)?;
    if !totp_ok {
        let hashes = record.backup_code_hashes()?;
        let Some(remaining) = totp::consume_backup_code(&body.code, &hashes) else {
            return Err(ApiError::bad_request("Invalid two-factor code"));
        };
        TwoFactor::update_backup_codes(user_id, &remaining, &state.db_pool).await?;
        SecurityEvent::record(
            user_id,
            SecurityEventType::BackupCodeUsed,
            client_ip(&ip),
            user_agent(&headers),
            &state.db_pool,
        )
        .await?;
    }

    SecurityEvent::record(
        user_id,
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

/// POST /two-factor/disable
pub async fn disable(
    Extension(state): Extension<AppState>,
    Extension(auth): Extension<RequestAuth>,
    ip: Option<Extension<ClientIp>>,
    headers: HeaderMap,
    Json(body): Json<PasswordCheckRequest>,
) -> Result<Json<Value>, ApiError> {
    let user_id = auth.require_auth()?;
    let user = User::find_by_id(user_id, &state.db_pool).await?;

    password::verify_password(&body.password, &user.password_hash)
        .map_err(|_| ApiError::bad_request("Password is incorrect"))?;

    TwoFactor::delete(user_id, &state.db_pool).await?;
    User::set_two_factor_enabled(user_id, false, &state.db_pool).await?;

    SecurityEvent::record(
        user_id,
        SecurityEventType::TwoFactorDisabled,
        client_ip(&ip),
        user_agent(&headers),
        &state.db_pool,
    )
    .await?;

    Ok(Json(json!({ "disabled": true })))
}

/// The pending-scope claims from the Authorization header. Session tokens
/// are rejected here; this endpoint only completes a login in progress.
fn pending_claims(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<crate::domains::auth::Claims, ApiError> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.strip_prefix("Bearer ").unwrap_or(s))
        .ok_or(ApiError::AuthenticationRequired)?;

    state
        .jwt_service
        .verify_pending_token(token)
        .map_err(|_| ApiError::InvalidToken)
}
