//! Login lockout: 5 consecutive failures within 15 minutes locks the
//! account until the window passes. A successful login resets the count.

use anyhow::Result;
use sqlx::PgPool;

use crate::common::UserId;
use crate::domains::security::SecurityEvent;

pub const MAX_FAILED_ATTEMPTS: i64 = 5;
pub const LOCKOUT_WINDOW_MINUTES: i64 = 15;

/// Whether the account is currently locked out.
pub async fn is_locked_out(user_id: UserId, pool: &PgPool) -> Result<bool> {
    let window_start = chrono::Utc::now() - chrono::Duration::minutes(LOCKOUT_WINDOW_MINUTES);
    let failures = SecurityEvent::failed_logins_since(user_id, window_start, pool).await?;
    Ok(failures >= MAX_FAILED_ATTEMPTS)
}
