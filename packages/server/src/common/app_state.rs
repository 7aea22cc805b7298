//! Request-scoped authentication state.

use crate::common::errors::ApiError;
use crate::common::UserId;

/// Who is making the current request.
///
/// Populated by the JWT middleware; the same for all domains. Domain
/// handlers call `require_auth`/`require_admin` to enforce access.
#[derive(Clone, Default)]
pub struct RequestAuth {
    /// The authenticated user's ID, if any.
    pub user_id: Option<UserId>,
    /// Whether the user has admin privileges.
    pub is_admin: bool,
}

impl RequestAuth {
    /// State for an authenticated user.
    pub fn authenticated(user_id: UserId, is_admin: bool) -> Self {
        Self {
            user_id: Some(user_id),
            is_admin,
        }
    }

    /// State for an unauthenticated/anonymous request.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Require the caller to be authenticated, returning their ID.
    pub fn require_auth(&self) -> Result<UserId, ApiError> {
        self.user_id.ok_or(ApiError::AuthenticationRequired)
    }

    /// Require the caller to be an admin.
    pub fn require_admin(&self) -> Result<UserId, ApiError> {
        let user_id = self.require_auth()?;
        if !self.is_admin {
            return Err(ApiError::PermissionDenied(
                "Admin access required".to_string(),
            ));
        }
        Ok(user_id)
    }
}
