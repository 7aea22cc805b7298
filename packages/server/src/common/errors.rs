use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// API errors for the Encore platform.
///
/// Every route handler returns `Result<_, ApiError>`; the `IntoResponse`
/// impl maps variants to HTTP statuses and a JSON error body.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Too many failed attempts, try again later")]
    AccountLocked,

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthenticationRequired | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::AccountLocked => StatusCode::LOCKED,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            // Model methods use fetch_one; a missing row is a 404, not a 500
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::Conflict("Resource already exists".to_string())
            }
            // Deleting a row another table still references is a client
            // conflict, not a server fault
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                ApiError::Conflict("Resource is in use".to_string())
            }
            _ => ApiError::Database(err),
        }
    }
}

// Model methods return anyhow::Result, so database errors arrive wrapped.
// Unwrap them here so missing rows and unique violations keep their
// status codes instead of collapsing into 500s.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<sqlx::Error>() {
            Ok(db_err) => ApiError::from(db_err),
            Err(other) => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details stay in the logs, not the response body
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::AuthenticationRequired.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::not_found("missing").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::conflict("dup").status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::AccountLocked.status(), StatusCode::LOCKED);
    }

    #[test]
    fn test_row_not_found_becomes_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_wrapped_db_errors_keep_their_status() {
        let err: ApiError = anyhow::Error::from(sqlx::Error::RowNotFound).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = anyhow::anyhow!("something else").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
