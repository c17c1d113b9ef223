//! Application error type shared by every layer.
//!
//! [`AppError`] carries enough information to be mapped to an HTTP status at
//! the API boundary. Storage, validation and lookup failures are never
//! swallowed: services return them as-is and handlers convert them via
//! [`IntoResponse`].

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serializable error description returned to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input reached the service (e.g. an unparsable URL).
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// A uniqueness constraint was violated in a way the caller did not expect.
    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// Every collision retry produced a code that was already taken.
    #[error("Failed to allocate a unique short code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: usize },

    /// The persistence backend timed out or could not be reached.
    #[error("{message}")]
    StorageUnavailable { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn storage_unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "invalid_input"),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
            AppError::CodeSpaceExhausted { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "code_space_exhausted")
            }
            AppError::StorageUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")
            }
            AppError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Builds the client-facing error description.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (_, code) = self.status_and_code();
        let details = match self {
            AppError::Validation { details, .. }
            | AppError::NotFound { details, .. }
            | AppError::Conflict { details, .. }
            | AppError::StorageUnavailable { details, .. }
            | AppError::Internal { details, .. } => details.clone(),
            AppError::CodeSpaceExhausted { attempts } => json!({ "attempts": attempts }),
        };

        ErrorInfo {
            code,
            message: self.to_string(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::bad_request(
            "Invalid request body",
            json!({ "reason": e.body_text(), "status": e.status().as_u16() }),
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::bad_request("Invalid request", json!({ "reason": e.to_string() }))
    }
}

/// SQLSTATE raised when `statement_timeout` cancels a query.
const QUERY_CANCELED: &str = "57014";

/// Maps a SQLx error onto the application taxonomy.
///
/// Pool timeouts, closed pools, I/O and TLS failures and cancelled statements
/// become [`AppError::StorageUnavailable`]; unique violations become
/// [`AppError::Conflict`] carrying the constraint name.
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": db.constraint() }),
            );
        }
        if db.code().as_deref() == Some(QUERY_CANCELED) {
            return AppError::storage_unavailable(
                "Storage timed out",
                json!({ "reason": db.message() }),
            );
        }
    }

    if matches!(
        e,
        sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed
    ) {
        return AppError::storage_unavailable(
            "Storage unavailable",
            json!({ "reason": e.to_string() }),
        );
    }

    tracing::error!("Database error: {}", e);
    AppError::internal("Database error", json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::bad_request("bad", json!({})), StatusCode::BAD_REQUEST),
            (AppError::not_found("missing", json!({})), StatusCode::NOT_FOUND),
            (AppError::conflict("dup", json!({})), StatusCode::CONFLICT),
            (
                AppError::CodeSpaceExhausted { attempts: 5 },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::storage_unavailable("down", json!({})),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::internal("boom", json!({})),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_and_code().0, expected);
        }
    }

    #[test]
    fn test_error_info_carries_details() {
        let err = AppError::not_found("Short link not found", json!({ "code": "abc" }));
        let info = err.to_error_info();

        assert_eq!(info.code, "not_found");
        assert_eq!(info.message, "Short link not found");
        assert_eq!(info.details["code"], "abc");
    }

    #[test]
    fn test_code_space_exhausted_message() {
        let err = AppError::CodeSpaceExhausted { attempts: 5 };
        assert!(err.to_string().contains("5 attempts"));
        assert_eq!(err.to_error_info().details["attempts"], 5);
    }

    #[test]
    fn test_pool_timeout_is_storage_unavailable() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::StorageUnavailable { .. }));
    }

    #[test]
    fn test_pool_closed_is_storage_unavailable() {
        let err = map_sqlx_error(sqlx::Error::PoolClosed);
        assert!(matches!(err, AppError::StorageUnavailable { .. }));
    }

    #[test]
    fn test_row_not_found_is_internal() {
        let err = map_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_json_rejection_uses_error_envelope() {
        use axum::{body::Body, extract::FromRequest, http::Request};

        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let rejection = Json::<Value>::from_request(request, &()).await.unwrap_err();

        let err = AppError::from(rejection);

        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(err.status_and_code().1, "invalid_input");
        assert_eq!(err.to_error_info().details["status"], 400);
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::bad_request("Invalid URL format", json!({})).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
