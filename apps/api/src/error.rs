//! # API Error Mapping
//!
//! Every handler returns `ApiResult<T>`; the error side renders as
//! `{ "code": "...", "message": "..." }` with a status derived from the
//! domain classification.
//!
//! ```text
//! ┌──────────────────────────────┬────────┬────────────────────┐
//! │ Source                       │ Status │ code               │
//! ├──────────────────────────────┼────────┼────────────────────┤
//! │ ErrorKind::Validation        │ 400    │ VALIDATION_ERROR   │
//! │ malformed JSON / query       │ 400    │ VALIDATION_ERROR   │
//! │ ErrorKind::NotFound          │ 404    │ NOT_FOUND          │
//! │ ErrorKind::Conflict          │ 409    │ CONFLICT           │
//! │ DbError::UniqueViolation     │ 409    │ CONFLICT           │
//! │ any other DbError            │ 500    │ INTERNAL_ERROR     │
//! └──────────────────────────────┴────────┴────────────────────┘
//! ```
//!
//! Storage failures are logged in full and reported to the client with a
//! generic message.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mostrador_core::ErrorKind;
use mostrador_db::DbError;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Result type for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Serialized error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Errors returned by route handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or rule-breaking input (400)
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist (404)
    #[error("{0}")]
    NotFound(String),

    /// Request conflicts with current state (409)
    #[error("{0}")]
    Conflict(String),

    /// Storage or integrity failure (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(detail) => {
                error!(target: "storage", error = %detail, "Request failed on storage");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorBody {
            code: self.code().to_string(),
            message,
        });

        (self.status(), body).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err.kind() {
            Some(ErrorKind::Validation) => ApiError::Validation(err.to_string()),
            Some(ErrorKind::NotFound) => ApiError::NotFound(err.to_string()),
            Some(ErrorKind::Conflict) => ApiError::Conflict(err.to_string()),
            None => match err {
                DbError::UniqueViolation { .. } => ApiError::Conflict(err.to_string()),
                other => ApiError::Internal(other.to_string()),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mostrador_core::{CoreError, Money, ValidationError};

    #[test]
    fn test_domain_errors_map_to_status() {
        let validation: ApiError = DbError::from(ValidationError::required("items")).into();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.code(), "VALIDATION_ERROR");

        let missing: ApiError = DbError::not_found("Sale", "s-1").into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let conflict: ApiError = DbError::from(CoreError::CreditLimitExceeded {
            client_id: "c-1".to_string(),
            limit: Money::from_cents(20_000),
            outstanding: Money::from_cents(15_000),
            requested: Money::from_cents(10_000),
        })
        .into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        assert_eq!(conflict.code(), "CONFLICT");
    }

    #[test]
    fn test_storage_errors_are_internal() {
        let unique: ApiError = DbError::duplicate("sales.id", "s-1").into();
        assert_eq!(unique.status(), StatusCode::CONFLICT);

        let storage: ApiError = DbError::QueryFailed("disk I/O error".to_string()).into();
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(storage.code(), "INTERNAL_ERROR");
    }
}
