//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing setting: {0}")]
    Missing(&'static str),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// The four failure classes callers can distinguish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    Addressing,
    Projection,
    StorageConflict,
    StorageFatal,
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("unknown address: {0}")]
    UnknownAddress(String),
    #[error("{operation} not supported for address {address}")]
    UnsupportedOperation {
        operation: &'static str,
        address: String,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("invalid sort order: {0}")]
    InvalidSortOrder(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("schema: {0}")]
    Schema(String),
    #[error("storage: {0}")]
    Storage(sqlx::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ProviderError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProviderError::UnknownAddress(_)
            | ProviderError::UnsupportedOperation { .. }
            | ProviderError::NotFound(_) => ErrorCategory::Addressing,
            ProviderError::UnknownColumn(_)
            | ProviderError::InvalidSortOrder(_)
            | ProviderError::Validation(_) => ErrorCategory::Projection,
            ProviderError::Conflict(_) => ErrorCategory::StorageConflict,
            ProviderError::Schema(_) | ProviderError::Storage(_) | ProviderError::Config(_) => {
                ErrorCategory::StorageFatal
            }
        }
    }

    /// Structured context for the error envelope, where the variant carries any.
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ProviderError::UnknownAddress(address) | ProviderError::NotFound(address) => {
                Some(json!({ "address": address }))
            }
            ProviderError::UnsupportedOperation { operation, address } => {
                Some(json!({ "operation": operation, "address": address }))
            }
            _ => None,
        }
    }
}

/// Constraint violations become `Conflict`; everything else stays a storage failure.
impl From<sqlx::Error> for ProviderError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if !matches!(db.kind(), sqlx::error::ErrorKind::Other) {
                return ProviderError::Conflict(db.message().to_string());
            }
        }
        ProviderError::Storage(e)
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ProviderError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ProviderError::UnknownAddress(_) => (StatusCode::NOT_FOUND, "unknown_address"),
            ProviderError::UnsupportedOperation { .. } => {
                (StatusCode::METHOD_NOT_ALLOWED, "unsupported_operation")
            }
            ProviderError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ProviderError::UnknownColumn(_) => (StatusCode::BAD_REQUEST, "unknown_column"),
            ProviderError::InvalidSortOrder(_) => (StatusCode::BAD_REQUEST, "invalid_sort_order"),
            ProviderError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            ProviderError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ProviderError::Schema(_) => (StatusCode::INTERNAL_SERVER_ERROR, "schema_error"),
            ProviderError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            ProviderError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: ProviderError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn addressing_errors_carry_the_address() {
        let (status, body) = body_of(ProviderError::UnsupportedOperation {
            operation: "insert",
            address: "content://a/hosted_apps/1".into(),
        })
        .await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"]["code"], "unsupported_operation");
        assert_eq!(body["error"]["details"]["operation"], "insert");
        assert_eq!(body["error"]["details"]["address"], "content://a/hosted_apps/1");
    }

    #[tokio::test]
    async fn other_errors_omit_details() {
        let (status, body) = body_of(ProviderError::Validation("empty".into())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].get("details").is_none());
    }

    #[test]
    fn categories_follow_the_failure_class() {
        assert_eq!(
            ProviderError::UnknownAddress("x".into()).category(),
            ErrorCategory::Addressing
        );
        assert_eq!(
            ProviderError::InvalidSortOrder("x".into()).category(),
            ErrorCategory::Projection
        );
        assert_eq!(ProviderError::Conflict("x".into()).category(), ErrorCategory::StorageConflict);
        assert_eq!(ProviderError::Schema("x".into()).category(), ErrorCategory::StorageFatal);
    }
}
