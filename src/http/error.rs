//! HTTP error responses.
//!
//! Every failure is rendered as `{"error": "<message>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::storage::StorageError;

/// Error type for request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Todos los campos son obligatorios")]
    MissingFields,

    #[error("{0}")]
    InvalidBody(String),

    #[error("Venta no encontrada")]
    NotFound,

    #[error("Error interno del servidor")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Storage(e) = &self {
            tracing::error!(error = %e, "Storage failure while handling request");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_not_found_maps_to_404() {
        let err = ApiError::from(StorageError::NotFound(3));
        assert!(matches!(err, ApiError::NotFound));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_database_errors_map_to_500() {
        let err = ApiError::from(StorageError::Database(rusqlite::Error::InvalidQuery));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Error interno del servidor");
    }

    #[test]
    fn test_missing_fields_is_bad_request() {
        assert_eq!(ApiError::MissingFields.status(), StatusCode::BAD_REQUEST);
    }
}
