//! # API Error Types
//!
//! Unified error handling for the GraphQL and REST layers.

use async_graphql::{Error as GraphQLError, ErrorExtensions};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// API-level errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Entity not found: {entity_type} with id '{id}'")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    pub fn truck_not_found(id: u32) -> Self {
        Self::NotFound {
            entity_type: "truck".to_string(),
            id: id.to_string(),
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get error code for GraphQL extensions
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidInput(_) => "INVALID_INPUT",
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> GraphQLError {
        GraphQLError::new(self.to_string()).extend_with(|_, e| {
            e.set("code", self.error_code());
            e.set("status", self.status_code().as_u16());

            if let Self::NotFound { entity_type, id } = self {
                e.set("entity_type", entity_type.as_str());
                e.set("entity_id", id.as_str());
            }
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": {
                "message": self.to_string(),
                "code": self.error_code(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;
