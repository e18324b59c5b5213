use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// Standard error payload returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Not Found",
    "message": "Order ORD-20260314-9F3A2C1B not found",
    "details": null,
    "timestamp": "2026-03-14T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    #[schema(example = "Not Found")]
    pub error: String,
    /// Human-readable error description
    #[schema(example = "Order ORD-20260314-9F3A2C1B not found")]
    pub message: String,
    /// Additional error details where safe to expose
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    #[schema(example = "2026-03-14T10:30:00.000Z")]
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid price format: {0:?}")]
    InvalidPriceFormat(String),

    #[error("Buyer profile could not be created: {0}")]
    ProfileCreationFailed(String),

    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    /// Returns the HTTP status code for this error.
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::InvalidPriceFormat(_) => StatusCode::BAD_REQUEST,
            Self::ProfileCreationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::PaymentFailed(_) => StatusCode::PAYMENT_REQUIRED,
            Self::InvalidTransition(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::ConfigError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::ConfigError(_) | Self::InternalError(_) => {
                "Internal server error".to_string()
            }
            Self::GatewayUnavailable(_) => {
                "Payment gateway unavailable, please retry in a moment".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_unavailable_maps_to_bad_gateway() {
        let err = ServiceError::GatewayUnavailable("connect timeout".into());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.response_message().contains("retry"));
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = ServiceError::InternalError("secret table missing".into());
        assert_eq!(err.response_message(), "Internal server error");
    }

    #[test]
    fn invalid_transition_is_a_conflict() {
        let err = ServiceError::InvalidTransition("completed -> pending".into());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
