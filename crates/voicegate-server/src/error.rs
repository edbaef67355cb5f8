use actix_web::{HttpResponse, ResponseError};
use std::fmt;
use voicegate::{PlanInputError, QuotaError};

#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed input
    InvalidArgument(String),
    /// No valid caller credential
    Unauthenticated,
    /// Free-tier quota reached
    ResourceExhausted(String),
    /// Speech provider failure; the message is passed to the caller
    Synthesis(String),
    /// Database error
    Database(rusqlite::Error),
    /// Internal error; detail is logged, never returned
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            ApiError::Unauthenticated => write!(f, "authentication required"),
            ApiError::ResourceExhausted(msg) => write!(f, "resource exhausted: {}", msg),
            ApiError::Synthesis(msg) => write!(f, "synthesis failed: {}", msg),
            ApiError::Database(e) => write!(f, "database error: {}", e),
            ApiError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        ApiError::Database(e)
    }
}

impl From<QuotaError> for ApiError {
    fn from(e: QuotaError) -> Self {
        ApiError::ResourceExhausted(e.to_string())
    }
}

impl From<PlanInputError> for ApiError {
    fn from(e: PlanInputError) -> Self {
        ApiError::InvalidArgument(e.to_string())
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::InvalidArgument(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid_argument",
                "message": msg
            })),
            ApiError::Unauthenticated => HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "unauthenticated",
                "message": "Authentication required"
            })),
            ApiError::ResourceExhausted(msg) => {
                HttpResponse::TooManyRequests().json(serde_json::json!({
                    "error": "resource_exhausted",
                    "message": msg
                }))
            }
            ApiError::Synthesis(msg) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal",
                    "message": msg
                }))
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal_error",
                    "message": "An internal error occurred"
                }))
            }
            ApiError::Database(e) => {
                tracing::error!("Database error: {}", e);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal_error",
                    "message": "An internal error occurred"
                }))
            }
        }
    }
}
