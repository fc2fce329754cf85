use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::query::QueryError;

// ============================================================================
// API Errors - retrieval failures mapped onto HTTP
// ============================================================================
//
// 400  unsupported / invalid pagination, unknown order status, bad query string
// 404  unknown endpoint version
// 503  transient store failure (unavailable, timeout)
// 500  other store failures, detached access
//
// Body: { "error": <kind>, "message": <detail> }
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("unknown order status '{0}', expected ORDER or CANCEL")]
    InvalidStatus(String),

    #[error("invalid query string: {0}")]
    InvalidQuery(String),

    #[error("no order listing for version '{0}'")]
    UnknownVersion(String),

    #[error("metrics encoding failed: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Query(err) => err.kind(),
            ApiError::InvalidStatus(_) => "invalid_status",
            ApiError::InvalidQuery(_) => "invalid_query",
            ApiError::UnknownVersion(_) => "unknown_version",
            ApiError::Metrics(_) => "internal",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Query(err) if err.is_bad_request() => StatusCode::BAD_REQUEST,
            ApiError::Query(QueryError::Store(err)) if err.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Query(_) | ApiError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidStatus(_) | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownVersion(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        }))
    }
}
