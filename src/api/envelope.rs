//! Response envelope shared by all endpoints.
//!
//! Success: `{ "data": T, "meta": { ... } }`
//! Error:   `{ "error": { "code": "...", "message": "..." }, "meta": { ... } }`

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

/// API version reported in every response.
pub const API_VERSION: &str = "1";

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub generated_at: DateTime<Utc>,
    pub version: &'static str,
}

impl ResponseMeta {
    fn now() -> Self {
        Self {
            generated_at: Utc::now(),
            version: API_VERSION,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Response {
        let body = Self {
            data,
            meta: ResponseMeta::now(),
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

/// Request failures, rendered as the error envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No refresh tick has completed yet
    #[error("No data yet: waiting for the first refresh tick")]
    NotReady,

    #[error("{0}")]
    BadRequest(String),

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotReady => "SERVICE_UNAVAILABLE",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Validation(_) => "VALIDATION_FAILED",
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Validation(errors) => ApiError::Validation(errors),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
    meta: ResponseMeta,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
            },
            meta: ResponseMeta::now(),
        };
        (self.status(), Json(body)).into_response()
    }
}
