use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::parser::ParseError;

/// Failure envelope returned by every endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Parse(ParseError::Configuration(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Parse(ParseError::Dependency(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Value of the envelope's `error` field.
    pub fn label(&self) -> &'static str {
        match self.status() {
            StatusCode::BAD_REQUEST => "Validation Error",
            StatusCode::UNPROCESSABLE_ENTITY => "Parsing Failed",
            StatusCode::SERVICE_UNAVAILABLE => "Service Unavailable",
            _ => "Internal Server Error",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Validation(message) => warn!("Rejected request: {}", message),
            Self::Parse(e) if status.is_server_error() => error!(kind = e.kind(), "{}", e),
            Self::Parse(e) => warn!(kind = e.kind(), "{}", e),
        }

        let body = ErrorResponse {
            success: false,
            error: self.label().to_string(),
            message: self.to_string(),
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}
