//! JSON error bodies for the HTTP surface.
//!
//! Every failure is reported as `{ "error": <message>, "code": <CODE> }` with a status derived
//! from the code.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::foundation::error::BratError;

/// Machine-readable error code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// `text` was absent, empty or whitespace-only.
    MissingText,
    /// A query parameter could not be parsed.
    InvalidInput,
    /// Rendering or encoding failed.
    GenerationFailed,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::MissingText | Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::GenerationFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error returned by handlers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    #[serde(rename = "error")]
    pub message: String,
    /// Code the status is derived from.
    pub code: ErrorCode,
}

impl ApiError {
    /// Build an error with an explicit code.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    /// The request carried no usable text.
    pub fn missing_text() -> Self {
        Self::new(ErrorCode::MissingText, "query parameter 'text' is required")
    }

    /// A query parameter was malformed.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Status the response will carry.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl From<BratError> for ApiError {
    fn from(err: BratError) -> Self {
        if err.is_caller_error() {
            Self::invalid_input(err.to_string())
        } else {
            Self::new(ErrorCode::GenerationFailed, err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
