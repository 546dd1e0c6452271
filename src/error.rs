use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::trtc::{RemoteError, SigningError};

/// Everything a handler can fail with, mapped onto an HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        required: Vec<&'static str>,
        missing: Vec<&'static str>,
    },
    #[error(transparent)]
    Signing(#[from] SigningError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            required: Vec::new(),
            missing: Vec::new(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({ "error": self.to_string() });
        if let ApiError::Validation {
            required, missing, ..
        } = self
        {
            if !required.is_empty() {
                body["required"] = json!(required);
            }
            if !missing.is_empty() {
                body["missing"] = json!(missing);
            }
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}
