use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid parameter {field}: {message}")]
    Validation { field: String, message: String },

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("invalid JSON payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found")]
    NotFound,
}

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation { .. }
            | ApiError::UnknownPreset(_)
            | ApiError::InvalidBody(_)
            | ApiError::Serialization(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status != StatusCode::NOT_FOUND {
            warn!(error = %self, "rejected request");
        }
        json_response(
            status,
            ErrorResponse {
                error: self.to_string(),
            },
        )
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}
