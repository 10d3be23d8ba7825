//! HTTP error responses
//!
//! Every failure leaves a handler as `{"error": <message>, "code": <CODE>}`
//! with a status derived from the error kind.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docpanel_core::PanelError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

/// Error returned from handlers
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            body: ErrorBody {
                error: message.into(),
                code,
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        PanelError::validation(message).into()
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PanelError::Store(message.into()).into()
    }
}

pub fn status_for(err: &PanelError) -> StatusCode {
    match err {
        PanelError::Validation(_) => StatusCode::BAD_REQUEST,
        PanelError::NotFound(_) => StatusCode::NOT_FOUND,
        PanelError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
        PanelError::Store(_) | PanelError::Serialization(_) | PanelError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<PanelError> for ApiError {
    fn from(err: PanelError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::error!(code = err.code(), "{}", err);
        } else {
            tracing::warn!(code = err.code(), "{}", err);
        }
        ApiError::new(status, err.code(), err.message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
