//! Application error type shared by the gate, the interceptor and every handler.
//!
//! Errors carry an [`RpcCode`] that decides both the HTTP status of the response and
//! the status classification the interceptor records. Only the message of client
//! errors reaches the caller; internal failures are logged in full and answered
//! with a generic message.

use std::fmt;

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

/// Client-facing status categories of a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcCode {
    Ok,
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    NotFound,
    AlreadyExists,
    Internal,
    Unavailable,
}

impl RpcCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcCode::Ok => "ok",
            RpcCode::InvalidArgument => "invalid_argument",
            RpcCode::Unauthenticated => "unauthenticated",
            RpcCode::PermissionDenied => "permission_denied",
            RpcCode::NotFound => "not_found",
            RpcCode::AlreadyExists => "already_exists",
            RpcCode::Internal => "internal",
            RpcCode::Unavailable => "unavailable",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            RpcCode::Ok => StatusCode::OK,
            RpcCode::InvalidArgument => StatusCode::BAD_REQUEST,
            RpcCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            RpcCode::PermissionDenied => StatusCode::FORBIDDEN,
            RpcCode::NotFound => StatusCode::NOT_FOUND,
            RpcCode::AlreadyExists => StatusCode::CONFLICT,
            RpcCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            RpcCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Best-effort classification for responses that were not built from an
    /// [`AppError`], such as router fallbacks and extractor rejections.
    pub fn from_http_status(status: StatusCode) -> Self {
        match status.as_u16() {
            200..=299 => RpcCode::Ok,
            400 | 405 | 415 | 422 => RpcCode::InvalidArgument,
            401 => RpcCode::Unauthenticated,
            403 => RpcCode::PermissionDenied,
            404 => RpcCode::NotFound,
            409 => RpcCode::AlreadyExists,
            503 => RpcCode::Unavailable,
            _ => RpcCode::Internal,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, RpcCode::Ok)
    }

    /// Server-side failures whose details must never be returned to the caller.
    pub fn is_server_error(&self) -> bool {
        matches!(self, RpcCode::Internal | RpcCode::Unavailable)
    }
}

impl fmt::Display for RpcCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub code: RpcCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(code: RpcCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            code,
            error: err.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(RpcCode::InvalidArgument, anyhow::anyhow!(message.into()))
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(RpcCode::Unauthenticated, anyhow::anyhow!(message.into()))
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(RpcCode::PermissionDenied, anyhow::anyhow!(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RpcCode::NotFound, anyhow::anyhow!(message.into()))
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(RpcCode::AlreadyExists, anyhow::anyhow!(message.into()))
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(RpcCode::Internal, err)
    }

    pub fn unavailable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(RpcCode::Unavailable, err)
    }

    /// The message a caller is allowed to see.
    pub fn client_message(&self) -> String {
        match self.code {
            RpcCode::Internal => "internal error".to_string(),
            RpcCode::Unavailable => "service unavailable".to_string(),
            _ => self.error.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.code.is_server_error() {
            tracing::error!(code = %self.code, error = ?self.error, "Request failed");
        }

        let body = Json(json!({
            "code": self.code,
            "error": self.client_message(),
        }));

        let mut response = (self.code.http_status(), body).into_response();
        response.extensions_mut().insert(self.code);
        response
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}
