//! Per-request failure conditions.
//!
//! Every failure a request can hit is an [`ApiError`]. Handlers return
//! `Result<T, ApiError>`; the `IntoResponse` impl hands the error to the
//! funnel, which is the only place an error envelope is produced.

use std::any::Any;

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::funnel;
use crate::lifecycle::escalation::panic_message;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Message sent to clients for faults whose detail stays server-side.
pub const GENERIC_FAULT_MESSAGE: &str = "Internal Server Error";

/// Message sent to clients whose origin is not allowed.
pub const FORBIDDEN_ORIGIN_MESSAGE: &str = "Not allowed by CORS";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Request origin rejected by the CORS policy.
    #[error("origin {origin:?} is not allowed")]
    ForbiddenOrigin { origin: String },

    /// Body could not be decoded.
    #[error("{0}")]
    MalformedBody(String),

    /// Body exceeded the configured limit.
    #[error("request entity too large (limit {limit} bytes)")]
    PayloadTooLarge { limit: usize },

    /// No route matched.
    #[error("Cannot {method} {path}")]
    NotFound { method: Method, path: String },

    /// Raised by a handler with an intended status and message.
    #[error("{message}")]
    Application { status: u16, message: String },

    /// Anything else. The source is logged, never sent to the client.
    #[error("unexpected fault: {0}")]
    Unexpected(#[source] BoxError),
}

impl ApiError {
    /// Application error with an explicit status code.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        ApiError::Application {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, message)
    }

    pub fn not_found(method: &Method, path: impl Into<String>) -> Self {
        ApiError::NotFound {
            method: method.clone(),
            path: path.into(),
        }
    }

    /// Wrap an unexpected fault.
    pub fn internal<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        ApiError::Unexpected(err.into())
    }

    /// Convert a caught panic payload into a fault.
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let message = panic_message(payload.as_ref());
        ApiError::Unexpected(format!("handler panicked: {message}").into())
    }

    /// Status code carried into the envelope. Codes outside the valid HTTP
    /// range fall back to 500.
    pub fn status(&self) -> StatusCode {
        let code = match self {
            ApiError::ForbiddenOrigin { .. } => 403,
            ApiError::MalformedBody(_) => 400,
            ApiError::PayloadTooLarge { .. } => 413,
            ApiError::NotFound { .. } => 404,
            ApiError::Application { status, .. } => *status,
            ApiError::Unexpected(_) => 500,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Message safe to show the client.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::ForbiddenOrigin { .. } => FORBIDDEN_ORIGIN_MESSAGE.to_string(),
            ApiError::PayloadTooLarge { .. } => "request entity too large".to_string(),
            ApiError::Unexpected(_) => GENERIC_FAULT_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::ForbiddenOrigin { .. } => "forbidden_origin",
            ApiError::MalformedBody(_) => "malformed_body",
            ApiError::PayloadTooLarge { .. } => "payload_too_large",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Application { .. } => "application_error",
            ApiError::Unexpected(_) => "unexpected_fault",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        funnel::render(&self)
    }
}
