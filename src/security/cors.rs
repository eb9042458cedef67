//! Cross-origin policy.
//!
//! # Responsibilities
//! - Decide allow/deny for the request's `Origin`
//! - Emit CORS response headers for allowed requests
//! - Answer preflight (`OPTIONS`) requests without routing them
//!
//! # Design Decisions
//! - No `Origin` header means same-origin or non-browser: always allowed
//! - Permissive mode is an explicit config flag, never implied
//! - Denials go through the error funnel like every other failure

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::ServiceConfig;
use crate::http::error::ApiError;

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Outcome of evaluating a request origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginDecision {
    /// Allowed; carries the origin to reflect, if one was sent.
    Allow(Option<HeaderValue>),
    /// Rejected origin.
    Deny(String),
}

/// Origin allow-list plus the permissive-mode flag. Read-only once built.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: Vec<String>,
    permissive: bool,
}

impl OriginPolicy {
    pub fn new(allowed: Vec<String>, permissive: bool) -> Self {
        Self { allowed, permissive }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.allowed_origins(), config.cors.permissive)
    }

    pub fn evaluate(&self, origin: Option<&HeaderValue>) -> OriginDecision {
        let Some(value) = origin else {
            return OriginDecision::Allow(None);
        };

        let origin = String::from_utf8_lossy(value.as_bytes()).into_owned();
        if self.allowed.iter().any(|o| *o == origin) {
            return OriginDecision::Allow(Some(value.clone()));
        }

        if self.permissive {
            tracing::debug!(origin = %origin, "Origin allowed by permissive mode");
            return OriginDecision::Allow(Some(value.clone()));
        }

        OriginDecision::Deny(origin)
    }
}

pub async fn cors_middleware(
    State(policy): State<Arc<OriginPolicy>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = match policy.evaluate(req.headers().get(header::ORIGIN)) {
        OriginDecision::Allow(origin) => origin,
        OriginDecision::Deny(origin) => {
            return ApiError::ForbiddenOrigin { origin }.into_response();
        }
    };

    if req.method() == Method::OPTIONS {
        return preflight_response(origin.as_ref());
    }

    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut(), origin.as_ref());
    response
}

/// Empty 204 carrying the full permission set.
pub fn preflight_response(origin: Option<&HeaderValue>) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    let headers = response.headers_mut();
    apply_cors_headers(headers, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
    response
}

fn apply_cors_headers(headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
    if let Some(origin) = origin {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
}
