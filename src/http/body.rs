//! Request body decoding.
//!
//! # Responsibilities
//! - Buffer JSON request bodies up to the configured limit
//! - Parse them into a [`JsonBody`] before handlers run
//! - Reject malformed or oversized payloads through the error funnel
//!
//! # Design Decisions
//! - Non-JSON content types pass through untouched
//! - Strict: only objects and arrays are accepted at the top level
//! - Raw bytes are put back so `Json<T>` extractors keep working

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use serde_json::Value;

use crate::http::context::JsonBody;
use crate::http::error::ApiError;

/// Body decoder settings.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

pub async fn body_decoder_middleware(
    State(limit): State<BodyLimit>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match decode(req, limit.0).await {
        Ok(req) => next.run(req).await,
        Err(err) => err.into_response(),
    }
}

/// Decode the body of `req` if it declares a JSON content type.
pub async fn decode(req: Request<Body>, limit: usize) -> Result<Request<Body>, ApiError> {
    if !is_json(req.headers()) {
        return Ok(req);
    }

    if declared_length(req.headers()).is_some_and(|len| len > limit) {
        return Err(ApiError::PayloadTooLarge { limit });
    }

    let (mut parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
        let inner = e.into_inner();
        if inner.downcast_ref::<LengthLimitError>().is_some() {
            ApiError::PayloadTooLarge { limit }
        } else {
            ApiError::MalformedBody(format!("Failed to read request body: {inner}"))
        }
    })?;

    let value = parse_json(&bytes)?;
    parts.extensions.insert(JsonBody(value));

    Ok(Request::from_parts(parts, Body::from(bytes)))
}

fn parse_json(bytes: &Bytes) -> Result<Value, ApiError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Value::Object(Default::default()));
    }

    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| ApiError::MalformedBody(format!("Malformed JSON body: {e}")))?;

    match value {
        Value::Object(_) | Value::Array(_) => Ok(value),
        _ => Err(ApiError::MalformedBody(
            "JSON body must be an object or an array".to_string(),
        )),
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
