//! Per-request annotations added by pipeline stages.
//!
//! The request itself (method, path, headers, body) is the immutable input;
//! stages attach the types below as request or response extensions.

use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::http::error::ApiError;

/// Label used for requests that never reached a route.
pub const UNMATCHED_ROUTE: &str = "<unmatched>";

/// Route template that handled the request (e.g. `/api/users/{id}`).
/// Stored on the response so outer stages can read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate(pub String);

/// Structured body produced by the body decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Value);

impl JsonBody {
    /// Deserialize the decoded body into `T`. Shape mismatches are reported
    /// as a malformed body.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.0.clone()).map_err(|e| ApiError::MalformedBody(e.to_string()))
    }
}

/// Route-level middleware: copy the matched route template onto the response.
pub async fn tag_route(req: Request<axum::body::Body>, next: Next) -> Response {
    let template = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string());

    let mut response = next.run(req).await;
    if let Some(template) = template {
        response.extensions_mut().insert(RouteTemplate(template));
    }
    response
}
