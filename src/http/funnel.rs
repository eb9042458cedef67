//! Error funnel.
//!
//! Terminal stage for every per-request failure. Converts an [`ApiError`]
//! into exactly one `{statusCode, message}` response and writes one
//! server-side log record for it. Rendering cannot fail: if the envelope
//! cannot be built, a hardcoded 500 response is returned instead.

use std::any::Any;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::http::error::{ApiError, GENERIC_FAULT_MESSAGE};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const FALLBACK_BODY: &str = r#"{"statusCode":500,"message":"Internal Server Error"}"#;

/// Uniform client-visible error shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub message: String,
}

/// Collapse a handler outcome into a response.
pub fn funnel(outcome: Result<Response, ApiError>) -> Response {
    match outcome {
        Ok(response) => response,
        Err(err) => render(&err),
    }
}

/// Log `err` and render its envelope.
pub fn render(err: &ApiError) -> Response {
    log_condition(err);

    let status = err.status();
    let envelope = ErrorEnvelope {
        status_code: status.as_u16(),
        message: err.client_message(),
    };

    let body = match serde_json::to_vec(&envelope) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize error envelope");
            return fallback_response();
        }
    };

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(Body::from(body))
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to build error response");
            fallback_response()
        })
}

/// Response for a panic caught by `CatchPanicLayer`.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    render(&ApiError::from_panic(payload))
}

/// Hardcoded 500 used when the envelope itself cannot be produced.
pub fn fallback_response() -> Response {
    let mut response = Response::new(Body::from(FALLBACK_BODY));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    response
}

fn log_condition(err: &ApiError) {
    let kind = err.kind();
    let status = err.status().as_u16();

    match err {
        ApiError::Unexpected(source) => {
            tracing::error!(
                kind,
                status,
                client_message = GENERIC_FAULT_MESSAGE,
                error = %source,
                detail = ?source,
                "Unexpected fault while handling request"
            );
        }
        ApiError::Application { .. } if status >= 500 => {
            tracing::error!(kind, status, reason = %err, "Request failed");
        }
        ApiError::NotFound { .. } => {
            tracing::info!(kind, status, reason = %err, "Request failed");
        }
        _ => {
            tracing::warn!(kind, status, reason = %err, "Request failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    async fn envelope(response: Response) -> ErrorEnvelope {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_application_error_passes_through() {
        let response = funnel(Err(ApiError::new(403, "nope")));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            JSON_CONTENT_TYPE
        );
        assert_eq!(
            envelope(response).await,
            ErrorEnvelope { status_code: 403, message: "nope".into() }
        );
    }

    #[tokio::test]
    async fn test_unexpected_fault_is_generic() {
        let response = funnel(Err(ApiError::internal("connection reset by peer")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let env = envelope(response).await;
        assert_eq!(env.status_code, 500);
        assert_eq!(env.message, GENERIC_FAULT_MESSAGE);
    }

    #[tokio::test]
    async fn test_not_found_shape() {
        let response = funnel(Err(ApiError::not_found(&Method::GET, "/nowhere")));
        assert_eq!(
            envelope(response).await,
            ErrorEnvelope { status_code: 404, message: "Cannot GET /nowhere".into() }
        );
    }

    #[tokio::test]
    async fn test_ok_is_untouched() {
        let response = funnel(Ok(Response::new(Body::from("fine"))));
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_panic_becomes_generic_500() {
        let response = panic_response(Box::new("index out of bounds"));
        let env = envelope(response).await;
        assert_eq!(env, ErrorEnvelope { status_code: 500, message: GENERIC_FAULT_MESSAGE.into() });
    }

    #[tokio::test]
    async fn test_fallback_is_valid_envelope() {
        let response = fallback_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope(response).await.status_code, 500);
    }

    #[test]
    fn test_envelope_field_names() {
        let json = serde_json::to_value(ErrorEnvelope { status_code: 400, message: "bad".into() }).unwrap();
        assert_eq!(json, serde_json::json!({ "statusCode": 400, "message": "bad" }));
    }
}
