//! API documentation mount.
//!
//! Serves a generated OpenAPI document at `/documentation/openapi.json` and
//! a server-rendered index of its operations at `/documentation`. The page
//! uses no scripts, so it works under the default content security policy.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use axum::{extract::State, response::Html, routing::get, Json, Router};
use serde_json::{json, Value};
use thiserror::Error;

use crate::http::server::AppState;

#[derive(Debug, Error)]
pub enum DocsError {
    #[error("failed to read API document: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse API document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The statically generated API description.
#[derive(Debug, Clone)]
pub struct ApiDocument {
    spec: Value,
}

impl ApiDocument {
    pub fn new(spec: Value) -> Self {
        Self { spec }
    }

    pub fn load(path: Option<&Path>) -> Result<Self, DocsError> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Ok(Self::new(serde_json::from_str(&content)?))
            }
            None => Ok(Self::builtin()),
        }
    }

    /// Minimal document describing the endpoints this service always has.
    pub fn builtin() -> Self {
        Self::new(json!({
            "openapi": "3.0.3",
            "info": {
                "title": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "paths": {
                "/health": {
                    "get": {
                        "summary": "Service and data store health",
                        "responses": {
                            "200": { "description": "Data store reachable" },
                            "503": { "description": "Data store unavailable" }
                        }
                    }
                },
                "/metrics": {
                    "get": {
                        "summary": "Prometheus metrics",
                        "responses": { "200": { "description": "Exposition text" } }
                    }
                },
                "/api/status": {
                    "get": {
                        "summary": "Service name and version",
                        "responses": { "200": { "description": "Service status" } }
                    }
                }
            }
        }))
    }

    pub fn spec(&self) -> &Value {
        &self.spec
    }

    /// Render an HTML index of every documented operation.
    pub fn render_index(&self) -> String {
        let title = self.spec["info"]["title"].as_str().unwrap_or("API");
        let version = self.spec["info"]["version"].as_str().unwrap_or("");

        let mut html = String::new();
        let _ = write!(
            html,
            "<!doctype html><html><head><meta charset=\"utf-8\"><title>{t}</title></head>\
             <body><h1>{t} <small>{v}</small></h1>\
             <p><a href=\"/documentation/openapi.json\">openapi.json</a></p><table>\
             <tr><th>Method</th><th>Path</th><th>Summary</th></tr>",
            t = escape(title),
            v = escape(version),
        );

        if let Some(paths) = self.spec["paths"].as_object() {
            for (path, item) in paths {
                let Some(operations) = item.as_object() else { continue };
                for (method, operation) in operations {
                    let summary = operation["summary"].as_str().unwrap_or("");
                    let _ = write!(
                        html,
                        "<tr><td>{}</td><td><code>{}</code></td><td>{}</td></tr>",
                        escape(&method.to_uppercase()),
                        escape(path),
                        escape(summary),
                    );
                }
            }
        }

        html.push_str("</table></body></html>");
        html
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/documentation", get(index))
        .route("/documentation/", get(index))
        .route("/documentation/openapi.json", get(openapi))
}

async fn index(State(doc): State<Arc<ApiDocument>>) -> Html<String> {
    Html(doc.render_index())
}

async fn openapi(State(doc): State<Arc<ApiDocument>>) -> Json<Value> {
    Json(doc.spec().clone())
}
