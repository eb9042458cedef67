//! Built-in `meta` route group: `GET /api/status`.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::http::server::AppState;
use crate::routing::registry::RouteGroup;

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MetaRoutes;

impl RouteGroup for MetaRoutes {
    fn name(&self) -> &str {
        "meta"
    }

    fn prefix(&self) -> &str {
        "/status"
    }

    fn router(&self) -> Router<AppState> {
        Router::new().route("/", get(get_status))
    }
}

pub async fn get_status() -> Json<ServiceStatus> {
    Json(ServiceStatus {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}
