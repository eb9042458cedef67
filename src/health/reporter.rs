//! `GET /health`.
//!
//! Pings the data store on every call and reports the result. Ping
//! failures are turned into a 503 body here instead of going through the
//! error funnel: reporting dependency health is the endpoint's job.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::health::store::DataStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Error,
}

/// Computed fresh for every request; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResult {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HealthResult {
    pub fn status_code(&self) -> StatusCode {
        match self.status {
            HealthStatus::Ok => StatusCode::OK,
            HealthStatus::Error => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

pub async fn check(store: &dyn DataStore) -> HealthResult {
    match store.ping().await {
        Ok(()) => HealthResult {
            status: HealthStatus::Ok,
            detail: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed: data store unavailable");
            HealthResult {
                status: HealthStatus::Error,
                detail: Some(e.to_string()),
            }
        }
    }
}

pub async fn health_handler(
    State(store): State<Arc<dyn DataStore>>,
) -> (StatusCode, Json<HealthResult>) {
    let result = check(store.as_ref()).await;
    (result.status_code(), Json(result))
}
