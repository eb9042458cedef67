//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    extract::Path,
    http::{HeaderMap, Request, StatusCode},
    routing::post,
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use request_gate::config::ServiceConfig;
use request_gate::health::{DataStore, StoreError};
use request_gate::http::{ApiError, AppState, HttpServer, JsonBody};
use request_gate::observability::MetricsRegistry;
use request_gate::routing::{ApiDocument, MetaRoutes, RouteGroup, RouteRegistry};

/// In-memory data store with a failure switch and a ping counter.
#[derive(Default)]
pub struct MockStore {
    down: AtomicBool,
    pings: AtomicUsize,
}

impl MockStore {
    pub fn up() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn down() -> Arc<Self> {
        let store = Self::default();
        store.down.store(true, Ordering::SeqCst);
        Arc::new(store)
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataStore for MockStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            Err(StoreError::Query("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

/// Route group used by the tests: `/api/widgets`.
pub struct WidgetRoutes;

impl RouteGroup for WidgetRoutes {
    fn name(&self) -> &str {
        "widgets"
    }

    fn prefix(&self) -> &str {
        "/widgets"
    }

    fn router(&self) -> Router<AppState> {
        Router::new()
            .route("/", post(create_widget))
            .route("/forbidden", axum::routing::get(forbidden))
            .route("/explode", axum::routing::get(explode))
            .route("/panic", axum::routing::get(panics))
            .route("/{id}", axum::routing::get(get_widget).delete(delete_widget))
    }
}

async fn get_widget(Path(id): Path<u32>) -> Json<Value> {
    Json(json!({ "id": id }))
}

async fn delete_widget(Path(_id): Path<u32>) -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn create_widget(Extension(body): Extension<JsonBody>) -> Result<(StatusCode, Json<Value>), ApiError> {
    let name = body.0["name"]
        .as_str()
        .ok_or_else(|| ApiError::bad_request("name is required"))?;
    Ok((StatusCode::CREATED, Json(json!({ "name": name }))))
}

async fn forbidden() -> Result<Json<Value>, ApiError> {
    Err(ApiError::new(403, "nope"))
}

async fn explode() -> Result<Json<Value>, ApiError> {
    Err(ApiError::internal("widget table is corrupted at page 7"))
}

async fn panics() -> &'static str {
    panic!("widget invariant violated");
}

/// Strict CORS allow-list with one extra origin, default limits.
pub fn strict_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.cors.permissive = false;
    config.cors.extra_origins = vec!["https://app.example.com".into()];
    config
}

pub struct TestApp {
    pub router: Router,
    pub metrics: MetricsRegistry,
    pub store: Arc<MockStore>,
}

pub fn registry() -> RouteRegistry {
    let mut routes = RouteRegistry::new();
    routes.register(MetaRoutes).unwrap();
    routes.register(WidgetRoutes).unwrap();
    routes
}

pub fn app_with(config: ServiceConfig, store: Arc<MockStore>) -> TestApp {
    let metrics = MetricsRegistry::new().unwrap();
    let state = AppState::new(config, store.clone(), metrics.clone(), ApiDocument::builtin());
    let server = HttpServer::new(state, &registry());
    TestApp {
        router: server.router(),
        metrics,
        store,
    }
}

pub fn app() -> TestApp {
    app_with(strict_config(), MockStore::up())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    TestResponse { status, headers, body }
}

pub async fn get(router: &Router, uri: &str) -> TestResponse {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}
