//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with every fixed route and route group
//! - Wire up the middleware pipeline in order
//! - Bind server to listener and shut down gracefully
//!
//! # Pipeline (outermost first)
//! ```text
//! request id → trace span → security headers → metrics
//!     → catch panic → cors → body decoder → router → tag route → catch panic → handler
//!                                                  └→ not found
//! ```
//! Metrics wraps the CORS and body stages so that requests they terminate
//! are still observed exactly once. Handler panics are caught below the
//! route tag, so they keep their route label and their CORS headers.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{FromRef, OriginalUri},
    http::Method,
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::health::{health_handler, DataStore};
use crate::http::body::{body_decoder_middleware, BodyLimit};
use crate::http::context::tag_route;
use crate::http::error::ApiError;
use crate::http::funnel::panic_response;
use crate::observability::metrics::{metrics_handler, metrics_middleware, MetricsRegistry};
use crate::observability::tracing::{make_request_span, MakeRequestUuidV4};
use crate::routing::{docs, ApiDocument, RouteRegistry};
use crate::security::{cors_middleware, security_headers_middleware, OriginPolicy};

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub store: Arc<dyn DataStore>,
    pub metrics: MetricsRegistry,
    pub origins: Arc<OriginPolicy>,
    pub docs: Arc<ApiDocument>,
}

impl AppState {
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn DataStore>,
        metrics: MetricsRegistry,
        docs: ApiDocument,
    ) -> Self {
        let origins = Arc::new(OriginPolicy::from_config(&config));
        Self {
            config: Arc::new(config),
            store,
            metrics,
            origins,
            docs: Arc::new(docs),
        }
    }
}

impl FromRef<AppState> for Arc<dyn DataStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for MetricsRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

impl FromRef<AppState> for Arc<ApiDocument> {
    fn from_ref(state: &AppState) -> Self {
        state.docs.clone()
    }
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState, routes: &RouteRegistry) -> Self {
        Self {
            router: build_router(state, routes),
        }
    }

    /// The assembled pipeline, for driving without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState, routes: &RouteRegistry) -> Router {
    let body_limit = BodyLimit(state.config.body.limit_bytes);
    let origins = state.origins.clone();
    let metrics = state.metrics.clone();

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(docs::router())
        .merge(routes.to_router())
        .method_not_allowed_fallback(not_found)
        .route_layer(CatchPanicLayer::custom(panic_response))
        .route_layer(middleware::from_fn(tag_route))
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn_with_state(body_limit, body_decoder_middleware))
        .layer(middleware::from_fn_with_state(origins, cors_middleware))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(metrics, metrics_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
}

/// Unmatched method + path.
async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    ApiError::not_found(&method, path)
}
