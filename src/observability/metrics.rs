//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Record one observation per request (method, route template, status)
//! - Expose the registry in Prometheus text format on `GET /metrics`
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, route, status
//! - `http_request_duration_seconds` (histogram): latency distribution
//! - `bootstrap_runs_total` (counter): startup bootstrap outcomes
//! - `process_*`: default process collectors (CPU seconds, resident and
//!   virtual memory, open and max file descriptors, threads, start time),
//!   refreshed on every scrape and by the upkeep task
//!
//! # Design Decisions
//! - The recorder is owned by [`MetricsRegistry`] and passed around in
//!   application state; nothing is installed as a global recorder
//! - Low-overhead metric updates (atomic operations)
//! - Route label is the template, never the concrete path

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};
use metrics_process::Collector;
use crate::http::context::{RouteTemplate, UNMATCHED_ROUTE};
use crate::lifecycle::Shutdown;

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const BOOTSTRAP_RUNS_TOTAL: &str = "bootstrap_runs_total";
pub const PROCESS_START_TIME_SECONDS: &str = "process_start_time_seconds";
pub const PROCESS_RESIDENT_MEMORY_BYTES: &str = "process_resident_memory_bytes";
pub const PROCESS_CPU_SECONDS_TOTAL: &str = "process_cpu_seconds_total";

/// Content type of the Prometheus text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Histogram buckets tuned for typical web latencies.
const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Process-wide metrics registry. Cheap to clone.
#[derive(Clone)]
pub struct MetricsRegistry {
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
    process: Arc<Collector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
                LATENCY_BUCKETS,
            )?
            .build_recorder();
        let handle = recorder.handle();
        let process = Collector::default();
        metrics::with_local_recorder(&recorder, || process.describe());

        Ok(Self {
            recorder: Arc::new(recorder),
            handle,
            process: Arc::new(process),
        })
    }

    /// Record a completed request.
    pub fn record_request(&self, method: &str, route: &str, status: u16, start: Instant) {
        let elapsed = start.elapsed().as_secs_f64();
        let method = method.to_string();
        let route = route.to_string();
        let status = status.to_string();

        metrics::with_local_recorder(self.recorder.as_ref(), || {
            metrics::counter!(
                REQUESTS_TOTAL,
                "method" => method.clone(),
                "route" => route.clone(),
                "status" => status.clone()
            )
            .increment(1);
            metrics::histogram!(
                REQUEST_DURATION_SECONDS,
                "method" => method,
                "route" => route,
                "status" => status
            )
            .record(elapsed);
        });
    }

    /// Record a bootstrap outcome ("ok", "failed" or "skipped").
    pub fn record_bootstrap(&self, outcome: &'static str) {
        metrics::with_local_recorder(self.recorder.as_ref(), || {
            metrics::counter!(BOOTSTRAP_RUNS_TOTAL, "outcome" => outcome).increment(1);
        });
    }

    /// Sample the process collectors into the registry.
    pub fn collect_process(&self) {
        metrics::with_local_recorder(self.recorder.as_ref(), || self.process.collect());
    }

    /// Current registry state in exposition format. Does not reset anything.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub fn run_upkeep(&self) {
        self.collect_process();
        self.handle.run_upkeep();
    }
}

/// Outer middleware: one observation per request, whichever stage produced
/// the response.
pub async fn metrics_middleware(
    State(registry): State<MetricsRegistry>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();

    let response = next.run(req).await;

    let route = response
        .extensions()
        .get::<RouteTemplate>()
        .map(|r| r.0.as_str())
        .unwrap_or(UNMATCHED_ROUTE);
    registry.record_request(&method, route, response.status().as_u16(), start);

    response
}

/// `GET /metrics`
pub async fn metrics_handler(State(registry): State<MetricsRegistry>) -> Response {
    registry.collect_process();
    let mut response = registry.render().into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(EXPOSITION_CONTENT_TYPE),
    );
    response
}

/// Periodic exporter upkeep until shutdown.
pub async fn upkeep_loop(
    registry: MetricsRegistry,
    interval: Duration,
    shutdown: Shutdown,
) -> Result<(), std::convert::Infallible> {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => registry.run_upkeep(),
            _ = shutdown.wait() => {
                tracing::debug!("Metrics upkeep received shutdown signal, exiting loop");
                return Ok(());
            }
        }
    }
}

/// Value of the series `name` whose labels include every pair in `labels`.
pub fn sample_value(rendered: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    rendered
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let (series, value) = line.rsplit_once(' ')?;
            let rest = series.strip_prefix(name)?;
            if !(rest.is_empty() || rest.starts_with('{')) {
                return None;
            }
            let matches = labels
                .iter()
                .all(|(k, v)| rest.contains(&format!("{k}=\"{v}\"")));
            matches.then(|| value.parse().ok()).flatten()
        })
        .next()
}
