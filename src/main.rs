use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use request_gate::config::load_config;
use request_gate::health::{DataStore, TcpDataStore};
use request_gate::http::{AppState, HttpServer};
use request_gate::lifecycle::{
    escalate, install_panic_hook, shutdown_signal, EnsureStoreReachable, FaultEscalation,
    Shutdown, StartupSequencer,
};
use request_gate::observability::{init_logging, metrics, MetricsRegistry};
use request_gate::routing::{ApiDocument, MetaRoutes, RouteRegistry};

#[derive(Parser)]
#[command(name = "request-gate")]
#[command(about = "HTTP request entry layer", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port; overrides PORT.
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.listener.port = port;
    }

    init_logging(&config.observability, config.environment)?;
    install_panic_hook();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = config.environment.as_str(),
        bind_address = %config.bind_address(),
        allowed_origins = ?config.allowed_origins(),
        cors_permissive = config.cors.permissive,
        "Configuration loaded"
    );

    let registry = MetricsRegistry::new()?;
    registry.collect_process();

    let tcp_store = TcpDataStore::from_config(&config.store)?;
    match tcp_store.target() {
        Some((host, port)) => tracing::info!(host, port, "Data store ping target"),
        None => tracing::warn!("DATABASE_URL not set, health checks will report the store as unavailable"),
    }
    let store: Arc<dyn DataStore> = Arc::new(tcp_store);
    let docs = ApiDocument::load(config.docs.spec_path.as_deref().map(std::path::Path::new))?;

    let mut routes = RouteRegistry::new();
    routes.register(MetaRoutes)?;
    tracing::info!(groups = ?routes.mount_paths(), "Route groups registered");

    // Bootstrap is attempted once; its failure never blocks listening.
    let mut sequencer = StartupSequencer::new(config.bootstrap.clone());
    let listener = sequencer
        .start(&EnsureStoreReachable, store.as_ref(), &config.bind_address())
        .await?;
    registry.record_bootstrap(sequencer.outcome());

    let (escalation, mut faults) = FaultEscalation::new();
    let shutdown = Shutdown::new();

    escalation.spawn(
        "metrics-upkeep",
        metrics::upkeep_loop(
            registry.clone(),
            Duration::from_secs(config.observability.upkeep_interval_secs.max(1)),
            shutdown.clone(),
        ),
    );

    let state = AppState::new(config, store, registry, docs);
    let server = HttpServer::new(state, &routes);

    let stop = shutdown.clone();
    let serve = server.run(listener, async move {
        shutdown_signal().await;
        stop.trigger();
    });

    tokio::select! {
        result = serve => result?,
        fault = faults.next() => {
            let code = escalate(&fault);
            std::process::exit(code);
        }
    }

    shutdown.trigger();
    tracing::info!("Shutdown complete");
    Ok(())
}
