//! Serve command implementation

use crate::api::{create_router, AppState};
use crate::cli::{load_config, ServeArgs};
use crate::config::{LogFormat, SwitchboardConfig};
use crate::optimizer::{OptimizerHandle, OptimizerService};
use crate::routing::PolicyStore;
use crate::telemetry::{PerformanceAnalyzer, TelemetryFlusher, TelemetryStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How long the flusher gets for its final write on shutdown.
const FLUSH_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &ServeArgs,
) -> Result<SwitchboardConfig, Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)?;

    // CLI overrides (highest priority)
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if let Some(ref dir) = args.data_dir {
        config.persistence.enabled = true;
        config.persistence.data_dir = dir.clone();
    }
    if args.no_optimizer {
        config.optimizer.enabled = false;
    }

    config.validate()?;
    Ok(config)
}

/// Initialize tracing based on configuration
pub fn init_tracing(
    config: &crate::config::LoggingConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = crate::logging::build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
    }

    Ok(())
}

/// Build the shared state, reloading policy and telemetry when persistence is on.
pub fn build_state(config: &SwitchboardConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    let registry = Arc::new(config.build_registry()?);
    for worker in registry.get_all_workers() {
        tracing::info!(
            worker_id = %worker.id,
            kind = %worker.kind.as_str(),
            tasks = worker.supported_tasks.len(),
            score = worker.performance_score,
            "Loaded worker from config"
        );
    }

    let initial = config.routing.initial_policy();
    let policy = if config.persistence.enabled {
        Arc::new(PolicyStore::load_or(config.persistence.policy_path(), initial))
    } else {
        Arc::new(PolicyStore::new(initial))
    };

    let analyzer = Arc::new(
        PerformanceAnalyzer::new(config.analyzer.clone(), Arc::clone(&policy))
            .with_flush_every(config.persistence.flush_every),
    );

    if config.persistence.enabled {
        let store = TelemetryStore::new(&config.persistence.data_dir);
        match store.load() {
            Ok(Some(snapshot)) => {
                tracing::info!(
                    entries = snapshot.ledger.len(),
                    workers = snapshot.worker_stats.len(),
                    "Restored telemetry"
                );
                analyzer.restore(snapshot);
            }
            Ok(None) => tracing::info!("No persisted telemetry, starting empty"),
            Err(e) => tracing::warn!(error = %e, "Failed to load telemetry, starting empty"),
        }
    }

    Ok(AppState::new(config, registry, policy, analyzer))
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
        _ = cancel_token.cancelled() => {}
    }

    cancel_token.cancel();
}

/// Main serve command handler
pub async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args)?;

    init_tracing(&config.logging)?;

    tracing::info!("Starting Switchboard server");
    tracing::debug!(?config, "Loaded configuration");

    let state = Arc::new(build_state(&config)?);
    let app = create_router(Arc::clone(&state));
    let cancel_token = CancellationToken::new();

    let flusher_handle: Option<JoinHandle<()>> = if config.persistence.enabled {
        tracing::info!(dir = %config.persistence.data_dir.display(), "Starting telemetry flusher");
        let flusher = TelemetryFlusher::new(
            Arc::clone(&state.analyzer),
            Arc::new(TelemetryStore::new(&config.persistence.data_dir)),
            Duration::from_secs(config.persistence.flush_interval_seconds),
        );
        Some(flusher.start(cancel_token.child_token()))
    } else {
        tracing::info!("Persistence disabled");
        None
    };

    let optimizer_handle: Option<OptimizerHandle> = if config.optimizer.enabled {
        let service = OptimizerService::new(Arc::clone(&state.optimizer));
        Some(service.start(cancel_token.child_token()))
    } else {
        tracing::info!("Optimizer disabled");
        None
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Switchboard API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await?;

    if let Some(handle) = optimizer_handle {
        tracing::info!("Waiting for optimizer to stop");
        let timeout = Duration::from_secs(config.optimizer.shutdown_timeout_seconds);
        handle.shutdown(timeout).await;
    }

    if let Some(handle) = flusher_handle {
        tracing::info!("Waiting for telemetry flusher to stop");
        match tokio::time::timeout(FLUSH_SHUTDOWN_TIMEOUT, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Telemetry flusher ended abnormally"),
            Err(_) => tracing::warn!("Telemetry flusher did not stop in time"),
        }
    }

    if config.persistence.enabled {
        if let Err(e) = state.policy.persist() {
            tracing::warn!(error = %e, "Failed to persist routing policy on shutdown");
        }
    }

    tracing::info!("Switchboard server stopped");
    Ok(())
}
