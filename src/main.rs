//! astronaut-registry server entry point.
//!
//! Loads configuration, opens the store, and serves the REST API until
//! Ctrl-C or SIGTERM, then closes the store.

use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderValue, Method, StatusCode};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use astronaut_registry::api;
use astronaut_registry::app_state::AppState;
use astronaut_registry::config::{LogFormat, RegistryConfig, StorageBackend};
use astronaut_registry::persistence::TransactionalExecutor;
use astronaut_registry::persistence::memory::MemoryExecutor;
use astronaut_registry::persistence::postgres::PostgresExecutor;
use astronaut_registry::service::AstronautService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = RegistryConfig::from_env().context("loading configuration")?;

    // Initialize tracing
    init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, storage = ?config.storage, "starting astronaut-registry");

    match config.storage {
        StorageBackend::Postgres => {
            let executor = PostgresExecutor::connect(&config.database)
                .await
                .context("connecting to postgres")?;
            if config.database.run_migrations {
                executor
                    .run_migrations()
                    .await
                    .context("running migrations")?;
            }
            serve(&config, executor).await
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on exit");
            serve(&config, MemoryExecutor::new()).await
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn serve<E: TransactionalExecutor>(config: &RegistryConfig, executor: E) -> anyhow::Result<()> {
    // Build application state
    let app_state = AppState::new(AstronautService::new(executor));

    let origin: HeaderValue = config
        .cors_origin
        .parse()
        .with_context(|| format!("invalid CORS_ORIGIN {:?}", config.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    // Build router
    let app = api::build_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(config.request_timeout_secs),
                ))
                .layer(cors),
        )
        .with_state(app_state.clone());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Release the store once in-flight requests are done
    app_state.astronaut_service.executor().close().await;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
