use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sensorhub_api::config::{self, StoreBackend};
use sensorhub_api::database::Store;
use sensorhub_api::{app, AppState};

#[derive(Debug, Parser)]
#[command(name = "sensorhub-api", version, about = "SensorHub API server")]
struct Args {
    /// Port to listen on (overrides SENSORHUB_PORT / PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Persistence backend: external (PostgreSQL + MongoDB) or memory
    #[arg(long)]
    store: Option<StoreBackend>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, MONGO_URL, JWT_SECRET
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sensorhub_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    // Initialize configuration (this loads the config singleton)
    let mut config = config::config().clone();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(backend) = args.store {
        config.database.backend = backend;
    }
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting SensorHub API in {:?} mode", config.environment);

    let store = Store::connect(&config.database)
        .await
        .context("failed to connect to the store")?;
    let state = AppState::new(store.clone(), &config.security)?;
    let router = app(state, &config);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("SensorHub API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close().await;
    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
