//! liftlog-server - workout tracking REST backend
//!
//! This is the main entry point for the server binary.

use std::{sync::Arc, time::Duration};

use clap::Parser;
use tokio::{net::TcpListener, signal, time};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use liftlog::api::routes::create_router;
use liftlog::auth::{AuthService, SystemClock};
use liftlog::db::DatabaseProvider;
use liftlog::utils::telemetry::init_tracing;
use liftlog::{AppState, LiftlogConfig};

const TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// liftlog-server - workout tracking REST backend
#[derive(Parser, Debug)]
#[command(name = "liftlog-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "LIFTLOG_CONFIG")]
    config: Option<String>,

    /// Port to listen on, overrides the configuration
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind, overrides the configuration
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = load_config(&args)?;

    init_tracing(&config.server)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting liftlog-server"
    );

    let provider = DatabaseProvider::from_config(&config.database)?;
    let db = provider.create_client().await?;
    info!(provider = %provider_kind(&provider), "Database initialized");

    let addr = config.bind_address();
    let state = AppState::new(Arc::from(db), Arc::new(SystemClock));
    tokio::spawn(purge_expired_tokens(state.auth_service.clone()));

    let app = create_router(state).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let listener = TcpListener::bind(&addr).await?;
    info!(address = %addr, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("liftlog-server shutdown complete");
    Ok(())
}

/// Load configuration from file or environment, then apply CLI overrides
fn load_config(args: &Args) -> anyhow::Result<LiftlogConfig> {
    let mut config = match &args.config {
        Some(path) => {
            // Use eprintln! since tracing is not yet initialized
            eprintln!("Loading configuration from file: {}", path);
            LiftlogConfig::load(path)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?
        }
        None => {
            eprintln!("Loading configuration from environment variables");
            LiftlogConfig::from_env()
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?
        }
    };

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Sweeps expired tokens out of the store once an hour.
async fn purge_expired_tokens(auth_service: Arc<AuthService>) {
    let mut interval = time::interval(TOKEN_PURGE_INTERVAL);
    loop {
        interval.tick().await;
        if let Err(e) = auth_service.purge_expired().await {
            warn!(error = %e, "Failed to purge expired tokens");
        }
    }
}

/// Names the backend without printing credentials.
fn provider_kind(provider: &DatabaseProvider) -> &'static str {
    match provider {
        DatabaseProvider::Memory => "memory",
        DatabaseProvider::SQLite { .. } => "sqlite",
        #[cfg(feature = "turso")]
        DatabaseProvider::Turso { .. } => "turso",
    }
}

/// Create a future that resolves when a shutdown signal is received
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
