//! Wastebin server entrypoint.

use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wastebin_server::{resolve_bind_address, serve_router, AppState, BackendKind, Config, Database};

/// Command-line overrides. Unset flags keep the value loaded from the environment.
#[derive(Parser, Debug)]
#[command(name = "wastebind", version, about = "Wastebin paste server")]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Storage location: a directory, or a `sqlite://` URI
    #[arg(short, long)]
    data: Option<String>,

    /// Engine for a bare data path
    #[arg(long, value_parser = parse_backend)]
    backend: Option<BackendKind>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Maximum number of requests handled at once
    #[arg(long)]
    workers: Option<usize>,

    /// Serve immediately and build the flat-file index in the background
    #[arg(long)]
    background_index: bool,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

fn parse_backend(value: &str) -> Result<BackendKind, String> {
    BackendKind::parse(value).ok_or_else(|| format!("unknown backend '{}'", value))
}

impl Args {
    fn apply(self, mut config: Config) -> Config {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(data) = self.data {
            config.data = data;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(host) = self.host {
            config.bind_host = host;
        }
        if let Some(workers) = self.workers.filter(|w| *w > 0) {
            config.workers = workers;
        }
        config.background_index |= self.background_index;
        config.debug |= self.debug;
        config
    }
}

fn default_log_filter(debug: bool) -> &'static str {
    if debug {
        "wastebin=info,tower_http=info"
    } else {
        "wastebin=warn,tower_http=warn"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().apply(Config::from_env());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(config.debug).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database = tokio::task::spawn_blocking({
        let config = config.clone();
        move || Database::open(&config)
    })
    .await??;
    tracing::info!("Storage ready ({} backend)", database.backend());

    let state = AppState::new(config.clone(), database);

    if config.background_index {
        let db = state.db.clone();
        tokio::task::spawn_blocking(move || match db.rebuild_index() {
            Ok(count) => tracing::info!("Background index finished with {} paste(s)", count),
            Err(err) => tracing::error!("Background index failed: {}", err),
        });
    }

    let bind_addr = resolve_bind_address(&config)?;
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr().unwrap_or(bind_addr);
    tracing::info!("Wastebin running at http://{}", actual_addr);

    let db = state.db.clone();
    let serve_result = serve_router(listener, state, shutdown_signal()).await;

    match Arc::try_unwrap(db) {
        Ok(database) => match database.close() {
            Ok(()) => tracing::info!("Storage closed"),
            Err(err) => tracing::error!("Failed to close storage: {}", err),
        },
        Err(_) => tracing::warn!("Storage still in use at shutdown; releasing without close"),
    }

    serve_result?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
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
