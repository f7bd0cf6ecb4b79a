//! HTTP server wiring for Wastebin (routes, handlers, and shared state).

/// HTTP error mapping for handlers.
pub mod error;
/// HTTP handlers for the paste endpoints.
pub mod handlers;

pub use wastebin_core::{config, db, naming, AppError, BackendKind, Config, Database, DEFAULT_PORT};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Construct shared application state.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    /// - `db`: Open database handle.
    pub fn new(config: Config, db: Database) -> Self {
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware.
///
/// At most `config.workers` requests are handled at once; the rest wait for
/// a slot. Request bodies are capped at `config.max_paste_size` bytes.
pub fn create_app(state: AppState) -> Router {
    let workers = state.config.workers.max(1);
    let body_limit = state.config.max_paste_size;

    Router::new()
        .route("/", get(handlers::paste::index))
        .route("/make", post(handlers::paste::make_paste))
        .route("/search", get(handlers::paste::search_pastes))
        .route(
            "/*name",
            get(handlers::paste::get_paste).delete(handlers::paste::delete_paste),
        )
        .with_state(state)
        .layer(
            tower::ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(GlobalConcurrencyLimitLayer::new(workers))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
}

/// Resolve the listener address from `bind_host` and `port`.
///
/// # Errors
/// Returns an I/O error when the host cannot be resolved.
pub fn resolve_bind_address(config: &Config) -> io::Result<SocketAddr> {
    (config.bind_host.as_str(), config.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("No address found for host '{}'", config.bind_host),
            )
        })
}

/// Run the Axum server with graceful shutdown support.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), io::Error> {
    let app = create_app(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}
