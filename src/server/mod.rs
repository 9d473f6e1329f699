// src/server/mod.rs
//! HTTP API server
//!
//! Serves the account endpoints (`/user/...`) and the recipe endpoints
//! (`/recipe/...`). Every request opens its own SQLite connection on the
//! blocking pool; there is no other shared mutable state.

mod auth;
pub mod config;
mod error;
mod handlers;
mod routes;
pub mod serializers;

pub use auth::AuthUser;
pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;

use anyhow::Result;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,
    /// Path to the SQLite database
    pub db_path: PathBuf,
    /// Directory uploaded files are written under
    pub media_root: PathBuf,
    /// Largest accepted upload body, in bytes
    pub max_upload_bytes: usize,
    /// Minimum accepted password length
    pub min_password_length: usize,
    /// CORS allowed origins (empty = same-origin only)
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            db_path: PathBuf::from("/var/lib/recipe-api/recipe-api.db"),
            media_root: PathBuf::from("/var/lib/recipe-api/media"),
            max_upload_bytes: 10 * 1024 * 1024, // 10MB
            min_password_length: 6,
            cors_allowed_origins: Vec::new(),
        }
    }
}

/// Shared server state
pub struct AppState {
    pub config: ServerConfig,
}

/// State handle passed to every handler
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Open a database connection
    ///
    /// Blocking; call from within `spawn_blocking`.
    pub fn open_db(&self) -> crate::Result<rusqlite::Connection> {
        crate::db::open(&self.config.db_path.to_string_lossy())
    }
}

/// Start the API server and run until Ctrl+C or SIGTERM
pub async fn run_server(config: ServerConfig) -> Result<()> {
    info!("Starting recipe-api server on {}", config.bind_addr);
    info!("Database: {:?}", config.db_path);
    info!("Media root: {:?}", config.media_root);

    let db_path = config.db_path.to_string_lossy().into_owned();
    tokio::task::spawn_blocking(move || crate::db::init(&db_path)).await??;
    tokio::fs::create_dir_all(&config.media_root).await?;

    let state = Arc::new(AppState::new(config.clone()));
    let app = create_router(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("recipe-api is ready to serve");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
}
