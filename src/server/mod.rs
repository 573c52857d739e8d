//! Web server: JSON API, HTML pages and static assets.

pub mod assets;
pub mod error;
pub mod routes;
pub mod templates;

pub use assets::{content_type, StaticAssets};
pub use error::ApiError;
pub use routes::{build_router, AppState};
pub use templates::{ShareView, TemplateEngine, Templates};

use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener as TokioTcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::storage::{MemoryStorage, SqliteStorage, Storage};

/// Find an available port starting from the given base port.
///
/// Tries ports sequentially until finding one that's available.
pub fn find_available_port(host: IpAddr, base_port: u16) -> Option<u16> {
    (base_port..=base_port.saturating_add(100)).find(|&port| TcpListener::bind((host, port)).is_ok())
}

/// Where shares are kept while the server runs.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    /// SQLite file at this path
    Sqlite(PathBuf),
    /// In-process only, lost on shutdown
    Memory,
}

/// Configuration for the web server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: IpAddr,
    /// Base port to try binding to (defaults to 3000).
    pub base_port: u16,
    /// Whether to open the browser automatically.
    pub open_browser: bool,
    pub storage: StorageBackend,
    /// Prefix for share links handed back to clients.
    pub public_url: Option<String>,
    /// Mark the session cookie `Secure`.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            base_port: crate::config::DEFAULT_PORT,
            open_browser: false,
            storage: StorageBackend::Sqlite(crate::storage::default_db_path()),
            public_url: None,
            secure_cookies: false,
        }
    }
}

/// Run the web server until Ctrl+C or SIGTERM.
///
/// This function will:
/// 1. Open the configured store
/// 2. Find an available port starting from `config.base_port`
/// 3. Serve until a shutdown signal arrives
/// 4. Close the store
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    match config.storage.clone() {
        StorageBackend::Sqlite(path) => {
            let store = Arc::new(SqliteStorage::open(&path)?);
            info!(path = %path.display(), "Opened database");

            serve(store.clone(), &config).await?;

            match Arc::try_unwrap(store) {
                Ok(store) => {
                    store.close()?;
                    info!("Database closed");
                }
                Err(_) => warn!("Database still in use at shutdown, leaving it to drop"),
            }
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, shares are lost on shutdown");
            serve(Arc::new(MemoryStorage::new()), &config).await?;
        }
    }

    Ok(())
}

async fn serve(store: Arc<dyn Storage>, config: &ServerConfig) -> anyhow::Result<()> {
    let port = find_available_port(config.host, config.base_port)
        .ok_or_else(|| anyhow::anyhow!("No available port found"))?;

    let addr = SocketAddr::new(config.host, port);
    let url = format!("http://{}", addr);

    let backend = store.backend_name();
    let state = Arc::new(AppState::new(
        store,
        config.public_url.clone(),
        config.secure_cookies,
    ));
    let app = build_router(state);

    let listener = TokioTcpListener::bind(addr).await?;

    info!(%url, storage = backend, "Server listening");
    println!("Server running at: {}", url);
    println!("Press Ctrl+C to stop");

    if config.open_browser {
        if let Err(e) = webbrowser::open(&url) {
            warn!(error = %e, "Failed to open browser");
        }
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Wait for the shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
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
