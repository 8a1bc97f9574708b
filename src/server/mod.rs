//! HTTP and WebSocket surface.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /api/files` | document tree |
//! | `GET /api/file/{*path}` | `{path, content}` |
//! | `GET /api/asset/{*path}` | raw bytes |
//! | `GET /api/health` | `{status: "ok"}` |
//! | `GET /ws` | change event stream |
//!
//! Anything else falls through to the static bundle (or a built-in page).

pub mod error;
pub mod live;
pub mod routes;
pub mod ws;

pub use error::{ApiError, ErrorBody};
pub use live::LiveUpdates;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::broadcast::Broadcaster;
use crate::config::{FileWatchConfig, ServerConfig, Settings};
use crate::content::ContentAccessor;
use crate::sandbox::PathGuard;
use crate::tree::TreeIndexer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ServerState {
    pub guard: Arc<PathGuard>,
    pub indexer: TreeIndexer,
    pub accessor: ContentAccessor,
    pub broadcaster: Broadcaster,
}

impl ServerState {
    /// State for a canonical root already validated by `guard`.
    pub fn new(guard: PathGuard, settings: &Settings, broadcaster: Broadcaster) -> Self {
        let indexer = TreeIndexer::new(
            guard.root(),
            settings.documents.filter(),
            settings.documents.respect_gitignore,
        );
        Self {
            guard: Arc::new(guard),
            indexer,
            accessor: ContentAccessor::new(),
            broadcaster,
        }
    }
}

/// Build the application router.
pub fn router(state: ServerState, config: &ServerConfig) -> Router {
    let app = Router::new()
        .route("/api/files", get(routes::list_files))
        .route("/api/file/", get(routes::get_root_file))
        .route("/api/file/{*path}", get(routes::get_file))
        .route("/api/asset/", get(routes::get_root_asset))
        .route("/api/asset/{*path}", get(routes::get_asset))
        .route("/api/health", get(routes::health))
        .route("/ws", get(ws::upgrade))
        .with_state(state);

    let app = match &config.static_dir {
        Some(dir) => app.fallback_service(static_files(dir)),
        None => app.fallback(routes::index_page),
    };

    if config.cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

fn static_files(dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))
}

/// Serve `root` until Ctrl-C.
pub async fn serve(settings: &Settings, root: &Path) -> anyhow::Result<()> {
    let guard = PathGuard::new(root)
        .with_context(|| format!("Cannot serve {}", root.display()))?;
    let broadcaster = Broadcaster::new(settings.server.client_buffer);
    let state = ServerState::new(guard, settings, broadcaster.clone());

    // Fail fast on an unreadable root
    state.indexer.list_files_async().await?;

    let listener = tokio::net::TcpListener::bind(&settings.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", settings.server.bind))?;
    let addr = listener.local_addr()?;

    let live = start_live_updates(&state, &settings.file_watch).await;

    eprintln!("mdview serving {}", state.guard.root().display());
    eprintln!("  url:     http://{addr}");
    eprintln!(
        "  watch:   {}",
        match &live {
            Some(_) => "on",
            None if settings.file_watch.enabled => "unavailable",
            None => "off",
        }
    );
    if let Some(dir) = &settings.server.static_dir {
        eprintln!("  static:  {}", dir.display());
    }

    crate::log_event!("server", "listening", "{addr}");

    let app = router(state, &settings.server);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(live, broadcaster))
        .await
        .context("Server error")?;

    crate::log_event!("server", "stopped");
    Ok(())
}

/// Start live updates if enabled.
///
/// A watcher that cannot start (inotify limits, a root that vanished) is
/// logged and yields `None`; the API keeps serving without push updates.
pub async fn start_live_updates(
    state: &ServerState,
    config: &FileWatchConfig,
) -> Option<LiveUpdates> {
    if !config.enabled {
        return None;
    }
    match LiveUpdates::start(&state.indexer, &state.broadcaster, config).await {
        Ok(live) => Some(live),
        Err(e) => {
            tracing::warn!("[watcher] failed to start: {e}");
            tracing::warn!("[watcher] continuing without live updates");
            None
        }
    }
}

async fn shutdown_signal(live: Option<LiveUpdates>, broadcaster: Broadcaster) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[server] failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }

    eprintln!("\nShutting down...");
    if let Some(live) = live {
        live.stop().await;
    }
    // Ends every WebSocket loop so the drain can finish
    broadcaster.close_all();
}
