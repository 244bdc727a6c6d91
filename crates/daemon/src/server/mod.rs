//! HTTP transport for the dashboard API.
//!
//! [`router`] wires the endpoints onto an axum [`Router`]; [`serve`] runs it
//! on a bound listener until the shutdown token is cancelled.

pub mod error;
pub mod handlers;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use protocol::routes;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AccessPolicy;
use crate::config::Config;
use crate::files::StaticAssets;
use crate::metrics::{MetricsProvider, SysinfoProvider};

pub use error::ApiError;

/// State shared by every handler. Cheap to clone; nothing in it is mutated
/// after startup.
#[derive(Clone)]
pub struct AppState {
    pub policy: Arc<AccessPolicy>,
    pub metrics: Arc<dyn MetricsProvider>,
    /// Upper bound on search results, whatever the client asks for.
    pub search_limit: usize,
    /// Root of the static frontend, if one is served.
    pub frontend: Option<StaticAssets>,
}

impl AppState {
    pub fn new(
        policy: AccessPolicy,
        metrics: Arc<dyn MetricsProvider>,
        search_limit: usize,
    ) -> Self {
        Self {
            policy: Arc::new(policy),
            metrics,
            search_limit,
            frontend: None,
        }
    }

    /// Serve files from `dir` for requests that match no API route.
    ///
    /// A directory that does not exist is skipped with a warning.
    pub fn with_frontend(mut self, dir: &Path) -> Self {
        if dir.is_dir() {
            tracing::info!("Serving frontend from {}", dir.display());
            self.frontend = Some(StaticAssets::new(dir));
        } else {
            tracing::warn!(
                "Frontend directory {} not found, serving API only",
                dir.display()
            );
        }
        self
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("policy", &self.policy)
            .field("search_limit", &self.search_limit)
            .field("frontend", &self.frontend)
            .finish_non_exhaustive()
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(routes::SYSTEM, get(handlers::system_info))
        .route(routes::FILES_SEARCH, get(handlers::search_files))
        .route(routes::FILES_LIST, get(handlers::list_files))
        .route(routes::FILES_RAW, get(handlers::raw_file))
        .route(routes::AUTH_CHECK, get(handlers::auth_check))
        .route(routes::HEALTH, get(handlers::health))
        .fallback(handlers::frontend)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve `app` on `listener` until `shutdown` is cancelled.
///
/// In-flight requests are allowed to finish; new connections are refused once
/// shutdown starts.
pub async fn serve(listener: TcpListener, app: Router, shutdown: CancellationToken) -> Result<()> {
    let addr = listener
        .local_addr()
        .context("Failed to read listener address")?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("Shutting down HTTP server");
        })
        .await
        .context("HTTP server error")?;

    Ok(())
}

/// Build the production state from `config`, bind, and serve until
/// `shutdown` is cancelled.
pub async fn run(config: &Config, shutdown: CancellationToken) -> Result<()> {
    let access = config.access_config()?;
    tracing::info!(
        storage_root = %access.storage_root().display(),
        always_allow_full_access = access.always_allow_full_access(),
        "Access configured"
    );

    let metrics = tokio::task::spawn_blocking(SysinfoProvider::new)
        .await
        .context("Failed to initialize metrics provider")?;

    let mut state = AppState::new(
        AccessPolicy::new(&access),
        Arc::new(metrics),
        config.files.search_limit,
    );
    if let Some(dir) = &config.server.static_dir {
        state = state.with_frontend(dir);
    }

    let listener = TcpListener::bind((config.server.bind.as_str(), config.server.port))
        .await
        .with_context(|| {
            format!(
                "Failed to bind {}:{}",
                config.server.bind, config.server.port
            )
        })?;

    serve(listener, router(state), shutdown).await
}
