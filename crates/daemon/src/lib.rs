//! # Home Lab Daemon Library
//!
//! Backend for a home-lab dashboard: host metrics plus a file browser that is
//! sandboxed to a storage directory unless the caller presents the system
//! pass.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     HTTP server (axum)                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌──────────────┐   ┌──────────────────────────────────┐     │
//! │  │   Metrics    │   │          Access policy           │     │
//! │  │   provider   │   │  secret verifier ▸ root selector │     │
//! │  └──────────────┘   └──────────────────────────────────┘     │
//! │                                    │                         │
//! │                     ┌──────────────▼───────────────────┐     │
//! │                     │   Sandbox guard ▸ SafePath       │     │
//! │                     └──────────────┬───────────────────┘     │
//! │                                    │                         │
//! │                     ┌──────────────▼───────────────────┐     │
//! │                     │   list  │  search  │  raw read   │     │
//! │                     └──────────────────────────────────┘     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use daemon::Config;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::load_default()?;
//!     for env_override in config.apply_env_overrides() {
//!         env_override.log();
//!     }
//!     config.validate()?;
//!
//!     let shutdown = CancellationToken::new();
//!     daemon::server::run(&config, shutdown).await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`auth`]: System pass verification and root selection
//! - [`files`]: Path resolution, listing, search and raw reads
//! - [`metrics`]: Host metrics collection
//! - [`server`]: HTTP routes and graceful shutdown

pub mod auth;
pub mod config;
pub mod files;
pub mod metrics;
pub mod server;

// Re-export protocol for convenience
pub use protocol;

pub use config::{Config, ConfigError, EnvOverride};

pub use auth::{
    AccessConfig, AccessContext, AccessGrant, AccessPolicy, AccessScope, Credentials,
    ResolvedRoot, RootSelector, SecretVerifier,
};

pub use files::{BrowserError, DirectoryEntry, PathError, SafePath, SearchResult, StaticAssets};

pub use metrics::{MetricsError, MetricsProvider, SysinfoProvider};

pub use server::{router, serve, ApiError, AppState};
