//! Host metrics for the dashboard.
//!
//! The HTTP layer only sees the [`MetricsProvider`] trait; [`SysinfoProvider`]
//! is the production implementation.

pub mod system;

use protocol::SystemSnapshot;
use thiserror::Error;

pub use system::SysinfoProvider;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Errors raised while collecting metrics.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// The provider's internal state is unusable.
    #[error("metrics provider unavailable: {0}")]
    Unavailable(String),

    /// A collection step failed.
    #[error("failed to collect {what}: {reason}")]
    Collection { what: &'static str, reason: String },
}

/// Source of host metrics.
///
/// Implementations may block; callers run them on the blocking pool.
pub trait MetricsProvider: Send + Sync {
    /// Take a fresh snapshot.
    fn snapshot(&self) -> Result<SystemSnapshot, MetricsError>;
}

/// Render a byte count as GiB with two decimals, e.g. `"15.52 GB"`.
pub fn format_gib(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / BYTES_PER_GIB)
}

/// Render a usage percentage with one decimal, e.g. `"12.5"`.
pub fn format_percent(value: f32) -> String {
    format!("{:.1}", value)
}
