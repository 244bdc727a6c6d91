//! Response bodies for the home lab HTTP API.
//!
//! Field names are part of the wire contract with the dashboard frontend,
//! which mixes snake_case and camelCase keys.

use serde::{Deserialize, Serialize};

// ============================================================================
// Metrics
// ============================================================================

/// Point-in-time host metrics as rendered by the dashboard.
///
/// Sizes are preformatted strings (`"15.52 GB"`) and usage figures are
/// percentages with one decimal (`"12.5"`), so the frontend can print them
/// without further formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    /// CPU vendor and brand, e.g. `"GenuineIntel Intel(R) Core(TM) i5"`.
    pub cpu: String,
    /// Logical core count.
    pub cores: usize,
    /// Total memory.
    pub ram_total: String,
    /// Memory in use (total minus available).
    pub ram_used: String,
    /// One entry per mounted filesystem.
    pub disk: Vec<DiskUsage>,
    /// Average CPU usage across all cores, if a sample is available.
    #[serde(rename = "cpuUsage")]
    pub cpu_usage: Option<String>,
    /// Per-core CPU usage, in core order.
    #[serde(rename = "cpuCores")]
    pub cpu_cores: Vec<String>,
}

/// Usage of a single mounted filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskUsage {
    /// Device or filesystem name.
    pub fs: String,
    /// Total capacity.
    pub size: String,
    /// Space in use.
    pub used: String,
}

// ============================================================================
// File Messages
// ============================================================================

/// Result of a recursive file search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SearchResponse {
    /// Matching files, at most [`crate::MAX_SEARCH_RESULTS`].
    pub results: Vec<SearchHit>,
}

/// A single matching file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Path relative to the searched root, `/`-separated.
    pub path: String,
    /// File name.
    pub name: String,
}

/// Single-level directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse {
    /// The listed directory relative to the browsable root (`""` for the root).
    pub dir: String,
    /// Immediate children.
    pub items: Vec<ListItem>,
    /// Number of items.
    pub total: usize,
}

impl ListResponse {
    /// Build a listing, deriving `total` from `items`.
    pub fn new(dir: impl Into<String>, items: Vec<ListItem>) -> Self {
        let total = items.len();
        Self {
            dir: dir.into(),
            items,
            total,
        }
    }
}

/// An immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListItem {
    /// Entry name.
    pub name: String,
    /// Whether the entry is a directory.
    #[serde(rename = "isDirectory")]
    pub is_directory: bool,
}

impl ListItem {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
        }
    }
}

// ============================================================================
// Access & Errors
// ============================================================================

/// Outcome of a system pass check. Never carries the configured secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
}

/// Uniform error body. Messages are generic by contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
