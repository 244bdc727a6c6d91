//! Sandboxed file access: path resolution, listing, search and raw reads.
//!
//! This module provides:
//! - Lexical path resolution against a permitted root ([`guard`])
//! - Single-level directory listing ([`browser`])
//! - Recursive, result-bounded search ([`search`])
//! - Opening files for streaming ([`raw`])
//! - The public static frontend directory ([`assets`])
//!
//! # Security
//!
//! Every operation that touches the filesystem takes a [`SafePath`], which
//! only [`SandboxGuard`] can produce. Outside this crate a `SafePath` comes
//! from an [`AccessGrant`](crate::auth::AccessGrant). A request for a path
//! outside the root fails before any I/O happens.

pub mod assets;
pub mod browser;
pub mod guard;
pub mod raw;
pub mod search;

pub use assets::{AssetError, StaticAssets};
pub use browser::{list_directory, BrowserError, DirectoryEntry};
pub use guard::{PathError, SafePath, SandboxGuard};
pub use raw::RawFile;
pub use search::{search, SearchResult};
