//! Static frontend files.
//!
//! The frontend directory is public and outside the access pipeline, so it
//! gets its own root type. It hands out open files, never a [`SafePath`], so
//! it cannot be used to reach the browser or search operations.
//!
//! [`SafePath`]: super::SafePath

use std::path::Path;

use thiserror::Error;

use super::browser::BrowserError;
use super::guard::{PathError, SandboxGuard};
use super::raw::{self, RawFile};

/// Errors opening a static asset.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

/// A directory of static files served without authentication.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    guard: SandboxGuard,
}

impl StaticAssets {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            guard: SandboxGuard::new(root.as_ref()),
        }
    }

    pub fn root(&self) -> &Path {
        self.guard.root()
    }

    /// Open `path` below the root. A missing file or a directory is `None`.
    pub async fn open(&self, path: &str) -> Result<Option<RawFile>, AssetError> {
        let target = self.guard.resolve_target(path)?;
        match raw::open(&target).await {
            Ok(asset) => Ok(Some(asset)),
            Err(BrowserError::NotFound | BrowserError::IsADirectory) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
