//! Path resolution against a permitted root.
//!
//! [`SandboxGuard::resolve`] is the only constructor of [`SafePath`], and every
//! filesystem-touching operation in this crate accepts a `SafePath` rather
//! than a raw string. The guard is crate-private to build: callers outside the
//! crate reach it through [`AccessGrant`](crate::auth::AccessGrant) or
//! [`StaticAssets`](super::StaticAssets). The guard never touches the filesystem: resolution is
//! purely lexical, so an out-of-root request fails before any I/O and cannot
//! leak whether its target exists.
//!
//! Resolution steps:
//!
//! 1. Reject input containing NUL.
//! 2. Canonicalize separators (`\` becomes `/`).
//! 3. Walk the segments, dropping empty and `.` segments and popping on `..`.
//!    A `..` with nothing left to pop would climb above the root and fails
//!    with [`PathError::PathEscape`].
//! 4. Join the remaining segments onto the root and check component-wise that
//!    the result is the root or lies below it, so `/storage-evil` never passes
//!    for `/storage`.
//!
//! Input is expected to be percent-decoded exactly once by the transport.
//! The guard does not decode again.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced while resolving a client path.
///
/// Messages never include the root or the attempted absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The input is unusable (empty where a target is required, NUL bytes).
    #[error("invalid path: {0}")]
    InvalidPath(&'static str),

    /// The normalized path falls outside the permitted root.
    #[error("path escapes the permitted root")]
    PathEscape,
}

/// An absolute path proven to be the guard's root or one of its descendants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafePath {
    path: PathBuf,
    relative: String,
}

impl SafePath {
    /// The absolute path on disk.
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// The path relative to the root, `/`-separated. Empty for the root.
    pub fn relative(&self) -> &str {
        &self.relative
    }

    /// Whether this is the root itself.
    pub fn is_root(&self) -> bool {
        self.relative.is_empty()
    }

    /// Last segment of the relative path, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.relative.rsplit('/').next().filter(|name| !name.is_empty())
    }
}

impl AsRef<Path> for SafePath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Resolves client-supplied relative paths inside a fixed root.
///
/// Only the crate can build one:
///
/// ```compile_fail
/// let guard = daemon::files::SandboxGuard::new("/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxGuard {
    root: PathBuf,
}

impl SandboxGuard {
    /// Create a guard for `root`, which should be absolute.
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        // Rebuilding from components drops redundant separators and `.`.
        let root: PathBuf = root.into().components().collect();
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `user_path` against the root. Empty input or `.` yields the
    /// root itself.
    pub(crate) fn resolve(&self, user_path: &str) -> Result<SafePath, PathError> {
        let segments = normalize_segments(user_path)?;

        let mut path = self.root.clone();
        for segment in &segments {
            path.push(segment);
        }

        if !is_within(&self.root, &path) {
            return Err(PathError::PathEscape);
        }

        Ok(SafePath {
            path,
            relative: segments.join("/"),
        })
    }

    /// Like [`resolve`](Self::resolve), but the result must name something
    /// below the root.
    pub(crate) fn resolve_target(&self, user_path: &str) -> Result<SafePath, PathError> {
        let resolved = self.resolve(user_path)?;
        if resolved.is_root() {
            return Err(PathError::InvalidPath("a target path is required"));
        }
        Ok(resolved)
    }
}

/// Split `user_path` into normal segments, collapsing `.` and `..`.
fn normalize_segments(user_path: &str) -> Result<Vec<String>, PathError> {
    if user_path.contains('\0') {
        return Err(PathError::InvalidPath("path contains a NUL byte"));
    }

    let canonical = user_path.replace('\\', "/");
    let mut segments: Vec<String> = Vec::new();

    for segment in canonical.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(PathError::PathEscape);
                }
            }
            normal => segments.push(normal.to_string()),
        }
    }

    Ok(segments)
}

/// Component-wise containment: `candidate` is `root` or below it.
fn is_within(root: &Path, candidate: &Path) -> bool {
    candidate == root || candidate.starts_with(root)
}
