//! Single-level directory listing.
//!
//! Listing only accepts a [`SafePath`], so the directory has already been
//! checked against the request's root.

use std::fs;
use std::io;

use protocol::ListItem;
use thiserror::Error;

use super::guard::SafePath;

/// Errors that can occur while reading a resolved path.
///
/// Like [`PathError`](super::PathError), variants never carry absolute paths.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The requested path does not exist.
    #[error("path does not exist")]
    NotFound,

    /// The requested path is not a directory.
    #[error("path is not a directory")]
    NotADirectory,

    /// The requested path is a directory where a file was expected.
    #[error("path is a directory")]
    IsADirectory,

    /// Permission denied or another OS-level failure.
    #[error("IO error: {0}")]
    Io(#[source] io::Error),
}

impl BrowserError {
    /// Classify an I/O error from a stat or open call.
    pub fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::Io(err),
        }
    }
}

/// An immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Whether the entry is a directory. Symlinks report their target's kind.
    pub is_directory: bool,
}

impl DirectoryEntry {
    /// Convert to the wire representation.
    pub fn to_protocol(&self) -> ListItem {
        ListItem {
            name: self.name.clone(),
            is_directory: self.is_directory,
        }
    }
}

/// List the immediate children of `base`.
///
/// Entries that vanish or cannot be inspected mid-listing are skipped.
/// Results are sorted directories first, then by case-insensitive name.
pub fn list_directory(base: &SafePath) -> Result<Vec<DirectoryEntry>, BrowserError> {
    let metadata = fs::metadata(base.as_path()).map_err(BrowserError::from_io)?;
    if !metadata.is_dir() {
        return Err(BrowserError::NotADirectory);
    }

    let entries = fs::read_dir(base.as_path()).map_err(BrowserError::from_io)?;

    let mut results = Vec::new();

    for entry_result in entries {
        let entry = match entry_result {
            Ok(e) => e,
            Err(_) => continue, // Skip entries we can't read
        };

        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(_) => continue,
        };

        let is_directory = if file_type.is_symlink() {
            fs::metadata(entry.path())
                .map(|m| m.is_dir())
                .unwrap_or(false)
        } else {
            file_type.is_dir()
        };

        results.push(DirectoryEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            is_directory,
        });
    }

    results.sort_by(|a, b| match (a.is_directory, b.is_directory) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });

    Ok(results)
}
