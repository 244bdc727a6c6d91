//! Recursive file search bounded by a result count.
//!
//! The walk is an explicit stack of open directory iterators, which visits
//! entries in the same depth-first, directory-listing order as a recursive
//! walk would. The limit is checked after every match, so the walk stops as
//! soon as it is reached and never descends further.
//!
//! There is no time budget: a huge tree with no early matches is walked until
//! it is exhausted or the limit is hit.

use std::fs::{self, ReadDir};

use protocol::SearchHit;

use super::guard::SafePath;

/// A matching file, relative to the search base.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchResult {
    /// `/`-separated path relative to the search base.
    pub relative_path: String,
    /// File name.
    pub name: String,
}

impl SearchResult {
    /// Convert to the wire representation.
    pub fn to_protocol(&self) -> SearchHit {
        SearchHit {
            path: self.relative_path.clone(),
            name: self.name.clone(),
        }
    }
}

/// One open directory on the walk stack.
struct Frame {
    entries: ReadDir,
    /// Relative path of this directory, empty for the base.
    prefix: String,
}

/// Search `base` for files whose relative path contains `query`,
/// case-insensitively. An empty query matches every file.
///
/// Unreadable directories and entries are skipped. Symlinks to directories
/// are not followed; symlinks to files are matched like files.
pub fn search(base: &SafePath, query: &str, limit: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();
    if limit == 0 {
        return results;
    }

    let needle = query.to_lowercase();

    let root_entries = match fs::read_dir(base.as_path()) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Search base unreadable: {}", e);
            return results;
        }
    };

    let mut stack = vec![Frame {
        entries: root_entries,
        prefix: String::new(),
    }];

    while let Some(frame) = stack.last_mut() {
        let entry = match frame.entries.next() {
            Some(Ok(entry)) => entry,
            Some(Err(_)) => continue,
            None => {
                stack.pop();
                continue;
            }
        };

        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(_) => continue,
        };

        let name = entry.file_name().to_string_lossy().to_string();
        let relative_path = if frame.prefix.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", frame.prefix, name)
        };

        if file_type.is_dir() {
            match fs::read_dir(entry.path()) {
                Ok(entries) => stack.push(Frame {
                    entries,
                    prefix: relative_path,
                }),
                Err(e) => {
                    tracing::trace!("Skipping unreadable directory: {}", e);
                }
            }
            continue;
        }

        let is_file = if file_type.is_symlink() {
            fs::metadata(entry.path())
                .map(|m| m.is_file())
                .unwrap_or(false)
        } else {
            file_type.is_file()
        };

        if is_file && relative_path.to_lowercase().contains(&needle) {
            results.push(SearchResult {
                relative_path,
                name,
            });
            if results.len() >= limit {
                break;
            }
        }
    }

    results
}
