//! Root selection: the single authorization decision point.
//!
//! Everything downstream trusts the [`ResolvedRoot`] produced here and never
//! re-checks authentication.

use std::path::{Path, PathBuf};

use crate::files::{PathError, SafePath, SandboxGuard};

/// Which tree a request may browse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    /// The configured storage directory.
    Storage,
    /// The whole filesystem.
    System,
}

impl AccessScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Storage => "storage",
            Self::System => "system",
        }
    }
}

/// The root a single request is allowed to traverse.
///
/// Only [`RootSelector::select`] builds one. Paths are resolved through the
/// [`AccessGrant`](super::AccessGrant) that carries it:
///
/// ```compile_fail
/// use std::path::PathBuf;
/// use daemon::auth::RootSelector;
///
/// let root = RootSelector::new(false, PathBuf::from("/srv"), PathBuf::from("/")).select(true);
/// let _ = root.resolve("etc/passwd");
/// ```
#[derive(Debug, Clone)]
pub struct ResolvedRoot {
    scope: AccessScope,
    guard: SandboxGuard,
}

impl ResolvedRoot {
    pub fn scope(&self) -> AccessScope {
        self.scope
    }

    pub fn path(&self) -> &Path {
        self.guard.root()
    }

    /// Resolve a client path inside this root. Empty or `.` yields the root.
    pub(crate) fn resolve(&self, user_path: &str) -> Result<SafePath, PathError> {
        self.guard.resolve(user_path)
    }

    /// Resolve a client path that must name something below the root.
    pub(crate) fn resolve_target(&self, user_path: &str) -> Result<SafePath, PathError> {
        self.guard.resolve_target(user_path)
    }
}

/// Picks the storage root or the system root for a request.
#[derive(Debug, Clone)]
pub struct RootSelector {
    always_allow: bool,
    storage: SandboxGuard,
    system: SandboxGuard,
}

impl RootSelector {
    pub fn new(always_allow: bool, storage_root: PathBuf, system_root: PathBuf) -> Self {
        Self {
            always_allow,
            storage: SandboxGuard::new(storage_root),
            system: SandboxGuard::new(system_root),
        }
    }

    /// Returns the system root iff `authenticated || always_allow`.
    pub fn select(&self, authenticated: bool) -> ResolvedRoot {
        if authenticated || self.always_allow {
            ResolvedRoot {
                scope: AccessScope::System,
                guard: self.system.clone(),
            }
        } else {
            ResolvedRoot {
                scope: AccessScope::Storage,
                guard: self.storage.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(always_allow: bool) -> RootSelector {
        RootSelector::new(
            always_allow,
            PathBuf::from("/srv/storage"),
            PathBuf::from("/"),
        )
    }

    #[test]
    fn test_select_truth_table() {
        let cases = [
            (false, false, AccessScope::Storage),
            (true, false, AccessScope::System),
            (false, true, AccessScope::System),
            (true, true, AccessScope::System),
        ];

        for (authenticated, always_allow, expected) in cases {
            let root = selector(always_allow).select(authenticated);
            assert_eq!(
                root.scope(),
                expected,
                "authenticated={} always_allow={}",
                authenticated,
                always_allow
            );
        }
    }

    #[test]
    fn test_select_paths() {
        let restricted = selector(false).select(false);
        assert_eq!(restricted.path(), Path::new("/srv/storage"));

        let elevated = selector(false).select(true);
        assert_eq!(elevated.path(), Path::new("/"));
    }

    #[test]
    fn test_restricted_root_contains_resolution() {
        let root = selector(false).select(false);

        let inside = root.resolve("media/a.txt").unwrap();
        assert_eq!(inside.as_path(), Path::new("/srv/storage/media/a.txt"));

        assert_eq!(root.resolve("../etc/passwd"), Err(PathError::PathEscape));
    }

    #[test]
    fn test_scope_names() {
        assert_eq!(AccessScope::Storage.as_str(), "storage");
        assert_eq!(AccessScope::System.as_str(), "system");
    }
}
