//! Access control for every file-facing request.
//!
//! Each request runs the same pipeline:
//!
//! ```text
//! Credentials ──▶ SecretVerifier ──▶ AccessContext
//!                                        │
//!                                        ▼
//!                  RootSelector ──▶ AccessGrant (ResolvedRoot)
//!                                        │
//!                                        ▼
//!                  SandboxGuard ──▶ SafePath ──▶ browser / search / raw
//! ```
//!
//! Outside this crate a [`SafePath`](crate::files::SafePath) can only be
//! obtained through an [`AccessGrant`], and a grant only through
//! [`AccessPolicy::authorize`], so a handler cannot skip a stage. The guard
//! and [`ResolvedRoot`] resolvers are crate-private. The static frontend uses
//! [`StaticAssets`](crate::files::StaticAssets), which never yields a
//! `SafePath`.
//!
//! ```
//! use std::path::PathBuf;
//! use daemon::auth::{AccessConfig, AccessPolicy, Credentials};
//!
//! let config = AccessConfig::new("s3cret", false, PathBuf::from("/srv/storage"), PathBuf::from("/"));
//! let policy = AccessPolicy::new(&config);
//! let grant = policy.authorize_credentials(&Credentials::default());
//!
//! let path = grant.resolve("photos/cat.png").unwrap();
//! assert_eq!(path.as_path(), std::path::Path::new("/srv/storage/photos/cat.png"));
//! assert!(grant.resolve("../etc/passwd").is_err());
//! ```

pub mod root;
pub mod secret;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::files::{PathError, SafePath};

pub use root::{AccessScope, ResolvedRoot, RootSelector};
pub use secret::{clean_credential, Credentials, SecretVerifier};

/// Process-wide access settings, immutable after startup.
#[derive(Clone)]
pub struct AccessConfig {
    system_secret: String,
    always_allow_full_access: bool,
    storage_root: PathBuf,
    system_root: PathBuf,
}

impl AccessConfig {
    pub fn new(
        system_secret: impl Into<String>,
        always_allow_full_access: bool,
        storage_root: PathBuf,
        system_root: PathBuf,
    ) -> Self {
        Self {
            system_secret: system_secret.into(),
            always_allow_full_access,
            storage_root,
            system_root,
        }
    }

    pub fn always_allow_full_access(&self) -> bool {
        self.always_allow_full_access
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn system_root(&self) -> &Path {
        &self.system_root
    }
}

impl fmt::Debug for AccessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessConfig")
            .field("secret_configured", &!self.system_secret.is_empty())
            .field("always_allow_full_access", &self.always_allow_full_access)
            .field("storage_root", &self.storage_root)
            .field("system_root", &self.system_root)
            .finish()
    }
}

/// Per-request authentication state. Never persisted.
#[derive(Clone)]
pub struct AccessContext {
    supplied_secret: Option<String>,
    is_authenticated: bool,
}

impl AccessContext {
    /// Whether a credential was supplied at all.
    pub fn has_credential(&self) -> bool {
        self.supplied_secret.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }
}

impl fmt::Debug for AccessContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessContext")
            .field("has_credential", &self.has_credential())
            .field("is_authenticated", &self.is_authenticated)
            .finish()
    }
}

/// Result of authorizing one request: its authentication flag and root.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    authenticated: bool,
    root: ResolvedRoot,
}

impl AccessGrant {
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn scope(&self) -> AccessScope {
        self.root.scope()
    }

    pub fn root(&self) -> &ResolvedRoot {
        &self.root
    }

    /// Resolve a client path inside the granted root. Empty means the root.
    pub fn resolve(&self, user_path: &str) -> Result<SafePath, PathError> {
        self.root.resolve(user_path)
    }

    /// Resolve a client path that must name an entry below the granted root.
    pub fn resolve_target(&self, user_path: &str) -> Result<SafePath, PathError> {
        self.root.resolve_target(user_path)
    }
}

/// Composes the secret verifier and the root selector.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    verifier: SecretVerifier,
    selector: RootSelector,
}

impl AccessPolicy {
    pub fn new(config: &AccessConfig) -> Self {
        Self {
            verifier: SecretVerifier::new(config.system_secret.clone()),
            selector: RootSelector::new(
                config.always_allow_full_access,
                config.storage_root.clone(),
                config.system_root.clone(),
            ),
        }
    }

    /// Build the request's [`AccessContext`] from whatever it carried.
    pub fn context(&self, credentials: &Credentials<'_>) -> AccessContext {
        let supplied = credentials.supplied();
        AccessContext {
            supplied_secret: supplied.map(str::to_string),
            is_authenticated: self.verifier.verify(supplied),
        }
    }

    /// Decide the root for a request.
    pub fn authorize(&self, context: &AccessContext) -> AccessGrant {
        let root = self.selector.select(context.is_authenticated);

        tracing::debug!(
            scope = root.scope().as_str(),
            authenticated = context.is_authenticated,
            has_credential = context.has_credential(),
            "Access granted"
        );

        AccessGrant {
            authenticated: context.is_authenticated,
            root,
        }
    }

    /// Convenience for `authorize(&context(credentials))`.
    pub fn authorize_credentials(&self, credentials: &Credentials<'_>) -> AccessGrant {
        self.authorize(&self.context(credentials))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str, always_allow: bool) -> AccessConfig {
        AccessConfig::new(
            secret,
            always_allow,
            PathBuf::from("/srv/storage"),
            PathBuf::from("/"),
        )
    }

    fn header(value: &str) -> Credentials<'_> {
        Credentials {
            header: Some(value),
            ..Credentials::default()
        }
    }

    #[test]
    fn test_no_credentials_gets_storage() {
        let policy = AccessPolicy::new(&config("abc", false));
        let grant = policy.authorize_credentials(&Credentials::default());

        assert!(!grant.is_authenticated());
        assert_eq!(grant.scope(), AccessScope::Storage);
        assert_eq!(grant.root().path(), Path::new("/srv/storage"));
    }

    #[test]
    fn test_wrong_secret_is_indistinguishable_from_none() {
        let policy = AccessPolicy::new(&config("abc", false));
        let wrong = policy.authorize_credentials(&header("nope"));
        let none = policy.authorize_credentials(&Credentials::default());

        assert_eq!(wrong.is_authenticated(), none.is_authenticated());
        assert_eq!(wrong.scope(), none.scope());
    }

    #[test]
    fn test_correct_secret_gets_system() {
        let policy = AccessPolicy::new(&config("abc", false));
        let grant = policy.authorize_credentials(&Credentials {
            authorization: Some("Bearer abc"),
            ..Credentials::default()
        });

        assert!(grant.is_authenticated());
        assert_eq!(grant.scope(), AccessScope::System);
        assert_eq!(grant.root().path(), Path::new("/"));
    }

    #[test]
    fn test_always_allow_without_secret() {
        let policy = AccessPolicy::new(&config("abc", true));
        let grant = policy.authorize_credentials(&Credentials::default());

        assert!(!grant.is_authenticated());
        assert_eq!(grant.scope(), AccessScope::System);
    }

    #[test]
    fn test_empty_configured_secret_blocks_elevation() {
        let policy = AccessPolicy::new(&config("", false));
        let context = policy.context(&header("anything"));

        assert!(context.has_credential());
        assert!(!context.is_authenticated());
        assert_eq!(policy.authorize(&context).scope(), AccessScope::Storage);
    }

    #[test]
    fn test_grant_resolves_within_root() {
        let policy = AccessPolicy::new(&config("abc", false));
        let grant = policy.authorize_credentials(&Credentials::default());

        let path = grant.resolve("docs/readme.txt").unwrap();
        assert_eq!(path.as_path(), Path::new("/srv/storage/docs/readme.txt"));
        assert_eq!(grant.resolve("../etc/passwd"), Err(PathError::PathEscape));
        assert!(matches!(
            grant.resolve_target(""),
            Err(PathError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_debug_output_hides_secret() {
        let access = config("topsecret", false);
        assert!(!format!("{:?}", access).contains("topsecret"));

        let policy = AccessPolicy::new(&access);
        assert!(!format!("{:?}", policy).contains("topsecret"));

        let context = policy.context(&header("topsecret"));
        assert!(!format!("{:?}", context).contains("topsecret"));
    }
}
