//! System pass verification.
//!
//! A request may carry the system pass in a custom header, a query parameter
//! or an `Authorization` header. All three are cleaned the same way and
//! compared against the configured secret.

use std::fmt;

use protocol::AUTHORIZATION_BEARER_PREFIX;

/// The places a request can carry the system pass, in precedence order.
#[derive(Clone, Copy, Default)]
pub struct Credentials<'a> {
    /// Value of the `x-system-pass` header.
    pub header: Option<&'a str>,
    /// Value of the `system_pass` query parameter.
    pub query: Option<&'a str>,
    /// Value of the `Authorization` header.
    pub authorization: Option<&'a str>,
}

impl<'a> Credentials<'a> {
    /// Returns the first non-blank source, header first, then query, then
    /// `Authorization`.
    pub fn supplied(&self) -> Option<&'a str> {
        [self.header, self.query, self.authorization]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty())
    }
}

impl fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("header", &self.header.is_some())
            .field("query", &self.query.is_some())
            .field("authorization", &self.authorization.is_some())
            .finish()
    }
}

/// Strip surrounding whitespace and a case-insensitive `Bearer ` prefix.
pub fn clean_credential(raw: &str) -> &str {
    let trimmed = raw.trim();
    let prefix_len = AUTHORIZATION_BEARER_PREFIX.len();

    match trimmed.get(..prefix_len) {
        Some(head) if head.eq_ignore_ascii_case(AUTHORIZATION_BEARER_PREFIX) => {
            trimmed[prefix_len..].trim()
        }
        _ => trimmed,
    }
}

/// Compares supplied credentials against the configured system pass.
///
/// Comparison is plain string equality. An empty configured secret never
/// authenticates.
#[derive(Clone)]
pub struct SecretVerifier {
    secret: String,
}

impl SecretVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Whether elevation by secret is possible at all.
    pub fn is_enabled(&self) -> bool {
        !self.secret.is_empty()
    }

    /// Returns true iff `supplied`, once cleaned, equals the configured secret.
    ///
    /// Not constant-time.
    pub fn verify(&self, supplied: Option<&str>) -> bool {
        if !self.is_enabled() {
            return false;
        }

        match supplied {
            Some(raw) => clean_credential(raw) == self.secret,
            None => false,
        }
    }
}

impl fmt::Debug for SecretVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretVerifier")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
