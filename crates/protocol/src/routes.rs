//! HTTP routes and credential carriers understood by the daemon.

/// Host metrics endpoint.
pub const SYSTEM: &str = "/api/system";

/// Recursive file search endpoint.
pub const FILES_SEARCH: &str = "/api/files/search";

/// Single-level directory listing endpoint.
pub const FILES_LIST: &str = "/api/files/list";

/// Raw file download endpoint.
pub const FILES_RAW: &str = "/api/files/raw";

/// System pass check endpoint.
pub const AUTH_CHECK: &str = "/api/auth/check";

/// Liveness endpoint.
pub const HEALTH: &str = "/health";

/// Custom header carrying the system pass. Checked first.
pub const SYSTEM_PASS_HEADER: &str = "x-system-pass";

/// Query parameter carrying the system pass. Checked second.
///
/// The daemon's query structs spell this as a literal `system_pass` field,
/// since serde renames cannot reference a constant.
pub const SYSTEM_PASS_QUERY: &str = "system_pass";

/// Prefix stripped (case-insensitively) from `Authorization` values.
pub const AUTHORIZATION_BEARER_PREFIX: &str = "Bearer ";

/// Upper bound on search results, whatever the client asks for.
pub const MAX_SEARCH_RESULTS: usize = 500;
