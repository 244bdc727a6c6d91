//! Request handlers.
//!
//! Every file-facing handler starts the same way: gather [`Credentials`] from
//! the request, authorize them into an [`AccessGrant`], and resolve the client
//! path through that grant. The only other filesystem access is the public
//! frontend, served through [`StaticAssets`](crate::files::StaticAssets).

use axum::body::Body;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use protocol::{AuthStatus, ListResponse, SearchResponse, SystemSnapshot, SYSTEM_PASS_HEADER};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use super::error::ApiError;
use super::AppState;
use crate::auth::{AccessGrant, Credentials};
use crate::files::{self, DirectoryEntry, RawFile, SearchResult};
use crate::metrics::MetricsError;

const INDEX_FILE: &str = "index.html";

// Each query struct names the pass field `system_pass`, which must match
// `protocol::SYSTEM_PASS_QUERY`. Serde renames only take literals.

/// `GET /api/files/search` parameters. Values arrive already percent-decoded.
#[derive(Default, Deserialize)]
pub struct SearchQuery {
    /// Search substring.
    pub q: Option<String>,
    /// Client-requested result cap. Never raises the configured limit.
    pub limit: Option<String>,
    pub system_pass: Option<String>,
}

impl SearchQuery {
    /// The requested cap. Values that are not a number are ignored.
    pub fn requested_limit(&self) -> Option<usize> {
        self.limit.as_deref().and_then(|v| v.trim().parse().ok())
    }
}

/// `GET /api/files/list` parameters.
#[derive(Default, Deserialize)]
pub struct ListQuery {
    /// Directory to list, relative to the granted root.
    pub dir: Option<String>,
    pub system_pass: Option<String>,
}

/// `GET /api/files/raw` parameters.
#[derive(Default, Deserialize)]
pub struct RawQuery {
    /// File to read, relative to the granted root.
    pub path: Option<String>,
    pub system_pass: Option<String>,
}

/// `GET /api/auth/check` parameters.
#[derive(Default, Deserialize)]
pub struct AuthQuery {
    pub system_pass: Option<String>,
}

/// Collect the credential sources a request carries.
pub fn credentials<'a>(headers: &'a HeaderMap, query_pass: Option<&'a str>) -> Credentials<'a> {
    Credentials {
        header: headers
            .get(SYSTEM_PASS_HEADER)
            .and_then(|v| v.to_str().ok()),
        query: query_pass,
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok()),
    }
}

fn grant(state: &AppState, headers: &HeaderMap, query_pass: Option<&str>) -> AccessGrant {
    state
        .policy
        .authorize_credentials(&credentials(headers, query_pass))
}

/// `GET /api/system`
pub async fn system_info(State(state): State<AppState>) -> Result<Json<SystemSnapshot>, ApiError> {
    let metrics = state.metrics.clone();
    let snapshot = tokio::task::spawn_blocking(move || metrics.snapshot())
        .await
        .map_err(|e| MetricsError::Unavailable(format!("collection task failed: {}", e)))??;
    Ok(Json(snapshot))
}

/// `GET /api/files/search?q=`
pub async fn search_files(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(query) = query?;
    let grant = grant(&state, &headers, query.system_pass.as_deref());
    let base = grant.resolve("")?;
    let limit = query
        .requested_limit()
        .map_or(state.search_limit, |requested| requested.min(state.search_limit));
    let needle = query.q.unwrap_or_default();

    let results = tokio::task::spawn_blocking(move || files::search(&base, &needle, limit)).await?;

    tracing::debug!(
        scope = grant.scope().as_str(),
        count = results.len(),
        limit,
        "Search finished"
    );

    Ok(Json(SearchResponse {
        results: results.iter().map(SearchResult::to_protocol).collect(),
    }))
}

/// `GET /api/files/list?dir=`
pub async fn list_files(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let Query(query) = query?;
    let grant = grant(&state, &headers, query.system_pass.as_deref());
    let base = grant.resolve(query.dir.as_deref().unwrap_or(""))?;
    let dir = base.relative().to_string();

    let entries = tokio::task::spawn_blocking(move || files::list_directory(&base)).await??;

    Ok(Json(ListResponse::new(
        dir,
        entries.iter().map(DirectoryEntry::to_protocol).collect(),
    )))
}

/// `GET /api/files/raw?path=`
pub async fn raw_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<RawQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let grant = grant(&state, &headers, query.system_pass.as_deref());
    let target = grant.resolve_target(query.path.as_deref().unwrap_or(""))?;
    let raw = files::raw::open(&target).await?;

    let disposition = format!("inline; filename=\"{}\"", raw.name.replace('"', ""));
    let mut response = file_response(raw);
    // Names that are not visible ASCII are left out of the header.
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

/// `GET /api/auth/check`
///
/// Always answers. A query string that cannot be read counts as carrying no
/// query credential.
pub async fn auth_check(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<AuthQuery>, QueryRejection>,
) -> Json<AuthStatus> {
    let query = match query {
        Ok(Query(query)) => query,
        Err(e) => {
            tracing::debug!("Ignoring unreadable auth check query: {}", e);
            AuthQuery::default()
        }
    };

    let context = state
        .policy
        .context(&credentials(&headers, query.system_pass.as_deref()));
    Json(AuthStatus {
        authenticated: context.is_authenticated(),
    })
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Fallback: serve the static frontend, if one is configured.
///
/// Paths without an extension that do not exist fall back to `index.html` so
/// client-side routes load the app.
pub async fn frontend(State(state): State<AppState>, uri: Uri) -> Result<Response, ApiError> {
    let Some(assets) = state.frontend.as_ref() else {
        return Err(ApiError::NotFound);
    };

    let requested = uri.path().trim_start_matches('/');
    let requested = if requested.is_empty() {
        INDEX_FILE
    } else {
        requested
    };

    if let Some(asset) = assets.open(requested).await? {
        return Ok(file_response(asset));
    }

    if !requested.contains('.') {
        if let Some(index) = assets.open(INDEX_FILE).await? {
            return Ok(file_response(index));
        }
    }

    Err(ApiError::NotFound)
}

/// Stream an open file with its content type, and its length when known.
///
/// Without a length the body goes out chunked.
fn file_response(raw: RawFile) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&raw.content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    if let Some(len) = raw.len {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }

    let body = Body::from_stream(ReaderStream::new(raw.file));
    (headers, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::SYSTEM_PASS_QUERY;

    fn parse<T: serde::de::DeserializeOwned>(uri: &str) -> Result<T, QueryRejection> {
        let uri: Uri = uri.parse().unwrap();
        Query::<T>::try_from_uri(&uri).map(|Query(query)| query)
    }

    #[test]
    fn test_credentials_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(SYSTEM_PASS_HEADER, HeaderValue::from_static("from-header"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok"));

        let creds = credentials(&headers, Some("from-query"));
        assert_eq!(creds.header, Some("from-header"));
        assert_eq!(creds.query, Some("from-query"));
        assert_eq!(creds.authorization, Some("Bearer tok"));
        assert_eq!(creds.supplied(), Some("from-header"));
    }

    #[test]
    fn test_credentials_query_before_authorization() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok"));

        assert_eq!(
            credentials(&headers, Some("from-query")).supplied(),
            Some("from-query")
        );
    }

    #[test]
    fn test_credentials_none() {
        let headers = HeaderMap::new();
        assert_eq!(credentials(&headers, None).supplied(), None);
    }

    #[test]
    fn test_pass_query_name_matches_protocol() {
        let uri = format!("/api/files/search?{}=abc", SYSTEM_PASS_QUERY);
        let search: SearchQuery = parse(&uri).unwrap();
        assert_eq!(search.system_pass.as_deref(), Some("abc"));

        let uri = format!("/api/files/list?{}=abc", SYSTEM_PASS_QUERY);
        let list: ListQuery = parse(&uri).unwrap();
        assert_eq!(list.system_pass.as_deref(), Some("abc"));

        let uri = format!("/api/files/raw?{}=abc", SYSTEM_PASS_QUERY);
        let raw: RawQuery = parse(&uri).unwrap();
        assert_eq!(raw.system_pass.as_deref(), Some("abc"));

        let uri = format!("/api/auth/check?{}=abc", SYSTEM_PASS_QUERY);
        let auth: AuthQuery = parse(&uri).unwrap();
        assert_eq!(auth.system_pass.as_deref(), Some("abc"));
    }

    #[test]
    fn test_limit_is_parsed_leniently() {
        let cases = [
            ("/s?q=x&limit=5", Some(5)),
            ("/s?q=x&limit=%205%20", Some(5)),
            ("/s?q=x&limit=", None),
            ("/s?q=x&limit=x", None),
            ("/s?q=x&limit=-1", None),
            ("/s?q=x", None),
        ];

        for (uri, expected) in cases {
            let query: SearchQuery = parse(uri).unwrap();
            assert_eq!(query.requested_limit(), expected, "uri {}", uri);
        }
    }

    #[test]
    fn test_unrelated_parameters_are_ignored() {
        let auth: AuthQuery = parse("/a?system_pass=abc&limit=x&dir=..").unwrap();
        assert_eq!(auth.system_pass.as_deref(), Some("abc"));

        let list: ListQuery = parse("/l?dir=docs&limit=&q=zz").unwrap();
        assert_eq!(list.dir.as_deref(), Some("docs"));
    }
}
