//! # Home Lab Protocol Library
//!
//! This crate defines the JSON bodies exchanged between the home lab daemon
//! and the browser dashboard, together with the well-known names (routes,
//! credential header, query parameters) both sides agree on.
//!
//! ## Overview
//!
//! - **Metrics**: [`SystemSnapshot`] as polled by the dashboard chart
//! - **File browsing**: [`SearchResponse`], [`ListResponse`]
//! - **Access**: [`AuthStatus`] and the system pass carriers
//! - **Errors**: [`ErrorBody`], the uniform failure body
//!
//! ## Example Usage
//!
//! ```rust
//! use protocol::{ListItem, ListResponse};
//!
//! let response = ListResponse::new(
//!     "media",
//!     vec![ListItem::directory("movies"), ListItem::file("notes.txt")],
//! );
//! assert_eq!(response.total, 2);
//! ```
//!
//! ## Modules
//!
//! - [`messages`]: Response body definitions
//! - [`routes`]: HTTP paths and credential carrier names

pub mod messages;
pub mod routes;

pub use messages::{
    AuthStatus, DiskUsage, ErrorBody, ListItem, ListResponse, SearchHit, SearchResponse,
    SystemSnapshot,
};
pub use routes::{
    AUTHORIZATION_BEARER_PREFIX, MAX_SEARCH_RESULTS, SYSTEM_PASS_HEADER, SYSTEM_PASS_QUERY,
};
