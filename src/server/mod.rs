//! HTTP server for askweb.
//!
//! Exposes the query workflow as a JSON API.
//!
//! # Feature Gate
//!
//! This module requires the `server` feature flag (enabled by default).
//!
//! # Endpoints
//!
//! ```text
//! POST /ask     {"query": "...", "max_retries"?: 2, "complex"?: true}
//!               → 200 {"response": "...", "type": "math" | "text" | "search"}
//!               → 400 | 401 | 502 | 504 {"error": "..."}
//! GET  /health  → 200 {"status": "ok"}
//! ```

pub mod params;
pub mod routes;
pub mod transport;

pub use params::{AskRequest, AskResponse, ErrorBody};
pub use routes::{ApiError, AskServer};
pub use transport::serve_http;
