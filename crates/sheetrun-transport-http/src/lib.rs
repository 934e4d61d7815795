//! HTTP transport adapter for sheetrun.
//! Exposes script execution over `POST /execute` with optional Bearer token
//! authentication.

pub mod auth;
mod error;
pub mod router;
pub mod server;

pub use error::HttpTransportError;
pub use router::{build_router, AppState, ARTIFACT_FILENAME, XLSX_CONTENT_TYPE};
pub use server::HttpServer;
