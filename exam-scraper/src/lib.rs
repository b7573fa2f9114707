pub mod catalog;
pub mod config;
pub mod difficulty;
pub mod download;
pub mod error;
pub mod http;
pub mod listing;
pub mod logging;
pub mod retry;
pub mod walker;

// Fixture-driven tests for the listing parser and the end-to-end walk
#[cfg(test)]
pub mod tests;

// Re-export key types and functions for easier access
pub use crate::catalog::{Catalog, Subject, Year};
pub use crate::difficulty::Difficulty;
pub use crate::download::{download, ensure_dir, sanitize_filename};
pub use crate::error::{DownloadError, FetchError};
pub use crate::http::{Fetch, HttpClient, HttpResponse};
pub use crate::listing::{fetch_listing, parse_listing, Attachment};
pub use crate::walker::{CatalogWalker, DownloadRecord, Failure, FailureStage, RunSummary};
