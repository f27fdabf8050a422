//! Error types surfaced by report generation.

use std::io;

use thiserror::Error;

use crate::orchestrator::ReportState;

/// Failures reported by a [`MetricsProvider`](crate::orchestrator::MetricsProvider).
#[derive(Debug, Error)]
pub enum FetchError {
    /// The transport failed before a response was received.
    #[error("network error: {0}")]
    Network(String),
    /// The caller is not allowed to read analytics.
    #[error("not authorized to read analytics")]
    Unauthorized,
    /// The aggregation service answered with an error status.
    #[error("server responded with status {status}: {message}")]
    Server { status: u16, message: String },
}

/// Errors produced while requesting, rendering or saving a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The metrics snapshot could not be retrieved.
    #[error("failed to fetch report data: {0}")]
    DataFetch(#[from] FetchError),
    /// The requested window contains no data at all.
    #[error("no data available for the selected period")]
    EmptyResult,
    /// The request was rejected before any data was fetched.
    #[error("invalid report request: {0}")]
    InvalidRequest(String),
    /// A report is already being generated.
    #[error("a report is already being generated (state: {0})")]
    Busy(ReportState),
    /// No usable font family could be loaded.
    #[error("failed to load fonts: {0}")]
    FontLoad(#[source] genpdf::error::Error),
    /// Layout or PDF serialization failed.
    #[error("failed to render report: {0}")]
    Render(#[source] genpdf::error::Error),
    /// The host could not store the generated document.
    #[error("failed to save report: {0}")]
    Save(#[source] io::Error),
    /// The report configuration is invalid.
    #[error("invalid report configuration: {0}")]
    Config(String),
    /// Section bookmarks could not be embedded.
    #[cfg(feature = "bookmarks")]
    #[error("failed to embed bookmarks: {0}")]
    Bookmark(#[from] crate::bookmarks::BookmarkError),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = ReportError> = std::result::Result<T, E>;
