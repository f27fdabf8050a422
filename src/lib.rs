//! Analytics report engine.
//!
//! Turns aggregated platform metrics into narrative insights and a paginated A4 PDF with bar
//! charts, pie legends, comparison bars, trend lines and tabular listings.

pub mod builder;
pub mod charts;
pub mod config;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod insights;
pub mod model;
pub mod orchestrator;
pub mod report;
pub mod richtext;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use config::ReportConfig;
pub use error::{FetchError, ReportError, Result};
pub use insights::{derive_insights, InsightBundle};
pub use model::{MetricsSnapshot, ReportFilters, ReportRequest, ReportWindow};
pub use orchestrator::{ReportOrchestrator, ReportState};
pub use report::{build_report, GeneratedReport};

#[cfg(feature = "bookmarks")]
pub use report::build_report_with_bookmarks;
