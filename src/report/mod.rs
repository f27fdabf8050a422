//! Report assembly: turns a [`ReportRequest`] into PDF bytes plus a download name.

mod filename;
mod layout;
pub mod listing;

pub use filename::report_filename;
pub use layout::period_label;

use chrono::NaiveDateTime;
use log::{debug, info};

use crate::builder::PageCounter;
use crate::config::ReportConfig;
use crate::elements::{SectionTracker, TrackedSection};
use crate::error::{ReportError, Result};
use crate::fonts;
use crate::model::ReportRequest;

use self::layout::ReportLayout;

/// A rendered report ready to be handed to a [`FileSaver`](crate::orchestrator::FileSaver).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedReport {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// Renders `request` as an A4 PDF.
///
/// `now` is used for the generation timestamp, the copyright year and the filename of current
/// reports, so identical inputs produce identical layouts.
pub fn build_report(
    request: &ReportRequest,
    config: &ReportConfig,
    now: NaiveDateTime,
) -> Result<GeneratedReport> {
    assemble(request, config, now).map(|(report, _)| report)
}

/// Renders `request` and adds a PDF outline entry for every report section.
#[cfg(feature = "bookmarks")]
pub fn build_report_with_bookmarks(
    request: &ReportRequest,
    config: &ReportConfig,
    now: NaiveDateTime,
) -> Result<GeneratedReport> {
    let (report, sections) = assemble(request, config, now)?;
    let bytes = crate::bookmarks::apply_section_bookmarks(&report.bytes, &sections)?;
    Ok(GeneratedReport {
        bytes,
        filename: report.filename,
    })
}

fn assemble(
    request: &ReportRequest,
    config: &ReportConfig,
    now: NaiveDateTime,
) -> Result<(GeneratedReport, Vec<TrackedSection>)> {
    config.validate()?;
    request.window.validate()?;

    let font_family = fonts::default_font_family().map_err(ReportError::FontLoad)?;

    let pages = PageCounter::new();
    let tracker = SectionTracker::new(pages.clone());
    let mut document = layout::document_builder(request, config, now)
        .with_page_counter(pages.clone())
        .build(font_family);

    ReportLayout::new(request, config, now, &tracker)
        .push_into(&mut document)
        .map_err(ReportError::Render)?;

    let mut bytes = Vec::new();
    document.render(&mut bytes).map_err(ReportError::Render)?;

    let filename = report_filename(&config.brand, &request.window, now.date());
    info!(
        "Rendered {} ({} bytes, {} pages)",
        filename,
        bytes.len(),
        pages.current()
    );
    let sections = tracker.sections();
    debug!("Section pages: {:?}", sections);

    Ok((GeneratedReport { bytes, filename }, sections))
}
