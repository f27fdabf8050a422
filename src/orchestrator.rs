//! Request lifecycle: fetch metrics, render the report, save it and notify the user.
//!
//! [`ReportOrchestrator`] owns a single [`ReportState`] and the collaborators it drives.  Every
//! failure is logged, turned into exactly one user notification and returned to the caller; the
//! orchestrator is back in [`ReportState::Idle`] once [`ReportOrchestrator::generate`] returns.

use std::fmt;
use std::io;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use log::{debug, error, info};

use crate::config::ReportConfig;
use crate::error::{FetchError, ReportError, Result};
use crate::model::{MetricsSnapshot, ReportFilters, ReportRequest, ReportWindow};
use crate::report::{build_report, GeneratedReport};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReportState {
    Idle,
    Fetching,
    Rendering,
    Done,
    Failed,
}

impl fmt::Display for ReportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportState::Idle => "idle",
            ReportState::Fetching => "fetching",
            ReportState::Rendering => "rendering",
            ReportState::Done => "done",
            ReportState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Source of aggregated metrics, typically an HTTP client of the analytics service.
#[async_trait]
pub trait MetricsProvider {
    async fn fetch_snapshot(
        &self,
        window: &ReportWindow,
        filters: &ReportFilters,
    ) -> std::result::Result<MetricsSnapshot, FetchError>;
}

/// Surface for short user-facing messages (toasts, status bars, log lines).
pub trait NotificationSink {
    fn notify(&self, message: &str, level: NotificationLevel);
}

/// Stores a finished document under the suggested filename.
pub trait FileSaver {
    fn save(&self, bytes: &[u8], filename: &str) -> io::Result<()>;
}

/// Turns a request into a finished document.
pub trait ReportRenderer {
    fn render(&self, request: &ReportRequest, now: NaiveDateTime) -> Result<GeneratedReport>;
}

/// Renders reports as PDF documents with [`build_report`].
#[derive(Clone, Debug, Default)]
pub struct PdfReportRenderer {
    config: ReportConfig,
}

impl PdfReportRenderer {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }
}

impl ReportRenderer for PdfReportRenderer {
    fn render(&self, request: &ReportRequest, now: NaiveDateTime) -> Result<GeneratedReport> {
        build_report(request, &self.config, now)
    }
}

/// What a successful [`ReportOrchestrator::generate`] call produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedReport {
    pub filename: String,
    pub size: usize,
}

type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub struct ReportOrchestrator {
    provider: Box<dyn MetricsProvider + Send + Sync>,
    notifications: Box<dyn NotificationSink + Send + Sync>,
    saver: Box<dyn FileSaver + Send + Sync>,
    renderer: Box<dyn ReportRenderer + Send + Sync>,
    clock: Clock,
    state: Mutex<ReportState>,
    transitions: Mutex<Vec<ReportState>>,
}

impl ReportOrchestrator {
    /// Creates an orchestrator rendering PDFs with `config` and using the local wall clock.
    pub fn new<P, N, S>(provider: P, notifications: N, saver: S, config: ReportConfig) -> Self
    where
        P: MetricsProvider + Send + Sync + 'static,
        N: NotificationSink + Send + Sync + 'static,
        S: FileSaver + Send + Sync + 'static,
    {
        Self {
            provider: Box::new(provider),
            notifications: Box::new(notifications),
            saver: Box::new(saver),
            renderer: Box::new(PdfReportRenderer::new(config)),
            clock: Box::new(|| Local::now().naive_local()),
            state: Mutex::new(ReportState::Idle),
            transitions: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the document renderer.
    pub fn with_renderer<R>(mut self, renderer: R) -> Self
    where
        R: ReportRenderer + Send + Sync + 'static,
    {
        self.renderer = Box::new(renderer);
        self
    }

    /// Replaces the clock used for timestamps and filenames.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub fn state(&self) -> ReportState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `true` while a request is in flight.
    pub fn is_busy(&self) -> bool {
        self.state() != ReportState::Idle
    }

    /// Every state entered so far, oldest first.
    pub fn transitions(&self) -> Vec<ReportState> {
        self.transitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn transition(&self, next: ReportState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("Report state {} -> {}", *state, next);
        *state = next;
        self.transitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(next);
    }

    /// Moves from `Idle` to `Fetching`, or reports the state that blocks a new request.
    fn begin(&self) -> std::result::Result<(), ReportState> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != ReportState::Idle {
            return Err(*state);
        }
        *state = ReportState::Fetching;
        drop(state);

        debug!("Report state {} -> {}", ReportState::Idle, ReportState::Fetching);
        self.transitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ReportState::Fetching);
        Ok(())
    }

    /// Fetches, renders and saves one report.
    ///
    /// The window is validated before anything is fetched.  A request made while another one is
    /// in flight is refused with [`ReportError::Busy`].
    pub async fn generate(
        &self,
        title: impl Into<String>,
        window: ReportWindow,
        filters: ReportFilters,
    ) -> Result<SavedReport> {
        if let Err(err) = window.validate() {
            return Err(self.reject(err));
        }

        if let Err(state) = self.begin() {
            self.notifications.notify(
                "A report is already being generated.",
                NotificationLevel::Info,
            );
            return Err(ReportError::Busy(state));
        }
        let _in_flight = InFlight(self);

        info!("Generating {} report", window.kind_label());
        let snapshot = match self.provider.fetch_snapshot(&window, &filters).await {
            Ok(snapshot) => snapshot,
            Err(err) => return Err(self.fail(err.into())),
        };

        if !snapshot.has_data() {
            info!("No data for the {} window", window.kind_label());
            self.notifications.notify(
                "No data available for the selected period.",
                NotificationLevel::Info,
            );
            self.transition(ReportState::Idle);
            return Err(ReportError::EmptyResult);
        }

        self.transition(ReportState::Rendering);
        let request = ReportRequest::new(snapshot, title)
            .with_window(window)
            .with_filters(filters);
        let report = match self.renderer.render(&request, (self.clock)()) {
            Ok(report) => report,
            Err(err) => return Err(self.fail(err)),
        };

        if let Err(err) = self.saver.save(&report.bytes, &report.filename) {
            return Err(self.fail(ReportError::Save(err)));
        }

        self.transition(ReportState::Done);
        info!("Saved {} ({} bytes)", report.filename, report.bytes.len());
        self.notifications.notify(
            &format!("Report saved as {}", report.filename),
            NotificationLevel::Success,
        );
        self.transition(ReportState::Idle);

        Ok(SavedReport {
            size: report.bytes.len(),
            filename: report.filename,
        })
    }

    fn reject(&self, err: ReportError) -> ReportError {
        error!("Report request rejected: {}", err);
        self.notifications
            .notify(&user_message(&err), NotificationLevel::Error);
        err
    }

    fn fail(&self, err: ReportError) -> ReportError {
        error!("Report generation failed: {}", err);
        self.transition(ReportState::Failed);
        self.notifications
            .notify(&user_message(&err), NotificationLevel::Error);
        self.transition(ReportState::Idle);
        err
    }
}

/// Returns the orchestrator to `Idle` if a request future is dropped mid-flight.
struct InFlight<'a>(&'a ReportOrchestrator);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.0.is_busy() {
            self.0.transition(ReportState::Idle);
        }
    }
}

fn user_message(err: &ReportError) -> String {
    match err {
        ReportError::DataFetch(FetchError::Unauthorized) => {
            "You are not authorized to generate reports.".to_string()
        }
        ReportError::DataFetch(_) => "Failed to load report data. Please try again.".to_string(),
        ReportError::InvalidRequest(reason) => format!("Invalid report request: {reason}."),
        ReportError::FontLoad(_) | ReportError::Render(_) => {
            "Failed to generate the report.".to_string()
        }
        ReportError::Save(_) => "Failed to save the report.".to_string(),
        other => other.to_string(),
    }
}
