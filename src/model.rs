//! Data structures describing the aggregated metrics a report is built from.
//!
//! The snapshot types mirror the camelCase JSON emitted by the aggregation service.  Every
//! optional sub-structure is an explicit `Option` so derivations have to check for presence
//! instead of relying on defaults, and label maps keep insertion order because several
//! derivations resolve ties by "first encountered".

use chrono::{Month, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// Ordered label to count mapping.
pub type LabelCounts = IndexMap<String, u64>;

/// Aggregated platform statistics for a time window.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsSnapshot {
    pub total_users: u64,
    pub total_active_users: u64,
    pub total_inactive_users: u64,
    pub total_posts: u64,
    pub active_posts: u64,
    pub hidden_posts: u64,
    pub total_events: u64,
    pub done_events: u64,
    pub ongoing_events: u64,
    pub upcoming_events: u64,
    pub total_hotlines: u64,
    pub total_feedbacks: u64,
    pub demographics: Option<Demographics>,
    pub feedback_analytics: Option<FeedbackAnalytics>,
    pub recent_users: Vec<UserRecord>,
    pub recent_posts: Vec<PostRecord>,
    pub recent_feedback: Vec<FeedbackRecord>,
    pub upcoming_five_events: Vec<EventRecord>,
}

impl MetricsSnapshot {
    /// Parses a snapshot from the JSON produced by the aggregation service.
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|err| {
            ReportError::InvalidRequest(format!("malformed metrics snapshot: {err}"))
        })
    }

    /// Returns `true` when the window holds at least one count or record.
    pub fn has_data(&self) -> bool {
        let totals = [
            self.total_users,
            self.total_posts,
            self.total_events,
            self.total_hotlines,
            self.total_feedbacks,
        ];

        totals.iter().any(|total| *total > 0)
            || !self.recent_users.is_empty()
            || !self.recent_posts.is_empty()
            || !self.recent_feedback.is_empty()
            || !self.upcoming_five_events.is_empty()
    }
}

/// Population breakdowns of the user base.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Demographics {
    pub gender: Option<LabelCounts>,
    pub age_groups: Option<LabelCounts>,
}

/// Aggregated feedback ratings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedbackAnalytics {
    pub average_rating: f64,
    pub rating_distribution: Option<IndexMap<u8, u64>>,
    pub category_distribution: Option<LabelCounts>,
    pub rating_by_category: Option<IndexMap<String, f64>>,
    pub rating_over_time: Option<Vec<RatingPoint>>,
}

/// Average rating for one reporting period.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingPoint {
    pub period: String,
    pub average: f64,
}

impl RatingPoint {
    pub fn new(period: impl Into<String>, average: f64) -> Self {
        Self {
            period: period.into(),
            average,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRecord {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostRecord {
    pub title: Option<String>,
    pub author: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedbackRecord {
    pub user: Option<String>,
    pub rating: Option<u8>,
    pub category: Option<String>,
    pub comment: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventRecord {
    pub title: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
}

/// The period a report covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportWindow {
    /// Everything up to now.
    Current,
    /// A calendar month, `month` in `1..=12`.
    Monthly { year: i32, month: u32 },
    /// A calendar quarter, `quarter` in `1..=4`.
    Quarterly { year: i32, quarter: u32 },
    /// An inclusive custom date range.
    Custom { start: NaiveDate, end: NaiveDate },
}

impl ReportWindow {
    /// Rejects windows that cannot be fetched.
    pub fn validate(&self) -> Result<()> {
        match *self {
            ReportWindow::Current => Ok(()),
            ReportWindow::Monthly { month, .. } if !(1..=12).contains(&month) => Err(
                ReportError::InvalidRequest(format!("month {month} is outside 1..=12")),
            ),
            ReportWindow::Quarterly { quarter, .. } if !(1..=4).contains(&quarter) => Err(
                ReportError::InvalidRequest(format!("quarter {quarter} is outside 1..=4")),
            ),
            ReportWindow::Custom { start, end } if start > end => {
                Err(ReportError::InvalidRequest(format!(
                    "start date {start} is after end date {end}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Short name of the report kind used in filenames and headers.
    pub fn kind_label(&self) -> &'static str {
        match self {
            ReportWindow::Current => "Current",
            ReportWindow::Monthly { .. } => "Monthly",
            ReportWindow::Quarterly { .. } => "Quarterly",
            ReportWindow::Custom { .. } => "Custom",
        }
    }

    /// Inclusive first and last day covered by the window, if it is bounded.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            ReportWindow::Current => None,
            ReportWindow::Monthly { year, month } => month_bounds(year, month, month),
            ReportWindow::Quarterly { year, quarter } => {
                let first = quarter.checked_sub(1)? * 3 + 1;
                month_bounds(year, first, first + 2)
            }
            ReportWindow::Custom { start, end } => Some((start, end)),
        }
    }

    /// Month name for monthly windows, e.g. `October`.
    pub fn month_name(&self) -> Option<&'static str> {
        match *self {
            ReportWindow::Monthly { month, .. } => u8::try_from(month)
                .ok()
                .and_then(|value| Month::try_from(value).ok())
                .map(|month| month.name()),
            _ => None,
        }
    }
}

fn month_bounds(year: i32, first_month: u32, last_month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, first_month, 1)?;
    let next = if last_month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, last_month + 1, 1)?
    };
    Some((start, next.pred_opt()?))
}

/// Optional filters applied by the aggregation service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportFilters {
    pub rating: Option<u8>,
    pub category: Option<String>,
}

impl ReportFilters {
    pub fn is_active(&self) -> bool {
        self.rating.is_some() || self.category.is_some()
    }

    /// Human readable banner text, e.g. `Rating: 5 stars, Category: Bug`.
    pub fn describe(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(rating) = self.rating {
            let unit = if rating == 1 { "star" } else { "stars" };
            parts.push(format!("Rating: {rating} {unit}"));
        }
        if let Some(category) = &self.category {
            parts.push(format!("Category: {category}"));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Everything needed to assemble one report.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportRequest {
    pub snapshot: MetricsSnapshot,
    pub report_title: String,
    pub window: ReportWindow,
    pub filters: ReportFilters,
}

impl ReportRequest {
    pub fn new(snapshot: MetricsSnapshot, report_title: impl Into<String>) -> Self {
        Self {
            snapshot,
            report_title: report_title.into(),
            window: ReportWindow::Current,
            filters: ReportFilters::default(),
        }
    }

    pub fn with_window(mut self, window: ReportWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_filters(mut self, filters: ReportFilters) -> Self {
        self.filters = filters;
        self
    }
}
