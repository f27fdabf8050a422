//! Tabular listings of recent records.
//!
//! Listings are plain data: titles, headers and already formatted cell text.  Rendering them into
//! `genpdf` tables happens in the layout module.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::config::ReportConfig;
use crate::model::{EventRecord, FeedbackRecord, PostRecord, UserRecord};
use crate::richtext::truncate;

/// Cell text for an absent field.
pub const MISSING_VALUE: &str = "N/A";

/// Cell text for an absent person or author name.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Row limit and cell width applied to every listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListingOptions {
    pub row_limit: usize,
    pub truncate_limit: usize,
}

impl Default for ListingOptions {
    fn default() -> Self {
        ListingOptions::from(&ReportConfig::default())
    }
}

impl From<&ReportConfig> for ListingOptions {
    fn from(config: &ReportConfig) -> Self {
        Self {
            row_limit: config.table_row_limit,
            truncate_limit: config.text_truncate_limit,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listing {
    pub title: &'static str,
    pub headers: &'static [&'static str],
    /// Relative column widths, one per header.
    pub weights: &'static [usize],
    pub rows: Vec<Vec<String>>,
    /// Shown instead of the table when there are no rows.
    pub empty_text: &'static str,
}

impl Listing {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

struct Cells {
    options: ListingOptions,
    row: Vec<String>,
}

impl Cells {
    fn new(options: ListingOptions) -> Self {
        Self {
            options,
            row: Vec::new(),
        }
    }

    fn text(mut self, value: Option<&str>, fallback: &str) -> Self {
        let value = value
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(fallback);
        self.row
            .push(truncate(value, self.options.truncate_limit).into_owned());
        self
    }

    fn date(mut self, value: Option<&str>) -> Self {
        let formatted = value.and_then(format_date);
        self.row
            .push(formatted.unwrap_or_else(|| MISSING_VALUE.to_string()));
        self
    }

    fn finish(self) -> Vec<String> {
        self.row
    }
}

/// Formats an ISO-8601 date or timestamp as `YYYY-MM-DD`; other non-empty text is kept as is.
fn format_date(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let date = DateTime::parse_from_rfc3339(value)
        .map(|stamp| stamp.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"));

    Some(match date {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => value.to_string(),
    })
}

pub fn recent_users(users: &[UserRecord], options: ListingOptions) -> Listing {
    let rows = users
        .iter()
        .take(options.row_limit)
        .map(|user| {
            Cells::new(options)
                .text(user.name.as_deref(), UNKNOWN_NAME)
                .text(user.email.as_deref(), MISSING_VALUE)
                .text(user.role.as_deref(), MISSING_VALUE)
                .text(user.status.as_deref(), MISSING_VALUE)
                .date(user.created_at.as_deref())
                .finish()
        })
        .collect();

    Listing {
        title: "Recent Users",
        headers: &["Name", "Email", "Role", "Status", "Joined"],
        weights: &[3, 4, 2, 2, 2],
        rows,
        empty_text: "No recent users.",
    }
}

pub fn recent_posts(posts: &[PostRecord], options: ListingOptions) -> Listing {
    let rows = posts
        .iter()
        .take(options.row_limit)
        .map(|post| {
            Cells::new(options)
                .text(post.title.as_deref(), MISSING_VALUE)
                .text(post.author.as_deref(), UNKNOWN_NAME)
                .text(post.status.as_deref(), MISSING_VALUE)
                .date(post.created_at.as_deref())
                .finish()
        })
        .collect();

    Listing {
        title: "Recent Posts",
        headers: &["Title", "Author", "Status", "Created"],
        weights: &[5, 3, 2, 2],
        rows,
        empty_text: "No recent posts.",
    }
}

pub fn recent_feedback(feedback: &[FeedbackRecord], options: ListingOptions) -> Listing {
    let rows = feedback
        .iter()
        .take(options.row_limit)
        .map(|entry| {
            let rating = entry.rating.map(|rating| format!("{rating}/5"));
            Cells::new(options)
                .text(entry.user.as_deref(), UNKNOWN_NAME)
                .text(rating.as_deref(), MISSING_VALUE)
                .text(entry.category.as_deref(), MISSING_VALUE)
                .text(entry.comment.as_deref(), MISSING_VALUE)
                .date(entry.created_at.as_deref())
                .finish()
        })
        .collect();

    Listing {
        title: "Recent Feedback",
        headers: &["User", "Rating", "Category", "Comment", "Date"],
        weights: &[3, 1, 2, 5, 2],
        rows,
        empty_text: "No recent feedback.",
    }
}

pub fn upcoming_events(events: &[EventRecord], options: ListingOptions) -> Listing {
    let rows = events
        .iter()
        .take(options.row_limit)
        .map(|event| {
            Cells::new(options)
                .text(event.title.as_deref(), MISSING_VALUE)
                .date(event.date.as_deref())
                .text(event.location.as_deref(), MISSING_VALUE)
                .text(event.status.as_deref(), MISSING_VALUE)
                .finish()
        })
        .collect();

    Listing {
        title: "Upcoming Events",
        headers: &["Title", "Date", "Location", "Status"],
        weights: &[4, 2, 4, 2],
        rows,
        empty_text: "No upcoming events.",
    }
}
