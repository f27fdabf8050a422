//! Section layout of the analytics report.

use chrono::{Datelike, NaiveDateTime};
use genpdf::elements::{Break, FrameCellDecorator, LinearLayout, Paragraph, TableLayout};
use genpdf::error::Error;
use genpdf::style::{Color, Style};
use genpdf::{Alignment, Document, Element, Margins, PaperSize};

use crate::builder::DocumentBuilder;
use crate::charts::{
    category_chart, rating_by_category_chart, rating_chart, BarChart, Chart, ChartDataset,
    ComparisonChart, LineChart, PieLegend, Rgb, DEFAULT_CHART_WIDTH, MUTED_TEXT_COLOR,
    TEXT_COLOR,
};
use crate::config::ReportConfig;
use crate::elements::{ChartElement, SectionTracker};
use crate::insights::{clamp_rating, derive_insights, InsightBundle};
use crate::model::{MetricsSnapshot, ReportRequest, ReportWindow};
use crate::richtext::{paragraph, Span};

use super::listing::{self, Listing, ListingOptions};

const BODY_FONT_SIZE: u8 = 10;
const SMALL_FONT_SIZE: u8 = 8;
const HALF_CHART_WIDTH: f64 = 80.0;
const CELL_PADDING_MM: f64 = 1.5;
const A4_HEIGHT_MM: f64 = 297.0;
/// Room taken by the running header on follow-up pages.
const RUNNING_HEADER_MM: f64 = 12.0;

const ACTIVE_COLOR: Rgb = Rgb(16, 185, 129);
const INACTIVE_COLOR: Rgb = Rgb(239, 68, 68);
const HIDDEN_COLOR: Rgb = Rgb(245, 158, 11);

/// Configures the document shell: paper, margins, running header and footer.
pub(super) fn document_builder(
    request: &ReportRequest,
    config: &ReportConfig,
    now: NaiveDateTime,
) -> DocumentBuilder {
    let running_title = format!("{} | {}", config.brand, request.report_title);
    let copyright = config.copyright_line(now.year());

    DocumentBuilder::new()
        .with_title(request.report_title.clone())
        .with_paper_size(PaperSize::A4)
        .with_font_size(BODY_FONT_SIZE)
        .with_margins(Margins::all(config.margin_mm))
        .with_header(move |page| {
            let mut layout = LinearLayout::vertical();
            if page > 1 {
                let mut line = Paragraph::new(running_title.clone());
                line.set_alignment(Alignment::Right);
                layout.push(line.styled(muted(SMALL_FONT_SIZE)));
                layout.push(Break::new(1.0));
            }
            layout
        })
        .with_footer(config.footer_height_mm, move |page| {
            let mut layout = LinearLayout::vertical();

            let mut copyright_line = Paragraph::new(copyright.clone());
            copyright_line.set_alignment(Alignment::Center);
            layout.push(copyright_line.styled(muted(SMALL_FONT_SIZE)));

            let mut page_line = Paragraph::new(format!("Page {}", page));
            page_line.set_alignment(Alignment::Right);
            layout.push(page_line.styled(muted(SMALL_FONT_SIZE)));

            layout
        })
}

fn muted(font_size: u8) -> Style {
    Style::new()
        .with_font_size(font_size)
        .with_color(MUTED_TEXT_COLOR.into())
}

fn heading_style(config: &ReportConfig) -> Style {
    Style::new()
        .bold()
        .with_font_size(14)
        .with_color(config.accent_color.into())
}

fn subheading(text: &str) -> impl Element {
    Paragraph::new(text.to_string()).styled(
        Style::new()
            .bold()
            .with_font_size(11)
            .with_color(TEXT_COLOR.into()),
    )
}

/// Human readable description of the covered period.
pub fn period_label(window: &ReportWindow, now: NaiveDateTime) -> String {
    match *window {
        ReportWindow::Current => format!("All time, as of {}", now.format("%Y-%m-%d")),
        ReportWindow::Monthly { year, month } => match window.month_name() {
            Some(name) => format!("{name} {year}"),
            None => format!("{year}-{month:02}"),
        },
        ReportWindow::Quarterly { year, quarter } => match window.date_range() {
            Some((start, end)) => format!("Q{quarter} {year} ({start} to {end})"),
            None => format!("Q{quarter} {year}"),
        },
        ReportWindow::Custom { start, end } => format!("{start} to {end}"),
    }
}

/// Pushes every report section into a document in their fixed order.
pub(super) struct ReportLayout<'a> {
    request: &'a ReportRequest,
    config: &'a ReportConfig,
    now: NaiveDateTime,
    insights: InsightBundle,
    tracker: &'a SectionTracker,
}

impl<'a> ReportLayout<'a> {
    pub(super) fn new(
        request: &'a ReportRequest,
        config: &'a ReportConfig,
        now: NaiveDateTime,
        tracker: &'a SectionTracker,
    ) -> Self {
        Self {
            request,
            config,
            now,
            insights: derive_insights(&request.snapshot),
            tracker,
        }
    }

    fn snapshot(&self) -> &MetricsSnapshot {
        &self.request.snapshot
    }

    /// Wraps `chart` so it always fits on an otherwise empty page.
    fn chart(&self, chart: Chart) -> ChartElement {
        let body_height = A4_HEIGHT_MM
            - 2.0 * self.config.margin_mm
            - self.config.footer_height_mm
            - RUNNING_HEADER_MM;
        ChartElement::new(chart).with_max_height(body_height)
    }

    pub(super) fn push_into(&self, document: &mut Document) -> Result<(), Error> {
        document.push(self.header());
        document.push(Break::new(1.5));

        self.push_section(document, "Executive Summary", self.executive_summary());
        self.push_section(document, "Statistics", self.statistics()?);
        self.push_section(document, "Demographics", self.demographics()?);
        self.push_section(document, "Feedback Analytics", self.feedback_analytics());
        self.push_section(document, "Recent Activity", self.listings()?);

        Ok(())
    }

    fn push_section<E: Element + 'static>(&self, document: &mut Document, title: &str, body: E) {
        let heading = Paragraph::new(title.to_string()).styled(heading_style(self.config));
        document.push(self.tracker.track(title, heading));
        document.push(Break::new(0.5));
        document.push(body);
        document.push(Break::new(1.5));
    }

    fn header(&self) -> LinearLayout {
        let mut layout = LinearLayout::vertical();

        layout.push(paragraph([Span::new(self.config.brand.clone())
            .bold()
            .sized(18)
            .colored(self.config.accent_color)]));
        layout.push(paragraph([Span::new(self.request.report_title.clone())
            .bold()
            .sized(14)]));
        layout.push(paragraph([
            Span::new("Generated: ").bold(),
            Span::new(self.now.format("%B %-d, %Y %H:%M").to_string()),
        ]));

        let mut banner = vec![
            Span::new("Period: ").bold(),
            Span::new(period_label(&self.request.window, self.now)),
        ];
        if let Some(filters) = self.request.filters.describe() {
            banner.push(Span::new("    "));
            banner.push(Span::new("Filters: ").bold());
            banner.push(Span::new(filters).italic());
        }
        layout.push(paragraph(banner).styled(muted(BODY_FONT_SIZE)));

        layout
    }

    fn executive_summary(&self) -> LinearLayout {
        let mut layout = LinearLayout::vertical();
        let sections = self.insights.sections();
        if sections.is_empty() {
            layout.push(
                Paragraph::new("Not enough data to derive insights for this period.")
                    .styled(muted(BODY_FONT_SIZE)),
            );
            return layout;
        }

        for (title, text) in sections {
            layout.push(paragraph([
                Span::new(format!("{title}: ")).bold(),
                Span::new(text.to_string()),
            ]));
            layout.push(Break::new(0.5));
        }
        layout
    }

    fn statistics(&self) -> Result<LinearLayout, Error> {
        let snapshot = self.snapshot();
        let mut layout = LinearLayout::vertical();

        let feedback_detail = match snapshot.feedback_analytics.as_ref() {
            Some(analytics) => format!("avg {:.1} / 5", clamp_rating(analytics.average_rating)),
            None => "submitted".to_string(),
        };
        let cards = [
            (
                "Users",
                snapshot.total_users,
                format!(
                    "{} active / {} inactive",
                    snapshot.total_active_users, snapshot.total_inactive_users
                ),
            ),
            (
                "Posts",
                snapshot.total_posts,
                format!(
                    "{} visible / {} hidden",
                    snapshot.active_posts, snapshot.hidden_posts
                ),
            ),
            (
                "Events",
                snapshot.total_events,
                format!(
                    "{} done / {} ongoing / {} upcoming",
                    snapshot.done_events, snapshot.ongoing_events, snapshot.upcoming_events
                ),
            ),
            (
                "Hotlines",
                snapshot.total_hotlines,
                "emergency contacts".to_string(),
            ),
            ("Feedback", snapshot.total_feedbacks, feedback_detail),
        ];

        let mut table = TableLayout::new(vec![1; cards.len()]);
        table.set_cell_decorator(FrameCellDecorator::new(true, true, false));
        let mut row = table.row();
        for (label, value, detail) in cards {
            let mut card = LinearLayout::vertical();
            card.push(Paragraph::new(label).styled(muted(SMALL_FONT_SIZE)));
            card.push(
                Paragraph::new(value.to_string()).styled(
                    Style::new()
                        .bold()
                        .with_font_size(16)
                        .with_color(self.config.accent_color.into()),
                ),
            );
            card.push(Paragraph::new(detail).styled(muted(SMALL_FONT_SIZE)));
            row.push_element(card.padded(Margins::all(CELL_PADDING_MM)));
        }
        row.push()?;
        layout.push(table);
        layout.push(Break::new(1.0));

        layout.push(self.chart(
            ComparisonChart::new(
                "User Activity",
                snapshot.total_active_users,
                snapshot.total_inactive_users,
            )
            .colors(ACTIVE_COLOR, INACTIVE_COLOR)
            .width(DEFAULT_CHART_WIDTH)
            .build(),
        ));
        layout.push(Break::new(0.5));
        layout.push(self.chart(
            ComparisonChart::new("Post Visibility", snapshot.active_posts, snapshot.hidden_posts)
                .labels("Visible", "Hidden")
                .colors(ACTIVE_COLOR, HIDDEN_COLOR)
                .width(DEFAULT_CHART_WIDTH)
                .build(),
        ));
        layout.push(Break::new(0.5));

        let events = ChartDataset::new()
            .with_entry("Done", snapshot.done_events as f64)
            .with_entry("Ongoing", snapshot.ongoing_events as f64)
            .with_entry("Upcoming", snapshot.upcoming_events as f64);
        layout.push(subheading("Event Status"));
        layout.push(self.chart(
            BarChart::new(&events).width(DEFAULT_CHART_WIDTH).build(),
        ));

        Ok(layout)
    }

    fn demographics(&self) -> Result<TableLayout, Error> {
        let demographics = self.snapshot().demographics.as_ref();
        let gender = demographics
            .and_then(|value| value.gender.as_ref())
            .map(ChartDataset::from_counts)
            .unwrap_or_default();
        let age_groups = demographics
            .and_then(|value| value.age_groups.as_ref())
            .map(ChartDataset::from_counts)
            .unwrap_or_default();

        let mut left = LinearLayout::vertical();
        left.push(subheading("Gender"));
        left.push(self.chart(
            PieLegend::new(&gender).width(HALF_CHART_WIDTH).build(),
        ));

        let mut right = LinearLayout::vertical();
        right.push(subheading("Age Groups"));
        right.push(self.chart(
            BarChart::new(&age_groups).width(HALF_CHART_WIDTH).build(),
        ));

        let mut table = TableLayout::new(vec![1, 1]);
        table
            .row()
            .element(left.padded(Margins::trbl(0.0, 2.0, 0.0, 0.0)))
            .element(right.padded(Margins::trbl(0.0, 0.0, 0.0, 2.0)))
            .push()?;
        Ok(table)
    }

    fn feedback_analytics(&self) -> LinearLayout {
        let mut layout = LinearLayout::vertical();
        let Some(analytics) = self.snapshot().feedback_analytics.as_ref() else {
            layout.push(
                Paragraph::new("No feedback analytics available for this period.")
                    .styled(muted(BODY_FONT_SIZE)),
            );
            return layout;
        };

        layout.push(paragraph([
            Span::new("Average rating: ").bold(),
            Span::new(format!("{:.1} / 5", clamp_rating(analytics.average_rating))),
        ]));
        layout.push(Break::new(0.5));

        layout.push(subheading("Rating Distribution"));
        layout.push(self.chart(rating_chart(
            analytics.rating_distribution.as_ref(),
            DEFAULT_CHART_WIDTH,
        )));
        layout.push(Break::new(0.5));

        layout.push(subheading("Feedback by Category"));
        layout.push(self.chart(category_chart(
            analytics.category_distribution.as_ref(),
            DEFAULT_CHART_WIDTH,
        )));
        layout.push(Break::new(0.5));

        layout.push(subheading("Average Rating by Category"));
        layout.push(self.chart(rating_by_category_chart(
            analytics.rating_by_category.as_ref(),
            DEFAULT_CHART_WIDTH,
        )));
        layout.push(Break::new(0.5));

        let series = analytics.rating_over_time.as_deref().unwrap_or(&[]);
        layout.push(subheading("Rating Over Time"));
        layout.push(self.chart(
            LineChart::new(series)
                .max_points(self.config.line_chart_max_points)
                .width(DEFAULT_CHART_WIDTH)
                .build(),
        ));

        layout
    }

    fn listings(&self) -> Result<LinearLayout, Error> {
        let snapshot = self.snapshot();
        let options = ListingOptions::from(self.config);
        let mut layout = LinearLayout::vertical();

        for listing in [
            listing::recent_users(&snapshot.recent_users, options),
            listing::recent_posts(&snapshot.recent_posts, options),
            listing::recent_feedback(&snapshot.recent_feedback, options),
            listing::upcoming_events(&snapshot.upcoming_five_events, options),
        ] {
            layout.push(subheading(listing.title));
            if listing.is_empty() {
                layout.push(
                    Paragraph::new(listing.empty_text).styled(muted(BODY_FONT_SIZE).italic()),
                );
            } else {
                layout.push(listing_table(&listing)?);
            }
            layout.push(Break::new(1.0));
        }

        Ok(layout)
    }
}

fn listing_table(listing: &Listing) -> Result<TableLayout, Error> {
    let mut table = TableLayout::new(listing.weights.to_vec());
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let header_style = Style::new()
        .bold()
        .with_font_size(SMALL_FONT_SIZE + 1)
        .with_color(Color::Rgb(31, 41, 55));
    let mut header = table.row();
    for title in listing.headers {
        header.push_element(
            Paragraph::new(*title)
                .styled(header_style)
                .padded(Margins::all(CELL_PADDING_MM)),
        );
    }
    header.push()?;

    for cells in &listing.rows {
        let mut row = table.row();
        for cell in cells {
            row.push_element(
                Paragraph::new(cell.clone())
                    .styled(Style::new().with_font_size(SMALL_FONT_SIZE + 1))
                    .padded(Margins::all(CELL_PADDING_MM)),
            );
        }
        row.push()?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, 16)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn period_labels_describe_each_window() {
        assert_eq!(
            period_label(&ReportWindow::Current, now()),
            "All time, as of 2024-10-16"
        );
        assert_eq!(
            period_label(&ReportWindow::Monthly { year: 2024, month: 9 }, now()),
            "September 2024"
        );
        assert_eq!(
            period_label(
                &ReportWindow::Quarterly {
                    year: 2024,
                    quarter: 1
                },
                now()
            ),
            "Q1 2024 (2024-01-01 to 2024-03-31)"
        );
        assert_eq!(
            period_label(
                &ReportWindow::Custom {
                    start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                    end: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
                },
                now()
            ),
            "2024-02-01 to 2024-02-10"
        );
    }
}
