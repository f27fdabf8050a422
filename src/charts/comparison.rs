//! Two-segment stacked bar comparing complementary counts (active/inactive, visible/hidden).

use super::{
    format_percentage, percentage, Chart, Rect, Rgb, TextAnchor, TextLabel, DEFAULT_CHART_WIDTH,
};

const TITLE_HEIGHT: f64 = 5.0;
const BAR_HEIGHT: f64 = 6.0;
const CAPTION_GAP: f64 = 1.5;
const CAPTION_HEIGHT: f64 = 4.5;

/// One side of the comparison.
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonSegment {
    pub label: String,
    pub count: u64,
    /// Share of `active + inactive`, also the segment width in percent.
    pub percentage: f64,
    pub color: Rgb,
}

#[derive(Clone, Debug)]
pub struct ComparisonChart {
    title: String,
    active: u64,
    inactive: u64,
    labels: (String, String),
    colors: (Rgb, Rgb),
    width: f64,
}

impl ComparisonChart {
    pub fn new(title: impl Into<String>, active: u64, inactive: u64) -> Self {
        Self {
            title: title.into(),
            active,
            inactive,
            labels: ("Active".to_string(), "Inactive".to_string()),
            colors: (Rgb(16, 185, 129), Rgb(239, 68, 68)),
            width: DEFAULT_CHART_WIDTH,
        }
    }

    pub fn labels(mut self, active: impl Into<String>, inactive: impl Into<String>) -> Self {
        self.labels = (active.into(), inactive.into());
        self
    }

    pub fn colors(mut self, active: Rgb, inactive: Rgb) -> Self {
        self.colors = (active, inactive);
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Both segments, or `None` when there is nothing to compare.
    pub fn segments(&self) -> Option<[ComparisonSegment; 2]> {
        let sum = self.active.saturating_add(self.inactive);
        if sum == 0 {
            return None;
        }

        let segment = |label: &str, count: u64, color: Rgb| ComparisonSegment {
            label: label.to_string(),
            count,
            percentage: percentage(count as f64, sum as f64),
            color,
        };

        Some([
            segment(&self.labels.0, self.active, self.colors.0),
            segment(&self.labels.1, self.inactive, self.colors.1),
        ])
    }

    /// Lays out the chart; a zero sum yields an empty drawing that renders nothing.
    pub fn build(&self) -> Chart {
        let Some([first, second]) = self.segments() else {
            return Chart::new(self.width, 0.0);
        };

        let width = self.width;
        let height = TITLE_HEIGHT + BAR_HEIGHT + CAPTION_GAP + CAPTION_HEIGHT;
        let mut chart = Chart::new(width, height);

        chart.push(TextLabel::new(0.0, 0.0, self.title.clone()).bold());

        let first_width = width * first.percentage / 100.0;
        if first_width > 0.0 {
            chart.push(Rect::filled(0.0, TITLE_HEIGHT, first_width, BAR_HEIGHT, first.color));
        }
        let second_width = width * second.percentage / 100.0;
        if second_width > 0.0 {
            chart.push(Rect::filled(
                first_width,
                TITLE_HEIGHT,
                second_width,
                BAR_HEIGHT,
                second.color,
            ));
        }

        let caption_y = TITLE_HEIGHT + BAR_HEIGHT + CAPTION_GAP;
        chart.push(
            TextLabel::new(0.0, caption_y, caption(&first)).with_color(first.color),
        );
        chart.push(
            TextLabel::new(width, caption_y, caption(&second))
                .with_color(second.color)
                .anchored(TextAnchor::End),
        );

        chart
    }
}

fn caption(segment: &ComparisonSegment) -> String {
    format!(
        "{}: {} ({})",
        segment.label,
        segment.count,
        format_percentage(segment.percentage)
    )
}
