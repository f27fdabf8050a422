//! Legend-row rendition of a pie chart.
//!
//! A fixed-layout document has no use for wedges, so each slice becomes a row with a color
//! swatch, its label, a bar and its share.  The bar length doubles the share (capped at the full
//! track) so thin slices stay visible; the printed percentage is the exact share.

use super::{
    format_percentage, percentage, sanitize, Chart, ChartDataset, Rect, Rgb, TextAnchor,
    TextLabel, DEFAULT_CHART_WIDTH, DEFAULT_PALETTE, TRACK_COLOR,
};
use crate::richtext::truncate;

const ROW_HEIGHT: f64 = 7.0;
const SWATCH_SIZE: f64 = 3.5;
const BAR_HEIGHT: f64 = 3.0;
const LABEL_CHAR_WIDTH: f64 = 1.5;

/// Emphasis applied to slice shares when sizing legend bars.
pub const VISUAL_EMPHASIS: f64 = 2.0;

/// Computed values of one legend row.
#[derive(Clone, Debug, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    /// Exact share of the total.
    pub percentage: f64,
    /// Bar length in percent of the track, `min(percentage * 2, 100)`.
    pub visual_width: f64,
    pub color: Rgb,
}

/// Builder for a pie legend.
#[derive(Clone, Debug)]
pub struct PieLegend<'a> {
    data: &'a ChartDataset,
    palette: &'a [Rgb],
    width: f64,
}

impl<'a> PieLegend<'a> {
    pub fn new(data: &'a ChartDataset) -> Self {
        Self {
            data,
            palette: DEFAULT_PALETTE,
            width: DEFAULT_CHART_WIDTH,
        }
    }

    pub fn palette(mut self, palette: &'a [Rgb]) -> Self {
        self.palette = palette;
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn slices(&self) -> Vec<PieSlice> {
        let total = self.data.total();

        self.data
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let value = sanitize(entry.value);
                let share = percentage(value, total);
                PieSlice {
                    label: entry.label.clone(),
                    value,
                    percentage: share,
                    visual_width: (share * VISUAL_EMPHASIS).min(100.0),
                    color: self.data.color_at(index, self.palette),
                }
            })
            .collect()
    }

    /// Lays out the legend; a dataset without a positive total renders the placeholder.
    pub fn build(&self) -> Chart {
        if self.data.is_empty() || self.data.total() <= 0.0 {
            return Chart::no_data(self.width);
        }

        let slices = self.slices();
        let width = self.width;
        let label_x = SWATCH_SIZE + 2.0;
        let track_x = width * 0.45;
        let track_width = width * 0.35;
        let max_chars = ((track_x - label_x - 1.0) / LABEL_CHAR_WIDTH).max(1.0) as usize;

        let mut chart = Chart::new(width, ROW_HEIGHT * slices.len() as f64);
        for (index, slice) in slices.iter().enumerate() {
            let top = index as f64 * ROW_HEIGHT;
            chart.push(Rect::filled(0.0, top + 1.5, SWATCH_SIZE, SWATCH_SIZE, slice.color));
            chart.push(TextLabel::new(label_x, top + 1.5, truncate(&slice.label, max_chars)));
            chart.push(Rect::filled(track_x, top + 2.0, track_width, BAR_HEIGHT, TRACK_COLOR));
            if slice.visual_width > 0.0 {
                chart.push(Rect::filled(
                    track_x,
                    top + 2.0,
                    track_width * slice.visual_width / 100.0,
                    BAR_HEIGHT,
                    slice.color,
                ));
            }
            chart.push(
                TextLabel::new(width, top + 1.5, format_percentage(slice.percentage))
                    .anchored(TextAnchor::End),
            );
        }

        chart
    }
}
