//! Horizontal bar charts and their fixed-palette specializations.

use indexmap::IndexMap;

use super::{
    format_percentage, format_value, percentage, sanitize, Chart, ChartDataset, Rect, Rgb,
    TextAnchor, TextLabel, DEFAULT_CHART_WIDTH, DEFAULT_PALETTE, MUTED_TEXT_COLOR, TRACK_COLOR,
};
use crate::richtext::truncate;

const ROW_HEIGHT: f64 = 7.0;
const BAR_HEIGHT: f64 = 4.0;
const BAR_OFFSET: f64 = 1.5;
const LABEL_CHAR_WIDTH: f64 = 1.5;

/// Star ratings from best to worst.
pub const RATING_PALETTE: &[Rgb] = &[
    Rgb(22, 163, 74),
    Rgb(132, 204, 22),
    Rgb(234, 179, 8),
    Rgb(249, 115, 22),
    Rgb(220, 38, 38),
];

pub const CATEGORY_PALETTE: &[Rgb] = &[
    Rgb(59, 130, 246),
    Rgb(168, 85, 247),
    Rgb(236, 72, 153),
    Rgb(20, 184, 166),
    Rgb(245, 158, 11),
    Rgb(100, 116, 139),
];

/// How bar lengths are derived from values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum BarScale {
    /// Longest bar fills the track.
    #[default]
    Proportional,
    /// Bars are measured against a fixed maximum, e.g. `5.0` for star ratings.
    Fixed(f64),
}

/// Computed values of one bar.
#[derive(Clone, Debug, PartialEq)]
pub struct BarRow {
    pub label: String,
    pub value: f64,
    /// Share of the dataset total, or of the fixed maximum for [`BarScale::Fixed`].
    pub percentage: f64,
    /// Filled portion of the track in percent.
    pub relative_width: f64,
    pub color: Rgb,
}

/// Builder for a horizontal bar chart: label, raw value, track with filled bar, percentage.
#[derive(Clone, Debug)]
pub struct BarChart<'a> {
    data: &'a ChartDataset,
    palette: &'a [Rgb],
    scale: BarScale,
    width: f64,
}

impl<'a> BarChart<'a> {
    pub fn new(data: &'a ChartDataset) -> Self {
        Self {
            data,
            palette: DEFAULT_PALETTE,
            scale: BarScale::Proportional,
            width: DEFAULT_CHART_WIDTH,
        }
    }

    /// Colors for entries without their own color, cycled in order.
    pub fn palette(mut self, palette: &'a [Rgb]) -> Self {
        self.palette = palette;
        self
    }

    pub fn scale(mut self, scale: BarScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Computes the bar values without laying them out.
    pub fn rows(&self) -> Vec<BarRow> {
        let total = self.data.total();
        let max = self.data.max();

        self.data
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let value = sanitize(entry.value);
                let (share, relative_width) = match self.scale {
                    BarScale::Proportional => (percentage(value, total), percentage(value, max)),
                    BarScale::Fixed(limit) => {
                        let width = percentage(value, limit);
                        (width, width)
                    }
                };

                BarRow {
                    label: entry.label.clone(),
                    value,
                    percentage: share,
                    relative_width,
                    color: self.data.color_at(index, self.palette),
                }
            })
            .collect()
    }

    pub fn build(&self) -> Chart {
        if self.data.is_empty() {
            return Chart::no_data(self.width);
        }

        let rows = self.rows();
        let width = self.width;
        let label_width = width * 0.30;
        let value_x = width * 0.30;
        let track_x = width * 0.42;
        let track_width = width * 0.44;

        let mut chart = Chart::new(width, ROW_HEIGHT * rows.len() as f64);
        for (index, row) in rows.iter().enumerate() {
            let top = index as f64 * ROW_HEIGHT;
            let max_chars = (label_width / LABEL_CHAR_WIDTH) as usize;

            chart.push(TextLabel::new(0.0, top + BAR_OFFSET, truncate(&row.label, max_chars)));
            chart.push(
                TextLabel::new(value_x, top + BAR_OFFSET, format_value(row.value))
                    .with_color(MUTED_TEXT_COLOR),
            );
            chart.push(Rect::filled(
                track_x,
                top + BAR_OFFSET,
                track_width,
                BAR_HEIGHT,
                TRACK_COLOR,
            ));
            if row.relative_width > 0.0 {
                chart.push(Rect::filled(
                    track_x,
                    top + BAR_OFFSET,
                    track_width * row.relative_width / 100.0,
                    BAR_HEIGHT,
                    row.color,
                ));
            }

            let trailing = match self.scale {
                BarScale::Proportional => format_percentage(row.percentage),
                BarScale::Fixed(limit) => format!("{:.1}/{}", row.value, format_value(limit)),
            };
            chart.push(
                TextLabel::new(width, top + BAR_OFFSET, trailing).anchored(TextAnchor::End),
            );
        }

        chart
    }
}

/// Star rating distribution, best rating first.
pub fn rating_chart(distribution: Option<&IndexMap<u8, u64>>, width: f64) -> Chart {
    let Some(distribution) = distribution.filter(|map| !map.is_empty()) else {
        return Chart::no_data(width);
    };

    let data: ChartDataset = (1..=5u8)
        .rev()
        .map(|stars| {
            let label = if stars == 1 {
                "1 Star".to_string()
            } else {
                format!("{stars} Stars")
            };
            let count = distribution.get(&stars).copied().unwrap_or(0);
            (label, count as f64)
        })
        .collect();

    BarChart::new(&data)
        .palette(RATING_PALETTE)
        .width(width)
        .build()
}

/// Feedback counts per category.
pub fn category_chart(distribution: Option<&IndexMap<String, u64>>, width: f64) -> Chart {
    let data = distribution
        .map(ChartDataset::from_counts)
        .unwrap_or_default();

    BarChart::new(&data)
        .palette(CATEGORY_PALETTE)
        .width(width)
        .build()
}

/// Average rating per category on a fixed 0 to 5 scale.
pub fn rating_by_category_chart(ratings: Option<&IndexMap<String, f64>>, width: f64) -> Chart {
    let data: ChartDataset = ratings
        .map(|ratings| {
            ratings
                .iter()
                .map(|(category, rating)| (category.clone(), *rating))
                .collect()
        })
        .unwrap_or_default();

    BarChart::new(&data)
        .palette(CATEGORY_PALETTE)
        .scale(BarScale::Fixed(5.0))
        .width(width)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::NO_DATA_TEXT;

    #[test]
    fn rows_report_share_of_total_and_of_max() {
        let data: ChartDataset = [("A", 30.0), ("B", 10.0)].into_iter().collect();
        let rows = BarChart::new(&data).rows();

        assert_eq!(rows[0].percentage, 75.0);
        assert_eq!(rows[0].relative_width, 100.0);
        assert_eq!(rows[1].percentage, 25.0);
        assert!((rows[1].relative_width - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn all_zero_data_yields_zero_width_rows() {
        let data: ChartDataset = [("18-25", 0.0), ("26-35", 0.0)].into_iter().collect();
        let chart = BarChart::new(&data);

        for row in chart.rows() {
            assert_eq!(row.relative_width, 0.0);
            assert_eq!(row.percentage, 0.0);
        }

        let built = chart.build();
        assert!(!built.is_placeholder());
        assert_eq!(built.texts().filter(|text| *text == "0.0%").count(), 2);
        assert!(built
            .rects()
            .all(|rect| rect.width.is_finite() && rect.fill == Some(TRACK_COLOR)));
    }

    #[test]
    fn empty_data_renders_placeholder() {
        let chart = BarChart::new(&ChartDataset::new()).build();
        assert!(chart.is_placeholder());
        assert!(chart.texts().any(|text| text == NO_DATA_TEXT));
    }

    #[test]
    fn rows_keep_insertion_order_and_custom_colors() {
        let mut colors = IndexMap::new();
        colors.insert("Second".to_string(), Rgb(1, 2, 3));
        let data = [("First", 1.0), ("Second", 2.0)]
            .into_iter()
            .collect::<ChartDataset>()
            .with_colors(&colors);

        let rows = BarChart::new(&data).rows();
        assert_eq!(rows[0].label, "First");
        assert_eq!(rows[0].color, DEFAULT_PALETTE[0]);
        assert_eq!(rows[1].color, Rgb(1, 2, 3));
    }

    #[test]
    fn percentages_stay_within_bounds() {
        let data: ChartDataset = [("a", 1.0), ("b", f64::INFINITY), ("c", -4.0), ("d", 7.5)]
            .into_iter()
            .collect();
        for row in BarChart::new(&data).rows() {
            assert!((0.0..=100.0).contains(&row.percentage));
            assert!((0.0..=100.0).contains(&row.relative_width));
        }
    }

    #[test]
    fn rating_chart_lists_five_stars_first() {
        let mut distribution = IndexMap::new();
        distribution.insert(1u8, 5);
        distribution.insert(5u8, 10);
        let chart = rating_chart(Some(&distribution), 120.0);
        let texts: Vec<_> = chart.texts().collect();
        assert_eq!(texts[0], "5 Stars");
        assert!(texts.contains(&"1 Star"));
        assert!(rating_chart(None, 120.0).is_placeholder());
    }

    #[test]
    fn rating_by_category_uses_fixed_scale() {
        let mut ratings = IndexMap::new();
        ratings.insert("UI/UX".to_string(), 4.5);
        ratings.insert("Bug".to_string(), 2.0);
        let data: ChartDataset = ratings.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let rows = BarChart::new(&data).scale(BarScale::Fixed(5.0)).rows();
        assert_eq!(rows[0].relative_width, 90.0);
        assert_eq!(rows[1].relative_width, 40.0);

        let chart = rating_by_category_chart(Some(&ratings), 170.0);
        assert!(chart.texts().any(|text| text == "4.5/5"));
    }
}
