//! Trend line over the most recent periods.

use super::{
    format_value, sanitize, Chart, Point, Polyline, Rect, Rgb, TextAnchor, TextLabel,
    DEFAULT_CHART_WIDTH, MUTED_TEXT_COLOR, TRACK_COLOR,
};
use crate::model::RatingPoint;
use crate::richtext::truncate;

/// Number of trailing periods kept by default.
pub const DEFAULT_MAX_POINTS: usize = 6;

const PLOT_HEIGHT: f64 = 40.0;
const PLOT_TOP: f64 = 5.0;
const AXIS_LABEL_WIDTH: f64 = 10.0;
const RIGHT_PADDING: f64 = 6.0;
const X_LABEL_HEIGHT: f64 = 7.0;
const MARKER_SIZE: f64 = 1.6;
const LINE_COLOR: Rgb = Rgb(37, 99, 235);

/// A plotted sample.
#[derive(Clone, Debug, PartialEq)]
pub struct LinePoint {
    pub label: String,
    pub value: f64,
    /// Height within the value axis, `0.0` at the bottom and `1.0` at the top.
    pub normalized: f64,
    /// Position inside the chart drawing.
    pub position: Point,
}

#[derive(Clone, Debug)]
pub struct LineChart<'a> {
    series: &'a [RatingPoint],
    max_points: usize,
    width: f64,
}

impl<'a> LineChart<'a> {
    pub fn new(series: &'a [RatingPoint]) -> Self {
        Self {
            series,
            max_points: DEFAULT_MAX_POINTS,
            width: DEFAULT_CHART_WIDTH,
        }
    }

    /// Keeps only the last `max_points` samples (at least one).
    pub fn max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points.max(1);
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    fn visible(&self) -> &'a [RatingPoint] {
        let skip = self.series.len().saturating_sub(self.max_points);
        &self.series[skip..]
    }

    /// Lower and upper bound of the value axis: 10% padding, rounded outwards.
    pub fn axis_bounds(&self) -> Option<(f64, f64)> {
        let (min, max) = data_bounds(self.visible())?;
        Some(((min * 0.9).floor(), (max * 1.1).ceil()))
    }

    pub fn points(&self) -> Vec<LinePoint> {
        let visible = self.visible();
        let (Some((data_min, data_max)), Some((axis_min, axis_max))) =
            (data_bounds(visible), self.axis_bounds())
        else {
            return Vec::new();
        };

        let flat = data_max - data_min <= 0.0 || axis_max - axis_min <= 0.0;
        let plot_left = AXIS_LABEL_WIDTH;
        let plot_width = (self.width - AXIS_LABEL_WIDTH - RIGHT_PADDING).max(0.0);
        let step = if visible.len() > 1 {
            plot_width / (visible.len() - 1) as f64
        } else {
            0.0
        };

        visible
            .iter()
            .enumerate()
            .map(|(index, sample)| {
                let value = sanitize(sample.average);
                let normalized = if flat {
                    0.5
                } else {
                    ((value - axis_min) / (axis_max - axis_min)).clamp(0.0, 1.0)
                };
                let x = if visible.len() > 1 {
                    plot_left + step * index as f64
                } else {
                    plot_left + plot_width / 2.0
                };
                let y = PLOT_TOP + (1.0 - normalized) * PLOT_HEIGHT;

                LinePoint {
                    label: sample.period.clone(),
                    value,
                    normalized,
                    position: Point::new(x, y),
                }
            })
            .collect()
    }

    pub fn build(&self) -> Chart {
        let points = self.points();
        let Some((axis_min, axis_max)) = self.axis_bounds().filter(|_| !points.is_empty()) else {
            return Chart::no_data(self.width);
        };

        let width = self.width;
        let plot_left = AXIS_LABEL_WIDTH;
        let plot_right = width - RIGHT_PADDING;
        let plot_bottom = PLOT_TOP + PLOT_HEIGHT;
        let mut chart = Chart::new(width, plot_bottom + X_LABEL_HEIGHT);

        chart.push(Polyline {
            points: vec![
                Point::new(plot_left, PLOT_TOP),
                Point::new(plot_left, plot_bottom),
                Point::new(plot_right, plot_bottom),
            ],
            color: TRACK_COLOR,
        });
        for (value, y) in [(axis_max, PLOT_TOP), (axis_min, plot_bottom)] {
            chart.push(
                TextLabel::new(plot_left - 1.5, y - 1.5, format_value(value))
                    .with_color(MUTED_TEXT_COLOR)
                    .anchored(TextAnchor::End),
            );
        }

        if points.len() > 1 {
            chart.push(Polyline {
                points: points.iter().map(|point| point.position).collect(),
                color: LINE_COLOR,
            });
        }

        let slot = (plot_right - plot_left) / points.len() as f64;
        let max_chars = ((slot / 1.5) as usize).max(3);
        for point in &points {
            let Point { x, y } = point.position;
            chart.push(Rect::filled(
                x - MARKER_SIZE / 2.0,
                y - MARKER_SIZE / 2.0,
                MARKER_SIZE,
                MARKER_SIZE,
                LINE_COLOR,
            ));
            chart.push(
                TextLabel::new(x, y - 5.0, format!("{:.1}", point.value))
                    .anchored(TextAnchor::Middle),
            );
            chart.push(
                TextLabel::new(x, plot_bottom + 1.5, truncate(&point.label, max_chars))
                    .with_color(MUTED_TEXT_COLOR)
                    .anchored(TextAnchor::Middle),
            );
        }

        chart
    }
}

fn data_bounds(series: &[RatingPoint]) -> Option<(f64, f64)> {
    let mut values = series.iter().map(|sample| sanitize(sample.average));
    let first = values.next()?;
    Some(values.fold((first, first), |(min, max), value| {
        (min.min(value), max.max(value))
    }))
}
