//! Declarative chart geometry.
//!
//! Every chart builder in this module is a pure function of its dataset: it lays out a fixed-size
//! drawing in millimetres (origin in the upper left corner, y growing downwards) made of
//! rectangles, text labels and polylines.  Nothing here touches the PDF renderer; the
//! [`crate::elements::ChartElement`] wrapper turns a [`Chart`] into `genpdf` drawing calls.
//!
//! Missing or empty input never panics.  Builders fall back to an explicit
//! [`NO_DATA_TEXT`] placeholder and sanitize non-finite or negative values to zero.

mod bar;
mod comparison;
mod line;
mod pie;

pub use bar::{
    category_chart, rating_by_category_chart, rating_chart, BarChart, BarRow, BarScale,
};
pub use comparison::{ComparisonChart, ComparisonSegment};
pub use line::{LineChart, LinePoint, DEFAULT_MAX_POINTS};
pub use pie::{PieLegend, PieSlice};

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Text rendered in place of a chart without data.
pub const NO_DATA_TEXT: &str = "No data available";

/// Width used when a builder is not given an explicit one.
pub const DEFAULT_CHART_WIDTH: f64 = 170.0;

/// Font size for labels inside charts.
pub const LABEL_FONT_SIZE: u8 = 8;

const PLACEHOLDER_HEIGHT: f64 = 12.0;

/// Neutral palette used when a dataset carries no colors.
pub const DEFAULT_PALETTE: &[Rgb] = &[
    Rgb(37, 99, 235),
    Rgb(16, 185, 129),
    Rgb(245, 158, 11),
    Rgb(239, 68, 68),
    Rgb(139, 92, 246),
    Rgb(236, 72, 153),
    Rgb(20, 184, 166),
    Rgb(107, 114, 128),
];

pub(crate) const TRACK_COLOR: Rgb = Rgb(229, 231, 235);
pub(crate) const TEXT_COLOR: Rgb = Rgb(31, 41, 55);
pub(crate) const MUTED_TEXT_COLOR: Rgb = Rgb(107, 114, 128);

/// An sRGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(input: &str) -> Result<Self, ColorParseError> {
        let hex = input.strip_prefix('#').unwrap_or(input);
        if hex.len() != 6 {
            return Err(ColorParseError::new(
                input,
                "expected 6 hexadecimal digits",
            ));
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError::new(
                input,
                "invalid RGB specification; use hexadecimal digits only",
            ));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| ColorParseError::new(input, "invalid hexadecimal channel"))
        };

        Ok(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Formats the color as `#RRGGBB`.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl From<Rgb> for genpdf::style::Color {
    fn from(color: Rgb) -> Self {
        genpdf::style::Color::Rgb(color.0, color.1, color.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Rgb::from_hex(&value).map_err(serde::de::Error::custom)
    }
}

/// Error returned by [`Rgb::from_hex`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorParseError {
    input: String,
    message: &'static str,
}

impl ColorParseError {
    fn new(input: &str, message: &'static str) -> Self {
        Self {
            input: input.to_owned(),
            message,
        }
    }
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (in `{}`)", self.message, self.input)
    }
}

impl std::error::Error for ColorParseError {}

/// A position inside a chart, in millimetres.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle, optionally filled and/or outlined.
#[derive(Clone, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: Option<Rgb>,
    pub stroke: Option<Rgb>,
}

impl Rect {
    pub fn filled(x: f64, y: f64, width: f64, height: f64, fill: Rgb) -> Self {
        Self {
            x,
            y,
            width,
            height,
            fill: Some(fill),
            stroke: None,
        }
    }

    pub fn outlined(x: f64, y: f64, width: f64, height: f64, stroke: Rgb) -> Self {
        Self {
            x,
            y,
            width,
            height,
            fill: None,
            stroke: Some(stroke),
        }
    }
}

/// Horizontal anchoring of a text label relative to its `x` coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

/// A single line of text whose top edge sits at `y`.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLabel {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub font_size: u8,
    pub bold: bool,
    pub color: Rgb,
    pub anchor: TextAnchor,
}

impl TextLabel {
    pub fn new(x: f64, y: f64, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            text: text.into(),
            font_size: LABEL_FONT_SIZE,
            bold: false,
            color: TEXT_COLOR,
            anchor: TextAnchor::Start,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn anchored(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }
}

/// Connected straight segments through `points`.
#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub color: Rgb,
}

/// One drawable primitive.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Rect(Rect),
    Text(TextLabel),
    Polyline(Polyline),
}

/// A fixed-size drawing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Chart {
    width: f64,
    height: f64,
    shapes: Vec<Shape>,
    placeholder: bool,
}

impl Chart {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// The "no data" variant: a muted outline with [`NO_DATA_TEXT`] centered inside.
    pub fn no_data(width: f64) -> Self {
        let mut chart = Self::new(width, PLACEHOLDER_HEIGHT);
        chart.placeholder = true;
        chart.push(Rect::outlined(0.0, 0.0, width, PLACEHOLDER_HEIGHT, TRACK_COLOR));
        chart.push(
            TextLabel::new(width / 2.0, PLACEHOLDER_HEIGHT / 2.0 - 1.5, NO_DATA_TEXT)
                .with_color(MUTED_TEXT_COLOR)
                .anchored(TextAnchor::Middle),
        );
        chart
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Returns `true` for the [`Chart::no_data`] variant.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Returns `true` when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn push(&mut self, shape: impl Into<Shape>) {
        self.shapes.push(shape.into());
    }

    /// Iterates over the text of every label, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.shapes.iter().filter_map(|shape| match shape {
            Shape::Text(label) => Some(label.text.as_str()),
            _ => None,
        })
    }

    pub fn rects(&self) -> impl Iterator<Item = &Rect> {
        self.shapes.iter().filter_map(|shape| match shape {
            Shape::Rect(rect) => Some(rect),
            _ => None,
        })
    }
}

impl From<Rect> for Shape {
    fn from(rect: Rect) -> Self {
        Shape::Rect(rect)
    }
}

impl From<TextLabel> for Shape {
    fn from(label: TextLabel) -> Self {
        Shape::Text(label)
    }
}

impl From<Polyline> for Shape {
    fn from(line: Polyline) -> Self {
        Shape::Polyline(line)
    }
}

/// One labelled value of a [`ChartDataset`].
#[derive(Clone, Debug, PartialEq)]
pub struct ChartEntry {
    pub label: String,
    pub value: f64,
    pub color: Option<Rgb>,
}

/// Ordered `(label, value)` pairs with optional per-label colors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartDataset {
    entries: Vec<ChartEntry>,
}

impl ChartDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dataset from an ordered count map.
    pub fn from_counts(counts: &IndexMap<String, u64>) -> Self {
        counts
            .iter()
            .map(|(label, count)| (label.clone(), *count as f64))
            .collect()
    }

    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        self.entries.push(ChartEntry {
            label: label.into(),
            value,
            color: None,
        });
    }

    pub fn with_entry(mut self, label: impl Into<String>, value: f64) -> Self {
        self.push(label, value);
        self
    }

    /// Assigns colors to labels present in `colors`; other entries keep theirs.
    pub fn with_colors(mut self, colors: &IndexMap<String, Rgb>) -> Self {
        for entry in &mut self.entries {
            if let Some(color) = colors.get(&entry.label) {
                entry.color = Some(*color);
            }
        }
        self
    }

    pub fn entries(&self) -> &[ChartEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sum of all sanitized values.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| sanitize(entry.value)).sum()
    }

    /// Largest sanitized value, `0.0` for an empty dataset.
    pub fn max(&self) -> f64 {
        self.entries
            .iter()
            .map(|entry| sanitize(entry.value))
            .fold(0.0, f64::max)
    }

    /// Color for the entry at `index`, falling back to `palette`.
    pub(crate) fn color_at(&self, index: usize, palette: &[Rgb]) -> Rgb {
        self.entries
            .get(index)
            .and_then(|entry| entry.color)
            .unwrap_or_else(|| palette_color(palette, index))
    }
}

impl<L: Into<String>> FromIterator<(L, f64)> for ChartDataset {
    fn from_iter<I: IntoIterator<Item = (L, f64)>>(iter: I) -> Self {
        let mut dataset = ChartDataset::new();
        for (label, value) in iter {
            dataset.push(label, value);
        }
        dataset
    }
}

pub(crate) fn palette_color(palette: &[Rgb], index: usize) -> Rgb {
    let palette = if palette.is_empty() {
        DEFAULT_PALETTE
    } else {
        palette
    };
    palette[index % palette.len()]
}

/// Clamps non-finite and negative values to zero.
pub(crate) fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// `part / whole * 100`, or `0.0` when `whole` is zero.
pub(crate) fn percentage(part: f64, whole: f64) -> f64 {
    let part = sanitize(part);
    let whole = sanitize(whole);
    if whole > 0.0 {
        (part / whole * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Formats a value as a count when it is integral and with one decimal otherwise.
pub(crate) fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

pub(crate) fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}
