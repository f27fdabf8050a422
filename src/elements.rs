//! Element implementations built on top of `genpdf` primitives.
//!
//! [`ChartElement`] draws the declarative geometry produced by [`crate::charts`], and
//! [`TrackedElement`] records the page on which a section heading lands so the report can be
//! given an outline afterwards.

use std::cell::RefCell;
use std::rc::Rc;

use genpdf::error::Error;
use genpdf::style::{Style, StyledString};
use genpdf::{render, Element, Mm, Position, RenderResult, Size};

use crate::builder::PageCounter;
use crate::charts::{Chart, Polyline, Rect, Rgb, Shape, TextAnchor, TextLabel};

/// Vertical distance between the hairlines that paint a filled rectangle.
///
/// `draw_line` always strokes at the PDF default width of 1pt (about 0.35 mm), so a pitch below
/// that leaves no gaps.
const FILL_PITCH_MM: f64 = 0.25;
const MIN_FONT_SIZE: u8 = 5;

fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Renders a [`Chart`] at its natural size, scaled down uniformly when the area is narrower.
///
/// A chart that does not fit the remaining height is moved to the next page once. If it still
/// does not fit there, it is shrunk to the available height instead of failing the document.
pub struct ChartElement {
    chart: Chart,
    max_height: Option<f64>,
    deferred: bool,
}

impl ChartElement {
    pub fn new(chart: Chart) -> Self {
        Self {
            chart,
            max_height: None,
            deferred: false,
        }
    }

    /// Shrinks the chart up front so it never exceeds `max_height` millimetres, usually the
    /// height of a page body.
    pub fn with_max_height(mut self, max_height: f64) -> Self {
        self.max_height = Some(max_height).filter(|height| *height > 0.0);
        self
    }

    fn scale_for(&self, available_width: f64) -> f64 {
        let (width, height) = (self.chart.width(), self.chart.height());
        let mut scale: f64 = 1.0;
        if width > available_width && width > 0.0 {
            scale = available_width / width;
        }
        if let Some(max_height) = self.max_height {
            if height * scale > max_height {
                scale = max_height / height;
            }
        }
        scale
    }

    /// Scale to draw at, or `None` when the chart should continue on the next page.
    fn placement(&mut self, available_width: f64, available_height: f64) -> Option<f64> {
        let scale = self.scale_for(available_width);
        let natural_height = self.chart.height();
        if natural_height * scale <= available_height {
            return Some(scale);
        }
        if !self.deferred || available_height <= 0.0 {
            self.deferred = true;
            return None;
        }
        Some(scale.min(available_height / natural_height))
    }
}

/// Maps chart coordinates onto the area being drawn on.
#[derive(Clone, Copy, Debug)]
struct Transform {
    scale: f64,
}

impl Transform {
    fn mm(&self, value: f64) -> f64 {
        value * self.scale
    }

    fn position(&self, x: f64, y: f64) -> Position {
        Position::new(mm_from_f64(self.mm(x)), mm_from_f64(self.mm(y)))
    }
}

/// Receiver of the stroked lines that make up a chart.
trait LineSink {
    fn stroke(&self, points: Vec<Position>, color: Rgb);
}

impl LineSink for render::Area<'_> {
    fn stroke(&self, points: Vec<Position>, color: Rgb) {
        self.draw_line(points, Style::new().with_color(color.into()));
    }
}

/// Offsets from the top edge of the hairlines covering a fill `height` millimetres tall.
fn fill_offsets(height: f64) -> Vec<f64> {
    if height.is_nan() || height <= 0.0 {
        return Vec::new();
    }
    let count = (height / FILL_PITCH_MM).ceil().max(1.0) as usize;
    let step = height / count as f64;
    (0..count).map(|index| step * (index as f64 + 0.5)).collect()
}

fn fill_rect(sink: &impl LineSink, transform: Transform, rect: &Rect) {
    let Some(fill) = rect.fill else {
        return;
    };
    if rect.width <= 0.0 {
        return;
    }

    let left = mm_from_f64(transform.mm(rect.x));
    let right = mm_from_f64(transform.mm(rect.x + rect.width));
    let top = transform.mm(rect.y);
    for offset in fill_offsets(transform.mm(rect.height)) {
        let y = mm_from_f64(top + offset);
        sink.stroke(vec![Position::new(left, y), Position::new(right, y)], fill);
    }
}

fn outline_rect(sink: &impl LineSink, transform: Transform, rect: &Rect) {
    let Some(stroke) = rect.stroke else {
        return;
    };

    let (left, top) = (rect.x, rect.y);
    let (right, bottom) = (rect.x + rect.width, rect.y + rect.height);
    sink.stroke(
        vec![
            transform.position(left, top),
            transform.position(right, top),
            transform.position(right, bottom),
            transform.position(left, bottom),
            transform.position(left, top),
        ],
        stroke,
    );
}

fn polyline(sink: &impl LineSink, transform: Transform, line: &Polyline) {
    if line.points.len() < 2 {
        return;
    }

    let points = line
        .points
        .iter()
        .map(|point| transform.position(point.x, point.y))
        .collect();
    sink.stroke(points, line.color);
}

fn text(
    context: &genpdf::Context,
    area: &render::Area<'_>,
    style: Style,
    transform: Transform,
    label: &TextLabel,
) -> Result<(), Error> {
    let scaled = transform.mm(f64::from(label.font_size)).round() as u8;
    let mut label_style = Style::new()
        .with_font_size(scaled.max(MIN_FONT_SIZE))
        .with_color(label.color.into());
    if label.bold {
        label_style.set_bold();
    }

    let string = StyledString::new(label.text.clone(), style.and(label_style));
    let width = mm_to_f64(string.width(&context.font_cache));
    let anchor_x = transform.mm(label.x);
    let x = match label.anchor {
        TextAnchor::Start => anchor_x,
        TextAnchor::Middle => anchor_x - width / 2.0,
        TextAnchor::End => anchor_x - width,
    };

    area.print_str(
        &context.font_cache,
        Position::new(mm_from_f64(x.max(0.0)), mm_from_f64(transform.mm(label.y))),
        string.style,
        &string.s,
    )?;
    Ok(())
}

impl Element for ChartElement {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        if self.chart.is_empty() {
            return Ok(result);
        }

        let available = area.size();
        let Some(scale) =
            self.placement(mm_to_f64(available.width), mm_to_f64(available.height))
        else {
            result.has_more = true;
            return Ok(result);
        };

        let transform = Transform { scale };
        for shape in self.chart.shapes() {
            match shape {
                Shape::Rect(rect) => {
                    fill_rect(&area, transform, rect);
                    outline_rect(&area, transform, rect);
                }
                Shape::Polyline(line) => polyline(&area, transform, line),
                Shape::Text(label) => text(context, &area, style, transform, label)?,
            }
        }

        result.size = Size::new(
            mm_from_f64(transform.mm(self.chart.width())),
            mm_from_f64(transform.mm(self.chart.height())),
        );
        Ok(result)
    }
}

/// A section heading and the page it was first rendered on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedSection {
    pub title: String,
    /// 1-based page number, `None` until the heading has been rendered.
    pub page: Option<usize>,
}

/// Records the page on which each tracked section starts.
#[derive(Clone, Debug, Default)]
pub struct SectionTracker {
    pages: PageCounter,
    sections: Rc<RefCell<Vec<TrackedSection>>>,
}

impl SectionTracker {
    /// Creates a tracker reading page numbers from `pages`.
    pub fn new(pages: PageCounter) -> Self {
        Self {
            pages,
            sections: Rc::default(),
        }
    }

    /// Wraps `element` so the current page is recorded under `title` once it renders.
    pub fn track<E: Element>(&self, title: impl Into<String>, element: E) -> TrackedElement<E> {
        let mut sections = self.sections.borrow_mut();
        sections.push(TrackedSection {
            title: title.into(),
            page: None,
        });
        TrackedElement {
            inner: element,
            index: sections.len() - 1,
            tracker: self.clone(),
        }
    }

    /// Snapshot of every tracked section in registration order.
    pub fn sections(&self) -> Vec<TrackedSection> {
        self.sections.borrow().clone()
    }
}

/// Element wrapper created by [`SectionTracker::track`].
pub struct TrackedElement<E> {
    inner: E,
    index: usize,
    tracker: SectionTracker,
}

impl<E: Element> Element for TrackedElement<E> {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let result = self.inner.render(context, area, style)?;
        if mm_to_f64(result.size.height) > 0.0 {
            let mut sections = self.tracker.sections.borrow_mut();
            if let Some(section) = sections.get_mut(self.index) {
                section.page.get_or_insert(self.tracker.pages.current());
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{BarChart, ChartDataset, Point};

    #[test]
    fn wide_charts_are_scaled_down_uniformly() {
        let data: ChartDataset = [("A", 1.0)].into_iter().collect();
        let element = ChartElement::new(BarChart::new(&data).width(200.0).build());
        assert_eq!(element.scale_for(100.0), 0.5);
        assert_eq!(element.scale_for(250.0), 1.0);
    }

    #[derive(Default)]
    struct RecordingSink {
        lines: RefCell<Vec<(Vec<(f64, f64)>, Rgb)>>,
    }

    impl LineSink for RecordingSink {
        fn stroke(&self, points: Vec<Position>, color: Rgb) {
            let points = points
                .into_iter()
                .map(|position| (mm_to_f64(position.x), mm_to_f64(position.y)))
                .collect();
            self.lines.borrow_mut().push((points, color));
        }
    }

    const FILL: Rgb = Rgb(37, 99, 235);

    #[test]
    fn filled_rects_are_painted_with_stacked_hairlines() {
        let sink = RecordingSink::default();
        let rect = Rect::filled(10.0, 4.0, 30.0, 3.0, FILL);
        fill_rect(&sink, Transform { scale: 1.0 }, &rect);

        let lines = sink.lines.into_inner();
        assert_eq!(lines.len(), 12);
        for (points, color) in &lines {
            assert_eq!(*color, FILL);
            assert_eq!(points.len(), 2);
            let ((x0, y0), (x1, y1)) = (points[0], points[1]);
            assert_eq!((x0, x1), (10.0, 40.0));
            assert_eq!(y0, y1);
            assert!((4.0..=7.0).contains(&y0));
        }

        let ys = lines.iter().map(|(points, _)| points[0].1).collect::<Vec<_>>();
        assert!(ys.windows(2).all(|pair| pair[1] - pair[0] <= FILL_PITCH_MM + 1e-9));
        assert!(ys[0] - 4.0 <= FILL_PITCH_MM / 2.0 + 1e-9);
        assert!(7.0 - ys[ys.len() - 1] <= FILL_PITCH_MM / 2.0 + 1e-9);
    }

    #[test]
    fn fill_density_follows_the_drawn_height() {
        let sink = RecordingSink::default();
        let rect = Rect::filled(0.0, 0.0, 10.0, 3.0, FILL);
        fill_rect(&sink, Transform { scale: 0.5 }, &rect);
        assert_eq!(sink.lines.borrow().len(), 6);

        let thin = RecordingSink::default();
        fill_rect(&thin, Transform { scale: 1.0 }, &Rect::filled(0.0, 0.0, 10.0, 0.1, FILL));
        assert_eq!(thin.lines.borrow().len(), 1);
    }

    #[test]
    fn degenerate_and_unfilled_rects_paint_nothing() {
        let sink = RecordingSink::default();
        let transform = Transform { scale: 1.0 };
        fill_rect(&sink, transform, &Rect::filled(0.0, 0.0, 0.0, 5.0, FILL));
        fill_rect(&sink, transform, &Rect::filled(0.0, 0.0, 5.0, 0.0, FILL));
        fill_rect(&sink, transform, &Rect::outlined(0.0, 0.0, 5.0, 5.0, FILL));
        assert!(sink.lines.borrow().is_empty());
    }

    #[test]
    fn outlines_close_the_rectangle() {
        let sink = RecordingSink::default();
        outline_rect(
            &sink,
            Transform { scale: 2.0 },
            &Rect::outlined(1.0, 1.0, 4.0, 2.0, FILL),
        );
        let lines = sink.lines.into_inner();
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0].0,
            vec![(2.0, 2.0), (10.0, 2.0), (10.0, 6.0), (2.0, 6.0), (2.0, 2.0)]
        );
    }

    #[test]
    fn polylines_need_two_points() {
        let sink = RecordingSink::default();
        let transform = Transform { scale: 1.0 };
        let mut line = Polyline {
            points: vec![Point::new(0.0, 0.0)],
            color: FILL,
        };
        polyline(&sink, transform, &line);
        assert!(sink.lines.borrow().is_empty());

        line.points.push(Point::new(5.0, 5.0));
        polyline(&sink, transform, &line);
        assert_eq!(sink.lines.borrow().len(), 1);
    }

    fn tall_chart(rows: usize) -> Chart {
        let data: ChartDataset = (0..rows)
            .map(|index| (format!("Category {index}"), index as f64 + 1.0))
            .collect();
        BarChart::new(&data).width(170.0).build()
    }

    #[test]
    fn charts_that_do_not_fit_move_to_the_next_page_first() {
        let mut element = ChartElement::new(tall_chart(3));
        let height = element.chart.height();
        assert_eq!(element.placement(170.0, height / 2.0), None);
        assert_eq!(element.placement(170.0, 250.0), Some(1.0));
    }

    #[test]
    fn charts_taller_than_a_page_shrink_to_fit() {
        let mut element = ChartElement::new(tall_chart(45));
        let height = element.chart.height();
        assert!(height > 250.0);

        assert_eq!(element.placement(170.0, 40.0), None);
        let scale = element.placement(170.0, 250.0).expect("shrinks on the fresh page");
        assert!(scale < 1.0);
        assert!(height * scale <= 250.0 + 1e-9);
    }

    #[test]
    fn page_height_caps_the_scale() {
        let element = ChartElement::new(tall_chart(45)).with_max_height(210.0);
        let height = element.chart.height();
        let scale = element.scale_for(170.0);
        assert!((height * scale - 210.0).abs() < 1e-9);

        let short = ChartElement::new(tall_chart(3)).with_max_height(210.0);
        assert_eq!(short.scale_for(170.0), 1.0);
    }

    #[test]
    fn tracker_records_registration_order() {
        let tracker = SectionTracker::new(PageCounter::new());
        let _first = tracker.track("Summary", genpdf::elements::Break::new(1.0));
        let _second = tracker.track("Statistics", genpdf::elements::Break::new(1.0));
        let titles = tracker
            .sections()
            .into_iter()
            .map(|section| (section.title, section.page))
            .collect::<Vec<_>>();
        assert_eq!(
            titles,
            vec![("Summary".to_string(), None), ("Statistics".to_string(), None)]
        );
    }
}
