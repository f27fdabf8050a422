//! Styled text fragments and plain-text helpers shared by the report layout.
//!
//! A [`Span`] carries the handful of inline decorations the report uses (bold, italic, color)
//! and converts into a `genpdf` [`StyledString`], so paragraphs can be assembled from mixed
//! fragments such as a bold lead-in followed by regular prose.

use std::borrow::Cow;

use genpdf::elements::Paragraph;
use genpdf::style::{Color, Style, StyledString};

/// Marker appended to shortened text.
pub const ELLIPSIS: &str = "...";

/// A slice of text together with inline style attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    text: String,
    bold: bool,
    italic: bool,
    color: Option<Color>,
    font_size: Option<u8>,
}

impl Span {
    /// Creates a new span with the provided text and no styles applied.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Marks the span as bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Marks the span as italic.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Assigns a color to the span.
    pub fn colored(mut self, color: impl Into<Color>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Overrides the document font size for this span.
    pub fn sized(mut self, font_size: u8) -> Self {
        self.font_size = Some(font_size);
        self
    }

    fn to_style(&self) -> Style {
        let mut style = Style::new();
        if let Some(color) = self.color {
            style.set_color(color);
        }
        if let Some(size) = self.font_size {
            style.set_font_size(size);
        }
        if self.bold {
            style.set_bold();
        }
        if self.italic {
            style.set_italic();
        }
        style
    }

    pub fn to_styled_string(&self) -> StyledString {
        StyledString::new(self.text.clone(), self.to_style())
    }
}

impl From<&Span> for StyledString {
    fn from(span: &Span) -> Self {
        span.to_styled_string()
    }
}

impl From<Span> for StyledString {
    fn from(span: Span) -> Self {
        span.to_styled_string()
    }
}

/// Builds a paragraph from consecutive spans.
pub fn paragraph<I>(spans: I) -> Paragraph
where
    I: IntoIterator<Item = Span>,
{
    let mut paragraph = Paragraph::default();
    for span in spans {
        paragraph.push(span);
    }
    paragraph
}

/// Shortens `text` to at most `limit` characters, ending in [`ELLIPSIS`] when cut.
///
/// Counts characters rather than bytes so multi-byte text is never split inside a code point.
pub fn truncate(text: &str, limit: usize) -> Cow<'_, str> {
    if text.chars().count() <= limit {
        return Cow::Borrowed(text);
    }

    if limit <= ELLIPSIS.len() {
        return Cow::Owned(text.chars().take(limit).collect());
    }

    let keep = limit - ELLIPSIS.len();
    let mut shortened: String = text.chars().take(keep).collect();
    shortened.truncate(shortened.trim_end().len());
    shortened.push_str(ELLIPSIS);
    Cow::Owned(shortened)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_to_style_reflects_flags() {
        let span = Span::new("Hello")
            .bold()
            .italic()
            .colored(Color::Rgb(10, 20, 30));
        let styled = span.to_styled_string();
        assert_eq!(styled.s, "Hello");
        assert!(styled.style.is_bold());
        assert!(styled.style.is_italic());
        assert_eq!(styled.style.color(), Some(Color::Rgb(10, 20, 30)));
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("Short", 10), "Short");
        assert!(matches!(truncate("Exactly10!", 10), Cow::Borrowed(_)));
    }

    #[test]
    fn truncate_appends_ellipsis_within_limit() {
        let cut = truncate("Community cleanup this weekend", 12);
        assert_eq!(cut, "Community...");
        assert!(cut.chars().count() <= 12);
    }

    #[test]
    fn truncate_never_exceeds_tiny_limits() {
        assert_eq!(truncate("Feedback", 3), "Fee");
        assert_eq!(truncate("Feedback", 1), "F");
        assert_eq!(truncate("Feedback", 0), "");
        assert_eq!(truncate("Übung", 2), "Üb");
    }

    #[test]
    fn truncate_respects_multibyte_characters() {
        let cut = truncate("Überraschungsfeier", 8);
        assert_eq!(cut, "Überr...");
    }
}
