// SPDX-License-Identifier: MPL-2.0
//! Styled text produced by localizers and applied to rich-text properties.

use std::ops::Range;

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    pub const WHITE: Self = Self::opaque(255, 255, 255);
    pub const PINK: Self = Self::opaque(255, 45, 85);

    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// A text attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attribute {
    ForegroundColor(Rgba),
    Bold,
    Italic,
    Underline,
    Link(String),
}

/// An attribute applied to a byte range of the text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeRun {
    pub range: Range<usize>,
    pub attribute: Attribute,
}

/// Text with attribute runs.
///
/// Ranges are byte offsets. Out-of-bounds ranges are clamped to the text and
/// ranges splitting a character are widened to the enclosing boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AttributedText {
    text: String,
    runs: Vec<AttributeRun>,
}

impl AttributedText {
    /// Text without attributes.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            runs: Vec::new(),
        }
    }

    /// Text with `attributes` over its whole length.
    pub fn styled(text: impl Into<String>, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        attributes
            .into_iter()
            .fold(Self::plain(text), Self::with_attribute)
    }

    /// Adds `attribute` over the whole text.
    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        let whole = 0..self.text.len();
        self.apply(whole, attribute);
        self
    }

    /// Adds `attribute` over `range`.
    pub fn apply(&mut self, range: Range<usize>, attribute: Attribute) {
        let range = self.clamp(range);
        if range.is_empty() {
            return;
        }
        self.runs.push(AttributeRun { range, attribute });
    }

    /// Appends `other`, shifting its runs after the current text.
    #[must_use]
    pub fn append(mut self, other: AttributedText) -> Self {
        let offset = self.text.len();
        self.text.push_str(&other.text);
        self.runs.extend(other.runs.into_iter().map(|run| AttributeRun {
            range: run.range.start + offset..run.range.end + offset,
            attribute: run.attribute,
        }));
        self
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn runs(&self) -> &[AttributeRun] {
        &self.runs
    }

    /// Attributes covering the byte at `index`, in application order.
    pub fn attributes_at(&self, index: usize) -> impl Iterator<Item = &Attribute> {
        self.runs
            .iter()
            .filter(move |run| run.range.contains(&index))
            .map(|run| &run.attribute)
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let len = self.text.len();
        let mut start = range.start.min(len);
        let mut end = range.end.min(len).max(start);
        while !self.text.is_char_boundary(start) {
            start -= 1;
        }
        while !self.text.is_char_boundary(end) {
            end += 1;
        }
        start..end
    }
}

impl From<String> for AttributedText {
    fn from(text: String) -> Self {
        Self::plain(text)
    }
}

impl From<&str> for AttributedText {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styled_covers_whole_text() {
        let text = AttributedText::styled("Part 1 Part 2", [Attribute::ForegroundColor(Rgba::PINK)]);
        assert_eq!(text.runs().len(), 1);
        assert_eq!(text.runs()[0].range, 0..13);
        assert_eq!(
            text.attributes_at(12).collect::<Vec<_>>(),
            vec![&Attribute::ForegroundColor(Rgba::PINK)]
        );
    }

    #[test]
    fn apply_clamps_out_of_bounds_ranges() {
        let mut text = AttributedText::plain("Hello");
        text.apply(3..99, Attribute::Bold);
        text.apply(42..50, Attribute::Italic);
        assert_eq!(text.runs(), &[AttributeRun { range: 3..5, attribute: Attribute::Bold }]);
    }

    #[test]
    fn apply_widens_ranges_to_char_boundaries() {
        let mut text = AttributedText::plain("Système");
        // "è" spans bytes 4..6
        text.apply(5..6, Attribute::Underline);
        assert_eq!(text.runs()[0].range, 4..6);
    }

    #[test]
    fn append_shifts_runs() {
        let bold = AttributedText::styled("Hi", [Attribute::Bold]);
        let link = AttributedText::styled("docs", [Attribute::Link("https://example.org".into())]);
        let joined = bold.append(AttributedText::plain(" ")).append(link);

        assert_eq!(joined.text(), "Hi docs");
        assert_eq!(joined.runs()[1].range, 3..7);
        assert_eq!(joined.attributes_at(2).count(), 0);
    }

    #[test]
    fn empty_text_takes_no_runs() {
        let text = AttributedText::plain("").with_attribute(Attribute::Bold);
        assert!(text.runs().is_empty());
    }
}
