//! Text that has already been laid out.
//!
//! Shaping and line breaking happen before text reaches this crate. What
//! arrives here is a list of spans, each positioned relative to the origin of
//! its text block and carrying everything needed to draw it: the font face,
//! spacing, and the words the span consists of.

use std::fmt::{Display, Formatter};

use crate::color::Rgba;
use crate::font::Font;

/// The style of a font within its family.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontStyle {
    /// Whether the font is italic.
    pub italic: bool,
    /// The weight of the font, from 100 to 900.
    pub weight: u16,
}

impl FontStyle {
    /// The regular style.
    pub const REGULAR: FontStyle = FontStyle {
        italic: false,
        weight: 400,
    };

    /// The bold style.
    pub const BOLD: FontStyle = FontStyle {
        italic: false,
        weight: 700,
    };

    /// The italic style.
    pub const ITALIC: FontStyle = FontStyle {
        italic: true,
        weight: 400,
    };
}

impl Default for FontStyle {
    fn default() -> Self {
        Self::REGULAR
    }
}

impl Display for FontStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.weight)?;
        if self.italic {
            write!(f, "i")?;
        }

        Ok(())
    }
}

/// Lines drawn along with the glyphs of a span.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct TextDecoration {
    /// A line below the baseline.
    pub underline: bool,
    /// A line above the ascender.
    pub overline: bool,
    /// A line through the glyphs.
    pub strike_through: bool,
}

impl TextDecoration {
    /// No decoration at all.
    pub const NONE: TextDecoration = TextDecoration {
        underline: false,
        overline: false,
        strike_through: false,
    };

    /// Whether no line is drawn.
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// A font together with the way it is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct FontFace {
    /// The font.
    pub font: Font,
    /// The family name.
    pub name: String,
    /// The style within the family.
    pub style: FontStyle,
    /// The font size, in millimetres.
    pub size: f32,
    /// An additional factor the size is multiplied with.
    pub scale: f32,
    /// The text color.
    pub color: Rgba,
    /// Synthetic emboldening, as the stroke width in millimetres drawn on each
    /// side of the glyph outlines. 0 disables it.
    pub faux_bold: f32,
    /// Synthetic slanting, as a horizontal shear factor. 0 disables it.
    pub faux_italic: f32,
    /// The decoration lines.
    pub decoration: TextDecoration,
}

impl FontFace {
    /// Create a new regular face with the given font and size.
    pub fn new(font: Font, name: impl Into<String>, size: f32, color: Rgba) -> Self {
        Self {
            font,
            name: name.into(),
            style: FontStyle::default(),
            size,
            scale: 1.0,
            color,
            faux_bold: 0.0,
            faux_italic: 0.0,
            decoration: TextDecoration::NONE,
        }
    }

    /// The key fonts of this face are registered under. Different styles of
    /// the same family never share a key.
    pub(crate) fn key(&self) -> String {
        format!("{}-{}", self.name, self.style)
    }

    /// The effective font size, in millimetres.
    pub(crate) fn font_size(&self) -> f32 {
        self.size * self.scale
    }

    /// The natural width of `text` set in this face, in millimetres.
    pub fn string_width(&self, text: &str) -> f32 {
        self.font.string_width(text, self.font_size())
    }
}

/// A run of text that is drawn with a single face.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// The face.
    pub face: FontFace,
    /// The text.
    pub text: String,
    /// Extra spacing between glyphs, in millimetres.
    pub glyph_spacing: f32,
    /// Extra spacing after every word, in millimetres.
    pub word_spacing: f32,
}

impl TextSpan {
    /// Create a new span without extra spacing.
    pub fn new(face: FontFace, text: impl Into<String>) -> Self {
        Self {
            face,
            text: text.into(),
            glyph_spacing: 0.0,
            word_spacing: 0.0,
        }
    }

    /// Split the text into words. A word ends after a run of whitespace, so
    /// the words concatenated give back the text.
    pub fn words(&self) -> Vec<&str> {
        let mut words = vec![];
        let mut start = 0;
        let mut prev_whitespace = false;

        for (i, c) in self.text.char_indices() {
            let whitespace = c.is_whitespace();
            if prev_whitespace && !whitespace {
                words.push(&self.text[start..i]);
                start = i;
            }

            prev_whitespace = whitespace;
        }

        if start < self.text.len() {
            words.push(&self.text[start..]);
        }

        words
    }

    /// The natural width of the span, including word spacing.
    pub fn width(&self) -> f32 {
        self.words()
            .iter()
            .map(|w| self.face.string_width(w) + self.word_spacing)
            .sum()
    }
}

/// A span at its position within a text block.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedSpan {
    /// The baseline, in millimetres.
    pub y: f32,
    /// The horizontal offset, in millimetres.
    pub dx: f32,
    /// The span.
    pub span: TextSpan,
}

/// A block of laid out text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Text {
    /// The spans of the block, in drawing order.
    pub spans: Vec<PositionedSpan>,
}

impl Text {
    /// Create a new, empty text block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a text block with a single line of text.
    pub fn from_span(span: TextSpan) -> Self {
        let mut text = Self::new();
        text.push(0.0, 0.0, span);
        text
    }

    /// Add a span at the given baseline and offset.
    pub fn push(&mut self, y: f32, dx: f32, span: TextSpan) {
        self.spans.push(PositionedSpan { y, dx, span });
    }

    /// Whether the block contains no spans.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Call `f` with the baseline, offset and span of each span in order,
    /// stopping at the first error.
    pub fn walk_spans<E>(
        &self,
        mut f: impl FnMut(f32, f32, &TextSpan) -> Result<(), E>,
    ) -> Result<(), E> {
        for positioned in &self.spans {
            f(positioned.y, positioned.dx, &positioned.span)?;
        }

        Ok(())
    }
}
