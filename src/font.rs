//! OpenType fonts.
//!
//! A [`Font`] wraps the raw data of a TrueType/OpenType font (or one face of a
//! collection) together with the metrics needed to place text and to embed the
//! font into the document. Fonts are embedded as CID-keyed fonts with glyph IDs
//! as character codes, so no encoding has to be maintained beyond the glyph IDs
//! that were used.

use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use skrifa::instance::{LocationRef, Size};
use skrifa::raw::TableProvider;
use skrifa::string::StringId;
use skrifa::{FontRef, GlyphId, MetadataProvider};
use tiny_skia_path::Rect;

use crate::util::Prehashed;
use crate::Data;

/// An OpenType font. Can be a TrueType, OpenType font or a TrueType collection.
///
/// Cloning and hashing this type is cheap. Creating it is a little expensive,
/// since the font data is hashed once, so fonts should be reused.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Font(Arc<Prehashed<Repr>>);

impl Font {
    /// Create a new font from some data.
    ///
    /// The `index` selects the face of a TrueType collection and should be 0
    /// otherwise. Returns `None` if the index is invalid or the font couldn't
    /// be read.
    pub fn new(data: Data, index: u32) -> Option<Self> {
        let font_info = FontInfo::new(data.as_ref(), index)?;

        Some(Font(Arc::new(Prehashed::new(Repr {
            font_data: data,
            font_info,
        }))))
    }

    pub(crate) fn font_data(&self) -> Data {
        self.0.font_data.clone()
    }

    pub(crate) fn index(&self) -> u32 {
        self.0.font_info.index
    }

    /// Return the underlying `FontRef`.
    ///
    /// The data was already parsed successfully once, so this only fails for
    /// corrupted inputs.
    pub(crate) fn font_ref(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(self.0.font_data.as_ref(), self.index()).ok()
    }

    pub(crate) fn postscript_name(&self) -> Option<&str> {
        self.0.font_info.postscript_name.as_deref()
    }

    /// The units per em of the font.
    pub fn units_per_em(&self) -> f32 {
        self.0.font_info.units_per_em as f32
    }

    pub(crate) fn ascent(&self) -> f32 {
        self.0.font_info.ascent
    }

    pub(crate) fn descent(&self) -> f32 {
        self.0.font_info.descent
    }

    pub(crate) fn cap_height(&self) -> Option<f32> {
        self.0.font_info.cap_height
    }

    pub(crate) fn is_monospaced(&self) -> bool {
        self.0.font_info.is_monospaced
    }

    pub(crate) fn italic_angle(&self) -> f32 {
        self.0.font_info.italic_angle
    }

    pub(crate) fn weight(&self) -> f32 {
        self.0.font_info.weight
    }

    pub(crate) fn bbox(&self) -> Rect {
        self.0.font_info.global_bbox
    }

    /// Whether the outlines of the font are stored in a `glyf` table.
    pub(crate) fn is_glyf(&self) -> bool {
        self.font_ref().is_some_and(|f| f.glyf().is_ok())
    }

    /// Map a character to its glyph, falling back to the `.notdef` glyph.
    pub fn glyph_id(&self, c: char) -> GlyphId {
        self.font_ref()
            .and_then(|f| f.charmap().map(c))
            .unwrap_or(GlyphId::NOTDEF)
    }

    /// The advance width of a glyph, in font units.
    pub(crate) fn advance_width(&self, glyph_id: GlyphId) -> Option<f32> {
        self.font_ref()?
            .glyph_metrics(Size::unscaled(), LocationRef::default())
            .advance_width(glyph_id)
    }

    /// The natural width of a string set at `size`, in the unit of `size`.
    pub fn string_width(&self, text: &str, size: f32) -> f32 {
        let Some(font_ref) = self.font_ref() else {
            return 0.0;
        };

        let charmap = font_ref.charmap();
        let metrics = font_ref.glyph_metrics(Size::unscaled(), LocationRef::default());

        let units = text
            .chars()
            .map(|c| {
                let glyph_id = charmap.map(c).unwrap_or(GlyphId::NOTDEF);
                metrics.advance_width(glyph_id).unwrap_or(0.0)
            })
            .sum::<f32>();

        units / self.units_per_em() * size
    }

    /// The position and thickness of underlines, relative to a size of 1.
    pub(crate) fn underline(&self) -> Decoration {
        self.0
            .font_info
            .underline
            .unwrap_or_else(|| Decoration::fallback_underline(self.units_per_em()))
            .normalize(self.units_per_em())
    }

    /// The position and thickness of strike-throughs, relative to a size of 1.
    pub(crate) fn strikeout(&self) -> Decoration {
        self.0
            .font_info
            .strikeout
            .unwrap_or_else(|| Decoration::fallback_strikeout(self.units_per_em()))
            .normalize(self.units_per_em())
    }
}

impl Debug for Font {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.postscript_name() {
            Some(name) => write!(f, "Font {{ {} }}", name),
            None => write!(f, "Font {{..}}"),
        }
    }
}

/// The metrics of a text decoration line, in font units unless stated otherwise.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct Decoration {
    /// Offset of the top of the line from the baseline, positive upwards.
    pub offset: f32,
    /// The thickness of the line.
    pub thickness: f32,
}

impl Decoration {
    fn fallback_underline(units_per_em: f32) -> Self {
        Self {
            offset: -0.1 * units_per_em,
            thickness: 0.05 * units_per_em,
        }
    }

    fn fallback_strikeout(units_per_em: f32) -> Self {
        Self {
            offset: 0.3 * units_per_em,
            thickness: 0.05 * units_per_em,
        }
    }

    fn normalize(self, units_per_em: f32) -> Self {
        Self {
            offset: self.offset / units_per_em,
            thickness: self.thickness / units_per_em,
        }
    }
}

/// Basic information about a font, read once when it is created.
#[derive(Debug)]
pub(crate) struct FontInfo {
    index: u32,
    units_per_em: u16,
    global_bbox: Rect,
    postscript_name: Option<String>,
    ascent: f32,
    descent: f32,
    cap_height: Option<f32>,
    is_monospaced: bool,
    italic_angle: f32,
    weight: f32,
    underline: Option<Decoration>,
    strikeout: Option<Decoration>,
}

impl FontInfo {
    fn new(data: &[u8], index: u32) -> Option<Self> {
        let font_ref = FontRef::from_index(data, index).ok()?;

        let metrics = font_ref.metrics(Size::unscaled(), LocationRef::default());
        let units_per_em = metrics.units_per_em;

        // Fonts with a units per em of 0 can't be scaled.
        if units_per_em == 0 {
            return None;
        }

        let global_bbox = metrics
            .bounds
            .and_then(|b| Rect::from_ltrb(b.x_min, b.y_min, b.x_max, b.y_max))
            .or_else(|| Rect::from_xywh(0.0, 0.0, units_per_em as f32, units_per_em as f32))?;

        let postscript_name = font_ref
            .localized_strings(StringId::POSTSCRIPT_NAME)
            .english_or_first()
            .map(|s| s.to_string());

        let to_decoration = |d: skrifa::metrics::Decoration| Decoration {
            offset: d.offset,
            thickness: d.thickness,
        };

        Some(FontInfo {
            index,
            units_per_em,
            global_bbox,
            postscript_name,
            ascent: metrics.ascent,
            descent: metrics.descent,
            cap_height: metrics.cap_height,
            is_monospaced: metrics.is_monospace,
            italic_angle: metrics.italic_angle,
            weight: font_ref.attributes().weight.value(),
            underline: metrics
                .underline
                .filter(|d| d.thickness > 0.0)
                .map(to_decoration),
            strikeout: metrics
                .strikeout
                .filter(|d| d.thickness > 0.0)
                .map(to_decoration),
        })
    }
}

struct Repr {
    font_info: FontInfo,
    font_data: Data,
}

impl Hash for Repr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Only happens once per font, see `Prehashed`.
        self.font_data.hash(state);
        self.font_info.index.hash(state);
    }
}
