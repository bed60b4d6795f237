//! Embedding TrueType fonts as CID-keyed fonts.

use std::collections::{BTreeMap, BTreeSet};

use pdf_writer::types::{CidFontType, FontFlags, SystemInfo, UnicodeCmap};
use pdf_writer::{Chunk, Finish, Name, Ref, Str};
use skrifa::GlyphId;

use crate::error::{CanvasError, CanvasResult};
use crate::font::Font;
use crate::serialize::SerializeContext;
use crate::stream::FilterStreamBuilder;
use crate::util::{hash128, RectExt, SliceExt};

const CMAP_NAME: Name = Name(b"Custom");
const SYSTEM_INFO: SystemInfo = SystemInfo {
    registry: Str(b"Adobe"),
    ordering: Str(b"Identity"),
    supplement: 0,
};

/// A font that is written as a Type0 font with a `CIDFontType2` descendant.
///
/// Glyph IDs are used as CIDs directly (the CID-to-GID map is `Identity`), and
/// the subsetter keeps glyph IDs stable, so a glyph never needs to be
/// remapped.
#[derive(Debug, Clone)]
pub(crate) struct CIDFont {
    font: Font,
    glyphs: BTreeSet<u16>,
    cmap_entries: BTreeMap<u16, String>,
}

impl CIDFont {
    pub(crate) fn new(font: Font) -> Self {
        Self {
            font,
            glyphs: BTreeSet::new(),
            cmap_entries: BTreeMap::new(),
        }
    }

    pub(crate) fn font(&self) -> &Font {
        &self.font
    }

    /// Mark a glyph as used and return the CID it is shown with.
    pub(crate) fn add_glyph(&mut self, glyph_id: GlyphId) -> u16 {
        // Fonts with more than 65535 glyphs can't be addressed with two bytes.
        let cid = u16::try_from(glyph_id.to_u32()).unwrap_or(0);
        self.glyphs.insert(cid);
        cid
    }

    /// Record the text a CID stands for. The first text wins.
    pub(crate) fn set_codepoints(&mut self, cid: u16, text: &str) {
        if cid != 0 && !text.is_empty() {
            self.cmap_entries
                .entry(cid)
                .or_insert_with(|| text.to_string());
        }
    }

    fn to_pdf_units(&self, val: f32) -> f32 {
        val / self.font.units_per_em() * 1000.0
    }

    pub(crate) fn serialize(&self, sc: &mut SerializeContext, root_ref: Ref) -> CanvasResult<Chunk> {
        if !self.font.is_glyf() {
            return Err(CanvasError::Font(format!(
                "{:?} has no glyf table, only TrueType outlines can be embedded",
                self.font
            )));
        }

        let mut chunk = Chunk::new();

        let cid_ref = sc.new_ref();
        let descriptor_ref = sc.new_ref();
        let cmap_ref = sc.new_ref();
        let data_ref = sc.new_ref();

        let settings = sc.serialize_settings();

        let font_data = if settings.subset_fonts {
            // The notdef glyph must always be part of the font program.
            let glyphs = std::iter::once(0)
                .chain(self.glyphs.iter().copied())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect::<Vec<_>>();

            subsetter::subset(
                self.font.font_data().as_ref(),
                self.font.index(),
                subsetter::Profile::pdf(&glyphs),
            )
            .map_err(|e| CanvasError::Font(format!("failed to subset {:?}: {}", self.font, e)))?
        } else {
            self.font.font_data().as_ref().to_vec()
        };

        let base_font = base_font_name(&self.font, &self.glyphs);

        chunk
            .type0_font(root_ref)
            .base_font(Name(base_font.as_bytes()))
            .encoding_predefined(Name(b"Identity-H"))
            .descendant_font(cid_ref)
            .to_unicode(cmap_ref);

        let mut cid = chunk.cid_font(cid_ref);
        cid.subtype(CidFontType::Type2);
        cid.base_font(Name(base_font.as_bytes()));
        cid.system_info(SYSTEM_INFO);
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));

        let widths = self
            .glyphs
            .iter()
            .enumerate()
            .map(|(i, &cid)| {
                let width = self
                    .font
                    .advance_width(GlyphId::new(cid as u32))
                    .unwrap_or(0.0);
                (i, cid, self.to_pdf_units(width))
            })
            .collect::<Vec<_>>();

        // Runs of consecutive CIDs with the same width share one entry.
        let mut width_writer = cid.widths();
        for ((_, w), group) in widths.group_by_key(|&(i, cid, w)| (cid as usize - i, w)) {
            if w != 0.0 {
                let first = group[0].1;
                let last = group[group.len() - 1].1;
                width_writer.same(first, last, w);
            }
        }

        width_writer.finish();
        cid.finish();

        let postscript_name = self.font.postscript_name().unwrap_or("unknown");

        let mut flags = FontFlags::empty();
        flags.set(FontFlags::SERIF, postscript_name.contains("Serif"));
        flags.set(FontFlags::FIXED_PITCH, self.font.is_monospaced());
        flags.set(FontFlags::ITALIC, self.font.italic_angle() != 0.0);
        flags.insert(FontFlags::SYMBOLIC);
        flags.insert(FontFlags::SMALL_CAP);

        let bbox = self.font.bbox();
        let bbox = tiny_skia_path::Rect::from_ltrb(
            self.to_pdf_units(bbox.left()),
            self.to_pdf_units(bbox.top()),
            self.to_pdf_units(bbox.right()),
            self.to_pdf_units(bbox.bottom()),
        )
        .unwrap_or(bbox);

        let ascender = self.to_pdf_units(self.font.ascent());
        let descender = self.to_pdf_units(self.font.descent());
        let cap_height = self
            .font
            .cap_height()
            .map(|h| self.to_pdf_units(h))
            .unwrap_or(ascender);
        let stem_v = 10.0 + 0.244 * (self.font.weight() - 50.0);

        chunk
            .font_descriptor(descriptor_ref)
            .name(Name(base_font.as_bytes()))
            .flags(flags)
            .bbox(bbox.to_pdf_rect())
            .italic_angle(self.font.italic_angle())
            .ascent(ascender)
            .descent(descender)
            .cap_height(cap_height)
            .stem_v(stem_v)
            .font_file2(data_ref);

        let cmap = {
            let mut cmap = UnicodeCmap::new(CMAP_NAME, SYSTEM_INFO);
            for (cid, text) in &self.cmap_entries {
                cmap.pair_with_multiple(*cid, text.chars());
            }

            cmap
        };

        chunk
            .cmap(cmap_ref, &cmap.finish())
            .name(CMAP_NAME)
            .system_info(SYSTEM_INFO);

        let font_stream = FilterStreamBuilder::new_from_binary_data(&font_data).finish(&settings);
        let mut stream = chunk.stream(data_ref, font_stream.encoded_data());
        font_stream.write_filters(&mut stream);
        stream.finish();

        log::debug!(
            "embedded {} with {} glyphs, {} bytes",
            base_font,
            self.glyphs.len(),
            font_data.len()
        );

        Ok(chunk)
    }
}

/// Create a tag for a font subset that only depends on the font and the
/// glyphs it contains.
fn subset_tag(font: &Font, glyphs: &BTreeSet<u16>) -> String {
    const LEN: usize = 6;
    const BASE: u128 = 26;

    let mut hash = hash128(&(font, glyphs));
    let mut letter = [b'A'; LEN];
    for l in letter.iter_mut() {
        *l = b'A' + (hash % BASE) as u8;
        hash /= BASE;
    }

    letter.iter().map(|&b| b as char).collect()
}

fn base_font_name(font: &Font, glyphs: &BTreeSet<u16>) -> String {
    const REST_LEN: usize = 116;

    let postscript_name = font.postscript_name().unwrap_or("unknown");
    let trimmed = &postscript_name[..postscript_name.len().min(REST_LEN)];

    format!("{}+{}", subset_tag(font, glyphs), trimmed)
}
