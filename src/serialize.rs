//! Serializing a document into a PDF file.
//!
//! All objects are first written into separate [`Chunk`]s using temporary
//! references. Once the document is finished, the chunks are collected in a
//! fixed order and renumbered, so that the final file is numbered in the order
//! its objects appear.

use std::collections::{BTreeMap, HashMap};

use pdf_writer::{Chunk, Finish, Pdf, Ref};

use crate::error::CanvasResult;
use crate::font::Font;
use crate::object::cid_font::CIDFont;
use crate::object::Cacheable;
use crate::page::InternalPage;
use crate::util::hash_base64;

/// Settings that should be applied when converting a document into a PDF.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SerializeSettings {
    /// Whether content streams should be compressed. Disabling it makes the
    /// file easier to inspect, but a lot larger.
    pub compress_content_streams: bool,
    /// Whether all binary streams should be hex-encoded, so that the file only
    /// consists of ASCII characters.
    pub ascii_compatible: bool,
    /// Whether only the used glyphs of a font should be embedded.
    pub subset_fonts: bool,
}

impl Default for SerializeSettings {
    fn default() -> Self {
        Self {
            compress_content_streams: true,
            ascii_compatible: false,
            subset_fonts: true,
        }
    }
}

/// Collects all chunks that are created while building the PDF and writes
/// them out in an orderly manner.
#[derive(Default)]
pub(crate) struct ChunkContainer {
    pub(crate) page_tree: Option<(Ref, Chunk)>,

    pub(crate) pages: Vec<Chunk>,
    pub(crate) fonts: Vec<Chunk>,
    pub(crate) ext_g_states: Vec<Chunk>,
    pub(crate) images: Vec<Chunk>,
}

impl ChunkContainer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn finish(self) -> Pdf {
        let mut remapped_ref = Ref::new(1);
        let mut remapper = HashMap::new();

        let mut pdf = Pdf::new();

        // The catalog comes first, followed by the page tree.
        if let Some((page_tree_ref, _)) = &self.page_tree {
            let catalog_ref = remapped_ref.bump();
            let new_page_tree_ref = remapped_ref.bump();
            remapper.insert(*page_tree_ref, new_page_tree_ref);

            let mut catalog = pdf.catalog(catalog_ref);
            catalog.pages(new_page_tree_ref);
            catalog.finish();
        }

        // Every other reference is numbered in the order it is encountered.
        let mut write = |chunk: &Chunk, pdf: &mut Pdf| {
            chunk.renumber_into(pdf, |old| {
                *remapper.entry(old).or_insert_with(|| remapped_ref.bump())
            });
        };

        if let Some((_, chunk)) = &self.page_tree {
            write(chunk, &mut pdf);
        }

        for chunk in self
            .pages
            .iter()
            .chain(&self.fonts)
            .chain(&self.ext_g_states)
            .chain(&self.images)
        {
            write(chunk, &mut pdf);
        }

        let file_id = hash_base64(pdf.as_bytes());
        pdf.set_file_id((file_id.as_bytes().to_vec(), file_id.as_bytes().to_vec()));

        pdf
    }
}

/// Keeps track of everything that is written into a single document.
pub(crate) struct SerializeContext {
    cached_mappings: HashMap<u128, Ref>,
    fonts: BTreeMap<String, (Ref, CIDFont)>,
    pages: Vec<(Ref, InternalPage)>,
    page_tree_ref: Option<Ref>,
    chunk_container: ChunkContainer,
    cur_ref: Ref,
    serialize_settings: SerializeSettings,
}

impl SerializeContext {
    pub(crate) fn new(serialize_settings: SerializeSettings) -> Self {
        Self {
            cached_mappings: HashMap::new(),
            fonts: BTreeMap::new(),
            pages: vec![],
            page_tree_ref: None,
            chunk_container: ChunkContainer::new(),
            cur_ref: Ref::new(1),
            serialize_settings,
        }
    }

    pub(crate) fn serialize_settings(&self) -> SerializeSettings {
        self.serialize_settings
    }

    pub(crate) fn new_ref(&mut self) -> Ref {
        self.cur_ref.bump()
    }

    pub(crate) fn page_tree_ref(&mut self) -> Ref {
        *self
            .page_tree_ref
            .get_or_insert_with(|| self.cur_ref.bump())
    }

    #[cfg(test)]
    pub(crate) fn chunk_container(&self) -> &ChunkContainer {
        &self.chunk_container
    }

    /// Write an object unless an equal one was written before, and return the
    /// reference to it.
    pub(crate) fn register_cacheable<T>(&mut self, object: T) -> Ref
    where
        T: Cacheable,
    {
        let hash = object.sip_hash();
        if let Some(ref_) = self.cached_mappings.get(&hash) {
            log::debug!("reusing cached object {:?}", ref_);
            *ref_
        } else {
            let root_ref = self.new_ref();
            self.cached_mappings.insert(hash, root_ref);

            let chunk_container_fn = object.chunk_container();
            let chunk = object.serialize(self, root_ref);
            chunk_container_fn(&mut self.chunk_container).push(chunk);

            root_ref
        }
    }

    /// The font registered under `key`, together with the reference it will
    /// be written to. The first font registered under a key is kept.
    pub(crate) fn font_entry(&mut self, key: &str, font: &Font) -> (Ref, &mut CIDFont) {
        let cur_ref = &mut self.cur_ref;
        let (ref_, cid_font) = self.fonts.entry(key.to_string()).or_insert_with(|| {
            log::debug!("registering font {:?} as {}", font, key);
            (cur_ref.bump(), CIDFont::new(font.clone()))
        });

        if cid_font.font() != font {
            log::warn!(
                "{} is already registered with {:?}, ignoring {:?}",
                key,
                cid_font.font(),
                font
            );
        }

        (*ref_, cid_font)
    }

    pub(crate) fn add_page(&mut self, page: InternalPage) {
        let ref_ = self.new_ref();
        self.pages.push((ref_, page));
    }

    pub(crate) fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Write all fonts and pages and assemble the final file.
    pub(crate) fn finish(mut self) -> CanvasResult<Pdf> {
        let fonts = std::mem::take(&mut self.fonts);
        for (ref_, cid_font) in fonts.into_values() {
            let chunk = cid_font.serialize(&mut self, ref_)?;
            self.chunk_container.fonts.push(chunk);
        }

        let page_tree_ref = self.page_tree_ref();
        let pages = std::mem::take(&mut self.pages);
        let mut page_refs = vec![];

        for (ref_, page) in pages {
            let chunk = page.serialize(&mut self, ref_, page_tree_ref);
            self.chunk_container.pages.push(chunk);
            page_refs.push(ref_);
        }

        let mut page_tree_chunk = Chunk::new();
        page_tree_chunk
            .pages(page_tree_ref)
            .count(page_refs.len() as i32)
            .kids(page_refs);
        self.chunk_container.page_tree = Some((page_tree_ref, page_tree_chunk));

        Ok(self.chunk_container.finish())
    }
}
