//! Pages of a document.

use pdf_writer::{Chunk, Finish, Ref};
use tiny_skia_path::Rect;

use crate::geometry::PT_PER_MM;
use crate::serialize::SerializeContext;
use crate::stream::{FilterStreamBuilder, Stream};
use crate::util::RectExt;

/// The size of a page, in millimetres.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PageSettings {
    width: f32,
    height: f32,
}

impl PageSettings {
    /// Create new page settings with the given width and height in millimetres.
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The width of the page, in millimetres.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// The height of the page, in millimetres.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// The media box of the page, in points.
    pub(crate) fn media_box(&self) -> Option<Rect> {
        let valid = |n: f32| n.is_finite() && n > 0.0;
        if !valid(self.width) || !valid(self.height) {
            return None;
        }

        Rect::from_xywh(0.0, 0.0, self.width * PT_PER_MM, self.height * PT_PER_MM)
    }
}

impl Default for PageSettings {
    /// An A4 page.
    fn default() -> Self {
        Self::new(210.0, 297.0)
    }
}

/// A page whose content is complete, waiting to be written.
#[derive(Debug)]
pub(crate) struct InternalPage {
    stream: Stream,
    page_settings: PageSettings,
}

impl InternalPage {
    pub(crate) fn new(stream: Stream, page_settings: PageSettings) -> Self {
        Self {
            stream,
            page_settings,
        }
    }

    pub(crate) fn serialize(self, sc: &mut SerializeContext, root_ref: Ref, parent: Ref) -> Chunk {
        let mut chunk = Chunk::new();
        let stream_ref = sc.new_ref();
        let settings = sc.serialize_settings();

        if self.stream.is_empty() {
            log::debug!("writing empty page {:?}", root_ref);
        }

        let mut page = chunk.page(root_ref);
        self.stream
            .resource_dictionary
            .to_pdf_resources(&mut page.resources());

        if let Some(media_box) = self.page_settings.media_box() {
            page.media_box(media_box.to_pdf_rect());
        } else {
            log::warn!(
                "page size {}x{} is invalid, no media box written",
                self.page_settings.width,
                self.page_settings.height
            );
        }

        page.parent(parent);
        page.contents(stream_ref);
        page.finish();

        let content_stream =
            FilterStreamBuilder::new_from_content_stream(&self.stream.content, &settings)
                .finish(&settings);
        let mut stream = chunk.stream(stream_ref, content_stream.encoded_data());
        content_stream.write_filters(&mut stream);
        stream.finish();

        chunk
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use pdf_writer::Ref;

    use crate::page::{InternalPage, PageSettings};
    use crate::resource::{ExtGState, ResourceDictionaryBuilder};
    use crate::stream::Stream;
    use crate::tests::serialize_context;

    #[test]
    fn media_box_in_points() {
        let media_box = PageSettings::new(25.4, 50.8).media_box().unwrap();

        assert!(approx_eq!(f32, media_box.width(), 72.0, epsilon = 0.001));
        assert!(approx_eq!(f32, media_box.height(), 144.0, epsilon = 0.001));
    }

    #[test]
    fn zero_sized_page_has_no_media_box() {
        assert!(PageSettings::new(0.0, 10.0).media_box().is_none());
        assert!(PageSettings::new(10.0, -5.0).media_box().is_none());
        assert!(PageSettings::new(f32::INFINITY, 10.0).media_box().is_none());
    }

    #[test]
    fn serialize_page() {
        let mut sc = serialize_context();
        let mut rd_builder = ResourceDictionaryBuilder::new();
        rd_builder.register_resource::<ExtGState>(Ref::new(100));

        let page = InternalPage::new(
            Stream::new(b"0 0 m\n1 1 l\nS".to_vec(), rd_builder.finish()),
            PageSettings::new(25.4, 25.4),
        );

        let root_ref = sc.new_ref();
        let chunk = page.serialize(&mut sc, root_ref, Ref::new(50));
        let written = String::from_utf8_lossy(chunk.as_bytes());

        assert!(written.contains("/MediaBox [0 0 "));
        assert!(written.contains("/Parent 50 0 R"));
        assert!(written.contains("/g0 100 0 R"));
        assert!(written.contains("stream\n0 0 m\n1 1 l\nS\nendstream"));
    }
}
