//! The top-level document.
//!
//! A [`Document`] always has exactly one open page that drawing calls go to.
//! Calling [`Document::add_page`] closes it and opens a new one of the same
//! size. Once everything is drawn, [`Document::finish`] turns the document into
//! the bytes of a PDF file.

use std::io::Write;

use tiny_skia_path::{Path, Transform};

use crate::canvas::Renderer;
use crate::content::ContentBuilder;
use crate::error::CanvasResult;
#[cfg(feature = "raster-images")]
use crate::object::image::Image;
use crate::page::{InternalPage, PageSettings};
use crate::path::Style;
use crate::serialize::{SerializeContext, SerializeSettings};
use crate::text::Text;

/// A PDF document.
pub struct Document {
    serialize_context: SerializeContext,
    page_settings: PageSettings,
    builder: ContentBuilder,
}

impl Document {
    /// Create a new document whose pages have the given width and height in
    /// millimetres.
    pub fn new(width: f32, height: f32) -> Self {
        Self::new_with(SerializeSettings::default(), width, height)
    }

    /// Create a new document with specific settings.
    pub fn new_with(serialize_settings: SerializeSettings, width: f32, height: f32) -> Self {
        Self {
            serialize_context: SerializeContext::new(serialize_settings),
            page_settings: PageSettings::new(width, height),
            builder: ContentBuilder::new(),
        }
    }

    /// The settings of the pages of the document.
    pub fn page_settings(&self) -> PageSettings {
        self.page_settings
    }

    /// Close the current page and start a new one.
    pub fn add_page(&mut self) {
        let builder = std::mem::replace(&mut self.builder, ContentBuilder::new());
        self.serialize_context
            .add_page(InternalPage::new(builder.finish(), self.page_settings));
    }

    /// Draw a path onto the current page.
    pub fn render_path(
        &mut self,
        path: &Path,
        style: &Style,
        transform: Transform,
    ) -> CanvasResult<()> {
        self.builder
            .draw_path(path, style, transform, &mut self.serialize_context)
    }

    /// Draw text onto the current page.
    pub fn render_text(&mut self, text: &Text, transform: Transform) -> CanvasResult<()> {
        self.builder
            .draw_text(text, transform, &mut self.serialize_context)
    }

    /// Draw an image onto the current page, with one millimetre per pixel.
    #[cfg(feature = "raster-images")]
    pub fn render_image(&mut self, image: &Image, transform: Transform) -> CanvasResult<()> {
        self.builder
            .draw_image(image.clone(), transform, &mut self.serialize_context);
        Ok(())
    }

    /// Close the current page and export the document to a PDF.
    pub fn finish(mut self) -> CanvasResult<Vec<u8>> {
        self.add_page();
        log::debug!(
            "writing document with {} pages",
            self.serialize_context.page_count()
        );

        Ok(self.serialize_context.finish()?.finish())
    }

    /// Export the document and write it into `writer`.
    pub fn write(self, mut writer: impl Write) -> CanvasResult<()> {
        let data = self.finish()?;
        writer.write_all(&data)?;
        writer.flush()?;

        Ok(())
    }
}

impl Renderer for Document {
    fn size(&self) -> (f32, f32) {
        (self.page_settings.width(), self.page_settings.height())
    }

    fn render_path(&mut self, path: &Path, style: &Style, transform: Transform) -> CanvasResult<()> {
        Document::render_path(self, path, style, transform)
    }

    fn render_text(&mut self, text: &Text, transform: Transform) -> CanvasResult<()> {
        Document::render_text(self, text, transform)
    }

    #[cfg(feature = "raster-images")]
    fn render_image(&mut self, image: &Image, transform: Transform) -> CanvasResult<()> {
        Document::render_image(self, image, transform)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use tiny_skia_path::{PathBuilder, Rect, Transform};

    use crate::color::Rgba;
    use crate::document::Document;
    use crate::error::CanvasError;
    use crate::path::Style;
    use crate::tests::settings;

    fn square() -> tiny_skia_path::Path {
        PathBuilder::from_rect(Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap())
    }

    #[test]
    fn empty_document_has_one_page() {
        let pdf = Document::new(100.0, 50.0).finish().unwrap();
        let written = String::from_utf8_lossy(&pdf);

        assert!(written.contains("/Count 1"));
    }

    #[test]
    fn add_page() {
        let mut document = Document::new_with(settings(), 100.0, 100.0);
        document
            .render_path(&square(), &Style::fill(Rgba::BLACK), Transform::identity())
            .unwrap();
        document.add_page();
        document
            .render_path(&square(), &Style::stroke(Rgba::BLACK, 1.0), Transform::identity())
            .unwrap();

        let pdf = document.finish().unwrap();
        let written = String::from_utf8_lossy(&pdf);

        assert!(written.contains("/Count 2"));
        assert!(written.contains("\nf\nendstream"));
        assert!(written.contains("\ns\nendstream"));
    }

    struct FailingWriter;

    impl io::Write for FailingWriter {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "sink is closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn io_errors_are_propagated() {
        let result = Document::new(10.0, 10.0).write(FailingWriter);
        assert!(matches!(result, Err(CanvasError::Io(_))));
    }

    #[test]
    fn write_into_vec() {
        let mut buf = vec![];
        Document::new(10.0, 10.0).write(&mut buf).unwrap();
        assert!(buf.starts_with(b"%PDF-"));
    }
}
