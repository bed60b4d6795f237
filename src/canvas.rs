//! Retained drawings and the renderer interface.
//!
//! A [`Canvas`] records drawing calls instead of executing them, so that the
//! same drawing can be replayed onto any [`Renderer`]. [`write_pdf`] replays a
//! canvas into a new [`Document`] and writes it out.

use std::io::Write;

use tiny_skia_path::{Path, Transform};

use crate::document::Document;
use crate::error::CanvasResult;
#[cfg(feature = "raster-images")]
use crate::object::image::Image;
use crate::path::Style;
use crate::text::Text;

/// Something that paths, text and images can be drawn onto.
///
/// All coordinates are in millimetres, with the origin in the bottom-left
/// corner and the y axis pointing up.
pub trait Renderer {
    /// The width and height of the drawing area.
    fn size(&self) -> (f32, f32);

    /// Draw a path with a style.
    fn render_path(&mut self, path: &Path, style: &Style, transform: Transform) -> CanvasResult<()>;

    /// Draw a block of text.
    fn render_text(&mut self, text: &Text, transform: Transform) -> CanvasResult<()>;

    /// Draw an image, with one millimetre per pixel.
    #[cfg(feature = "raster-images")]
    fn render_image(&mut self, image: &Image, transform: Transform) -> CanvasResult<()>;
}

#[derive(Debug, Clone)]
enum Layer {
    Path {
        path: Path,
        style: Style,
        transform: Transform,
    },
    Text {
        text: Text,
        transform: Transform,
    },
    #[cfg(feature = "raster-images")]
    Image { image: Image, transform: Transform },
}

/// A recorded drawing.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: f32,
    height: f32,
    layers: Vec<Layer>,
}

impl Canvas {
    /// Create a new, empty canvas with a width and height in millimetres.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            layers: vec![],
        }
    }

    /// Whether nothing was drawn onto the canvas yet.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Remove everything that was drawn.
    pub fn reset(&mut self) {
        self.layers.clear();
    }

    /// Replay all recorded drawing calls onto a renderer, in order.
    pub fn render(&self, renderer: &mut impl Renderer) -> CanvasResult<()> {
        for layer in &self.layers {
            match layer {
                Layer::Path {
                    path,
                    style,
                    transform,
                } => renderer.render_path(path, style, *transform)?,
                Layer::Text { text, transform } => renderer.render_text(text, *transform)?,
                #[cfg(feature = "raster-images")]
                Layer::Image { image, transform } => renderer.render_image(image, *transform)?,
            }
        }

        Ok(())
    }
}

impl Renderer for Canvas {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn render_path(&mut self, path: &Path, style: &Style, transform: Transform) -> CanvasResult<()> {
        self.layers.push(Layer::Path {
            path: path.clone(),
            style: style.clone(),
            transform,
        });

        Ok(())
    }

    fn render_text(&mut self, text: &Text, transform: Transform) -> CanvasResult<()> {
        self.layers.push(Layer::Text {
            text: text.clone(),
            transform,
        });

        Ok(())
    }

    #[cfg(feature = "raster-images")]
    fn render_image(&mut self, image: &Image, transform: Transform) -> CanvasResult<()> {
        self.layers.push(Layer::Image {
            image: image.clone(),
            transform,
        });

        Ok(())
    }
}

/// Render a canvas into a single-page PDF and write it into `writer`.
pub fn write_pdf(writer: impl Write, canvas: &Canvas) -> CanvasResult<()> {
    let (width, height) = canvas.size();
    let mut document = Document::new(width, height);
    canvas.render(&mut document)?;
    document.write(writer)
}
