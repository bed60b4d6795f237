//! A small library for drawing vector graphics, text and raster images into PDF
//! files.
//!
//! Everything is measured in millimetres, with the origin in the bottom-left
//! corner of a page. Drawing calls are translated into PDF content stream
//! operators directly: fills and strokes use the native PDF operators, and only
//! strokes that PDF can't express (round-capped line joins, unbounded miters)
//! are converted into filled outlines.
//!
//! # Example
//!
//! ```
//! use pdf_canvas::{Document, PathBuilder, Rect, Rgba, Style, Transform};
//!
//! let mut document = Document::new(100.0, 100.0);
//! let square = PathBuilder::from_rect(Rect::from_xywh(10.0, 10.0, 50.0, 50.0).unwrap());
//!
//! let mut style = Style::fill(Rgba::new(255, 0, 0, 255));
//! style.stroke = Rgba::BLACK;
//! style.stroke_width = 0.5;
//!
//! document.render_path(&square, &style, Transform::identity()).unwrap();
//! let pdf = document.finish().unwrap();
//! assert!(pdf.starts_with(b"%PDF-"));
//! ```

mod canvas;
mod color;
mod content;
mod document;
mod error;
mod font;
mod geometry;
mod object;
mod page;
mod path;
mod resource;
mod serialize;
mod stream;
mod text;
mod util;

#[cfg(test)]
mod tests;

use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub use canvas::{write_pdf, Canvas, Renderer};
pub use color::Rgba;
pub use document::Document;
pub use error::{CanvasError, CanvasResult};
pub use font::Font;
pub use geometry::PT_PER_MM;
#[cfg(feature = "raster-images")]
pub use object::image::Image;
pub use page::PageSettings;
pub use path::{Dash, FillRule, GapJoin, LineCap, LineJoin, Style};
pub use serialize::SerializeSettings;
pub use text::{FontFace, FontStyle, PositionedSpan, Text, TextDecoration, TextSpan};

pub use tiny_skia_path::{Path, PathBuilder, Rect, Transform};

/// Shared, immutable bytes, for example the data of a font file.
///
/// Cloning is cheap.
#[derive(Clone)]
pub struct Data(Arc<dyn AsRef<[u8]> + Send + Sync>);

impl Data {
    /// Wrap anything that can be viewed as bytes.
    pub fn new(data: impl AsRef<[u8]> + Send + Sync + 'static) -> Self {
        Self(Arc::new(data))
    }
}

impl AsRef<[u8]> for Data {
    fn as_ref(&self) -> &[u8] {
        (*self.0).as_ref()
    }
}

impl From<Vec<u8>> for Data {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl From<Arc<Vec<u8>>> for Data {
    fn from(value: Arc<Vec<u8>>) -> Self {
        Self(value)
    }
}

impl From<&'static [u8]> for Data {
    fn from(value: &'static [u8]) -> Self {
        Self::new(value)
    }
}

impl Hash for Data {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_ref().hash(state);
    }
}

impl PartialEq for Data {
    fn eq(&self, other: &Self) -> bool {
        self.as_ref() == other.as_ref()
    }
}

impl Eq for Data {}

impl Debug for Data {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Data({} bytes)", self.as_ref().len())
    }
}
