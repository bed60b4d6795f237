use std::io::Cursor;
use std::path::PathBuf;

use once_cell::sync::Lazy;

use crate::font::Font;
use crate::serialize::{SerializeContext, SerializeSettings};
use crate::Data;

static FONT_PATH: Lazy<PathBuf> =
    Lazy::new(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"));

macro_rules! lazy_font {
    ($name:ident, $path:expr) => {
        pub static $name: Lazy<Data> =
            Lazy::new(|| Data::from(std::fs::read($path).unwrap()));
    };
}

#[rustfmt::skip]
lazy_font!(DEJAVU_SANS, FONT_PATH.join("DejaVuSans.ttf"));

pub fn dejavu_sans() -> Font {
    Font::new(DEJAVU_SANS.clone(), 0).unwrap()
}

/// Settings that keep content streams readable.
pub fn settings() -> SerializeSettings {
    SerializeSettings {
        compress_content_streams: false,
        ..SerializeSettings::default()
    }
}

pub fn serialize_context() -> SerializeContext {
    SerializeContext::new(settings())
}

/// Split a content stream into its operator lines.
pub fn lines(content: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(content)
        .lines()
        .map(|l| l.to_string())
        .collect()
}

/// The number of lines that consist of exactly the given operator.
pub fn count_op(lines: &[String], op: &str) -> usize {
    lines
        .iter()
        .filter(|l| l.as_str() == op || l.ends_with(&format!(" {op}")))
        .count()
}

pub fn png(width: u32, height: u32, alpha: u8) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, alpha]));
    let mut buf = vec![];
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([0, 0, 255]));
    let mut buf = vec![];
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .unwrap();
    buf
}
