use std::path::PathBuf;

use once_cell::sync::Lazy;
use pdf_canvas::{Data, Font, SerializeSettings};

static ASSETS_PATH: Lazy<PathBuf> =
    Lazy::new(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets"));

pub static DEJAVU_SANS: Lazy<Data> = Lazy::new(|| {
    Data::from(std::fs::read(ASSETS_PATH.join("fonts/DejaVuSans.ttf")).unwrap())
});

pub fn dejavu_sans() -> Font {
    Font::new(DEJAVU_SANS.clone(), 0).unwrap()
}

/// Settings that leave all content streams uncompressed, so that their
/// operators can be searched for in the written file.
pub fn uncompressed() -> SerializeSettings {
    SerializeSettings {
        compress_content_streams: false,
        ..SerializeSettings::default()
    }
}

/// The lines inside the streams of a PDF file. Everything outside of a
/// stream, like the cross-reference table, is skipped.
pub fn lines(pdf: &[u8]) -> Vec<String> {
    let mut in_stream = false;
    let mut lines = vec![];

    for line in String::from_utf8_lossy(pdf).lines() {
        match line {
            "stream" => in_stream = true,
            "endstream" => in_stream = false,
            _ if in_stream => lines.push(line.to_string()),
            _ => {}
        }
    }

    lines
}

/// The number of lines that end with the operator `op`.
pub fn count_op(lines: &[String], op: &str) -> usize {
    lines
        .iter()
        .filter(|l| l.as_str() == op || l.ends_with(&format!(" {op}")))
        .count()
}
