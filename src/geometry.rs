//! Geometry operations the path translator builds on.
//!
//! This covers transforming paths into page space, serializing them into the
//! path construction operators of a content stream and rewriting strokes that
//! can't be expressed natively into fillable outlines.

use pdf_writer::Content;
use tiny_skia_path::{Path, PathBuilder, PathSegment, StrokeDash, Transform};

use crate::error::{CanvasError, CanvasResult};
use crate::path::{Dash, GapJoin, LineCap, LineJoin};

/// The number of PDF points in a millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// The transform that maps caller coordinates (millimetres) to page space
/// (points): the caller matrix is applied first, then the unit scale.
pub(crate) fn page_transform(transform: Transform) -> Transform {
    Transform::from_scale(PT_PER_MM, PT_PER_MM).pre_concat(transform)
}

/// Like [`page_transform`], but for content that is itself already expressed
/// in points, such as text and images inside a transform scope. The
/// translation of `transform` stays in millimetres.
pub(crate) fn scope_transform(transform: Transform) -> Transform {
    page_transform(transform).pre_scale(1.0 / PT_PER_MM, 1.0 / PT_PER_MM)
}

/// Apply a transform to a path, returning a new path.
pub(crate) fn transform_path(path: &Path, transform: Transform) -> CanvasResult<Path> {
    path.clone().transform(transform).ok_or_else(|| {
        CanvasError::InvalidGeometry(format!("path can't be transformed by {:?}", transform))
    })
}

/// A path serialized into content stream operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PathData {
    /// The path construction operators, separated by newlines.
    pub data: Vec<u8>,
    /// Whether the path ended with a close operator. The operator itself is
    /// stripped from `data` in that case, so that a closing paint operator can
    /// be chosen instead.
    pub closed: bool,
}

/// Serialize a path and detect whether it ends with a close marker.
pub(crate) fn serialize_path(path: &Path) -> PathData {
    let mut content = Content::new();
    draw_path(&mut content, path.segments());
    let mut data = content.finish();

    let closed = data.ends_with(b"\nh");
    if closed {
        data.truncate(data.len() - 2);
    }

    PathData { data, closed }
}

/// Write the path construction operators of a path into a content stream.
pub(crate) fn draw_path(content: &mut Content, path_data: impl Iterator<Item = PathSegment>) {
    // Taken from resvg
    fn calc(n1: f32, n2: f32) -> f32 {
        (n1 + n2 * 2.0) / 3.0
    }

    let mut p_prev = None;

    for operation in path_data {
        match operation {
            PathSegment::MoveTo(p) => {
                content.move_to(p.x, p.y);
                p_prev = Some(p);
            }
            PathSegment::LineTo(p) => {
                content.line_to(p.x, p.y);
                p_prev = Some(p);
            }
            PathSegment::QuadTo(p1, p2) => {
                // PDF has no quadratic curves, so they are elevated to cubic ones.
                // A quad is always preceded by at least a move.
                let prev = p_prev.unwrap_or(p1);
                content.cubic_to(
                    calc(prev.x, p1.x),
                    calc(prev.y, p1.y),
                    calc(p2.x, p1.x),
                    calc(p2.y, p1.y),
                    p2.x,
                    p2.y,
                );
                p_prev = Some(p2);
            }
            PathSegment::CubicTo(p1, p2, p3) => {
                content.cubic_to(p1.x, p1.y, p2.x, p2.y, p3.x, p3.y);
                p_prev = Some(p3);
            }
            PathSegment::Close => {
                content.close_path();
            }
        };
    }
}

/// Split a path into its dashes. Lengths are multiplied by `scale`.
///
/// Odd dash arrays are repeated once, as in SVG and PDF. Returns `None` if the
/// pattern can't be applied, e.g. because all lengths are zero. Dashes on
/// closed contours are not rejoined across the start point.
pub(crate) fn dash_path(path: &Path, dash: &Dash, scale: f32) -> Option<Path> {
    if !dash.is_valid() {
        return None;
    }

    let mut array = dash.array.iter().map(|n| n * scale).collect::<Vec<_>>();

    if array.len() % 2 == 1 {
        array.extend_from_within(..);
    }

    let stroke_dash = StrokeDash::new(array, dash.offset * scale)?;
    open_contours(path)?.dash(&stroke_dash, 1.0)
}

/// Replace every close marker with an explicit line back to the start of its
/// contour, so that the dasher treats all contours as open ones.
fn open_contours(path: &Path) -> Option<Path> {
    let mut builder = PathBuilder::new();
    let mut start = None;

    for segment in path.segments() {
        match segment {
            PathSegment::MoveTo(p) => {
                builder.move_to(p.x, p.y);
                start = Some(p);
            }
            PathSegment::LineTo(p) => builder.line_to(p.x, p.y),
            PathSegment::QuadTo(p1, p2) => builder.quad_to(p1.x, p1.y, p2.x, p2.y),
            PathSegment::CubicTo(p1, p2, p3) => {
                builder.cubic_to(p1.x, p1.y, p2.x, p2.y, p3.x, p3.y)
            }
            PathSegment::Close => {
                if let Some(start) = start {
                    if builder.last_point() != Some(start) {
                        builder.line_to(start.x, start.y);
                    }

                    // Segments after a close start at the beginning of the contour.
                    builder.move_to(start.x, start.y);
                }
            }
        }
    }

    builder.finish()
}

/// Convert a stroke into a path that covers the same area when filled.
///
/// The outliner doesn't know all joins, so some are approximated: arcs joins
/// become round joins, miter joins without limit get the largest finite limit,
/// and the gap joiner of a miter join is always a bevel.
pub(crate) fn outline_stroke(
    path: &Path,
    width: f32,
    line_cap: LineCap,
    line_join: LineJoin,
) -> Option<Path> {
    let (line_join, miter_limit) = match line_join {
        LineJoin::Bevel => (tiny_skia_path::LineJoin::Bevel, 4.0),
        LineJoin::Round => (tiny_skia_path::LineJoin::Round, 4.0),
        LineJoin::Miter { limit, gap } => {
            if gap == GapJoin::Round {
                log::debug!("approximating round gap joiner of miter join with bevel");
            }

            let limit = if limit.is_finite() { limit } else { f32::MAX };
            (tiny_skia_path::LineJoin::Miter, limit)
        }
        LineJoin::Arcs { .. } => (tiny_skia_path::LineJoin::Round, 4.0),
    };

    let line_cap = match line_cap {
        LineCap::Butt => tiny_skia_path::LineCap::Butt,
        LineCap::Round => tiny_skia_path::LineCap::Round,
        LineCap::Square => tiny_skia_path::LineCap::Square,
    };

    let stroke = tiny_skia_path::Stroke {
        width,
        miter_limit,
        line_cap,
        line_join,
        dash: None,
    };

    path.stroke(&stroke, 1.0)
}
