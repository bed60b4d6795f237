//! Drawing paths and the style they are painted with.
//!
//! Paths themselves are [`tiny_skia_path::Path`]s. The interesting part of this
//! module is [`Style`], which describes how a path should be filled and/or
//! stroked. Whether a path is filled or stroked at all isn't stored explicitly,
//! but derived from the colors and the stroke width.

pub use tiny_skia_path::{Path, PathBuilder};

use crate::color::Rgba;

/// How the ends of open subpaths are drawn when stroking.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum LineCap {
    /// The stroke ends exactly at the end point.
    #[default]
    Butt,
    /// The stroke ends with a semicircle.
    Round,
    /// The stroke is extended by half its width.
    Square,
}

/// The joiner used by miter and arcs joins once their limit is exceeded.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum GapJoin {
    /// Cut the corner off.
    #[default]
    Bevel,
    /// Round the corner off.
    Round,
}

/// How corners between segments are drawn when stroking.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LineJoin {
    /// Connect the outer edges with a straight line.
    Bevel,
    /// Connect the outer edges with a circular arc.
    Round,
    /// Extend the outer edges until they meet.
    ///
    /// `limit` is the maximum ratio of miter length to stroke width. A NaN
    /// limit means that the miter is never cut off. Once the limit is exceeded,
    /// `gap` is used to join the segments instead.
    Miter {
        /// The miter limit.
        limit: f32,
        /// The joiner used when the limit is exceeded.
        gap: GapJoin,
    },
    /// Extend the outer edges with arcs that follow their curvature until they
    /// meet. Behaves like [`LineJoin::Miter`] with respect to `limit` and `gap`.
    Arcs {
        /// The arcs limit.
        limit: f32,
        /// The joiner used when the limit is exceeded.
        gap: GapJoin,
    },
}

impl LineJoin {
    /// A miter join with a limit of 4 that falls back to a bevel join.
    pub const MITER: LineJoin = LineJoin::Miter {
        limit: 4.0,
        gap: GapJoin::Bevel,
    };

    /// A miter join with a custom limit that falls back to a bevel join.
    pub fn miter(limit: f32) -> Self {
        LineJoin::Miter {
            limit,
            gap: GapJoin::Bevel,
        }
    }
}

impl Default for LineJoin {
    fn default() -> Self {
        Self::MITER
    }
}

/// A dash pattern, in millimetres.
///
/// An empty array means a solid stroke.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dash {
    /// How far into the pattern the stroke starts.
    pub offset: f32,
    /// Alternating lengths of dashes and gaps.
    pub array: Vec<f32>,
}

impl Dash {
    /// Create a new dash pattern.
    pub fn new(offset: f32, array: Vec<f32>) -> Self {
        Self { offset, array }
    }

    /// A solid stroke.
    pub fn solid() -> Self {
        Self::default()
    }

    /// Whether the pattern describes a solid stroke.
    pub fn is_solid(&self) -> bool {
        self.array.is_empty()
    }

    /// Whether the pattern can be applied. Solid patterns are always valid,
    /// other ones need a finite offset, finite non-negative lengths and a
    /// positive total length.
    pub fn is_valid(&self) -> bool {
        if self.is_solid() {
            return true;
        }

        let total = self.array.iter().sum::<f32>();
        self.offset.is_finite()
            && self.array.iter().all(|n| n.is_finite() && *n >= 0.0)
            && total.is_finite()
            && total > 0.0
    }
}

/// A fill rule.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum FillRule {
    /// The nonzero winding rule.
    #[default]
    NonZero,
    /// The even-odd rule.
    EvenOdd,
}

/// The paint style of a path.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// The fill color. A transparent color disables filling.
    pub fill: Rgba,
    /// The stroke color. A transparent color disables stroking.
    pub stroke: Rgba,
    /// The stroke width in millimetres. A width of zero disables stroking.
    pub stroke_width: f32,
    /// The line cap.
    pub line_cap: LineCap,
    /// The line join.
    pub line_join: LineJoin,
    /// The dash pattern.
    pub dash: Dash,
    /// The fill rule.
    pub fill_rule: FillRule,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Rgba::BLACK,
            stroke: Rgba::TRANSPARENT,
            stroke_width: 1.0,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            dash: Dash::default(),
            fill_rule: FillRule::default(),
        }
    }
}

impl Style {
    /// A style that only fills with the given color.
    pub fn fill(color: Rgba) -> Self {
        Self {
            fill: color,
            ..Self::default()
        }
    }

    /// A style that only strokes with the given color and width.
    pub fn stroke(color: Rgba, width: f32) -> Self {
        Self {
            fill: Rgba::TRANSPARENT,
            stroke: color,
            stroke_width: width,
            ..Self::default()
        }
    }

    /// Whether the path is filled.
    pub fn is_filled(&self) -> bool {
        self.fill.a != 0
    }

    /// Whether the path is stroked.
    pub fn is_stroked(&self) -> bool {
        self.stroke.a != 0 && self.stroke_width > 0.0
    }

    /// Whether the path is filled and stroked with different opacities.
    pub fn has_different_alpha(&self) -> bool {
        self.is_filled() && self.is_stroked() && self.fill.a != self.stroke.a
    }

    /// Whether the line join can't be expressed by a native PDF stroke.
    ///
    /// PDF has no arcs joins, and its miter joins always have a finite limit
    /// and fall back to a bevel join. Infinite and NaN limits count as
    /// unbounded. This says nothing about whether the path
    /// is stroked at all.
    pub fn stroke_unsupported(&self) -> bool {
        match self.line_join {
            LineJoin::Bevel | LineJoin::Round => false,
            LineJoin::Miter { limit, gap } => !limit.is_finite() || gap != GapJoin::Bevel,
            LineJoin::Arcs { .. } => true,
        }
    }
}
