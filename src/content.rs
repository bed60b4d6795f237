//! Building a single content stream.
//!
//! [`ContentBuilder`] turns drawing calls into content stream operators. Paths
//! are drawn with the native fill and stroke operators whenever possible.
//! Strokes that PDF can't express are converted into outlines and filled
//! instead.

use std::ops::{Deref, DerefMut};

use float_cmp::approx_eq;
use pdf_writer::types::TextRenderingMode;
use pdf_writer::{Content, Str};
use tiny_skia_path::{Path, PathBuilder, Rect, Transform};

use crate::color::Rgba;
use crate::error::{CanvasError, CanvasResult};
use crate::geometry::{
    dash_path, outline_stroke, page_transform, scope_transform, serialize_path, transform_path,
    PT_PER_MM,
};
#[cfg(feature = "raster-images")]
use crate::object::image::Image;
use crate::object::ext_g_state::ExtGState;
use crate::path::{Dash, FillRule, LineJoin, Style};
use crate::resource;
use crate::resource::ResourceDictionaryBuilder;
use crate::serialize::SerializeContext;
use crate::stream::Stream;
use crate::text::{FontFace, Text, TextSpan};
use crate::util::{LineCapExt, LineJoinExt, NameExt, TransformExt};

pub(crate) struct ContentBuilder {
    rd_builder: ResourceDictionaryBuilder,
    buf: Vec<u8>,
}

impl ContentBuilder {
    pub fn new() -> Self {
        Self {
            rd_builder: ResourceDictionaryBuilder::new(),
            buf: vec![],
        }
    }

    pub fn finish(self) -> Stream {
        Stream::new(self.buf, self.rd_builder.finish())
    }

    /// Write a group of operators.
    fn write(&mut self, f: impl FnOnce(&mut Content)) {
        let mut content = Content::new();
        f(&mut content);
        self.append_raw(&content.finish());
    }

    /// Append already serialized operators, one per line.
    fn append_raw(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        if !self.buf.is_empty() {
            self.buf.push(b'\n');
        }

        self.buf.extend_from_slice(data);
    }

    /// Open a transform scope. The scope is closed once the returned guard is
    /// dropped.
    ///
    /// The transform is given in millimetres, everything drawn inside the
    /// scope is given in points.
    pub fn transform_scope(&mut self, transform: Transform) -> TransformScope<'_> {
        let matrix = scope_transform(transform).to_pdf_transform();
        self.write(|content| {
            content.save_state();
            content.transform(matrix);
        });

        TransformScope { builder: self }
    }

    fn set_fill_color(&mut self, color: Rgba) {
        let [r, g, b] = color.to_pdf_rgb();
        self.write(|content| {
            content.set_fill_rgb(r, g, b);
        });
    }

    fn set_stroke_color(&mut self, color: Rgba) {
        let [r, g, b] = color.to_pdf_rgb();
        self.write(|content| {
            content.set_stroke_rgb(r, g, b);
        });
    }

    /// Set the stroking and non-stroking alpha. This is always written, even
    /// for opaque colors, since the previous alpha is still in effect.
    fn set_alpha(&mut self, alpha: u8, sc: &mut SerializeContext) {
        let state_ref = sc.register_cacheable(ExtGState::alpha(alpha));
        let name = self
            .rd_builder
            .register_resource::<resource::ExtGState>(state_ref);

        self.write(|content| {
            content.set_parameters(name.to_pdf_name());
        });
    }

    pub fn set_fill_state(&mut self, color: Rgba, sc: &mut SerializeContext) {
        self.set_fill_color(color);
        self.set_alpha(color.a, sc);
    }

    /// Set the line width, cap, join, miter limit and dash pattern of a style.
    fn set_line_state(&mut self, style: &Style) {
        let solid = Dash::solid();
        let dash = if style.dash.is_valid() {
            &style.dash
        } else {
            log::warn!(
                "dash pattern {:?} can't be applied, stroking solid",
                style.dash.array
            );
            &solid
        };

        self.write(|content| {
            content.set_line_width(style.stroke_width * PT_PER_MM);
            content.set_line_cap(style.line_cap.to_pdf_line_cap());
            content.set_line_join(style.line_join.to_pdf_line_join());

            if let LineJoin::Miter { limit, .. } = style.line_join {
                // PDF requires a limit of at least 1.
                content.set_miter_limit(limit.max(1.0));
            }

            content.set_dash_pattern(
                dash.array.iter().map(|n| n * PT_PER_MM),
                dash.offset * PT_PER_MM,
            );
        });
    }

    pub fn set_stroke_state(&mut self, style: &Style, sc: &mut SerializeContext) {
        self.set_stroke_color(style.stroke);
        self.set_alpha(style.stroke.a, sc);
        self.set_line_state(style);
    }

    fn fill(&mut self, fill_rule: FillRule) {
        self.write(|content| {
            match fill_rule {
                FillRule::NonZero => content.fill_nonzero(),
                FillRule::EvenOdd => content.fill_even_odd(),
            };
        });
    }

    fn stroke(&mut self, closed: bool) {
        self.write(|content| {
            if closed {
                content.close_and_stroke();
            } else {
                content.stroke();
            }
        });
    }

    fn fill_and_stroke(&mut self, fill_rule: FillRule, closed: bool) {
        self.write(|content| {
            match (fill_rule, closed) {
                (FillRule::NonZero, false) => content.fill_nonzero_and_stroke(),
                (FillRule::NonZero, true) => content.close_fill_nonzero_and_stroke(),
                (FillRule::EvenOdd, false) => content.fill_even_odd_and_stroke(),
                (FillRule::EvenOdd, true) => content.close_fill_even_odd_and_stroke(),
            };
        });
    }

    /// Draw a path given in millimetres with a style.
    ///
    /// Paths that are neither filled nor stroked produce no output.
    pub fn draw_path(
        &mut self,
        path: &Path,
        style: &Style,
        transform: Transform,
        sc: &mut SerializeContext,
    ) -> CanvasResult<()> {
        let fill = style.is_filled();
        let stroke = style.is_stroked();

        if !fill && !stroke {
            return Ok(());
        }

        let path = transform_path(path, page_transform(transform))?;
        let path_data = serialize_path(&path);

        if stroke && style.stroke_unsupported() {
            if fill {
                self.set_fill_state(style.fill, sc);
                self.append_raw(&path_data.data);
                self.fill(style.fill_rule);
            }

            self.draw_stroke_outline(&path, style, sc);
        } else if !stroke {
            self.set_fill_state(style.fill, sc);
            self.append_raw(&path_data.data);
            self.fill(style.fill_rule);
        } else if !fill {
            self.set_stroke_state(style, sc);
            self.append_raw(&path_data.data);
            self.stroke(path_data.closed);
        } else if style.has_different_alpha() {
            // There is no operator that fills and strokes with different
            // alphas, so the path is painted twice.
            self.set_fill_state(style.fill, sc);
            self.append_raw(&path_data.data);
            self.fill(style.fill_rule);

            self.set_stroke_state(style, sc);
            self.append_raw(&path_data.data);
            self.stroke(path_data.closed);
        } else {
            self.set_fill_color(style.fill);
            self.set_stroke_color(style.stroke);
            self.set_alpha(style.fill.a, sc);
            self.set_line_state(style);
            self.append_raw(&path_data.data);
            self.fill_and_stroke(style.fill_rule, path_data.closed);
        }

        Ok(())
    }

    /// Fill the outline of the stroke of a path that is already in page space.
    fn draw_stroke_outline(&mut self, path: &Path, style: &Style, sc: &mut SerializeContext) {
        let dashed = if style.dash.is_solid() {
            None
        } else {
            let dashed = dash_path(path, &style.dash, PT_PER_MM);
            if dashed.is_none() {
                log::warn!(
                    "dash pattern {:?} can't be applied, stroking solid",
                    style.dash.array
                );
            }

            dashed
        };

        let Some(outline) = outline_stroke(
            dashed.as_ref().unwrap_or(path),
            style.stroke_width * PT_PER_MM,
            style.line_cap,
            style.line_join,
        ) else {
            log::debug!("stroke outline is empty, skipping it");
            return;
        };

        let outline_data = serialize_path(&outline);
        self.set_fill_state(style.stroke, sc);
        self.append_raw(&outline_data.data);
        self.fill(style.fill_rule);
    }

    /// Draw a block of text given in millimetres.
    pub fn draw_text(
        &mut self,
        text: &Text,
        transform: Transform,
        sc: &mut SerializeContext,
    ) -> CanvasResult<()> {
        text.walk_spans(|y, dx, span| {
            self.draw_span(y, dx, span, transform, sc);
            Ok::<_, CanvasError>(())
        })?;

        text.walk_spans(|y, dx, span| self.draw_decoration(y, dx, span, transform, sc))
    }

    fn draw_span(
        &mut self,
        y: f32,
        dx: f32,
        span: &TextSpan,
        transform: Transform,
        sc: &mut SerializeContext,
    ) {
        let words = span.words();
        if words.is_empty() {
            return;
        }

        let face = &span.face;
        let font_size = face.font_size();

        let (font_ref, cid_font) = sc.font_entry(&face.key(), &face.font);

        // Each word is shown with its glyphs encoded as two byte CIDs.
        let encoded = words
            .iter()
            .map(|word| {
                let mut bytes = Vec::with_capacity(word.len() * 2);
                for c in word.chars() {
                    let glyph_id = cid_font.font().glyph_id(c);
                    let cid = cid_font.add_glyph(glyph_id);
                    cid_font.set_codepoints(cid, c.encode_utf8(&mut [0; 4]));
                    bytes.extend(cid.to_be_bytes());
                }

                let width = cid_font.font().string_width(word, font_size);
                (bytes, width)
            })
            .collect::<Vec<_>>();

        let font_name = self.rd_builder.register_resource::<resource::Font>(font_ref);

        self.set_fill_state(face.color, sc);

        if !approx_eq!(f32, span.glyph_spacing, 0.0, epsilon = 0.001) {
            log::warn!("glyph spacing is not supported, ignoring it");
        }

        let mode = if face.faux_bold > 0.0 {
            let line_width = face.faux_bold * 2.0 * PT_PER_MM;
            self.set_stroke_color(face.color);
            self.write(|content| {
                content.set_line_width(line_width);
            });

            TextRenderingMode::FillStroke
        } else {
            TextRenderingMode::Fill
        };

        let transform = transform
            .pre_translate(dx, y)
            .pre_concat(Transform::from_skew(face.faux_italic, 0.0));

        let mut scope = self.transform_scope(transform);
        scope.write(|content| {
            content.begin_text();
            content.set_font(font_name.to_pdf_name(), font_size * PT_PER_MM);
            content.set_text_rendering_mode(mode);
        });

        let mut x = 0.0;
        for (bytes, width) in &encoded {
            let offset = x * PT_PER_MM;
            scope.write(|content| {
                content.set_text_matrix([1.0, 0.0, 0.0, 1.0, offset, 0.0]);
                content.show(Str(bytes));
            });

            x += width + span.word_spacing;
        }

        scope.write(|content| {
            content.end_text();
        });
    }

    fn draw_decoration(
        &mut self,
        y: f32,
        dx: f32,
        span: &TextSpan,
        transform: Transform,
        sc: &mut SerializeContext,
    ) -> CanvasResult<()> {
        let face = &span.face;
        if face.decoration.is_none() {
            return Ok(());
        }

        let width = span.width();
        let style = Style::fill(face.color);

        for (top, thickness) in decoration_lines(face) {
            let Some(rect) = Rect::from_xywh(dx, y + top - thickness, width, thickness) else {
                continue;
            };

            self.draw_path(&PathBuilder::from_rect(rect), &style, transform, sc)?;
        }

        Ok(())
    }

    /// Draw an image with a size of one millimetre per pixel.
    #[cfg(feature = "raster-images")]
    pub fn draw_image(&mut self, image: Image, transform: Transform, sc: &mut SerializeContext) {
        let (width, height) = image.size();
        let image_ref = sc.register_cacheable(image);
        let name = self
            .rd_builder
            .register_resource::<resource::XObject>(image_ref);

        let mut scope = self.transform_scope(transform);
        scope.write(|content| {
            content.save_state();
            content.transform([
                width as f32 * PT_PER_MM,
                0.0,
                0.0,
                height as f32 * PT_PER_MM,
                0.0,
                0.0,
            ]);
            content.x_object(name.to_pdf_name());
            content.restore_state();
        });
    }
}

/// The top and thickness of each decoration line of a face, in millimetres
/// relative to the baseline.
fn decoration_lines(face: &FontFace) -> Vec<(f32, f32)> {
    let size = face.font_size();
    let font = &face.font;
    let underline = font.underline();
    let mut lines = vec![];

    if face.decoration.underline {
        lines.push((underline.offset * size, underline.thickness * size));
    }

    if face.decoration.overline {
        let ascent = font.ascent() / font.units_per_em();
        lines.push((ascent * size, underline.thickness * size));
    }

    if face.decoration.strike_through {
        let strikeout = font.strikeout();
        lines.push((strikeout.offset * size, strikeout.thickness * size));
    }

    lines
}

/// An open transform scope. Restores the previous graphics state when dropped.
pub(crate) struct TransformScope<'a> {
    builder: &'a mut ContentBuilder,
}

impl Deref for TransformScope<'_> {
    type Target = ContentBuilder;

    fn deref(&self) -> &Self::Target {
        self.builder
    }
}

impl DerefMut for TransformScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.builder
    }
}

impl Drop for TransformScope<'_> {
    fn drop(&mut self) {
        self.builder.write(|content| {
            content.restore_state();
        });
    }
}

#[cfg(test)]
mod tests {
    use tiny_skia_path::{Path, PathBuilder, Rect, Transform};

    use crate::color::Rgba;
    use crate::content::ContentBuilder;
    use crate::error::CanvasError;
    use crate::path::{Dash, FillRule, GapJoin, LineCap, LineJoin, Style};
    use crate::serialize::SerializeContext;
    use crate::tests::{count_op, dejavu_sans, lines, serialize_context};
    use crate::text::{FontFace, Text, TextDecoration, TextSpan};

    const RED: Rgba = Rgba::new(255, 0, 0, 255);
    const BLUE: Rgba = Rgba::new(0, 0, 255, 255);

    const PAINT_OPS: [&str; 10] = ["f", "f*", "S", "s", "B", "B*", "b", "b*", "n", "F"];

    fn square() -> Path {
        PathBuilder::from_rect(Rect::from_xywh(0.0, 0.0, 1.0, 1.0).unwrap())
    }

    fn open_path() -> Path {
        let mut builder = PathBuilder::new();
        builder.move_to(0.0, 0.0);
        builder.line_to(10.0, 0.0);
        builder.line_to(10.0, 10.0);
        builder.finish().unwrap()
    }

    fn arcs() -> LineJoin {
        LineJoin::Arcs {
            limit: 4.0,
            gap: GapJoin::Bevel,
        }
    }

    fn draw_with(sc: &mut SerializeContext, path: &Path, style: &Style) -> Vec<String> {
        let mut builder = ContentBuilder::new();
        builder
            .draw_path(path, style, Transform::identity(), sc)
            .unwrap();
        lines(&builder.finish().content)
    }

    fn draw(path: &Path, style: &Style) -> Vec<String> {
        draw_with(&mut serialize_context(), path, style)
    }

    fn paint_ops(lines: &[String]) -> Vec<String> {
        lines
            .iter()
            .filter(|l| PAINT_OPS.contains(&l.as_str()))
            .cloned()
            .collect()
    }

    fn position(lines: &[String], op: &str) -> usize {
        lines
            .iter()
            .position(|l| l.as_str() == op || l.ends_with(&format!(" {op}")))
            .unwrap()
    }

    #[test]
    fn fill_only() {
        let lines = draw(&square(), &Style::fill(RED));

        assert_eq!(paint_ops(&lines), vec!["f"]);
        assert_eq!(lines[0], "1 0 0 rg");
        assert_eq!(lines[1], "/g0 gs");
        assert_eq!(count_op(&lines, "gs"), 1);
        assert_eq!(count_op(&lines, "RG"), 0);
        assert_eq!(lines[2], "0 0 m");
    }

    #[test]
    fn fill_only_even_odd() {
        let style = Style {
            fill_rule: FillRule::EvenOdd,
            ..Style::fill(RED)
        };

        assert_eq!(paint_ops(&draw(&square(), &style)), vec!["f*"]);
    }

    #[test]
    fn fill_ignores_unsupported_join() {
        let style = Style {
            line_join: arcs(),
            ..Style::fill(RED)
        };

        assert_eq!(paint_ops(&draw(&square(), &style)), vec!["f"]);
    }

    #[test]
    fn fill_unpremultiplies() {
        let lines = draw(&square(), &Style::fill(Rgba::new(0, 0, 51, 51)));
        assert_eq!(lines[0], "0 0 1 rg");
    }

    #[test]
    fn nothing_to_draw() {
        let style = Style {
            stroke: BLUE,
            stroke_width: 0.0,
            ..Style::fill(Rgba::TRANSPARENT)
        };

        assert!(draw(&square(), &style).is_empty());
    }

    #[test]
    fn stroke_only_closed() {
        let lines = draw(&square(), &Style::stroke(BLUE, 2.0));

        assert_eq!(paint_ops(&lines), vec!["s"]);
        // Closing is expressed by the paint operator.
        assert_eq!(count_op(&lines, "h"), 0);

        let order = ["RG", "gs", "w", "J", "j", "M", "d", "m", "s"]
            .map(|op| position(&lines, op));
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{:?}", lines);

        assert!(lines.contains(&"0 0 1 RG".to_string()));
        assert!(lines.contains(&"0 J".to_string()));
        assert!(lines.contains(&"0 j".to_string()));
        assert!(lines.contains(&"4 M".to_string()));
        assert!(lines.contains(&"[] 0 d".to_string()));
    }

    #[test]
    fn stroke_only_open() {
        let lines = draw(&open_path(), &Style::stroke(BLUE, 2.0));
        assert_eq!(paint_ops(&lines), vec!["S"]);
    }

    #[test]
    fn stroke_ignores_fill_rule() {
        let style = Style {
            fill_rule: FillRule::EvenOdd,
            ..Style::stroke(BLUE, 2.0)
        };

        assert_eq!(paint_ops(&draw(&open_path(), &style)), vec!["S"]);
    }

    #[test]
    fn stroke_attributes() {
        let style = Style {
            line_cap: LineCap::Round,
            line_join: LineJoin::Bevel,
            dash: Dash::new(0.0, vec![1.0, 2.0]),
            ..Style::stroke(BLUE, 1.0)
        };
        let lines = draw(&open_path(), &style);

        assert!(lines.contains(&"1 J".to_string()));
        assert!(lines.contains(&"2 j".to_string()));
        // The miter limit only matters for miter joins.
        assert_eq!(count_op(&lines, "M"), 0);
        assert!(lines.iter().any(|l| l.starts_with("[2.83") && l.ends_with(" 0 d")));
    }

    #[test]
    fn fill_and_stroke_same_alpha() {
        let style = Style {
            stroke: BLUE,
            stroke_width: 1.0,
            ..Style::fill(RED)
        };

        let lines = draw(&square(), &style);
        assert_eq!(paint_ops(&lines), vec!["b"]);
        assert_eq!(count_op(&lines, "m"), 1);
        assert!(position(&lines, "rg") < position(&lines, "m"));
        assert!(position(&lines, "RG") < position(&lines, "m"));

        let lines = draw(&open_path(), &style);
        assert_eq!(paint_ops(&lines), vec!["B"]);
    }

    #[test]
    fn fill_and_stroke_even_odd() {
        let style = Style {
            stroke: BLUE,
            stroke_width: 1.0,
            fill_rule: FillRule::EvenOdd,
            ..Style::fill(RED)
        };

        assert_eq!(paint_ops(&draw(&square(), &style)), vec!["b*"]);
        assert_eq!(paint_ops(&draw(&open_path(), &style)), vec!["B*"]);
    }

    #[test]
    fn fill_and_stroke_different_alpha() {
        let style = Style {
            stroke: Rgba::new(0, 0, 128, 128),
            stroke_width: 1.0,
            ..Style::fill(RED)
        };

        let lines = draw(&square(), &style);
        assert_eq!(paint_ops(&lines), vec!["f", "s"]);
        assert_eq!(count_op(&lines, "m"), 2);
        assert_eq!(count_op(&lines, "gs"), 2);

        // Each pass sets its own state right before painting.
        let fill = position(&lines, "f");
        assert!(position(&lines, "rg") < fill);
        assert!(fill < position(&lines, "RG"));
        assert!(lines.contains(&"/g0 gs".to_string()));
        assert!(lines.contains(&"/g1 gs".to_string()));
    }

    #[test]
    fn arcs_join_is_outlined() {
        let style = Style {
            line_join: arcs(),
            ..Style::stroke(BLUE, 2.0)
        };

        let lines = draw(&square(), &style);
        assert_eq!(paint_ops(&lines), vec!["f"]);
        assert_eq!(lines[0], "0 0 1 rg");
        assert_eq!(count_op(&lines, "RG"), 0);
        assert_eq!(count_op(&lines, "w"), 0);
    }

    #[test]
    fn unbounded_miter_is_outlined() {
        let style = Style {
            line_join: LineJoin::miter(f32::NAN),
            fill_rule: FillRule::EvenOdd,
            ..Style::stroke(BLUE, 1.0)
        };

        assert_eq!(paint_ops(&draw(&open_path(), &style)), vec!["f*"]);
    }

    #[test]
    fn infinite_miter_is_outlined() {
        let style = Style {
            line_join: LineJoin::miter(f32::INFINITY),
            ..Style::stroke(BLUE, 1.0)
        };
        let lines = draw(&open_path(), &style);

        assert_eq!(paint_ops(&lines), vec!["f"]);
        assert_eq!(count_op(&lines, "M"), 0);
        assert_eq!(count_op(&lines, "RG"), 0);
    }

    #[test]
    fn miter_limit_is_at_least_one() {
        let style = Style {
            line_join: LineJoin::miter(0.5),
            ..Style::stroke(BLUE, 1.0)
        };
        let lines = draw(&open_path(), &style);

        assert_eq!(paint_ops(&lines), vec!["S"]);
        assert!(lines.contains(&"1 M".to_string()));
    }

    #[test]
    fn invalid_dash_is_ignored_when_stroking() {
        for array in [vec![0.0, 0.0], vec![1.0, -1.0]] {
            let style = Style {
                dash: Dash::new(0.0, array),
                ..Style::stroke(BLUE, 1.0)
            };
            let lines = draw(&open_path(), &style);

            assert_eq!(paint_ops(&lines), vec!["S"]);
            assert!(lines.contains(&"[] 0 d".to_string()), "{:?}", lines);
            assert_eq!(count_op(&lines, "d"), 1);
        }
    }

    #[test]
    fn outline_after_fill() {
        let style = Style {
            stroke: BLUE,
            stroke_width: 1.0,
            line_join: LineJoin::Miter {
                limit: 4.0,
                gap: GapJoin::Round,
            },
            ..Style::fill(RED)
        };

        let lines = draw(&square(), &style);
        assert_eq!(paint_ops(&lines), vec!["f", "f"]);
        assert_eq!(lines[0], "1 0 0 rg");

        let second_fill = lines.iter().rposition(|l| l == "f").unwrap();
        let blue = lines.iter().position(|l| l == "0 0 1 rg").unwrap();
        assert!(position(&lines, "f") < blue && blue < second_fill);
    }

    #[test]
    fn dashed_outline() {
        let solid = Style {
            line_join: arcs(),
            ..Style::stroke(BLUE, 0.5)
        };
        let dashed = Style {
            dash: Dash::new(0.0, vec![1.0, 1.0]),
            ..solid.clone()
        };

        let solid_lines = draw(&open_path(), &solid);
        let dashed_lines = draw(&open_path(), &dashed);

        assert_eq!(paint_ops(&dashed_lines), vec!["f"]);
        assert!(count_op(&dashed_lines, "m") > count_op(&solid_lines, "m"));
    }

    #[test]
    fn invalid_dash_is_ignored_when_outlining() {
        let style = Style {
            line_join: arcs(),
            dash: Dash::new(0.0, vec![0.0, 0.0]),
            ..Style::stroke(BLUE, 0.5)
        };

        assert_eq!(paint_ops(&draw(&open_path(), &style)), vec!["f"]);
    }

    #[test]
    fn alpha_states_are_shared() {
        let mut sc = serialize_context();
        let mut builder = ContentBuilder::new();
        for _ in 0..3 {
            builder
                .draw_path(&square(), &Style::fill(RED), Transform::identity(), &mut sc)
                .unwrap();
        }

        let lines = lines(&builder.finish().content);
        assert_eq!(count_op(&lines, "gs"), 3);
        assert!(lines
            .iter()
            .filter(|l| l.ends_with(" gs"))
            .all(|l| l == "/g0 gs"));
        assert_eq!(sc.chunk_container().ext_g_states.len(), 1);
    }

    #[test]
    fn unit_scale_is_applied_last() {
        let identity = draw_with(&mut serialize_context(), &square(), &Style::fill(RED));
        // 1 mm in points.
        assert!(identity
            .iter()
            .any(|l| l.starts_with("2.83") && l.ends_with(" 0 l")));

        let mut builder = ContentBuilder::new();
        builder
            .draw_path(
                &square(),
                &Style::fill(RED),
                Transform::from_translate(10.0, 0.0),
                &mut serialize_context(),
            )
            .unwrap();
        let translated = lines(&builder.finish().content);
        assert!(translated
            .iter()
            .any(|l| l.starts_with("28.3") && l.ends_with(" 0 m")));
    }

    #[test]
    fn invalid_geometry() {
        let mut builder = ContentBuilder::new();
        let result = builder.draw_path(
            &square(),
            &Style::fill(RED),
            Transform::from_translate(f32::MAX, 0.0),
            &mut serialize_context(),
        );

        assert!(matches!(result, Err(CanvasError::InvalidGeometry(_))));
    }

    #[test]
    fn transform_scope_is_balanced() {
        let mut builder = ContentBuilder::new();
        {
            let mut scope = builder.transform_scope(Transform::from_translate(1.0, 0.0));
            scope.set_fill_color(RED);
        }

        let lines = lines(&builder.finish().content);
        assert_eq!(lines.first().map(String::as_str), Some("q"));
        assert!(lines[1].ends_with(" cm"));
        assert_eq!(lines.last().map(String::as_str), Some("Q"));
    }

    #[test]
    fn transform_scope_closes_on_early_return() {
        fn failing(builder: &mut ContentBuilder) -> Result<(), ()> {
            let _scope = builder.transform_scope(Transform::identity());
            Err(())
        }

        let mut builder = ContentBuilder::new();
        assert!(failing(&mut builder).is_err());

        let lines = lines(&builder.finish().content);
        assert_eq!(count_op(&lines, "q"), 1);
        assert_eq!(count_op(&lines, "Q"), 1);
    }

    fn face() -> FontFace {
        FontFace::new(dejavu_sans(), "DejaVu Sans", 4.0, RED)
    }

    fn draw_text(sc: &mut SerializeContext, text: &Text) -> Vec<String> {
        let mut builder = ContentBuilder::new();
        builder
            .draw_text(text, Transform::from_translate(10.0, 20.0), sc)
            .unwrap();
        lines(&builder.finish().content)
    }

    #[test]
    fn text_per_word() {
        let text = Text::from_span(TextSpan::new(face(), "Hello big world"));
        let lines = draw_text(&mut serialize_context(), &text);

        assert_eq!(count_op(&lines, "BT"), 1);
        assert_eq!(count_op(&lines, "ET"), 1);
        assert_eq!(count_op(&lines, "Tj"), 3);
        assert_eq!(count_op(&lines, "Tm"), 3);
        assert!(lines.contains(&"0 Tr".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("/f0 ") && l.ends_with(" Tf")));
        assert!(lines.contains(&"1 0 0 rg".to_string()));

        // The first word starts at the origin of the span.
        assert!(lines.contains(&"1 0 0 1 0 0 Tm".to_string()));

        let order = ["rg", "gs", "q", "cm", "BT", "Tf", "Tr", "Tm", "Tj", "ET", "Q"]
            .map(|op| position(&lines, op));
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{:?}", lines);
    }

    #[test]
    fn word_spacing_moves_words() {
        let mut span = TextSpan::new(face(), "a b");
        let natural = draw_text(&mut serialize_context(), &Text::from_span(span.clone()));
        span.word_spacing = 5.0;
        let spaced = draw_text(&mut serialize_context(), &Text::from_span(span));

        let second_tm = |lines: &[String]| {
            lines
                .iter()
                .filter(|l| l.ends_with(" Tm"))
                .nth(1)
                .cloned()
                .unwrap()
        };

        assert_ne!(second_tm(&natural), second_tm(&spaced));
    }

    #[test]
    fn faux_bold_strokes_text() {
        let mut face = face();
        face.faux_bold = 0.1;
        let lines = draw_text(
            &mut serialize_context(),
            &Text::from_span(TextSpan::new(face, "bold")),
        );

        assert!(lines.contains(&"2 Tr".to_string()));
        assert!(lines.contains(&"1 0 0 RG".to_string()));
        assert!(position(&lines, "w") < position(&lines, "BT"));
    }

    #[test]
    fn glyph_spacing_is_ignored() {
        let mut span = TextSpan::new(face(), "spaced");
        span.glyph_spacing = 1.0;
        let lines = draw_text(&mut serialize_context(), &Text::from_span(span));

        assert_eq!(count_op(&lines, "Tj"), 1);
        assert_eq!(count_op(&lines, "Tc"), 0);
    }

    #[test]
    fn empty_span_is_skipped() {
        let lines = draw_text(
            &mut serialize_context(),
            &Text::from_span(TextSpan::new(face(), "")),
        );
        assert!(lines.is_empty());
    }

    #[test]
    fn styles_use_different_fonts() {
        let mut sc = serialize_context();
        let mut bold = face();
        bold.style = crate::text::FontStyle::BOLD;

        let mut text = Text::new();
        text.push(0.0, 0.0, TextSpan::new(face(), "regular"));
        text.push(5.0, 0.0, TextSpan::new(bold, "bold"));
        let lines = draw_text(&mut sc, &text);

        assert!(lines.iter().any(|l| l.starts_with("/f0 ")));
        assert!(lines.iter().any(|l| l.starts_with("/f1 ")));
    }

    #[test]
    fn decorations_are_filled() {
        let mut face = face();
        face.decoration = TextDecoration {
            underline: true,
            overline: false,
            strike_through: true,
        };
        let lines = draw_text(
            &mut serialize_context(),
            &Text::from_span(TextSpan::new(face, "line")),
        );

        assert_eq!(count_op(&lines, "f"), 2);
        assert!(position(&lines, "ET") < position(&lines, "f"));
    }

    #[cfg(feature = "raster-images")]
    #[test]
    fn same_image_is_embedded_once() {
        use crate::object::image::Image;
        use crate::tests::png;

        let data = png(4, 4, 255);
        let mut sc = serialize_context();
        let mut builder = ContentBuilder::new();

        builder.draw_image(
            Image::from_png(&data).unwrap(),
            Transform::identity(),
            &mut sc,
        );
        builder.draw_image(
            Image::from_png(&data).unwrap(),
            Transform::from_translate(20.0, 0.0),
            &mut sc,
        );

        let lines = lines(&builder.finish().content);
        assert_eq!(count_op(&lines, "Do"), 2);
        assert!(lines.iter().filter(|l| l.ends_with(" Do")).all(|l| l == "/x0 Do"));
        assert_eq!(sc.chunk_container().images.len(), 1);
    }
}
