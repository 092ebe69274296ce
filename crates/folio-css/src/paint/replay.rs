//! Backends consume display lists through [`DisplayListOutputDevice`].

use folio_common::{CancelToken, Cancelled};

use super::display_list::{
    DisplayList, DlItem, JustificationInfo, LinearGradient, Operation, PathSegment, PositionedGlyph,
};
use crate::layout::box_model::Rect;
use crate::style::color::{CmykColor, RgbColor};

/// A rendering backend.
///
/// One method per instruction kind. [`DisplayListOutputDevice::render`]
/// replays a list in order and polls for cancellation before every
/// instruction; backends override the drawing methods and keep their own
/// graphics state (color, stroke, font, transform, clip, opacity).
pub trait DisplayListOutputDevice {
    /// Draw a line with the current color and stroke.
    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32);

    /// Set the current color.
    fn set_rgb_color(&mut self, color: RgbColor);

    /// Set the current color from device CMYK. Converts to sRGB unless the
    /// backend keeps CMYK natively.
    fn set_cmyk_color(&mut self, color: CmykColor) {
        self.set_rgb_color(color.to_rgb());
    }

    /// Set the stroke used by outlines and lines.
    fn set_stroke(&mut self, width: f32, dash: &[f32]);

    /// Set the opacity applied to everything drawn next.
    fn set_opacity(&mut self, opacity: f32);

    /// Translate the coordinate system.
    fn translate(&mut self, tx: f32, ty: f32);

    /// Stroke or fill a rectangle.
    fn rectangle(&mut self, op: Operation, rect: Rect);

    /// Intersect the current clip with `rect`.
    fn clip(&mut self, rect: Rect);

    /// Replace the current clip.
    fn set_clip(&mut self, rect: Option<Rect>);

    /// Stroke or fill an ellipse.
    fn oval(&mut self, op: Operation, rect: Rect);

    /// Stroke or fill a path.
    fn draw_shape(&mut self, op: Operation, path: &[PathSegment]);

    /// Draw an image at its natural size.
    fn draw_image(&mut self, uri: &str, x: f32, y: f32);

    /// Set the current font.
    fn set_font(&mut self, family: &str, size: f32, weight: u16, italic: bool);

    /// Draw text at a baseline origin.
    fn draw_string(&mut self, text: &str, x: f32, y: f32);

    /// Draw justified text.
    ///
    /// # Errors
    ///
    /// [`Cancelled`] when cancelled while adjusting glyph positions.
    fn draw_string_ex(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        info: JustificationInfo,
        cancel: &CancelToken,
    ) -> Result<(), Cancelled>;

    /// Draw positioned glyphs.
    fn draw_glyph_vector(&mut self, glyphs: &[PositionedGlyph], x: f32, y: f32);

    /// Fill with a linear gradient. Degenerate gradients are skipped by
    /// [`DisplayListOutputDevice::render`] before this is called.
    fn fill_linear_gradient(&mut self, gradient: &LinearGradient, fractions: &[f32]);

    /// Draw replaced content scaled into `rect`.
    fn draw_replaced(&mut self, uri: Option<&str>, rect: Rect);

    /// Record an outline entry. No-op for backends without outlines.
    fn bookmark(&mut self, _name: &str, _page: usize, _y: f32) {}

    /// Record an internal link. No-op for backends without links.
    fn internal_link(&mut self, _area: Rect, _target: &str, _page: usize, _y: f32) {}

    /// Record an external link. No-op for backends without links.
    fn external_link(&mut self, _area: Rect, _uri: &str) {}

    /// Toggle antialiasing; `false` disables it, `true` restores the default.
    fn set_antialias(&mut self, enabled: bool);

    /// Replay one instruction.
    ///
    /// # Errors
    ///
    /// [`Cancelled`] when cancelled inside a long instruction.
    fn replay(&mut self, item: &DlItem, cancel: &CancelToken) -> Result<(), Cancelled> {
        match item {
            DlItem::Line { x1, y1, x2, y2 } => self.draw_line(*x1, *y1, *x2, *y2),
            DlItem::RgbColor(color) => self.set_rgb_color(*color),
            DlItem::CmykColor(color) => self.set_cmyk_color(*color),
            DlItem::Stroke { width, dash } => self.set_stroke(*width, dash),
            DlItem::Opacity(opacity) => self.set_opacity(*opacity),
            DlItem::Translate { tx, ty } => self.translate(*tx, *ty),
            DlItem::Rectangle { op, rect } => self.rectangle(*op, *rect),
            DlItem::Clip(rect) => self.clip(*rect),
            DlItem::SetClip(rect) => self.set_clip(*rect),
            DlItem::Oval { op, rect } => self.oval(*op, *rect),
            DlItem::DrawShape { op, path } => self.draw_shape(*op, path),
            DlItem::Image { uri, x, y } => self.draw_image(uri, *x, *y),
            DlItem::Font {
                family,
                size,
                weight,
                italic,
            } => self.set_font(family, *size, *weight, *italic),
            DlItem::String { text, x, y } => self.draw_string(text, *x, *y),
            DlItem::StringEx { text, x, y, info } => self.draw_string_ex(text, *x, *y, *info, cancel)?,
            DlItem::GlyphVector { glyphs, x, y } => self.draw_glyph_vector(glyphs, *x, *y),
            DlItem::LinearGradient(gradient) => match gradient.fractions() {
                Some(fractions) => self.fill_linear_gradient(gradient, &fractions),
                None => log::debug!("skipping degenerate gradient with {} stops", gradient.stops.len()),
            },
            DlItem::Replaced { uri, rect } => self.draw_replaced(uri.as_deref(), *rect),
            DlItem::Bookmark { name, page, y } => self.bookmark(name, *page, *y),
            DlItem::InternalLink { area, target, page, y } => self.internal_link(*area, target, *page, *y),
            DlItem::ExternalLink { area, uri } => self.external_link(*area, uri),
            DlItem::AntialiasOff => self.set_antialias(false),
            DlItem::AntialiasDefault => self.set_antialias(true),
        }
        Ok(())
    }

    /// Replay every instruction of `list` once, in order.
    ///
    /// # Errors
    ///
    /// [`Cancelled`] when `cancel` fires; instructions before the
    /// checkpoint have been drawn, none after.
    fn render(&mut self, list: &DisplayList, cancel: &CancelToken) -> Result<(), Cancelled> {
        for item in list {
            cancel.checkpoint()?;
            self.replay(item, cancel)?;
        }
        Ok(())
    }
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\u{00A0}' | '\u{3000}')
}

/// Shift glyph pen positions for justified text.
///
/// `positions[i]` is the pen position of the `i`-th character of `text`.
/// Every glyph after the first moves right by the accumulated adjustment
/// of the characters before it: `info.space_adjust` for spaces (U+0020,
/// U+00A0, U+3000), `info.non_space_adjust` otherwise.
///
/// # Errors
///
/// [`Cancelled`] when `cancel` fires; positions already visited keep their
/// adjusted values.
pub fn adjust_glyph_positions(
    text: &str,
    info: JustificationInfo,
    positions: &mut [f32],
    cancel: &CancelToken,
) -> Result<(), Cancelled> {
    let mut adjust = 0.0;
    for (i, (c, position)) in text.chars().zip(positions.iter_mut()).enumerate() {
        cancel.checkpoint()?;
        if i != 0 {
            *position += adjust;
        }
        adjust += if is_space(c) {
            info.space_adjust
        } else {
            info.non_space_adjust
        };
    }
    Ok(())
}

/// A geometry-only backend: records every drawing instruction with its
/// device-space rectangle and the color and opacity in effect.
#[derive(Debug, Clone, Default)]
pub struct RecordingDevice {
    origin: (f32, f32),
    color: Option<RgbColor>,
    opacity: f32,
    clip: Option<Rect>,
    /// Drawn primitives, in order.
    pub ops: Vec<RecordedOp>,
}

/// One primitive drawn by a [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedOp {
    /// Instruction kind, e.g. `"fill_rect"`.
    pub kind: &'static str,
    /// Device-space bounds.
    pub bounds: Rect,
    /// Current color, if one was set.
    pub color: Option<RgbColor>,
    /// Current opacity.
    pub opacity: f32,
    /// Text drawn, for text instructions.
    pub text: Option<String>,
}

impl RecordingDevice {
    /// A device at the origin, fully opaque, with no color set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            opacity: 1.0,
            ..Self::default()
        }
    }

    /// The active clip in device space.
    #[must_use]
    pub const fn clip_rect(&self) -> Option<Rect> {
        self.clip
    }

    fn device(&self, rect: Rect) -> Rect {
        rect.translate(self.origin.0, self.origin.1)
    }

    fn record(&mut self, kind: &'static str, bounds: Rect, text: Option<&str>) {
        let bounds = self.device(bounds);
        self.ops.push(RecordedOp {
            kind,
            bounds,
            color: self.color,
            opacity: self.opacity,
            text: text.map(str::to_string),
        });
    }
}

impl DisplayListOutputDevice for RecordingDevice {
    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let bounds = Rect::new(x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs());
        self.record("line", bounds, None);
    }

    fn set_rgb_color(&mut self, color: RgbColor) {
        self.color = Some(color);
    }

    fn set_stroke(&mut self, _width: f32, _dash: &[f32]) {}

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.origin.0 += tx;
        self.origin.1 += ty;
    }

    fn rectangle(&mut self, op: Operation, rect: Rect) {
        let kind = match op {
            Operation::Fill => "fill_rect",
            Operation::Stroke => "stroke_rect",
        };
        self.record(kind, rect, None);
    }

    fn clip(&mut self, rect: Rect) {
        let rect = self.device(rect);
        self.clip = Some(self.clip.map_or(rect, |c| c.intersection(&rect).unwrap_or_default()));
    }

    fn set_clip(&mut self, rect: Option<Rect>) {
        self.clip = rect.map(|r| self.device(r));
    }

    fn oval(&mut self, op: Operation, rect: Rect) {
        let kind = match op {
            Operation::Fill => "fill_oval",
            Operation::Stroke => "stroke_oval",
        };
        self.record(kind, rect, None);
    }

    fn draw_shape(&mut self, op: Operation, path: &[PathSegment]) {
        let mut bounds: Option<Rect> = None;
        for segment in path {
            let (x, y) = match *segment {
                PathSegment::MoveTo { x, y } | PathSegment::LineTo { x, y } | PathSegment::CubicTo { x, y, .. } => {
                    (x, y)
                }
                PathSegment::Close => continue,
            };
            let point = Rect::new(x, y, 0.0, 0.0);
            bounds = Some(bounds.map_or(point, |b| {
                let left = b.x.min(x);
                let top = b.y.min(y);
                Rect::new(left, top, b.right().max(x) - left, b.bottom().max(y) - top)
            }));
        }
        let kind = match op {
            Operation::Fill => "fill_shape",
            Operation::Stroke => "stroke_shape",
        };
        self.record(kind, bounds.unwrap_or_default(), None);
    }

    fn draw_image(&mut self, uri: &str, x: f32, y: f32) {
        self.record("image", Rect::new(x, y, 0.0, 0.0), Some(uri));
    }

    fn set_font(&mut self, _family: &str, _size: f32, _weight: u16, _italic: bool) {}

    fn draw_string(&mut self, text: &str, x: f32, y: f32) {
        self.record("string", Rect::new(x, y, 0.0, 0.0), Some(text));
    }

    fn draw_string_ex(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        info: JustificationInfo,
        cancel: &CancelToken,
    ) -> Result<(), Cancelled> {
        let mut positions = vec![0.0; text.chars().count()];
        adjust_glyph_positions(text, info, &mut positions, cancel)?;
        let extent = positions.last().copied().unwrap_or_default();
        self.record("string_ex", Rect::new(x, y, extent, 0.0), Some(text));
        Ok(())
    }

    fn draw_glyph_vector(&mut self, glyphs: &[PositionedGlyph], x: f32, y: f32) {
        let text: String = glyphs.iter().map(|g| g.ch).collect();
        self.record("glyphs", Rect::new(x, y, 0.0, 0.0), Some(&text));
    }

    fn fill_linear_gradient(&mut self, gradient: &LinearGradient, _fractions: &[f32]) {
        let rect = Rect::new(gradient.x, gradient.y, gradient.width, gradient.height);
        self.record("gradient", rect, None);
    }

    fn draw_replaced(&mut self, uri: Option<&str>, rect: Rect) {
        self.record("replaced", rect, uri);
    }

    fn set_antialias(&mut self, _enabled: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjusts_after_each_character() {
        let info = JustificationInfo {
            space_adjust: 4.0,
            non_space_adjust: 1.0,
        };
        let mut positions = vec![0.0, 10.0, 20.0, 30.0];
        adjust_glyph_positions("a b\u{3000}", info, &mut positions, &CancelToken::new()).unwrap();
        // a(+1) ' '(+4) b(+1)
        assert_eq!(positions, vec![0.0, 11.0, 25.0, 36.0]);
    }

    #[test]
    fn nbsp_counts_as_space() {
        let info = JustificationInfo {
            space_adjust: 2.0,
            non_space_adjust: 0.0,
        };
        let mut positions = vec![0.0, 5.0, 10.0];
        adjust_glyph_positions("\u{00A0}\u{00A0}x", info, &mut positions, &CancelToken::new()).unwrap();
        assert_eq!(positions, vec![0.0, 7.0, 14.0]);
    }

    #[test]
    fn cancelled_adjustment_stops() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut positions = vec![0.0, 5.0];
        let info = JustificationInfo {
            space_adjust: 1.0,
            non_space_adjust: 1.0,
        };
        assert_eq!(adjust_glyph_positions("ab", info, &mut positions, &cancel), Err(Cancelled));
        assert_eq!(positions, vec![0.0, 5.0]);
    }

    #[test]
    fn recording_device_applies_translation() {
        let mut list = DisplayList::new();
        list.push(DlItem::RgbColor(RgbColor::opaque(255, 0, 0)));
        list.push(DlItem::Translate { tx: 10.0, ty: 20.0 });
        list.push(DlItem::Rectangle {
            op: Operation::Fill,
            rect: Rect::new(1.0, 2.0, 3.0, 4.0),
        });
        let mut device = RecordingDevice::new();
        device.render(&list, &CancelToken::new()).unwrap();
        assert_eq!(device.ops.len(), 1);
        assert_eq!(device.ops[0].bounds, Rect::new(11.0, 22.0, 3.0, 4.0));
        assert_eq!(device.ops[0].color, Some(RgbColor::opaque(255, 0, 0)));
    }
}
