//! Software raster backend.
//!
//! Replays a display list into a `tiny-skia` pixmap. Text is rasterized
//! glyph by glyph with fontdue and composited as coverage pixmaps.
//!
//! ```text
//! Style → Layout → Paint → Render
//!                    ↓        ↓
//!              DisplayList → Pixels
//! ```
//!
//! The device knows nothing about CSS or the box tree; it keeps the graphics
//! state the instructions set (origin, color, stroke, font, clip, opacity,
//! antialiasing) and draws.

use std::path::Path;

use fontdue::Font;
use folio_common::{CancelToken, Cancelled};
use folio_css::paint::{
    adjust_glyph_positions, JustificationInfo, LinearGradient, Operation, PathSegment, PositionedGlyph,
};
use folio_css::style::RgbColor;
use folio_css::{DisplayList, DisplayListOutputDevice, PageConfig, Rect};
use image::RgbaImage;
use tiny_skia::{
    Color, FillRule, GradientStop, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Point, SpreadMode, Stroke,
    StrokeDash, Transform,
};

use crate::error::{RenderError, RenderResult};
use crate::fonts::FontSet;
use crate::images::ImageStore;

/// Fill used for replaced content without a decoded image.
const PLACEHOLDER: RgbColor = RgbColor::opaque(0xc0, 0xc0, 0xc0);

#[derive(Debug, Clone, Copy, PartialEq)]
struct FontSpec {
    size: f32,
    weight: u16,
    italic: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            size: folio_css::style::DEFAULT_FONT_SIZE_PX,
            weight: 400,
            italic: false,
        }
    }
}

/// A pixel surface driven by display-list instructions.
pub struct RasterDevice<'r> {
    pixmap: Pixmap,
    fonts: &'r FontSet,
    images: &'r ImageStore,
    origin: (f32, f32),
    color: RgbColor,
    stroke: Stroke,
    opacity: f32,
    /// Active clip in device space.
    clip: Option<Rect>,
    mask: Option<Mask>,
    antialias: bool,
    font: FontSpec,
}

impl<'r> RasterDevice<'r> {
    /// A white surface of `width` x `height` pixels.
    ///
    /// # Errors
    ///
    /// [`RenderError::InvalidSize`] for a zero dimension.
    pub fn new(width: u32, height: u32, fonts: &'r FontSet, images: &'r ImageStore) -> RenderResult<Self> {
        let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::InvalidSize { width, height })?;
        pixmap.fill(Color::WHITE);
        Ok(Self {
            pixmap,
            fonts,
            images,
            origin: (0.0, 0.0),
            color: RgbColor::BLACK,
            stroke: Stroke::default(),
            opacity: 1.0,
            clip: None,
            mask: None,
            antialias: true,
            font: FontSpec::default(),
        })
    }

    /// A surface the size of one page.
    ///
    /// # Errors
    ///
    /// [`RenderError::InvalidSize`] for a degenerate page.
    pub fn for_page(config: &PageConfig, fonts: &'r FontSet, images: &'r ImageStore) -> RenderResult<Self> {
        Self::new(config.width.ceil() as u32, config.height.ceil() as u32, fonts, images)
    }

    /// Surface width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Surface height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight-alpha color of the pixel at (`x`, `y`).
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<RgbColor> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(RgbColor {
            r: c.red(),
            g: c.green(),
            b: c.blue(),
            a: c.alpha(),
        })
    }

    /// The surface as a straight-alpha image.
    #[must_use]
    pub fn to_image(&self) -> RgbaImage {
        let mut image = RgbaImage::new(self.width(), self.height());
        for (x, y, out) in image.enumerate_pixels_mut() {
            if let Some(c) = self.pixel(x, y) {
                *out = image::Rgba([c.r, c.g, c.b, c.a]);
            }
        }
        image
    }

    /// Write the surface as a PNG file.
    ///
    /// # Errors
    ///
    /// [`RenderError::Image`] when encoding or writing fails.
    pub fn save_png(&self, path: &Path) -> RenderResult<()> {
        self.to_image()
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|source| RenderError::Image {
                uri: path.display().to_string(),
                source,
            })
    }

    fn transform(&self) -> Transform {
        Transform::from_translate(self.origin.0, self.origin.1)
    }

    fn paint(&self) -> Paint<'static> {
        let mut paint = Paint::default();
        let alpha = (f32::from(self.color.a) * self.opacity).round() as u8;
        paint.set_color_rgba8(self.color.r, self.color.g, self.color.b, alpha);
        paint.anti_alias = self.antialias;
        paint
    }

    fn pixmap_paint(&self) -> PixmapPaint {
        PixmapPaint {
            opacity: self.opacity,
            ..PixmapPaint::default()
        }
    }

    fn rebuild_mask(&mut self) {
        self.mask = self.clip.and_then(|clip| {
            let mut mask = Mask::new(self.pixmap.width(), self.pixmap.height())?;
            // An empty clip leaves the mask fully transparent.
            if let Some(rect) = to_sk_rect(clip) {
                mask.fill_path(&PathBuilder::from_rect(rect), FillRule::Winding, false, Transform::identity());
            }
            Some(mask)
        });
    }

    fn text_face(&self) -> Option<&'r Font> {
        let fonts = self.fonts;
        let face = fonts.select(self.font.weight, self.font.italic);
        if face.is_none() {
            let _ = folio_common::warning::warn_once("render", "text skipped: no font loaded");
        }
        face
    }

    /// Pen positions of each character of `text`, starting at 0.
    fn pen_positions(font: &Font, text: &str, size: f32) -> Vec<f32> {
        let mut x = 0.0;
        text.chars()
            .map(|ch| {
                let position = x;
                x += font.metrics(ch, size).advance_width;
                position
            })
            .collect()
    }

    /// Composite one glyph with its pen at `x` and baseline at `y`.
    #[allow(clippy::cast_possible_wrap)]
    fn draw_glyph(&mut self, font: &Font, ch: char, x: f32, y: f32) {
        if ch.is_control() {
            return;
        }
        let (metrics, coverage) = font.rasterize(ch, self.font.size);
        let Some(mut glyph) = Pixmap::new(metrics.width as u32, metrics.height as u32) else {
            return;
        };
        let (r, g, b, a) = (
            u16::from(self.color.r),
            u16::from(self.color.g),
            u16::from(self.color.b),
            u16::from(self.color.a),
        );
        for (px, &cov) in glyph.data_mut().chunks_exact_mut(4).zip(&coverage) {
            let alpha = u16::from(cov) * a / 255;
            px[0] = (r * alpha / 255) as u8;
            px[1] = (g * alpha / 255) as u8;
            px[2] = (b * alpha / 255) as u8;
            px[3] = alpha as u8;
        }
        let gx = (x + metrics.xmin as f32).round() as i32;
        let gy = (y - metrics.height as f32 - metrics.ymin as f32).round() as i32;
        let paint = self.pixmap_paint();
        let transform = self.transform();
        self.pixmap
            .draw_pixmap(gx, gy, glyph.as_ref(), &paint, transform, self.mask.as_ref());
    }

    fn draw_glyph_run(&mut self, font: &Font, text: &str, positions: &[f32], x: f32, y: f32) {
        for (ch, position) in text.chars().zip(positions) {
            self.draw_glyph(font, ch, x + position, y);
        }
    }
}

fn to_sk_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height)
}

fn build_path(segments: &[PathSegment]) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for segment in segments {
        match *segment {
            PathSegment::MoveTo { x, y } => builder.move_to(x, y),
            PathSegment::LineTo { x, y } => builder.line_to(x, y),
            PathSegment::CubicTo { x1, y1, x2, y2, x, y } => builder.cubic_to(x1, y1, x2, y2, x, y),
            PathSegment::Close => builder.close(),
        }
    }
    builder.finish()
}

impl DisplayListOutputDevice for RasterDevice<'_> {
    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let mut builder = PathBuilder::new();
        builder.move_to(x1, y1);
        builder.line_to(x2, y2);
        let Some(path) = builder.finish() else {
            return;
        };
        let paint = self.paint();
        let transform = self.transform();
        self.pixmap
            .stroke_path(&path, &paint, &self.stroke, transform, self.mask.as_ref());
    }

    fn set_rgb_color(&mut self, color: RgbColor) {
        self.color = color;
    }

    fn set_stroke(&mut self, width: f32, dash: &[f32]) {
        self.stroke = Stroke {
            width,
            dash: StrokeDash::new(dash.to_vec(), 0.0),
            ..Stroke::default()
        };
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.origin.0 += tx;
        self.origin.1 += ty;
    }

    fn rectangle(&mut self, op: Operation, rect: Rect) {
        let Some(rect) = to_sk_rect(rect) else {
            return;
        };
        let paint = self.paint();
        let transform = self.transform();
        match op {
            Operation::Fill => self.pixmap.fill_rect(rect, &paint, transform, self.mask.as_ref()),
            Operation::Stroke => self.pixmap.stroke_path(
                &PathBuilder::from_rect(rect),
                &paint,
                &self.stroke,
                transform,
                self.mask.as_ref(),
            ),
        }
    }

    fn clip(&mut self, rect: Rect) {
        let rect = rect.translate(self.origin.0, self.origin.1);
        self.clip = Some(self.clip.map_or(rect, |c| c.intersection(&rect).unwrap_or_default()));
        self.rebuild_mask();
    }

    fn set_clip(&mut self, rect: Option<Rect>) {
        self.clip = rect.map(|r| r.translate(self.origin.0, self.origin.1));
        self.rebuild_mask();
    }

    fn oval(&mut self, op: Operation, rect: Rect) {
        let Some(path) = to_sk_rect(rect).and_then(PathBuilder::from_oval) else {
            return;
        };
        let paint = self.paint();
        let transform = self.transform();
        match op {
            Operation::Fill => {
                self.pixmap
                    .fill_path(&path, &paint, FillRule::Winding, transform, self.mask.as_ref());
            }
            Operation::Stroke => {
                self.pixmap
                    .stroke_path(&path, &paint, &self.stroke, transform, self.mask.as_ref());
            }
        }
    }

    fn draw_shape(&mut self, op: Operation, path: &[PathSegment]) {
        let Some(path) = build_path(path) else {
            return;
        };
        let paint = self.paint();
        let transform = self.transform();
        match op {
            Operation::Fill => {
                self.pixmap
                    .fill_path(&path, &paint, FillRule::Winding, transform, self.mask.as_ref());
            }
            Operation::Stroke => {
                self.pixmap
                    .stroke_path(&path, &paint, &self.stroke, transform, self.mask.as_ref());
            }
        }
    }

    fn draw_image(&mut self, uri: &str, x: f32, y: f32) {
        let images = self.images;
        let Some(image) = images.get(uri) else {
            let _ = folio_common::warning::warn_once("render", &format!("image '{uri}' not loaded"));
            return;
        };
        let paint = self.pixmap_paint();
        let transform = self.transform().pre_translate(x, y);
        self.pixmap
            .draw_pixmap(0, 0, image.as_ref(), &paint, transform, self.mask.as_ref());
    }

    fn set_font(&mut self, _family: &str, size: f32, weight: u16, italic: bool) {
        self.font = FontSpec { size, weight, italic };
    }

    fn draw_string(&mut self, text: &str, x: f32, y: f32) {
        let Some(font) = self.text_face() else {
            return;
        };
        let positions = Self::pen_positions(font, text, self.font.size);
        self.draw_glyph_run(font, text, &positions, x, y);
    }

    fn draw_string_ex(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        info: JustificationInfo,
        cancel: &CancelToken,
    ) -> Result<(), Cancelled> {
        let Some(font) = self.text_face() else {
            return Ok(());
        };
        let mut positions = Self::pen_positions(font, text, self.font.size);
        adjust_glyph_positions(text, info, &mut positions, cancel)?;
        self.draw_glyph_run(font, text, &positions, x, y);
        Ok(())
    }

    fn draw_glyph_vector(&mut self, glyphs: &[PositionedGlyph], x: f32, y: f32) {
        let Some(font) = self.text_face() else {
            return;
        };
        for glyph in glyphs {
            self.draw_glyph(font, glyph.ch, x + glyph.x, y + glyph.y);
        }
    }

    fn fill_linear_gradient(&mut self, gradient: &LinearGradient, fractions: &[f32]) {
        let Some(rect) = tiny_skia::Rect::from_xywh(gradient.x, gradient.y, gradient.width, gradient.height) else {
            return;
        };
        let stops = gradient
            .stops
            .iter()
            .zip(fractions)
            .map(|(stop, &position)| {
                let alpha = (f32::from(stop.rgb.a) * self.opacity).round() as u8;
                GradientStop::new(position, Color::from_rgba8(stop.rgb.r, stop.rgb.g, stop.rgb.b, alpha))
            })
            .collect();
        let start = Point::from_xy(gradient.x + gradient.x1, gradient.y + gradient.y1);
        let end = Point::from_xy(gradient.x + gradient.x2, gradient.y + gradient.y2);
        let Some(shader) = tiny_skia::LinearGradient::new(start, end, stops, SpreadMode::Pad, Transform::identity())
        else {
            return;
        };
        let mut paint = Paint::default();
        paint.shader = shader;
        paint.anti_alias = self.antialias;
        let transform = self.transform();
        self.pixmap.fill_rect(rect, &paint, transform, self.mask.as_ref());
    }

    fn draw_replaced(&mut self, uri: Option<&str>, rect: Rect) {
        let images = self.images;
        match uri.and_then(|u| images.get(u)) {
            Some(image) if rect.width > 0.0 && rect.height > 0.0 => {
                let sx = rect.width / image.width() as f32;
                let sy = rect.height / image.height() as f32;
                let transform = self.transform().pre_translate(rect.x, rect.y).pre_scale(sx, sy);
                let paint = self.pixmap_paint();
                self.pixmap
                    .draw_pixmap(0, 0, image.as_ref(), &paint, transform, self.mask.as_ref());
            }
            _ => {
                let saved = self.color;
                self.color = PLACEHOLDER;
                self.rectangle(Operation::Fill, rect);
                self.color = saved;
            }
        }
    }

    fn set_antialias(&mut self, enabled: bool) {
        self.antialias = enabled;
    }
}

/// Replay one page's display list onto a fresh page-sized surface.
///
/// # Errors
///
/// [`RenderError::InvalidSize`] for a degenerate page and
/// [`RenderError::Cancelled`].
pub fn render_page(
    list: &DisplayList,
    config: &PageConfig,
    fonts: &FontSet,
    images: &ImageStore,
    cancel: &CancelToken,
) -> RenderResult<RgbaImage> {
    let mut device = RasterDevice::for_page(config, fonts, images)?;
    device.render(list, cancel)?;
    Ok(device.to_image())
}
