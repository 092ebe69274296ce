//! Display list: a sequence of drawing instructions.
//!
//! [CSS 2.1 Appendix E](https://www.w3.org/TR/CSS2/zindex.html)
//!
//! The display list is the output of the painting phase. Instructions are
//! stateful (color, stroke, font, transform, clip and opacity persist until
//! changed), so a backend must replay them once each, in order.

use serde::{Deserialize, Serialize};

use crate::layout::box_model::Rect;
use crate::style::color::{CmykColor, RgbColor};

/// Whether a shape is outlined with the current stroke or filled with the
/// current color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Outline.
    Stroke,
    /// Fill.
    Fill,
}

/// Extra advance added after each glyph of a justified string.
///
/// [§ 7.3 text-align](https://www.w3.org/TR/css-text-3/#text-align-property)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JustificationInfo {
    /// Added after every space character.
    pub space_adjust: f32,
    /// Added after every other character.
    pub non_space_adjust: f32,
}

/// One segment of a path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verb", rename_all = "snake_case")]
pub enum PathSegment {
    /// Start a new subpath.
    MoveTo {
        /// X.
        x: f32,
        /// Y.
        y: f32,
    },
    /// Straight line from the current point.
    LineTo {
        /// X.
        x: f32,
        /// Y.
        y: f32,
    },
    /// Cubic Bézier from the current point.
    CubicTo {
        /// First control point X.
        x1: f32,
        /// First control point Y.
        y1: f32,
        /// Second control point X.
        x2: f32,
        /// Second control point Y.
        y2: f32,
        /// End point X.
        x: f32,
        /// End point Y.
        y: f32,
    },
    /// Close the current subpath.
    Close,
}

/// A positioned glyph of a [`DlItem::GlyphVector`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionedGlyph {
    /// The character drawn.
    pub ch: char,
    /// Offset from the run origin.
    pub x: f32,
    /// Offset from the run origin.
    pub y: f32,
}

/// A gradient stop: a position along the gradient line and its color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopPoint {
    /// Distance along the gradient line, in device units.
    pub dots: f32,
    /// Color at this stop.
    pub rgb: RgbColor,
}

/// [§ 3.1 Linear gradients](https://www.w3.org/TR/css-images-3/#linear-gradients)
///
/// Fills the rectangle at (`x`, `y`) with a gradient running from
/// (`x1`, `y1`) to (`x2`, `y2`), both relative to the rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearGradient {
    /// Rectangle left.
    pub x: f32,
    /// Rectangle top.
    pub y: f32,
    /// Rectangle width.
    pub width: f32,
    /// Rectangle height.
    pub height: f32,
    /// Gradient line start X.
    pub x1: f32,
    /// Gradient line start Y.
    pub y1: f32,
    /// Gradient line end X.
    pub x2: f32,
    /// Gradient line end Y.
    pub y2: f32,
    /// Stops in increasing `dots` order.
    pub stops: Vec<StopPoint>,
}

impl LinearGradient {
    /// Stop positions as fractions of the stop range, or `None` when the
    /// gradient has fewer than two stops or a zero-length range. Backends
    /// skip such gradients.
    #[must_use]
    pub fn fractions(&self) -> Option<Vec<f32>> {
        let (first, last) = match self.stops.as_slice() {
            [first, .., last] => (first.dots, last.dots),
            _ => return None,
        };
        let range = last - first;
        if range.abs() < f32::EPSILON {
            return None;
        }
        Some(self.stops.iter().map(|s| (s.dots - first) / range).collect())
    }

    /// Whether painting needs an alpha channel: a layer opacity below one,
    /// or any translucent stop.
    #[must_use]
    pub fn has_alpha(&self, opacity: f32) -> bool {
        (opacity - 1.0).abs() > f32::EPSILON || self.stops.iter().any(|s| s.rgb.a != u8::MAX)
    }

    /// Interior stop positions relative to the last stop, as used by
    /// stitching functions that join one sub-gradient per stop pair.
    #[must_use]
    pub fn bounds(&self) -> Vec<f32> {
        let Some(last) = self.stops.last().map(|s| s.dots) else {
            return Vec::new();
        };
        if self.stops.len() < 3 || last.abs() < f32::EPSILON {
            return Vec::new();
        }
        self.stops[1..self.stops.len() - 1]
            .iter()
            .map(|s| s.dots / last)
            .collect()
    }
}

/// A single drawing instruction.
///
/// [CSS 2.1 Appendix E.2 Painting order](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum DlItem {
    /// Line in the current color and stroke.
    Line {
        /// Start X.
        x1: f32,
        /// Start Y.
        y1: f32,
        /// End X.
        x2: f32,
        /// End Y.
        y2: f32,
    },
    /// Set the current color.
    RgbColor(RgbColor),
    /// Set the current color in device CMYK.
    CmykColor(CmykColor),
    /// Set the current stroke.
    Stroke {
        /// Line width.
        width: f32,
        /// Dash pattern; empty for solid.
        dash: Vec<f32>,
    },
    /// Set the opacity of everything drawn next. `1.0` restores plain
    /// source-over compositing.
    Opacity(f32),
    /// Translate the coordinate system.
    Translate {
        /// Horizontal offset.
        tx: f32,
        /// Vertical offset.
        ty: f32,
    },
    /// Stroke or fill a rectangle.
    Rectangle {
        /// Stroke or fill.
        op: Operation,
        /// The rectangle.
        rect: Rect,
    },
    /// Intersect the current clip with a rectangle.
    Clip(Rect),
    /// Replace the current clip; `None` removes clipping.
    SetClip(Option<Rect>),
    /// Stroke or fill the ellipse inscribed in a rectangle.
    Oval {
        /// Stroke or fill.
        op: Operation,
        /// Bounding rectangle.
        rect: Rect,
    },
    /// Stroke or fill an arbitrary path.
    DrawShape {
        /// Stroke or fill.
        op: Operation,
        /// Path segments.
        path: Vec<PathSegment>,
    },
    /// Draw a decoded image at its natural size.
    Image {
        /// Resource key.
        uri: String,
        /// Left.
        x: f32,
        /// Top.
        y: f32,
    },
    /// Set the current font.
    Font {
        /// Family name.
        family: String,
        /// Size in px.
        size: f32,
        /// Numeric weight.
        weight: u16,
        /// Italic or oblique.
        italic: bool,
    },
    /// Draw text at a baseline origin.
    String {
        /// The text.
        text: String,
        /// Baseline origin X.
        x: f32,
        /// Baseline origin Y.
        y: f32,
    },
    /// Draw justified text; glyph positions are adjusted by `info`.
    StringEx {
        /// The text.
        text: String,
        /// Baseline origin X.
        x: f32,
        /// Baseline origin Y.
        y: f32,
        /// Per-glyph extra advance.
        info: JustificationInfo,
    },
    /// Draw pre-positioned glyphs.
    GlyphVector {
        /// The glyphs.
        glyphs: Vec<PositionedGlyph>,
        /// Run origin X.
        x: f32,
        /// Run origin Y.
        y: f32,
    },
    /// Fill a rectangle with a linear gradient.
    LinearGradient(LinearGradient),
    /// Draw replaced content scaled into a rectangle.
    Replaced {
        /// Resource key, if the content has one.
        uri: Option<String>,
        /// Target rectangle.
        rect: Rect,
    },
    /// Document outline entry.
    Bookmark {
        /// Anchor name.
        name: String,
        /// Page the anchor lands on.
        page: usize,
        /// Offset of the anchor from the page content top.
        y: f32,
    },
    /// Link to a position inside the document.
    InternalLink {
        /// Clickable area.
        area: Rect,
        /// Fragment name without `#`.
        target: String,
        /// Page of the target box.
        page: usize,
        /// Offset of the target from the page content top.
        y: f32,
    },
    /// Link to an external resource.
    ExternalLink {
        /// Clickable area.
        area: Rect,
        /// Link target.
        uri: String,
    },
    /// Disable antialiasing.
    AntialiasOff,
    /// Restore the backend's default antialiasing.
    AntialiasDefault,
}

/// Drawing instructions in painting order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayList {
    items: Vec<DlItem>,
}

impl DisplayList {
    /// Create an empty display list.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append an instruction.
    pub fn push(&mut self, item: DlItem) {
        self.items.push(item);
    }

    /// Instructions in painting order.
    #[must_use]
    pub fn items(&self) -> &[DlItem] {
        &self.items
    }

    /// Number of instructions.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no instructions.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over instructions in order.
    pub fn iter(&self) -> std::slice::Iter<'_, DlItem> {
        self.items.iter()
    }
}

impl IntoIterator for DisplayList {
    type Item = DlItem;
    type IntoIter = std::vec::IntoIter<DlItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a DisplayList {
    type Item = &'a DlItem;
    type IntoIter = std::slice::Iter<'a, DlItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Extend<DlItem> for DisplayList {
    fn extend<T: IntoIterator<Item = DlItem>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(dots: &[f32]) -> LinearGradient {
        LinearGradient {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            x1: 0.0,
            y1: 0.0,
            x2: 10.0,
            y2: 0.0,
            stops: dots
                .iter()
                .map(|&dots| StopPoint {
                    dots,
                    rgb: RgbColor::BLACK,
                })
                .collect(),
        }
    }

    #[test]
    fn degenerate_gradients_have_no_fractions() {
        assert_eq!(gradient(&[]).fractions(), None);
        assert_eq!(gradient(&[5.0]).fractions(), None);
        assert_eq!(gradient(&[5.0, 5.0]).fractions(), None);
    }

    #[test]
    fn fractions_span_the_stop_range() {
        assert_eq!(gradient(&[0.0, 5.0, 20.0]).fractions(), Some(vec![0.0, 0.25, 1.0]));
        assert_eq!(gradient(&[10.0, 20.0]).fractions(), Some(vec![0.0, 1.0]));
    }

    #[test]
    fn bounds_are_interior_stops() {
        assert_eq!(gradient(&[0.0, 5.0, 10.0, 20.0]).bounds(), vec![0.25, 0.5]);
        assert!(gradient(&[0.0, 20.0]).bounds().is_empty());
    }

    #[test]
    fn alpha_from_opacity_or_stops() {
        let mut g = gradient(&[0.0, 1.0]);
        assert!(!g.has_alpha(1.0));
        assert!(g.has_alpha(0.5));
        g.stops[1].rgb.a = 128;
        assert!(g.has_alpha(1.0));
    }
}
