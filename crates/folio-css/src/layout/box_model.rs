//! Box model geometry.
//!
//! [CSS Box Model Module Level 3](https://www.w3.org/TR/css-box-3/)

use serde::{Deserialize, Serialize};

/// A rectangle positioned in 2D space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Horizontal position of the top-left corner.
    pub x: f32,
    /// Vertical position of the top-left corner.
    pub y: f32,
    /// Width of the rectangle. May be negative for edges shrunk past zero
    /// by negative margins.
    pub width: f32,
    /// Height of the rectangle.
    pub height: f32,
}

impl Rect {
    /// Construct a rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Half-open containment: the right and bottom edges are outside.
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// `self` contains every point of `other`.
    #[must_use]
    pub fn encloses(&self, other: &Self) -> bool {
        other.x >= self.x && other.y >= self.y && other.right() <= self.right() && other.bottom() <= self.bottom()
    }

    /// Smallest rectangle covering both. Empty rectangles are ignored.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    /// Overlap of both, or `None` when they do not intersect.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (right > x && bottom > y).then(|| Self::new(x, y, right - x, bottom - y))
    }

    /// Shift by `(dx, dy)`.
    #[must_use]
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Shrink every side by the matching inset. Negative insets grow the
    /// rectangle.
    #[must_use]
    pub fn inset(&self, edges: &RectPropertySet) -> Self {
        Self {
            x: self.x + edges.left,
            y: self.y + edges.top,
            width: self.width - edges.left - edges.right,
            height: self.height - edges.top - edges.bottom,
        }
    }

    /// Zero or negative area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Per-side sizes for margin, border, or padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RectPropertySet {
    /// Top edge size.
    pub top: f32,
    /// Right edge size.
    pub right: f32,
    /// Bottom edge size.
    pub bottom: f32,
    /// Left edge size.
    pub left: f32,
}

impl RectPropertySet {
    /// All four sides equal.
    #[must_use]
    pub const fn uniform(size: f32) -> Self {
        Self {
            top: size,
            right: size,
            bottom: size,
            left: size,
        }
    }

    /// Read one side.
    #[must_use]
    pub const fn side(&self, side: Side) -> f32 {
        match side {
            Side::Top => self.top,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
        }
    }

    /// Side-wise sum.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        Self {
            top: self.top + other.top,
            right: self.right + other.right,
            bottom: self.bottom + other.bottom,
            left: self.left + other.left,
        }
    }

    /// `left + right`.
    #[must_use]
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    /// `top + bottom`.
    #[must_use]
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// One side of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Top side.
    Top,
    /// Right side.
    Right,
    /// Bottom side.
    Bottom,
    /// Left side.
    Left,
}

impl Side {
    /// All sides in top, right, bottom, left order.
    pub const ALL: [Self; 4] = [Self::Top, Self::Right, Self::Bottom, Self::Left];
}

/// [§ 3 The CSS Box Model](https://www.w3.org/TR/css-box-3/#box-model)
///
/// The three inset layers of a box.
///
/// ```text
/// ┌──────────────── margin edge (outer rectangle) ───────────────┐
/// │   ┌──────────── border edge = margin edge - margin ──────┐   │
/// │   │   ┌──────── padding edge = border edge - border ─┐   │   │
/// │   │   │   ┌──── content edge = padding edge - padding│   │   │
/// │   │   │   │                                      │   │   │   │
/// │   │   │   └──────────────────────────────────────┘   │   │   │
/// │   │   └──────────────────────────────────────────────┘   │   │
/// │   └──────────────────────────────────────────────────────┘   │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// A negative margin inset puts the border edge *outside* the margin edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoxInsets {
    /// Margin sizes (may be negative).
    pub margin: RectPropertySet,
    /// Border widths.
    pub border: RectPropertySet,
    /// Padding sizes.
    pub padding: RectPropertySet,
}

impl BoxInsets {
    /// Sum of margin, border and padding on one side.
    #[must_use]
    pub const fn mbp(&self, side: Side) -> f32 {
        self.margin.side(side) + self.border.side(side) + self.padding.side(side)
    }

    /// [§ 3.3 Borders](https://www.w3.org/TR/css-box-3/#borders)
    #[must_use]
    pub fn border_edge(&self, margin_edge: &Rect) -> Rect {
        margin_edge.inset(&self.margin)
    }

    /// [§ 3.2 Padding](https://www.w3.org/TR/css-box-3/#paddings)
    #[must_use]
    pub fn padding_edge(&self, margin_edge: &Rect) -> Rect {
        margin_edge.inset(&self.margin.add(&self.border))
    }

    /// The content box.
    #[must_use]
    pub fn content_edge(&self, margin_edge: &Rect) -> Rect {
        margin_edge.inset(&self.margin.add(&self.border).add(&self.padding))
    }
}

/// Cached aggregate paint bounds of a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PaintingInfo {
    /// Bottom-right corner of the box's own margin edge, pushed outward by
    /// any descendant that extends further.
    pub outer_margin_corner: (f32, f32),
    /// Union of the painting clip edges over the painted subtree.
    pub aggregate_bounds: Rect,
}

impl PaintingInfo {
    /// Grow the corner to cover `other`'s corner.
    pub fn move_if_greater(&mut self, other: &Self) {
        self.outer_margin_corner.0 = self.outer_margin_corner.0.max(other.outer_margin_corner.0);
        self.outer_margin_corner.1 = self.outer_margin_corner.1.max(other.outer_margin_corner.1);
    }
}
