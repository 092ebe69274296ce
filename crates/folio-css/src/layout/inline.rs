//! CSS Inline Layout and Line Box Model.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "In an inline formatting context, boxes are laid out horizontally, one
//! after the other, beginning at the top of a containing block. Horizontal
//! margins, borders, and padding are respected between these boxes."
//!
//! [§ 10.8 Line height calculations: the 'line-height' and 'vertical-align' properties](https://www.w3.org/TR/CSS2/visudet.html#line-height)

use std::collections::HashMap;

use super::block;
use super::box_model::{Rect, Side};
use super::context::LayoutContext;
use super::state::LayoutState;
use super::tree::{BoxId, BoxKind, BoxTree, TextFragment};
use crate::error::LayoutResult;
use crate::paint::JustificationInfo;
use crate::style::properties::{CssName, IdentValue};
use crate::style::CalculatedStyle;

/// Font metrics interface for text measurement during layout.
///
/// [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
///
/// "CSS assumes that every font has font metrics that specify a
/// characteristic height above the baseline and a depth below it."
pub trait FontMetrics {
    /// Total advance width of `text` at `font_size`.
    fn text_width(&self, text: &str, font_size: f32) -> f32;

    /// Used value of `line-height: normal` at `font_size`.
    fn line_height(&self, font_size: f32) -> f32;

    /// Pen position of every character of `text`, starting at 0.
    fn glyph_advances(&self, text: &str, font_size: f32) -> Vec<f32> {
        let mut buf = [0u8; 4];
        let mut x = 0.0;
        text.chars()
            .map(|c| {
                let position = x;
                x += self.text_width(c.encode_utf8(&mut buf), font_size);
                position
            })
            .collect()
    }
}

/// Approximate font metrics using fixed ratios.
///
/// The average advance of Latin glyphs in a proportional font is about 0.6×
/// the font size; line height uses 1.2×, the upper end of the recommended
/// range for `line-height: normal`. Used when no font is available, and in
/// tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateFontMetrics;

impl FontMetrics for ApproximateFontMetrics {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        const CHAR_WIDTH_RATIO: f32 = 0.6;
        text.chars().count() as f32 * font_size * CHAR_WIDTH_RATIO
    }

    fn line_height(&self, font_size: f32) -> f32 {
        const LINE_HEIGHT_RATIO: f32 = 1.2;
        font_size * LINE_HEIGHT_RATIO
    }
}

/// Font parameters of one text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels.
    pub font_size: f32,
    /// Extra advance after every character.
    pub letter_spacing: f32,
    /// Height this run contributes to its line.
    pub line_height: f32,
}

impl TextStyle {
    /// Text parameters of `style`, with `normal` line height from `metrics`.
    #[must_use]
    pub fn from_style(style: &CalculatedStyle, metrics: &dyn FontMetrics) -> Self {
        let font_size = style.font_size();
        let line_height = if style.is_ident(CssName::LineHeight, &IdentValue::Normal) {
            metrics.line_height(font_size)
        } else {
            style.line_height()
        };
        Self {
            font_size,
            letter_spacing: style.letter_spacing(),
            line_height,
        }
    }

    fn width(&self, text: &str, metrics: &dyn FontMetrics) -> f32 {
        metrics.text_width(text, self.font_size) + self.letter_spacing * text.chars().count() as f32
    }
}

/// Pushes lines that would straddle a page bottom onto the next page.
///
/// Pages tile the document with a fixed content height, so the page a
/// document y falls on is a division.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBreaker {
    /// Document y of the line coordinate origin.
    pub origin_y: f32,
    /// Content height of every page.
    pub page_height: f32,
    /// Space reserved at the top of each page.
    pub extra_top: f32,
    /// Space reserved at the bottom of each page.
    pub extra_bottom: f32,
}

impl PageBreaker {
    /// Where a line of `height` wanting to start at `y` actually starts.
    #[must_use]
    pub fn adjust(&self, y: f32, height: f32) -> f32 {
        let usable = self.page_height - self.extra_top - self.extra_bottom;
        if self.page_height <= 0.0 || height > usable {
            return y;
        }
        let top = self.origin_y + y;
        let page_no = (top / self.page_height).floor().max(0.0);
        let next_top = (page_no + 1.0) * self.page_height;
        if top + height > next_top - self.extra_bottom {
            next_top + self.extra_top - self.origin_y
        } else {
            y
        }
    }
}

/// The content of a line fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentContent {
    /// A run of text.
    Text(String),
    /// A replaced element or inline-block, placed as one unit.
    Atomic,
}

/// A piece of one box placed on one line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFragment {
    /// The box this fragment belongs to.
    pub owner: BoxId,
    /// Position and size relative to the block's content origin.
    pub bounds: Rect,
    /// What the fragment draws.
    pub content: FragmentContent,
    /// A collapsed space separates this fragment from the previous one.
    pub gap_before: bool,
    /// Justification applied to the fragment's text.
    pub justification: Option<JustificationInfo>,
}

/// [§ 9.4.2](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
///
/// "The rectangular area that contains the boxes that form a line is called
/// a line box."
#[derive(Debug, Clone, PartialEq)]
pub struct LineBox {
    /// The bounding rectangle of this line box.
    pub bounds: Rect,
    /// Fragments laid out on this line.
    pub fragments: Vec<LineFragment>,
    /// Height of the line.
    pub line_height: f32,
    /// Baseline relative to the line top.
    pub baseline: f32,
}

/// Line breaker for one block container's inline content.
#[derive(Debug)]
pub struct InlineLayout {
    lines: Vec<LineBox>,
    current: Vec<LineFragment>,
    current_x: f32,
    current_y: f32,
    start_y: f32,
    available_width: f32,
    current_line_max_height: f32,
    text_align: IdentValue,
    pending_space: bool,
    space_width: f32,
    breaker: Option<PageBreaker>,
}

impl InlineLayout {
    /// Lines of `available_width` starting at `start_y`.
    #[must_use]
    pub const fn new(available_width: f32, start_y: f32, text_align: IdentValue) -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
            current_x: 0.0,
            current_y: start_y,
            start_y,
            available_width,
            current_line_max_height: 0.0,
            text_align,
            pending_space: false,
            space_width: 0.0,
            breaker: None,
        }
    }

    /// Move lines that would cross a page bottom to the next page.
    #[must_use]
    pub fn with_page_breaker(mut self, breaker: PageBreaker) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Add a run of collapsed text for `owner`.
    ///
    /// Leading and trailing white space become a pending space that
    /// separates this run from its neighbours on the same line.
    pub fn add_text(&mut self, owner: BoxId, text: &str, style: &TextStyle, metrics: &dyn FontMetrics) {
        if text.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }
        let space_width = style.width(" ", metrics);
        for (i, word) in text.split_whitespace().enumerate() {
            if i > 0 {
                self.pending_space = true;
            }
            if self.pending_space && !self.current.is_empty() {
                self.space_width = space_width;
            }
            let width = style.width(word, metrics);
            self.place_word(owner, word, width, style.line_height);
        }
        if text.ends_with(char::is_whitespace) {
            self.pending_space = true;
            self.space_width = space_width;
        }
    }

    fn gap(&self) -> f32 {
        if self.pending_space && !self.current.is_empty() {
            self.space_width
        } else {
            0.0
        }
    }

    fn place_word(&mut self, owner: BoxId, word: &str, width: f32, line_height: f32) {
        let mut gap = self.gap();
        if !self.current.is_empty() && self.current_x + gap + width > self.available_width {
            self.finish_line(false);
            gap = 0.0;
        }

        let x = self.current_x + gap;
        let merged = match self.current.last_mut() {
            Some(last) if last.owner == owner && (last.bounds.right() - self.current_x).abs() < f32::EPSILON => {
                if let FragmentContent::Text(text) = &mut last.content {
                    if gap > 0.0 {
                        text.push(' ');
                    }
                    text.push_str(word);
                    last.bounds.width = x + width - last.bounds.x;
                    true
                } else {
                    false
                }
            }
            _ => false,
        };
        if !merged {
            self.current.push(LineFragment {
                owner,
                bounds: Rect::new(x, self.current_y, width, line_height),
                content: FragmentContent::Text(word.to_string()),
                gap_before: gap > 0.0,
                justification: None,
            });
        }

        self.current_x = x + width;
        self.current_line_max_height = self.current_line_max_height.max(line_height);
        self.pending_space = false;
    }

    /// Place an atomic inline of the given margin-box size.
    pub fn add_atomic(&mut self, owner: BoxId, width: f32, height: f32) {
        let mut gap = self.gap();
        if !self.current.is_empty() && self.current_x + gap + width > self.available_width {
            self.finish_line(false);
            gap = 0.0;
        }
        self.current.push(LineFragment {
            owner,
            bounds: Rect::new(self.current_x + gap, self.current_y, width, height),
            content: FragmentContent::Atomic,
            gap_before: gap > 0.0,
            justification: None,
        });
        self.current_x += gap + width;
        self.current_line_max_height = self.current_line_max_height.max(height);
        self.pending_space = false;
    }

    /// Advance the pen by an inline box's horizontal margin, border and
    /// padding.
    pub fn advance(&mut self, dx: f32) {
        self.current_x += dx;
    }

    /// [§ 16.2 Alignment: the 'text-align' property](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
    ///
    /// Close the current line. The last line of a block is never justified.
    pub fn finish_line(&mut self, is_last: bool) {
        if self.current.is_empty() {
            self.current_x = 0.0;
            return;
        }
        let height = self.current_line_max_height;
        let y = self
            .breaker
            .map_or(self.current_y, |b| b.adjust(self.current_y, height));
        let mut fragments = std::mem::take(&mut self.current);
        let used = self.current_x;
        let extra = (self.available_width - used).max(0.0);

        match self.text_align {
            IdentValue::Right => shift(&mut fragments, extra),
            IdentValue::Center => shift(&mut fragments, extra / 2.0),
            IdentValue::Justify if !is_last => justify(&mut fragments, extra),
            _ => {}
        }

        for fragment in &mut fragments {
            fragment.bounds.y = match fragment.content {
                FragmentContent::Text(_) => {
                    fragment.bounds.height = height;
                    y
                }
                FragmentContent::Atomic => y + height - fragment.bounds.height,
            };
        }

        let width = if matches!(self.text_align, IdentValue::Justify) && !is_last {
            self.available_width
        } else {
            used
        };
        self.lines.push(LineBox {
            bounds: Rect::new(0.0, y, width, height),
            fragments,
            line_height: height,
            baseline: height * 0.8,
        });

        self.current_y = y + height;
        self.current_x = 0.0;
        self.current_line_max_height = 0.0;
        self.pending_space = false;
    }

    /// Close the last line and return all lines.
    #[must_use]
    pub fn finish(mut self) -> (Vec<LineBox>, f32) {
        self.finish_line(true);
        let height = self.current_y - self.start_y;
        (self.lines, height)
    }

    /// Height consumed by completed lines, page shifts included.
    #[must_use]
    pub fn total_height(&self) -> f32 {
        self.current_y - self.start_y
    }
}

fn shift(fragments: &mut [LineFragment], dx: f32) {
    for fragment in fragments {
        fragment.bounds.x += dx;
    }
}

fn count_spaces(fragment: &LineFragment) -> usize {
    match &fragment.content {
        FragmentContent::Text(text) => text.chars().filter(|&c| c == ' ').count(),
        FragmentContent::Atomic => 0,
    }
}

/// Spread `extra` over the spaces of a line. Lines without spaces stay
/// left-aligned.
fn justify(fragments: &mut [LineFragment], extra: f32) {
    let gaps: usize = fragments
        .iter()
        .enumerate()
        .map(|(i, f)| count_spaces(f) + usize::from(i > 0 && f.gap_before))
        .sum();
    if gaps == 0 || extra <= 0.0 {
        return;
    }
    let adjust = extra / gaps as f32;
    let mut offset = 0.0;
    for (i, fragment) in fragments.iter_mut().enumerate() {
        if i > 0 && fragment.gap_before {
            offset += adjust;
        }
        fragment.bounds.x += offset;
        if let FragmentContent::Text(_) = fragment.content {
            let inner = count_spaces(fragment) as f32 * adjust;
            fragment.bounds.width += inner;
            offset += inner;
            fragment.justification = Some(JustificationInfo {
                space_adjust: adjust,
                non_space_adjust: 0.0,
            });
        }
    }
}

// --------------------------------------------------------------------------
// Inline formatting context over the box tree
// --------------------------------------------------------------------------

/// Lay out the inline-level children of `block` in lines of its content
/// width. Returns the height of the lines.
///
/// # Errors
///
/// Errors from laying out inline-blocks, and [`crate::LayoutError::Cancelled`].
pub fn layout_inline_children(tree: &mut BoxTree, ctx: &mut LayoutContext<'_>, block: BoxId) -> LayoutResult<f32> {
    let width = tree[block].content_width();
    let mut inline = InlineLayout::new(width, 0.0, tree[block].style.text_align());
    if ctx.page_breaks_allowed() {
        inline = inline.with_page_breaker(PageBreaker {
            origin_y: tree[block].abs_y + tree[block].ty,
            page_height: ctx.page_config().content_height(),
            extra_top: ctx.extra_space_top,
            extra_bottom: ctx.extra_space_bottom,
        });
    }

    for child in tree.children(block).to_vec() {
        collect(tree, ctx, child, &mut inline)?;
    }
    let (lines, height) = inline.finish();

    let mut fragments: HashMap<BoxId, Vec<LineFragment>> = HashMap::new();
    for fragment in lines.into_iter().flat_map(|line| line.fragments) {
        fragments.entry(fragment.owner).or_default().push(fragment);
    }
    let mut rects = HashMap::new();
    for &child in tree.children(block) {
        let _ = measure(tree, child, &fragments, &mut rects);
    }
    for child in tree.children(block).to_vec() {
        position(tree, child, (0.0, 0.0), &fragments, &rects)?;
    }
    Ok(height)
}

fn collect(tree: &mut BoxTree, ctx: &mut LayoutContext<'_>, id: BoxId, inline: &mut InlineLayout) -> LayoutResult<()> {
    ctx.checkpoint()?;
    tree[id].state.store(LayoutState::Flux);
    let pushed = block::enter_box(tree, ctx, id)?;
    let style = std::sync::Arc::clone(&tree[id].style);

    match tree[id].kind.clone() {
        BoxKind::Text { text, .. } => {
            inline.add_text(id, &text, &TextStyle::from_style(&style, ctx.metrics), ctx.metrics);
        }
        BoxKind::Inline { .. } => {
            let insets = tree.insets(id);
            let (left, right) = (insets.mbp(Side::Left), insets.mbp(Side::Right));
            tree[id].left_mbp = left;
            tree[id].right_mbp = right;
            inline.advance(left);
            tree[id].state.store(LayoutState::ChildrenFlux);
            for child in tree.children(id).to_vec() {
                collect(tree, ctx, child, inline)?;
            }
            inline.advance(right);
        }
        BoxKind::Replaced { width, height } => {
            size_replaced(tree, id, width, height);
            inline.add_atomic(id, tree[id].width(), tree[id].height);
        }
        BoxKind::Block => {
            block::layout_block(tree, ctx, id)?;
            inline.add_atomic(id, tree[id].width(), tree[id].height);
        }
    }

    if pushed {
        let _ = ctx.pop_layer();
    }
    tree[id].state.store(LayoutState::Done);
    Ok(())
}

/// [§ 10.3.2 Inline, replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-width)
///
/// Specified sizes win; a single specified dimension scales the other by
/// the intrinsic ratio.
pub(crate) fn size_replaced(tree: &mut BoxTree, id: BoxId, intrinsic_width: f32, intrinsic_height: f32) {
    let cb_width = tree.containing_block_width(id);
    let style = &tree[id].style;
    let width = style.length_px(CssName::Width, cb_width).filter(|_| !style.is_auto(CssName::Width));
    let height = style.length_px(CssName::Height, 0.0).filter(|_| !style.is_auto_height());
    let ratio = if intrinsic_height > 0.0 {
        intrinsic_width / intrinsic_height
    } else {
        1.0
    };
    let (w, h) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, if ratio > 0.0 { w / ratio } else { intrinsic_height }),
        (None, Some(h)) => (h * ratio, h),
        (None, None) => (intrinsic_width, intrinsic_height),
    };

    let insets = tree.insets(id);
    let node = &mut tree[id];
    node.left_mbp = insets.mbp(Side::Left);
    node.right_mbp = insets.mbp(Side::Right);
    node.tx = node.left_mbp;
    node.ty = insets.mbp(Side::Top);
    node.set_content_width(w);
    node.height = h.max(0.0) + insets.mbp(Side::Top) + insets.mbp(Side::Bottom);
}

/// Block-relative bounds of `id`: the union of its fragments and those of
/// its descendants.
fn measure(
    tree: &BoxTree,
    id: BoxId,
    fragments: &HashMap<BoxId, Vec<LineFragment>>,
    rects: &mut HashMap<BoxId, Rect>,
) -> Option<Rect> {
    let mut rect: Option<Rect> = fragments
        .get(&id)
        .map(|own| own.iter().fold(Rect::default(), |acc, f| acc.union(&f.bounds)));
    for &child in tree.children(id) {
        if let Some(child_rect) = measure(tree, child, fragments, rects) {
            rect = Some(rect.map_or(child_rect, |r| r.union(&child_rect)));
        }
    }
    let mut rect = rect?;
    if matches!(tree[id].kind, BoxKind::Inline { .. }) {
        rect.x -= tree[id].left_mbp;
        rect.width += tree[id].left_mbp + tree[id].right_mbp;
    }
    let _ = rects.insert(id, rect);
    Some(rect)
}

fn position(
    tree: &mut BoxTree,
    id: BoxId,
    origin: (f32, f32),
    fragments: &HashMap<BoxId, Vec<LineFragment>>,
    rects: &HashMap<BoxId, Rect>,
) -> LayoutResult<()> {
    let rect = rects.get(&id).copied().unwrap_or_default();
    {
        let node = &mut tree[id];
        node.x = rect.x - origin.0;
        node.y = rect.y - origin.1;
    }

    if let BoxKind::Text { fragments: placed, .. } = &mut tree[id].kind {
        *placed = fragments
            .get(&id)
            .map(|own| own.iter().filter_map(|f| text_fragment(f, &rect)).collect())
            .unwrap_or_default();
        let node = &mut tree[id];
        node.set_content_width(rect.width);
        node.height = rect.height;
    } else if matches!(tree[id].kind, BoxKind::Inline { .. }) {
        let node = &mut tree[id];
        let content = rect.width - node.left_mbp - node.right_mbp;
        node.set_content_width(content);
        node.height = rect.height;
        node.tx = node.left_mbp;
        node.ty = 0.0;
        let child_origin = (rect.x + node.left_mbp, rect.y);
        for child in tree.children(id).to_vec() {
            position(tree, child, child_origin, fragments, rects)?;
        }
    }

    if tree[id].style.is_relative() {
        let _ = tree.position_relative(id)?;
    }
    Ok(())
}

fn text_fragment(fragment: &LineFragment, origin: &Rect) -> Option<TextFragment> {
    let FragmentContent::Text(text) = &fragment.content else {
        return None;
    };
    Some(TextFragment {
        text: text.clone(),
        x: fragment.bounds.x - origin.x,
        y: fragment.bounds.y - origin.y,
        width: fragment.bounds.width,
        height: fragment.bounds.height,
        baseline: fragment.bounds.height * 0.8,
        justification: fragment.justification,
    })
}
