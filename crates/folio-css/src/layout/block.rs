//! Block formatting and the document layout entry point.
//!
//! [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
//!
//! "In a block formatting context, boxes are laid out one after the other,
//! vertically, beginning at the top of a containing block. The vertical
//! distance between two sibling boxes is determined by the 'margin'
//! properties. Vertical margins between adjacent block-level boxes in a
//! block formatting context collapse."

#[cfg(feature = "layout-trace")]
use std::cell::Cell;
use std::sync::Arc;

use super::box_model::Side;
use super::context::LayoutContext;
use super::inline;
use super::layer::ZIndex;
use super::pagination;
use super::state::LayoutState;
use super::tree::{BoxId, BoxKind, BoxTree};
use crate::error::{LayoutError, LayoutResult};
use crate::style::properties::{CssName, IdentValue};

#[cfg(feature = "layout-trace")]
thread_local! {
    static LAYOUT_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
///
/// "When two or more margins collapse, the resulting margin width is the
/// maximum of the collapsing margins' widths. In the case of negative
/// margins, the maximum of the absolute values of the negative adjoining
/// margins is deducted from the maximum of the positive adjoining margins.
/// If there are no positive margins, the maximum of the absolute values
/// of the adjoining margins is deducted from zero."
#[must_use]
pub fn collapse_margins(a: f32, b: f32) -> f32 {
    if a >= 0.0 && b >= 0.0 {
        a.max(b)
    } else if a < 0.0 && b < 0.0 {
        a.min(b)
    } else {
        a + b
    }
}

/// Lay out the whole tree: create the root layer and first page, lay out
/// the root box at the origin with the page content width, then settle
/// document coordinates and paint bounds.
///
/// # Errors
///
/// [`LayoutError::InternalConsistency`] for a tree without a root, plus
/// anything [`layout_block`] reports.
pub fn layout_document(tree: &mut BoxTree, ctx: &mut LayoutContext<'_>) -> LayoutResult<()> {
    let Some(root) = tree.root() else {
        return Err(LayoutError::InternalConsistency {
            context: "document".to_string(),
            message: "box tree has no root".to_string(),
        });
    };
    log::debug!("layout: {} boxes", tree.len());

    tree.initial_width = ctx.page_config().content_width();
    let root_layer = tree.add_layer(root, None, ZIndex::Auto, false);
    tree[root].layer = Some(root_layer);
    ctx.root_layer = Some(root_layer);
    ctx.page_name = tree[root].style.page_name().map(str::to_string);
    let _ = tree[root_layer].add_page(ctx.page_config(), ctx.page_name.clone());

    tree[root].x = 0.0;
    tree[root].y = 0.0;
    layout_block(tree, ctx, root)?;

    let bottom = tree[root].abs_y + tree[root].height;
    if bottom > 0.0 {
        let _ = pagination::ensure_page_for(tree, ctx, root, (bottom - 0.01).max(0.0))?;
    }
    tree.calc_canvas_location(root);
    tree.calc_child_locations(root, &ctx.cancel)?;
    let _ = tree.calc_painting_info(root, false);

    log::debug!(
        "layout done: {} page(s), document height {bottom}",
        tree[root_layer].pages().len()
    );
    Ok(())
}

/// Register the box's element id and anchor name, create its layer when
/// its style calls for one, resolve its containing layer, and enter its
/// layer. Returns whether a layer was pushed on the context.
pub(crate) fn enter_box(tree: &mut BoxTree, ctx: &mut LayoutContext<'_>, id: BoxId) -> LayoutResult<bool> {
    if !tree[id].anonymous
        && tree[id].pseudo_element.is_none()
        && let Some(element) = tree[id].element.and_then(|e| ctx.dom.as_element(e))
    {
        let names: Vec<String> = ctx
            .namespace
            .element_id(element)
            .into_iter()
            .chain(ctx.namespace.anchor_name(element))
            .map(str::to_string)
            .collect();
        for name in names {
            if ctx.box_by_id(&name).is_none() {
                ctx.add_box_id(&name, id);
            }
        }
    }

    if tree[id].layer.is_none() && tree[id].style.establishes_layer() {
        let parent = ctx.current_layer().or(ctx.root_layer);
        let inline = matches!(tree[id].kind, BoxKind::Inline { .. });
        let layer = tree.add_layer(id, parent, tree[id].style.z_index(), inline);
        if let BoxKind::Inline { wrapped_content } = &tree[id].kind {
            let wrapped = wrapped_content.clone();
            tree[layer].wrap_content(wrapped);
        }
        tree[id].layer = Some(layer);
    }
    tree.init_containing_layer(ctx, id)?;

    match tree[id].layer {
        Some(layer) => {
            ctx.push_layer(layer);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
///
/// Lay out one block box. The parent must already have placed the box
/// (`x`, `y`) and computed its own document coordinates.
///
/// # Errors
///
/// [`LayoutError::InternalConsistency`] for broken tree links,
/// [`LayoutError::Cancelled`], and fatal style errors.
pub fn layout_block(tree: &mut BoxTree, ctx: &mut LayoutContext<'_>, id: BoxId) -> LayoutResult<()> {
    #[cfg(feature = "layout-trace")]
    let _depth = {
        let depth = LAYOUT_DEPTH.with(|d| {
            let current = d.get();
            d.set(current + 1);
            current
        });
        log::trace!(
            target: "folio::layout",
            "{:indent$}enter box #{} {} children={}",
            "",
            id.0,
            tree[id].kind.label(),
            tree.child_count(id),
            indent = depth * 2
        );
        // Guard struct decrements depth counter on all return paths.
        struct DepthGuard;
        impl Drop for DepthGuard {
            fn drop(&mut self) {
                LAYOUT_DEPTH.with(|d| d.set(d.get() - 1));
            }
        }
        DepthGuard
    };

    ctx.checkpoint()?;
    tree[id].state.store(LayoutState::Flux);
    tree[id].relative_offset = None;
    let pushed = enter_box(tree, ctx, id)?;

    // STEP 1: Width and horizontal insets.
    calculate_block_width(tree, id);
    tree.calc_canvas_location(id);

    // STEP 2: Children.
    tree[id].state.store(LayoutState::ChildrenFlux);
    let mut absolute = Vec::new();
    let content_height = if tree.child_count(id) == 0 {
        0.0
    } else if tree.children(id).iter().all(|&c| tree[c].is_inline_level()) {
        inline::layout_inline_children(tree, ctx, id)?
    } else {
        layout_block_children(tree, ctx, id, &mut absolute)?
    };

    // STEP 3: Height.
    calculate_block_height(tree, id, content_height);

    // STEP 4: Absolutely positioned children, now that this box has a size.
    for (child, static_y) in absolute {
        layout_absolute_child(tree, ctx, id, child, static_y)?;
    }

    // STEP 5: Relative offset, applied after normal flow.
    if tree[id].style.is_relative() {
        let _ = tree.position_relative(id)?;
    }

    if pushed {
        let _ = ctx.pop_layer();
    }
    tree[id].state.store(LayoutState::Done);

    #[cfg(feature = "layout-trace")]
    log::trace!(
        target: "folio::layout",
        "exit box #{} at ({}, {}) {}x{}",
        id.0,
        tree[id].abs_x,
        tree[id].abs_y,
        tree[id].width(),
        tree[id].height
    );
    Ok(())
}

/// [§ 10.3.3](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
///
/// "'margin-left' + 'border-left-width' + 'padding-left' + 'width' +
/// 'padding-right' + 'border-right-width' + 'margin-right' = width of
/// containing block"
///
/// Auto width fills the containing block. With an explicit width, `auto`
/// left and right margins center the box.
fn calculate_block_width(tree: &mut BoxTree, id: BoxId) {
    let cb_width = tree.containing_block_width(id);
    let style = Arc::clone(&tree[id].style);
    let insets = tree.insets(id);
    let frame = insets.border.horizontal() + insets.padding.horizontal();

    let explicit = style.length_px(CssName::Width, cb_width);
    let tentative = match explicit {
        Some(width) => width,
        None if style.is_absolute() => {
            let left = style.length_px(CssName::Left, cb_width);
            let right = style.length_px(CssName::Right, cb_width);
            match (left, right) {
                (Some(l), Some(r)) => cb_width - l - r - insets.margin.horizontal() - frame,
                _ => cb_width - insets.margin.horizontal() - frame,
            }
        }
        None => cb_width - insets.margin.horizontal() - frame,
    };
    let mut width = tentative;

    // [§ 10.4 Minimum and maximum widths](https://www.w3.org/TR/CSS2/visudet.html#min-max-widths)
    if let Some(max) = style.length_px(CssName::MaxWidth, cb_width) {
        width = width.min(max);
    }
    if let Some(min) = style.length_px(CssName::MinWidth, cb_width) {
        width = width.max(min);
    }
    width = width.max(0.0);

    let clamped = (tentative - width).abs() > f32::EPSILON;
    let centers = style.is_auto(CssName::MarginLeft) && style.is_auto(CssName::MarginRight);
    if centers && (explicit.is_some() || clamped) && !style.is_absolute() {
        let side = ((cb_width - width - frame) / 2.0).max(0.0);
        tree.set_margin_left(id, side);
        tree.set_margin_right(id, side);
    }

    let insets = tree.insets(id);
    let node = &mut tree[id];
    node.set_content_width(width);
    node.left_mbp = insets.mbp(Side::Left);
    node.right_mbp = insets.mbp(Side::Right);
    node.tx = node.left_mbp;
    node.ty = insets.mbp(Side::Top);
}

/// [§ 10.6.3 Block-level non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#normal-block)
///
/// Auto height is the content extent; an explicit height is honoured, and
/// min/max heights clamp either.
fn calculate_block_height(tree: &mut BoxTree, id: BoxId, content_height: f32) {
    let style = Arc::clone(&tree[id].style);
    let cb_height = tree
        .containing_block(id)
        .filter(|&cb| !tree[cb].style.is_auto_height())
        .and_then(|cb| tree[cb].style.length_px(CssName::Height, 0.0))
        .unwrap_or(0.0);

    let mut height = style
        .length_px(CssName::Height, cb_height)
        .filter(|_| !style.is_auto_height())
        .unwrap_or(content_height);
    if let Some(max) = style.length_px(CssName::MaxHeight, cb_height) {
        height = height.min(max);
    }
    if let Some(min) = style.length_px(CssName::MinHeight, cb_height) {
        height = height.max(min);
    }

    let insets = tree.insets(id);
    tree[id].height = height.max(0.0) + insets.mbp(Side::Top) + insets.mbp(Side::Bottom);
}

/// A page break value that forces a break.
const fn is_forced_break(value: &IdentValue) -> bool {
    matches!(
        value,
        IdentValue::Always | IdentValue::Left | IdentValue::Right | IdentValue::Page | IdentValue::Recto | IdentValue::Verso
    )
}

/// Stack the block-level children of `id`. Absolutely positioned children
/// leave the flow and are returned with their static y. Returns the
/// content height.
fn layout_block_children(
    tree: &mut BoxTree,
    ctx: &mut LayoutContext<'_>,
    id: BoxId,
    absolute: &mut Vec<(BoxId, f32)>,
) -> LayoutResult<f32> {
    let mut y = 0.0;
    let mut prev_margin_bottom: Option<f32> = None;

    for child in tree.children(id).to_vec() {
        ctx.checkpoint()?;
        if tree[child].style.is_absolute() {
            absolute.push((child, y));
            continue;
        }

        // A block hoisted out of an inline paints in that inline's layer.
        let wrapper_layer = tree[child].wrapper.and_then(|w| tree[w].layer);
        if let Some(layer) = wrapper_layer {
            ctx.push_layer(layer);
        }

        // Adjacent sibling margins collapse; the previous sibling's bottom
        // margin is already inside its height.
        let style_margin = tree.style_margin(child);
        if let Some(prev) = prev_margin_bottom {
            let collapsed = collapse_margins(prev, style_margin.top);
            tree.set_margin_top(child, collapsed - prev);
        }

        tree[child].x = 0.0;
        tree[child].y = y;
        tree.calc_canvas_location(child);

        if ctx.page_breaks_allowed() {
            break_before(tree, ctx, child)?;
        }

        layout_flow_child(tree, ctx, child)?;

        // Soft break: keep an unbreakable box on one page when it fits.
        if pagination::crosses_page_break(tree, ctx, child)
            && tree[child].style.avoids_page_break_inside()
            && tree[child].height <= ctx.page_config().content_height() - ctx.extra_space_top - ctx.extra_space_bottom
            && !at_page_top(tree, ctx, child)
        {
            log::debug!("moving unbreakable box #{} to the next page", child.0);
            tree.reset(ctx, child)?;
            tree[child].y = y;
            tree.calc_canvas_location(child);
            let _ = pagination::force_page_break_before(tree, ctx, child, &IdentValue::Always, false)?;
            layout_flow_child(tree, ctx, child)?;
        }

        if ctx.page_breaks_allowed() {
            let after = tree[child].style.page_break_after();
            if is_forced_break(&after) {
                let _ = pagination::force_page_break_after(tree, ctx, child, &after)?;
            }
        }

        let (_, dy) = tree[child].relative_offset.unwrap_or_default();
        y = tree[child].y - dy + tree[child].height;
        prev_margin_bottom = Some(tree.margin(child).bottom);

        if wrapper_layer.is_some() {
            let _ = ctx.pop_layer();
        }
    }
    Ok(y)
}

fn layout_flow_child(tree: &mut BoxTree, ctx: &mut LayoutContext<'_>, child: BoxId) -> LayoutResult<()> {
    if let BoxKind::Replaced { width, height } = tree[child].kind {
        tree[child].state.store(LayoutState::Flux);
        let pushed = enter_box(tree, ctx, child)?;
        inline::size_replaced(tree, child, width, height);
        tree.calc_canvas_location(child);
        if pushed {
            let _ = ctx.pop_layer();
        }
        tree[child].state.store(LayoutState::Done);
        Ok(())
    } else {
        layout_block(tree, ctx, child)
    }
}

fn at_page_top(tree: &BoxTree, ctx: &LayoutContext<'_>, id: BoxId) -> bool {
    pagination::first_page(tree, ctx, id).is_some_and(|page| (page.top + ctx.extra_space_top - tree[id].abs_y).abs() < 0.01)
}

/// Apply `page-break-before` and named page changes to `child`.
fn break_before(tree: &mut BoxTree, ctx: &mut LayoutContext<'_>, child: BoxId) -> LayoutResult<()> {
    let style = Arc::clone(&tree[child].style);
    let mut value = style.page_break_before();
    let name_change = style
        .page_name()
        .filter(|name| ctx.page_name.as_deref() != Some(*name))
        .map(str::to_string);
    let pending = name_change.is_some();
    if pending {
        ctx.pending_page_name = name_change;
        if !is_forced_break(&value) {
            value = IdentValue::Page;
        }
    }
    if is_forced_break(&value) {
        let delta = pagination::force_page_break_before(tree, ctx, child, &value, pending)?;
        if delta > 0.0 {
            tree.reset_top_margin(child);
        }
    }
    Ok(())
}

/// [§ 10.3.7 Absolutely positioned, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
///
/// Place `child` against its containing block: the padding box of the
/// nearest positioned ancestor, else the root. `auto` offsets keep the
/// static position.
fn layout_absolute_child(
    tree: &mut BoxTree,
    ctx: &mut LayoutContext<'_>,
    parent: BoxId,
    child: BoxId,
    static_y: f32,
) -> LayoutResult<()> {
    let mut cb = parent;
    while !tree[cb].style.is_positioned() {
        match tree[cb].parent {
            Some(p) => cb = p,
            None => break,
        }
    }
    tree[child].containing_block = Some(cb);

    let cb_padding = tree.painting_padding_edge(cb);
    let style = Arc::clone(&tree[child].style);
    let left = style.length_px(CssName::Left, cb_padding.width);
    let right = style.length_px(CssName::Right, cb_padding.width);
    let top = style.length_px(CssName::Top, cb_padding.height);
    let bottom = style.length_px(CssName::Bottom, cb_padding.height);

    let origin_x = tree[parent].abs_x + tree[parent].tx;
    let origin_y = tree[parent].abs_y + tree[parent].ty;
    tree[child].x = left.map_or(0.0, |l| cb_padding.x + l - origin_x);
    tree[child].y = top.map_or(static_y, |t| cb_padding.y + t - origin_y);
    tree.calc_canvas_location(child);

    layout_flow_child(tree, ctx, child)?;

    if left.is_none()
        && let Some(r) = right
    {
        tree[child].x = cb_padding.right() - r - tree[child].width() - origin_x;
    }
    if top.is_none()
        && let Some(b) = bottom
    {
        tree[child].y = cb_padding.bottom() - b - tree[child].height - origin_y;
    }
    tree.calc_canvas_location(child);
    tree.calc_child_locations(child, &ctx.cancel)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_margins() {
        assert!((collapse_margins(20.0, 10.0) - 20.0).abs() < f32::EPSILON);
        assert!((collapse_margins(-5.0, -15.0) + 15.0).abs() < f32::EPSILON);
        assert!((collapse_margins(20.0, -5.0) - 15.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_forced_break_values() {
        assert!(is_forced_break(&IdentValue::Always));
        assert!(is_forced_break(&IdentValue::Right));
        assert!(!is_forced_break(&IdentValue::Auto));
        assert!(!is_forced_break(&IdentValue::Avoid));
    }
}
