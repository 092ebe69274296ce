//! Page breaks.
//!
//! [CSS 2.1 § 13.3 Page breaks](https://www.w3.org/TR/CSS2/page.html#page-breaks)
//!
//! Pages belong to the root layer and tile the document vertically with no
//! gaps. A forced break moves a box (or grows its height) so that the next
//! content starts at the top of a later page, appending pages on demand.

use super::context::LayoutContext;
use super::layer::LayerId;
use super::page::{PageBox, PageConfig};
use super::tree::{BoxId, BoxTree};
use crate::error::{LayoutError, LayoutResult};
use crate::style::properties::IdentValue;

fn root_layer(ctx: &LayoutContext<'_>, id: BoxId) -> LayoutResult<LayerId> {
    ctx.root_layer
        .ok_or_else(|| LayoutError::consistency(id, None, "layout has no root layer"))
}

/// The root layer's page containing document y `y`.
#[must_use]
pub fn page_at<'t>(tree: &'t BoxTree, ctx: &LayoutContext<'_>, y: f32) -> Option<&'t PageBox> {
    let layer = &tree[ctx.root_layer?];
    layer.page_index_at(y).map(|i| &layer.pages()[i])
}

/// The page holding the top edge of `id`.
#[must_use]
pub fn first_page<'t>(tree: &'t BoxTree, ctx: &LayoutContext<'_>, id: BoxId) -> Option<&'t PageBox> {
    page_at(tree, ctx, tree[id].abs_y)
}

/// The page holding the last row of `id`.
#[must_use]
pub fn last_page_for<'t>(tree: &'t BoxTree, ctx: &LayoutContext<'_>, id: BoxId) -> Option<&'t PageBox> {
    let node = &tree[id];
    let bottom = (node.abs_y + node.height - 1.0).max(node.abs_y);
    page_at(tree, ctx, bottom)
}

/// Index of the page a document y would fall on, whether or not that page
/// exists yet.
fn page_number_for(pages: &[PageBox], config: &PageConfig, y: f32) -> usize {
    let Some(last) = pages.last() else {
        return page_offset(y, config);
    };
    if y < last.bottom {
        return pages
            .iter()
            .position(|p| y < p.bottom)
            .unwrap_or(last.page_no);
    }
    pages.len() + page_offset(y - last.bottom, config)
}

fn page_offset(y: f32, config: &PageConfig) -> usize {
    let height = config.content_height();
    if height <= 0.0 || y <= 0.0 {
        0
    } else {
        (y / height).floor() as usize
    }
}

/// Append pages to the root layer until `page_no` exists.
fn ensure_page_no(tree: &mut BoxTree, ctx: &LayoutContext<'_>, layer: LayerId, page_no: usize) -> LayoutResult<()> {
    while tree[layer].pages().len() <= page_no {
        ctx.checkpoint()?;
        let _ = tree[layer].add_page(ctx.page_config(), ctx.page_name.clone());
    }
    Ok(())
}

/// Append pages to the root layer until document y `y` is covered and
/// return the index of its page.
///
/// # Errors
///
/// [`LayoutError::InternalConsistency`] without a root layer or when the
/// page size is degenerate; [`LayoutError::Cancelled`].
pub fn ensure_page_for(tree: &mut BoxTree, ctx: &LayoutContext<'_>, id: BoxId, y: f32) -> LayoutResult<usize> {
    let layer = root_layer(ctx, id)?;
    let page_no = page_number_for(tree[layer].pages(), ctx.page_config(), y);
    ensure_page_no(tree, ctx, layer, page_no)?;
    if ctx.page_config().content_height() <= 0.0 {
        return Err(LayoutError::consistency(id, None, "page has no content height"));
    }
    Ok(page_no)
}

/// Whether landing on `page_no` violates a `left`/`right` break value.
fn parity_conflict(config: &PageConfig, break_value: &IdentValue, page_no: usize) -> bool {
    match break_value {
        IdentValue::Left | IdentValue::Verso => !config.is_left_page(page_no),
        IdentValue::Right | IdentValue::Recto => config.is_left_page(page_no),
        _ => false,
    }
}

/// Move `id` down to the top of the next suitable page.
///
/// A box already at a page top needs no break; if a named-page change is
/// pending and that page is the last one, it is replaced by a page under
/// the new name. When the landing page has the wrong parity for `left` or
/// `right`, one more page is skipped. Returns the vertical shift applied.
///
/// # Errors
///
/// [`LayoutError::InternalConsistency`] when the page for the box cannot be
/// found; [`LayoutError::Cancelled`].
pub fn force_page_break_before(
    tree: &mut BoxTree,
    ctx: &mut LayoutContext<'_>,
    id: BoxId,
    break_value: &IdentValue,
    pending_page_name: bool,
) -> LayoutResult<f32> {
    let layer = root_layer(ctx, id)?;
    let abs_y = tree[id].abs_y;
    let page_no = ensure_page_for(tree, ctx, id, abs_y)?;
    let Some(page) = tree[layer].pages().get(page_no).cloned() else {
        return Err(LayoutError::consistency(id, None, "no page for box top"));
    };

    let mut count = 1;
    #[allow(clippy::float_cmp)]
    let at_top = page.top == abs_y;
    if at_top {
        count -= 1;
        if pending_page_name && let Some(name) = ctx.pending_page_name.take() {
            if page_no + 1 == tree[layer].pages().len() {
                let _ = tree[layer].remove_last_page();
                let _ = tree[layer].add_page(ctx.page_config(), Some(name.clone()));
            } else {
                tree[layer].set_page_name(page_no, Some(name.clone()));
            }
            ctx.page_name = Some(name);
        }
    }
    if parity_conflict(ctx.page_config(), break_value, page_no + count) {
        count += 1;
    }
    if count == 0 {
        return Ok(0.0);
    }

    let target = page_no + count;
    if pending_page_name && let Some(name) = ctx.pending_page_name.take() {
        ctx.page_name = Some(name);
    }
    ensure_page_no(tree, ctx, layer, target)?;
    if ctx.page_name.is_some() {
        tree[layer].set_page_name(target, ctx.page_name.clone());
    }

    let delta = tree[layer].pages()[target].top + ctx.extra_space_top - abs_y;
    let node = &mut tree[id];
    node.y += delta;
    node.abs_y += delta;
    log::debug!("page break before box #{}: {count} page(s), delta {delta}", id.0);
    Ok(delta)
}

/// Grow `id` so that whatever follows it starts on the next suitable page.
///
/// # Errors
///
/// See [`force_page_break_before`].
pub fn force_page_break_after(
    tree: &mut BoxTree,
    ctx: &LayoutContext<'_>,
    id: BoxId,
    break_value: &IdentValue,
) -> LayoutResult<f32> {
    let layer = root_layer(ctx, id)?;
    let bottom = tree[id].abs_y + tree[id].height;
    let page_no = page_number_for(tree[layer].pages(), ctx.page_config(), bottom);
    let page_top = tree[layer]
        .pages()
        .get(page_no)
        .map_or(page_no as f32 * ctx.page_config().content_height(), |p| p.top);

    let mut count = 1;
    #[allow(clippy::float_cmp)]
    let at_top = page_top == bottom;
    if at_top {
        count -= 1;
    }
    if parity_conflict(ctx.page_config(), break_value, page_no + count) {
        count += 1;
    }
    if count == 0 {
        return Ok(0.0);
    }

    let target = page_no + count;
    ensure_page_no(tree, ctx, layer, target)?;
    let delta = tree[layer].pages()[target].top + ctx.extra_space_top - bottom;
    tree[id].height += delta;
    log::debug!("page break after box #{}: {count} page(s), delta {delta}", id.0);
    Ok(delta)
}

/// Whether the bottom of `id` reaches the bottom of the page its top is on,
/// less the trailing reserved space. Always false when page breaks are off.
#[must_use]
pub fn crosses_page_break(tree: &BoxTree, ctx: &LayoutContext<'_>, id: BoxId) -> bool {
    if !ctx.page_breaks_allowed() {
        return false;
    }
    let node = &tree[id];
    let Some(layer) = ctx.root_layer else {
        return false;
    };
    let pages = tree[layer].pages();
    let page_no = page_number_for(pages, ctx.page_config(), node.abs_y);
    let page_bottom = pages.get(page_no).map_or_else(
        || (page_no + 1) as f32 * ctx.page_config().content_height(),
        |p| p.bottom,
    );
    node.abs_y + node.height >= page_bottom - ctx.extra_space_bottom
}

/// Top and bottom of content found on one page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContentLimit {
    /// Highest content top on the page.
    pub top: Option<f32>,
    /// Lowest content bottom on the page.
    pub bottom: Option<f32>,
}

/// Per-page content extents of a subtree, filled by
/// [`BoxTree::analyze_page_breaks`].
#[derive(Debug, Clone, Default)]
pub struct ContentLimitContainer {
    initial_page_no: usize,
    limits: Vec<ContentLimit>,
}

impl ContentLimitContainer {
    /// A container whose first tracked page is `initial_page_no`.
    #[must_use]
    pub const fn new(initial_page_no: usize) -> Self {
        Self {
            initial_page_no,
            limits: Vec::new(),
        }
    }

    /// First page tracked.
    #[must_use]
    pub const fn initial_page_no(&self) -> usize {
        self.initial_page_no
    }

    /// Last page with any recorded content.
    #[must_use]
    pub fn last_page_no(&self) -> usize {
        self.initial_page_no + self.limits.len().saturating_sub(1)
    }

    /// Limits recorded for `page_no`.
    #[must_use]
    pub fn limits(&self, page_no: usize) -> Option<&ContentLimit> {
        page_no
            .checked_sub(self.initial_page_no)
            .and_then(|i| self.limits.get(i))
    }

    fn limit_at(&mut self, pages: &[PageBox], y: f32) -> Option<&mut ContentLimit> {
        let page_no = pages.iter().position(|p| p.contains_y(y))?;
        let index = page_no.checked_sub(self.initial_page_no)?;
        if self.limits.len() <= index {
            self.limits.resize(index + 1, ContentLimit::default());
        }
        self.limits.get_mut(index)
    }

    /// Record content starting at document y `y`.
    pub fn update_top(&mut self, pages: &[PageBox], y: f32) {
        if let Some(limit) = self.limit_at(pages, y) {
            limit.top = Some(limit.top.map_or(y, |top| top.min(y)));
        }
    }

    /// Record content ending at document y `y`.
    pub fn update_bottom(&mut self, pages: &[PageBox], y: f32) {
        let sample_y = pages
            .iter()
            .find(|p| y > p.top && y <= p.bottom)
            .map_or(y, |p| p.top);
        if let Some(limit) = self.limit_at(pages, sample_y) {
            limit.bottom = Some(limit.bottom.map_or(y, |bottom| bottom.max(y)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number_for_beyond_last_page() {
        let config = PageConfig::with_size(100.0, 120.0, 10.0);
        let mut pages = Vec::new();
        assert_eq!(page_number_for(&pages, &config, 50.0), 0);
        assert_eq!(page_number_for(&pages, &config, 250.0), 2);
        pages.push(PageBox::new(0, 0.0, &config, None));
        assert_eq!(page_number_for(&pages, &config, 99.0), 0);
        assert_eq!(page_number_for(&pages, &config, 100.0), 1);
    }

    #[test]
    fn test_parity_conflict() {
        let config = PageConfig::letter();
        assert!(parity_conflict(&config, &IdentValue::Right, 1));
        assert!(!parity_conflict(&config, &IdentValue::Right, 2));
        assert!(parity_conflict(&config, &IdentValue::Left, 0));
        assert!(!parity_conflict(&config, &IdentValue::Always, 1));
    }

    #[test]
    fn test_content_limits_span_pages() {
        let config = PageConfig::with_size(100.0, 120.0, 10.0);
        let pages: Vec<_> = (0..3)
            .map(|n| PageBox::new(n, n as f32 * 100.0, &config, None))
            .collect();
        let mut container = ContentLimitContainer::new(0);
        container.update_top(&pages, 20.0);
        container.update_top(&pages, 150.0);
        container.update_bottom(&pages, 180.0);
        container.update_bottom(&pages, 100.0);
        assert_eq!(container.limits(0).and_then(|l| l.top), Some(20.0));
        assert_eq!(container.limits(0).and_then(|l| l.bottom), Some(100.0));
        assert_eq!(container.limits(1).and_then(|l| l.bottom), Some(180.0));
        assert_eq!(container.last_page_no(), 1);
    }
}
