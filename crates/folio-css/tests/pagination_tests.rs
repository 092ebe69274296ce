//! Integration tests for forced and soft page breaks.
//!
//! [CSS 2.1 § 13.3 Page breaks](https://www.w3.org/TR/CSS2/page.html#page-breaks)

use folio_css::layout::pagination::{self, ContentLimitContainer};
use folio_css::layout::{BoxId, BoxTree, PageBox};
use folio_css::style::IdentValue;
use folio_css::{build_box_tree, layout_document, LayoutContext, LayoutOptions, MapStyleSource, PageConfig, StyleSession};
use folio_dom::{DomTree, ElementData, NodeId};

/// 100px wide, 200px tall content area; pages start at y = 0, 200, 400, ...
const PAGE: PageConfig = PageConfig::with_size(200.0, 300.0, 50.0);

fn options() -> LayoutOptions {
    LayoutOptions {
        page: PAGE,
        page_breaks_allowed: true,
        print: true,
    }
}

/// Helper: a body with zero margins holding one `div` per entry of
/// `blocks`, each styled by its declarations.
fn document(blocks: &[&[(&str, &str)]]) -> (DomTree, MapStyleSource, Vec<NodeId>) {
    let mut dom = DomTree::new();
    let html = dom.append_element(NodeId::ROOT, ElementData::new("html"));
    let body = dom.append_element(html, ElementData::new("body"));
    let mut styles = MapStyleSource::new();
    styles.push_css(body, None, &[("margin", "0")]);
    let divs = blocks
        .iter()
        .map(|declarations| {
            let div = dom.append_element(body, ElementData::new("div"));
            styles.push_css(div, None, declarations);
            div
        })
        .collect();
    (dom, styles, divs)
}

fn pages<'t>(tree: &'t BoxTree, ctx: &LayoutContext<'_>) -> &'t [PageBox] {
    tree[ctx.root_layer.unwrap()].pages()
}

fn box_for(tree: &BoxTree, element: NodeId) -> BoxId {
    tree.element_boxes(tree.root().unwrap(), element)[0]
}

#[test]
fn test_break_at_page_top_moves_nothing() {
    let (dom, styles, divs) = document(&[&[("height", "50px"), ("page-break-before", "always")]]);
    let session = StyleSession::new().unwrap();
    let mut ctx = LayoutContext::new(&dom, &styles, &session).with_options(options());
    let mut tree = build_box_tree(&ctx).unwrap();
    layout_document(&mut tree, &mut ctx).unwrap();

    let div = box_for(&tree, divs[0]);
    assert_eq!(tree[div].abs_y, 0.0);
    assert_eq!(pages(&tree, &ctx).len(), 1);

    let delta = pagination::force_page_break_before(&mut tree, &mut ctx, div, &IdentValue::Always, false).unwrap();
    assert_eq!(delta, 0.0);
}

#[test]
fn test_break_moves_block_to_next_page() {
    let (dom, styles, divs) = document(&[
        &[("height", "50px")],
        &[("height", "50px"), ("page-break-before", "always")],
    ]);
    let session = StyleSession::new().unwrap();
    let mut ctx = LayoutContext::new(&dom, &styles, &session).with_options(options());
    let mut tree = build_box_tree(&ctx).unwrap();
    layout_document(&mut tree, &mut ctx).unwrap();

    let second = box_for(&tree, divs[1]);
    assert_eq!(tree[second].abs_y, 200.0);
    assert_eq!(pages(&tree, &ctx).len(), 2);
    assert_eq!(pagination::first_page(&tree, &ctx, second).map(|p| p.page_no), Some(1));
}

#[test]
fn test_parity_conflict_breaks_twice() {
    // Page 0 is a right page; the next page is a left page, so a `right`
    // break from page 0 lands on page 2.
    let (dom, styles, divs) = document(&[
        &[("height", "50px")],
        &[("height", "50px"), ("page-break-before", "right")],
    ]);
    let session = StyleSession::new().unwrap();
    let mut ctx = LayoutContext::new(&dom, &styles, &session).with_options(options());
    let mut tree = build_box_tree(&ctx).unwrap();
    layout_document(&mut tree, &mut ctx).unwrap();

    let second = box_for(&tree, divs[1]);
    assert_eq!(tree[second].abs_y, 400.0);
    let all = pages(&tree, &ctx);
    assert_eq!(all.len(), 3);
    assert!(all[2].is_right_page());
}

#[test]
fn test_left_break_at_first_page_top_skips_one_page() {
    let (dom, styles, divs) = document(&[&[("height", "50px"), ("page-break-before", "left")]]);
    let session = StyleSession::new().unwrap();
    let mut ctx = LayoutContext::new(&dom, &styles, &session).with_options(options());
    let mut tree = build_box_tree(&ctx).unwrap();
    layout_document(&mut tree, &mut ctx).unwrap();

    let div = box_for(&tree, divs[0]);
    assert_eq!(tree[div].abs_y, 200.0);
    assert!(pages(&tree, &ctx)[1].is_left_page());
}

#[test]
fn test_break_after_grows_the_box() {
    let (dom, styles, divs) = document(&[
        &[("height", "50px"), ("page-break-after", "always")],
        &[("height", "50px")],
    ]);
    let session = StyleSession::new().unwrap();
    let mut ctx = LayoutContext::new(&dom, &styles, &session).with_options(options());
    let mut tree = build_box_tree(&ctx).unwrap();
    layout_document(&mut tree, &mut ctx).unwrap();

    let first = box_for(&tree, divs[0]);
    let second = box_for(&tree, divs[1]);
    assert_eq!(tree[first].height, 200.0);
    assert_eq!(tree[second].abs_y, 200.0);
}

#[test]
fn test_break_after_with_parity_conflict_skips_a_page() {
    // The page after page 0 is a left page: `right` needs two breaks,
    // `left` only one.
    for (value, expected) in [("right", 400.0), ("left", 200.0)] {
        let (dom, styles, divs) = document(&[
            &[("height", "50px"), ("page-break-after", value)],
            &[("height", "50px")],
        ]);
        let session = StyleSession::new().unwrap();
        let mut ctx = LayoutContext::new(&dom, &styles, &session).with_options(options());
        let mut tree = build_box_tree(&ctx).unwrap();
        layout_document(&mut tree, &mut ctx).unwrap();

        let first = box_for(&tree, divs[0]);
        let second = box_for(&tree, divs[1]);
        assert_eq!(tree[second].abs_y, expected, "page-break-after: {value}");
        assert_eq!(tree[first].height, expected);
        let landing = pagination::first_page(&tree, &ctx, second).unwrap();
        assert_eq!(landing.is_right_page(), value == "right");
    }
}

#[test]
fn test_reserved_page_space_comes_from_page_config() {
    let (dom, styles, divs) = document(&[
        &[("height", "50px")],
        &[("height", "50px"), ("page-break-before", "always")],
    ]);
    let mut page = PAGE;
    page.extra_space_top = 20.0;
    page.extra_space_bottom = 10.0;
    let session = StyleSession::new().unwrap();
    let mut ctx = LayoutContext::new(&dom, &styles, &session).with_options(LayoutOptions { page, ..options() });
    assert_eq!(ctx.extra_space_top, 20.0);
    assert_eq!(ctx.extra_space_bottom, 10.0);

    let mut tree = build_box_tree(&ctx).unwrap();
    layout_document(&mut tree, &mut ctx).unwrap();
    assert_eq!(tree[box_for(&tree, divs[1])].abs_y, 220.0);
}

#[test]
fn test_unbreakable_block_moves_whole() {
    let (dom, styles, divs) = document(&[
        &[("height", "150px")],
        &[("height", "100px"), ("page-break-inside", "avoid")],
    ]);
    let session = StyleSession::new().unwrap();
    let mut ctx = LayoutContext::new(&dom, &styles, &session).with_options(options());
    let mut tree = build_box_tree(&ctx).unwrap();
    layout_document(&mut tree, &mut ctx).unwrap();

    let second = box_for(&tree, divs[1]);
    assert_eq!(tree[second].abs_y, 200.0);
    assert!(!pagination::crosses_page_break(&tree, &ctx, second));
}

#[test]
fn test_breaks_ignored_when_disallowed() {
    let (dom, styles, divs) = document(&[
        &[("height", "50px")],
        &[("height", "50px"), ("page-break-before", "always")],
    ]);
    let session = StyleSession::new().unwrap();
    let mut opts = options();
    opts.page_breaks_allowed = false;
    let mut ctx = LayoutContext::new(&dom, &styles, &session).with_options(opts);
    let mut tree = build_box_tree(&ctx).unwrap();
    layout_document(&mut tree, &mut ctx).unwrap();

    let second = box_for(&tree, divs[1]);
    assert_eq!(tree[second].abs_y, 50.0);
    assert!(!pagination::crosses_page_break(&tree, &ctx, second));
}

// ---------------------------------------------------------------------------
// Named pages
//
// [CSS Paged Media § 7 Using named pages](https://www.w3.org/TR/css-page-3/#using-named-pages)
// ---------------------------------------------------------------------------

#[test]
fn test_named_page_starts_new_page() {
    let (dom, styles, divs) = document(&[
        &[("height", "50px")],
        &[("height", "50px"), ("page", "landscape")],
    ]);
    let session = StyleSession::new().unwrap();
    let mut ctx = LayoutContext::new(&dom, &styles, &session).with_options(options());
    let mut tree = build_box_tree(&ctx).unwrap();
    layout_document(&mut tree, &mut ctx).unwrap();

    let second = box_for(&tree, divs[1]);
    assert_eq!(tree[second].abs_y, 200.0);
    let all = pages(&tree, &ctx);
    assert_eq!(all[0].name, None);
    assert_eq!(all[1].name.as_deref(), Some("landscape"));
}

#[test]
fn test_named_page_at_top_renames_current_page() {
    let (dom, styles, divs) = document(&[&[("height", "50px"), ("page", "cover")]]);
    let session = StyleSession::new().unwrap();
    let mut ctx = LayoutContext::new(&dom, &styles, &session).with_options(options());
    let mut tree = build_box_tree(&ctx).unwrap();
    layout_document(&mut tree, &mut ctx).unwrap();

    let div = box_for(&tree, divs[0]);
    assert_eq!(tree[div].abs_y, 0.0);
    let all = pages(&tree, &ctx);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name.as_deref(), Some("cover"));
    assert_eq!(ctx.page_name.as_deref(), Some("cover"));
}

// ---------------------------------------------------------------------------
// Content limits
// ---------------------------------------------------------------------------

#[test]
fn test_content_limits_follow_laid_out_boxes() {
    let (dom, styles, _) = document(&[
        &[("height", "50px")],
        &[("height", "50px"), ("page-break-before", "always")],
    ]);
    let session = StyleSession::new().unwrap();
    let mut ctx = LayoutContext::new(&dom, &styles, &session).with_options(options());
    let mut tree = build_box_tree(&ctx).unwrap();
    layout_document(&mut tree, &mut ctx).unwrap();

    let mut container = ContentLimitContainer::new(0);
    let root = tree.root().unwrap();
    tree.analyze_page_breaks(root, pages(&tree, &ctx), &mut container);
    assert_eq!(container.limits(0).and_then(|l| l.top), Some(0.0));
    assert_eq!(container.limits(1).and_then(|l| l.top), Some(200.0));
    assert_eq!(container.last_page_no(), 1);
}
