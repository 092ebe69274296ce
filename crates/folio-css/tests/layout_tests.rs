//! Integration tests for block and inline layout over whole documents.

use folio_css::layout::{BoxId, BoxKind, BoxTree};
use folio_css::{build_box_tree, layout_document, LayoutContext, LayoutOptions, MapStyleSource, PageConfig, StyleSession};
use folio_dom::{DomTree, ElementData, NodeId};

const PAGE: PageConfig = PageConfig::with_size(200.0, 300.0, 50.0);

/// Helper: parse nothing, just build `<html><body>` with a zero body margin.
fn document() -> (DomTree, MapStyleSource, NodeId) {
    let mut dom = DomTree::new();
    let html = dom.append_element(NodeId::ROOT, ElementData::new("html"));
    let body = dom.append_element(html, ElementData::new("body"));
    let mut styles = MapStyleSource::new();
    styles.push_css(body, None, &[("margin", "0")]);
    (dom, styles, body)
}

/// Helper: lay out `dom` on [`PAGE`] pages and return the tree with the
/// number of pages.
fn layout(dom: &DomTree, styles: &MapStyleSource) -> (BoxTree, usize) {
    let session = StyleSession::new().unwrap();
    let options = LayoutOptions {
        page: PAGE,
        page_breaks_allowed: true,
        print: true,
    };
    let mut ctx = LayoutContext::new(dom, styles, &session).with_options(options);
    let mut tree = build_box_tree(&ctx).unwrap();
    layout_document(&mut tree, &mut ctx).unwrap();
    let pages = tree[ctx.root_layer.unwrap()].pages().len();
    (tree, pages)
}

fn box_for(tree: &BoxTree, element: NodeId) -> BoxId {
    tree.element_boxes(tree.root().unwrap(), element)[0]
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

#[test]
fn test_over_tall_block_spans_pages() {
    let (mut dom, mut styles, body) = document();
    let tall = dom.append_element(body, ElementData::new("div"));
    styles.push_css(tall, None, &[("height", "500px")]);

    let (tree, pages) = layout(&dom, &styles);
    let root = tree.root().unwrap();
    assert!(close(tree[root].height, 500.0));
    assert_eq!(pages, 3);
}

#[test]
fn test_block_fills_page_content_width() {
    let (mut dom, mut styles, body) = document();
    let div = dom.append_element(body, ElementData::new("div"));
    styles.push_css(div, None, &[("padding", "5px"), ("height", "10px")]);

    let (tree, _) = layout(&dom, &styles);
    let id = box_for(&tree, div);
    assert!(close(tree[id].content_width(), 90.0));
    assert!(close(tree[id].width(), 100.0));
    assert!(close(tree[id].height, 20.0));
}

#[test]
fn test_sibling_margins_collapse() {
    // [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
    let (mut dom, mut styles, body) = document();
    let first = dom.append_element(body, ElementData::new("div"));
    let second = dom.append_element(body, ElementData::new("div"));
    styles.push_css(first, None, &[("height", "10px"), ("margin-bottom", "20px")]);
    styles.push_css(second, None, &[("height", "10px"), ("margin-top", "30px")]);

    let (tree, _) = layout(&dom, &styles);
    let a = tree.painting_border_edge(box_for(&tree, first));
    let b = tree.painting_border_edge(box_for(&tree, second));
    assert!(close(b.y - a.bottom(), 30.0));
}

#[test]
fn test_auto_margins_center_fixed_width() {
    let (mut dom, mut styles, body) = document();
    let div = dom.append_element(body, ElementData::new("div"));
    styles.push_css(div, None, &[("width", "40px"), ("height", "10px"), ("margin", "0 auto")]);

    let (tree, _) = layout(&dom, &styles);
    let edge = tree.painting_border_edge(box_for(&tree, div));
    assert!(close(edge.x, 30.0));
    assert!(close(edge.width, 40.0));
}

#[test]
fn test_relative_offset_applies_after_flow() {
    let (mut dom, mut styles, body) = document();
    let div = dom.append_element(body, ElementData::new("div"));
    let next = dom.append_element(body, ElementData::new("div"));
    styles.push_css(
        div,
        None,
        &[("height", "10px"), ("position", "relative"), ("top", "5px"), ("left", "7px")],
    );
    styles.push_css(next, None, &[("height", "10px")]);

    let (tree, _) = layout(&dom, &styles);
    let id = box_for(&tree, div);
    assert_eq!(tree[id].relative_offset, Some((7.0, 5.0)));
    assert!(close(tree[id].abs_x, 7.0));
    assert!(close(tree[id].abs_y, 5.0));
    // The following sibling sees the box at its flow position.
    assert!(close(tree[box_for(&tree, next)].abs_y, 10.0));
}

#[test]
fn test_absolute_child_leaves_flow() {
    let (mut dom, mut styles, body) = document();
    let container = dom.append_element(body, ElementData::new("div"));
    let abs = dom.append_element(container, ElementData::new("div"));
    let after = dom.append_element(container, ElementData::new("div"));
    styles.push_css(container, None, &[("position", "relative"), ("padding-top", "4px")]);
    styles.push_css(
        abs,
        None,
        &[("position", "absolute"), ("top", "10px"), ("left", "20px"), ("width", "30px"), ("height", "30px")],
    );
    styles.push_css(after, None, &[("height", "15px")]);

    let (tree, _) = layout(&dom, &styles);
    let abs_edge = tree.painting_border_edge(box_for(&tree, abs));
    assert!(close(abs_edge.x, 20.0));
    assert!(close(abs_edge.y, 10.0));
    assert!(close(abs_edge.width, 30.0));

    // The in-flow sibling starts at the top of the content area.
    assert!(close(tree[box_for(&tree, after)].abs_y, 4.0));
    assert!(close(tree[box_for(&tree, container)].height, 19.0));
}

#[test]
fn test_text_lines_never_straddle_pages() {
    let (mut dom, mut styles, body) = document();
    let p = dom.append_element(body, ElementData::new("div"));
    styles.push_css(p, None, &[("font-size", "10px"), ("line-height", "12px")]);
    let words: Vec<&str> = std::iter::repeat_n("word", 150).collect();
    let _ = dom.append_text(p, &words.join(" "));

    let (tree, pages) = layout(&dom, &styles);
    assert!(pages >= 2);

    let p_box = box_for(&tree, p);
    let text = tree.child(p_box, 0).unwrap();
    let BoxKind::Text { fragments, .. } = &tree[text].kind else {
        panic!("expected a text box");
    };
    assert!(fragments.len() > 20);
    let height = PAGE.content_height();
    for fragment in fragments {
        let top = tree[text].abs_y + fragment.y;
        let bottom = top + fragment.height;
        let page_of_top = (top / height).floor();
        let page_of_bottom = ((bottom - 0.01) / height).floor();
        assert!(
            close(page_of_top, page_of_bottom),
            "line at {top}..{bottom} crosses a page boundary"
        );
        assert!(fragment.width <= 100.0 + 0.01);
    }
}

#[test]
fn test_inline_block_sits_on_the_line() {
    let (mut dom, mut styles, body) = document();
    let _ = dom.append_text(body, "ab ");
    let chip = dom.append_element(body, ElementData::new("span"));
    styles.push_css(chip, None, &[("display", "inline-block"), ("width", "20px"), ("height", "8px")]);

    let (tree, _) = layout(&dom, &styles);
    let id = box_for(&tree, chip);
    assert!(matches!(tree[id].kind, BoxKind::Block));
    assert!(tree[id].is_inline_level());
    assert!(tree[id].abs_x > 0.0);
    assert!(close(tree[id].width(), 20.0));
}

#[test]
fn test_ids_and_anchors_are_indexed() {
    let (mut dom, styles, body) = document();
    let div = dom.append_element(body, ElementData::new("div").with_attr("id", "intro"));
    let _ = dom.append_text(div, "text");
    let anchor = dom.append_element(body, ElementData::new("a").with_attr("name", "here"));
    let _ = dom.append_text(anchor, "anchor");

    let session = StyleSession::new().unwrap();
    let mut ctx = LayoutContext::new(&dom, &styles, &session);
    let mut tree = build_box_tree(&ctx).unwrap();
    layout_document(&mut tree, &mut ctx).unwrap();

    assert_eq!(ctx.box_by_id("intro"), Some(box_for(&tree, div)));
    assert_eq!(ctx.box_by_id("here"), Some(box_for(&tree, anchor)));
    assert_eq!(ctx.box_by_id("missing"), None);
}

#[test]
fn test_find_returns_innermost_box() {
    let (mut dom, mut styles, body) = document();
    let outer = dom.append_element(body, ElementData::new("div"));
    let inner = dom.append_element(outer, ElementData::new("div"));
    styles.push_css(outer, None, &[("padding", "10px")]);
    styles.push_css(inner, None, &[("height", "20px")]);

    let (tree, _) = layout(&dom, &styles);
    let root = tree.root().unwrap();
    assert_eq!(tree.find(root, 50.0, 15.0), Some(box_for(&tree, inner)));
    // Inside the padding of `outer` but outside its content area.
    assert_eq!(tree.find(root, 5.0, 5.0), Some(box_for(&tree, body)));
}
