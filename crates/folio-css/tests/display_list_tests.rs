//! Integration tests for painting and display-list replay.

use folio_common::{CancelToken, Cancelled};
use folio_css::layout::BoxTree;
use folio_css::paint::{
    JustificationInfo, LinearGradient, Operation, PathSegment, PositionedGlyph, RecordingDevice, StopPoint,
};
use folio_css::style::RgbColor;
use folio_css::{
    build_box_tree, layout_document, DisplayList, DisplayListOutputDevice, DlItem, LayoutContext, LayoutOptions,
    MapStyleSource, PageConfig, Painter, Rect, StyleSession,
};
use folio_dom::{DomTree, ElementData, NodeId};

const PAGE: PageConfig = PageConfig::with_size(200.0, 300.0, 50.0);

/// Helper: `<html><body>` with a zero body margin.
fn document() -> (DomTree, MapStyleSource, NodeId) {
    let mut dom = DomTree::new();
    let html = dom.append_element(NodeId::ROOT, ElementData::new("html"));
    let body = dom.append_element(html, ElementData::new("body"));
    let mut styles = MapStyleSource::new();
    styles.push_css(body, None, &[("margin", "0")]);
    (dom, styles, body)
}

/// Helper: lay out and paint, one display list per page.
fn paint(dom: &DomTree, styles: &MapStyleSource) -> Vec<DisplayList> {
    let session = StyleSession::new().unwrap();
    let options = LayoutOptions {
        page: PAGE,
        page_breaks_allowed: true,
        print: true,
    };
    let mut ctx = LayoutContext::new(dom, styles, &session).with_options(options);
    let mut tree: BoxTree = build_box_tree(&ctx).unwrap();
    layout_document(&mut tree, &mut ctx).unwrap();
    Painter::new(&tree, &ctx).paint().unwrap()
}

fn record(list: &DisplayList) -> RecordingDevice {
    let mut device = RecordingDevice::new();
    device.render(list, &CancelToken::new()).unwrap();
    device
}

const RED: RgbColor = RgbColor::opaque(255, 0, 0);
const GREEN: RgbColor = RgbColor::opaque(0, 128, 0);
const BLUE: RgbColor = RgbColor::opaque(0, 0, 255);

// ---------------------------------------------------------------------------
// Page framing
// ---------------------------------------------------------------------------

#[test]
fn test_one_list_per_page_with_page_transform() {
    let (mut dom, mut styles, body) = document();
    let tall = dom.append_element(body, ElementData::new("div"));
    styles.push_css(tall, None, &[("height", "450px")]);

    let lists = paint(&dom, &styles);
    assert_eq!(lists.len(), 3);

    for (page_no, list) in lists.iter().enumerate() {
        let items = list.items();
        // Canvas fill, page clip, then the page transform.
        assert_eq!(items[0], DlItem::RgbColor(RgbColor::WHITE));
        assert_eq!(
            items[1],
            DlItem::Rectangle {
                op: Operation::Fill,
                rect: Rect::new(0.0, 0.0, 200.0, 300.0)
            }
        );
        assert_eq!(items[2], DlItem::SetClip(Some(Rect::new(50.0, 50.0, 100.0, 200.0))));
        let page_top = page_no as f32 * 200.0;
        assert_eq!(
            items[3],
            DlItem::Translate {
                tx: 50.0,
                ty: 50.0 - page_top
            }
        );
        assert_eq!(items.last(), Some(&DlItem::SetClip(None)));
    }
}

#[test]
fn test_page_background_fills_canvas() {
    let (mut dom, mut styles, body) = document();
    let html = dom.document_element().unwrap();
    styles.push_css(html, None, &[("background-color", "#0000ff")]);
    let _ = dom.append_text(body, "x");

    let lists = paint(&dom, &styles);
    let device = record(&lists[0]);
    assert_eq!(device.ops[0].kind, "fill_rect");
    assert_eq!(device.ops[0].color, Some(BLUE));
    assert_eq!(device.ops[0].bounds, Rect::new(0.0, 0.0, 200.0, 300.0));
    // The root element's own background is the canvas; it is not painted twice.
    assert_eq!(
        device
            .ops
            .iter()
            .filter(|op| op.kind == "fill_rect" && op.color == Some(BLUE))
            .count(),
        1
    );
}

#[test]
fn test_block_on_second_page_lands_in_page_coordinates() {
    let (mut dom, mut styles, body) = document();
    let first = dom.append_element(body, ElementData::new("div"));
    let second = dom.append_element(body, ElementData::new("div"));
    styles.push_css(first, None, &[("height", "30px")]);
    styles.push_css(
        second,
        None,
        &[("height", "30px"), ("page-break-before", "always"), ("background-color", "red")],
    );

    let lists = paint(&dom, &styles);
    assert_eq!(lists.len(), 2);
    assert!(!record(&lists[0]).ops.iter().any(|op| op.color == Some(RED)));

    let device = record(&lists[1]);
    let fill = device
        .ops
        .iter()
        .find(|op| op.kind == "fill_rect" && op.color == Some(RED))
        .unwrap();
    assert_eq!(fill.bounds, Rect::new(50.0, 50.0, 100.0, 30.0));
}

// ---------------------------------------------------------------------------
// Painting order
//
// [CSS 2.1 Appendix E.2](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
// ---------------------------------------------------------------------------

#[test]
fn test_stacking_order() {
    let (mut dom, mut styles, body) = document();
    let flow = dom.append_element(body, ElementData::new("div"));
    let _ = dom.append_text(flow, "hi");
    let below = dom.append_element(body, ElementData::new("div"));
    let above = dom.append_element(body, ElementData::new("div"));
    styles.push_css(flow, None, &[("height", "20px"), ("background-color", "red")]);
    styles.push_css(
        below,
        None,
        &[("height", "20px"), ("position", "relative"), ("z-index", "-1"), ("background-color", "blue")],
    );
    styles.push_css(
        above,
        None,
        &[("height", "20px"), ("position", "relative"), ("z-index", "1"), ("background-color", "green")],
    );

    let lists = paint(&dom, &styles);
    let ops = record(&lists[0]).ops;
    let fill = |color: RgbColor| {
        ops.iter()
            .position(|op| op.kind == "fill_rect" && op.color == Some(color))
            .unwrap()
    };
    let (blue, red, green) = (fill(BLUE), fill(RED), fill(GREEN));
    let text = ops.iter().position(|op| op.text.as_deref() == Some("hi")).unwrap();
    assert!(blue < red, "negative z-index paints first");
    assert!(red < text, "backgrounds before text");
    assert!(text < green, "positive z-index paints last");
}

#[test]
fn test_opacity_is_pushed_and_restored() {
    let (mut dom, mut styles, body) = document();
    let faded = dom.append_element(body, ElementData::new("div"));
    styles.push_css(faded, None, &[("height", "10px"), ("opacity", "0.5"), ("background-color", "red")]);

    let lists = paint(&dom, &styles);
    let items = lists[0].items();
    let pushed = items.iter().position(|i| *i == DlItem::Opacity(0.5)).unwrap();
    let restored = items.iter().position(|i| *i == DlItem::Opacity(1.0)).unwrap();
    assert!(pushed < restored);

    let device = record(&lists[0]);
    let fill = device.ops.iter().find(|op| op.color == Some(RED)).unwrap();
    assert!((fill.opacity - 0.5).abs() < f32::EPSILON);
}

#[test]
fn test_borders_disable_antialiasing() {
    let (mut dom, mut styles, body) = document();
    let boxed = dom.append_element(body, ElementData::new("div"));
    styles.push_css(boxed, None, &[("height", "10px"), ("border", "2px dashed #ff0000")]);

    let lists = paint(&dom, &styles);
    let items = lists[0].items();
    let off = items.iter().position(|i| *i == DlItem::AntialiasOff).unwrap();
    let on = items.iter().position(|i| *i == DlItem::AntialiasDefault).unwrap();
    let lines = items[off..on]
        .iter()
        .filter(|i| matches!(i, DlItem::Line { .. }))
        .count();
    assert_eq!(lines, 4);
    assert!(items[off..on].contains(&DlItem::Stroke {
        width: 2.0,
        dash: vec![6.0, 6.0]
    }));
}

#[test]
fn test_justified_lines_use_extended_strings() {
    let (mut dom, mut styles, body) = document();
    let p = dom.append_element(body, ElementData::new("div"));
    styles.push_css(p, None, &[("font-size", "10px"), ("text-align", "justify")]);
    let _ = dom.append_text(p, "aaa bb cccc dd eeeeee ff gg");

    let lists = paint(&dom, &styles);
    let items = lists[0].items();
    let extended: Vec<&JustificationInfo> = items
        .iter()
        .filter_map(|i| match i {
            DlItem::StringEx { info, .. } => Some(info),
            _ => None,
        })
        .collect();
    assert!(!extended.is_empty());
    assert!(extended.iter().all(|info| info.space_adjust > 0.0));
    // The last line is not justified.
    assert!(matches!(
        items.iter().rev().find(|i| matches!(i, DlItem::String { .. } | DlItem::StringEx { .. })),
        Some(DlItem::String { .. })
    ));
}

#[test]
fn test_links_and_bookmarks() {
    let (mut dom, mut styles, body) = document();
    let internal = dom.append_element(body, ElementData::new("a").with_attr("href", "#chapter"));
    let _ = dom.append_text(internal, "go");
    let external = dom.append_element(body, ElementData::new("a").with_attr("href", "https://example.com/"));
    let _ = dom.append_text(external, "out");
    let anchor = dom.append_element(body, ElementData::new("a").with_attr("name", "start"));
    let _ = dom.append_text(anchor, "mark");
    let chapter = dom.append_element(body, ElementData::new("div").with_attr("id", "chapter"));
    styles.push_css(chapter, None, &[("height", "20px"), ("page-break-before", "always")]);

    let lists = paint(&dom, &styles);
    let items = lists[0].items();
    assert!(items.iter().any(|i| matches!(
        i,
        DlItem::InternalLink { target, page: 1, y, .. } if target == "chapter" && y.abs() < 0.01
    )));
    assert!(items
        .iter()
        .any(|i| matches!(i, DlItem::ExternalLink { uri, .. } if uri == "https://example.com/")));
    assert!(items
        .iter()
        .any(|i| matches!(i, DlItem::Bookmark { name, page: 0, .. } if name == "start")));
    assert!(!lists[1].items().iter().any(|i| matches!(i, DlItem::Bookmark { .. })));
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// A device that logs every call by name.
#[derive(Default)]
struct TraceDevice {
    calls: Vec<&'static str>,
}

impl DisplayListOutputDevice for TraceDevice {
    fn draw_line(&mut self, _: f32, _: f32, _: f32, _: f32) {
        self.calls.push("line");
    }
    fn set_rgb_color(&mut self, _: RgbColor) {
        self.calls.push("color");
    }
    fn set_stroke(&mut self, _: f32, _: &[f32]) {
        self.calls.push("stroke");
    }
    fn set_opacity(&mut self, _: f32) {
        self.calls.push("opacity");
    }
    fn translate(&mut self, _: f32, _: f32) {
        self.calls.push("translate");
    }
    fn rectangle(&mut self, _: Operation, _: Rect) {
        self.calls.push("rectangle");
    }
    fn clip(&mut self, _: Rect) {
        self.calls.push("clip");
    }
    fn set_clip(&mut self, _: Option<Rect>) {
        self.calls.push("set_clip");
    }
    fn oval(&mut self, _: Operation, _: Rect) {
        self.calls.push("oval");
    }
    fn draw_shape(&mut self, _: Operation, _: &[PathSegment]) {
        self.calls.push("shape");
    }
    fn draw_image(&mut self, _: &str, _: f32, _: f32) {
        self.calls.push("image");
    }
    fn set_font(&mut self, _: &str, _: f32, _: u16, _: bool) {
        self.calls.push("font");
    }
    fn draw_string(&mut self, _: &str, _: f32, _: f32) {
        self.calls.push("string");
    }
    fn draw_string_ex(
        &mut self,
        _: &str,
        _: f32,
        _: f32,
        _: JustificationInfo,
        _: &CancelToken,
    ) -> Result<(), Cancelled> {
        self.calls.push("string_ex");
        Ok(())
    }
    fn draw_glyph_vector(&mut self, _: &[PositionedGlyph], _: f32, _: f32) {
        self.calls.push("glyphs");
    }
    fn fill_linear_gradient(&mut self, _: &LinearGradient, _: &[f32]) {
        self.calls.push("gradient");
    }
    fn draw_replaced(&mut self, _: Option<&str>, _: Rect) {
        self.calls.push("replaced");
    }
    fn bookmark(&mut self, _: &str, _: usize, _: f32) {
        self.calls.push("bookmark");
    }
    fn internal_link(&mut self, _: Rect, _: &str, _: usize, _: f32) {
        self.calls.push("internal_link");
    }
    fn external_link(&mut self, _: Rect, _: &str) {
        self.calls.push("external_link");
    }
    fn set_antialias(&mut self, _: bool) {
        self.calls.push("antialias");
    }
}

fn expected_call(item: &DlItem) -> Option<&'static str> {
    Some(match item {
        DlItem::Line { .. } => "line",
        DlItem::RgbColor(_) | DlItem::CmykColor(_) => "color",
        DlItem::Stroke { .. } => "stroke",
        DlItem::Opacity(_) => "opacity",
        DlItem::Translate { .. } => "translate",
        DlItem::Rectangle { .. } => "rectangle",
        DlItem::Clip(_) => "clip",
        DlItem::SetClip(_) => "set_clip",
        DlItem::Oval { .. } => "oval",
        DlItem::DrawShape { .. } => "shape",
        DlItem::Image { .. } => "image",
        DlItem::Font { .. } => "font",
        DlItem::String { .. } => "string",
        DlItem::StringEx { .. } => "string_ex",
        DlItem::GlyphVector { .. } => "glyphs",
        DlItem::LinearGradient(g) => {
            g.fractions()?;
            "gradient"
        }
        DlItem::Replaced { .. } => "replaced",
        DlItem::Bookmark { .. } => "bookmark",
        DlItem::InternalLink { .. } => "internal_link",
        DlItem::ExternalLink { .. } => "external_link",
        DlItem::AntialiasOff | DlItem::AntialiasDefault => "antialias",
    })
}

fn gradient(dots: &[f32]) -> LinearGradient {
    LinearGradient {
        x: 0.0,
        y: 0.0,
        width: 10.0,
        height: 10.0,
        x1: 0.0,
        y1: 0.0,
        x2: 0.0,
        y2: 10.0,
        stops: dots.iter().map(|&dots| StopPoint { dots, rgb: RED }).collect(),
    }
}

/// A list touching every instruction kind.
fn every_instruction() -> DisplayList {
    let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
    let mut list = DisplayList::new();
    list.extend([
        DlItem::RgbColor(RED),
        DlItem::CmykColor(folio_css::style::CmykColor {
            c: 0.0,
            m: 0.0,
            y: 1.0,
            k: 0.0,
        }),
        DlItem::Stroke {
            width: 1.0,
            dash: vec![],
        },
        DlItem::Line {
            x1: 0.0,
            y1: 0.0,
            x2: 5.0,
            y2: 5.0,
        },
        DlItem::Opacity(0.5),
        DlItem::Translate { tx: 1.0, ty: 1.0 },
        DlItem::Rectangle { op: Operation::Fill, rect },
        DlItem::Clip(rect),
        DlItem::SetClip(None),
        DlItem::Oval { op: Operation::Stroke, rect },
        DlItem::DrawShape {
            op: Operation::Fill,
            path: vec![
                PathSegment::MoveTo { x: 0.0, y: 0.0 },
                PathSegment::LineTo { x: 4.0, y: 0.0 },
                PathSegment::Close,
            ],
        },
        DlItem::Image {
            uri: "a.png".to_string(),
            x: 0.0,
            y: 0.0,
        },
        DlItem::Font {
            family: "serif".to_string(),
            size: 12.0,
            weight: 400,
            italic: false,
        },
        DlItem::String {
            text: "abc".to_string(),
            x: 0.0,
            y: 10.0,
        },
        DlItem::StringEx {
            text: "a b".to_string(),
            x: 0.0,
            y: 20.0,
            info: JustificationInfo {
                space_adjust: 2.0,
                non_space_adjust: 0.0,
            },
        },
        DlItem::GlyphVector {
            glyphs: vec![PositionedGlyph { ch: 'x', x: 0.0, y: 0.0 }],
            x: 0.0,
            y: 0.0,
        },
        DlItem::LinearGradient(gradient(&[0.0, 10.0])),
        DlItem::LinearGradient(gradient(&[3.0])),
        DlItem::Replaced {
            uri: None,
            rect,
        },
        DlItem::Bookmark {
            name: "n".to_string(),
            page: 0,
            y: 0.0,
        },
        DlItem::InternalLink {
            area: rect,
            target: "n".to_string(),
            page: 0,
            y: 0.0,
        },
        DlItem::ExternalLink {
            area: rect,
            uri: "https://example.com/".to_string(),
        },
        DlItem::AntialiasOff,
        DlItem::AntialiasDefault,
        DlItem::Opacity(1.0),
    ]);
    list
}

#[test]
fn test_each_instruction_replayed_once_in_order() {
    let list = every_instruction();
    let mut device = TraceDevice::default();
    device.render(&list, &CancelToken::new()).unwrap();

    let expected: Vec<&str> = list.iter().filter_map(expected_call).collect();
    assert_eq!(device.calls, expected);
    // The single-stop gradient was skipped.
    assert_eq!(device.calls.iter().filter(|&&c| c == "gradient").count(), 1);
}

#[test]
fn test_replay_is_deterministic() {
    let (mut dom, mut styles, body) = document();
    let div = dom.append_element(body, ElementData::new("div"));
    styles.push_css(div, None, &[("border", "1px solid black"), ("background-color", "#eeeeee")]);
    let _ = dom.append_text(div, "some words to lay out over a couple of lines");

    let lists = paint(&dom, &styles);
    let again = paint(&dom, &styles);
    assert_eq!(lists, again);

    let first = record(&lists[0]);
    let second = record(&lists[0]);
    assert_eq!(first.ops, second.ops);

    let mut trace = TraceDevice::default();
    trace.render(&lists[0], &CancelToken::new()).unwrap();
    assert_eq!(trace.calls.len(), lists[0].len());
}

#[test]
fn test_render_stops_at_cancellation() {
    let list = every_instruction();
    let cancel = CancelToken::new();
    let mut device = TraceDevice::default();
    device.render(&list, &cancel).unwrap();
    let full = device.calls.len();

    let budget = cancel.checkpoints() / 2;
    let limited = CancelToken::with_callback(std::sync::Arc::new({
        let counter = std::sync::atomic::AtomicU64::new(0);
        move || counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed) >= budget
    }));
    let mut partial = TraceDevice::default();
    assert_eq!(partial.render(&list, &limited), Err(Cancelled));
    assert!(partial.calls.len() < full);
    assert_eq!(partial.calls[..], device.calls[..partial.calls.len()]);
}

#[test]
fn test_display_list_json_shape() {
    let mut list = DisplayList::new();
    list.push(DlItem::Opacity(0.5));
    list.push(DlItem::SetClip(None));
    list.push(DlItem::AntialiasOff);
    let json = serde_json::to_value(&list).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"op": "opacity", "args": 0.5},
            {"op": "set_clip", "args": null},
            {"op": "antialias_off"}
        ])
    );
    let back: DisplayList = serde_json::from_value(json).unwrap();
    assert_eq!(back, list);
}
