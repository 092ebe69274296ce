//! Integration tests for the tiny-skia raster device.

use folio_common::{CancelToken, Cancelled};
use folio_css::paint::{LinearGradient, Operation, StopPoint};
use folio_css::style::{CmykColor, RgbColor};
use folio_css::{
    build_box_tree, layout_document, DisplayList, DisplayListOutputDevice, DlItem, LayoutContext, LayoutOptions,
    MapStyleSource, PageConfig, Painter, Rect, StyleSession,
};
use folio_dom::{DomTree, ElementData, NodeId};
use folio_render::{render_page, FontSet, ImageStore, RasterDevice, RenderError};

const RED: RgbColor = RgbColor::opaque(255, 0, 0);
const GREEN: RgbColor = RgbColor::opaque(0, 255, 0);
const BLUE: RgbColor = RgbColor::opaque(0, 0, 255);

fn list(items: Vec<DlItem>) -> DisplayList {
    let mut list = DisplayList::new();
    list.extend(items);
    list
}

fn fill(x: f32, y: f32, width: f32, height: f32) -> DlItem {
    DlItem::Rectangle {
        op: Operation::Fill,
        rect: Rect::new(x, y, width, height),
    }
}

/// Helper: replay `items` on a 50x50 surface.
fn draw(items: Vec<DlItem>, images: &ImageStore) -> Vec<Vec<RgbColor>> {
    let fonts = FontSet::empty();
    let mut device = RasterDevice::new(50, 50, &fonts, images).unwrap();
    device.render(&list(items), &CancelToken::new()).unwrap();
    (0..50)
        .map(|y| (0..50).map(|x| device.pixel(x, y).unwrap()).collect())
        .collect()
}

#[test]
fn test_fill_respects_translation() {
    let pixels = draw(
        vec![
            DlItem::RgbColor(RED),
            DlItem::Translate { tx: 10.0, ty: 5.0 },
            fill(0.0, 0.0, 10.0, 10.0),
        ],
        &ImageStore::new(),
    );
    assert_eq!(pixels[10][15], RED);
    assert_eq!(pixels[2][2], RgbColor::WHITE);
    assert_eq!(pixels[10][25], RgbColor::WHITE);
}

#[test]
fn test_clip_is_relative_to_origin() {
    let pixels = draw(
        vec![
            DlItem::Translate { tx: 10.0, ty: 10.0 },
            DlItem::SetClip(Some(Rect::new(0.0, 0.0, 10.0, 10.0))),
            DlItem::RgbColor(BLUE),
            fill(-10.0, -10.0, 50.0, 50.0),
        ],
        &ImageStore::new(),
    );
    assert_eq!(pixels[15][15], BLUE);
    assert_eq!(pixels[5][5], RgbColor::WHITE);
    assert_eq!(pixels[25][25], RgbColor::WHITE);
}

#[test]
fn test_nested_clips_intersect() {
    let pixels = draw(
        vec![
            DlItem::Clip(Rect::new(0.0, 0.0, 30.0, 30.0)),
            DlItem::Clip(Rect::new(20.0, 20.0, 30.0, 30.0)),
            DlItem::RgbColor(RED),
            fill(0.0, 0.0, 50.0, 50.0),
            DlItem::SetClip(None),
            DlItem::RgbColor(BLUE),
            fill(40.0, 40.0, 10.0, 10.0),
        ],
        &ImageStore::new(),
    );
    assert_eq!(pixels[25][25], RED);
    assert_eq!(pixels[10][10], RgbColor::WHITE);
    assert_eq!(pixels[35][35], RgbColor::WHITE);
    assert_eq!(pixels[45][45], BLUE);
}

#[test]
fn test_opacity_blends_over_background() {
    let pixels = draw(
        vec![
            DlItem::RgbColor(RED),
            DlItem::Opacity(0.5),
            fill(0.0, 0.0, 10.0, 10.0),
            DlItem::Opacity(1.0),
            fill(20.0, 0.0, 10.0, 10.0),
        ],
        &ImageStore::new(),
    );
    let half = pixels[5][5];
    assert_eq!(half.r, 255);
    assert!((120..=135).contains(&half.g), "got {half:?}");
    assert_eq!(pixels[5][25], RED);
}

#[test]
fn test_cmyk_color_converts_to_rgb() {
    let pixels = draw(
        vec![
            DlItem::CmykColor(CmykColor {
                c: 0.0,
                m: 1.0,
                y: 1.0,
                k: 0.0,
            }),
            fill(0.0, 0.0, 10.0, 10.0),
        ],
        &ImageStore::new(),
    );
    assert_eq!(pixels[5][5], RED);
}

#[test]
fn test_vertical_gradient() {
    let gradient = LinearGradient {
        x: 0.0,
        y: 0.0,
        width: 10.0,
        height: 50.0,
        x1: 0.0,
        y1: 0.0,
        x2: 0.0,
        y2: 50.0,
        stops: vec![StopPoint { dots: 0.0, rgb: RED }, StopPoint { dots: 50.0, rgb: BLUE }],
    };
    let pixels = draw(vec![DlItem::LinearGradient(gradient)], &ImageStore::new());
    assert!(pixels[1][5].r > 200 && pixels[1][5].b < 50);
    assert!(pixels[48][5].b > 200 && pixels[48][5].r < 50);
    assert_eq!(pixels[25][30], RgbColor::WHITE);
}

#[test]
fn test_replaced_image_scales_into_rect() {
    let mut images = ImageStore::new();
    let mut rgba = Vec::new();
    for color in [RED, GREEN, BLUE, RgbColor::BLACK] {
        rgba.extend_from_slice(&[color.r, color.g, color.b, color.a]);
    }
    images.insert_rgba("quad.png", 2, 2, rgba).unwrap();

    let pixels = draw(
        vec![DlItem::Replaced {
            uri: Some("quad.png".to_string()),
            rect: Rect::new(0.0, 0.0, 20.0, 20.0),
        }],
        &images,
    );
    assert_eq!(pixels[5][5], RED);
    assert_eq!(pixels[5][15], GREEN);
    assert_eq!(pixels[15][5], BLUE);
    assert_eq!(pixels[15][15], RgbColor::BLACK);
    assert_eq!(pixels[30][30], RgbColor::WHITE);
}

#[test]
fn test_missing_replaced_content_draws_placeholder() {
    let pixels = draw(
        vec![DlItem::Replaced {
            uri: None,
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
        }],
        &ImageStore::new(),
    );
    assert_eq!(pixels[5][5], RgbColor::opaque(0xc0, 0xc0, 0xc0));
}

#[test]
fn test_image_store_validates_buffers() {
    let mut images = ImageStore::new();
    assert!(matches!(
        images.insert_rgba("bad", 2, 2, vec![0; 12]),
        Err(RenderError::BufferLength {
            expected: 16,
            actual: 12,
            ..
        })
    ));
    assert!(matches!(
        images.insert_rgba("empty", 0, 4, Vec::new()),
        Err(RenderError::InvalidSize { width: 0, height: 4 })
    ));
    assert!(matches!(
        images.insert_encoded("junk", b"not an image"),
        Err(RenderError::Image { .. })
    ));
    assert!(images.is_empty());
}

#[test]
fn test_image_store_decodes_png_and_reports_sizes() {
    let source = image::RgbaImage::from_pixel(3, 2, image::Rgba([0, 0, 255, 255]));
    let mut png = Vec::new();
    source
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let mut images = ImageStore::new();
    images.insert_encoded("logo.png", &png).unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images.sizes().get("logo.png"), Some(&(3.0, 2.0)));
}

#[test]
fn test_zero_sized_surface_is_rejected() {
    let fonts = FontSet::empty();
    let images = ImageStore::new();
    assert!(matches!(
        RasterDevice::new(0, 10, &fonts, &images),
        Err(RenderError::InvalidSize { width: 0, height: 10 })
    ));
}

#[test]
fn test_cancelled_replay_draws_nothing() {
    let fonts = FontSet::empty();
    let images = ImageStore::new();
    let mut device = RasterDevice::new(20, 20, &fonts, &images).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let items = list(vec![DlItem::RgbColor(RED), fill(0.0, 0.0, 20.0, 20.0)]);
    assert_eq!(device.render(&items, &cancel), Err(Cancelled));
    assert_eq!(device.pixel(10, 10), Some(RgbColor::WHITE));
}

#[test]
fn test_text_without_fonts_is_skipped() {
    let pixels = draw(
        vec![
            DlItem::Font {
                family: "serif".to_string(),
                size: 12.0,
                weight: 400,
                italic: false,
            },
            DlItem::String {
                text: "hello".to_string(),
                x: 5.0,
                y: 20.0,
            },
        ],
        &ImageStore::new(),
    );
    assert!(pixels.iter().flatten().all(|&p| p == RgbColor::WHITE));
}

#[test]
fn test_laid_out_page_rasterizes() {
    let mut dom = DomTree::new();
    let html = dom.append_element(NodeId::ROOT, ElementData::new("html"));
    let body = dom.append_element(html, ElementData::new("body"));
    let block = dom.append_element(body, ElementData::new("div"));
    let mut styles = MapStyleSource::new();
    styles.push_css(body, None, &[("margin", "0")]);
    styles.push_css(block, None, &[("height", "20px"), ("background-color", "red")]);

    let fonts = FontSet::empty();
    let metrics = fonts.layout_metrics();
    let session = StyleSession::new().unwrap();
    let config = PageConfig::with_size(200.0, 300.0, 50.0);
    let options = LayoutOptions {
        page: config.clone(),
        page_breaks_allowed: true,
        print: true,
    };
    let mut ctx = LayoutContext::new(&dom, &styles, &session)
        .with_options(options)
        .with_metrics(metrics.as_ref());
    let mut tree = build_box_tree(&ctx).unwrap();
    layout_document(&mut tree, &mut ctx).unwrap();
    let lists = Painter::new(&tree, &ctx).paint().unwrap();

    let images = ImageStore::new();
    let page = render_page(&lists[0], &config, &fonts, &images, &CancelToken::new()).unwrap();
    assert_eq!(page.dimensions(), (200, 300));
    assert_eq!(page.get_pixel(100, 60).0, [255, 0, 0, 255]);
    assert_eq!(page.get_pixel(100, 80).0, [255, 255, 255, 255]);
    // Page margins stay clear.
    assert_eq!(page.get_pixel(10, 60).0, [255, 255, 255, 255]);
}

#[test]
fn test_png_written_to_disk() {
    let fonts = FontSet::empty();
    let images = ImageStore::new();
    let mut device = RasterDevice::new(8, 4, &fonts, &images).unwrap();
    device
        .render(&list(vec![DlItem::RgbColor(GREEN), fill(0.0, 0.0, 4.0, 4.0)]), &CancelToken::new())
        .unwrap();

    let path = std::env::temp_dir().join(format!("folio-render-{}.png", std::process::id()));
    device.save_png(&path).unwrap();
    let read = image::open(&path).unwrap().to_rgba8();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(read.dimensions(), (8, 4));
    assert_eq!(read.get_pixel(1, 1).0, [0, 255, 0, 255]);
}
