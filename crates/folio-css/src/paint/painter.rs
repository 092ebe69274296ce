//! Painter: generates display lists from a laid-out box tree.
//!
//! [CSS 2.1 Appendix E.2 Painting order](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
//!
//! One display list per page. Each list fills the canvas with the root
//! background, clips to the page content area, translates document
//! coordinates onto the page and paints the root layer.

use std::collections::HashMap;
use std::sync::Arc;

use super::display_list::{DisplayList, DlItem, LinearGradient, Operation, StopPoint};
use crate::error::{LayoutError, LayoutResult};
use crate::layout::box_model::{Rect, Side};
use crate::layout::context::LayoutContext;
use crate::layout::layer::LayerId;
use crate::layout::page::PageBox;
use crate::layout::pagination;
use crate::layout::tree::{BoxId, BoxKind, BoxTree, TextFragment};
use crate::style::color::ColorValue;
use crate::style::derived::DerivedValue;
use crate::style::properties::IdentValue;
use crate::style::CalculatedStyle;

/// Painter over one laid-out box tree.
///
/// [CSS 2.1 Appendix E.2](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
pub struct Painter<'a, 'c> {
    tree: &'a BoxTree,
    ctx: &'a LayoutContext<'c>,
    /// Members of each layer in document order.
    layer_boxes: HashMap<LayerId, Vec<BoxId>>,
}

/// Per-page emission state.
struct PageState {
    list: DisplayList,
    page: PageBox,
    /// Page content area in document coordinates.
    page_clip: Rect,
    clip: Option<Rect>,
    color: Option<ColorValue>,
    font: Option<(String, f32, u16, bool)>,
    opacity: f32,
}

impl PageState {
    fn set_color(&mut self, color: ColorValue) {
        if self.color == Some(color) {
            return;
        }
        self.color = Some(color);
        self.list.push(match color {
            ColorValue::Rgb(rgb) => DlItem::RgbColor(rgb),
            ColorValue::Cmyk(cmyk) => DlItem::CmykColor(cmyk),
        });
    }

    fn set_font(&mut self, style: &CalculatedStyle) {
        let font = (style.font_family(), style.font_size(), style.font_weight(), style.is_italic());
        if self.font.as_ref() == Some(&font) {
            return;
        }
        self.list.push(DlItem::Font {
            family: font.0.clone(),
            size: font.1,
            weight: font.2,
            italic: font.3,
        });
        self.font = Some(font);
    }

    /// Clip to `wanted` (document coordinates) within the page area.
    fn apply_clip(&mut self, wanted: Option<Rect>) {
        if self.clip == wanted {
            return;
        }
        self.list.push(DlItem::SetClip(Some(self.page_clip)));
        if let Some(rect) = wanted {
            self.list.push(DlItem::Clip(rect));
        }
        self.clip = wanted;
    }

    fn fill(&mut self, rect: Rect) {
        self.list.push(DlItem::Rectangle {
            op: Operation::Fill,
            rect,
        });
    }

    fn intersects(&self, rect: &Rect) -> bool {
        rect.bottom() > self.page.top && rect.y < self.page.bottom
    }
}

impl<'a, 'c> Painter<'a, 'c> {
    /// Prepare painting of `tree`, laid out with `ctx`.
    #[must_use]
    pub fn new(tree: &'a BoxTree, ctx: &'a LayoutContext<'c>) -> Self {
        let mut layer_boxes: HashMap<LayerId, Vec<BoxId>> = HashMap::new();
        if let Some(root) = tree.root() {
            let mut stack = vec![root];
            while let Some(id) = stack.pop() {
                if let Some(layer) = tree[id].containing_layer {
                    layer_boxes.entry(layer).or_default().push(id);
                }
                stack.extend(tree.children(id).iter().rev());
            }
        }
        Self {
            tree,
            ctx,
            layer_boxes,
        }
    }

    /// Paint every page.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InternalConsistency`] when the tree was not laid out,
    /// and [`LayoutError::Cancelled`].
    pub fn paint(&self) -> LayoutResult<Vec<DisplayList>> {
        let Some(root_layer) = self.ctx.root_layer else {
            return Err(LayoutError::InternalConsistency {
                context: "paint".to_string(),
                message: "tree has no root layer".to_string(),
            });
        };
        self.tree[root_layer]
            .pages()
            .iter()
            .map(|page| self.paint_page(root_layer, page))
            .collect()
    }

    /// Paint one page of the root layer.
    ///
    /// # Errors
    ///
    /// [`LayoutError::Cancelled`].
    pub fn paint_page(&self, root_layer: LayerId, page: &PageBox) -> LayoutResult<DisplayList> {
        let config = self.ctx.page_config();
        let page_clip = page.document_rect(config);
        let mut state = PageState {
            list: DisplayList::new(),
            page: page.clone(),
            page_clip,
            clip: None,
            color: None,
            font: None,
            opacity: 1.0,
        };

        // [§ 3.11.1 The Canvas Background and the Root Element](https://www.w3.org/TR/css-backgrounds-3/#root-background)
        if let Some(root) = self.tree.root() {
            let background = self.tree.effective_background_color(root, config.background, &self.ctx.cancel)?;
            if !background.is_transparent() {
                state.set_color(background);
                state.fill(Rect::new(0.0, 0.0, config.width, config.height));
            }
        }

        let (tx, ty) = (config.margin_left, config.margin_top - page.top);
        state.list.push(DlItem::SetClip(Some(page.content_rect(config))));
        state.list.push(DlItem::Translate { tx, ty });
        state.clip = None;
        self.paint_layer(&mut state, root_layer)?;
        state.list.push(DlItem::Translate { tx: -tx, ty: -ty });
        state.list.push(DlItem::SetClip(None));
        log::debug!("page {}: {} display items", page.page_no, state.list.len());
        Ok(state.list)
    }

    /// [CSS 2.1 Appendix E.2](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
    ///
    /// Negative z-index layers, block backgrounds and borders, inline
    /// content, then zero/auto and positive z-index layers.
    fn paint_layer(&self, state: &mut PageState, layer: LayerId) -> LayoutResult<()> {
        self.ctx.checkpoint()?;
        let master = self.tree[layer].master;
        let saved_opacity = state.opacity;
        let opacity = saved_opacity * self.tree[master].style.opacity();
        if (opacity - saved_opacity).abs() > f32::EPSILON {
            state.list.push(DlItem::Opacity(opacity));
            state.opacity = opacity;
        }

        let mut children = self.tree[layer].children.clone();
        // Stable: equal stack levels keep document order.
        children.sort_by_key(|&c| self.tree[c].z_index.stack_level());
        let (negative, rest): (Vec<LayerId>, Vec<LayerId>) =
            children.into_iter().partition(|&c| self.tree[c].z_index.stack_level() < 0);

        for child in negative {
            self.paint_layer(state, child)?;
        }

        let members = self.layer_boxes.get(&layer).map_or(&[][..], Vec::as_slice);
        for &id in members {
            self.ctx.checkpoint()?;
            if !self.tree[id].is_inline_level() || self.tree[id].layer == Some(layer) {
                self.paint_block_background(state, id, layer);
            }
        }
        for &id in members {
            self.ctx.checkpoint()?;
            self.paint_inline_content(state, id, layer)?;
        }
        for &id in members {
            self.paint_links(state, id);
        }

        for child in rest {
            self.paint_layer(state, child)?;
        }

        state.apply_clip(None);
        if (state.opacity - saved_opacity).abs() > f32::EPSILON {
            state.list.push(DlItem::Opacity(saved_opacity));
            state.opacity = saved_opacity;
        }
        Ok(())
    }

    /// Clip in effect for `id`: the children clip edges of its clipping
    /// ancestors within `layer`.
    fn clip_for(&self, id: BoxId, layer: LayerId) -> Option<Rect> {
        let mut clip: Option<Rect> = None;
        let mut current = self.tree[id].parent;
        while let Some(ancestor) = current {
            if self.tree.clips_children(ancestor) {
                let edge = self.tree.children_clip_edge(ancestor);
                clip = Some(clip.map_or(edge, |c| c.intersection(&edge).unwrap_or_default()));
            }
            if self.tree[ancestor].layer == Some(layer) {
                break;
            }
            current = self.tree[ancestor].parent;
        }
        clip
    }

    /// Background and borders of a block-level box.
    fn paint_block_background(&self, state: &mut PageState, id: BoxId, layer: LayerId) {
        let node = &self.tree[id];
        if !node.style.is_visible() || self.ctx.dom.document_element() == node.element && !node.anonymous {
            return;
        }
        let border_edge = self.tree.painting_border_edge(id);
        if !state.intersects(&border_edge) {
            return;
        }
        state.apply_clip(self.clip_for(id, layer));
        self.paint_background(state, &node.style, border_edge);
        self.paint_borders(state, id, border_edge);
        if node.style.is_list_item() && matches!(node.kind, BoxKind::Block) {
            self.paint_list_marker(state, id);
        }
    }

    /// [§ 3.10 Backgrounds](https://www.w3.org/TR/css-backgrounds-3/#background-painting-area)
    ///
    /// "The initial value of 'background-clip' is 'border-box'."
    fn paint_background(&self, state: &mut PageState, style: &Arc<CalculatedStyle>, area: Rect) {
        if let Some(color) = style.background_color() {
            state.set_color(color);
            state.fill(area);
        }
        if let Some(gradient) = style.background_gradient().and_then(|g| linear_gradient(g, area)) {
            state.list.push(DlItem::LinearGradient(gradient));
        }
    }

    /// [§ 4 Borders](https://www.w3.org/TR/css-backgrounds-3/#borders)
    ///
    /// Solid-like styles fill one rectangle per side; dashed and dotted
    /// borders stroke a line down the middle of the side.
    fn paint_borders(&self, state: &mut PageState, id: BoxId, edge: Rect) {
        let style = &self.tree[id].style;
        let sides = Side::ALL.map(|side| (side, style.border_side(side)));
        if sides
            .iter()
            .all(|(_, b)| b.width <= 0.0 || !b.style.is_visible_border_style())
        {
            return;
        }
        let width = |side: Side| {
            let border = style.border_side(side);
            if border.style.is_visible_border_style() {
                border.width
            } else {
                0.0
            }
        };
        let (top, right, bottom, left) = (width(Side::Top), width(Side::Right), width(Side::Bottom), width(Side::Left));

        state.list.push(DlItem::AntialiasOff);
        for (side, border) in sides {
            if border.width <= 0.0 || !border.style.is_visible_border_style() || border.color.is_transparent() {
                continue;
            }
            let rect = match side {
                Side::Top => Rect::new(edge.x, edge.y, edge.width, top),
                Side::Bottom => Rect::new(edge.x, edge.bottom() - bottom, edge.width, bottom),
                Side::Left => Rect::new(edge.x, edge.y + top, left, edge.height - top - bottom),
                Side::Right => Rect::new(edge.right() - right, edge.y + top, right, edge.height - top - bottom),
            };
            state.set_color(border.color);
            match border.style {
                IdentValue::Dashed | IdentValue::Dotted => {
                    let dash = if border.style == IdentValue::Dashed {
                        vec![border.width * 3.0, border.width * 3.0]
                    } else {
                        vec![border.width, border.width]
                    };
                    state.list.push(DlItem::Stroke {
                        width: border.width,
                        dash,
                    });
                    let (x1, y1, x2, y2) = if matches!(side, Side::Top | Side::Bottom) {
                        let y = rect.y + rect.height / 2.0;
                        (rect.x, y, rect.right(), y)
                    } else {
                        let x = rect.x + rect.width / 2.0;
                        (x, rect.y, x, rect.bottom())
                    };
                    state.list.push(DlItem::Line { x1, y1, x2, y2 });
                }
                _ => state.fill(rect),
            }
        }
        state.list.push(DlItem::AntialiasDefault);
    }

    /// [§ 12.5 Lists](https://www.w3.org/TR/CSS2/generate.html#lists)
    fn paint_list_marker(&self, state: &mut PageState, id: BoxId) {
        let style = &self.tree[id].style;
        let content = self.tree.content_area_edge(id, self.tree[id].abs_x, self.tree[id].abs_y);
        let font_size = style.font_size();
        let center_y = content.y + style.line_height() / 2.0;
        let size = font_size / 3.0;
        let marker = Rect::new(content.x - font_size, center_y - size / 2.0, size, size);
        state.set_color(style.color());
        match style.list_style_type() {
            IdentValue::None => {}
            IdentValue::Circle => state.list.push(DlItem::Oval {
                op: Operation::Stroke,
                rect: marker,
            }),
            IdentValue::Square => state.fill(marker),
            IdentValue::Decimal => {
                let ordinal = self.list_ordinal(id);
                let text = format!("{ordinal}.");
                let width = self.ctx.metrics.text_width(&text, font_size);
                state.set_font(style);
                state.list.push(DlItem::String {
                    x: content.x - width - font_size / 2.0,
                    y: center_y + font_size * 0.35,
                    text,
                });
            }
            _ => state.list.push(DlItem::Oval {
                op: Operation::Fill,
                rect: marker,
            }),
        }
    }

    fn list_ordinal(&self, id: BoxId) -> usize {
        let mut ordinal = 1;
        let mut current = self.tree.previous_sibling(id);
        while let Some(sibling) = current {
            if self.tree[sibling].style.is_list_item() {
                ordinal += 1;
            }
            current = self.tree.previous_sibling(sibling);
        }
        ordinal
    }

    /// Inline box decoration, text and replaced content.
    fn paint_inline_content(&self, state: &mut PageState, id: BoxId, layer: LayerId) -> LayoutResult<()> {
        let node = &self.tree[id];
        if !node.style.is_visible() {
            return Ok(());
        }
        match &node.kind {
            BoxKind::Inline { .. } | BoxKind::Block if node.is_inline_level() && node.layer != Some(layer) => {
                let edge = self.tree.painting_border_edge(id);
                if state.intersects(&edge) {
                    state.apply_clip(self.clip_for(id, layer));
                    self.paint_background(state, &node.style, edge);
                    self.paint_borders(state, id, edge);
                }
            }
            BoxKind::Text { fragments, .. } => {
                for fragment in fragments {
                    self.ctx.checkpoint()?;
                    self.paint_fragment(state, id, layer, fragment);
                }
            }
            BoxKind::Replaced { .. } => {
                let content = self.tree.content_area_edge(id, node.abs_x, node.abs_y);
                if state.intersects(&content) {
                    state.apply_clip(self.clip_for(id, layer));
                    if node.is_inline_level() {
                        self.paint_background(state, &node.style, self.tree.painting_border_edge(id));
                        self.paint_borders(state, id, self.tree.painting_border_edge(id));
                    }
                    let uri = node
                        .element
                        .and_then(|e| self.ctx.dom.as_element(e))
                        .and_then(|e| self.ctx.namespace.image_uri(e))
                        .map(str::to_string);
                    state.list.push(DlItem::Replaced { uri, rect: content });
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// [CSS 2.1 Appendix E.2](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
    /// Step 7: "the element's text"
    fn paint_fragment(&self, state: &mut PageState, id: BoxId, layer: LayerId, fragment: &TextFragment) {
        let node = &self.tree[id];
        let top = node.abs_y + fragment.y;
        let bounds = Rect::new(node.abs_x + fragment.x, top, fragment.width, fragment.height);
        if !state.intersects(&bounds) || fragment.text.trim().is_empty() {
            return;
        }
        state.apply_clip(self.clip_for(id, layer));
        state.set_font(&node.style);
        state.set_color(node.style.color());
        let (x, y) = (bounds.x, top + fragment.baseline);
        let text = fragment.text.clone();
        state.list.push(match fragment.justification {
            Some(info) => DlItem::StringEx { text, x, y, info },
            None => DlItem::String { text, x, y },
        });
    }

    /// Bookmarks for anchors and link areas for `href`s, on the page the box
    /// starts on.
    fn paint_links(&self, state: &mut PageState, id: BoxId) {
        let node = &self.tree[id];
        if node.anonymous || node.pseudo_element.is_some() {
            return;
        }
        let Some(element) = node.element.and_then(|e| self.ctx.dom.as_element(e)) else {
            return;
        };
        let area = self.tree.painting_border_edge(id);
        if !state.page.contains_y(area.y) {
            return;
        }
        let namespace = self.ctx.namespace;

        if let Some(name) = namespace.anchor_name(element) {
            state.list.push(DlItem::Bookmark {
                name: name.to_string(),
                page: state.page.page_no,
                y: area.y - state.page.top,
            });
        }

        let Some(uri) = namespace.link_uri(element) else {
            return;
        };
        match uri.strip_prefix('#') {
            Some(fragment) => match self.ctx.box_by_id(fragment) {
                Some(target) => {
                    let target_y = self.tree.painting_border_edge(target).y;
                    let (page, page_top) =
                        pagination::page_at(self.tree, self.ctx, target_y).map_or((0, 0.0), |p| (p.page_no, p.top));
                    state.list.push(DlItem::InternalLink {
                        area,
                        target: fragment.to_string(),
                        page,
                        y: target_y - page_top,
                    });
                }
                None => log::debug!("link target #{fragment} not found"),
            },
            None => state.list.push(DlItem::ExternalLink {
                area,
                uri: uri.to_string(),
            }),
        }
    }
}

/// [§ 3.1 Linear gradients](https://www.w3.org/TR/css-images-3/#linear-gradients)
///
/// `linear-gradient([to <side>,] <color> [<length-percentage>]#)` over
/// `area`. Stops without a position are spread evenly.
fn linear_gradient(value: &DerivedValue, area: Rect) -> Option<LinearGradient> {
    let DerivedValue::Function { name, args } = value else {
        return None;
    };
    if name != "linear-gradient" {
        return None;
    }

    let mut args = args.as_slice();
    let mut direction = Side::Bottom;
    if let Some(DerivedValue::List(words)) = args.first().map(AsRef::as_ref)
        && matches!(words.first().and_then(|w| w.as_ident()), Some(IdentValue::Other(w)) if w.eq_ignore_ascii_case("to"))
    {
        direction = match words.get(1).and_then(|w| w.as_ident()) {
            Some(IdentValue::Left) => Side::Left,
            Some(IdentValue::Right) => Side::Right,
            Some(IdentValue::Other(word)) if word.eq_ignore_ascii_case("top") => Side::Top,
            _ => Side::Bottom,
        };
        args = &args[1..];
    }

    let (x1, y1, x2, y2) = match direction {
        Side::Top => (0.0, area.height, 0.0, 0.0),
        Side::Right => (0.0, 0.0, area.width, 0.0),
        Side::Bottom => (0.0, 0.0, 0.0, area.height),
        Side::Left => (area.width, 0.0, 0.0, 0.0),
    };
    let length = (x2 - x1).hypot(y2 - y1);

    let count = args.len();
    let stops: Vec<StopPoint> = args
        .iter()
        .enumerate()
        .filter_map(|(i, arg)| {
            let (color, position) = match arg.as_ref() {
                DerivedValue::List(parts) => (
                    parts.first().and_then(|p| gradient_color(p)),
                    parts.get(1).and_then(|p| p.as_length()).map(|l| l.to_px(length, 16.0)),
                ),
                other => (gradient_color(other), None),
            };
            let even = if count > 1 {
                length * i as f32 / (count - 1) as f32
            } else {
                0.0
            };
            color.map(|c| StopPoint {
                dots: position.unwrap_or(even),
                rgb: c.to_rgb(),
            })
        })
        .collect();

    Some(LinearGradient {
        x: area.x,
        y: area.y,
        width: area.width,
        height: area.height,
        x1,
        y1,
        x2,
        y2,
        stops,
    })
}

fn gradient_color(value: &DerivedValue) -> Option<ColorValue> {
    match value {
        DerivedValue::Color(color) => Some(*color),
        DerivedValue::Ident(IdentValue::Other(name)) => ColorValue::parse(name),
        DerivedValue::Ident(IdentValue::Transparent) => ColorValue::parse("transparent"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::color::RgbColor;

    fn ident(word: &str) -> Arc<DerivedValue> {
        Arc::new(DerivedValue::Ident(IdentValue::from_keyword(word)))
    }

    #[test]
    fn gradient_to_right_spreads_stops() {
        let value = DerivedValue::Function {
            name: "linear-gradient".to_string(),
            args: vec![
                Arc::new(DerivedValue::List(vec![ident("to"), ident("right")])),
                Arc::new(DerivedValue::Color(ColorValue::Rgb(RgbColor::opaque(255, 0, 0)))),
                Arc::new(DerivedValue::Color(ColorValue::Rgb(RgbColor::opaque(0, 0, 255)))),
            ],
        };
        let gradient = linear_gradient(&value, Rect::new(10.0, 20.0, 100.0, 50.0)).unwrap();
        assert_eq!((gradient.x1, gradient.x2, gradient.y2), (0.0, 100.0, 0.0));
        assert_eq!(gradient.stops.len(), 2);
        assert_eq!(gradient.stops[1].dots, 100.0);
        assert_eq!(gradient.fractions(), Some(vec![0.0, 1.0]));
    }

    #[test]
    fn gradient_defaults_to_bottom() {
        let value = DerivedValue::Function {
            name: "linear-gradient".to_string(),
            args: vec![ident("red"), ident("blue")],
        };
        let gradient = linear_gradient(&value, Rect::new(0.0, 0.0, 10.0, 40.0)).unwrap();
        assert_eq!((gradient.x2, gradient.y2), (0.0, 40.0));
        assert_eq!(gradient.stops[0].rgb, RgbColor::opaque(255, 0, 0));
    }
}
