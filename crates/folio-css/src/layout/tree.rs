//! The box tree.
//!
//! [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
//!
//! Boxes live in an arena and refer to each other by [`BoxId`]. Parent to
//! child links are the owning direction; parent, containing block and layer
//! links are plain handles resolved through the tree.

use std::fmt::Write as _;
use std::ops::{Index, IndexMut};
use std::sync::Arc;

use folio_common::CancelToken;
use folio_dom::{DomTree, NodeId};
use serde::Serialize;

use super::box_model::{BoxInsets, PaintingInfo, Rect, RectPropertySet, Side};
use super::context::LayoutContext;
use super::layer::{Layer, LayerId, ZIndex};
use super::pagination::ContentLimitContainer;
use super::page::PageBox;
use super::state::{AtomicLayoutState, LayoutState};
use crate::error::{LayoutError, LayoutResult};
use crate::paint::JustificationInfo;
use crate::style::color::{ColorValue, RgbColor};
use crate::style::properties::{CssName, IdentValue};
use crate::style::CalculatedStyle;

/// Handle of a box in a [`BoxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BoxId(pub usize);

/// One laid-out piece of a text run, relative to its text box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextFragment {
    /// Text drawn by this fragment.
    pub text: String,
    /// Left edge, relative to the owning text box.
    pub x: f32,
    /// Top of the line, relative to the owning text box.
    pub y: f32,
    /// Advance width including justification.
    pub width: f32,
    /// Height of the line box the fragment sits on.
    pub height: f32,
    /// Distance from the fragment top to its baseline.
    pub baseline: f32,
    /// Extra advance applied by `text-align: justify`.
    pub justification: Option<JustificationInfo>,
}

/// Variant-specific box data.
#[derive(Debug, Clone, PartialEq)]
pub enum BoxKind {
    /// Block container (also used for list items and inline-blocks).
    Block,
    /// Inline box. `wrapped_content` lists block boxes that were hoisted out
    /// of this inline into the enclosing block flow.
    Inline {
        /// Blocks directly wrapped by this inline.
        wrapped_content: Vec<BoxId>,
    },
    /// A run of text.
    Text {
        /// Source text with collapsed white space.
        text: String,
        /// Line pieces produced by inline layout.
        fragments: Vec<TextFragment>,
    },
    /// Replaced content with an intrinsic size.
    Replaced {
        /// Intrinsic width in pixels.
        width: f32,
        /// Intrinsic height in pixels.
        height: f32,
    },
}

impl BoxKind {
    /// Short label for dumps.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Block => "BlockBox",
            Self::Inline { .. } => "InlineBox",
            Self::Text { .. } => "TextBox",
            Self::Replaced { .. } => "ReplacedBox",
        }
    }
}

/// A node of the box tree.
#[derive(Debug)]
pub struct BoxNode {
    /// Variant data.
    pub kind: BoxKind,
    /// Originating element; `None` for anonymous and generated boxes.
    pub element: Option<NodeId>,
    /// Pseudo-element (`before`, `after`, `marker`) this box renders.
    pub pseudo_element: Option<String>,
    /// Synthesized box with no element of its own.
    pub anonymous: bool,
    /// Computed style; replaced, never mutated, on restyle.
    pub style: Arc<CalculatedStyle>,
    /// Structural parent.
    pub parent: Option<BoxId>,
    /// Ordered children.
    pub children: Vec<BoxId>,
    index: usize,
    /// Left edge relative to the parent's content origin.
    pub x: f32,
    /// Top edge relative to the parent's content origin.
    pub y: f32,
    /// Left edge in document coordinates.
    pub abs_x: f32,
    /// Top edge in document coordinates.
    pub abs_y: f32,
    /// Horizontal offset of this box's content origin from its margin edge.
    pub tx: f32,
    /// Vertical offset of this box's content origin from its margin edge.
    pub ty: f32,
    content_width: f32,
    /// Margin-box height.
    pub height: f32,
    /// Left margin + border + padding.
    pub left_mbp: f32,
    /// Right margin + border + padding.
    pub right_mbp: f32,
    /// Offset applied by relative positioning.
    pub relative_offset: Option<(f32, f32)>,
    /// Containing block override. Defaults to the parent.
    pub containing_block: Option<BoxId>,
    working_margin: Option<RectPropertySet>,
    /// The layer this box establishes.
    pub layer: Option<LayerId>,
    /// The layer this box paints in.
    pub containing_layer: Option<LayerId>,
    /// Cached aggregate paint bounds.
    pub painting_info: Option<PaintingInfo>,
    /// Layout lifecycle.
    pub state: AtomicLayoutState,
    /// Inline box this block was hoisted out of.
    pub wrapper: Option<BoxId>,
}

impl BoxNode {
    fn new(kind: BoxKind, style: Arc<CalculatedStyle>, element: Option<NodeId>) -> Self {
        Self {
            kind,
            element,
            pseudo_element: None,
            anonymous: false,
            style,
            parent: None,
            children: Vec::new(),
            index: 0,
            x: 0.0,
            y: 0.0,
            abs_x: 0.0,
            abs_y: 0.0,
            tx: 0.0,
            ty: 0.0,
            content_width: 0.0,
            height: 0.0,
            left_mbp: 0.0,
            right_mbp: 0.0,
            relative_offset: None,
            containing_block: None,
            working_margin: None,
            layer: None,
            containing_layer: None,
            painting_info: None,
            state: AtomicLayoutState::default(),
            wrapper: None,
        }
    }

    /// Position in the parent's children.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Content width, never negative.
    #[must_use]
    pub const fn content_width(&self) -> f32 {
        self.content_width
    }

    /// Set the content width, clamping to zero.
    pub fn set_content_width(&mut self, width: f32) {
        self.content_width = width.max(0.0);
    }

    /// Margin-box width.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.left_mbp + self.content_width + self.right_mbp
    }

    /// Whether this box takes part in inline layout.
    #[must_use]
    pub fn is_inline_level(&self) -> bool {
        match self.kind {
            BoxKind::Inline { .. } | BoxKind::Text { .. } | BoxKind::Replaced { .. } => true,
            BoxKind::Block => self.style.is_ident(CssName::Display, &IdentValue::InlineBlock),
        }
    }

    /// Whether a working margin override exists.
    #[must_use]
    pub const fn has_working_margin(&self) -> bool {
        self.working_margin.is_some()
    }
}

/// Arena of boxes and layers for one document.
#[derive(Debug, Default)]
pub struct BoxTree {
    boxes: Vec<BoxNode>,
    layers: Vec<Layer>,
    root: Option<BoxId>,
    /// Width of the initial containing block.
    pub initial_width: f32,
}

impl Index<BoxId> for BoxTree {
    type Output = BoxNode;

    fn index(&self, id: BoxId) -> &BoxNode {
        &self.boxes[id.0]
    }
}

impl IndexMut<BoxId> for BoxTree {
    fn index_mut(&mut self, id: BoxId) -> &mut BoxNode {
        &mut self.boxes[id.0]
    }
}

impl Index<LayerId> for BoxTree {
    type Output = Layer;

    fn index(&self, id: LayerId) -> &Layer {
        &self.layers[id.0]
    }
}

impl IndexMut<LayerId> for BoxTree {
    fn index_mut(&mut self, id: LayerId) -> &mut Layer {
        &mut self.layers[id.0]
    }
}

impl BoxTree {
    /// An empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an unattached box.
    pub fn create_box(&mut self, kind: BoxKind, style: Arc<CalculatedStyle>, element: Option<NodeId>) -> BoxId {
        let id = BoxId(self.boxes.len());
        self.boxes.push(BoxNode::new(kind, style, element));
        id
    }

    /// Allocate an unattached anonymous box.
    pub fn create_anonymous(&mut self, kind: BoxKind, style: Arc<CalculatedStyle>) -> BoxId {
        let id = self.create_box(kind, style, None);
        self[id].anonymous = true;
        id
    }

    /// The box, if `id` is valid.
    #[must_use]
    pub fn get(&self, id: BoxId) -> Option<&BoxNode> {
        self.boxes.get(id.0)
    }

    /// Number of boxes ever allocated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether no box has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// The root box.
    #[must_use]
    pub const fn root(&self) -> Option<BoxId> {
        self.root
    }

    /// Make `id` the root box.
    pub fn set_root(&mut self, id: BoxId) {
        self.root = Some(id);
    }

    /// All layers ever created, detached ones included.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Create a layer for `master` under `parent`.
    pub fn add_layer(&mut self, master: BoxId, parent: Option<LayerId>, z_index: ZIndex, inline: bool) -> LayerId {
        let id = LayerId(self.layers.len());
        self.layers.push(Layer::new(master, parent, z_index, inline));
        if let Some(parent) = parent {
            self[parent].children.push(id);
        }
        id
    }

    /// Unlink a layer from its parent and drop its pages.
    pub fn detach_layer(&mut self, id: LayerId) {
        if let Some(parent) = self[id].parent {
            self[parent].children.retain(|&child| child != id);
        }
        self[id].mark_detached();
    }

    /// Current layout state of `id`.
    #[must_use]
    pub fn state(&self, id: BoxId) -> LayoutState {
        self[id].state.load()
    }

    fn checked(&self, id: BoxId) -> LayoutResult<&BoxNode> {
        self.get(id).ok_or_else(|| LayoutError::InternalConsistency {
            context: format!("box #{}", id.0),
            message: "stale box handle".to_string(),
        })
    }

    fn consistency(&self, id: BoxId, dom: Option<&DomTree>, message: &str) -> LayoutError {
        let tag = dom
            .zip(self.get(id).and_then(|b| b.element))
            .and_then(|(dom, element)| dom.as_element(element))
            .map(|e| e.tag_name.as_str());
        LayoutError::consistency(id, tag, message)
    }

    // ----------------------------------------------------------------------
    // Structure
    // ----------------------------------------------------------------------

    /// Append `child` to `parent`.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InternalConsistency`] when either handle is stale or
    /// `child` already has a parent.
    pub fn add_child(&mut self, parent: BoxId, child: BoxId) -> LayoutResult<()> {
        let _ = self.checked(parent)?;
        if self.checked(child)?.parent.is_some() || parent == child {
            return Err(self.consistency(child, None, "box is already attached"));
        }
        let index = self[parent].children.len();
        self[parent].children.push(child);
        let node = &mut self[child];
        node.parent = Some(parent);
        node.index = index;
        Ok(())
    }

    /// Append `child` and resolve its containing layer immediately.
    ///
    /// # Errors
    ///
    /// See [`BoxTree::add_child`] and [`BoxTree::init_containing_layer`].
    pub fn add_child_for_layout(&mut self, ctx: &LayoutContext<'_>, parent: BoxId, child: BoxId) -> LayoutResult<()> {
        self.add_child(parent, child)?;
        self.init_containing_layer(ctx, child)
    }

    /// Append every box in `children`.
    ///
    /// All boxes are checked (one cancellation poll each) before the first
    /// is attached, so an error leaves `parent` unchanged.
    ///
    /// # Errors
    ///
    /// See [`BoxTree::add_child`]; also [`LayoutError::Cancelled`].
    pub fn add_all_children(&mut self, parent: BoxId, children: &[BoxId], cancel: &CancelToken) -> LayoutResult<()> {
        let _ = self.checked(parent)?;
        for (i, &child) in children.iter().enumerate() {
            cancel.checkpoint()?;
            if self.checked(child)?.parent.is_some() || child == parent || children[..i].contains(&child) {
                return Err(self.consistency(child, None, "box is already attached"));
            }
        }
        let start = self[parent].children.len();
        self[parent].children.extend_from_slice(children);
        for (offset, &child) in children.iter().enumerate() {
            let node = &mut self[child];
            node.parent = Some(parent);
            node.index = start + offset;
        }
        Ok(())
    }

    /// Unlink every child of `parent`.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InternalConsistency`] for a stale handle.
    pub fn remove_all_children(&mut self, parent: BoxId) -> LayoutResult<()> {
        let _ = self.checked(parent)?;
        let children = std::mem::take(&mut self[parent].children);
        for child in children {
            self[child].parent = None;
        }
        Ok(())
    }

    /// Remove `child` from `parent` by identity and renumber later siblings.
    /// Returns whether `child` was found.
    ///
    /// New sibling indices are computed first, polling `cancel` once per
    /// sibling; the tree is only touched after the last poll.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InternalConsistency`] for a stale `parent` and
    /// [`LayoutError::Cancelled`] before any change was made.
    pub fn remove_child(&mut self, parent: BoxId, child: BoxId, cancel: &CancelToken) -> LayoutResult<bool> {
        let Some(position) = self.checked(parent)?.children.iter().position(|&c| c == child) else {
            return Ok(false);
        };
        let mut renumbered = Vec::with_capacity(self[parent].children.len() - position - 1);
        for (offset, &sibling) in self[parent].children[position + 1..].iter().enumerate() {
            cancel.checkpoint()?;
            renumbered.push((sibling, position + offset));
        }

        let _ = self[parent].children.remove(position);
        self[child].parent = None;
        for (sibling, index) in renumbered {
            self[sibling].index = index;
        }
        Ok(true)
    }

    /// Remove the child at `index`.
    ///
    /// # Errors
    ///
    /// See [`BoxTree::remove_child`].
    pub fn remove_child_at(&mut self, parent: BoxId, index: usize, cancel: &CancelToken) -> LayoutResult<Option<BoxId>> {
        let Some(child) = self.checked(parent)?.children.get(index).copied() else {
            return Ok(None);
        };
        let _ = self.remove_child(parent, child, cancel)?;
        Ok(Some(child))
    }

    /// Children of `id` in order.
    #[must_use]
    pub fn children(&self, id: BoxId) -> &[BoxId] {
        &self[id].children
    }

    /// Number of children.
    #[must_use]
    pub fn child_count(&self, id: BoxId) -> usize {
        self[id].children.len()
    }

    /// Child at `index`.
    #[must_use]
    pub fn child(&self, id: BoxId, index: usize) -> Option<BoxId> {
        self[id].children.get(index).copied()
    }

    /// Sibling before `id`.
    #[must_use]
    pub fn previous_sibling(&self, id: BoxId) -> Option<BoxId> {
        let node = &self[id];
        let parent = node.parent?;
        node.index.checked_sub(1).and_then(|i| self.child(parent, i))
    }

    /// Sibling after `id`.
    #[must_use]
    pub fn next_sibling(&self, id: BoxId) -> Option<BoxId> {
        let node = &self[id];
        self.child(node.parent?, node.index + 1)
    }

    /// All boxes below `id` generated by `element`, in tree order.
    #[must_use]
    pub fn element_boxes(&self, id: BoxId, element: NodeId) -> Vec<BoxId> {
        let mut result = Vec::new();
        for &child in self.children(id) {
            if self[child].element == Some(element) {
                result.push(child);
            }
            result.extend(self.element_boxes(child, element));
        }
        result
    }

    /// Tear `id` down for relayout.
    ///
    /// Children are reset first. An owned layer is detached. Layer links,
    /// painting info, content width and the working margin are cleared and
    /// the box's id and anchor name leave the id index. Resetting twice is
    /// harmless.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InternalConsistency`] for a stale handle and
    /// [`LayoutError::Cancelled`].
    pub fn reset(&mut self, ctx: &mut LayoutContext<'_>, id: BoxId) -> LayoutResult<()> {
        let _ = self.checked(id)?;
        let count = self.child_count(id);
        if count > 0 {
            self.reset_children_range(ctx, id, 0, count - 1)?;
        }
        if let Some(layer) = self[id].layer.take() {
            self.detach_layer(layer);
        }

        let node = &mut self[id];
        node.containing_layer = None;
        node.painting_info = None;
        node.content_width = 0.0;
        node.working_margin = None;
        node.state.store(LayoutState::Nothing);

        if let Some(element) = node.element.and_then(|e| ctx.dom.as_element(e)) {
            let names: Vec<String> = ctx
                .namespace
                .anchor_name(element)
                .into_iter()
                .chain(ctx.namespace.element_id(element))
                .map(str::to_string)
                .collect();
            for name in names {
                if ctx.box_by_id(&name) == Some(id) {
                    ctx.remove_box_id(&name);
                }
            }
        }
        Ok(())
    }

    /// Reset children `start..=end` of `id`.
    ///
    /// Each child is reset completely or not at all; child links and
    /// indices are never touched, so a cancelled range can be reset again.
    ///
    /// # Errors
    ///
    /// [`LayoutError::Cancelled`].
    pub fn reset_children_range(
        &mut self,
        ctx: &mut LayoutContext<'_>,
        id: BoxId,
        start: usize,
        end: usize,
    ) -> LayoutResult<()> {
        let _ = self.checked(id)?;
        for i in start..=end {
            ctx.checkpoint()?;
            if let Some(child) = self.child(id, i) {
                self.reset(ctx, child)?;
            }
        }
        Ok(())
    }

    /// Reset `id` and unlink it from its parent.
    ///
    /// # Errors
    ///
    /// [`LayoutError::Cancelled`].
    pub fn detach(&mut self, ctx: &mut LayoutContext<'_>, id: BoxId) -> LayoutResult<()> {
        self.reset(ctx, id)?;
        if let Some(parent) = self[id].parent {
            let _ = self.remove_child(parent, id, &ctx.cancel.clone())?;
        }
        Ok(())
    }

    /// Recompute the style of `id` and its descendants.
    ///
    /// 1. A pseudo-element box with an element derives the pseudo style from
    ///    that element's style.
    /// 2. A pseudo-element box without one (generated content) derives from
    ///    the grandparent's element and becomes anonymous inline.
    /// 3. Other boxes restyle from their own element (anonymous boxes get a
    ///    synthesized style with their current display), or from the
    ///    parent's element when they have none.
    ///
    /// # Errors
    ///
    /// Fatal [`crate::StyleError`]s and [`LayoutError::Cancelled`].
    pub fn restyle(&mut self, ctx: &LayoutContext<'_>, id: BoxId) -> LayoutResult<()> {
        let _ = self.checked(id)?;
        ctx.checkpoint()?;
        let node = &self[id];
        let parent_style = node.parent.map(|p| Arc::clone(&self[p].style));
        let session = ctx.session;

        let style = match (&node.pseudo_element, node.element) {
            (Some(pseudo), Some(element)) => {
                let element_style = self.element_style(ctx, parent_style.as_ref(), element)?;
                Some(session.derive_pseudo_style(&element_style, ctx.styles, element, pseudo)?)
            }
            (Some(pseudo), None) => {
                let container = node.parent.and_then(|p| self[p].parent);
                match container.and_then(|c| self[c].element.map(|e| (c, e))) {
                    Some((container, element)) => {
                        let derived =
                            session.derive_pseudo_style(&self[container].style, ctx.styles, element, pseudo)?;
                        Some(session.create_anonymous_style(&derived, &IdentValue::Inline))
                    }
                    None => None,
                }
            }
            (None, Some(element)) => {
                let style = self.element_style(ctx, parent_style.as_ref(), element)?;
                if node.anonymous {
                    Some(session.create_anonymous_style(&style, &node.style.display()))
                } else {
                    Some(style)
                }
            }
            (None, None) => match node.parent {
                Some(parent) if self[parent].element.is_some() => Some(
                    session.create_anonymous_style(&self[parent].style, &node.style.display()),
                ),
                _ => None,
            },
        };

        if let Some(style) = style {
            self[id].style = style;
        }
        for i in 0..self.child_count(id) {
            if let Some(child) = self.child(id, i) {
                self.restyle(ctx, child)?;
            }
        }
        Ok(())
    }

    fn element_style(
        &self,
        ctx: &LayoutContext<'_>,
        parent_style: Option<&Arc<CalculatedStyle>>,
        element: NodeId,
    ) -> LayoutResult<Arc<CalculatedStyle>> {
        let tag = ctx
            .dom
            .as_element(element)
            .map(|e| e.tag_name.as_str())
            .unwrap_or_default();
        Ok(ctx.session.style_for_element(parent_style, tag, ctx.styles, element)?)
    }

    /// Resolve which layer `id` paints in.
    ///
    /// A box with its own layer paints there. Otherwise it inherits the
    /// parent's containing layer, except that a block wrapped by the
    /// current inline layer belongs to that inline layer.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InternalConsistency`] when no layer can be found.
    pub fn init_containing_layer(&mut self, ctx: &LayoutContext<'_>, id: BoxId) -> LayoutResult<()> {
        if let Some(layer) = self.checked(id)?.layer {
            self[id].containing_layer = Some(layer);
            return Ok(());
        }
        if self[id].containing_layer.is_some() {
            return Ok(());
        }
        let inherited = self[id].parent.and_then(|p| self[p].containing_layer);
        let Some(mut layer) = inherited else {
            return Err(self.consistency(id, Some(ctx.dom), "no containing layer"));
        };
        if let Some(current) = ctx.current_layer()
            && self[current].inline
            && self[current].wraps(id)
        {
            layer = current;
        }
        self[id].containing_layer = Some(layer);
        Ok(())
    }

    /// Attach every descendant of `id` to the context's current layer.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InternalConsistency`] when the context has no layer.
    pub fn connect_children_to_current_layer(&mut self, ctx: &LayoutContext<'_>, id: BoxId) -> LayoutResult<()> {
        let _ = self.checked(id)?;
        let Some(layer) = ctx.current_layer() else {
            return Err(self.consistency(id, Some(ctx.dom), "no current layer"));
        };
        for i in 0..self.child_count(id) {
            ctx.checkpoint()?;
            if let Some(child) = self.child(id, i) {
                self[child].containing_layer = Some(layer);
                self.connect_children_to_current_layer(ctx, child)?;
            }
        }
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Box model
    // ----------------------------------------------------------------------

    /// Containing block: the override, else the parent.
    #[must_use]
    pub fn containing_block(&self, id: BoxId) -> Option<BoxId> {
        self[id].containing_block.or(self[id].parent)
    }

    /// Content width of the containing block, or the initial containing
    /// block width at the root.
    #[must_use]
    pub fn containing_block_width(&self, id: BoxId) -> f32 {
        self.containing_block(id)
            .map_or(self.initial_width, |cb| self[cb].content_width)
    }

    /// Margins from style, ignoring any working margin.
    #[must_use]
    pub fn style_margin(&self, id: BoxId) -> RectPropertySet {
        self[id].style.margin_rect(self.containing_block_width(id))
    }

    /// Effective margins: the working margin when present, else style.
    #[must_use]
    pub fn margin(&self, id: BoxId) -> RectPropertySet {
        self[id].working_margin.unwrap_or_else(|| self.style_margin(id))
    }

    fn working_margin(&mut self, id: BoxId) -> &mut RectPropertySet {
        let style_margin = self.style_margin(id);
        self[id].working_margin.get_or_insert(style_margin)
    }

    /// Override the top margin.
    pub fn set_margin_top(&mut self, id: BoxId, value: f32) {
        self.working_margin(id).top = value;
    }

    /// Override the bottom margin.
    pub fn set_margin_bottom(&mut self, id: BoxId, value: f32) {
        self.working_margin(id).bottom = value;
    }

    /// Override the left margin.
    pub fn set_margin_left(&mut self, id: BoxId, value: f32) {
        self.working_margin(id).left = value;
    }

    /// Override the right margin.
    pub fn set_margin_right(&mut self, id: BoxId, value: f32) {
        self.working_margin(id).right = value;
    }

    /// Restore the style top margin in an existing working margin.
    pub fn reset_top_margin(&mut self, id: BoxId) {
        let top = self.style_margin(id).top;
        if let Some(margin) = self[id].working_margin.as_mut() {
            margin.top = top;
        }
    }

    /// Padding resolved against the containing block.
    #[must_use]
    pub fn padding(&self, id: BoxId) -> RectPropertySet {
        self[id].style.padding_rect(self.containing_block_width(id))
    }

    /// Used border widths.
    #[must_use]
    pub fn border(&self, id: BoxId) -> RectPropertySet {
        self[id].style.border_rect()
    }

    /// Margin, border and padding together.
    #[must_use]
    pub fn insets(&self, id: BoxId) -> BoxInsets {
        BoxInsets {
            margin: self.margin(id),
            border: self.border(id),
            padding: self.padding(id),
        }
    }

    /// Margin + border + padding on one side.
    #[must_use]
    pub fn margin_border_padding(&self, id: BoxId, side: Side) -> f32 {
        self.insets(id).mbp(side)
    }

    /// Margin-box width.
    #[must_use]
    pub fn width(&self, id: BoxId) -> f32 {
        self[id].width()
    }

    /// The margin edge with its top-left corner at `(left, top)`, shifted by
    /// `(tx, ty)`.
    #[must_use]
    pub fn margin_edge(&self, id: BoxId, left: f32, top: f32, tx: f32, ty: f32) -> Rect {
        Rect::new(left + tx, top + ty, self[id].width(), self[id].height)
    }

    /// Margin edge minus margins. A negative margin puts this outside the
    /// margin edge.
    #[must_use]
    pub fn border_edge(&self, id: BoxId, left: f32, top: f32) -> Rect {
        self.insets(id).border_edge(&self.margin_edge(id, left, top, 0.0, 0.0))
    }

    /// Border edge minus borders.
    #[must_use]
    pub fn padding_edge(&self, id: BoxId, left: f32, top: f32) -> Rect {
        self.insets(id).padding_edge(&self.margin_edge(id, left, top, 0.0, 0.0))
    }

    /// Padding edge minus padding.
    #[must_use]
    pub fn content_area_edge(&self, id: BoxId, left: f32, top: f32) -> Rect {
        self.insets(id).content_edge(&self.margin_edge(id, left, top, 0.0, 0.0))
    }

    /// Border edge in document coordinates.
    #[must_use]
    pub fn painting_border_edge(&self, id: BoxId) -> Rect {
        self.border_edge(id, self[id].abs_x, self[id].abs_y)
    }

    /// Padding edge in document coordinates.
    #[must_use]
    pub fn painting_padding_edge(&self, id: BoxId) -> Rect {
        self.padding_edge(id, self[id].abs_x, self[id].abs_y)
    }

    /// What this box itself can paint over.
    #[must_use]
    pub fn painting_clip_edge(&self, id: BoxId) -> Rect {
        self.painting_border_edge(id)
    }

    /// Clip applied to children when overflow is not visible.
    #[must_use]
    pub fn children_clip_edge(&self, id: BoxId) -> Rect {
        self.painting_padding_edge(id)
    }

    /// Whether `overflow` applies to this box (block containers only).
    #[must_use]
    pub fn overflow_applies(&self, id: BoxId) -> bool {
        matches!(self[id].kind, BoxKind::Block)
    }

    /// Whether `id` clips its children.
    #[must_use]
    pub fn clips_children(&self, id: BoxId) -> bool {
        self.overflow_applies(id) && !self[id].style.is_overflow_visible()
    }

    // ----------------------------------------------------------------------
    // Geometry passes
    // ----------------------------------------------------------------------

    /// [§ 9.4.3 Relative positioning](https://www.w3.org/TR/CSS2/visuren.html#relative-positioning)
    ///
    /// Shift by `left` (else `right`) and `top` (else `bottom`). Horizontal
    /// percentages use the containing block width; vertical ones its
    /// specified height, or 0 when that is `auto`.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InternalConsistency`] without a containing block.
    pub fn position_relative(&mut self, id: BoxId) -> LayoutResult<(f32, f32)> {
        let Some(cb) = self.containing_block(id) else {
            return Err(self.consistency(id, None, "relative box without containing block"));
        };
        let style = Arc::clone(&self[id].style);
        let cb_width = self[cb].content_width;

        let mut dx = 0.0;
        if !style.is_auto(CssName::Left) {
            dx = style.length_px(CssName::Left, cb_width).unwrap_or(0.0);
        } else if !style.is_auto(CssName::Right) {
            dx = -style.length_px(CssName::Right, cb_width).unwrap_or(0.0);
        }

        let cb_style = &self[cb].style;
        let cb_height = if !cb_style.is_auto_height() {
            cb_style.length_px(CssName::Height, 0.0).unwrap_or(0.0)
        } else if style.is_ident(CssName::Display, &IdentValue::InlineBlock) {
            self[cb].height
        } else {
            0.0
        };

        let mut dy = 0.0;
        if !style.is_auto(CssName::Top) {
            dy = style.length_px(CssName::Top, cb_height).unwrap_or(0.0);
        } else if !style.is_auto(CssName::Bottom) {
            dy = -style.length_px(CssName::Bottom, cb_height).unwrap_or(0.0);
        }

        let node = &mut self[id];
        node.x += dx;
        node.y += dy;
        node.relative_offset = Some((dx, dy));
        Ok((dx, dy))
    }

    /// Derive document coordinates of `id` from its parent.
    pub fn calc_canvas_location(&mut self, id: BoxId) {
        let (abs_x, abs_y) = match self[id].parent {
            Some(parent) => {
                let p = &self[parent];
                (p.abs_x + p.tx + self[id].x, p.abs_y + p.ty + self[id].y)
            }
            None => (self[id].x, self[id].y),
        };
        self[id].abs_x = abs_x;
        self[id].abs_y = abs_y;
    }

    /// Recompute document coordinates for every descendant of `id`.
    ///
    /// # Errors
    ///
    /// [`LayoutError::Cancelled`].
    pub fn calc_child_locations(&mut self, id: BoxId, cancel: &CancelToken) -> LayoutResult<()> {
        for i in 0..self.child_count(id) {
            cancel.checkpoint()?;
            if let Some(child) = self.child(id, i) {
                self.calc_canvas_location(child);
                self.calc_child_locations(child, cancel)?;
            }
        }
        Ok(())
    }

    /// Aggregate paint bounds of the subtree at `id`, cached on the box.
    ///
    /// Children are skipped when this box clips its overflow.
    pub fn calc_painting_info(&mut self, id: BoxId, use_cache: bool) -> PaintingInfo {
        if use_cache && let Some(cached) = self[id].painting_info {
            return cached;
        }
        let node = &self[id];
        let bounds = self.margin_edge(id, node.abs_x, node.abs_y, 0.0, 0.0);
        let mut result = PaintingInfo {
            outer_margin_corner: (bounds.right(), bounds.bottom()),
            aggregate_bounds: self.painting_clip_edge(id),
        };
        if !self.clips_children(id) {
            for i in 0..self.child_count(id) {
                if let Some(child) = self.child(id, i) {
                    let info = self.calc_painting_info(child, use_cache);
                    result.move_if_greater(&info);
                    result.aggregate_bounds = result.aggregate_bounds.union(&info.aggregate_bounds);
                }
            }
        }
        self[id].painting_info = Some(result);
        result
    }

    /// Innermost visible box whose content area contains the document
    /// point `(x, y)`.
    #[must_use]
    pub fn find(&self, id: BoxId, x: f32, y: f32) -> Option<BoxId> {
        if let Some(info) = &self[id].painting_info
            && !info.aggregate_bounds.contains(x, y)
        {
            return None;
        }
        if let Some(found) = self.children(id).iter().find_map(|&child| self.find(child, x, y)) {
            return Some(found);
        }
        let edge = self.content_area_edge(id, self[id].abs_x, self[id].abs_y);
        (edge.contains(x, y) && self[id].style.is_visible()).then_some(id)
    }

    /// Record the vertical extent of `id` and its subtree per page.
    pub fn analyze_page_breaks(&self, id: BoxId, pages: &[PageBox], container: &mut ContentLimitContainer) {
        let node = &self[id];
        container.update_top(pages, node.abs_y);
        for &child in self.children(id) {
            self.analyze_page_breaks(child, pages, container);
        }
        container.update_bottom(pages, node.abs_y + node.height);
    }

    // ----------------------------------------------------------------------
    // Queries
    // ----------------------------------------------------------------------

    /// Box generated by the document element.
    #[must_use]
    pub fn is_root(&self, dom: &DomTree, id: BoxId) -> bool {
        let node = &self[id];
        !node.anonymous && node.element.is_some() && node.element == dom.document_element()
    }

    /// Child of the root box.
    #[must_use]
    pub fn is_body(&self, dom: &DomTree, id: BoxId) -> bool {
        self[id].parent.is_some_and(|p| self.is_root(dom, p))
    }

    /// Whether `id` is connected to the root box.
    ///
    /// # Errors
    ///
    /// [`LayoutError::Cancelled`].
    pub fn is_in_document_flow(&self, dom: &DomTree, id: BoxId, cancel: &CancelToken) -> LayoutResult<bool> {
        let mut flow_root = id;
        while let Some(parent) = self[flow_root].parent {
            cancel.checkpoint()?;
            flow_root = parent;
        }
        Ok(self.is_root(dom, flow_root))
    }

    /// First background color found walking up the containing blocks, then
    /// the page background, then white.
    ///
    /// # Errors
    ///
    /// [`LayoutError::Cancelled`].
    pub fn effective_background_color(
        &self,
        id: BoxId,
        page_background: Option<RgbColor>,
        cancel: &CancelToken,
    ) -> LayoutResult<ColorValue> {
        let mut current = Some(id);
        while let Some(box_id) = current {
            cancel.checkpoint()?;
            if let Some(color) = self[box_id].style.background_color() {
                return Ok(color);
            }
            current = self.containing_block(box_id);
        }
        Ok(ColorValue::Rgb(page_background.unwrap_or(RgbColor::WHITE)))
    }

    /// Indented text dump of the subtree at `id`.
    #[must_use]
    pub fn dump(&self, dom: &DomTree, id: BoxId) -> String {
        let mut out = String::new();
        self.dump_into(dom, id, 0, &mut out);
        out
    }

    fn dump_into(&self, dom: &DomTree, id: BoxId, depth: usize, out: &mut String) {
        let node = &self[id];
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{indent}{}", node.kind.label());
        match node.element.and_then(|e| dom.as_element(e)) {
            Some(element) => {
                let _ = write!(out, " <{}>", element.tag_name);
            }
            None if node.anonymous => out.push_str(" (anonymous)"),
            None => {}
        }
        if let Some(pseudo) = &node.pseudo_element {
            let _ = write!(out, " ::{pseudo}");
        }
        let _ = write!(
            out,
            " #{} ({}, {}) {}x{} {}",
            id.0,
            node.abs_x,
            node.abs_y,
            node.width(),
            node.height,
            node.state.load()
        );
        if let BoxKind::Text { text, .. } = &node.kind {
            let _ = write!(out, " {text:?}");
        }
        out.push('\n');
        for &child in self.children(id) {
            self.dump_into(dom, child, depth + 1, out);
        }
    }
}
