//! State shared by every box during one layout pass.

use std::collections::HashMap;

use folio_common::CancelToken;
use folio_dom::{DomTree, HtmlNamespaceHandler, NamespaceHandler};

use super::inline::{ApproximateFontMetrics, FontMetrics};
use super::layer::LayerId;
use super::page::{LayoutOptions, PageConfig};
use super::tree::BoxId;
use crate::error::LayoutResult;
use crate::style::{StyleSession, StyleSource};

static HTML: HtmlNamespaceHandler = HtmlNamespaceHandler;
static APPROXIMATE: ApproximateFontMetrics = ApproximateFontMetrics;

/// Everything a layout pass needs besides the box tree itself.
///
/// The context borrows the document, its style feed and the style session;
/// it owns the per-pass state (layer stack, id index, page names).
pub struct LayoutContext<'a> {
    /// The markup tree being laid out.
    pub dom: &'a DomTree,
    /// Per-element declarations.
    pub styles: &'a dyn StyleSource,
    /// Style resolution state for this document.
    pub session: &'a StyleSession,
    /// Attribute interpretation for the markup vocabulary.
    pub namespace: &'a dyn NamespaceHandler,
    /// Text measurement.
    pub metrics: &'a dyn FontMetrics,
    /// Page geometry and flags.
    pub options: LayoutOptions,
    /// Boxes registered under element ids and anchor names.
    pub id_index: HashMap<String, BoxId>,
    /// The root layer, once created.
    pub root_layer: Option<LayerId>,
    /// Name of the page currently being filled.
    pub page_name: Option<String>,
    /// Name waiting to apply to the next page.
    pub pending_page_name: Option<String>,
    /// Space reserved at the top of each page's content area; taken from
    /// [`PageConfig::extra_space_top`].
    pub extra_space_top: f32,
    /// Space reserved at the bottom of each page's content area.
    pub extra_space_bottom: f32,
    /// Cooperative cancellation.
    pub cancel: CancelToken,
    /// Intrinsic sizes of replaced content, keyed by resource URI.
    pub image_sizes: HashMap<String, (f32, f32)>,
    layers: Vec<LayerId>,
}

impl<'a> LayoutContext<'a> {
    /// A context with HTML attribute rules and approximate font metrics.
    #[must_use]
    pub fn new(dom: &'a DomTree, styles: &'a dyn StyleSource, session: &'a StyleSession) -> Self {
        let options = LayoutOptions::default();
        Self {
            dom,
            styles,
            session,
            namespace: &HTML,
            metrics: &APPROXIMATE,
            extra_space_top: options.page.extra_space_top,
            extra_space_bottom: options.page.extra_space_bottom,
            options,
            id_index: HashMap::new(),
            root_layer: None,
            page_name: None,
            pending_page_name: None,
            cancel: CancelToken::new(),
            image_sizes: HashMap::new(),
            layers: Vec::new(),
        }
    }

    /// Replace the layout options. The reserved page space follows the new
    /// page configuration.
    #[must_use]
    pub fn with_options(mut self, options: LayoutOptions) -> Self {
        self.extra_space_top = options.page.extra_space_top;
        self.extra_space_bottom = options.page.extra_space_bottom;
        self.options = options;
        self
    }

    /// Replace the font metrics.
    #[must_use]
    pub fn with_metrics(mut self, metrics: &'a dyn FontMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace the namespace handler.
    #[must_use]
    pub fn with_namespace(mut self, namespace: &'a dyn NamespaceHandler) -> Self {
        self.namespace = namespace;
        self
    }

    /// Use `cancel` for every checkpoint in this pass.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Use `sizes` as the intrinsic sizes of images.
    #[must_use]
    pub fn with_image_sizes(mut self, sizes: HashMap<String, (f32, f32)>) -> Self {
        self.image_sizes = sizes;
        self
    }

    /// Page geometry.
    #[must_use]
    pub const fn page_config(&self) -> &PageConfig {
        &self.options.page
    }

    /// Whether forced and soft page breaks apply.
    #[must_use]
    pub const fn page_breaks_allowed(&self) -> bool {
        self.options.page_breaks_allowed
    }

    /// Poll the cancellation token.
    ///
    /// # Errors
    ///
    /// [`crate::LayoutError::Cancelled`] once cancellation was requested.
    pub fn checkpoint(&self) -> LayoutResult<()> {
        Ok(self.cancel.checkpoint()?)
    }

    /// The layer boxes currently attach to.
    #[must_use]
    pub fn current_layer(&self) -> Option<LayerId> {
        self.layers.last().copied()
    }

    /// Enter `layer` for the boxes laid out next.
    pub fn push_layer(&mut self, layer: LayerId) {
        self.layers.push(layer);
    }

    /// Leave the current layer.
    pub fn pop_layer(&mut self) -> Option<LayerId> {
        self.layers.pop()
    }

    /// Register `id` under `name` in the id index.
    pub fn add_box_id(&mut self, name: &str, id: BoxId) {
        let _ = self.id_index.insert(name.to_string(), id);
    }

    /// Drop `name` from the id index.
    pub fn remove_box_id(&mut self, name: &str) {
        let _ = self.id_index.remove(name);
    }

    /// The box registered under `name`.
    #[must_use]
    pub fn box_by_id(&self, name: &str) -> Option<BoxId> {
        self.id_index.get(name).copied()
    }
}
