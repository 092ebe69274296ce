//! Stacking contexts.
//!
//! [§ 9.9 Layered presentation](https://www.w3.org/TR/CSS2/visuren.html#layers)
//!
//! "An element in CSS 2 may have a stack level, which describes its position
//! within a set of elements sharing the same stacking context."
//!
//! [CSS 2.1 Appendix E: Elaborate description of Stacking Contexts](https://www.w3.org/TR/CSS2/zindex.html)

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use super::page::{PageBox, PageConfig};
use super::tree::BoxId;

/// Handle of a [`Layer`] in the tree's layer arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LayerId(pub usize);

/// [§ 9.9.1 Specifying the stack level: the 'z-index' property](https://www.w3.org/TR/CSS2/visuren.html#z-index)
///
/// "auto: The stack level of the generated box in the current stacking
/// context is 0. The box does not establish a new stacking context unless it
/// is the root element."
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ZIndex {
    /// "The stack level is 0. Does not establish a new stacking context."
    #[default]
    Auto,
    /// "This integer is the stack level. Establishes a new stacking context."
    Integer(i32),
}

impl ZIndex {
    /// Stack level used for ordering; `auto` counts as 0.
    #[must_use]
    pub const fn stack_level(self) -> i32 {
        match self {
            Self::Auto => 0,
            Self::Integer(level) => level,
        }
    }
}

/// A stacking context rooted at a master box.
///
/// The document's root layer also owns the page list.
#[derive(Debug, Clone)]
pub struct Layer {
    /// The box that establishes this layer.
    pub master: BoxId,
    /// Enclosing layer; `None` for the root layer and for detached layers.
    pub parent: Option<LayerId>,
    /// Child layers in creation (document) order.
    pub children: Vec<LayerId>,
    /// Stack level within the parent layer.
    pub z_index: ZIndex,
    /// Established by an inline box.
    pub inline: bool,
    wrapped_content: HashSet<BoxId>,
    pages: Vec<PageBox>,
    detached: bool,
}

impl Layer {
    /// A fresh layer for `master`.
    #[must_use]
    pub fn new(master: BoxId, parent: Option<LayerId>, z_index: ZIndex, inline: bool) -> Self {
        Self {
            master,
            parent,
            children: Vec::new(),
            z_index,
            inline,
            wrapped_content: HashSet::new(),
            pages: Vec::new(),
            detached: false,
        }
    }

    /// Whether this layer has no parent and is still attached.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none() && !self.detached
    }

    /// Whether [`detach`](Self::mark_detached) has been called.
    #[must_use]
    pub const fn is_detached(&self) -> bool {
        self.detached
    }

    /// Drop the parent link and the pages.
    pub(crate) fn mark_detached(&mut self) {
        self.parent = None;
        self.children.clear();
        self.pages.clear();
        self.wrapped_content.clear();
        self.detached = true;
    }

    /// Record block boxes that the master inline box wraps.
    pub fn wrap_content(&mut self, boxes: impl IntoIterator<Item = BoxId>) {
        self.wrapped_content.extend(boxes);
    }

    /// Whether `id` is a block directly wrapped by this (inline) layer.
    #[must_use]
    pub fn wraps(&self, id: BoxId) -> bool {
        self.wrapped_content.contains(&id)
    }

    /// The page list (empty except on the root layer).
    #[must_use]
    pub fn pages(&self) -> &[PageBox] {
        &self.pages
    }

    /// The last page, if any.
    #[must_use]
    pub fn last_page(&self) -> Option<&PageBox> {
        self.pages.last()
    }

    /// Append a page below the current last one.
    pub fn add_page(&mut self, config: &PageConfig, name: Option<String>) -> &PageBox {
        let top = self.pages.last().map_or(0.0, |p| p.bottom);
        let page_no = self.pages.len();
        self.pages.push(PageBox::new(page_no, top, config, name));
        &self.pages[page_no]
    }

    /// Remove and return the last page.
    pub fn remove_last_page(&mut self) -> Option<PageBox> {
        self.pages.pop()
    }

    /// Index of the page whose span contains document y `y`.
    #[must_use]
    pub fn page_index_at(&self, y: f32) -> Option<usize> {
        let index = self
            .pages
            .binary_search_by(|page| {
                if y < page.top {
                    Ordering::Greater
                } else if y >= page.bottom {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            })
            .ok()?;
        Some(index)
    }

    /// Set the name of page `index`.
    pub fn set_page_name(&mut self, index: usize, name: Option<String>) {
        if let Some(page) = self.pages.get_mut(index) {
            page.name = name;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_are_contiguous() {
        let config = PageConfig::with_size(100.0, 120.0, 10.0);
        let mut layer = Layer::new(BoxId(0), None, ZIndex::Auto, false);
        let _ = layer.add_page(&config, None);
        let _ = layer.add_page(&config, Some("cover".into()));
        assert_eq!(layer.pages().len(), 2);
        assert!((layer.pages()[1].top - 100.0).abs() < f32::EPSILON);
        assert_eq!(layer.page_index_at(99.0), Some(0));
        assert_eq!(layer.page_index_at(100.0), Some(1));
        assert_eq!(layer.page_index_at(200.0), None);
        assert_eq!(layer.remove_last_page().and_then(|p| p.name), Some("cover".into()));
    }

    #[test]
    fn test_z_index_stack_level() {
        assert_eq!(ZIndex::Auto.stack_level(), 0);
        assert_eq!(ZIndex::Integer(-2).stack_level(), -2);
    }
}
