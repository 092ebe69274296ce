//! Paginated box layout
//!
//! [CSS 2.1 Visual Formatting Model](https://www.w3.org/TR/CSS2/visuren.html)
//! and [CSS Paged Media Module Level 3](https://www.w3.org/TR/css-page-3/).
//!
//! # Module Structure
//!
//! - [`box_model`] - Rectangles, edge sizes and insets
//! - [`tree`] - The box arena: structure, edges, geometry queries
//! - [`layer`] - Stacking contexts; the root layer owns the pages
//! - [`page`] - Page geometry and layout options
//! - [`builder`] - Box generation from the markup tree
//! - [`block`] - Block layout, margin collapsing and page breaks
//! - [`inline`] - Line boxes and text fragments
//! - [`pagination`] - Page lookup and forced breaks

pub mod block;
pub mod box_model;
pub mod builder;
pub mod context;
pub mod inline;
pub mod layer;
pub mod page;
pub mod pagination;
pub mod state;
pub mod tree;

pub use block::{collapse_margins, layout_block, layout_document};
pub use box_model::{BoxInsets, PaintingInfo, Rect, RectPropertySet, Side};
pub use builder::build_box_tree;
pub use context::LayoutContext;
pub use inline::{ApproximateFontMetrics, FontMetrics, InlineLayout, LineBox, LineFragment, PageBreaker, TextStyle};
pub use layer::{Layer, LayerId, ZIndex};
pub use page::{LayoutOptions, PageBox, PageConfig};
pub use pagination::{ContentLimit, ContentLimitContainer};
pub use state::{AtomicLayoutState, LayoutState};
pub use tree::{BoxId, BoxKind, BoxNode, BoxTree, TextFragment};
