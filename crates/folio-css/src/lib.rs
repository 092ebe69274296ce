//! Style resolution, paginated layout and display-list painting for Folio.
//!
//! # Scope
//!
//! - **Style values** ([CSS Values Level 4](https://www.w3.org/TR/css-values-4/))
//!   - Per-property grammars and shorthand expansion
//!   - Cascade by origin and importance, inheritance, `inherit`
//!   - Session-wide color interning
//!
//! - **Box tree** ([§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen))
//!   - Arena of boxes and stacking-context layers
//!   - Anonymous block boxes and block-in-inline splitting
//!
//! - **Layout** ([CSS 2.1 § 10](https://www.w3.org/TR/CSS2/visudet.html))
//!   - Block widths and heights, margin collapsing, relative and absolute
//!     positioning
//!   - Line breaking and `text-align`, including justification
//!   - Pages, forced breaks with left/right parity, `page-break-inside: avoid`
//!
//! - **Painting** ([CSS 2.1 Appendix E](https://www.w3.org/TR/CSS2/zindex.html))
//!   - Backend-agnostic display lists, one per page
//!
//! # Not Yet Implemented
//!
//! - Floats, tables and flex layout
//! - Selector matching (declarations arrive already matched per element)

/// Style and layout error types.
pub mod error;
/// Box tree, layers, pages and the layout passes.
pub mod layout;
/// Display lists and the painter.
pub mod paint;
/// Typed style values and the cascade.
pub mod style;

pub use error::{LayoutError, LayoutResult, StyleError};
pub use layout::{
    build_box_tree, layout_document, BoxId, BoxKind, BoxTree, LayoutContext, LayoutOptions, PageConfig, Rect,
};
pub use paint::{DisplayList, DisplayListOutputDevice, DlItem, Painter};
pub use style::{CalculatedStyle, ColorValue, MapStyleSource, StyleSession, StyleSource};
