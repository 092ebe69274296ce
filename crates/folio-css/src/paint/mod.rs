//! Painting
//!
//! [CSS 2.1 Appendix E - Elaborate description of Stacking Contexts](https://www.w3.org/TR/CSS2/zindex.html)
//!
//! Converts a laid-out box tree into display lists of drawing instructions,
//! one per page. Any backend that implements
//! [`DisplayListOutputDevice`] can replay them.
//!
//! ```text
//! Style → Layout → Paint → Render
//!                    ↓
//!              DisplayList
//! ```

mod display_list;
mod painter;
mod replay;

pub use display_list::{
    DisplayList, DlItem, JustificationInfo, LinearGradient, Operation, PathSegment, PositionedGlyph, StopPoint,
};
pub use painter::Painter;
pub use replay::{adjust_glyph_positions, DisplayListOutputDevice, RecordedOp, RecordingDevice};
