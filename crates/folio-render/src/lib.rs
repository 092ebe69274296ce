//! Raster backend for Folio display lists.
//!
//! [`RasterDevice`] implements [`folio_css::DisplayListOutputDevice`] over a
//! `tiny-skia` pixmap; fonts come from [`FontSet`] (fontdue) and images from
//! an [`ImageStore`] of already-decoded buffers. The geometry-only
//! [`RecordingDevice`] is re-exported for callers that want to inspect a
//! list without rasterizing it.

/// Render error types.
pub mod error;
/// System fonts and fontdue metrics.
pub mod fonts;
/// Decoded image resources.
pub mod images;
/// The tiny-skia device.
pub mod raster;

pub use error::{RenderError, RenderResult};
pub use fonts::{FontSet, FontdueFontMetrics};
pub use folio_css::paint::RecordingDevice;
pub use images::ImageStore;
pub use raster::{render_page, RasterDevice};
