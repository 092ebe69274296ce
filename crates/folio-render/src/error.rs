//! Errors raised by the raster backend.

use folio_common::Cancelled;

/// Raster backend errors.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The requested surface has a zero or unrepresentable size.
    #[error("invalid surface size {width}x{height}")]
    InvalidSize {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// An RGBA buffer does not hold `width * height * 4` bytes.
    #[error("image '{uri}': expected {expected} bytes of RGBA data, got {actual}")]
    BufferLength {
        /// Resource key.
        uri: String,
        /// Bytes required by the dimensions.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },

    /// Decoding or encoding through the `image` crate failed.
    #[error("image '{uri}': {source}")]
    Image {
        /// Resource key or output path.
        uri: String,
        /// Underlying error.
        #[source]
        source: image::ImageError,
    },

    /// Replay was cancelled.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Result alias for the raster backend.
pub type RenderResult<T> = Result<T, RenderError>;
