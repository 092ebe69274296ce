//! Decoded image resources keyed by URI.
//!
//! [§ 4.8.3 The img element](https://html.spec.whatwg.org/multipage/embedded-content.html#the-img-element)
//!
//! The backend never fetches. Callers hand over either raw RGBA buffers or
//! encoded bytes they already read; both end up as premultiplied
//! `tiny-skia` pixmaps ready for `draw_pixmap`.

use std::collections::HashMap;

use tiny_skia::{IntSize, Pixmap};

use crate::error::{RenderError, RenderResult};

/// Image resources available to a raster device.
#[derive(Default)]
pub struct ImageStore {
    images: HashMap<String, Pixmap>,
}

impl ImageStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register straight-alpha RGBA pixels for `uri`.
    ///
    /// # Errors
    ///
    /// [`RenderError::InvalidSize`] for a zero dimension and
    /// [`RenderError::BufferLength`] when `rgba` does not hold
    /// `width * height` pixels.
    pub fn insert_rgba(&mut self, uri: &str, width: u32, height: u32, mut rgba: Vec<u8>) -> RenderResult<()> {
        let size = IntSize::from_wh(width, height).ok_or(RenderError::InvalidSize { width, height })?;
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(RenderError::BufferLength {
                uri: uri.to_string(),
                expected,
                actual: rgba.len(),
            });
        }
        premultiply(&mut rgba);
        let pixmap = Pixmap::from_vec(rgba, size).ok_or(RenderError::InvalidSize { width, height })?;
        if self.images.insert(uri.to_string(), pixmap).is_some() {
            log::debug!("replaced image '{uri}'");
        }
        Ok(())
    }

    /// Decode PNG, JPEG or GIF bytes and register them for `uri`.
    ///
    /// # Errors
    ///
    /// [`RenderError::Image`] when the bytes cannot be decoded.
    pub fn insert_encoded(&mut self, uri: &str, bytes: &[u8]) -> RenderResult<()> {
        let decoded = image::load_from_memory(bytes).map_err(|source| RenderError::Image {
            uri: uri.to_string(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        self.insert_rgba(uri, width, height, rgba.into_raw())
    }

    /// The pixmap registered for `uri`.
    #[must_use]
    pub fn get(&self, uri: &str) -> Option<&Pixmap> {
        self.images.get(uri)
    }

    /// Number of registered images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether no image is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Natural sizes in px, in the form layout takes for replaced content.
    #[must_use]
    pub fn sizes(&self) -> HashMap<String, (f32, f32)> {
        self.images
            .iter()
            .map(|(uri, pixmap)| (uri.clone(), (pixmap.width() as f32, pixmap.height() as f32)))
            .collect()
    }
}

fn premultiply(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for channel in &mut px[..3] {
            *channel = ((u16::from(*channel) * a + 127) / 255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premultiplies_translucent_pixels() {
        let mut px = vec![200, 100, 0, 128, 10, 20, 30, 255];
        premultiply(&mut px);
        assert_eq!(px, vec![100, 50, 0, 128, 10, 20, 30, 255]);
    }
}
