//! System fonts and fontdue-backed text measurement.
//!
//! [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)

use fontdue::{Font, FontSettings};
use folio_css::layout::{ApproximateFontMetrics, FontMetrics};

/// Regular faces, searched in order.
const REGULAR_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const BOLD_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

const ITALIC_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Oblique.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Oblique.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Italic.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansOblique.ttf",
    "/System/Library/Fonts/Supplemental/Arial Italic.ttf",
    "C:\\Windows\\Fonts\\ariali.ttf",
];

const BOLD_ITALIC_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-BoldOblique.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-BoldOblique.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-BoldItalic.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBoldOblique.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold Italic.ttf",
    "C:\\Windows\\Fonts\\arialbi.ttf",
];

/// Weight from which the bold face is used.
const BOLD_WEIGHT: u16 = 600;

/// The four faces of one sans-serif family. Missing variants fall back to
/// the closest loaded face; a set without a regular face draws no text.
#[derive(Default)]
pub struct FontSet {
    regular: Option<Font>,
    bold: Option<Font>,
    italic: Option<Font>,
    bold_italic: Option<Font>,
}

impl FontSet {
    /// A set with no faces. Layout falls back to approximate metrics.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load whichever faces are installed at the usual system paths.
    #[must_use]
    pub fn load_system() -> Self {
        let set = Self {
            regular: load_first(REGULAR_PATHS, "regular"),
            bold: load_first(BOLD_PATHS, "bold"),
            italic: load_first(ITALIC_PATHS, "italic"),
            bold_italic: load_first(BOLD_ITALIC_PATHS, "bold-italic"),
        };
        if set.regular.is_none() {
            let _ = folio_common::warning::warn_once(
                "fonts",
                "no system font found; text will be measured approximately and not drawn",
            );
        }
        set
    }

    /// A set whose every face is `font`.
    ///
    /// # Errors
    ///
    /// The fontdue parse error when `data` is not a usable font.
    pub fn from_bytes(data: &[u8]) -> Result<Self, &'static str> {
        let font = Font::from_bytes(data, FontSettings::default())?;
        Ok(Self {
            regular: Some(font),
            ..Self::default()
        })
    }

    /// Whether a face for plain text is available.
    #[must_use]
    pub const fn has_text_face(&self) -> bool {
        self.regular.is_some()
    }

    /// Best face for `weight` and `italic`, falling back through the partial
    /// matches to the regular face.
    #[must_use]
    pub fn select(&self, weight: u16, italic: bool) -> Option<&Font> {
        let bold = weight >= BOLD_WEIGHT;
        match (bold, italic) {
            (true, true) => self
                .bold_italic
                .as_ref()
                .or(self.bold.as_ref())
                .or(self.italic.as_ref())
                .or(self.regular.as_ref()),
            (true, false) => self.bold.as_ref().or(self.regular.as_ref()),
            (false, true) => self.italic.as_ref().or(self.regular.as_ref()),
            (false, false) => self.regular.as_ref(),
        }
    }

    /// Metrics for layout: fontdue advances of the regular face, or the
    /// fixed-ratio approximation when no face is loaded.
    #[must_use]
    pub fn layout_metrics(&self) -> Box<dyn FontMetrics + '_> {
        match &self.regular {
            Some(font) => Box::new(FontdueFontMetrics::new(font)),
            None => Box::new(ApproximateFontMetrics),
        }
    }
}

fn load_first(paths: &[&str], label: &str) -> Option<Font> {
    paths.iter().find_map(|path| {
        let data = std::fs::read(path).ok()?;
        match Font::from_bytes(data, FontSettings::default()) {
            Ok(font) => {
                log::debug!("loaded {label} font: {path}");
                Some(font)
            }
            Err(e) => {
                log::debug!("skipping {path}: {e}");
                None
            }
        }
    })
}

/// Font metrics backed by fontdue's per-glyph advances.
///
/// Uses `Font::metrics()` rather than `Font::rasterize()`: layout needs
/// advances, not bitmaps.
pub struct FontdueFontMetrics<'a> {
    font: &'a Font,
}

impl<'a> FontdueFontMetrics<'a> {
    /// Measure with `font`.
    #[must_use]
    pub const fn new(font: &'a Font) -> Self {
        Self { font }
    }
}

impl FontMetrics for FontdueFontMetrics<'_> {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .filter(|ch| !ch.is_control())
            .map(|ch| self.font.metrics(ch, font_size).advance_width)
            .sum()
    }

    fn line_height(&self, font_size: f32) -> f32 {
        // [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#leading)
        //
        // "We recommend a used value for 'normal' between 1.0 and 1.2."
        self.font
            .horizontal_line_metrics(font_size)
            .map_or(font_size * 1.2, |m| m.new_line_size.clamp(font_size, font_size * 1.2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_has_no_faces() {
        let fonts = FontSet::empty();
        assert!(!fonts.has_text_face());
        assert!(fonts.select(700, true).is_none());
    }

    #[test]
    fn empty_set_measures_approximately() {
        let fonts = FontSet::empty();
        let metrics = fonts.layout_metrics();
        assert!((metrics.text_width("abcde", 10.0) - 30.0).abs() < f32::EPSILON);
        assert!((metrics.line_height(10.0) - 12.0).abs() < f32::EPSILON);
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(FontSet::from_bytes(b"not a font").is_err());
    }
}
