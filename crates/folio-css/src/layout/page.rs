//! Print pages and page configuration.
//!
//! [CSS Paged Media Module Level 3](https://www.w3.org/TR/css-page-3/)

use serde::{Deserialize, Serialize};

use super::box_model::Rect;
use crate::style::color::RgbColor;

/// Page size and margins, in CSS pixels (96 per inch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Full page width.
    pub width: f32,
    /// Full page height.
    pub height: f32,
    /// Top page margin.
    pub margin_top: f32,
    /// Right page margin.
    pub margin_right: f32,
    /// Bottom page margin.
    pub margin_bottom: f32,
    /// Left page margin.
    pub margin_left: f32,
    /// Number pages so that the first page is a left-hand page.
    pub first_page_is_left: bool,
    /// Page background, painted under everything else.
    pub background: Option<RgbColor>,
    /// Space kept free at the top of each page's content area. Content
    /// pushed to a new page starts below it.
    pub extra_space_top: f32,
    /// Space kept free at the bottom of each page's content area.
    pub extra_space_bottom: f32,
}

impl PageConfig {
    /// ISO A4 (210mm × 297mm) with 2cm margins.
    #[must_use]
    pub fn a4() -> Self {
        Self::with_size(793.7, 1122.5, 75.6)
    }

    /// US Letter (8.5in × 11in) with 0.75in margins.
    #[must_use]
    pub fn letter() -> Self {
        Self::with_size(816.0, 1056.0, 72.0)
    }

    /// A page of the given size with equal margins on all sides.
    #[must_use]
    pub const fn with_size(width: f32, height: f32, margin: f32) -> Self {
        Self {
            width,
            height,
            margin_top: margin,
            margin_right: margin,
            margin_bottom: margin,
            margin_left: margin,
            first_page_is_left: false,
            background: None,
            extra_space_top: 0.0,
            extra_space_bottom: 0.0,
        }
    }

    /// Look up a preset by name.
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "a4" => Some(Self::a4()),
            "letter" => Some(Self::letter()),
            _ => None,
        }
    }

    /// Width available to content.
    #[must_use]
    pub fn content_width(&self) -> f32 {
        (self.width - self.margin_left - self.margin_right).max(0.0)
    }

    /// Height available to content on one page.
    #[must_use]
    pub fn content_height(&self) -> f32 {
        (self.height - self.margin_top - self.margin_bottom).max(0.0)
    }

    /// Whether zero-based page `page_no` is a left-hand (verso) page.
    #[must_use]
    pub const fn is_left_page(&self, page_no: usize) -> bool {
        (page_no % 2 == 1) != self.first_page_is_left
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self::a4()
    }
}

/// Options for one layout pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Page geometry.
    pub page: PageConfig,
    /// Honour forced and soft page breaks. When off, the document is one
    /// long page.
    pub page_breaks_allowed: bool,
    /// Paint for print (page-relative coordinates, links as annotations).
    pub print: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            page: PageConfig::default(),
            page_breaks_allowed: true,
            print: true,
        }
    }
}

/// One printable page of the root layer.
///
/// `top` and `bottom` bound the page's content area in document
/// coordinates; the page margins lie outside that span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageBox {
    /// Zero-based page number.
    pub page_no: usize,
    /// Document y of the first content row on this page.
    pub top: f32,
    /// Document y just below the last content row on this page.
    pub bottom: f32,
    /// Named page (`page: <name>`), if any.
    pub name: Option<String>,
    first_is_left: bool,
}

impl PageBox {
    /// A page starting at document y `top`.
    #[must_use]
    pub fn new(page_no: usize, top: f32, config: &PageConfig, name: Option<String>) -> Self {
        Self {
            page_no,
            top,
            bottom: top + config.content_height(),
            name,
            first_is_left: config.first_page_is_left,
        }
    }

    /// Height of the content area.
    #[must_use]
    pub fn content_height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Left-hand (verso) page. With a right-hand first page, odd page
    /// numbers are left pages.
    #[must_use]
    pub const fn is_left_page(&self) -> bool {
        (self.page_no % 2 == 1) != self.first_is_left
    }

    /// Right-hand (recto) page.
    #[must_use]
    pub const fn is_right_page(&self) -> bool {
        !self.is_left_page()
    }

    /// Whether document y `y` falls on this page.
    #[must_use]
    pub fn contains_y(&self, y: f32) -> bool {
        y >= self.top && y < self.bottom
    }

    /// The page's content area in document coordinates.
    #[must_use]
    pub fn document_rect(&self, config: &PageConfig) -> Rect {
        Rect::new(0.0, self.top, config.content_width(), self.content_height())
    }

    /// The page's content area in page coordinates.
    #[must_use]
    pub fn content_rect(&self, config: &PageConfig) -> Rect {
        Rect::new(
            config.margin_left,
            config.margin_top,
            config.content_width(),
            self.content_height(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_follows_first_page_side() {
        let mut config = PageConfig::letter();
        let first = PageBox::new(0, 0.0, &config, None);
        assert!(first.is_right_page());
        assert!(PageBox::new(1, 0.0, &config, None).is_left_page());

        config.first_page_is_left = true;
        assert!(PageBox::new(0, 0.0, &config, None).is_left_page());
    }

    #[test]
    fn test_content_height() {
        let config = PageConfig::with_size(200.0, 300.0, 50.0);
        let page = PageBox::new(0, 0.0, &config, None);
        assert!((page.content_height() - 200.0).abs() < f32::EPSILON);
        assert!(page.contains_y(0.0));
        assert!(!page.contains_y(200.0));
    }
}
