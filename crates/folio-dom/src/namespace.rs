//! Namespace-specific attribute interpretation.

use crate::ElementData;

/// Answers the questions the layout engine asks about an element whose
/// meaning depends on the markup vocabulary.
pub trait NamespaceHandler: Send + Sync {
    /// The element's unique id, registered in the document's id index.
    fn element_id<'a>(&self, element: &'a ElementData) -> Option<&'a str>;

    /// Named anchor target (`<a name="...">` in HTML).
    fn anchor_name<'a>(&self, element: &'a ElementData) -> Option<&'a str>;

    /// Hyperlink destination, if the element is a link.
    fn link_uri<'a>(&self, element: &'a ElementData) -> Option<&'a str>;

    /// Image source for replaced image elements.
    fn image_uri<'a>(&self, element: &'a ElementData) -> Option<&'a str>;

    /// Whether the element is replaced content (drawn by the backend rather
    /// than laid out from children).
    fn is_replaced(&self, element: &ElementData) -> bool;
}

/// HTML vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlNamespaceHandler;

impl NamespaceHandler for HtmlNamespaceHandler {
    fn element_id<'a>(&self, element: &'a ElementData) -> Option<&'a str> {
        element.id()
    }

    fn anchor_name<'a>(&self, element: &'a ElementData) -> Option<&'a str> {
        if element.tag_name == "a" {
            element.attr("name").filter(|n| !n.is_empty())
        } else {
            None
        }
    }

    fn link_uri<'a>(&self, element: &'a ElementData) -> Option<&'a str> {
        if element.tag_name == "a" {
            element.attr("href").filter(|h| !h.is_empty())
        } else {
            None
        }
    }

    fn image_uri<'a>(&self, element: &'a ElementData) -> Option<&'a str> {
        if element.tag_name == "img" {
            element.attr("src")
        } else {
            None
        }
    }

    fn is_replaced(&self, element: &ElementData) -> bool {
        matches!(
            element.tag_name.as_str(),
            "img" | "object" | "embed" | "svg" | "canvas"
        )
    }
}
