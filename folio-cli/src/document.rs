//! JSON document descriptions.
//!
//! A document is a markup tree whose elements carry their already-matched
//! declarations inline:
//!
//! ```json
//! {
//!   "layout": { "page": { "width": 400, "height": 300, "margin_top": 20,
//!               "margin_right": 20, "margin_bottom": 20, "margin_left": 20,
//!               "first_page_is_left": false, "background": null } },
//!   "images": { "logo.png": "assets/logo.png" },
//!   "root": {
//!     "tag": "html",
//!     "children": [
//!       { "tag": "body", "style": "margin: 0; font-size: 12px",
//!         "children": [
//!           { "tag": "h1", "style": "page-break-before: always",
//!             "before": { "content": "1. " }, "children": ["Intro"] }
//!         ] }
//!     ]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use folio_css::style::{CssOrigin, RawDeclaration};
use folio_css::{LayoutOptions, MapStyleSource};
use folio_dom::{DomTree, ElementData, NodeId};
use serde::Deserialize;

/// A whole document file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentSpec {
    /// Page geometry and flags; A4 with pagination when absent.
    #[serde(default)]
    pub layout: Option<LayoutOptions>,
    /// Image files by URI, relative to the document file.
    #[serde(default)]
    pub images: BTreeMap<String, PathBuf>,
    /// The document element.
    pub root: ElementSpec,
}

/// A child: bare text or an element.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    /// A text node.
    Text(String),
    /// An element node.
    Element(ElementSpec),
}

/// One element with its declarations.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementSpec {
    /// Tag name.
    pub tag: String,
    /// Attributes.
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    /// Declaration block, e.g. `"margin: 0; color: red !important"`.
    #[serde(default)]
    pub style: String,
    /// `::before` generated content.
    #[serde(default)]
    pub before: Option<PseudoSpec>,
    /// `::after` generated content.
    #[serde(default)]
    pub after: Option<PseudoSpec>,
    /// Children in document order.
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

/// Generated content of a pseudo-element.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PseudoSpec {
    /// The generated text.
    pub content: String,
    /// Declarations for the pseudo-element.
    #[serde(default)]
    pub style: String,
}

impl DocumentSpec {
    /// Parse a document description.
    ///
    /// # Errors
    ///
    /// The `serde_json` error for malformed input.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Build the markup tree and its style feed.
    #[must_use]
    pub fn build(&self) -> (DomTree, MapStyleSource) {
        let mut dom = DomTree::new();
        let mut styles = MapStyleSource::new();
        append_element(&mut dom, &mut styles, NodeId::ROOT, &self.root);
        (dom, styles)
    }
}

fn append_element(dom: &mut DomTree, styles: &mut MapStyleSource, parent: NodeId, spec: &ElementSpec) {
    let data = spec
        .attrs
        .iter()
        .fold(ElementData::new(&spec.tag), |data, (name, value)| data.with_attr(name, value));
    let id = dom.append_element(parent, data);

    for declaration in parse_declarations(&spec.style) {
        styles.push(id, None, declaration);
    }
    for (pseudo, content) in [("before", &spec.before), ("after", &spec.after)] {
        if let Some(content) = content {
            styles.set_content(id, pseudo, &content.content);
            for declaration in parse_declarations(&content.style) {
                styles.push(id, Some(pseudo), declaration);
            }
        }
    }

    for child in &spec.children {
        match child {
            NodeSpec::Text(text) => {
                let _ = dom.append_text(id, text);
            }
            NodeSpec::Element(element) => append_element(dom, styles, id, element),
        }
    }
}

/// Split a declaration block into author declarations. Empty and malformed
/// entries are dropped.
#[must_use]
pub fn parse_declarations(block: &str) -> Vec<RawDeclaration> {
    block
        .split(';')
        .filter_map(|entry| {
            let (name, value) = entry.split_once(':')?;
            let name = name.trim();
            let mut value = value.trim();
            if name.is_empty() || value.is_empty() {
                log::debug!("skipping malformed declaration '{}'", entry.trim());
                return None;
            }
            let important = match value.strip_suffix("!important") {
                Some(rest) => {
                    value = rest.trim_end();
                    true
                }
                None => false,
            };
            Some(RawDeclaration::author(name, value).with_origin(CssOrigin::Author, important))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_css::StyleSource;

    const SAMPLE: &str = r#"{
        "images": { "logo.png": "assets/logo.png" },
        "root": {
            "tag": "html",
            "children": [{
                "tag": "body",
                "style": "margin: 0",
                "children": [
                    { "tag": "p", "attrs": { "id": "first" },
                      "before": { "content": "1. ", "style": "color: red" },
                      "children": ["Hello ", { "tag": "em", "children": ["world"] }] }
                ]
            }]
        }
    }"#;

    #[test]
    fn builds_tree_and_styles() {
        let spec = DocumentSpec::from_json(SAMPLE).unwrap();
        assert!(spec.layout.is_none());
        assert_eq!(spec.images.get("logo.png"), Some(&PathBuf::from("assets/logo.png")));

        let (dom, styles) = spec.build();
        let body = dom.body().unwrap();
        assert_eq!(styles.declarations(body, None).len(), 1);

        let p = dom.element_by_id("first").unwrap();
        assert_eq!(dom.children(p).len(), 2);
        assert_eq!(dom.as_text(dom.children(p)[0]), Some("Hello "));
        assert_eq!(styles.pseudo_content(p, "before").as_deref(), Some("1. "));
        assert!(styles.has_pseudo(p, "before"));
        assert!(!styles.has_pseudo(p, "after"));
    }

    #[test]
    fn layout_options_fill_defaults() {
        let spec = DocumentSpec::from_json(
            r#"{ "layout": { "page_breaks_allowed": false }, "root": { "tag": "html" } }"#,
        )
        .unwrap();
        let options = spec.layout.unwrap();
        assert!(!options.page_breaks_allowed);
        assert_eq!(options.page, folio_css::PageConfig::a4());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(DocumentSpec::from_json(r#"{ "root": { "tag": "html", "colour": "red" } }"#).is_err());
    }

    #[test]
    fn declarations_split_and_flag_importance() {
        let parsed = parse_declarations("margin: 0 auto; ; color : red !important;broken; width:");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "margin");
        assert_eq!(parsed[0].values.len(), 2);
        assert!(!parsed[0].important);
        assert_eq!(parsed[1].name, "color");
        assert!(parsed[1].important);
    }
}
