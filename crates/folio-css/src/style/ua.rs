//! User-Agent defaults
//!
//! [WHATWG HTML § 15 Rendering](https://html.spec.whatwg.org/multipage/rendering.html)
//!
//! "User agents are expected to have a default style sheet that presents elements
//! of HTML documents in ways consistent with general user expectations."
//!
//! The resolver does not match selectors, so the defaults are keyed by tag
//! name and enter the cascade with [`CssOrigin::UserAgent`].

use super::values::{CssOrigin, RawDeclaration};

/// One group of tags sharing a rule body.
struct UaRule {
    tags: &'static [&'static str],
    declarations: &'static [(&'static str, &'static str)],
}

/// [§ 15.3 Suggested default style sheet](https://html.spec.whatwg.org/multipage/rendering.html#the-css-user-agent-style-sheet-and-presentational-hints)
const UA_RULES: &[UaRule] = &[
    // [§ 15.3.1 Hidden elements]
    UaRule {
        tags: &[
            "area", "base", "basefont", "datalist", "head", "link", "meta", "noembed", "noframes",
            "param", "rp", "script", "style", "template", "title",
        ],
        declarations: &[("display", "none")],
    },
    // [§ 15.3.3 Flow content]
    UaRule {
        tags: &[
            "address", "article", "aside", "blockquote", "body", "center", "dd", "div", "dl", "dt",
            "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
            "hr", "html", "main", "nav", "ol", "p", "pre", "section", "ul",
        ],
        declarations: &[("display", "block")],
    },
    UaRule {
        tags: &["li"],
        declarations: &[("display", "list-item")],
    },
    UaRule {
        tags: &["body"],
        declarations: &[("margin", "8px")],
    },
    UaRule {
        tags: &["p", "blockquote", "figure", "dl", "pre"],
        declarations: &[("margin-top", "1em"), ("margin-bottom", "1em")],
    },
    UaRule {
        tags: &["ul", "ol"],
        declarations: &[("margin-top", "1em"), ("margin-bottom", "1em"), ("padding-left", "40px")],
    },
    UaRule {
        tags: &["ol"],
        declarations: &[("list-style-type", "decimal")],
    },
    // [§ 15.3.6 Sections and headings]
    UaRule {
        tags: &["h1"],
        declarations: &[("font-size", "2em"), ("margin-top", "0.67em"), ("margin-bottom", "0.67em")],
    },
    UaRule {
        tags: &["h2"],
        declarations: &[("font-size", "1.5em"), ("margin-top", "0.83em"), ("margin-bottom", "0.83em")],
    },
    UaRule {
        tags: &["h3"],
        declarations: &[("font-size", "1.17em"), ("margin-top", "1em"), ("margin-bottom", "1em")],
    },
    UaRule {
        tags: &["h4", "h5", "h6"],
        declarations: &[("margin-top", "1.33em"), ("margin-bottom", "1.33em")],
    },
    UaRule {
        tags: &["h1", "h2", "h3", "h4", "h5", "h6", "b", "strong", "th"],
        declarations: &[("font-weight", "bold")],
    },
    UaRule {
        tags: &["i", "em", "cite", "var"],
        declarations: &[("font-style", "italic")],
    },
    UaRule {
        tags: &["a"],
        declarations: &[("color", "#0000ee")],
    },
    UaRule {
        tags: &["hr"],
        declarations: &[
            ("margin-top", "0.5em"),
            ("margin-bottom", "0.5em"),
            ("border", "1px inset gray"),
        ],
    },
    UaRule {
        tags: &["img", "object", "embed", "svg", "canvas"],
        declarations: &[("display", "inline-block")],
    },
];

/// Default declarations for `tag`, in stylesheet order.
#[must_use]
pub fn declarations_for(tag: &str) -> Vec<RawDeclaration> {
    UA_RULES
        .iter()
        .filter(|rule| rule.tags.contains(&tag))
        .flat_map(|rule| rule.declarations.iter())
        .map(|(name, value)| RawDeclaration::author(name, value).with_origin(CssOrigin::UserAgent, false))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_defaults_are_user_agent_origin() {
        let decls = declarations_for("h1");
        assert!(decls.iter().any(|d| d.name == "display"));
        assert!(decls.iter().any(|d| d.name == "font-weight"));
        assert!(decls.iter().all(|d| d.origin == CssOrigin::UserAgent));
    }

    #[test]
    fn test_unknown_tag_has_no_defaults() {
        assert!(declarations_for("span").is_empty());
    }
}
