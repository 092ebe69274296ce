//! Primitive parsed values and property declarations.
//!
//! [CSS Values and Units Level 4](https://www.w3.org/TR/css-values-4/)
//!
//! These are the resolver's *input*: values as an upstream parser and
//! cascade hand them over, not yet validated against any property grammar.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::properties::CssName;

/// [§ 4.1 Lengths](https://www.w3.org/TR/css-values-4/#lengths)
///
/// Units the resolver understands. Percentages are carried as a unit so that
/// "length-percentage" grammars validate in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Unit {
    /// "1px = 1/96th of 1in"
    Px,
    /// Points, 1/72 in.
    Pt,
    /// Picas, 12 pt.
    Pc,
    /// Inches.
    In,
    /// Centimetres.
    Cm,
    /// Millimetres.
    Mm,
    /// Font size of the element.
    Em,
    /// x-height, approximated as half the font size.
    Ex,
    /// Percentage of a property-specific reference length.
    #[strum(serialize = "%")]
    Percent,
}

impl Unit {
    /// Pixels per unit for absolute units, `None` for relative ones.
    #[must_use]
    pub const fn px_per_unit(self) -> Option<f32> {
        match self {
            Self::Px => Some(1.0),
            Self::Pt => Some(96.0 / 72.0),
            Self::Pc => Some(16.0),
            Self::In => Some(96.0),
            Self::Cm => Some(96.0 / 2.54),
            Self::Mm => Some(96.0 / 25.4),
            Self::Em | Self::Ex | Self::Percent => None,
        }
    }
}

/// A primitive value before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    /// A dimension or percentage.
    Length {
        /// Numeric part.
        value: f32,
        /// Unit part.
        unit: Unit,
    },
    /// A unitless number.
    Number(f32),
    /// A keyword.
    Ident(String),
    /// A quoted string.
    String(String),
    /// A color literal, carried as its CSS text (`#ff0000`, `rgb(...)`,
    /// `cmyk(...)`). Named colors arrive as [`PropertyValue::Ident`].
    Color(String),
    /// A comma separated list.
    List(Vec<PropertyValue>),
    /// A functional notation other than a color.
    Function {
        /// Function name, lowercase.
        name: String,
        /// Arguments, comma separators dropped.
        args: Vec<PropertyValue>,
    },
    /// The `inherit` keyword.
    Inherit,
    /// Something the upstream parser produced but could not classify.
    Unknown(String),
}

impl PropertyValue {
    /// Shorthand for a pixel length.
    #[must_use]
    pub const fn px(value: f32) -> Self {
        Self::Length {
            value,
            unit: Unit::Px,
        }
    }

    /// Shorthand for a keyword.
    #[must_use]
    pub fn ident(keyword: &str) -> Self {
        Self::Ident(keyword.to_ascii_lowercase())
    }

    /// Keyword text if this is an ident.
    #[must_use]
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Self::Ident(s) => Some(s),
            _ => None,
        }
    }

    /// True for a bare `0`, which CSS accepts as a length.
    #[must_use]
    pub fn is_zero_number(&self) -> bool {
        matches!(self, Self::Number(n) if *n == 0.0)
    }

    /// Parse CSS value text into primitives.
    ///
    /// Whitespace separates components. Top-level commas turn the whole
    /// value into a [`PropertyValue::List`]. Functions nest; `rgb()`,
    /// `rgba()`, `cmyk()` and `device-cmyk()` become [`PropertyValue::Color`]
    /// keyed by their exact text.
    #[must_use]
    pub fn parse_list(text: &str) -> Vec<Self> {
        let mut scanner = ValueScanner {
            chars: text.char_indices().peekable(),
            text,
        };
        let groups = scanner.components(false);
        if groups.len() > 1 {
            let items = groups
                .into_iter()
                .map(|mut group| {
                    if group.len() == 1 {
                        group.remove(0)
                    } else {
                        Self::List(group)
                    }
                })
                .collect();
            vec![Self::List(items)]
        } else {
            groups.into_iter().next().unwrap_or_default()
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length { value, unit } => write!(f, "{value}{unit}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Ident(s) | Self::Color(s) | Self::Unknown(s) => f.write_str(s),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Function { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::Inherit => f.write_str("inherit"),
        }
    }
}

struct ValueScanner<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    text: &'a str,
}

impl ValueScanner<'_> {
    /// Read comma separated groups until end of input, or until `)` when
    /// `nested`.
    fn components(&mut self, nested: bool) -> Vec<Vec<PropertyValue>> {
        let mut groups = vec![Vec::new()];
        while let Some(&(start, ch)) = self.chars.peek() {
            match ch {
                c if c.is_whitespace() => {
                    let _ = self.chars.next();
                }
                ',' => {
                    let _ = self.chars.next();
                    groups.push(Vec::new());
                }
                ')' if nested => {
                    let _ = self.chars.next();
                    break;
                }
                '"' | '\'' => {
                    let _ = self.chars.next();
                    let value = self.quoted(ch);
                    if let Some(group) = groups.last_mut() {
                        group.push(value);
                    }
                }
                _ => {
                    let value = self.component(start);
                    if let Some(group) = groups.last_mut() {
                        group.push(value);
                    }
                }
            }
        }
        groups.retain(|g| !g.is_empty());
        groups
    }

    fn quoted(&mut self, quote: char) -> PropertyValue {
        let mut out = String::new();
        for (_, ch) in self.chars.by_ref() {
            if ch == quote {
                break;
            }
            out.push(ch);
        }
        PropertyValue::String(out)
    }

    fn component(&mut self, start: usize) -> PropertyValue {
        let mut end = start;
        while let Some(&(i, ch)) = self.chars.peek() {
            if ch.is_whitespace() || ch == ',' || ch == ')' {
                break;
            }
            if ch == '(' {
                let name = self.text[start..i].to_ascii_lowercase();
                let _ = self.chars.next();
                return self.function(name, start);
            }
            end = i + ch.len_utf8();
            let _ = self.chars.next();
        }
        classify(&self.text[start..end])
    }

    fn function(&mut self, name: String, start: usize) -> PropertyValue {
        let args: Vec<PropertyValue> = self
            .components(true)
            .into_iter()
            .map(|mut group| {
                if group.len() == 1 {
                    group.remove(0)
                } else {
                    PropertyValue::List(group)
                }
            })
            .collect();
        let end = self.chars.peek().map_or(self.text.len(), |&(i, _)| i);
        match name.as_str() {
            "rgb" | "rgba" | "cmyk" | "device-cmyk" => {
                PropertyValue::Color(self.text[start..end].trim().to_string())
            }
            _ => PropertyValue::Function { name, args },
        }
    }
}

fn classify(token: &str) -> PropertyValue {
    if token.eq_ignore_ascii_case("inherit") {
        return PropertyValue::Inherit;
    }
    if token.starts_with('#') {
        return PropertyValue::Color(token.to_string());
    }

    let split = token
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || ((c == '-' || c == '+') && i == 0)))
        .map_or(token.len(), |(i, _)| i);
    let (number, suffix) = token.split_at(split);

    if let Ok(value) = number.parse::<f32>() {
        if suffix.is_empty() {
            return PropertyValue::Number(value);
        }
        return suffix.to_ascii_lowercase().parse::<Unit>().map_or_else(
            |_| PropertyValue::Unknown(token.to_string()),
            |unit| PropertyValue::Length { value, unit },
        );
    }

    if token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        // Keywords are folded when validated; names keep their case.
        PropertyValue::Ident(token.to_string())
    } else {
        PropertyValue::Unknown(token.to_string())
    }
}

/// [§ 6.1 Cascade Origins](https://www.w3.org/TR/css-cascade-4/#cascading-origins)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CssOrigin {
    /// User-agent stylesheet.
    UserAgent,
    /// User stylesheet.
    User,
    /// Document stylesheet.
    Author,
}

impl CssOrigin {
    /// [§ 6.1 Cascade Sorting Order](https://www.w3.org/TR/css-cascade-4/#cascade-origin)
    ///
    /// Precedence rank, higher wins. Important declarations reverse the
    /// origin order.
    #[must_use]
    pub const fn rank(self, important: bool) -> u8 {
        match (self, important) {
            (Self::UserAgent, false) => 0,
            (Self::User, false) => 1,
            (Self::Author, false) => 2,
            (Self::Author, true) => 3,
            (Self::User, true) => 4,
            (Self::UserAgent, true) => 5,
        }
    }
}

/// One declaration as supplied by the upstream cascade stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDeclaration {
    /// Property name as written, possibly a shorthand.
    pub name: String,
    /// Ordered primitive values.
    pub values: Vec<PropertyValue>,
    /// Where the declaration came from.
    pub origin: CssOrigin,
    /// `!important`.
    #[serde(default)]
    pub important: bool,
    /// Whether `inherit` is accepted as this declaration's value.
    #[serde(default = "inherit_allowed_default")]
    pub inherit_allowed: bool,
}

const fn inherit_allowed_default() -> bool {
    true
}

impl RawDeclaration {
    /// Author-origin, normal-importance declaration parsed from CSS text.
    #[must_use]
    pub fn author(name: &str, text: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            values: PropertyValue::parse_list(text),
            origin: CssOrigin::Author,
            important: false,
            inherit_allowed: true,
        }
    }

    /// Same as [`RawDeclaration::author`] with an explicit origin.
    #[must_use]
    pub fn with_origin(mut self, origin: CssOrigin, important: bool) -> Self {
        self.origin = origin;
        self.important = important;
        self
    }

    /// Same declaration with `inherit` accepted or refused.
    #[must_use]
    pub fn with_inherit_allowed(mut self, allowed: bool) -> Self {
        self.inherit_allowed = allowed;
        self
    }
}

/// A validated longhand declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDeclaration {
    /// The longhand property.
    pub name: CssName,
    /// The validated value (a single primitive, or [`PropertyValue::Inherit`]).
    pub value: PropertyValue,
    /// Cascade origin.
    pub origin: CssOrigin,
    /// `!important`.
    pub important: bool,
}

impl PropertyDeclaration {
    /// Cascade rank of this declaration.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        self.origin.rank(self.important)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_components() {
        let values = PropertyValue::parse_list("10px auto -2.5em 0");
        assert_eq!(
            values,
            vec![
                PropertyValue::px(10.0),
                PropertyValue::ident("auto"),
                PropertyValue::Length {
                    value: -2.5,
                    unit: Unit::Em
                },
                PropertyValue::Number(0.0),
            ]
        );
    }

    #[test]
    fn test_parse_colors_keep_text() {
        let values = PropertyValue::parse_list("1px solid rgb(255, 0, 0)");
        assert_eq!(values[2], PropertyValue::Color("rgb(255, 0, 0)".to_string()));

        let values = PropertyValue::parse_list("#FFF");
        assert_eq!(values, vec![PropertyValue::Color("#FFF".to_string())]);
    }

    #[test]
    fn test_parse_function_with_commas() {
        let values = PropertyValue::parse_list("linear-gradient(to right, red, #00f 80%)");
        let [PropertyValue::Function { name, args }] = values.as_slice() else {
            panic!("expected a function, got {values:?}");
        };
        assert_eq!(name, "linear-gradient");
        assert_eq!(args.len(), 3);
        assert_eq!(
            args[0],
            PropertyValue::List(vec![PropertyValue::ident("to"), PropertyValue::ident("right")])
        );
    }

    #[test]
    fn test_parse_inherit_and_unknown() {
        assert_eq!(PropertyValue::parse_list("inherit"), vec![PropertyValue::Inherit]);
        assert_eq!(
            PropertyValue::parse_list("12furlongs"),
            vec![PropertyValue::Unknown("12furlongs".to_string())]
        );
    }

    #[test]
    fn test_important_reverses_origins() {
        assert!(CssOrigin::Author.rank(false) > CssOrigin::UserAgent.rank(false));
        assert!(CssOrigin::UserAgent.rank(true) > CssOrigin::Author.rank(true));
        assert!(CssOrigin::Author.rank(true) > CssOrigin::Author.rank(false));
    }
}
