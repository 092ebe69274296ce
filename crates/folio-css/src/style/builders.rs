//! Declaration builders: validate primitives against a property's grammar and
//! expand shorthands into longhands.
//!
//! [§ 1.4 Shorthand properties](https://www.w3.org/TR/CSS2/about.html#shorthand)
//!
//! "Some properties are shorthand properties, meaning that they allow authors
//! to specify the values of several properties with a single property."

use super::color::ColorValue;
use super::properties::CssName;
use super::values::{CssOrigin, PropertyDeclaration, PropertyValue, Unit};
use crate::error::StyleError;

/// Turns one raw declaration into validated longhand declarations.
pub trait PropertyBuilder: Send + Sync {
    /// Validate `values` for property `name` and produce its longhands.
    ///
    /// `inherit` is accepted only as the sole value and only when
    /// `inherit_allowed`; for a shorthand it expands to `inherit` on every
    /// longhand.
    ///
    /// # Errors
    ///
    /// [`StyleError::InvalidValue`] when a value does not fit the grammar and
    /// [`StyleError::InheritNotAllowed`] for a misplaced `inherit`.
    fn build_declarations(
        &self,
        name: &str,
        values: &[PropertyValue],
        origin: CssOrigin,
        important: bool,
        inherit_allowed: bool,
    ) -> Result<Vec<PropertyDeclaration>, StyleError>;
}

/// Value grammars shared by longhands and shorthands.
#[derive(Debug, Clone, Copy)]
pub enum Grammar {
    /// A length or percentage, plus extra keywords.
    Length {
        /// Reject negative lengths.
        non_negative: bool,
        /// Keywords accepted besides lengths.
        keywords: &'static [&'static str],
    },
    /// Any color.
    Color,
    /// One keyword from the set.
    Keyword(&'static [&'static str]),
    /// A number within `min..=max`, or a keyword.
    Number {
        /// Inclusive lower bound.
        min: f32,
        /// Inclusive upper bound.
        max: f32,
        /// Keywords accepted besides numbers.
        keywords: &'static [&'static str],
    },
    /// An integer or `auto`.
    Integer,
    /// `normal`, a number, or a non-negative length.
    LineHeight,
    /// Family names: idents, strings, or a comma list of them.
    FontFamily,
    /// `none` or `linear-gradient(...)`.
    Image,
    /// `auto` or a page name.
    PageName,
}

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "solid", "dashed", "dotted", "double", "groove", "ridge", "inset", "outset",
];
const BORDER_WIDTHS: &[&str] = &["thin", "medium", "thick"];
const FONT_SIZES: &[&str] = &[
    "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "smaller", "larger",
];
const BREAK_VALUES: &[&str] = &["auto", "always", "avoid", "left", "right"];

impl Grammar {
    /// Check one primitive, returning the normalized value.
    fn accept(self, property: &str, value: &PropertyValue) -> Result<PropertyValue, StyleError> {
        let invalid = || StyleError::invalid(property, value.to_string());
        // Family and page names are case-sensitive; every other ident is a
        // keyword.
        let folded;
        let value = match (self, value) {
            (Self::FontFamily | Self::PageName, _) => value,
            (_, PropertyValue::Ident(k)) if k.bytes().any(|b| b.is_ascii_uppercase()) => {
                folded = PropertyValue::Ident(k.to_ascii_lowercase());
                &folded
            }
            _ => value,
        };
        match (self, value) {
            (Self::Length { non_negative, .. }, PropertyValue::Length { value: v, .. }) => {
                if non_negative && *v < 0.0 {
                    Err(invalid())
                } else {
                    Ok(value.clone())
                }
            }
            (Self::Length { .. }, PropertyValue::Number(n)) if *n == 0.0 => {
                Ok(PropertyValue::px(0.0))
            }
            (Self::Length { keywords, .. }, PropertyValue::Ident(k)) if keywords.contains(&k.as_str()) => {
                Ok(normalize_length_keyword(property, k))
            }
            (Self::Color, PropertyValue::Color(text)) if ColorValue::parse(text).is_some() => {
                Ok(value.clone())
            }
            (Self::Color, PropertyValue::Ident(k)) if ColorValue::parse(k).is_some() => Ok(value.clone()),
            (Self::Keyword(keywords), PropertyValue::Ident(k)) if keywords.contains(&k.as_str()) => {
                Ok(value.clone())
            }
            (Self::Number { min, max, .. }, PropertyValue::Number(n)) => {
                if (min..=max).contains(n) {
                    Ok(value.clone())
                } else {
                    Err(invalid())
                }
            }
            (Self::Number { keywords, .. }, PropertyValue::Ident(k)) if keywords.contains(&k.as_str()) => {
                Ok(value.clone())
            }
            (Self::Integer, PropertyValue::Number(n)) if n.fract() == 0.0 => Ok(value.clone()),
            (Self::Integer, PropertyValue::Ident(k)) if k == "auto" => Ok(value.clone()),
            (Self::LineHeight, PropertyValue::Number(n)) if *n >= 0.0 => Ok(value.clone()),
            (Self::LineHeight, PropertyValue::Length { value: v, .. }) if *v >= 0.0 => Ok(value.clone()),
            (Self::LineHeight, PropertyValue::Ident(k)) if k == "normal" => Ok(value.clone()),
            (Self::FontFamily, PropertyValue::Ident(_) | PropertyValue::String(_)) => Ok(value.clone()),
            (Self::FontFamily, PropertyValue::List(items))
                if items
                    .iter()
                    .all(|i| matches!(i, PropertyValue::Ident(_) | PropertyValue::String(_) | PropertyValue::List(_))) =>
            {
                Ok(value.clone())
            }
            (Self::Image, PropertyValue::Ident(k)) if k == "none" => Ok(value.clone()),
            (Self::Image, PropertyValue::Function { name, args }) if name == "linear-gradient" && args.len() >= 2 => {
                Ok(value.clone())
            }
            (Self::PageName, PropertyValue::Ident(_)) => Ok(value.clone()),
            _ => Err(invalid()),
        }
    }
}

/// Border-width and font-size keywords become lengths.
///
/// [§ 8.5.1 Border width](https://www.w3.org/TR/CSS2/box.html#border-width-properties)
/// [§ 15.7 Font size](https://www.w3.org/TR/CSS2/fonts.html#font-size-props)
fn normalize_length_keyword(property: &str, keyword: &str) -> PropertyValue {
    let px = if property == "font-size" {
        match keyword {
            "xx-small" => 9.0,
            "x-small" => 10.0,
            "small" => 13.0,
            "medium" => 16.0,
            "large" => 18.0,
            "x-large" => 24.0,
            "xx-large" => 32.0,
            "smaller" => return PropertyValue::Length { value: 83.0, unit: Unit::Percent },
            "larger" => return PropertyValue::Length { value: 120.0, unit: Unit::Percent },
            _ => return PropertyValue::ident(keyword),
        }
    } else {
        match keyword {
            "thin" => 1.0,
            "medium" => 3.0,
            "thick" => 5.0,
            _ => return PropertyValue::ident(keyword),
        }
    };
    PropertyValue::px(px)
}

fn declare(name: CssName, value: PropertyValue, origin: CssOrigin, important: bool) -> PropertyDeclaration {
    PropertyDeclaration {
        name,
        value,
        origin,
        important,
    }
}

/// Handle a lone `inherit` for any builder. Returns `Ok(None)` when the
/// values contain no `inherit` at all.
fn inherit_for(
    name: &str,
    longhands: &[CssName],
    values: &[PropertyValue],
    origin: CssOrigin,
    important: bool,
    inherit_allowed: bool,
) -> Result<Option<Vec<PropertyDeclaration>>, StyleError> {
    if !values.contains(&PropertyValue::Inherit) {
        return Ok(None);
    }
    if values.len() != 1 || !inherit_allowed {
        return Err(StyleError::InheritNotAllowed {
            property: name.to_string(),
        });
    }
    Ok(Some(
        longhands
            .iter()
            .map(|&longhand| declare(longhand, PropertyValue::Inherit, origin, important))
            .collect(),
    ))
}

fn joined(values: &[PropertyValue]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A longhand with a single value.
#[derive(Debug, Clone, Copy)]
pub struct Longhand {
    /// The property produced.
    pub name: CssName,
    /// Its value grammar.
    pub grammar: Grammar,
}

impl PropertyBuilder for Longhand {
    fn build_declarations(
        &self,
        name: &str,
        values: &[PropertyValue],
        origin: CssOrigin,
        important: bool,
        inherit_allowed: bool,
    ) -> Result<Vec<PropertyDeclaration>, StyleError> {
        if let Some(inherited) = inherit_for(name, &[self.name], values, origin, important, inherit_allowed)? {
            return Ok(inherited);
        }
        // Font families are the one longhand that takes several space
        // separated components ("Times New Roman"); they collapse to one name.
        let value = match (values, self.grammar) {
            ([single], _) => single,
            ([_, ..], Grammar::FontFamily) => &PropertyValue::String(joined(values)),
            _ => return Err(StyleError::invalid(name, joined(values))),
        };
        let value = self.grammar.accept(name, value)?;
        Ok(vec![declare(self.name, value, origin, important)])
    }
}

/// `margin`, `padding`, `border-width`, `border-style`, `border-color`.
///
/// [§ 8.3 Margin properties](https://www.w3.org/TR/CSS2/box.html#margin-properties)
///
/// "If there is only one component value, it applies to all sides. If there
/// are two values, the top and bottom margins are set to the first value and
/// the right and left margins are set to the second. If there are three
/// values, the top is set to the first value, the left and right are set to
/// the second, and the bottom is set to the third. If there are four values,
/// they apply to the top, right, bottom, and left, respectively."
#[derive(Debug, Clone, Copy)]
pub struct BoxShorthand {
    /// Longhands in top, right, bottom, left order.
    pub longhands: [CssName; 4],
    /// Grammar of each component.
    pub grammar: Grammar,
}

impl PropertyBuilder for BoxShorthand {
    fn build_declarations(
        &self,
        name: &str,
        values: &[PropertyValue],
        origin: CssOrigin,
        important: bool,
        inherit_allowed: bool,
    ) -> Result<Vec<PropertyDeclaration>, StyleError> {
        if let Some(inherited) = inherit_for(name, &self.longhands, values, origin, important, inherit_allowed)? {
            return Ok(inherited);
        }
        let accepted = values
            .iter()
            .map(|v| self.grammar.accept(name, v))
            .collect::<Result<Vec<_>, _>>()?;
        let [top, right, bottom, left] = match accepted.as_slice() {
            [all] => [all, all, all, all],
            [vertical, horizontal] => [vertical, horizontal, vertical, horizontal],
            [top, horizontal, bottom] => [top, horizontal, bottom, horizontal],
            [top, right, bottom, left] => [top, right, bottom, left],
            _ => return Err(StyleError::invalid(name, joined(values))),
        };
        Ok(self
            .longhands
            .iter()
            .zip([top, right, bottom, left])
            .map(|(&longhand, value)| declare(longhand, value.clone(), origin, important))
            .collect())
    }
}

/// `border-top`, `border-right`, `border-bottom`, `border-left`, and `border`.
///
/// [§ 8.5.4 Border shorthand properties](https://www.w3.org/TR/CSS2/box.html#border-shorthand-properties)
///
/// Width, style and color in any order, each at most once. Omitted parts are
/// reset to their initial values.
#[derive(Debug, Clone, Copy)]
pub struct BorderShorthand {
    /// `(width, style, color)` longhands for each side the shorthand sets.
    pub sides: &'static [[CssName; 3]],
}

const TOP: [CssName; 3] = [CssName::BorderTopWidth, CssName::BorderTopStyle, CssName::BorderTopColor];
const RIGHT: [CssName; 3] = [CssName::BorderRightWidth, CssName::BorderRightStyle, CssName::BorderRightColor];
const BOTTOM: [CssName; 3] = [CssName::BorderBottomWidth, CssName::BorderBottomStyle, CssName::BorderBottomColor];
const LEFT: [CssName; 3] = [CssName::BorderLeftWidth, CssName::BorderLeftStyle, CssName::BorderLeftColor];

impl PropertyBuilder for BorderShorthand {
    fn build_declarations(
        &self,
        name: &str,
        values: &[PropertyValue],
        origin: CssOrigin,
        important: bool,
        inherit_allowed: bool,
    ) -> Result<Vec<PropertyDeclaration>, StyleError> {
        let longhands: Vec<CssName> = self.sides.iter().flatten().copied().collect();
        if let Some(inherited) = inherit_for(name, &longhands, values, origin, important, inherit_allowed)? {
            return Ok(inherited);
        }
        if values.is_empty() || values.len() > 3 {
            return Err(StyleError::invalid(name, joined(values)));
        }

        let width_grammar = Grammar::Length {
            non_negative: true,
            keywords: BORDER_WIDTHS,
        };
        let style_grammar = Grammar::Keyword(BORDER_STYLES);

        let mut width = None;
        let mut style = None;
        let mut color = None;
        for value in values {
            let slot = if style.is_none() && style_grammar.accept(name, value).is_ok() {
                &mut style
            } else if color.is_none() && Grammar::Color.accept(name, value).is_ok() {
                &mut color
            } else if width.is_none() && width_grammar.accept(name, value).is_ok() {
                &mut width
            } else {
                return Err(StyleError::invalid(name, joined(values)));
            };
            *slot = Some(value.clone());
        }

        let width = match width {
            Some(w) => width_grammar.accept(name, &w)?,
            None => CssName::BorderTopWidth.initial_value(),
        };
        let style = style.unwrap_or_else(|| CssName::BorderTopStyle.initial_value());
        let color = color.unwrap_or_else(|| CssName::BorderTopColor.initial_value());

        Ok(self
            .sides
            .iter()
            .flat_map(|[w, s, c]| {
                [
                    declare(*w, width.clone(), origin, important),
                    declare(*s, style.clone(), origin, important),
                    declare(*c, color.clone(), origin, important),
                ]
            })
            .collect())
    }
}

/// `break-before`/`break-after`/`break-inside`, mapped onto the paged-media
/// `page-break-*` longhands.
///
/// [§ 3.4 Page-break Aliases](https://www.w3.org/TR/css-break-3/#page-break-properties)
#[derive(Debug, Clone, Copy)]
pub struct BreakAlias {
    /// The `page-break-*` longhand produced.
    pub target: CssName,
}

impl PropertyBuilder for BreakAlias {
    fn build_declarations(
        &self,
        name: &str,
        values: &[PropertyValue],
        origin: CssOrigin,
        important: bool,
        inherit_allowed: bool,
    ) -> Result<Vec<PropertyDeclaration>, StyleError> {
        if let Some(inherited) = inherit_for(name, &[self.target], values, origin, important, inherit_allowed)? {
            return Ok(inherited);
        }
        let [PropertyValue::Ident(keyword)] = values else {
            return Err(StyleError::invalid(name, joined(values)));
        };
        let keyword = keyword.to_ascii_lowercase();
        // "page" and "avoid-page" are the paged-media spellings.
        let mapped = match keyword.as_str() {
            "page" => "always",
            "avoid-page" => "avoid",
            "recto" => "right",
            "verso" => "left",
            other if BREAK_VALUES.contains(&other) => other,
            _ => return Err(StyleError::invalid(name, keyword)),
        };
        Ok(vec![declare(self.target, PropertyValue::ident(mapped), origin, important)])
    }
}

/// `background`: a color and/or a gradient.
#[derive(Debug, Clone, Copy)]
pub struct BackgroundShorthand;

impl PropertyBuilder for BackgroundShorthand {
    fn build_declarations(
        &self,
        name: &str,
        values: &[PropertyValue],
        origin: CssOrigin,
        important: bool,
        inherit_allowed: bool,
    ) -> Result<Vec<PropertyDeclaration>, StyleError> {
        let longhands = [CssName::BackgroundColor, CssName::BackgroundImage];
        if let Some(inherited) = inherit_for(name, &longhands, values, origin, important, inherit_allowed)? {
            return Ok(inherited);
        }
        let mut color = None;
        let mut image = None;
        for value in values {
            if color.is_none() && Grammar::Color.accept(name, value).is_ok() {
                color = Some(value.clone());
            } else if image.is_none() && Grammar::Image.accept(name, value).is_ok() {
                image = Some(value.clone());
            } else {
                return Err(StyleError::invalid(name, joined(values)));
            }
        }
        Ok(vec![
            declare(
                CssName::BackgroundColor,
                color.unwrap_or_else(|| CssName::BackgroundColor.initial_value()),
                origin,
                important,
            ),
            declare(
                CssName::BackgroundImage,
                image.unwrap_or_else(|| CssName::BackgroundImage.initial_value()),
                origin,
                important,
            ),
        ])
    }
}

const LENGTH_AUTO: Grammar = Grammar::Length {
    non_negative: false,
    keywords: &["auto"],
};
const SIZE_AUTO: Grammar = Grammar::Length {
    non_negative: true,
    keywords: &["auto"],
};
const SIZE_NONE: Grammar = Grammar::Length {
    non_negative: true,
    keywords: &["none"],
};
const SIZE: Grammar = Grammar::Length {
    non_negative: true,
    keywords: &[],
};
const BORDER_WIDTH: Grammar = Grammar::Length {
    non_negative: true,
    keywords: BORDER_WIDTHS,
};

/// Find the builder for a property name (longhand or shorthand).
#[must_use]
pub fn builder_for(name: &str) -> Option<&'static dyn PropertyBuilder> {
    let builder: &'static dyn PropertyBuilder = match name {
        "margin" => &BoxShorthand {
            longhands: [CssName::MarginTop, CssName::MarginRight, CssName::MarginBottom, CssName::MarginLeft],
            grammar: LENGTH_AUTO,
        },
        "padding" => &BoxShorthand {
            longhands: [CssName::PaddingTop, CssName::PaddingRight, CssName::PaddingBottom, CssName::PaddingLeft],
            grammar: SIZE,
        },
        "border-width" => &BoxShorthand {
            longhands: [
                CssName::BorderTopWidth,
                CssName::BorderRightWidth,
                CssName::BorderBottomWidth,
                CssName::BorderLeftWidth,
            ],
            grammar: BORDER_WIDTH,
        },
        "border-style" => &BoxShorthand {
            longhands: [
                CssName::BorderTopStyle,
                CssName::BorderRightStyle,
                CssName::BorderBottomStyle,
                CssName::BorderLeftStyle,
            ],
            grammar: Grammar::Keyword(BORDER_STYLES),
        },
        "border-color" => &BoxShorthand {
            longhands: [
                CssName::BorderTopColor,
                CssName::BorderRightColor,
                CssName::BorderBottomColor,
                CssName::BorderLeftColor,
            ],
            grammar: Grammar::Color,
        },
        "border" => &BorderShorthand {
            sides: &[TOP, RIGHT, BOTTOM, LEFT],
        },
        "border-top" => &BorderShorthand { sides: &[TOP] },
        "border-right" => &BorderShorthand { sides: &[RIGHT] },
        "border-bottom" => &BorderShorthand { sides: &[BOTTOM] },
        "border-left" => &BorderShorthand { sides: &[LEFT] },
        "break-before" => &BreakAlias {
            target: CssName::PageBreakBefore,
        },
        "break-after" => &BreakAlias {
            target: CssName::PageBreakAfter,
        },
        "break-inside" => &BreakAlias {
            target: CssName::PageBreakInside,
        },
        "background" => &BackgroundShorthand,
        _ => return longhand_for(name.parse().ok()?),
    };
    Some(builder)
}

fn longhand_for(name: CssName) -> Option<&'static dyn PropertyBuilder> {
    use CssName as N;
    let builder: &'static dyn PropertyBuilder = match name {
        N::Display => &Longhand {
            name: N::Display,
            grammar: Grammar::Keyword(&["block", "inline", "inline-block", "list-item", "none"]),
        },
        N::Position => &Longhand {
            name: N::Position,
            grammar: Grammar::Keyword(&["static", "relative", "absolute", "fixed"]),
        },
        N::Top => &Longhand { name: N::Top, grammar: LENGTH_AUTO },
        N::Right => &Longhand { name: N::Right, grammar: LENGTH_AUTO },
        N::Bottom => &Longhand { name: N::Bottom, grammar: LENGTH_AUTO },
        N::Left => &Longhand { name: N::Left, grammar: LENGTH_AUTO },
        N::ZIndex => &Longhand { name: N::ZIndex, grammar: Grammar::Integer },
        N::Width => &Longhand { name: N::Width, grammar: SIZE_AUTO },
        N::Height => &Longhand { name: N::Height, grammar: SIZE_AUTO },
        N::MinWidth => &Longhand { name: N::MinWidth, grammar: SIZE },
        N::MinHeight => &Longhand { name: N::MinHeight, grammar: SIZE },
        N::MaxWidth => &Longhand { name: N::MaxWidth, grammar: SIZE_NONE },
        N::MaxHeight => &Longhand { name: N::MaxHeight, grammar: SIZE_NONE },
        N::MarginTop => &Longhand { name: N::MarginTop, grammar: LENGTH_AUTO },
        N::MarginRight => &Longhand { name: N::MarginRight, grammar: LENGTH_AUTO },
        N::MarginBottom => &Longhand { name: N::MarginBottom, grammar: LENGTH_AUTO },
        N::MarginLeft => &Longhand { name: N::MarginLeft, grammar: LENGTH_AUTO },
        N::PaddingTop => &Longhand { name: N::PaddingTop, grammar: SIZE },
        N::PaddingRight => &Longhand { name: N::PaddingRight, grammar: SIZE },
        N::PaddingBottom => &Longhand { name: N::PaddingBottom, grammar: SIZE },
        N::PaddingLeft => &Longhand { name: N::PaddingLeft, grammar: SIZE },
        N::BorderTopWidth => &Longhand { name: N::BorderTopWidth, grammar: BORDER_WIDTH },
        N::BorderRightWidth => &Longhand { name: N::BorderRightWidth, grammar: BORDER_WIDTH },
        N::BorderBottomWidth => &Longhand { name: N::BorderBottomWidth, grammar: BORDER_WIDTH },
        N::BorderLeftWidth => &Longhand { name: N::BorderLeftWidth, grammar: BORDER_WIDTH },
        N::BorderTopStyle => &Longhand { name: N::BorderTopStyle, grammar: Grammar::Keyword(BORDER_STYLES) },
        N::BorderRightStyle => &Longhand { name: N::BorderRightStyle, grammar: Grammar::Keyword(BORDER_STYLES) },
        N::BorderBottomStyle => &Longhand { name: N::BorderBottomStyle, grammar: Grammar::Keyword(BORDER_STYLES) },
        N::BorderLeftStyle => &Longhand { name: N::BorderLeftStyle, grammar: Grammar::Keyword(BORDER_STYLES) },
        N::BorderTopColor => &Longhand { name: N::BorderTopColor, grammar: Grammar::Color },
        N::BorderRightColor => &Longhand { name: N::BorderRightColor, grammar: Grammar::Color },
        N::BorderBottomColor => &Longhand { name: N::BorderBottomColor, grammar: Grammar::Color },
        N::BorderLeftColor => &Longhand { name: N::BorderLeftColor, grammar: Grammar::Color },
        N::BackgroundColor => &Longhand { name: N::BackgroundColor, grammar: Grammar::Color },
        N::BackgroundImage => &Longhand { name: N::BackgroundImage, grammar: Grammar::Image },
        N::Color => &Longhand { name: N::Color, grammar: Grammar::Color },
        N::Opacity => &Longhand {
            name: N::Opacity,
            grammar: Grammar::Number { min: 0.0, max: 1.0, keywords: &[] },
        },
        N::Overflow => &Longhand {
            name: N::Overflow,
            grammar: Grammar::Keyword(&["visible", "hidden", "scroll", "auto"]),
        },
        N::Visibility => &Longhand {
            name: N::Visibility,
            grammar: Grammar::Keyword(&["visible", "hidden", "collapse"]),
        },
        N::FontFamily => &Longhand { name: N::FontFamily, grammar: Grammar::FontFamily },
        N::FontSize => &Longhand {
            name: N::FontSize,
            grammar: Grammar::Length { non_negative: true, keywords: FONT_SIZES },
        },
        N::FontWeight => &Longhand {
            name: N::FontWeight,
            grammar: Grammar::Number {
                min: 1.0,
                max: 1000.0,
                keywords: &["normal", "bold", "bolder", "lighter"],
            },
        },
        N::FontStyle => &Longhand {
            name: N::FontStyle,
            grammar: Grammar::Keyword(&["normal", "italic", "oblique"]),
        },
        N::LineHeight => &Longhand { name: N::LineHeight, grammar: Grammar::LineHeight },
        N::LetterSpacing => &Longhand {
            name: N::LetterSpacing,
            grammar: Grammar::Length { non_negative: false, keywords: &["normal"] },
        },
        N::TextAlign => &Longhand {
            name: N::TextAlign,
            grammar: Grammar::Keyword(&["left", "right", "center", "justify"]),
        },
        N::ListStyleType => &Longhand {
            name: N::ListStyleType,
            grammar: Grammar::Keyword(&["disc", "circle", "square", "decimal", "none"]),
        },
        N::PageBreakBefore => &Longhand { name: N::PageBreakBefore, grammar: Grammar::Keyword(BREAK_VALUES) },
        N::PageBreakAfter => &Longhand { name: N::PageBreakAfter, grammar: Grammar::Keyword(BREAK_VALUES) },
        N::PageBreakInside => &Longhand {
            name: N::PageBreakInside,
            grammar: Grammar::Keyword(&["auto", "avoid"]),
        },
        N::Page => &Longhand { name: N::Page, grammar: Grammar::PageName },
    };
    Some(builder)
}
