//! The property table and keyword vocabulary.
//!
//! [CSS 2.1 Appendix F. Full property table](https://www.w3.org/TR/CSS2/propidx.html)

use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use super::values::{PropertyValue, Unit};

/// Every longhand property the resolver derives.
///
/// Shorthands (`margin`, `border`, ...) are not listed here; they expand into
/// these during declaration building.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum CssName {
    Display,
    Position,
    Top,
    Right,
    Bottom,
    Left,
    ZIndex,
    Width,
    MinWidth,
    MaxWidth,
    Height,
    MinHeight,
    MaxHeight,
    MarginTop,
    MarginRight,
    MarginBottom,
    MarginLeft,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,
    BorderTopWidth,
    BorderRightWidth,
    BorderBottomWidth,
    BorderLeftWidth,
    BorderTopStyle,
    BorderRightStyle,
    BorderBottomStyle,
    BorderLeftStyle,
    BorderTopColor,
    BorderRightColor,
    BorderBottomColor,
    BorderLeftColor,
    BackgroundColor,
    BackgroundImage,
    Color,
    Opacity,
    Overflow,
    Visibility,
    FontFamily,
    FontSize,
    FontWeight,
    FontStyle,
    LineHeight,
    LetterSpacing,
    TextAlign,
    ListStyleType,
    PageBreakBefore,
    PageBreakAfter,
    PageBreakInside,
    Page,
}

impl CssName {
    /// The property's canonical name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// [§ 6.2 Inheritance](https://www.w3.org/TR/CSS2/cascade.html#inheritance)
    ///
    /// "Inherited: yes" in the property table.
    #[must_use]
    pub const fn is_inherited(self) -> bool {
        matches!(
            self,
            Self::Color
                | Self::Visibility
                | Self::FontFamily
                | Self::FontSize
                | Self::FontWeight
                | Self::FontStyle
                | Self::LineHeight
                | Self::LetterSpacing
                | Self::TextAlign
                | Self::ListStyleType
                | Self::PageBreakInside
        )
    }

    /// Initial value from the property table.
    #[must_use]
    pub fn initial_value(self) -> PropertyValue {
        match self {
            Self::Display => PropertyValue::ident("inline"),
            Self::Position => PropertyValue::ident("static"),
            Self::Top
            | Self::Right
            | Self::Bottom
            | Self::Left
            | Self::ZIndex
            | Self::Width
            | Self::Height
            | Self::PageBreakBefore
            | Self::PageBreakAfter
            | Self::PageBreakInside
            | Self::Page => PropertyValue::ident("auto"),
            Self::MinWidth | Self::MinHeight => PropertyValue::px(0.0),
            Self::MaxWidth | Self::MaxHeight | Self::BackgroundImage => {
                PropertyValue::ident("none")
            }
            Self::MarginTop
            | Self::MarginRight
            | Self::MarginBottom
            | Self::MarginLeft
            | Self::PaddingTop
            | Self::PaddingRight
            | Self::PaddingBottom
            | Self::PaddingLeft => PropertyValue::px(0.0),
            // "medium" resolves to 3px, but only matters when a style is set.
            Self::BorderTopWidth
            | Self::BorderRightWidth
            | Self::BorderBottomWidth
            | Self::BorderLeftWidth => PropertyValue::px(3.0),
            Self::BorderTopStyle
            | Self::BorderRightStyle
            | Self::BorderBottomStyle
            | Self::BorderLeftStyle => PropertyValue::ident("none"),
            // "currentColor"
            Self::BorderTopColor
            | Self::BorderRightColor
            | Self::BorderBottomColor
            | Self::BorderLeftColor
            | Self::Color => PropertyValue::ident("black"),
            Self::BackgroundColor => PropertyValue::ident("transparent"),
            Self::Opacity => PropertyValue::Number(1.0),
            Self::Overflow | Self::Visibility => PropertyValue::ident("visible"),
            Self::FontFamily => PropertyValue::ident("serif"),
            Self::FontSize => PropertyValue::Length {
                value: 16.0,
                unit: Unit::Px,
            },
            Self::FontWeight | Self::FontStyle | Self::LineHeight | Self::LetterSpacing => {
                PropertyValue::ident("normal")
            }
            Self::TextAlign => PropertyValue::ident("left"),
            Self::ListStyleType => PropertyValue::ident("disc"),
        }
    }
}

/// Keywords with a fast path. Anything else is carried as
/// [`IdentValue::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
#[allow(missing_docs)]
pub enum IdentValue {
    Auto,
    None,
    Normal,
    Inherit,
    // display
    Block,
    Inline,
    InlineBlock,
    ListItem,
    // position
    Static,
    Relative,
    Absolute,
    Fixed,
    // overflow / visibility
    Visible,
    Hidden,
    Scroll,
    Collapse,
    // border-style
    Solid,
    Dashed,
    Dotted,
    Double,
    Groove,
    Ridge,
    Inset,
    Outset,
    // page breaks
    Always,
    Avoid,
    Left,
    Right,
    Page,
    Recto,
    Verso,
    // text
    Center,
    Justify,
    Bold,
    Bolder,
    Lighter,
    Italic,
    Oblique,
    // list markers
    Disc,
    Circle,
    Square,
    Decimal,
    Transparent,
    /// A keyword with no dedicated variant.
    #[strum(default)]
    Other(String),
}

impl IdentValue {
    /// Look up a keyword, case-insensitively. Words that are not keywords
    /// keep their spelling.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_lowercase().parse::<Self>() {
            Ok(Self::Other(_)) | Err(_) => Self::Other(keyword.to_string()),
            Ok(ident) => ident,
        }
    }

    /// Whether this is a border style that paints.
    #[must_use]
    pub const fn is_visible_border_style(&self) -> bool {
        !matches!(self, Self::None | Self::Hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_strings() {
        assert_eq!("margin-top".parse::<CssName>(), Ok(CssName::MarginTop));
        assert_eq!(CssName::PageBreakBefore.as_str(), "page-break-before");
        assert!("margin".parse::<CssName>().is_err());
    }

    #[test]
    fn test_keyword_fallback() {
        assert_eq!(IdentValue::from_keyword("Inline-Block"), IdentValue::InlineBlock);
        assert_eq!(
            IdentValue::from_keyword("table-cell"),
            IdentValue::Other("table-cell".to_string())
        );
        assert_eq!(IdentValue::from_keyword("Chapter"), IdentValue::Other("Chapter".to_string()));
    }
}
