//! Derived values: validated, typed, shareable property values.
//!
//! A derived value is created once per (element, property) and handed out as
//! `Arc<DerivedValue>`. Inheritance shares the parent's `Arc`; repeated color
//! literals share one interned instance per style session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::color::ColorValue;
use super::computed::CalculatedStyle;
use super::properties::{CssName, IdentValue};
use super::values::{PropertyValue, Unit};
use crate::error::StyleError;

/// A length that remembers which property it belongs to.
///
/// Resolution is lazy: percentages need the containing block and font
/// relative units need the element's font size, neither of which is known
/// while styles are being derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthValue {
    /// Owning property, used for diagnostics and percentage bases.
    pub property: CssName,
    /// Numeric part.
    pub value: f32,
    /// Unit part.
    pub unit: Unit,
}

impl LengthValue {
    /// [§ 4.3 Percentages](https://www.w3.org/TR/css-values-4/#percentages)
    ///
    /// Resolve to pixels. `percent_base` is the reference length for
    /// percentages (containing block width for margins and padding, even
    /// vertical ones); `font_size` resolves `em` and `ex`.
    #[must_use]
    pub fn to_px(&self, percent_base: f32, font_size: f32) -> f32 {
        match self.unit {
            Unit::Percent => self.value * percent_base / 100.0,
            Unit::Em => self.value * font_size,
            Unit::Ex => self.value * font_size / 2.0,
            absolute => self.value * absolute.px_per_unit().unwrap_or(1.0),
        }
    }

    /// Whether resolution depends on the containing block.
    #[must_use]
    pub const fn is_percentage(&self) -> bool {
        matches!(self.unit, Unit::Percent)
    }
}

/// The closed set of derived value kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedValue {
    /// A length or percentage.
    Length(LengthValue),
    /// A keyword.
    Ident(IdentValue),
    /// A string.
    String(String),
    /// A number.
    Number(f32),
    /// A color, interned by its literal text.
    Color(ColorValue),
    /// A list of derived values.
    List(Vec<Arc<DerivedValue>>),
    /// A functional notation such as `linear-gradient(...)`.
    Function {
        /// Function name.
        name: String,
        /// Derived arguments.
        args: Vec<Arc<DerivedValue>>,
    },
}

impl DerivedValue {
    /// The keyword, if this is an ident.
    #[must_use]
    pub const fn as_ident(&self) -> Option<&IdentValue> {
        match self {
            Self::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    /// The length, if this is one.
    #[must_use]
    pub const fn as_length(&self) -> Option<&LengthValue> {
        match self {
            Self::Length(length) => Some(length),
            _ => None,
        }
    }

    /// The color, if this is one.
    #[must_use]
    pub const fn as_color(&self) -> Option<&ColorValue> {
        match self {
            Self::Color(color) => Some(color),
            _ => None,
        }
    }

    /// The number, if this is one.
    #[must_use]
    pub const fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Session-wide interning table for color literals.
///
/// Keys are the literal CSS text, so `red` and `#ff0000` are distinct entries
/// even though they denote the same color. Entries are never evicted; the
/// table lives as long as the style session that owns it.
#[derive(Debug, Default)]
pub struct ColorCache {
    entries: Mutex<HashMap<String, Arc<DerivedValue>>>,
}

impl ColorCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared instance for `text`, parsing and inserting it on
    /// first use. The lookup and insert happen under one lock.
    ///
    /// # Errors
    ///
    /// [`StyleError::InvalidValue`] if `text` is not a color.
    pub fn intern(&self, property: CssName, text: &str) -> Result<Arc<DerivedValue>, StyleError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.get(text) {
            return Ok(Arc::clone(existing));
        }
        let color = ColorValue::parse(text)
            .ok_or_else(|| StyleError::invalid(property.as_str(), text))?;
        let value = Arc::new(DerivedValue::Color(color));
        let _ = entries.insert(text.to_string(), Arc::clone(&value));
        Ok(value)
    }

    /// Number of distinct literals interned so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been interned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Converts validated primitives into derived values.
#[derive(Debug, Default)]
pub struct DerivedValueFactory {
    colors: ColorCache,
}

impl DerivedValueFactory {
    /// Create a factory with an empty color cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The factory's color cache.
    #[must_use]
    pub const fn colors(&self) -> &ColorCache {
        &self.colors
    }

    /// Derive one value for `name` on an element whose parent style is
    /// `parent`.
    ///
    /// `inherit` returns the parent's instance for the same property (or the
    /// derived initial value at the root). Every other kind maps to its
    /// derived counterpart; colors go through the interning cache.
    ///
    /// # Errors
    ///
    /// [`StyleError::Internal`] for [`PropertyValue::Unknown`], which
    /// validation must have rejected already. [`StyleError::InvalidValue`]
    /// for color text that does not parse.
    pub fn new_derived_value(
        &self,
        parent: Option<&CalculatedStyle>,
        name: CssName,
        value: &PropertyValue,
    ) -> Result<Arc<DerivedValue>, StyleError> {
        match value {
            PropertyValue::Inherit => match parent {
                Some(parent) => Ok(parent.value(name)),
                None => self.new_derived_value(None, name, &name.initial_value()),
            },
            PropertyValue::Length { value, unit } => Ok(Arc::new(DerivedValue::Length(LengthValue {
                property: name,
                value: *value,
                unit: *unit,
            }))),
            // A bare zero is a valid length wherever lengths are accepted.
            PropertyValue::Number(n) if *n == 0.0 && accepts_length(name) => {
                Ok(Arc::new(DerivedValue::Length(LengthValue {
                    property: name,
                    value: 0.0,
                    unit: Unit::Px,
                })))
            }
            PropertyValue::Number(n) => Ok(Arc::new(DerivedValue::Number(*n))),
            PropertyValue::Ident(keyword) if is_color_property(name) => {
                self.colors.intern(name, keyword)
            }
            PropertyValue::Ident(keyword) => {
                Ok(Arc::new(DerivedValue::Ident(IdentValue::from_keyword(keyword))))
            }
            PropertyValue::String(s) => Ok(Arc::new(DerivedValue::String(s.clone()))),
            PropertyValue::Color(text) => self.colors.intern(name, text),
            PropertyValue::List(items) => {
                let items = items
                    .iter()
                    .map(|item| self.new_derived_value(parent, name, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Arc::new(DerivedValue::List(items)))
            }
            PropertyValue::Function { name: function, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.new_derived_value(parent, name, arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Arc::new(DerivedValue::Function {
                    name: function.clone(),
                    args,
                }))
            }
            PropertyValue::Unknown(text) => Err(StyleError::Internal(format!(
                "unrecognized primitive '{text}' reached derivation for {name}"
            ))),
        }
    }
}

const fn is_color_property(name: CssName) -> bool {
    matches!(
        name,
        CssName::Color
            | CssName::BackgroundColor
            | CssName::BorderTopColor
            | CssName::BorderRightColor
            | CssName::BorderBottomColor
            | CssName::BorderLeftColor
    )
}

const fn accepts_length(name: CssName) -> bool {
    !matches!(
        name,
        CssName::Opacity | CssName::ZIndex | CssName::FontWeight | CssName::LineHeight
    )
}
