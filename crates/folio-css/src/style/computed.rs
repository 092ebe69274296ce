//! Computed styles and the style session.
//!
//! [§ 6.1 Specified, computed, and actual values](https://www.w3.org/TR/CSS2/cascade.html#value-stages)
//!
//! A [`CalculatedStyle`] holds one derived value for every longhand in
//! [`CssName`]. It is immutable once built; restyling builds a new one.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use folio_common::warning::warn_once;
use folio_dom::NodeId;
use strum::IntoEnumIterator;

use super::color::{ColorValue, RgbColor};
use super::derived::{DerivedValue, DerivedValueFactory};
use super::properties::{CssName, IdentValue};
use super::values::{PropertyDeclaration, RawDeclaration};
use super::{builders, ua};
use crate::error::StyleError;
use crate::layout::box_model::{RectPropertySet, Side};
use crate::layout::layer::ZIndex;

/// Default font size when nothing else applies.
pub const DEFAULT_FONT_SIZE_PX: f32 = 16.0;

/// Resolved style for one element, pseudo-element, or anonymous box.
pub struct CalculatedStyle {
    parent: Option<Arc<CalculatedStyle>>,
    /// Indexed by `CssName as usize`; one entry per longhand.
    values: Vec<Arc<DerivedValue>>,
    anonymous: bool,
    font_size: f32,
}

impl fmt::Debug for CalculatedStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalculatedStyle")
            .field("display", &self.display())
            .field("anonymous", &self.anonymous)
            .field("font_size", &self.font_size)
            .finish_non_exhaustive()
    }
}

impl CalculatedStyle {
    /// The shared derived value for `name`.
    #[must_use]
    pub fn value(&self, name: CssName) -> Arc<DerivedValue> {
        Arc::clone(&self.values[name as usize])
    }

    /// Borrow the derived value for `name`.
    #[must_use]
    pub fn get(&self, name: CssName) -> &DerivedValue {
        &self.values[name as usize]
    }

    /// The style this one inherits from.
    #[must_use]
    pub const fn parent(&self) -> Option<&Arc<Self>> {
        self.parent.as_ref()
    }

    /// Whether this style was synthesized for an anonymous box.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Keyword value of `name`, if it is a keyword.
    #[must_use]
    pub fn ident(&self, name: CssName) -> Option<&IdentValue> {
        self.get(name).as_ident()
    }

    /// `name` is the keyword `ident`.
    #[must_use]
    pub fn is_ident(&self, name: CssName, ident: &IdentValue) -> bool {
        self.ident(name) == Some(ident)
    }

    /// `name` is `auto`.
    #[must_use]
    pub fn is_auto(&self, name: CssName) -> bool {
        self.is_ident(name, &IdentValue::Auto)
    }

    /// `height: auto`; the box takes its height from its content.
    #[must_use]
    pub fn is_auto_height(&self) -> bool {
        self.is_auto(CssName::Height)
    }

    /// Resolve a length property to pixels. `None` for keywords.
    #[must_use]
    pub fn length_px(&self, name: CssName, percent_base: f32) -> Option<f32> {
        self.get(name)
            .as_length()
            .map(|length| length.to_px(percent_base, self.font_size))
    }

    /// [§ 15.7 Font size](https://www.w3.org/TR/CSS2/fonts.html#font-size-props)
    #[must_use]
    pub const fn font_size(&self) -> f32 {
        self.font_size
    }

    /// The `display` keyword.
    #[must_use]
    pub fn display(&self) -> IdentValue {
        self.ident(CssName::Display).cloned().unwrap_or(IdentValue::Inline)
    }

    /// `display: none`.
    #[must_use]
    pub fn is_display_none(&self) -> bool {
        self.is_ident(CssName::Display, &IdentValue::None)
    }

    /// [§ 9.2.1 Block-level elements](https://www.w3.org/TR/CSS2/visuren.html#block-boxes)
    #[must_use]
    pub fn is_block_level(&self) -> bool {
        matches!(self.display(), IdentValue::Block | IdentValue::ListItem)
    }

    /// `display: list-item`.
    #[must_use]
    pub fn is_list_item(&self) -> bool {
        self.is_ident(CssName::Display, &IdentValue::ListItem)
    }

    /// [§ 8.3 Margin properties](https://www.w3.org/TR/CSS2/box.html#margin-properties)
    ///
    /// "The percentage is calculated with respect to the width of the
    /// generated box's containing block." `auto` resolves to 0 here; block
    /// layout handles auto centering itself.
    #[must_use]
    pub fn margin_rect(&self, cb_width: f32) -> RectPropertySet {
        RectPropertySet {
            top: self.length_px(CssName::MarginTop, cb_width).unwrap_or(0.0),
            right: self.length_px(CssName::MarginRight, cb_width).unwrap_or(0.0),
            bottom: self.length_px(CssName::MarginBottom, cb_width).unwrap_or(0.0),
            left: self.length_px(CssName::MarginLeft, cb_width).unwrap_or(0.0),
        }
    }

    /// [§ 8.4 Padding properties](https://www.w3.org/TR/CSS2/box.html#padding-properties)
    #[must_use]
    pub fn padding_rect(&self, cb_width: f32) -> RectPropertySet {
        RectPropertySet {
            top: self.length_px(CssName::PaddingTop, cb_width).unwrap_or(0.0),
            right: self.length_px(CssName::PaddingRight, cb_width).unwrap_or(0.0),
            bottom: self.length_px(CssName::PaddingBottom, cb_width).unwrap_or(0.0),
            left: self.length_px(CssName::PaddingLeft, cb_width).unwrap_or(0.0),
        }
    }

    /// [§ 8.5.3 Border style](https://www.w3.org/TR/CSS2/box.html#border-style-properties)
    ///
    /// Used border widths: a side whose style is `none` or `hidden` has
    /// zero width regardless of `border-*-width`.
    #[must_use]
    pub fn border_rect(&self) -> RectPropertySet {
        RectPropertySet {
            top: self.border_side(Side::Top).width,
            right: self.border_side(Side::Right).width,
            bottom: self.border_side(Side::Bottom).width,
            left: self.border_side(Side::Left).width,
        }
    }

    /// Width, style and color of one border side.
    #[must_use]
    pub fn border_side(&self, side: Side) -> BorderSide {
        let (width, style, color) = match side {
            Side::Top => (CssName::BorderTopWidth, CssName::BorderTopStyle, CssName::BorderTopColor),
            Side::Right => (CssName::BorderRightWidth, CssName::BorderRightStyle, CssName::BorderRightColor),
            Side::Bottom => (
                CssName::BorderBottomWidth,
                CssName::BorderBottomStyle,
                CssName::BorderBottomColor,
            ),
            Side::Left => (CssName::BorderLeftWidth, CssName::BorderLeftStyle, CssName::BorderLeftColor),
        };
        let style = self.ident(style).cloned().unwrap_or(IdentValue::None);
        let width = if style.is_visible_border_style() {
            self.length_px(width, 0.0).unwrap_or(0.0)
        } else {
            0.0
        };
        let color = self.color_of(color).unwrap_or(ColorValue::Rgb(RgbColor::BLACK));
        BorderSide { width, style, color }
    }

    fn color_of(&self, name: CssName) -> Option<ColorValue> {
        self.get(name).as_color().copied()
    }

    /// Background color, `None` when transparent.
    #[must_use]
    pub fn background_color(&self) -> Option<ColorValue> {
        self.color_of(CssName::BackgroundColor)
            .filter(|c| !c.is_transparent())
    }

    /// `background-image` when it is a gradient function.
    #[must_use]
    pub fn background_gradient(&self) -> Option<&DerivedValue> {
        match self.get(CssName::BackgroundImage) {
            value @ DerivedValue::Function { .. } => Some(value),
            _ => None,
        }
    }

    /// Foreground color.
    #[must_use]
    pub fn color(&self) -> ColorValue {
        self.color_of(CssName::Color)
            .unwrap_or(ColorValue::Rgb(RgbColor::BLACK))
    }

    /// [§ 3.2 Transparency](https://www.w3.org/TR/css-color-3/#transparency)
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.get(CssName::Opacity).as_number().unwrap_or(1.0)
    }

    /// [§ 9.9.1 'z-index'](https://www.w3.org/TR/CSS2/visuren.html#z-index)
    #[must_use]
    pub fn z_index(&self) -> ZIndex {
        match self.get(CssName::ZIndex).as_number() {
            Some(n) => ZIndex::Integer(n as i32),
            None => ZIndex::Auto,
        }
    }

    /// [§ 9.3.1 Choosing a positioning scheme](https://www.w3.org/TR/CSS2/visuren.html#choose-position)
    #[must_use]
    pub fn is_positioned(&self) -> bool {
        !self.is_ident(CssName::Position, &IdentValue::Static)
    }

    /// `position: absolute` or `fixed`.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        matches!(
            self.ident(CssName::Position),
            Some(IdentValue::Absolute | IdentValue::Fixed)
        )
    }

    /// `position: relative`.
    #[must_use]
    pub fn is_relative(&self) -> bool {
        self.is_ident(CssName::Position, &IdentValue::Relative)
    }

    /// Whether a box with this style gets its own layer.
    #[must_use]
    pub fn establishes_layer(&self) -> bool {
        self.is_positioned() || self.opacity() < 1.0
    }

    /// `visibility: visible`.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.is_ident(CssName::Visibility, &IdentValue::Visible)
    }

    /// `overflow: visible`.
    #[must_use]
    pub fn is_overflow_visible(&self) -> bool {
        self.is_ident(CssName::Overflow, &IdentValue::Visible)
    }

    /// Named page, `None` for `auto`.
    #[must_use]
    pub fn page_name(&self) -> Option<&str> {
        match self.ident(CssName::Page)? {
            IdentValue::Other(name) => Some(name),
            _ => None,
        }
    }

    /// `page-break-before` keyword.
    #[must_use]
    pub fn page_break_before(&self) -> IdentValue {
        self.ident(CssName::PageBreakBefore).cloned().unwrap_or(IdentValue::Auto)
    }

    /// `page-break-after` keyword.
    #[must_use]
    pub fn page_break_after(&self) -> IdentValue {
        self.ident(CssName::PageBreakAfter).cloned().unwrap_or(IdentValue::Auto)
    }

    /// `page-break-inside: avoid`.
    #[must_use]
    pub fn avoids_page_break_inside(&self) -> bool {
        self.is_ident(CssName::PageBreakInside, &IdentValue::Avoid)
    }

    /// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#leading)
    ///
    /// `normal` uses 1.2 times the font size.
    #[must_use]
    pub fn line_height(&self) -> f32 {
        match self.get(CssName::LineHeight) {
            DerivedValue::Number(n) => n * self.font_size,
            DerivedValue::Length(length) => length.to_px(self.font_size, self.font_size),
            _ => self.font_size * 1.2,
        }
    }

    /// Extra advance between characters.
    #[must_use]
    pub fn letter_spacing(&self) -> f32 {
        self.length_px(CssName::LetterSpacing, 0.0).unwrap_or(0.0)
    }

    /// `text-align` keyword.
    #[must_use]
    pub fn text_align(&self) -> IdentValue {
        self.ident(CssName::TextAlign).cloned().unwrap_or(IdentValue::Left)
    }

    /// [§ 3.2 'font-weight'](https://www.w3.org/TR/css-fonts-4/#font-weight-prop)
    ///
    /// Numeric weight (400 = normal, 700 = bold). `bolder`/`lighter` step
    /// relative to the parent.
    #[must_use]
    pub fn font_weight(&self) -> u16 {
        let parent = || self.parent.as_ref().map_or(400, |p| p.font_weight());
        match self.get(CssName::FontWeight) {
            DerivedValue::Number(n) => *n as u16,
            DerivedValue::Ident(IdentValue::Bold) => 700,
            DerivedValue::Ident(IdentValue::Bolder) => (parent() + 300).min(900),
            DerivedValue::Ident(IdentValue::Lighter) => parent().saturating_sub(300).max(100),
            _ => 400,
        }
    }

    /// `font-style` is italic or oblique.
    #[must_use]
    pub fn is_italic(&self) -> bool {
        matches!(
            self.ident(CssName::FontStyle),
            Some(IdentValue::Italic | IdentValue::Oblique)
        )
    }

    /// First family in `font-family`.
    #[must_use]
    pub fn font_family(&self) -> String {
        fn name(value: &DerivedValue) -> Option<String> {
            match value {
                DerivedValue::String(s) => Some(s.clone()),
                DerivedValue::Ident(ident) => Some(ident.to_string()),
                // Unquoted multi-word name inside a comma list.
                DerivedValue::List(words) => {
                    let words: Option<Vec<String>> = words.iter().map(|w| name(w)).collect();
                    words.map(|w| w.join(" "))
                }
                _ => None,
            }
        }
        let family = match self.get(CssName::FontFamily) {
            DerivedValue::List(families) => families.first().and_then(|f| name(f)),
            single => name(single),
        };
        family.unwrap_or_else(|| "serif".to_string())
    }

    /// `list-style-type` keyword.
    #[must_use]
    pub fn list_style_type(&self) -> IdentValue {
        self.ident(CssName::ListStyleType).cloned().unwrap_or(IdentValue::Disc)
    }
}

/// One resolved border side.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderSide {
    /// Used width in pixels.
    pub width: f32,
    /// Border style keyword.
    pub style: IdentValue,
    /// Border color.
    pub color: ColorValue,
}

/// Supplies cascaded declarations per element.
///
/// Selector matching happens upstream; the resolver only asks "what was
/// declared for this element (or this pseudo-element of it)".
pub trait StyleSource {
    /// Declarations for `element`, or for its `pseudo` element.
    fn declarations(&self, element: NodeId, pseudo: Option<&str>) -> Vec<RawDeclaration>;

    /// Generated text for the `pseudo` element of `element`, if any.
    fn pseudo_content(&self, _element: NodeId, _pseudo: &str) -> Option<String> {
        None
    }
}

/// A [`StyleSource`] backed by a map, filled by the caller.
#[derive(Debug, Clone, Default)]
pub struct MapStyleSource {
    entries: HashMap<(NodeId, Option<String>), Vec<RawDeclaration>>,
    content: HashMap<(NodeId, String), String>,
}

impl MapStyleSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration for `element` (or its `pseudo` element).
    pub fn push(&mut self, element: NodeId, pseudo: Option<&str>, declaration: RawDeclaration) {
        self.entries
            .entry((element, pseudo.map(str::to_string)))
            .or_default()
            .push(declaration);
    }

    /// Parse `name: value` pairs as author declarations for `element`.
    pub fn push_css(&mut self, element: NodeId, pseudo: Option<&str>, pairs: &[(&str, &str)]) {
        for (name, value) in pairs {
            self.push(element, pseudo, RawDeclaration::author(name, value));
        }
    }

    /// Set the generated text of the `pseudo` element of `element`.
    pub fn set_content(&mut self, element: NodeId, pseudo: &str, text: &str) {
        let _ = self.content.insert((element, pseudo.to_string()), text.to_string());
    }

    /// Whether `element` has declarations for `pseudo`.
    #[must_use]
    pub fn has_pseudo(&self, element: NodeId, pseudo: &str) -> bool {
        self.entries.contains_key(&(element, Some(pseudo.to_string())))
    }
}

impl StyleSource for MapStyleSource {
    fn declarations(&self, element: NodeId, pseudo: Option<&str>) -> Vec<RawDeclaration> {
        self.entries
            .get(&(element, pseudo.map(str::to_string)))
            .cloned()
            .unwrap_or_default()
    }

    fn pseudo_content(&self, element: NodeId, pseudo: &str) -> Option<String> {
        self.content.get(&(element, pseudo.to_string())).cloned()
    }
}

/// Per-document style state: the derived value factory (and with it the
/// color cache) plus the derived initial values.
#[derive(Debug)]
pub struct StyleSession {
    factory: DerivedValueFactory,
    initial: Vec<Arc<DerivedValue>>,
}

impl StyleSession {
    /// Start a session.
    ///
    /// # Errors
    ///
    /// Fails only if an initial value cannot be derived, which would be a
    /// bug in the property table.
    pub fn new() -> Result<Self, StyleError> {
        let factory = DerivedValueFactory::new();
        let initial = CssName::iter()
            .map(|name| factory.new_derived_value(None, name, &name.initial_value()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { factory, initial })
    }

    /// The session's value factory.
    #[must_use]
    pub const fn factory(&self) -> &DerivedValueFactory {
        &self.factory
    }

    /// Validate and expand raw declarations, then sort them into cascade
    /// order (lowest precedence first, feed order within a level).
    ///
    /// Malformed declarations are reported through
    /// [`warn_once`] and skipped.
    #[must_use]
    pub fn resolve_declarations(&self, raw: &[RawDeclaration]) -> Vec<PropertyDeclaration> {
        let mut resolved = Vec::new();
        for declaration in raw {
            let built = builders::builder_for(&declaration.name)
                .ok_or_else(|| StyleError::UnknownProperty(declaration.name.clone()))
                .and_then(|builder| {
                    builder.build_declarations(
                        &declaration.name,
                        &declaration.values,
                        declaration.origin,
                        declaration.important,
                        declaration.inherit_allowed,
                    )
                });
            match built {
                Ok(longhands) => resolved.extend(longhands),
                Err(e) => {
                    let _ = warn_once("style", &e.to_string());
                }
            }
        }
        // Stable: feed order survives within one origin/importance level.
        resolved.sort_by_key(PropertyDeclaration::rank);
        resolved
    }

    /// Build a style from cascaded declarations under `parent`.
    ///
    /// Undeclared inherited properties share the parent's value instance;
    /// undeclared non-inherited properties take the session's initial value.
    ///
    /// # Errors
    ///
    /// Propagates [`StyleError::Internal`]. Recoverable derivation failures
    /// are warned about and the property falls back as if undeclared.
    pub fn compute(
        &self,
        parent: Option<&Arc<CalculatedStyle>>,
        declarations: &[PropertyDeclaration],
    ) -> Result<Arc<CalculatedStyle>, StyleError> {
        let mut winners: HashMap<CssName, &PropertyDeclaration> = HashMap::new();
        for declaration in declarations {
            // Sorted lowest first, so later entries override.
            let _ = winners.insert(declaration.name, declaration);
        }

        let parent_style = parent.map(Arc::as_ref);
        let mut values = Vec::with_capacity(self.initial.len());
        for name in CssName::iter() {
            let declared = winners
                .get(&name)
                .map(|d| self.factory.new_derived_value(parent_style, name, &d.value));
            let value = match declared {
                Some(Ok(value)) => value,
                Some(Err(e)) if e.is_fatal() => return Err(e),
                Some(Err(e)) => {
                    let _ = warn_once("style", &e.to_string());
                    self.undeclared(parent_style, name)
                }
                None => self.undeclared(parent_style, name),
            };
            values.push(value);
        }

        let parent_font_size = parent_style.map_or(DEFAULT_FONT_SIZE_PX, CalculatedStyle::font_size);
        let font_size = values[CssName::FontSize as usize]
            .as_length()
            .map_or(parent_font_size, |length| length.to_px(parent_font_size, parent_font_size));

        Ok(Arc::new(CalculatedStyle {
            parent: parent.cloned(),
            values,
            anonymous: false,
            font_size,
        }))
    }

    fn undeclared(&self, parent: Option<&CalculatedStyle>, name: CssName) -> Arc<DerivedValue> {
        match parent {
            Some(parent) if name.is_inherited() => parent.value(name),
            _ => Arc::clone(&self.initial[name as usize]),
        }
    }

    /// Style for an element: user-agent defaults for its tag followed by the
    /// source's declarations, cascaded under `parent`.
    ///
    /// # Errors
    ///
    /// See [`StyleSession::compute`].
    pub fn style_for_element(
        &self,
        parent: Option<&Arc<CalculatedStyle>>,
        tag: &str,
        source: &dyn StyleSource,
        element: NodeId,
    ) -> Result<Arc<CalculatedStyle>, StyleError> {
        let mut raw = ua::declarations_for(tag);
        raw.extend(source.declarations(element, None));
        let resolved = self.resolve_declarations(&raw);
        self.compute(parent, &resolved)
    }

    /// Style for a pseudo-element of `element`, derived from the element's
    /// own style.
    ///
    /// # Errors
    ///
    /// See [`StyleSession::compute`].
    pub fn derive_pseudo_style(
        &self,
        element_style: &Arc<CalculatedStyle>,
        source: &dyn StyleSource,
        element: NodeId,
        pseudo: &str,
    ) -> Result<Arc<CalculatedStyle>, StyleError> {
        let resolved = self.resolve_declarations(&source.declarations(element, Some(pseudo)));
        self.derive_style(element_style, &resolved)
    }

    /// A new style under `parent` from already resolved declarations.
    ///
    /// # Errors
    ///
    /// See [`StyleSession::compute`].
    pub fn derive_style(
        &self,
        parent: &Arc<CalculatedStyle>,
        declarations: &[PropertyDeclaration],
    ) -> Result<Arc<CalculatedStyle>, StyleError> {
        self.compute(Some(parent), declarations)
    }

    /// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
    ///
    /// "The properties of anonymous boxes are inherited from the enclosing
    /// non-anonymous box. Non-inherited properties have their initial value."
    #[must_use]
    pub fn create_anonymous_style(&self, parent: &Arc<CalculatedStyle>, display: &IdentValue) -> Arc<CalculatedStyle> {
        let values: Vec<Arc<DerivedValue>> = CssName::iter()
            .map(|name| {
                if name == CssName::Display {
                    Arc::new(DerivedValue::Ident(display.clone()))
                } else {
                    self.undeclared(Some(parent), name)
                }
            })
            .collect();
        Arc::new(CalculatedStyle {
            parent: Some(Arc::clone(parent)),
            values,
            anonymous: true,
            font_size: parent.font_size(),
        })
    }

    /// Root style with no declarations, for documents without styling.
    #[must_use]
    pub fn initial_style(&self) -> Arc<CalculatedStyle> {
        Arc::new(CalculatedStyle {
            parent: None,
            values: self.initial.clone(),
            anonymous: false,
            font_size: DEFAULT_FONT_SIZE_PX,
        })
    }
}
