//! Style value resolution
//!
//! Raw per-element declarations become validated, typed, shareable values:
//! - [CSS Values and Units Level 4](https://www.w3.org/TR/css-values-4/)
//! - [CSS Color Level 4](https://www.w3.org/TR/css-color-4/)
//! - [CSS Cascading and Inheritance Level 4](https://www.w3.org/TR/css-cascade-4/)
//!
//! [`builders`] validate declarations against each property's grammar,
//! [`derived`] turns them into interned [`DerivedValue`]s and
//! [`computed`] cascades them into a [`CalculatedStyle`] per box.

pub mod builders;
pub mod color;
pub mod computed;
pub mod derived;
pub mod properties;
mod ua;
pub mod values;

pub use builders::{builder_for, PropertyBuilder};
pub use color::{CmykColor, ColorValue, RgbColor};
pub use computed::{BorderSide, CalculatedStyle, MapStyleSource, StyleSession, StyleSource, DEFAULT_FONT_SIZE_PX};
pub use derived::{ColorCache, DerivedValue, DerivedValueFactory, LengthValue};
pub use properties::{CssName, IdentValue};
pub use values::{CssOrigin, PropertyDeclaration, PropertyValue, RawDeclaration, Unit};
