//! Error types for style resolution and layout.

use folio_common::Cancelled;

use crate::layout::BoxId;

/// Malformed style input, or a resolver invariant breach.
///
/// Everything except [`StyleError::Internal`] is recoverable: the offending
/// declaration is reported to the warning sink and skipped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StyleError {
    /// The property name is not one the resolver knows.
    #[error("unknown property '{0}'")]
    UnknownProperty(String),

    /// A value's kind or keyword does not fit the property's grammar.
    #[error("invalid value '{value}' for {property}")]
    InvalidValue {
        /// Property being declared.
        property: String,
        /// Offending value, as CSS text.
        value: String,
    },

    /// `inherit` appeared where the grammar does not accept it.
    #[error("'inherit' is not allowed here for {property}")]
    InheritNotAllowed {
        /// Property being declared.
        property: String,
    },

    /// A value reached the derivation stage with a primitive kind that
    /// validation should already have rejected.
    #[error("internal style error: {0}")]
    Internal(String),
}

impl StyleError {
    /// Construct an [`StyleError::InvalidValue`].
    pub fn invalid(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            property: property.into(),
            value: value.into(),
        }
    }

    /// Whether the error must abort the pass instead of being skipped.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

/// Failure of a layout or paint pass.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// A tree invariant was violated; continuing would produce nonsense
    /// geometry.
    #[error("layout invariant violated at {context}: {message}")]
    InternalConsistency {
        /// Offending box and element, e.g. `box #12 <div>`.
        context: String,
        /// What went wrong.
        message: String,
    },

    /// A style error that cannot be skipped.
    #[error(transparent)]
    Style(#[from] StyleError),

    /// The pass was cancelled through its [`folio_common::CancelToken`].
    #[error("layout cancelled")]
    Cancelled,
}

impl From<Cancelled> for LayoutError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

impl LayoutError {
    /// Construct an [`LayoutError::InternalConsistency`] for a box.
    pub fn consistency(id: BoxId, tag: Option<&str>, message: impl Into<String>) -> Self {
        let context = match tag {
            Some(tag) => format!("box #{} <{tag}>", id.0),
            None => format!("box #{} (anonymous)", id.0),
        };
        Self::InternalConsistency {
            context,
            message: message.into(),
        }
    }
}

/// Result alias for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;
