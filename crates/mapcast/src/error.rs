//! Error taxonomy for property access.

use crate::value::{RawValue, ValueKind};

/// Errors raised by the engine itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    /// The key is absent, or its value cannot be read as the requested type.
    #[error(
        "missing or invalid property `{key}`: expected {expected}, found {}",
        .found.as_deref().unwrap_or("nothing")
    )]
    MissingOrInvalid {
        key: String,
        expected: String,
        found: Option<String>,
    },

    /// One element of an otherwise well-shaped array failed to convert.
    #[error("element [{index}] of `{key}` could not be converted to {expected}: found {kind} `{element}`")]
    ElementConversion {
        key: String,
        index: usize,
        expected: String,
        element: String,
        kind: ValueKind,
    },
}

impl PropertyError {
    /// The key is not present in the source map.
    pub fn missing(key: &str, expected: impl Into<String>) -> Self {
        PropertyError::MissingOrInvalid {
            key: key.to_string(),
            expected: expected.into(),
            found: None,
        }
    }

    /// The key is present but `raw` is not acceptable.
    pub fn invalid(key: &str, expected: impl Into<String>, raw: &RawValue) -> Self {
        PropertyError::MissingOrInvalid {
            key: key.to_string(),
            expected: expected.into(),
            found: Some(raw.describe()),
        }
    }

    /// Element `index` of the array under `key` failed to convert.
    pub fn element(key: &str, index: usize, expected: impl Into<String>, raw: &RawValue) -> Self {
        PropertyError::ElementConversion {
            key: key.to_string(),
            index,
            expected: expected.into(),
            element: raw.to_text(),
            kind: raw.kind(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            PropertyError::MissingOrInvalid { key, .. }
            | PropertyError::ElementConversion { key, .. } => key,
        }
    }

    pub fn is_missing_or_invalid(&self) -> bool {
        matches!(self, PropertyError::MissingOrInvalid { .. })
    }

    pub fn is_element_conversion(&self) -> bool {
        matches!(self, PropertyError::ElementConversion { .. })
    }
}

/// Errors from accessors that call a caller-supplied constructor.
///
/// Engine failures and constructor failures stay in separate variants so a
/// default-mode lookup can fall back on the former without ever masking the
/// latter.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError<E> {
    #[error(transparent)]
    Property(#[from] PropertyError),

    /// The constructor's own error, carried unmodified.
    #[error("{0}")]
    Constructor(E),
}

impl<E> ObjectError<E> {
    pub fn property_error(&self) -> Option<&PropertyError> {
        match self {
            ObjectError::Property(error) => Some(error),
            ObjectError::Constructor(_) => None,
        }
    }

    pub fn constructor_error(&self) -> Option<&E> {
        match self {
            ObjectError::Property(_) => None,
            ObjectError::Constructor(error) => Some(error),
        }
    }

    pub fn into_constructor_error(self) -> Option<E> {
        match self {
            ObjectError::Property(_) => None,
            ObjectError::Constructor(error) => Some(error),
        }
    }
}

/// Lets constructors that themselves use accessors propagate nested object
/// errors with `?`.
impl From<ObjectError<PropertyError>> for PropertyError {
    fn from(error: ObjectError<PropertyError>) -> Self {
        match error {
            ObjectError::Property(error) | ObjectError::Constructor(error) => error,
        }
    }
}

/// Classifies which failures a default-mode lookup may replace.
///
/// Only a `MissingOrInvalid` raised by the engine for the property being
/// read is recoverable. Element failures and constructor errors are not.
pub trait Recoverable {
    fn as_missing_or_invalid(&self) -> Option<&PropertyError>;

    fn is_recoverable(&self) -> bool {
        self.as_missing_or_invalid().is_some()
    }
}

impl Recoverable for PropertyError {
    fn as_missing_or_invalid(&self) -> Option<&PropertyError> {
        self.is_missing_or_invalid().then_some(self)
    }
}

impl<E> Recoverable for ObjectError<E> {
    fn as_missing_or_invalid(&self) -> Option<&PropertyError> {
        self.property_error()
            .and_then(PropertyError::as_missing_or_invalid)
    }
}
