//! Errors raised while converting an [`OrderedMap`](crate::OrderedMap) to or
//! from JSON.

use thiserror::Error;

/// Errors from [`to_json`](crate::OrderedMap::to_json) and
/// [`extend_from_json`](crate::OrderedMap::extend_from_json).
///
/// New variants may be added in minor versions.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CodecError {
    /// The key type has no wire-string form.
    #[error("json: unsupported key type: {type_name}")]
    UnsupportedKeyType {
        /// Name of the rejected key type.
        type_name: &'static str,
    },

    /// The value encoder rejected a value.
    #[error("json: unsupported type: {type_name}")]
    UnsupportedType {
        /// Name of the value type being encoded.
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The input is not a well-formed JSON object.
    #[error("{message} (offset:{offset})")]
    Syntax {
        /// Byte offset into the input where the problem was found.
        offset: usize,
        message: String,
    },

    /// A key string could not be parsed as the map's key type.
    #[error("json: cannot parse key {key:?} as {type_name}: {reason}")]
    InvalidKey {
        key: String,
        type_name: &'static str,
        reason: String,
    },

    /// A value was well-formed JSON but could not be decoded into the value type.
    #[error("json: cannot decode value at offset {offset}: {source}")]
    Value {
        /// Byte offset of the start of the value.
        offset: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl CodecError {
    pub(crate) fn unsupported_key<T: ?Sized>() -> Self {
        CodecError::UnsupportedKeyType {
            type_name: core::any::type_name::<T>(),
        }
    }

    pub(crate) fn invalid_key<T: ?Sized>(key: &str, reason: impl ToString) -> Self {
        CodecError::InvalidKey {
            key: key.to_owned(),
            type_name: core::any::type_name::<T>(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        CodecError::Syntax {
            offset,
            message: message.into(),
        }
    }

    /// Check if the input was malformed.
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, CodecError::Syntax { .. })
    }

    /// Check if a key could not be encoded or decoded.
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            CodecError::UnsupportedKeyType { .. } | CodecError::InvalidKey { .. }
        )
    }

    /// Check if the delegated value codec failed.
    pub fn is_value_error(&self) -> bool {
        matches!(
            self,
            CodecError::UnsupportedType { .. } | CodecError::Value { .. }
        )
    }

    /// Input offset associated with a decode error.
    pub fn offset(&self) -> Option<usize> {
        match self {
            CodecError::Syntax { offset, .. } | CodecError::Value { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}
