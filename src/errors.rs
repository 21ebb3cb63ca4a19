use std::num::{ParseFloatError, ParseIntError};
use thiserror::Error;

/// Everything that can go wrong while decoding a request into a record.
///
/// All variants are terminal for the call that produced them. Fields written
/// before the failure stay written.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The destination is not a record (or an optional record).
    #[error("destination must be a record, found {found}")]
    InvalidDestination { found: &'static str },

    /// The body claimed to be JSON and did not decode into the destination.
    #[error("invalid JSON body: {0}")]
    Body(#[from] serde_json::Error),

    /// A resolved value targets a field the coercion step cannot write.
    #[error("unsupported type `{type_name}` for field `{field}`")]
    UnsupportedType {
        field: String,
        type_name: &'static str,
    },

    /// An integer or float field received text that does not parse.
    #[error("invalid number for field `{field}`: {source}")]
    InvalidNumber {
        field: String,
        #[source]
        source: NumberError,
    },
}

/// Coarse classification of a [`DecodeError`], for callers mapping errors to responses.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    InvalidDestination,
    BodyDecode,
    UnsupportedType,
    InvalidNumber,
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::InvalidDestination { .. } => ErrorKind::InvalidDestination,
            DecodeError::Body(_) => ErrorKind::BodyDecode,
            DecodeError::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            DecodeError::InvalidNumber { .. } => ErrorKind::InvalidNumber,
        }
    }

    /// Dotted path of the field that failed, when the error is tied to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            DecodeError::UnsupportedType { field, .. } | DecodeError::InvalidNumber { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }
}

/// The underlying parse failure of an [`DecodeError::InvalidNumber`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    #[error(transparent)]
    Int(#[from] ParseIntError),
    #[error(transparent)]
    Float(#[from] ParseFloatError),
}

/// Failure of a single coercion, before the field path is known.
#[derive(Debug, Error)]
pub(crate) enum CoerceError {
    #[error("unsupported type `{0}`")]
    Unsupported(&'static str),
    #[error(transparent)]
    Number(#[from] NumberError),
}

impl CoerceError {
    pub(crate) fn at(self, field: String) -> DecodeError {
        match self {
            CoerceError::Unsupported(type_name) => DecodeError::UnsupportedType { field, type_name },
            CoerceError::Number(source) => DecodeError::InvalidNumber { field, source },
        }
    }
}

// Type alias for results that use `DecodeError` as the error type
pub type Result<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        let err = CoerceError::from(NumberError::from("x".parse::<i32>().unwrap_err()))
            .at("age".to_string());
        assert_eq!(err.kind(), ErrorKind::InvalidNumber);
        assert_eq!(err.field(), Some("age"));
        assert!(err.to_string().starts_with("invalid number for field `age`"));

        let err = CoerceError::Unsupported("Vec").at("tags".to_string());
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
        assert_eq!(err.to_string(), "unsupported type `Vec` for field `tags`");

        let err = DecodeError::InvalidDestination { found: "string" };
        assert_eq!(err.field(), None);
    }
}
