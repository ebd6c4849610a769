//! Error types for the mathbridge core
//!
//! All fallible operations return `Result<T, Error>`.
//! The rewrite pipeline itself never fails; errors only come from the
//! parser and bridge collaborators, bijection lookups, and persistence.

use thiserror::Error;

/// mathbridge error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Markup rejected by the parser collaborator (message kept verbatim)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Alias that was never allocated by the bijection
    #[error("Lookup error: alias '{0}' was never allocated")]
    LookupError(String),

    /// Two pairs share the same original symbol
    #[error("Duplicate original symbol '{0}' in bijection")]
    DuplicateOriginal(String),

    /// Two pairs share the same alias
    #[error("Duplicate alias '{0}' in bijection")]
    DuplicateAlias(String),

    /// Foreign bridge could not convert a value
    #[error("Foreign bridge error: {0}")]
    ForeignError(String),

    /// Operation requires a populated store
    #[error("Expression store is empty")]
    EmptyStore,

    /// Registry has no formula under this name
    #[error("Unknown formula '{0}'")]
    UnknownFormula(String),

    /// Persisted record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Registry file could not be read or written
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

/// Result type alias for mathbridge operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_is_verbatim() {
        let err = Error::ParseError("Unexpected ',' at 1:4".into());
        assert_eq!(err.to_string(), "Parse error: Unexpected ',' at 1:4");
    }

    #[test]
    fn test_lookup_error_names_alias() {
        let err = Error::LookupError("zz".into());
        assert!(err.to_string().contains("'zz'"));
    }

    #[test]
    fn test_serde_error_converts() {
        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = bad.into();
        assert!(matches!(err, Error::SerializationError(_)));
    }
}
