//! Error types for record-based serialization and deserialization.
//!
//! ## Error Categories
//!
//! - **Configuration Errors**: Schema problems found when an I/O factory is built
//!   (unresolved names, schema cycles, prefix collisions, inconsistent prefix lengths).
//!   Never recovered; no stream has been touched yet.
//! - **Serialization Errors**: Unregistered runtime types, object cycles, values of the
//!   wrong kind. The output stream is left valid but incomplete and should be abandoned.
//! - **Deserialization Errors**: Malformed quoting, field text the converter rejects,
//!   unterminated quoted values. These always carry the line number and the reader
//!   has already moved past the failing record, so the next call can make progress.
//! - **I/O Errors**: Failures of the underlying reader or writer.
//!
//! ## Examples
//!
//! ```rust
//! use rbf_codec::Error;
//!
//! let err = Error::deserialization(12, 4, "unexpected character after closing quote");
//! assert!(err.is_deserialization());
//! assert_eq!(err.line(), Some(12));
//! assert!(err.to_string().contains("line 12"));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised by the record-based codecs.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Invalid schema or options, detected before any record is read or written
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A value could not be written
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A record could not be decoded
    #[error("Deserialization error at line {line}, column {col}: {msg}")]
    Deserialization { line: usize, col: usize, msg: String },

    /// A converter rejected a value or a text
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// `next` was called although no further record is available
    #[error("No more records available")]
    NoMoreRecords,

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a configuration error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rbf_codec::Error;
    ///
    /// let err = Error::configuration("prefix AB is not unique");
    /// assert!(err.is_configuration());
    /// ```
    pub fn configuration<T: fmt::Display>(msg: T) -> Self {
        Error::Configuration(msg.to_string())
    }

    /// Creates a serialization error.
    pub fn serialization<T: fmt::Display>(msg: T) -> Self {
        Error::Serialization(msg.to_string())
    }

    /// Creates a deserialization error with line and column information.
    pub fn deserialization<T: fmt::Display>(line: usize, col: usize, msg: T) -> Self {
        Error::Deserialization {
            line,
            col,
            msg: msg.to_string(),
        }
    }

    /// Creates a conversion error, usually raised by a [`SimpleTypeConverter`](crate::convert::SimpleTypeConverter).
    pub fn conversion<T: fmt::Display>(msg: T) -> Self {
        Error::Conversion(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Re-labels an error raised while decoding a record so it carries the record's position.
    ///
    /// Errors that already carry a position are returned unchanged.
    pub(crate) fn at_position(self, line: usize, col: usize) -> Self {
        match self {
            Error::Deserialization { .. } | Error::Io(_) => self,
            Error::Conversion(msg) | Error::Custom(msg) | Error::Serialization(msg) => {
                Error::deserialization(line, col, msg)
            }
            other => Error::deserialization(line, col, other),
        }
    }

    /// Re-labels a converter or accessor error raised while writing.
    pub(crate) fn while_writing(self) -> Self {
        match self {
            Error::Conversion(msg) | Error::Custom(msg) => Error::Serialization(msg),
            other => other,
        }
    }

    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    #[must_use]
    pub fn is_serialization(&self) -> bool {
        matches!(self, Error::Serialization(_))
    }

    #[must_use]
    pub fn is_deserialization(&self) -> bool {
        matches!(self, Error::Deserialization { .. })
    }

    /// Returns the 1-based line number of a deserialization error.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Deserialization { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::io(&err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_gets_position() {
        let err = Error::conversion("not a number: x").at_position(3, 7);
        assert!(err.is_deserialization());
        assert_eq!(err.line(), Some(3));
        assert!(err.to_string().contains("not a number"));
    }

    #[test]
    fn test_positioned_error_is_kept() {
        let err = Error::deserialization(2, 1, "bad quote").at_position(9, 9);
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_while_writing() {
        assert!(Error::conversion("nope").while_writing().is_serialization());
        assert!(Error::io("disk full").while_writing().to_string().contains("disk full"));
    }
}
