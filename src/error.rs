//! Error type for rebase plans and assembly.
//!
//! Failures fall into three groups that callers can tell apart:
//! malformed input ([`Error::is_format`]), unresolved references
//! ([`Error::is_reference`]) and a primary source whose content hash does
//! not match the plan.

use std::fmt;
use std::io;

/// Result type for fib operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed container data.
    #[error("FLV error: {0}")]
    Flv(#[from] fib_flv::Error),

    /// Malformed script data.
    #[error("Script data error: {0}")]
    Amf(#[from] fib_amf::Error),

    /// A referenced source could not be opened.
    #[error("Source {origin} is unavailable: {cause}")]
    SourceUnavailable {
        /// Display name of the source.
        origin: String,
        /// The underlying open error.
        #[source]
        cause: io::Error,
    },

    /// A command points past the last tag of its source.
    #[error("Source {origin} has {count} tags, but tag {index} was requested")]
    IndexOutOfRange {
        origin: String,
        index: usize,
        count: usize,
    },

    /// The primary source changed since the plan was written.
    #[error("Primary source hash mismatch: expected {expected}, found {actual}")]
    Integrity { expected: String, actual: String },

    /// A command that cannot be carried out as written.
    #[error("Invalid command at position {index}: {reason}")]
    InvalidCommand { index: usize, reason: String },

    /// Reading a plan or writing output failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A plan file that is not valid JSON for its schema.
    #[error("Invalid plan: {0}")]
    Plan(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error describes malformed input data.
    pub fn is_format(&self) -> bool {
        match self {
            Error::Flv(e) => e.is_format(),
            Error::Amf(_) | Error::Plan(_) | Error::InvalidCommand { .. } => true,
            _ => false,
        }
    }

    /// Whether the error is a reference that did not resolve.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Error::SourceUnavailable { .. } | Error::IndexOutOfRange { .. }
        )
    }

    pub fn source_unavailable(origin: impl fmt::Display, cause: io::Error) -> Self {
        Error::SourceUnavailable {
            origin: origin.to_string(),
            cause,
        }
    }

    pub fn invalid_command(index: usize, reason: impl Into<String>) -> Self {
        Error::InvalidCommand {
            index,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let missing = Error::source_unavailable(
            "other.flv",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(missing.is_reference());
        assert!(!missing.is_format());
        assert_eq!(
            missing.to_string(),
            "Source other.flv is unavailable: gone"
        );

        let range = Error::IndexOutOfRange {
            origin: "primary".into(),
            index: 9,
            count: 3,
        };
        assert!(range.is_reference());

        let amf: Error = fib_amf::Error::MovieClip.into();
        assert!(amf.is_format());

        let flv: Error = fib_flv::Error::InvalidSignature("ABC".into()).into();
        assert!(flv.is_format());

        let io_flv: Error = fib_flv::Error::Io(io::Error::other("disk")).into();
        assert!(!io_flv.is_format());

        let hash = Error::Integrity {
            expected: "aa".into(),
            actual: "bb".into(),
        };
        assert!(!hash.is_format() && !hash.is_reference());
    }
}
