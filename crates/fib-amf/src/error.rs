//! Error types for fib-amf.

use thiserror::Error;

/// Result type for fib-amf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for AMF0 encoding and decoding.
///
/// All variants describe malformed or unrepresentable script data.
#[derive(Debug, Error)]
pub enum Error {
    /// Input ended before a value was complete.
    #[error("Unexpected end of script data: need {need} bytes, have {have}")]
    UnexpectedEof { need: usize, have: usize },

    /// Unknown type marker.
    #[error("Unknown script data type marker: {0}")]
    UnknownMarker(u8),

    /// MovieClip values are reserved and never decoded.
    #[error("MovieClip is not supported")]
    MovieClip,

    /// An object end marker outside of an object.
    #[error("Unexpected object end marker")]
    UnexpectedEndMarker,

    /// A zero-length key that is not followed by the end marker.
    #[error("Object end marker not matched: found {0}")]
    EndMarkerMismatch(u8),

    /// A short string (or key) longer than 65535 bytes.
    #[error("String of {0} bytes does not fit a short string (max 65535)")]
    StringTooLong(usize),

    /// A long string longer than the remaining input or the 32-bit limit.
    #[error("Long string of {len} bytes cannot be materialized")]
    LongStringTooLarge { len: u64 },

    /// Empty object keys collide with the end marker.
    #[error("Object keys must not be empty")]
    EmptyKey,

    /// String bytes are not UTF-8.
    #[error("Invalid UTF-8 in script string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A date that does not map to a valid instant.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Values nested beyond the supported depth.
    #[error("Script data nested deeper than {0} levels")]
    NestingTooDeep(usize),

    /// Malformed JSON form.
    #[error("Invalid script data JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A metadata tag body that is not a String followed by an Object or EcmaArray.
    #[error("Invalid script tag body: {0}")]
    InvalidBody(String),
}

impl Error {
    /// Create an invalid body error.
    pub fn invalid_body(msg: impl Into<String>) -> Self {
        Self::InvalidBody(msg.into())
    }

    /// Create an invalid date error.
    pub fn invalid_date(msg: impl Into<String>) -> Self {
        Self::InvalidDate(msg.into())
    }
}
