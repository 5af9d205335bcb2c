//! Error types for fib-flv.

use std::io;
use thiserror::Error;

/// Result type for fib-flv operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for fib-flv operations.
///
/// Every variant except [`Error::Io`] describes malformed container data.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream does not start with the FLV signature.
    #[error("Input is not an FLV stream: {0}")]
    InvalidSignature(String),

    /// The file header size field is not 9.
    #[error("Unsupported FLV header size: {0}")]
    UnsupportedHeader(u32),

    /// A tag type byte outside {8, 9, 18}.
    #[error("Invalid tag type {tag_type} at offset {offset}")]
    InvalidTagType { tag_type: u8, offset: u64 },

    /// The stream ended inside a tag.
    #[error("Truncated tag at offset {offset}: need {need} more bytes, have {have}")]
    Truncated { offset: u64, need: u64, have: u64 },

    /// A tag whose header is structurally impossible.
    #[error("Invalid tag at offset {offset}: {reason}")]
    InvalidTag { offset: u64, reason: String },
}

impl Error {
    /// Create an invalid tag error.
    pub fn invalid_tag(offset: u64, reason: impl Into<String>) -> Self {
        Self::InvalidTag {
            offset,
            reason: reason.into(),
        }
    }

    /// Whether this error describes malformed data rather than a failing device.
    pub fn is_format(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}
