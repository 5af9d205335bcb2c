//! Fib-AMF: the AMF0 script data model carried by FLV metadata tags.
//!
//! # Modules
//!
//! - `value` - [`ScriptValue`] and the ordered [`ScriptObject`] map
//! - `codec` - Binary AMF0 encoding and decoding
//! - `body` - [`ScriptTagBody`], the name + properties pair of a metadata tag
//! - `text` - Lossless JSON form used for hand editing
//!
//! # Examples
//!
//! ```
//! use fib_amf::{ScriptObject, ScriptTagBody, ScriptValue};
//!
//! let mut props = ScriptObject::new();
//! props.insert("duration", ScriptValue::number(12.5));
//! let body = ScriptTagBody::new("onMetaData", ScriptValue::EcmaArray(props)).unwrap();
//!
//! let bytes = body.to_bytes().unwrap();
//! let decoded = ScriptTagBody::decode(&bytes).unwrap();
//! assert_eq!(decoded, body);
//! ```

pub mod body;
pub mod codec;
pub mod error;
pub mod text;
pub mod value;

pub use body::ScriptTagBody;
pub use error::{Error, Result};
pub use value::{Marker, ScriptObject, ScriptValue};

/// Longest UTF-8 payload a short `String` can carry.
pub const MAX_SHORT_STRING_LEN: usize = u16::MAX as usize;
