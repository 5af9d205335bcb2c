//! Fib-FLV: FLV tag scanning and byte-exact tag framing.
//!
//! This crate knows the FLV container at the granularity of tags. It never
//! interprets audio/video payload; it only locates tags and copies their bytes.
//!
//! # Modules
//!
//! - `tag` - Tag descriptors, tag types and flags
//! - `reader` - Container and single-tag scanning
//! - `writer` - Tag header/body/trailer framing
//! - `copy` - Bounded exact-length copy and skip helpers
//!
//! # Wire layout
//!
//! ```text
//! "FLV" 0x01 <flags> 0x00000009          file header (9 bytes)
//! {prev_size:u32}                        back-pointer, 0 before the first tag
//! {type:u8}{size:u24}{ts_low:u24}{ts_high:u8}{stream_id:u24}
//! {payload: size bytes}
//! {prev_size:u32 = size + 11}
//! ...
//! ```

pub mod copy;
pub mod error;
pub mod reader;
pub mod tag;
pub mod writer;

pub use copy::StreamCopier;
pub use error::{Error, Result};
pub use reader::{scan, scan_limit, scan_one, FlvHeader, FlvReader};
pub use tag::{TagDescriptor, TagFlags, TagType, MAX_TAG_SIZE, TAG_HEADER_SIZE};
pub use writer::{read_body, TagWriter};

/// The three signature bytes every FLV file starts with.
pub const FLV_SIGNATURE: [u8; 3] = *b"FLV";

/// The only FLV version this crate reads and writes.
pub const FLV_VERSION: u8 = 1;

/// Size of the FLV file header, and the only accepted value of its size field.
pub const FLV_HEADER_SIZE: u32 = 9;

/// File header flag: the file contains video tags.
pub const FLAG_VIDEO: u8 = 0x01;

/// File header flag: the file contains audio tags.
pub const FLAG_AUDIO: u8 = 0x04;
