//! Shared fixtures for integration tests.
//!
//! [`FlvBuilder`] writes small FLV files tag by tag and [`MemoryOpener`]
//! serves them to the assembler without touching the filesystem.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{self, Cursor};

use fib::rebase::{ReadSeek, SourceOpener, SourceRef};
use fib_amf::{ScriptObject, ScriptTagBody, ScriptValue};
use fib_flv::{TagDescriptor, TagType};

pub const AUDIO: u8 = 8;
pub const VIDEO: u8 = 9;
pub const SCRIPT: u8 = 18;

/// Builds an FLV file in memory.
pub struct FlvBuilder {
    bytes: Vec<u8>,
}

impl FlvBuilder {
    pub fn new() -> Self {
        Self {
            bytes: vec![b'F', b'L', b'V', 1, 5, 0, 0, 0, 9, 0, 0, 0, 0],
        }
    }

    /// Append one tag with its back-pointer.
    pub fn tag(mut self, tag_type: u8, timestamp: i32, payload: &[u8]) -> Self {
        self.bytes
            .extend_from_slice(&framed_tag(tag_type, timestamp, payload));
        self
    }

    pub fn script(self, body: &ScriptTagBody, timestamp: i32) -> Self {
        let payload = body.to_bytes().unwrap();
        self.tag(SCRIPT, timestamp, &payload)
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Header, payload and back-pointer of one tag.
pub fn framed_tag(tag_type: u8, timestamp: i32, payload: &[u8]) -> Vec<u8> {
    let tag_type = TagType::from_u8(tag_type).unwrap();
    let tag = TagDescriptor::new(tag_type, payload.len() as u32, timestamp, 0);
    let mut bytes = tag.header_bytes().to_vec();
    bytes.extend_from_slice(payload);
    bytes.extend_from_slice(&(payload.len() as u32 + 11).to_be_bytes());
    bytes
}

/// `onMetaData` with the given duration and a couple of stream properties.
pub fn meta_body(duration: Option<f64>) -> ScriptTagBody {
    let mut props = ScriptObject::new();
    if let Some(duration) = duration {
        props.insert("duration", ScriptValue::number(duration));
    }
    props.insert("width", ScriptValue::number(640.0));
    props.insert("height", ScriptValue::number(360.0));
    props.insert("encoder", ScriptValue::string("fib-test"));
    ScriptTagBody::new("onMetaData", ScriptValue::ecma_array(props)).unwrap()
}

/// Timestamp of the last tag in [`sample_flv`].
pub const SAMPLE_LAST_TIMESTAMP: i32 = 40;

/// Duration `build` writes for an unedited plan of [`sample_flv`].
pub fn sample_duration() -> f64 {
    SAMPLE_LAST_TIMESTAMP as f64 / 1000.0 + 1.0
}

/// Six tags: metadata, AVC and AAC sequence headers, then media.
pub fn sample_flv() -> Vec<u8> {
    FlvBuilder::new()
        .script(&meta_body(Some(sample_duration())), 0)
        .tag(VIDEO, 0, &[0x17, 0, 0, 0, 0, 1, 0x64, 0, 0x1f])
        .tag(AUDIO, 0, &[0xaf, 0, 0x12, 0x10])
        .tag(VIDEO, 0, &[0x17, 1, 0, 0, 0, 0, 0, 0, 5, 0x65, 0x88, 0x84, 0, 0x21])
        .tag(AUDIO, 23, &[0xaf, 1, 0x21, 0x10, 0x04])
        .tag(VIDEO, 40, &[0x27, 1, 0, 0, 0x28, 0, 0, 0, 3, 0x41, 0x9a, 0x02])
        .build()
}

/// A second container with its own media tags.
pub fn other_flv() -> Vec<u8> {
    FlvBuilder::new()
        .tag(VIDEO, 0, &[0x17, 1, 0xaa, 0xbb])
        .tag(AUDIO, 10, &[0xaf, 1, 0xcc])
        .build()
}

/// Serves sources from memory.
#[derive(Default)]
pub struct MemoryOpener {
    sources: HashMap<SourceRef, Vec<u8>>,
}

impl MemoryOpener {
    pub fn new(primary: Vec<u8>) -> Self {
        Self::default().with(SourceRef::Primary, primary)
    }

    pub fn with(mut self, source: SourceRef, bytes: Vec<u8>) -> Self {
        self.sources.insert(source, bytes);
        self
    }
}

impl SourceOpener for MemoryOpener {
    fn open(&mut self, source: &SourceRef) -> io::Result<Box<dyn ReadSeek>> {
        match self.sources.get(source) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", source),
            )),
        }
    }
}

/// Scan an output stream.
pub fn scan_bytes(bytes: &[u8]) -> Vec<TagDescriptor> {
    fib_flv::scan(&mut Cursor::new(bytes)).unwrap()
}

/// Payload of one scanned tag.
pub fn body_of(bytes: &[u8], tag: &TagDescriptor) -> Vec<u8> {
    fib_flv::read_body(&mut Cursor::new(bytes), tag).unwrap()
}
