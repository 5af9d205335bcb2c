//! FLV tag descriptors.

use bitflags::bitflags;
use std::fmt;

/// Size of a tag header: type, size, timestamp and stream id.
pub const TAG_HEADER_SIZE: u32 = 11;

/// Largest payload size the 24-bit size field can carry.
pub const MAX_TAG_SIZE: u32 = 0x00ff_ffff;

/// FLV tag type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagType {
    Audio = 8,
    Video = 9,
    Script = 18,
}

impl TagType {
    /// Map a tag type byte, `None` for anything outside {8, 9, 18}.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            8 => Some(Self::Audio),
            9 => Some(Self::Video),
            18 => Some(Self::Script),
            _ => None,
        }
    }

    /// The wire value of this type.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Short display letter.
    pub fn letter(self) -> char {
        match self {
            Self::Audio => 'A',
            Self::Video => 'V',
            Self::Script => 'S',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "Audio",
            Self::Video => "Video",
            Self::Script => "Script",
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Properties observed while scanning a tag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TagFlags: u8 {
        /// Codec configuration tag (AAC sequence header / AVC sequence header).
        const HEADER = 1 << 0;
        /// Video keyframe.
        const KEYFRAME = 1 << 1;
        /// AVC end of sequence.
        const END = 1 << 2;
        /// Same timestamp as the tag scanned right before it.
        const SAME_AS_LAST_TIMESTAMP = 1 << 3;
    }
}

/// Location and header fields of one tag inside a source stream.
///
/// Descriptors never hold payload bytes; [`crate::TagWriter`] copies them from
/// the source on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagDescriptor {
    pub tag_type: TagType,
    pub flags: TagFlags,
    /// Payload size, excluding the 11-byte header.
    pub size: u32,
    /// Timestamp in milliseconds.
    pub timestamp: i32,
    /// Absolute offset of the tag header in its source.
    pub position: u64,
}

impl TagDescriptor {
    /// Create a descriptor with no flags.
    ///
    /// `size` must not exceed [`MAX_TAG_SIZE`]; [`crate::TagWriter`] refuses
    /// to frame a larger tag.
    pub fn new(tag_type: TagType, size: u32, timestamp: i32, position: u64) -> Self {
        Self {
            tag_type,
            flags: TagFlags::empty(),
            size,
            timestamp,
            position,
        }
    }

    /// Header plus payload size.
    pub fn framed_size(&self) -> u64 {
        self.size as u64 + TAG_HEADER_SIZE as u64
    }

    /// Offset of the first payload byte in the source.
    pub fn payload_offset(&self) -> u64 {
        self.position + TAG_HEADER_SIZE as u64
    }

    /// Offset right after the payload.
    pub fn end_offset(&self) -> u64 {
        self.position + self.framed_size()
    }

    /// Encode the 11-byte tag header.
    ///
    /// The timestamp is split: its low 24 bits come first, big-endian, and
    /// its high 8 bits follow as a separate "extended" byte. The stream id is
    /// always zero. Only the low 24 bits of `size` are encoded.
    pub fn header_bytes(&self) -> [u8; TAG_HEADER_SIZE as usize] {
        let size = self.size.to_be_bytes();
        let ts = self.timestamp.to_be_bytes();
        [
            self.tag_type.as_u8(),
            size[1],
            size[2],
            size[3],
            ts[1],
            ts[2],
            ts[3],
            ts[0],
            0,
            0,
            0,
        ]
    }

    /// Copy of this descriptor with another timestamp.
    pub fn with_timestamp(mut self, timestamp: i32) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn is_keyframe(&self) -> bool {
        self.flags.contains(TagFlags::KEYFRAME)
    }

    pub fn is_header(&self) -> bool {
        self.flags.contains(TagFlags::HEADER)
    }
}

impl fmt::Display for TagDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: TagFlags, c: char| if self.flags.contains(set) { c } else { '-' };
        write!(
            f,
            "{}, {}{}{}{}, TS = {}, Size = {}, Pos = {}",
            self.tag_type.letter(),
            flag(TagFlags::KEYFRAME, 'K'),
            flag(TagFlags::HEADER, 'H'),
            flag(TagFlags::END, 'E'),
            flag(TagFlags::SAME_AS_LAST_TIMESTAMP, 'L'),
            self.timestamp,
            self.size,
            self.position
        )
    }
}

/// Decode a big-endian 24-bit integer.
pub(crate) fn u24_be(bytes: [u8; 3]) -> u32 {
    u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])
}

/// Reassemble a split timestamp.
pub(crate) fn split_timestamp(low: [u8; 3], high: u8) -> i32 {
    i32::from_be_bytes([high, low[0], low[1], low[2]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_type_mapping() {
        assert_eq!(TagType::from_u8(8), Some(TagType::Audio));
        assert_eq!(TagType::from_u8(9), Some(TagType::Video));
        assert_eq!(TagType::from_u8(18), Some(TagType::Script));
        assert_eq!(TagType::from_u8(0), None);
        assert_eq!(TagType::from_u8(10), None);
        assert_eq!(TagType::Script.as_u8(), 18);
    }

    #[test]
    fn test_header_bytes_split_timestamp() {
        let tag = TagDescriptor::new(TagType::Video, 0x0102_03, 0x1122_3344, 0);
        assert_eq!(
            tag.header_bytes(),
            [9, 0x01, 0x02, 0x03, 0x22, 0x33, 0x44, 0x11, 0, 0, 0]
        );
    }

    #[test]
    fn test_split_timestamp_inverse() {
        let tag = TagDescriptor::new(TagType::Audio, 5, 0x7f00_0001, 0);
        let header = tag.header_bytes();
        let ts = split_timestamp([header[4], header[5], header[6]], header[7]);
        assert_eq!(ts, 0x7f00_0001);
        assert_eq!(u24_be([header[1], header[2], header[3]]), 5);
    }

    #[test]
    fn test_offsets() {
        let tag = TagDescriptor::new(TagType::Audio, 100, 0, 13);
        assert_eq!(tag.payload_offset(), 24);
        assert_eq!(tag.end_offset(), 124);
        assert_eq!(tag.framed_size(), 111);
    }

    #[test]
    fn test_display() {
        let mut tag = TagDescriptor::new(TagType::Video, 34, 40, 1160);
        tag.flags = TagFlags::KEYFRAME | TagFlags::HEADER;
        assert_eq!(tag.to_string(), "V, KH--, TS = 40, Size = 34, Pos = 1160");
    }
}
