//! FLV container scanner.
//!
//! Produces [`TagDescriptor`]s without materializing payloads. A scan of a
//! whole container ends quietly at the first tag it cannot read completely;
//! a single-tag read treats the same condition as an error.

use crate::copy::StreamCopier;
use crate::tag::{split_timestamp, u24_be, TagDescriptor, TagFlags, TagType, TAG_HEADER_SIZE};
use crate::{Error, Result, FLV_HEADER_SIZE, FLV_SIGNATURE, FLV_VERSION};
use std::io::{self, Read, Seek, SeekFrom};

/// AVC frame/codec byte of a keyframe.
const AVC_KEYFRAME: u8 = 0x17;

/// Parsed FLV file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlvHeader {
    pub version: u8,
    /// Audio (0x04) / video (0x01) presence flags as written by the producer.
    pub flags: u8,
}

/// Outcome of reading one tag.
enum Step {
    Tag(TagDescriptor),
    InvalidType(u8),
    Incomplete { need: u64, have: u64 },
}

/// Sequential FLV tag reader.
///
/// Only needs [`Read`]; offsets are tracked by counting consumed bytes, and
/// payloads are skipped through a [`StreamCopier`].
pub struct FlvReader<R> {
    reader: R,
    offset: u64,
    copier: StreamCopier,
    last_timestamp: Option<i32>,
}

impl<R: Read> FlvReader<R> {
    /// Create a reader positioned at offset 0.
    pub fn new(reader: R) -> Self {
        Self::with_offset(reader, 0)
    }

    /// Create a reader whose first byte sits at `offset` in its source.
    pub fn with_offset(reader: R, offset: u64) -> Self {
        Self {
            reader,
            offset,
            copier: StreamCopier::new(),
            last_timestamp: None,
        }
    }

    /// Current absolute offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read and validate the 9-byte file header.
    pub fn read_header(&mut self) -> Result<FlvHeader> {
        let mut header = [0u8; FLV_HEADER_SIZE as usize];
        let n = self.fill(&mut header)?;
        if n < header.len() {
            return Err(Error::InvalidSignature(format!(
                "stream holds {} bytes, header needs {}",
                n, FLV_HEADER_SIZE
            )));
        }

        if header[..3] != FLV_SIGNATURE {
            return Err(Error::InvalidSignature(format!(
                "bad magic {:02x}{:02x}{:02x}",
                header[0], header[1], header[2]
            )));
        }
        if header[3] != FLV_VERSION {
            return Err(Error::InvalidSignature(format!(
                "unsupported version {}",
                header[3]
            )));
        }

        let header_size = u32::from_be_bytes([header[5], header[6], header[7], header[8]]);
        if header_size != FLV_HEADER_SIZE {
            return Err(Error::UnsupportedHeader(header_size));
        }

        Ok(FlvHeader {
            version: header[3],
            flags: header[4],
        })
    }

    /// Read the next back-pointer and tag of a container.
    ///
    /// `Ok(None)` marks the end of the stream: an incomplete read or a tag
    /// type outside {8, 9, 18}.
    pub fn next_tag(&mut self) -> Result<Option<TagDescriptor>> {
        let mut back_pointer = [0u8; 4];
        if self.fill(&mut back_pointer)? < back_pointer.len() {
            return Ok(None);
        }

        let mut tag = match self.read_step()? {
            Step::Tag(tag) => tag,
            Step::InvalidType(tag_type) => {
                tracing::debug!(
                    "Stopping scan at offset {}: tag type {}",
                    self.offset,
                    tag_type
                );
                return Ok(None);
            }
            Step::Incomplete { need, have } => {
                tracing::debug!(
                    "Stopping scan at offset {}: incomplete tag ({} of {} bytes)",
                    self.offset,
                    have,
                    need
                );
                return Ok(None);
            }
        };

        if self.last_timestamp == Some(tag.timestamp) {
            tag.flags |= TagFlags::SAME_AS_LAST_TIMESTAMP;
        }
        self.last_timestamp = Some(tag.timestamp);

        tracing::trace!("{}", tag);

        Ok(Some(tag))
    }

    /// Read tags until the end of the stream, or until `limit` tags.
    pub fn read_tags(&mut self, limit: Option<usize>) -> Result<Vec<TagDescriptor>> {
        let mut tags = Vec::with_capacity(limit.unwrap_or(1024).min(1024));
        while limit.map_or(true, |max| tags.len() < max) {
            match self.next_tag()? {
                Some(tag) => tags.push(tag),
                None => break,
            }
        }

        tracing::debug!("Scanned {} tags, stopped at offset {}", tags.len(), self.offset);

        Ok(tags)
    }

    /// Read exactly one tag with no file header and no leading back-pointer.
    pub fn read_tag(&mut self) -> Result<TagDescriptor> {
        let start = self.offset;
        match self.read_step()? {
            Step::Tag(tag) => Ok(tag),
            Step::InvalidType(tag_type) => Err(Error::InvalidTagType {
                tag_type,
                offset: start,
            }),
            Step::Incomplete { need, have } => Err(Error::Truncated {
                offset: start,
                need,
                have,
            }),
        }
    }

    fn read_step(&mut self) -> Result<Step> {
        let position = self.offset;
        let mut header = [0u8; TAG_HEADER_SIZE as usize];

        if self.fill(&mut header[..1])? == 0 {
            return Ok(Step::Incomplete {
                need: TAG_HEADER_SIZE as u64,
                have: 0,
            });
        }
        let tag_type = match TagType::from_u8(header[0]) {
            Some(t) => t,
            None => return Ok(Step::InvalidType(header[0])),
        };

        let n = self.fill(&mut header[1..])?;
        if n < header.len() - 1 {
            return Ok(Step::Incomplete {
                need: TAG_HEADER_SIZE as u64,
                have: 1 + n as u64,
            });
        }

        let size = u24_be([header[1], header[2], header[3]]);
        let timestamp = split_timestamp([header[4], header[5], header[6]], header[7]);
        let mut tag = TagDescriptor::new(tag_type, size, timestamp, position);

        let to_skip = match tag_type {
            TagType::Audio | TagType::Video => {
                if size < 2 {
                    return Err(Error::invalid_tag(
                        position,
                        format!("{} tag with {} byte payload", tag_type, size),
                    ));
                }
                let mut media = [0u8; 2];
                let n = self.fill(&mut media)?;
                if n < media.len() {
                    return Ok(Step::Incomplete {
                        need: size as u64,
                        have: n as u64,
                    });
                }
                tag.flags = media_flags(tag_type, media);
                size as u64 - 2
            }
            TagType::Script => size as u64,
        };

        let skipped = self.copier.skip(&mut self.reader, to_skip)?;
        self.offset += skipped;
        if skipped < to_skip {
            return Ok(Step::Incomplete {
                need: size as u64,
                have: size as u64 - (to_skip - skipped),
            });
        }

        Ok(Step::Tag(tag))
    }

    /// Read until `buf` is full or the stream ends; returns bytes read.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.offset += filled as u64;
        Ok(filled)
    }
}

/// Flags derived from the first two payload bytes of an audio/video tag.
fn media_flags(tag_type: TagType, media: [u8; 2]) -> TagFlags {
    let mut flags = TagFlags::empty();
    match tag_type {
        TagType::Audio => {
            // media[0] is the sound format, media[1] the AAC packet type
            if media[1] == 0 {
                flags |= TagFlags::HEADER;
            }
        }
        TagType::Video => {
            if media[0] == AVC_KEYFRAME {
                flags |= TagFlags::KEYFRAME;
            }
            match media[1] {
                0 => flags |= TagFlags::HEADER,
                2 => flags |= TagFlags::END,
                _ => {}
            }
        }
        TagType::Script => {}
    }
    flags
}

/// Scan a whole FLV container from its first byte.
pub fn scan<R: Read + Seek + ?Sized>(stream: &mut R) -> Result<Vec<TagDescriptor>> {
    scan_limit(stream, None)
}

/// Scan an FLV container, stopping after `limit` tags when given.
pub fn scan_limit<R: Read + Seek + ?Sized>(
    stream: &mut R,
    limit: Option<usize>,
) -> Result<Vec<TagDescriptor>> {
    stream.seek(SeekFrom::Start(0))?;
    let mut reader = FlvReader::new(stream);
    let header = reader.read_header()?;

    tracing::debug!(
        "FLV header: version {}, flags {:#04x}",
        header.version,
        header.flags
    );

    reader.read_tags(limit)
}

/// Read one bare tag starting at the stream's current position.
pub fn scan_one<R: Read + Seek + ?Sized>(stream: &mut R) -> Result<TagDescriptor> {
    let offset = stream.stream_position()?;
    FlvReader::with_offset(stream, offset).read_tag()
}
