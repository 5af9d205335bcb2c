//! Opening and indexing the streams a command list draws from.

use super::SourceRef;
use crate::{Error, Result};
use fib_amf::ScriptTagBody;
use fib_flv::{scan, scan_one, TagDescriptor, TagType, MAX_TAG_SIZE};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek};
use std::path::PathBuf;

/// A readable, seekable byte stream.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Opens the streams named by [`SourceRef`]s.
pub trait SourceOpener {
    fn open(&mut self, source: &SourceRef) -> io::Result<Box<dyn ReadSeek>>;
}

/// Opens sources from the local filesystem.
#[derive(Debug, Clone)]
pub struct FsOpener {
    primary: PathBuf,
}

impl FsOpener {
    pub fn new(primary: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
        }
    }
}

impl SourceOpener for FsOpener {
    fn open(&mut self, source: &SourceRef) -> io::Result<Box<dyn ReadSeek>> {
        let path = match source {
            SourceRef::Primary => &self.primary,
            SourceRef::Container(path) | SourceRef::RawTag(path) => path,
        };
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

impl<F> SourceOpener for F
where
    F: FnMut(&SourceRef) -> io::Result<Box<dyn ReadSeek>>,
{
    fn open(&mut self, source: &SourceRef) -> io::Result<Box<dyn ReadSeek>> {
        self(source)
    }
}

/// Key of one loaded source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SourceKey {
    Ref(SourceRef),
    /// In-memory tags built from inline and script commands.
    Synthetic,
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKey::Ref(source) => source.fmt(f),
            SourceKey::Synthetic => f.write_str("inline tags"),
        }
    }
}

pub(crate) struct LoadedSource {
    pub stream: Box<dyn ReadSeek>,
    pub tags: Vec<TagDescriptor>,
}

/// Every stream opened for one assembly, with its tag index.
///
/// Streams close when the set is dropped.
pub(crate) struct SourceSet {
    sources: HashMap<SourceKey, LoadedSource>,
    synthetic: Vec<u8>,
    synthetic_tags: Vec<TagDescriptor>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            synthetic: Vec::new(),
            synthetic_tags: Vec::new(),
        }
    }

    /// Open and index `source` on first use; returns its tag count.
    pub fn load<O: SourceOpener + ?Sized>(
        &mut self,
        opener: &mut O,
        source: &SourceRef,
    ) -> Result<usize> {
        let key = SourceKey::Ref(source.clone());
        if let Some(loaded) = self.sources.get(&key) {
            return Ok(loaded.tags.len());
        }

        let mut stream = opener
            .open(source)
            .map_err(|e| Error::source_unavailable(source, e))?;
        let tags = match source {
            SourceRef::Primary | SourceRef::Container(_) => scan(&mut stream)?,
            SourceRef::RawTag(_) => vec![scan_one(&mut stream)?],
        };

        tracing::debug!("Loaded {} with {} tags", source, tags.len());

        let count = tags.len();
        self.sources.insert(key, LoadedSource { stream, tags });
        Ok(count)
    }

    /// Append a framed tag given as bytes; returns its index.
    pub fn push_inline(&mut self, bytes: &[u8]) -> Result<usize> {
        let start = self.synthetic.len();
        self.synthetic.extend_from_slice(bytes);

        let mut cursor = Cursor::new(&self.synthetic[..]);
        cursor.set_position(start as u64);
        let tag = scan_one(&mut cursor);

        match tag {
            Ok(tag) => Ok(self.push_synthetic(tag)),
            Err(e) => {
                self.synthetic.truncate(start);
                Err(e.into())
            }
        }
    }

    /// Encode `body` as a metadata tag; returns its index.
    pub fn push_script(&mut self, body: &ScriptTagBody) -> Result<usize> {
        let payload = body.to_bytes()?;
        if payload.len() > MAX_TAG_SIZE as usize {
            return Err(fib_flv::Error::invalid_tag(
                self.synthetic.len() as u64,
                format!("script body of {} bytes does not fit a tag", payload.len()),
            )
            .into());
        }

        let tag = TagDescriptor::new(
            TagType::Script,
            payload.len() as u32,
            0,
            self.synthetic.len() as u64,
        );
        self.synthetic.extend_from_slice(&tag.header_bytes());
        self.synthetic.extend_from_slice(&payload);
        Ok(self.push_synthetic(tag))
    }

    fn push_synthetic(&mut self, tag: TagDescriptor) -> usize {
        tracing::trace!("Inline tag {}: {}", self.synthetic_tags.len(), tag);
        self.synthetic_tags.push(tag);
        self.synthetic_tags.len() - 1
    }

    /// Move the synthetic buffer into the set as a readable source.
    pub fn seal(&mut self) {
        let bytes = std::mem::take(&mut self.synthetic);
        let tags = std::mem::take(&mut self.synthetic_tags);
        if tags.is_empty() {
            return;
        }
        tracing::debug!("Built {} inline tags ({} bytes)", tags.len(), bytes.len());
        self.sources.insert(
            SourceKey::Synthetic,
            LoadedSource {
                stream: Box::new(Cursor::new(bytes)),
                tags,
            },
        );
    }

    pub fn get_mut(&mut self, key: &SourceKey) -> Option<&mut LoadedSource> {
        self.sources.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_tag(payload: &[u8]) -> Vec<u8> {
        let tag = TagDescriptor::new(TagType::Video, payload.len() as u32, 0, 0);
        let mut bytes = tag.header_bytes().to_vec();
        bytes.extend_from_slice(payload);
        bytes.extend_from_slice(&(payload.len() as u32 + 11).to_be_bytes());
        bytes
    }

    #[test]
    fn test_inline_positions() {
        let mut set = SourceSet::new();
        assert_eq!(set.push_inline(&video_tag(&[0x17, 0, 1, 2])).unwrap(), 0);
        assert_eq!(set.push_inline(&video_tag(&[0x27, 1])).unwrap(), 1);
        assert_eq!(set.synthetic_tags[1].position, 19);
        assert!(set.synthetic_tags[0].is_keyframe());
    }

    #[test]
    fn test_bad_inline_rolls_back() {
        let mut set = SourceSet::new();
        set.push_inline(&video_tag(&[0x17, 0])).unwrap();
        let before = set.synthetic.len();
        assert!(set.push_inline(&[9, 0, 0, 10, 0]).is_err());
        assert_eq!(set.synthetic.len(), before);
    }

    #[test]
    fn test_seal_without_tags() {
        let mut set = SourceSet::new();
        set.seal();
        assert_eq!(set.len(), 0);
        assert!(set.get_mut(&SourceKey::Synthetic).is_none());
    }

    #[test]
    fn test_missing_source_is_reference_error() {
        let mut opener = |_: &SourceRef| -> io::Result<Box<dyn ReadSeek>> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
        };
        let mut set = SourceSet::new();
        let err = set
            .load(&mut opener, &SourceRef::Container("b.flv".into()))
            .unwrap_err();
        assert!(err.is_reference());
    }
}
