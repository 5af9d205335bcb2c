//! FLV tag framing.
//!
//! Writes file headers and tags. A tag is written as its 11-byte header, the
//! payload copied verbatim from the source at `position + 11`, and the
//! trailing back-pointer `size + 11`.

use crate::copy::StreamCopier;
use crate::tag::{TagDescriptor, MAX_TAG_SIZE, TAG_HEADER_SIZE};
use crate::{Error, Result, FLV_HEADER_SIZE, FLV_SIGNATURE, FLV_VERSION};
use std::io::{self, Read, Seek, SeekFrom, Write};

/// FLV writer over any byte sink.
pub struct TagWriter<W> {
    inner: W,
    copier: StreamCopier,
    written: u64,
}

impl<W: Write> TagWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            copier: StreamCopier::new(),
            written: 0,
        }
    }

    /// Bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Write the 9-byte file header and the zero back-pointer that precedes
    /// the first tag.
    pub fn write_file_header(&mut self, flags: u8) -> Result<()> {
        let size = FLV_HEADER_SIZE.to_be_bytes();
        let header = [
            FLV_SIGNATURE[0],
            FLV_SIGNATURE[1],
            FLV_SIGNATURE[2],
            FLV_VERSION,
            flags,
            size[0],
            size[1],
            size[2],
            size[3],
            0,
            0,
            0,
            0,
        ];
        self.write_all(&header)
    }

    /// Write the 11-byte tag header.
    pub fn write_header(&mut self, tag: &TagDescriptor) -> Result<()> {
        if tag.size > MAX_TAG_SIZE {
            return Err(Error::invalid_tag(
                tag.position,
                format!("payload of {} bytes does not fit a tag header", tag.size),
            ));
        }
        self.write_all(&tag.header_bytes())
    }

    /// Copy the tag payload from `source` without interpreting it.
    pub fn write_body<R>(&mut self, source: &mut R, tag: &TagDescriptor) -> Result<()>
    where
        R: Read + Seek + ?Sized,
    {
        source.seek(SeekFrom::Start(tag.payload_offset()))?;
        self.copier
            .copy_exact(source, &mut self.inner, tag.size as u64)
            .map_err(|e| truncated_payload(e, tag))?;
        self.written += tag.size as u64;
        Ok(())
    }

    /// Write the back-pointer that follows a tag.
    pub fn write_trailer(&mut self, tag: &TagDescriptor) -> Result<()> {
        let back_pointer = tag.size.wrapping_add(TAG_HEADER_SIZE);
        self.write_all(&back_pointer.to_be_bytes())
    }

    /// Write a complete tag: header, payload and back-pointer.
    pub fn write_tag<R>(&mut self, source: &mut R, tag: &TagDescriptor) -> Result<()>
    where
        R: Read + Seek + ?Sized,
    {
        self.write_header(tag)?;
        self.write_body(source, tag)?;
        self.write_trailer(tag)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }
}

/// Read one tag's payload into memory.
pub fn read_body<R>(source: &mut R, tag: &TagDescriptor) -> Result<Vec<u8>>
where
    R: Read + Seek + ?Sized,
{
    let mut body = Vec::with_capacity(tag.size as usize);
    TagWriter::new(&mut body).write_body(source, tag)?;
    Ok(body)
}

fn truncated_payload(err: io::Error, tag: &TagDescriptor) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::Truncated {
            offset: tag.position,
            need: tag.size as u64,
            have: 0,
        }
    } else {
        Error::Io(err)
    }
}
