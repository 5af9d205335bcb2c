//! Bounded exact-length copy and skip.
//!
//! Tag payloads can be up to 16 MiB; they are moved through one fixed 4 KiB
//! buffer instead of being materialized.

use std::io::{self, Read, Write};

/// Size of the scratch buffer used for copying and skipping.
pub const COPY_BUFFER_SIZE: usize = 4 * 1024;

/// Moves exact byte counts between streams through a reusable buffer.
pub struct StreamCopier {
    buffer: Box<[u8; COPY_BUFFER_SIZE]>,
}

impl StreamCopier {
    pub fn new() -> Self {
        Self {
            buffer: Box::new([0u8; COPY_BUFFER_SIZE]),
        }
    }

    /// Copy exactly `len` bytes from `from` to `to`.
    ///
    /// A source that runs dry before `len` bytes fails with
    /// [`io::ErrorKind::UnexpectedEof`]; bytes already written stay written.
    pub fn copy_exact<R, W>(&mut self, from: &mut R, to: &mut W, len: u64) -> io::Result<()>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let mut remaining = len;
        while remaining > 0 {
            let chunk = remaining.min(COPY_BUFFER_SIZE as u64) as usize;
            let buf = &mut self.buffer[..chunk];
            from.read_exact(buf).map_err(|e| {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!(
                            "source ended {} bytes short of a {} byte copy",
                            remaining, len
                        ),
                    )
                } else {
                    e
                }
            })?;
            to.write_all(buf)?;
            remaining -= chunk as u64;
        }
        Ok(())
    }

    /// Read and discard up to `len` bytes; returns how many were skipped.
    ///
    /// Works on streams that cannot seek. Stops early at end of stream.
    pub fn skip<R: Read + ?Sized>(&mut self, from: &mut R, len: u64) -> io::Result<u64> {
        let mut skipped = 0u64;
        while skipped < len {
            let chunk = (len - skipped).min(COPY_BUFFER_SIZE as u64) as usize;
            let n = match from.read(&mut self.buffer[..chunk]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            skipped += n as u64;
        }
        Ok(skipped)
    }
}

impl Default for StreamCopier {
    fn default() -> Self {
        Self::new()
    }
}
