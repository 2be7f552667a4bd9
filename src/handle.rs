//! Handle abstraction with random access over any byte source.
//!
//! A [`DataHandle`] is bound to one [`Location`] and offers offset-based
//! reads and writes. Random-access handles (files, memory) seek natively;
//! [`StreamHandle`](stream::StreamHandle) emulates seeking on top of
//! sequential sources.
//!
//! Handles are meant for one caller at a time. They are `Send` so they can be
//! moved between threads, but sharing one requires external synchronization.

use crate::error::{LocioError, Result};
use crate::location::Location;
use std::io;
use std::sync::Arc;

pub mod buffered;
pub mod bytes;
pub mod compressed;
pub mod file;
pub mod stream;
#[cfg(feature = "http")]
pub mod url;

/// Capability of rewinding a stream to its logical start.
///
/// Exposed through [`DataHandle::as_resettable`] and
/// [`StreamSource::as_resettable`](stream::StreamSource::as_resettable);
/// callers check for it at runtime instead of downcasting.
pub trait ResettableStream {
    /// Re-establish the stream at its start; the owner's offset becomes 0
    ///
    /// On error the stream must still be at its start or released, so that
    /// the next read begins at offset 0.
    fn reset_stream(&mut self) -> Result<()>;
}

/// Core trait for offset-based access to a location's bytes.
pub trait DataHandle: Send {
    /// The location this handle is bound to
    fn location(&self) -> &Arc<dyn Location>;

    /// Current cursor position
    fn offset(&self) -> u64;

    /// Total length in bytes, `None` when it cannot be known up front
    ///
    /// Callers must not rely on a length being available, e.g. for
    /// decompressed streams.
    fn length(&mut self) -> Result<Option<u64>>;

    /// Grow or shrink the resource
    ///
    /// # Errors
    /// * `Unsupported` on read-only handles, whatever the argument
    fn set_length(&mut self, length: u64) -> Result<()>;

    fn is_readable(&self) -> bool;

    fn is_writable(&self) -> bool;

    /// Move the cursor to `pos`
    fn seek(&mut self, pos: u64) -> Result<()>;

    /// Read up to `buf.len()` bytes at the cursor, returning how many were read
    ///
    /// `Ok(0)` for a non-empty `buf` means the end of the resource.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write all of `buf` at the cursor
    fn write(&mut self, buf: &[u8]) -> Result<()>;

    /// Release underlying resources. Closing twice is a no-op; any other
    /// operation on a closed handle fails with `Closed`.
    fn close(&mut self) -> Result<()>;

    /// Advance the cursor by up to `n` bytes, returning how far it moved
    ///
    /// The default stops at the end of the resource when the length is known.
    fn skip(&mut self, n: u64) -> Result<u64> {
        let offset = self.offset();
        let n = match self.length()? {
            Some(length) => n.min(length.saturating_sub(offset)),
            None => n,
        };
        let target = offset
            .checked_add(n)
            .ok_or_else(|| LocioError::boundary(format!("skip of {n} from {offset} overflows")))?;
        self.seek(target)?;
        Ok(n)
    }

    /// The rewind capability, if this handle has one
    fn as_resettable(&mut self) -> Option<&mut dyn ResettableStream> {
        None
    }

    /// Fill `buf` completely
    ///
    /// # Errors
    /// * `Transport` with `UnexpectedEof` if the resource ends first
    fn read_exact(&mut self, mut buf: &mut [u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.read(buf)? {
                0 => {
                    return Err(LocioError::transport(
                        format!(
                            "{} ended at offset {} with {} bytes still requested",
                            self.location().name(),
                            self.offset(),
                            buf.len()
                        ),
                        io::ErrorKind::UnexpectedEof.into(),
                    ))
                }
                n => buf = &mut buf[n..],
            }
        }
        Ok(())
    }

    /// Read from the cursor to the end, appending to `out`
    fn read_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let mut chunk = [0u8; 8 * 1024];
        let mut total = 0;
        loop {
            match self.read(&mut chunk)? {
                0 => return Ok(total),
                n => {
                    out.extend_from_slice(&chunk[..n]);
                    total += n;
                }
            }
        }
    }

    /// Seek to `pos`, then read
    fn read_at(&mut self, pos: u64, buf: &mut [u8]) -> Result<usize> {
        self.seek(pos)?;
        self.read(buf)
    }

    /// Seek to `pos`, then write
    fn write_at(&mut self, pos: u64, buf: &[u8]) -> Result<()> {
        self.seek(pos)?;
        self.write(buf)
    }
}

/// [`io::Read`] adapter over a boxed handle.
///
/// Errors raised by the handle travel through `io::Error` and come back out
/// as the original [`LocioError`] on the other side.
pub struct HandleReader {
    handle: Box<dyn DataHandle>,
}

impl HandleReader {
    pub fn new(handle: Box<dyn DataHandle>) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &dyn DataHandle {
        self.handle.as_ref()
    }

    pub fn into_inner(self) -> Box<dyn DataHandle> {
        self.handle
    }
}

impl io::Read for HandleReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.handle.read(buf).map_err(io::Error::from)
    }
}

/// Shared guard for handles that keep a `closed` flag
pub(crate) fn ensure_open(closed: bool, location: &Arc<dyn Location>) -> Result<()> {
    if closed {
        Err(LocioError::closed(location.name()))
    } else {
        Ok(())
    }
}

/// Shared rejection for writes on read-only handles
pub(crate) fn read_only(location: &Arc<dyn Location>, operation: &str) -> LocioError {
    LocioError::unsupported(format!(
        "cannot {operation}: handle for '{}' is read-only",
        location.name()
    ))
}
