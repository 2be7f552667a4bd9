//! Read cache that makes sequential handles cheap to seek.
//!
//! Every byte pulled from the inner handle is kept in a [`GrowableBuffer`],
//! so seeking back into already-read data never touches the source again.
//! Useful in front of decoding handles, where a backward seek otherwise means
//! decoding from the start.

use crate::buffer::GrowableBuffer;
use crate::error::{LocioError, Result};
use crate::handle::{ensure_open, read_only, DataHandle, ResettableStream};
use crate::location::Location;
use std::sync::Arc;

/// Read-only handle caching everything read from an inner handle.
///
/// The inner handle is only ever read front to back; its offset always equals
/// the number of cached bytes.
pub struct BufferedReadHandle {
    inner: Box<dyn DataHandle>,
    buffer: GrowableBuffer,
    chunk: Vec<u8>,
    offset: u64,
    exhausted: bool,
    closed: bool,
}

impl BufferedReadHandle {
    /// Wrap `inner`, caching at most `max_buffer_size` bytes and pulling
    /// `chunk_size` bytes per fill
    ///
    /// The inner handle is rewound to 0 first if it has moved.
    pub fn new(
        mut inner: Box<dyn DataHandle>,
        max_buffer_size: usize,
        chunk_size: usize,
    ) -> Result<Self> {
        if inner.offset() != 0 {
            inner.seek(0)?;
        }
        Ok(Self {
            inner,
            buffer: GrowableBuffer::with_limit(max_buffer_size),
            chunk: vec![0; chunk_size.max(1)],
            offset: 0,
            exhausted: false,
            closed: false,
        })
    }

    /// Number of bytes cached so far
    pub fn buffered_len(&self) -> u64 {
        self.buffer.len() as u64
    }

    /// Read from the inner handle until `pos` is cached or the source ends
    ///
    /// Reads are capped at the room left in the cache, so every byte taken
    /// from the inner handle is cached.
    fn fill_to(&mut self, pos: u64) -> Result<()> {
        while !self.exhausted && self.buffered_len() <= pos {
            let room = self.buffer.max_buffer_size() - self.buffer.len();
            if room == 0 {
                return Err(LocioError::boundary(format!(
                    "position {pos} of '{}' is beyond the cache limit {}",
                    self.inner.location().name(),
                    self.buffer.max_buffer_size()
                )));
            }
            let want = room.min(self.chunk.len());
            let n = self.inner.read(&mut self.chunk[..want])?;
            if n == 0 {
                self.exhausted = true;
            } else {
                self.buffer.append_bytes(&self.chunk[..n])?;
            }
        }
        Ok(())
    }
}

impl DataHandle for BufferedReadHandle {
    fn location(&self) -> &Arc<dyn Location> {
        self.inner.location()
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn length(&mut self) -> Result<Option<u64>> {
        ensure_open(self.closed, self.inner.location())?;
        if self.exhausted {
            Ok(Some(self.buffered_len()))
        } else {
            self.inner.length()
        }
    }

    fn set_length(&mut self, _length: u64) -> Result<()> {
        Err(read_only(self.inner.location(), "set length"))
    }

    fn is_readable(&self) -> bool {
        self.inner.is_readable()
    }

    fn is_writable(&self) -> bool {
        false
    }

    /// Moves the cursor only; data is fetched on the next read
    fn seek(&mut self, pos: u64) -> Result<()> {
        ensure_open(self.closed, self.inner.location())?;
        self.offset = pos;
        Ok(())
    }

    fn skip(&mut self, n: u64) -> Result<u64> {
        ensure_open(self.closed, self.inner.location())?;
        if n == 0 {
            return Ok(0);
        }
        let target = self.offset.saturating_add(n);
        self.fill_to(target - 1)?;
        let moved = target.min(self.buffered_len().max(self.offset)) - self.offset;
        self.offset += moved;
        Ok(moved)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        ensure_open(self.closed, self.inner.location())?;
        if buf.is_empty() {
            return Ok(0);
        }
        self.fill_to(self.offset)?;

        let available = self.buffered_len().saturating_sub(self.offset);
        let n = (buf.len() as u64).min(available) as usize;
        if n == 0 {
            return Ok(0);
        }
        self.buffer.get_bytes(self.offset, &mut buf[..n])?;
        self.offset += n as u64;
        Ok(n)
    }

    fn write(&mut self, _buf: &[u8]) -> Result<()> {
        Err(read_only(self.inner.location(), "write"))
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.buffer.clear();
        self.inner.close()
    }

    fn as_resettable(&mut self) -> Option<&mut dyn ResettableStream> {
        Some(self)
    }
}

impl ResettableStream for BufferedReadHandle {
    fn reset_stream(&mut self) -> Result<()> {
        self.seek(0)
    }
}
