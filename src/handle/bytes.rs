//! In-memory handle backed by a [`GrowableBuffer`].

use crate::buffer::GrowableBuffer;
use crate::error::{LocioError, Result};
use crate::handle::{ensure_open, DataHandle, ResettableStream};
use crate::location::{BytesLocation, Location};
use std::sync::Arc;

/// Readable and writable handle over a private in-memory copy of a
/// [`BytesLocation`].
///
/// The cursor may move past the end. Writing there first fills the gap with
/// zeros, so the underlying buffer never contains a hole.
#[derive(Debug)]
pub struct BufferHandle {
    location: Arc<dyn Location>,
    buffer: GrowableBuffer,
    offset: u64,
    closed: bool,
}

impl BufferHandle {
    /// Create a handle seeded with the location's bytes
    ///
    /// # Errors
    /// * `Boundary` if the data does not fit in `max_buffer_size`
    pub fn new(location: BytesLocation, max_buffer_size: usize) -> Result<Self> {
        let mut buffer = GrowableBuffer::with_limit(max_buffer_size);
        buffer.append_bytes(location.data())?;
        Ok(Self {
            location: Arc::new(location),
            buffer,
            offset: 0,
            closed: false,
        })
    }

    /// Current content
    pub fn bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    fn len(&self) -> u64 {
        self.buffer.len() as u64
    }

    /// Append zeros until the buffer is `target` bytes long
    fn zero_fill_to(&mut self, target: u64) -> Result<()> {
        const ZEROS: [u8; 4096] = [0; 4096];
        while self.len() < target {
            let missing = (target - self.len()).min(ZEROS.len() as u64) as usize;
            self.buffer.append_bytes(&ZEROS[..missing])?;
        }
        Ok(())
    }
}

impl DataHandle for BufferHandle {
    fn location(&self) -> &Arc<dyn Location> {
        &self.location
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn length(&mut self) -> Result<Option<u64>> {
        ensure_open(self.closed, &self.location)?;
        Ok(Some(self.len()))
    }

    fn set_length(&mut self, length: u64) -> Result<()> {
        ensure_open(self.closed, &self.location)?;
        let limit = self.buffer.max_buffer_size() as u64;
        if length > limit {
            return Err(LocioError::boundary(format!(
                "length {length} exceeds the maximal buffer size {limit}"
            )));
        }
        if length >= self.len() {
            return self.zero_fill_to(length);
        }
        // The buffer only ever grows, so shrinking rebuilds it from the kept prefix
        let kept = self.buffer.as_slice()[..length as usize].to_vec();
        self.buffer.clear();
        self.buffer.append_bytes(&kept)
    }

    fn is_readable(&self) -> bool {
        true
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        ensure_open(self.closed, &self.location)?;
        let limit = self.buffer.max_buffer_size() as u64;
        if pos > limit {
            return Err(LocioError::boundary(format!(
                "seek to {pos} is beyond the maximal buffer size {limit}"
            )));
        }
        self.offset = pos;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        ensure_open(self.closed, &self.location)?;
        let available = self.len().saturating_sub(self.offset);
        let n = (buf.len() as u64).min(available) as usize;
        if n == 0 {
            return Ok(0);
        }
        self.buffer.get_bytes(self.offset, &mut buf[..n])?;
        self.offset += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        ensure_open(self.closed, &self.location)?;
        let limit = self.buffer.max_buffer_size() as u64;
        if self
            .offset
            .checked_add(buf.len() as u64)
            .map_or(true, |end| end > limit)
        {
            return Err(LocioError::boundary(format!(
                "write of {} bytes at {} exceeds the maximal buffer size {limit}",
                buf.len(),
                self.offset
            )));
        }
        self.zero_fill_to(self.offset)?;
        self.buffer.set_bytes(self.offset, buf)?;
        self.offset += buf.len() as u64;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.buffer.clear();
        }
        Ok(())
    }

    fn as_resettable(&mut self) -> Option<&mut dyn ResettableStream> {
        Some(self)
    }
}

impl ResettableStream for BufferHandle {
    fn reset_stream(&mut self) -> Result<()> {
        self.seek(0)
    }
}
