//! Self-expanding byte buffer without holes.
//!
//! A [`GrowableBuffer`] is written front to back: a write may start anywhere
//! up to one byte past the highest written position, never further. Reads are
//! only legal inside the written range. Every violation is reported as
//! [`LocioError::Boundary`] and leaves the buffer untouched.

use crate::config::DEFAULT_MAX_BUFFER_SIZE;
use crate::error::{LocioError, Result};

/// Contiguous, bounds-checked byte store that grows on write.
///
/// The buffer tracks the highest written position (`max_pos`); `None` means
/// nothing has been written yet. Capacity is bounded by `max_buffer_size`,
/// which is fixed at construction.
#[derive(Debug, Clone)]
pub struct GrowableBuffer {
    data: Vec<u8>,
    max_pos: Option<u64>,
    max_buffer_size: usize,
}

impl Default for GrowableBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl GrowableBuffer {
    /// Create an empty buffer bounded by the platform's addressable limit
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_BUFFER_SIZE)
    }

    /// Create an empty buffer that never grows beyond `max_buffer_size` bytes
    pub fn with_limit(max_buffer_size: usize) -> Self {
        Self {
            data: Vec::new(),
            max_pos: None,
            max_buffer_size,
        }
    }

    /// Upper bound on the number of bytes this buffer can hold
    pub fn max_buffer_size(&self) -> usize {
        self.max_buffer_size
    }

    /// Highest position holding a valid byte, `None` while empty
    pub fn max_pos(&self) -> Option<u64> {
        self.max_pos
    }

    /// Number of valid bytes (`max_pos + 1`)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.max_pos.is_none()
    }

    /// The valid bytes, `[0, max_pos]`
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Byte at `pos`
    pub fn get_byte(&self, pos: u64) -> Result<u8> {
        let start = self.check_read(pos, 1)?;
        Ok(self.data[start])
    }

    /// Copy `out.len()` bytes starting at `pos` into `out`
    ///
    /// # Returns
    /// * The number of bytes copied, always `out.len()` on success
    ///
    /// # Errors
    /// * `Boundary` if any part of `[pos, pos + out.len())` has not been written
    pub fn get_bytes(&self, pos: u64, out: &mut [u8]) -> Result<usize> {
        let start = self.check_read(pos, out.len())?;
        out.copy_from_slice(&self.data[start..start + out.len()]);
        Ok(out.len())
    }

    /// Write a single byte, growing the buffer if `pos == max_pos + 1`
    pub fn set_byte(&mut self, pos: u64, value: u8) -> Result<()> {
        self.set_bytes(pos, &[value])
    }

    /// Write `data` starting at `pos`
    ///
    /// # Errors
    /// * `Boundary` if `pos` would leave a hole or the range exceeds the limit
    pub fn set_bytes(&mut self, pos: u64, data: &[u8]) -> Result<()> {
        let (start, end) = self.check_write(pos, data.len())?;
        if data.is_empty() {
            return Ok(());
        }

        if end > self.data.len() {
            let additional = end - self.data.len();
            self.data.try_reserve(additional).map_err(|e| {
                LocioError::boundary(format!("cannot grow buffer to {end} bytes: {e}"))
            })?;
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(data);

        let last = (end - 1) as u64;
        self.max_pos = Some(self.max_pos.map_or(last, |current| current.max(last)));
        Ok(())
    }

    /// Write `data` directly after the last valid byte
    pub fn append_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.set_bytes(self.next_pos(), data)
    }

    /// Drop all content; reads fail until the next write
    pub fn clear(&mut self) {
        self.data.clear();
        self.max_pos = None;
    }

    /// First position a write may target without leaving a hole
    fn next_pos(&self) -> u64 {
        self.max_pos.map_or(0, |pos| pos + 1)
    }

    /// Validate `[pos, pos + len)` against the size limit, returning it as indices
    fn check_range(&self, pos: u64, len: usize) -> Result<(usize, usize)> {
        let limit = self.max_buffer_size as u64;
        if pos >= limit {
            return Err(LocioError::boundary(format!(
                "position {pos} is beyond the maximal buffer size {limit}"
            )));
        }
        let end = pos
            .checked_add(len as u64)
            .filter(|&end| end <= limit)
            .ok_or_else(|| {
                LocioError::boundary(format!(
                    "range of {len} bytes at {pos} exceeds the maximal buffer size {limit}"
                ))
            })?;
        // Both values are <= max_buffer_size, which fits in usize
        Ok((pos as usize, end as usize))
    }

    fn check_write(&self, pos: u64, len: usize) -> Result<(usize, usize)> {
        let range = self.check_range(pos, len)?;
        let next = self.next_pos();
        if pos > next {
            return Err(LocioError::boundary(format!(
                "write at {pos} would leave a hole, largest legal position is {next}"
            )));
        }
        Ok(range)
    }

    fn check_read(&self, pos: u64, len: usize) -> Result<usize> {
        let (start, end) = self.check_range(pos, len)?;
        match self.max_pos {
            None => Err(LocioError::boundary(format!(
                "read at {pos} from an empty buffer"
            ))),
            Some(max) if pos > max => Err(LocioError::boundary(format!(
                "position {pos} is past the largest buffered position {max}"
            ))),
            Some(max) if end as u64 > max + 1 => Err(LocioError::boundary(format!(
                "range {pos}..{end} is past the largest buffered position {max}"
            ))),
            Some(_) => Ok(start),
        }
    }
}
