//! Random access emulated over sequential sources.
//!
//! A [`StreamHandle`] tracks its own offset on top of a [`StreamSource`].
//! Forward seeks read and discard; backward seeks rewind the source through
//! its [`ResettableStream`] capability and skip forward again from zero.
//! Sources that cannot rewind reject backward seeks with
//! [`LocioError::BackwardSeek`].

use crate::error::{LocioError, Result};
use crate::handle::{ensure_open, read_only, DataHandle, ResettableStream};
use crate::location::Location;
use log::debug;
use std::io::{self, Read, Write};
use std::sync::Arc;

/// Sequential byte source behind a [`StreamHandle`].
///
/// Streams are acquired lazily: nothing is opened until the first call to
/// [`input`](StreamSource::input) or [`output`](StreamSource::output).
pub trait StreamSource: Send {
    /// The input stream, positioned after everything consumed so far
    fn input(&mut self) -> Result<&mut dyn Read>;

    /// The output stream; read-only sources keep the default
    fn output(&mut self) -> Result<&mut dyn Write> {
        Err(LocioError::unsupported("source has no output stream"))
    }

    /// Total length, `None` when unknown
    fn length(&mut self) -> Result<Option<u64>>;

    fn set_length(&mut self, _length: u64) -> Result<()> {
        Err(LocioError::unsupported("source length cannot be changed"))
    }

    fn is_readable(&self) -> bool {
        true
    }

    fn is_writable(&self) -> bool {
        false
    }

    /// Discard up to `n` bytes of input, returning how many were discarded
    ///
    /// A short count means the input ended.
    fn skip(&mut self, n: u64) -> Result<u64> {
        let mut limited = self.input()?.take(n);
        Ok(io::copy(&mut limited, &mut io::sink())?)
    }

    /// The rewind capability, if this source has one
    fn as_resettable(&mut self) -> Option<&mut dyn ResettableStream> {
        None
    }

    /// Release the streams; later calls may reacquire them
    fn close(&mut self) -> Result<()>;
}

/// Handle that presents a [`StreamSource`] as a seekable resource.
///
/// The offset always equals the number of logical bytes consumed since the
/// start, however many bytes had to be skipped to get there.
#[derive(Debug)]
pub struct StreamHandle<S> {
    location: Arc<dyn Location>,
    source: S,
    offset: u64,
    closed: bool,
}

impl<S: StreamSource> StreamHandle<S> {
    pub fn new(location: Arc<dyn Location>, source: S) -> Self {
        Self {
            location,
            source,
            offset: 0,
            closed: false,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Skip forward by `n` bytes, looping over short skips until the
    /// source runs dry
    fn jump(&mut self, n: u64) -> Result<u64> {
        let mut remaining = n;
        while remaining > 0 {
            let skipped = self.source.skip(remaining)?;
            if skipped == 0 {
                break;
            }
            remaining -= skipped;
            self.offset += skipped;
        }
        Ok(n - remaining)
    }

    /// A failed reset still leaves the source at its start, so the offset
    /// drops to 0 either way.
    fn rewind(&mut self) -> Result<()> {
        let result = self
            .source
            .as_resettable()
            .ok_or_else(|| {
                LocioError::unsupported(format!(
                    "stream for '{}' cannot be reset",
                    self.location.name()
                ))
            })?
            .reset_stream();
        self.offset = 0;
        result
    }
}

impl<S: StreamSource> DataHandle for StreamHandle<S> {
    fn location(&self) -> &Arc<dyn Location> {
        &self.location
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn length(&mut self) -> Result<Option<u64>> {
        ensure_open(self.closed, &self.location)?;
        self.source.length()
    }

    fn set_length(&mut self, length: u64) -> Result<()> {
        ensure_open(self.closed, &self.location)?;
        if !self.source.is_writable() {
            return Err(read_only(&self.location, "set length"));
        }
        self.source.set_length(length)
    }

    fn is_readable(&self) -> bool {
        self.source.is_readable()
    }

    fn is_writable(&self) -> bool {
        self.source.is_writable()
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        ensure_open(self.closed, &self.location)?;
        if pos == self.offset {
            return Ok(());
        }

        if pos < self.offset {
            if self.source.as_resettable().is_none() {
                return Err(LocioError::BackwardSeek {
                    from: self.offset,
                    to: pos,
                });
            }
            debug!(
                "rewinding {} from {} to reach {}",
                self.location.name(),
                self.offset,
                pos
            );
            self.rewind()?;
        }

        let wanted = pos - self.offset;
        let skipped = self.jump(wanted)?;
        if skipped < wanted {
            return Err(LocioError::transport(
                format!(
                    "{} ended at offset {} before reaching {}",
                    self.location.name(),
                    self.offset,
                    pos
                ),
                io::ErrorKind::UnexpectedEof.into(),
            ));
        }
        Ok(())
    }

    fn skip(&mut self, n: u64) -> Result<u64> {
        ensure_open(self.closed, &self.location)?;
        self.jump(n)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        ensure_open(self.closed, &self.location)?;
        if !self.source.is_readable() {
            return Err(LocioError::unsupported(format!(
                "handle for '{}' is write-only",
                self.location.name()
            )));
        }
        let input = self.source.input()?;
        let n = loop {
            match input.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                result => break result?,
            }
        };
        self.offset += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        ensure_open(self.closed, &self.location)?;
        if !self.source.is_writable() {
            return Err(read_only(&self.location, "write"));
        }
        self.source.output()?.write_all(buf)?;
        self.offset += buf.len() as u64;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.source.close()
    }

    fn as_resettable(&mut self) -> Option<&mut dyn ResettableStream> {
        if self.source.as_resettable().is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl<S: StreamSource> ResettableStream for StreamHandle<S> {
    fn reset_stream(&mut self) -> Result<()> {
        ensure_open(self.closed, &self.location)?;
        self.rewind()
    }
}

/// [`StreamSource`] over any sequential reader.
///
/// Cannot rewind, so handles built on it only seek forward.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: Option<R>,
    length: Option<u64>,
}

impl<R: Read + Send> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            length: None,
        }
    }

    /// Report `length` for this source instead of "unknown"
    pub fn with_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }
}

impl<R: Read + Send> StreamSource for ReaderSource<R> {
    fn input(&mut self) -> Result<&mut dyn Read> {
        match self.reader.as_mut() {
            Some(reader) => Ok(reader as &mut dyn Read),
            None => Err(LocioError::unsupported("reader was released")),
        }
    }

    fn length(&mut self) -> Result<Option<u64>> {
        Ok(self.length)
    }

    fn close(&mut self) -> Result<()> {
        self.reader = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::BytesLocation;
    use std::io::Cursor;

    /// Reader that hands out at most `max` bytes per call
    struct Trickle<R> {
        inner: R,
        max: usize,
    }

    impl<R: Read> Read for Trickle<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.max);
            self.inner.read(&mut buf[..n])
        }
    }

    /// Source that skips in tiny steps and can rewind, counting resets
    struct TrickleSource {
        data: Vec<u8>,
        cursor: Cursor<Vec<u8>>,
        resets: usize,
    }

    impl TrickleSource {
        fn new(data: &[u8]) -> Self {
            Self {
                data: data.to_vec(),
                cursor: Cursor::new(data.to_vec()),
                resets: 0,
            }
        }
    }

    impl StreamSource for TrickleSource {
        fn input(&mut self) -> Result<&mut dyn Read> {
            Ok(&mut self.cursor)
        }

        fn length(&mut self) -> Result<Option<u64>> {
            Ok(None)
        }

        fn skip(&mut self, n: u64) -> Result<u64> {
            let step = n.min(3);
            let mut limited = (&mut self.cursor).take(step);
            Ok(io::copy(&mut limited, &mut io::sink())?)
        }

        fn as_resettable(&mut self) -> Option<&mut dyn ResettableStream> {
            Some(self)
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    impl ResettableStream for TrickleSource {
        fn reset_stream(&mut self) -> Result<()> {
            self.cursor = Cursor::new(self.data.clone());
            self.resets += 1;
            Ok(())
        }
    }

    fn location() -> Arc<dyn Location> {
        Arc::new(BytesLocation::new("stream", Vec::new()))
    }

    fn reader_handle(data: &'static [u8]) -> StreamHandle<ReaderSource<Trickle<&'static [u8]>>> {
        let reader = Trickle {
            inner: data,
            max: 2,
        };
        StreamHandle::new(location(), ReaderSource::new(reader))
    }

    #[test]
    fn test_forward_seek_matches_sequential_read() {
        let data: &'static [u8] = b"the quick brown fox";
        for k in 0..data.len() as u64 {
            let mut handle = reader_handle(data);
            handle.seek(k).unwrap();
            assert_eq!(handle.offset(), k);

            let mut rest = Vec::new();
            handle.read_to_end(&mut rest).unwrap();
            assert_eq!(rest, &data[k as usize..]);
        }
    }

    #[test]
    fn test_short_skips_are_retried() {
        let mut handle = StreamHandle::new(location(), TrickleSource::new(b"0123456789"));
        handle.seek(8).unwrap();
        assert_eq!(handle.offset(), 8);

        let mut buf = [0u8; 2];
        handle.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"89");
    }

    #[test]
    fn test_backward_seek_without_reset_fails() {
        let mut handle = reader_handle(b"abcdef");
        handle.seek(4).unwrap();

        match handle.seek(1) {
            Err(LocioError::BackwardSeek { from, to }) => {
                assert_eq!((from, to), (4, 1));
            }
            other => panic!("Expected BackwardSeek, got {other:?}"),
        }
        assert_eq!(handle.offset(), 4);
        assert!(handle.as_resettable().is_none());
    }

    #[test]
    fn test_backward_seek_resets_and_reskips() {
        let mut handle = StreamHandle::new(location(), TrickleSource::new(b"0123456789"));
        handle.seek(7).unwrap();

        handle.seek(2).unwrap();
        assert_eq!(handle.offset(), 2);
        assert_eq!(handle.source().resets, 1);

        let mut buf = [0u8; 3];
        handle.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"234");
    }

    #[test]
    fn test_reset_stream_returns_to_start() {
        let mut handle = StreamHandle::new(location(), TrickleSource::new(b"abc"));
        handle.read_exact(&mut [0u8; 2]).unwrap();

        handle
            .as_resettable()
            .expect("source can rewind")
            .reset_stream()
            .unwrap();
        assert_eq!(handle.offset(), 0);

        let mut out = Vec::new();
        handle.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn test_seek_past_end_reports_eof_and_keeps_true_offset() {
        let mut handle = reader_handle(b"abc");
        let err = handle.seek(10).unwrap_err();

        assert!(err.is_unexpected_eof());
        assert_eq!(handle.offset(), 3);
    }

    #[test]
    fn test_skip_returns_actual_count() {
        let mut handle = reader_handle(b"abcde");
        assert_eq!(handle.skip(3).unwrap(), 3);
        assert_eq!(handle.skip(10).unwrap(), 2);
        assert_eq!(handle.offset(), 5);
    }

    #[test]
    fn test_read_only_source_rejects_writes() {
        let mut handle = reader_handle(b"abc");
        assert!(!handle.is_writable());
        assert!(matches!(
            handle.write(b"x"),
            Err(LocioError::Unsupported { .. })
        ));
        for length in [0, 3, u64::MAX] {
            assert!(matches!(
                handle.set_length(length),
                Err(LocioError::Unsupported { .. })
            ));
        }
    }

    #[test]
    fn test_length_reports_known_or_unknown() {
        let mut unknown = reader_handle(b"abc");
        assert_eq!(unknown.length().unwrap(), None);

        let mut known = StreamHandle::new(
            location(),
            ReaderSource::new(Cursor::new(b"abc".to_vec())).with_length(3),
        );
        assert_eq!(known.length().unwrap(), Some(3));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut handle = reader_handle(b"abc");
        handle.close().unwrap();
        handle.close().unwrap();
        assert!(matches!(
            handle.read(&mut [0u8; 1]),
            Err(LocioError::Closed { .. })
        ));
    }
}
