//! Handles that present the decoded content of a compressed location.
//!
//! A [`GzipLocation`] or [`Bzip2Location`] wraps the location of the raw,
//! compressed bytes. The matching handle resolves the inner location through
//! the injected [`HandleFactory`], checks the envelope prefix, and streams the
//! decoded bytes. Decoding itself is done by `flate2` and `bzip2`.
//!
//! Decoded streams are sequential. Backward seeks rewind the inner handle
//! when it can rewind, or reacquire it from the factory otherwise, and then
//! decode forward again.

use crate::error::{LocioError, Result};
use crate::factory::HandleFactory;
use crate::handle::stream::{StreamHandle, StreamSource};
use crate::handle::{DataHandle, HandleReader, ResettableStream};
use crate::location::{Location, WrappedLocation};
use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use log::{debug, warn};
use std::io::{Chain, Cursor, Read};
use std::sync::Arc;

/// gzip magic number (RFC 1952)
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// bzip2 stream signature
pub const BZIP2_SIGNATURE: [u8; 2] = *b"BZ";

/// Raw stream handed to a decoder: the prefix bytes the codec consumed,
/// followed by the rest of the inner handle.
pub type PrefixedReader = Chain<Cursor<[u8; 2]>, HandleReader>;

/// An external decoding primitive plus the envelope framing around it.
pub trait Codec: Send + Sync + 'static {
    /// Format name used in errors and logs
    const NAME: &'static str;

    type Decoder: Read + Send;

    /// Consume the envelope prefix from the start of `raw`
    ///
    /// Returns the bytes the decoder must see in front of the remaining input.
    fn read_prefix(raw: &mut dyn DataHandle) -> Result<[u8; 2]>;

    fn decoder(raw: PrefixedReader) -> Self::Decoder;

    /// Take the inner handle back out of a decoder
    fn into_raw(decoder: Self::Decoder) -> HandleReader;
}

/// gzip envelope: the first two bytes must be the gzip magic number.
#[derive(Debug, Clone, Copy)]
pub struct Gzip;

impl Codec for Gzip {
    const NAME: &'static str = "gzip";

    type Decoder = MultiGzDecoder<PrefixedReader>;

    fn read_prefix(raw: &mut dyn DataHandle) -> Result<[u8; 2]> {
        let mut magic = [0u8; 2];
        raw.read_exact(&mut magic).map_err(|e| {
            if e.is_unexpected_eof() {
                LocioError::format(Self::NAME, "stream is shorter than the magic number")
            } else {
                e
            }
        })?;
        if magic != GZIP_MAGIC {
            return Err(LocioError::format(
                Self::NAME,
                format!(
                    "'{}' does not start with the gzip magic number (found {:02x} {:02x})",
                    raw.location().name(),
                    magic[0],
                    magic[1]
                ),
            ));
        }
        Ok(magic)
    }

    fn decoder(raw: PrefixedReader) -> Self::Decoder {
        MultiGzDecoder::new(raw)
    }

    fn into_raw(decoder: Self::Decoder) -> HandleReader {
        decoder.into_inner().into_inner().1
    }
}

/// bzip2 envelope: the first two bytes are framing and are skipped
/// unchecked. The `bzip2` decoder expects them, so it is handed the
/// canonical signature in their place.
#[derive(Debug, Clone, Copy)]
pub struct Bzip2;

impl Codec for Bzip2 {
    const NAME: &'static str = "bzip2";

    type Decoder = BzDecoder<PrefixedReader>;

    fn read_prefix(raw: &mut dyn DataHandle) -> Result<[u8; 2]> {
        let mut skipped = 0;
        while skipped < BZIP2_SIGNATURE.len() as u64 {
            match raw.skip(BZIP2_SIGNATURE.len() as u64 - skipped)? {
                0 => {
                    return Err(LocioError::format(
                        Self::NAME,
                        format!("'{}' ended inside the stream prefix", raw.location().name()),
                    ))
                }
                n => skipped += n,
            }
        }
        Ok(BZIP2_SIGNATURE)
    }

    fn decoder(raw: PrefixedReader) -> Self::Decoder {
        BzDecoder::new(raw)
    }

    fn into_raw(decoder: Self::Decoder) -> HandleReader {
        decoder.into_inner().into_inner().1
    }
}

/// "This location, gzip-decoded"
pub type GzipLocation = WrappedLocation<Gzip>;

/// "This location, bzip2-decoded"
pub type Bzip2Location = WrappedLocation<Bzip2>;

/// Read-only handle over gzip-decoded content
pub type GzipHandle = StreamHandle<DecoderSource<Gzip>>;

/// Read-only handle over bzip2-decoded content
pub type Bzip2Handle = StreamHandle<DecoderSource<Bzip2>>;

/// [`StreamSource`] producing the decoded bytes of a wrapped location.
///
/// Starts uninitialized; the first [`input`](StreamSource::input) acquires
/// the inner handle, consumes the envelope prefix and starts decoding. The
/// decoder owns the inner handle while streaming.
pub struct DecoderSource<C: Codec> {
    inner: Arc<dyn Location>,
    factory: Arc<dyn HandleFactory>,
    decoder: Option<C::Decoder>,
}

impl<C: Codec> DecoderSource<C> {
    pub fn new(location: &WrappedLocation<C>, factory: Arc<dyn HandleFactory>) -> Self {
        Self {
            inner: Arc::clone(location.inner_location()),
            factory,
            decoder: None,
        }
    }

    /// Whether the inner handle is currently held
    pub fn is_streaming(&self) -> bool {
        self.decoder.is_some()
    }

    /// Resolve the inner location and start decoding from its beginning
    fn acquire(&self) -> Result<C::Decoder> {
        debug!("acquiring {} source {}", C::NAME, self.inner.name());
        let raw = Arc::clone(&self.factory).create(Arc::clone(&self.inner))?;
        start_decoder::<C>(raw)
    }

    /// Drop the decoder and close the inner handle it owns
    fn release(&mut self) -> Result<()> {
        match self.decoder.take() {
            Some(decoder) => C::into_raw(decoder).into_inner().close(),
            None => Ok(()),
        }
    }
}

/// Consume the prefix from `raw` and build a decoder over the remainder.
/// `raw` is closed before any prefix error is returned.
fn start_decoder<C: Codec>(mut raw: Box<dyn DataHandle>) -> Result<C::Decoder> {
    match C::read_prefix(raw.as_mut()) {
        Ok(prefix) => Ok(C::decoder(
            Cursor::new(prefix).chain(HandleReader::new(raw)),
        )),
        Err(err) => {
            if let Err(close_err) = raw.close() {
                warn!(
                    "closing {} after a failed {} prefix check: {}",
                    raw.location().name(),
                    C::NAME,
                    close_err
                );
            }
            Err(err)
        }
    }
}

impl<C: Codec> StreamSource for DecoderSource<C> {
    fn input(&mut self) -> Result<&mut dyn Read> {
        let decoder = match self.decoder.take() {
            Some(decoder) => decoder,
            None => self.acquire()?,
        };
        Ok(self.decoder.insert(decoder) as &mut dyn Read)
    }

    /// Always unknown: the decoded size is only known after decoding
    /// everything, which a length query must not trigger.
    fn length(&mut self) -> Result<Option<u64>> {
        Ok(None)
    }

    fn set_length(&mut self, _length: u64) -> Result<()> {
        Err(LocioError::unsupported(format!(
            "cannot set length, {} handles are read-only",
            C::NAME
        )))
    }

    fn as_resettable(&mut self) -> Option<&mut dyn ResettableStream> {
        Some(self)
    }

    fn close(&mut self) -> Result<()> {
        self.release()
    }
}

impl<C: Codec> ResettableStream for DecoderSource<C> {
    fn reset_stream(&mut self) -> Result<()> {
        let Some(decoder) = self.decoder.take() else {
            return Ok(());
        };
        // From here on the source stays uninitialized unless the decoder
        // restarts, so a failure means reacquiring on the next read.
        let mut raw = C::into_raw(decoder).into_inner();

        let rewound = match raw.as_resettable().map(|resettable| resettable.reset_stream()) {
            Some(Ok(())) => true,
            Some(Err(err)) => {
                if let Err(close_err) = raw.close() {
                    warn!(
                        "closing {} after a failed reset: {}",
                        raw.location().name(),
                        close_err
                    );
                }
                return Err(err);
            }
            None => false,
        };

        if rewound {
            debug!("rewound {} source {}", C::NAME, self.inner.name());
            self.decoder = Some(start_decoder::<C>(raw)?);
        } else {
            debug!(
                "{} source {} cannot rewind, reacquiring on next read",
                C::NAME,
                self.inner.name()
            );
            raw.close()?;
        }
        Ok(())
    }
}
