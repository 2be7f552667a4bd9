//! Compression envelope detection.
//!
//! Identifies gzip and bzip2 content by its magic bytes, falling back to the
//! location's name extension, and wraps the location in the matching
//! decoding location.

use crate::error::Result;
use crate::factory::HandleFactory;
use crate::handle::compressed::{Bzip2Location, GzipLocation, GZIP_MAGIC};
use crate::location::Location;
use log::{debug, warn};
use std::path::Path;
use std::sync::Arc;

/// Compression envelope around a location's bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// Plain content
    None,
    /// Gzip (.gz)
    Gzip,
    /// Bzip2 (.bz2)
    Bzip2,
}

impl Envelope {
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
        }
    }

    pub fn is_compressed(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Envelope from leading bytes
    ///
    /// # Magic Numbers Used
    /// - Gzip: `1f 8b` (RFC 1952)
    /// - Bzip2: `42 5a 68` ("BZh" with block size)
    pub fn detect_by_magic(magic: &[u8]) -> Option<Self> {
        if magic.starts_with(&GZIP_MAGIC) {
            Some(Self::Gzip)
        } else if magic.starts_with(b"BZh") {
            Some(Self::Bzip2)
        } else {
            None
        }
    }

    /// Envelope from a file name or path extension
    pub fn detect_by_extension(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?;
        match ext.to_lowercase().as_str() {
            "gz" | "tgz" => Some(Self::Gzip),
            "bz2" | "tbz2" => Some(Self::Bzip2),
            _ => None,
        }
    }

    /// Detect the envelope of `location`, reading its first bytes through
    /// `factory`
    ///
    /// Magic bytes win; the extension is only consulted when the content is
    /// unreadable or too short to tell.
    pub fn detect(factory: Arc<dyn HandleFactory>, location: &Arc<dyn Location>) -> Result<Self> {
        let mut handle = factory.create(Arc::clone(location))?;
        let mut head = [0u8; 3];
        let mut filled = 0;
        let peeked = loop {
            match handle.read(&mut head[filled..]) {
                Ok(0) => break Ok(()),
                Ok(n) => {
                    filled += n;
                    if filled == head.len() {
                        break Ok(());
                    }
                }
                Err(e) => break Err(e),
            }
        };
        if let Err(e) = handle.close() {
            warn!("closing {} after detection: {}", location.name(), e);
        }

        let detected = match peeked {
            Ok(()) => Self::detect_by_magic(&head[..filled]),
            Err(e) => {
                debug!("cannot peek at {}: {}", location.name(), e);
                None
            }
        }
        .or_else(|| Self::detect_by_extension(&location.name()))
        .unwrap_or(Self::None);

        debug!("{} envelope for {}", detected.name(), location.name());
        Ok(detected)
    }

    /// Wrap `location` so its handle yields the decoded content
    pub fn wrap(self, location: Arc<dyn Location>) -> Arc<dyn Location> {
        match self {
            Self::None => location,
            Self::Gzip => Arc::new(GzipLocation::new(location)),
            Self::Bzip2 => Arc::new(Bzip2Location::new(location)),
        }
    }
}
