//! Random-access handle for local files.

use crate::config::FileMode;
use crate::error::{LocioError, Result};
use crate::handle::{ensure_open, read_only, DataHandle, ResettableStream};
use crate::location::{FileLocation, Location};
use log::debug;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Handle over a [`FileLocation`].
///
/// The file is opened on first access, not at construction, so creating a
/// handle for a path that does not exist yet is fine.
#[derive(Debug)]
pub struct FileHandle {
    location: Arc<dyn Location>,
    path: PathBuf,
    mode: FileMode,
    file: Option<File>,
    offset: u64,
    closed: bool,
}

impl FileHandle {
    pub fn new(location: FileLocation, mode: FileMode) -> Self {
        let path = location.path().to_path_buf();
        Self {
            location: Arc::new(location),
            path,
            mode,
            file: None,
            offset: 0,
            closed: false,
        }
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    /// Whether the file currently exists on disk
    pub fn exists(&self) -> bool {
        self.file.is_some() || self.path.is_file()
    }

    /// The open file, opening it (and restoring the cursor) if needed
    fn file(&mut self) -> Result<&mut File> {
        ensure_open(self.closed, &self.location)?;
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                debug!("opening {} ({:?})", self.path.display(), self.mode);
                let mut file = self.mode.open(&self.path).map_err(|e| {
                    LocioError::transport(format!("Failed to open file: {}", self.path.display()), e)
                })?;
                if self.offset > 0 {
                    file.seek(SeekFrom::Start(self.offset))?;
                }
                file
            }
        };
        Ok(self.file.insert(file))
    }

    fn ensure_writable(&self, operation: &str) -> Result<()> {
        if self.mode.is_writable() {
            Ok(())
        } else {
            Err(read_only(&self.location, operation))
        }
    }
}

impl DataHandle for FileHandle {
    fn location(&self) -> &Arc<dyn Location> {
        &self.location
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn length(&mut self) -> Result<Option<u64>> {
        ensure_open(self.closed, &self.location)?;
        let metadata = match &self.file {
            Some(file) => file.metadata(),
            None if !self.path.exists() => return Ok(None),
            None => std::fs::metadata(&self.path),
        };
        let metadata = metadata.map_err(|e| {
            LocioError::transport(
                format!("Failed to read file metadata: {}", self.path.display()),
                e,
            )
        })?;
        Ok(Some(metadata.len()))
    }

    fn set_length(&mut self, length: u64) -> Result<()> {
        self.ensure_writable("set length")?;
        self.file()?.set_len(length)?;
        Ok(())
    }

    fn is_readable(&self) -> bool {
        true
    }

    fn is_writable(&self) -> bool {
        self.mode.is_writable()
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        ensure_open(self.closed, &self.location)?;
        if let Some(file) = self.file.as_mut() {
            file.seek(SeekFrom::Start(pos))?;
        }
        self.offset = pos;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.file()?.read(buf)?;
        self.offset += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.ensure_writable("write")?;
        self.file()?.write_all(buf)?;
        self.offset += buf.len() as u64;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Some(file) = self.file.take() {
            if self.mode.is_writable() {
                file.sync_all()?;
            }
        }
        Ok(())
    }

    fn as_resettable(&mut self) -> Option<&mut dyn ResettableStream> {
        Some(self)
    }
}

impl ResettableStream for FileHandle {
    fn reset_stream(&mut self) -> Result<()> {
        self.seek(0)
    }
}
