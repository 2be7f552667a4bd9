//! Runtime configuration for handles and buffers.
//!
//! Every knob has a sensible default, so `IoConfig::default()` is all most
//! callers need. With the `config` feature the same structure can be read
//! from a TOML file.

use crate::error::{LocioError, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Default upper bound for a [`GrowableBuffer`](crate::buffer::GrowableBuffer):
/// the largest size a `Vec<u8>` can address on this platform.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = isize::MAX as usize;

/// Default number of bytes pulled from an inner handle per cache fill.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

/// How a [`FileHandle`](crate::handle::file::FileHandle) opens its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "kebab-case"))]
pub enum FileMode {
    /// Read-only; writes and `set_length` fail with `Unsupported`
    #[default]
    Read,
    /// Read and write; the file is created if missing and never truncated
    ReadWrite,
}

impl FileMode {
    /// Open `path` according to this mode
    pub fn open(self, path: &Path) -> io::Result<File> {
        match self {
            Self::Read => File::open(path),
            Self::ReadWrite => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path),
        }
    }

    pub fn is_writable(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

/// Tunables shared by the handle registry and buffer-backed handles.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default, rename_all = "kebab-case"))]
pub struct IoConfig {
    /// Upper bound (in bytes) for every growable buffer
    pub max_buffer_size: usize,
    /// Chunk size used when a caching handle reads ahead from its source
    pub read_chunk_size: usize,
    /// Mode used by the registry when it opens file locations
    pub file_mode: FileMode,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            file_mode: FileMode::default(),
        }
    }
}

impl IoConfig {
    pub fn with_max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = size;
        self
    }

    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    pub fn with_file_mode(mut self, mode: FileMode) -> Self {
        self.file_mode = mode;
        self
    }

    /// Reject configurations no handle could work with
    pub fn validate(&self) -> Result<()> {
        if self.max_buffer_size == 0 {
            return Err(LocioError::config("max-buffer-size must be positive"));
        }
        if self.max_buffer_size > DEFAULT_MAX_BUFFER_SIZE {
            return Err(LocioError::config(format!(
                "max-buffer-size {} exceeds the addressable limit {}",
                self.max_buffer_size, DEFAULT_MAX_BUFFER_SIZE
            )));
        }
        if self.read_chunk_size == 0 {
            return Err(LocioError::config("read-chunk-size must be positive"));
        }
        Ok(())
    }
}

#[cfg(feature = "config")]
impl IoConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| LocioError::config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LocioError::transport(format!("Failed to read config: {}", path.display()), e)
        })?;
        Self::from_toml_str(&text)
    }

    /// Load `<config_dir>/locio/config.toml`, falling back to defaults when absent
    pub fn load_default() -> Result<Self> {
        match dirs::config_dir().map(|dir| dir.join("locio").join("config.toml")) {
            Some(path) if path.is_file() => {
                log::debug!("loading configuration from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = IoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_buffer_size, DEFAULT_MAX_BUFFER_SIZE);
        assert_eq!(config.file_mode, FileMode::Read);
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let err = IoConfig::default()
            .with_max_buffer_size(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, LocioError::ConfigError { .. }));

        let err = IoConfig::default()
            .with_read_chunk_size(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, LocioError::ConfigError { .. }));
    }

    #[test]
    fn test_read_mode_refuses_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.bin");

        assert!(FileMode::Read.open(&missing).is_err());
        assert!(FileMode::ReadWrite.open(&missing).is_ok());
        assert!(missing.exists());
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_toml_str() {
        let config = IoConfig::from_toml_str(
            "max-buffer-size = 1024\nread-chunk-size = 16\nfile-mode = \"read\"\n",
        )
        .unwrap();
        assert_eq!(config.max_buffer_size, 1024);
        assert_eq!(config.read_chunk_size, 16);
        assert_eq!(config.file_mode, FileMode::Read);

        let partial = IoConfig::from_toml_str("read-chunk-size = 8\n").unwrap();
        assert_eq!(partial.max_buffer_size, DEFAULT_MAX_BUFFER_SIZE);

        assert!(IoConfig::from_toml_str("read-chunk-size = 0\n").is_err());
    }
}
