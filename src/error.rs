//! Error types and handling infrastructure for locio.
//!
//! This module provides a centralized error handling system using `thiserror` for
//! the library's error type. The binary layers `anyhow` on top for context.
//!
//! ## Design Principles
//!
//! - **One taxonomy**: every public operation fails with one of the variants below
//! - **Context preservation**: transport failures keep their `io::Error` source
//! - **Lossless layering**: a `LocioError` that crosses an `io::Read` boundary
//!   (e.g. inside a decoder) comes back out as the same variant

use std::io;
use thiserror::Error;

/// The main error type for locio operations.
#[derive(Error, Debug)]
pub enum LocioError {
    /// A position or range lies outside the legal buffered range, would leave a
    /// hole, or exceeds the configured addressable size
    #[error("Boundary violation: {message}")]
    Boundary { message: String },

    /// Envelope validation failed (wrong magic number, truncated prefix)
    #[error("Invalid {format} data: {message}")]
    Format {
        format: &'static str,
        message: String,
    },

    /// Operation not supported by this handle (writes on read-only handles, ...)
    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    /// Seek to an earlier offset on a stream that cannot be rewound
    #[error("Cannot seek backward from offset {from} to {to}: stream is not resettable")]
    BackwardSeek { from: u64, to: u64 },

    /// Failure reported by the underlying file, connection or decoder
    #[error("Transport failed: {message}")]
    Transport {
        message: String,
        #[source]
        source: io::Error,
    },

    /// I/O attempted on a handle after `close()`
    #[error("Handle is closed: {name}")]
    Closed { name: String },

    /// The factory has no constructor for this kind of location
    #[error("No handle registered for location: {name}")]
    NoHandle { name: String },

    /// A location could not be built from the given input
    #[error("Invalid location: {message}")]
    InvalidLocation { message: String },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Generic error for cases not covered by specific variants
    #[error("Operation failed: {message}")]
    Other { message: String },
}

/// Standard Result type for locio operations.
pub type Result<T> = std::result::Result<T, LocioError>;

impl LocioError {
    /// Create a Boundary error with a descriptive message
    pub fn boundary(message: impl Into<String>) -> Self {
        Self::Boundary {
            message: message.into(),
        }
    }

    /// Create a Format error for the named envelope format
    pub fn format(format: &'static str, message: impl Into<String>) -> Self {
        Self::Format {
            format,
            message: message.into(),
        }
    }

    /// Create an Unsupported error with a descriptive message
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Create a Transport error from an io::Error with additional context
    pub fn transport(message: impl Into<String>, source: io::Error) -> Self {
        Self::Transport {
            message: message.into(),
            source,
        }
    }

    /// Create a Closed error for the handle bound to `name`
    pub fn closed(name: impl Into<String>) -> Self {
        Self::Closed { name: name.into() }
    }

    /// Create an InvalidLocation error with a descriptive message
    pub fn invalid_location(message: impl Into<String>) -> Self {
        Self::InvalidLocation {
            message: message.into(),
        }
    }

    /// Create a ConfigError with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a generic Other error with a descriptive message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether this error means the underlying stream ended early
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.kind() == io::ErrorKind::UnexpectedEof)
    }
}

// Automatic conversion from io::Error to LocioError
impl From<io::Error> for LocioError {
    fn from(err: io::Error) -> Self {
        // A LocioError tunnelled through an io::Read impl keeps its variant
        if err
            .get_ref()
            .is_some_and(|inner| inner.is::<LocioError>())
        {
            return match err.into_inner().map(|inner| inner.downcast::<LocioError>()) {
                Some(Ok(inner)) => *inner,
                _ => Self::other("wrapped error could not be recovered"),
            };
        }

        let message = match err.kind() {
            io::ErrorKind::NotFound => "Resource not found",
            io::ErrorKind::PermissionDenied => "Permission denied",
            io::ErrorKind::UnexpectedEof => "Unexpected end of stream",
            io::ErrorKind::InvalidData => "Corrupt data in stream",
            _ => "IO operation failed",
        };
        Self::Transport {
            message: message.to_string(),
            source: err,
        }
    }
}

impl From<LocioError> for io::Error {
    fn from(err: LocioError) -> Self {
        let kind = match &err {
            LocioError::Boundary { .. } => io::ErrorKind::InvalidInput,
            LocioError::Format { .. } => io::ErrorKind::InvalidData,
            LocioError::Unsupported { .. } | LocioError::BackwardSeek { .. } => {
                io::ErrorKind::Unsupported
            }
            LocioError::Transport { source, .. } => source.kind(),
            LocioError::NoHandle { .. } => io::ErrorKind::NotFound,
            LocioError::InvalidLocation { .. } | LocioError::ConfigError { .. } => {
                io::ErrorKind::InvalidInput
            }
            LocioError::Closed { .. } | LocioError::Other { .. } => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let boundary = LocioError::boundary("position 7 is past the end");
        assert_eq!(
            boundary.to_string(),
            "Boundary violation: position 7 is past the end"
        );

        let format = LocioError::format("gzip", "bad magic number");
        assert_eq!(format.to_string(), "Invalid gzip data: bad magic number");

        let seek = LocioError::BackwardSeek { from: 10, to: 2 };
        assert_eq!(
            seek.to_string(),
            "Cannot seek backward from offset 10 to 2: stream is not resettable"
        );
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(
            LocioError::unsupported("read-only"),
            LocioError::Unsupported { .. }
        ));
        assert!(matches!(LocioError::closed("a.txt"), LocioError::Closed { .. }));
        assert!(matches!(LocioError::other("?"), LocioError::Other { .. }));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        match LocioError::from(io_err) {
            LocioError::Transport { message, source } => {
                assert_eq!(message, "Resource not found");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("Expected Transport variant, got {other:?}"),
        }
    }

    #[test]
    fn test_round_trip_through_io_error_keeps_variant() {
        let original = LocioError::format("bzip2", "truncated prefix");
        let io_err: io::Error = original.into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);

        match LocioError::from(io_err) {
            LocioError::Format { format, message } => {
                assert_eq!(format, "bzip2");
                assert_eq!(message, "truncated prefix");
            }
            other => panic!("Expected Format variant, got {other:?}"),
        }
    }

    #[test]
    fn test_unexpected_eof_detection() {
        let eof = LocioError::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(eof.is_unexpected_eof());
        assert!(!LocioError::boundary("x").is_unexpected_eof());
    }
}
