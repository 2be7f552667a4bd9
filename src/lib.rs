//! # locio - Seekable access to files, remote endpoints and compressed resources
//!
//! Every resource is named by a [`Location`] and accessed through a
//! [`DataHandle`]: offset-based reads and writes, whatever the source
//! supports natively.
//!
//! ## Features
//!
//! - **Uniform handles**: files, in-memory blobs and http(s) bodies behind one trait
//! - **Emulated seeking**: sequential sources seek by skipping forward, or by
//!   rewinding and skipping again
//! - **Transparent decoding**: gzip and bzip2 envelopes as read-only handles
//!   over any other location
//! - **Bounded buffering**: hole-free growable buffers with a hard size limit
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`location`] - Resource identifiers
//! - [`handle`] - The handle trait and its implementations
//! - [`buffer`] - Growable, hole-free byte buffer
//! - [`factory`] - Resolving locations to handles
//! - [`envelope`] - Compression detection
//! - [`config`] - Buffer limits and file modes

pub mod buffer;
pub mod config;
pub mod envelope;
pub mod error;
pub mod factory;
pub mod handle;
pub mod location;

// Re-export commonly used types for convenience
pub use buffer::GrowableBuffer;
pub use config::{FileMode, IoConfig};
pub use envelope::Envelope;
pub use error::{LocioError, Result};
pub use factory::{HandleFactory, HandleRegistry};
pub use handle::{DataHandle, ResettableStream};
pub use location::Location;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
