//! Resource identifiers.
//!
//! A [`Location`] names a byte-addressable resource without saying how to
//! reach it. Handles are obtained for locations through a
//! [`HandleFactory`](crate::factory::HandleFactory).

use crate::error::Result;
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;
use ::url::Url;

pub mod bytes;
pub mod file;
pub mod url;
pub mod wrapped;

pub use bytes::BytesLocation;
pub use file::FileLocation;
pub use url::UrlLocation;
pub use wrapped::WrappedLocation;

/// Identifier for a resource, analogous to a URI.
///
/// Implementations are immutable once constructed.
pub trait Location: Debug + Send + Sync + 'static {
    /// The location as a URI, or `None` if it cannot be expressed as one
    fn uri(&self) -> Option<&Url> {
        None
    }

    /// Display name; defaults to the URI string, or `""` without a URI
    fn name(&self) -> String {
        self.uri().map(Url::to_string).unwrap_or_default()
    }

    /// Whether [`parent`](Location::parent) and [`children`](Location::children)
    /// are meaningful. Never performs I/O.
    fn is_browsable(&self) -> bool;

    /// The enclosing location, `None` if there is none
    fn parent(&self) -> Result<Option<Arc<dyn Location>>> {
        Ok(None)
    }

    /// Directly contained locations in no particular order; empty if none
    fn children(&self) -> Result<Vec<Arc<dyn Location>>> {
        Ok(Vec::new())
    }

    /// Concrete type access, used by the handle registry for dispatch
    fn as_any(&self) -> &dyn Any;
}
