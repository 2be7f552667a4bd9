//! In-memory byte locations.

use crate::location::Location;
use std::any::Any;
use std::sync::Arc;

/// A named blob of bytes held in memory.
///
/// Each handle created for this location starts from a copy of `data`;
/// writes through a handle never change the location.
#[derive(Debug, Clone)]
pub struct BytesLocation {
    name: String,
    data: Arc<[u8]>,
}

impl BytesLocation {
    pub fn new(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Location for BytesLocation {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn is_browsable(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
