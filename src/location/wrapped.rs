//! Locations that view another location through a decoding layer.

use crate::location::Location;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use url::Url;

/// "The bytes of `inner`, decoded as `K`".
///
/// `K` is a marker type naming the decoding relationship, e.g.
/// [`Gzip`](crate::handle::compressed::Gzip). Wrapping changes what the bytes
/// mean, not where the resource sits, so the URI is forwarded but hierarchy
/// queries are not.
pub struct WrappedLocation<K> {
    inner: Arc<dyn Location>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> WrappedLocation<K> {
    pub fn new(inner: Arc<dyn Location>) -> Self {
        Self {
            inner,
            _kind: PhantomData,
        }
    }

    pub fn inner_location(&self) -> &Arc<dyn Location> {
        &self.inner
    }
}

impl<K> Clone for WrappedLocation<K> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.inner))
    }
}

impl<K> fmt::Debug for WrappedLocation<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedLocation")
            .field("kind", &std::any::type_name::<K>())
            .field("inner", &self.inner)
            .finish()
    }
}

impl<K: 'static> Location for WrappedLocation<K> {
    fn uri(&self) -> Option<&Url> {
        self.inner.uri()
    }

    fn is_browsable(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{BytesLocation, FileLocation};

    struct Marker;

    #[test]
    fn test_uri_is_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        let inner: Arc<dyn Location> = Arc::new(FileLocation::new(dir.path().join("a.gz")));
        let wrapped = WrappedLocation::<Marker>::new(Arc::clone(&inner));

        assert_eq!(wrapped.uri(), inner.uri());
        assert_eq!(wrapped.name(), inner.uri().unwrap().to_string());
    }

    #[test]
    fn test_hierarchy_is_not_inherited() {
        let dir = tempfile::tempdir().unwrap();
        let inner: Arc<dyn Location> = Arc::new(FileLocation::new(dir.path()));
        let wrapped = WrappedLocation::<Marker>::new(inner);

        assert!(!wrapped.is_browsable());
        assert!(wrapped.parent().unwrap().is_none());
        assert!(wrapped.children().unwrap().is_empty());
    }

    #[test]
    fn test_inner_without_uri_gives_empty_name() {
        let inner: Arc<dyn Location> = Arc::new(BytesLocation::new("blob", vec![1u8, 2, 3]));
        let wrapped = WrappedLocation::<Marker>::new(inner);

        assert!(wrapped.uri().is_none());
        assert_eq!(wrapped.name(), "");
        assert_eq!(wrapped.inner_location().name(), "blob");
    }
}
