//! Turning locations into handles.
//!
//! The core only depends on the [`HandleFactory`] capability: "given a
//! location, produce a handle for it". [`HandleRegistry`] is the stock
//! implementation, dispatching on the concrete location type. Any closure
//! with the right signature is a factory too.

use crate::config::IoConfig;
use crate::error::{LocioError, Result};
use crate::handle::buffered::BufferedReadHandle;
use crate::handle::bytes::BufferHandle;
use crate::handle::compressed::{Bzip2, Bzip2Location, DecoderSource, Gzip, GzipLocation};
use crate::handle::file::FileHandle;
use crate::handle::stream::StreamHandle;
use crate::handle::DataHandle;
use crate::location::{BytesLocation, FileLocation, Location};
use log::debug;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Capability that resolves a location to a handle.
///
/// Takes `self` as an `Arc` so implementations can hand themselves to the
/// handles they build, e.g. a decoding handle that later resolves its inner
/// location.
pub trait HandleFactory: Send + Sync {
    fn create(self: Arc<Self>, location: Arc<dyn Location>) -> Result<Box<dyn DataHandle>>;
}

impl<F> HandleFactory for F
where
    F: Fn(Arc<dyn Location>) -> Result<Box<dyn DataHandle>> + Send + Sync,
{
    fn create(self: Arc<Self>, location: Arc<dyn Location>) -> Result<Box<dyn DataHandle>> {
        (self)(location)
    }
}

type Constructor = Box<
    dyn Fn(Arc<dyn Location>, Arc<dyn HandleFactory>) -> Result<Box<dyn DataHandle>>
        + Send
        + Sync,
>;

/// Factory keyed by the concrete [`Location`] type.
///
/// The set of kinds is open: [`register`](HandleRegistry::register) adds or
/// replaces the constructor for a location type.
pub struct HandleRegistry {
    config: IoConfig,
    constructors: HashMap<TypeId, (&'static str, Constructor)>,
}

impl fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.constructors.values().map(|(name, _)| *name).collect();
        kinds.sort_unstable();
        f.debug_struct("HandleRegistry")
            .field("config", &self.config)
            .field("kinds", &kinds)
            .finish()
    }
}

impl HandleRegistry {
    /// A registry with no constructors
    pub fn empty(config: IoConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            constructors: HashMap::new(),
        })
    }

    /// A registry for every location kind this crate knows about
    pub fn with_defaults(config: IoConfig) -> Result<Self> {
        let mut registry = Self::empty(config)?;

        let mode = registry.config.file_mode;
        registry.register::<FileLocation, _>(move |location, _| {
            Ok(Box::new(FileHandle::new(location.clone(), mode)))
        });

        let limit = registry.config.max_buffer_size;
        registry.register::<BytesLocation, _>(move |location, _| {
            Ok(Box::new(BufferHandle::new(location.clone(), limit)?))
        });

        registry.register::<GzipLocation, _>(|location, factory| {
            let source = DecoderSource::<Gzip>::new(location, factory);
            Ok(Box::new(StreamHandle::new(Arc::new(location.clone()), source)))
        });

        registry.register::<Bzip2Location, _>(|location, factory| {
            let source = DecoderSource::<Bzip2>::new(location, factory);
            Ok(Box::new(StreamHandle::new(Arc::new(location.clone()), source)))
        });

        #[cfg(feature = "http")]
        registry.register::<crate::location::UrlLocation, _>(|location, _| {
            Ok(Box::new(crate::handle::url::UrlHandle::open(location.clone())))
        });

        Ok(registry)
    }

    pub fn config(&self) -> &IoConfig {
        &self.config
    }

    /// Register `constructor` for locations of type `L`
    ///
    /// The constructor receives the registry itself as a factory for any
    /// locations the new handle needs to resolve.
    pub fn register<L, F>(&mut self, constructor: F) -> &mut Self
    where
        L: Location,
        F: Fn(&L, Arc<dyn HandleFactory>) -> Result<Box<dyn DataHandle>> + Send + Sync + 'static,
    {
        let erased: Constructor = Box::new(move |location, factory| {
            match location.as_any().downcast_ref::<L>() {
                Some(typed) => constructor(typed, factory),
                None => Err(LocioError::other(format!(
                    "constructor for {} received {}",
                    type_name::<L>(),
                    location.name()
                ))),
            }
        });
        self.constructors
            .insert(TypeId::of::<L>(), (type_name::<L>(), erased));
        self
    }

    /// Whether a constructor exists for `location`'s type
    pub fn supports(&self, location: &dyn Location) -> bool {
        self.constructors
            .contains_key(&location.as_any().type_id())
    }

    /// Create a handle and wrap it in a [`BufferedReadHandle`] using the
    /// configured limits
    pub fn create_buffered(
        self: Arc<Self>,
        location: Arc<dyn Location>,
    ) -> Result<BufferedReadHandle> {
        let max_buffer_size = self.config.max_buffer_size;
        let chunk_size = self.config.read_chunk_size;
        let inner = self.create(location)?;
        BufferedReadHandle::new(inner, max_buffer_size, chunk_size)
    }
}

impl HandleFactory for HandleRegistry {
    fn create(self: Arc<Self>, location: Arc<dyn Location>) -> Result<Box<dyn DataHandle>> {
        let (kind, constructor) = self
            .constructors
            .get(&location.as_any().type_id())
            .ok_or_else(|| LocioError::NoHandle {
                name: format!("{} ({:?})", location.name(), location),
            })?;
        debug!("creating handle for {} via {}", location.name(), kind);
        let factory: Arc<dyn HandleFactory> = Arc::clone(&self) as Arc<dyn HandleFactory>;
        constructor(location, factory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileMode;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[derive(Debug)]
    struct Unknown;

    impl Location for Unknown {
        fn is_browsable(&self) -> bool {
            false
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn registry() -> Arc<HandleRegistry> {
        Arc::new(HandleRegistry::with_defaults(IoConfig::default()).unwrap())
    }

    #[test]
    fn test_unknown_location_kind() {
        let result = registry().create(Arc::new(Unknown));
        assert!(matches!(result, Err(LocioError::NoHandle { .. })));
    }

    #[test]
    fn test_bytes_location_dispatch() {
        let location: Arc<dyn Location> =
            Arc::new(BytesLocation::new("mem", &b"payload"[..]));
        let registry = registry();
        assert!(registry.supports(location.as_ref()));

        let mut handle = registry.create(location).unwrap();
        let mut out = Vec::new();
        handle.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"payload");
    }

    #[test]
    fn test_gzip_over_file_resolves_inner_through_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.gz");
        let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::fast());
        encoder.write_all(b"line 1\nline 2\n").unwrap();
        encoder.finish().unwrap();

        let registry = Arc::new(
            HandleRegistry::with_defaults(IoConfig::default().with_file_mode(FileMode::Read))
                .unwrap(),
        );
        let location = GzipLocation::new(Arc::new(FileLocation::new(&path)));
        let mut handle = registry.create(Arc::new(location)).unwrap();

        let mut buf = [0u8; 6];
        handle.read_at(7, &mut buf).unwrap();
        assert_eq!(&buf, b"line 2");
        handle.read_at(0, &mut buf).unwrap();
        assert_eq!(&buf, b"line 1");
    }

    #[test]
    fn test_default_file_handles_are_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        std::fs::write(&path, b"text").unwrap();

        let mut handle = registry()
            .create(Arc::new(FileLocation::new(&path)))
            .unwrap();
        assert!(!handle.is_writable());
        assert!(matches!(
            handle.write(b"x"),
            Err(LocioError::Unsupported { .. })
        ));
        assert_eq!(std::fs::read(&path).unwrap(), b"text");
    }

    #[test]
    fn test_register_replaces_constructor() {
        let mut registry = HandleRegistry::with_defaults(IoConfig::default()).unwrap();
        registry.register::<BytesLocation, _>(|_, _| Err(LocioError::other("disabled")));
        let registry = Arc::new(registry);

        let result = registry.create(Arc::new(BytesLocation::new("mem", Vec::new())));
        assert!(matches!(result, Err(LocioError::Other { .. })));
    }

    #[test]
    fn test_closure_is_a_factory() {
        let factory: Arc<dyn HandleFactory> =
            Arc::new(|location: Arc<dyn Location>| -> Result<Box<dyn DataHandle>> {
                Err(LocioError::NoHandle {
                    name: location.name(),
                })
            });
        let result = factory.create(Arc::new(Unknown));
        assert!(matches!(result, Err(LocioError::NoHandle { .. })));
    }

    #[test]
    fn test_create_buffered_uses_config() {
        let registry = Arc::new(
            HandleRegistry::with_defaults(IoConfig::default().with_max_buffer_size(4)).unwrap(),
        );
        let location: Arc<dyn Location> = Arc::new(BytesLocation::new("mem", &b"abc"[..]));
        let mut handle = Arc::clone(&registry).create_buffered(location).unwrap();

        let mut out = Vec::new();
        handle.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abc");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("six.bin");
        std::fs::write(&path, b"abcdef").unwrap();
        let location: Arc<dyn Location> = Arc::new(FileLocation::new(&path));
        let mut handle = registry.create_buffered(location).unwrap();
        assert!(matches!(
            handle.read_at(5, &mut [0u8; 1]),
            Err(LocioError::Boundary { .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = HandleRegistry::with_defaults(IoConfig::default().with_read_chunk_size(0));
        assert!(matches!(result, Err(LocioError::ConfigError { .. })));
    }
}
