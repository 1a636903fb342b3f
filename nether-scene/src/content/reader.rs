//! Content reader (load orchestrator)
//!
//! Resolves document entries into shared, typed objects. Each request goes
//! through a per-type cache keyed by entry name, so resolving the same key
//! twice yields the same `Rc`. Readers resolve their dependencies by calling
//! back into [`ContentReader::read_object`], which makes forward references
//! transparent: the first request for a key builds it on demand.
//!
//! Loading is single-threaded and runs to completion. If the outermost
//! `read_object` call fails, every entry cached during that call chain is
//! evicted again, so nothing from a failed load stays reachable by key.

use hashbrown::{HashMap, HashSet};
use std::any::{Any, TypeId};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::registry::{ErasedReader, ReaderRegistry};
use super::resolver::{ExternalReferenceResolver, FileResolver};
use crate::config::ContentConfig;
use crate::document::AssetDocument;
use crate::error::{ContentLoadError, ContentResult};
use crate::texture::Surface;

type CacheKey = (TypeId, String);

/// Orchestrates reading typed objects out of an asset document.
pub struct ContentReader {
    document: Rc<AssetDocument>,
    root_path: PathBuf,
    config: ContentConfig,
    registry: ReaderRegistry,
    resolver: Box<dyn ExternalReferenceResolver>,
    /// Finished objects, keyed by (type, entry name)
    cache: HashMap<CacheKey, Rc<dyn Any>>,
    /// Entries currently being constructed (cycle detection)
    in_progress: HashSet<CacheKey>,
    /// Entries cached since the outermost `read_object` call began
    journal: Vec<CacheKey>,
    depth: usize,
}

impl ContentReader {
    /// Create a reader over `document` with the built-in readers.
    ///
    /// Relative URIs are resolved against `root_path`.
    pub fn new(
        document: AssetDocument,
        root_path: impl Into<PathBuf>,
        resolver: Box<dyn ExternalReferenceResolver>,
    ) -> Self {
        Self {
            document: Rc::new(document),
            root_path: root_path.into(),
            config: ContentConfig::default(),
            registry: ReaderRegistry::with_builtin_readers(),
            resolver,
            cache: HashMap::new(),
            in_progress: HashSet::new(),
            journal: Vec::new(),
            depth: 0,
        }
    }

    /// Open an asset document from disk, resolving URIs from the filesystem.
    ///
    /// URIs are relative to `config.root_path` when set, otherwise to the
    /// document's directory.
    pub fn open(path: &Path, config: ContentConfig) -> ContentResult<Self> {
        let bytes = std::fs::read(path).map_err(|source| ContentLoadError::ExternalReference {
            uri: path.display().to_string(),
            path: path.to_path_buf(),
            source,
        })?;
        let document = AssetDocument::from_slice(&bytes)?;

        let root_path = match &config.root_path {
            Some(root) => root.clone(),
            None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };

        tracing::info!(
            "Opened asset document {} (root: {})",
            path.display(),
            root_path.display()
        );

        Ok(Self::new(document, root_path, Box::new(FileResolver)).with_config(config))
    }

    /// Replace the loader configuration.
    pub fn with_config(mut self, config: ContentConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the reader registry.
    pub fn with_registry(mut self, registry: ReaderRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn document(&self) -> &AssetDocument {
        &self.document
    }

    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Registry used to look up readers (e.g. to register custom kinds).
    pub fn registry_mut(&mut self) -> &mut ReaderRegistry {
        &mut self.registry
    }

    /// Number of cached objects across all types
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// The cached instance of `T` for `key`, without loading it.
    pub fn cached<T: 'static>(&self, key: &str) -> Option<Rc<T>> {
        self.cache
            .get(&(TypeId::of::<T>(), key.to_string()))
            .cloned()
            .map(downcast::<T>)
    }

    /// Return the shared instance of `T` for the entry `key`.
    ///
    /// The first request builds the object with the registered reader and
    /// caches it; later requests return the cached `Rc`.
    ///
    /// # Panics
    ///
    /// Panics if no reader producing `T` is registered. That is a programming
    /// error, not a data error.
    pub fn read_object<T: 'static>(&mut self, key: &str) -> ContentResult<Rc<T>> {
        let cache_key = (TypeId::of::<T>(), key.to_string());
        if let Some(cached) = self.cache.get(&cache_key) {
            tracing::trace!("Cache hit for {} `{}`", std::any::type_name::<T>(), key);
            return Ok(downcast::<T>(cached.clone()));
        }

        let Some(reader) = self.registry.get(cache_key.0) else {
            panic!(
                "no reader registered for {}",
                std::any::type_name::<T>()
            );
        };

        if !self.in_progress.insert(cache_key.clone()) {
            return Err(ContentLoadError::ReferenceCycle {
                type_name: reader.type_name(),
                key: key.to_string(),
            });
        }

        self.depth += 1;
        let result = self.construct(reader.as_ref(), key);
        self.depth -= 1;
        self.in_progress.remove(&cache_key);

        match result {
            Ok(object) => {
                tracing::debug!("Read {} `{}`", reader.type_name(), key);
                self.cache.insert(cache_key.clone(), object.clone());
                if self.depth == 0 {
                    self.journal.clear();
                } else {
                    self.journal.push(cache_key);
                }
                Ok(downcast::<T>(object))
            }
            Err(err) => {
                if self.depth == 0 {
                    self.rollback();
                    tracing::warn!("Failed to read {} `{}`: {}", reader.type_name(), key, err);
                }
                Err(err)
            }
        }
    }

    /// Read every entry of `T`'s section, in key order.
    ///
    /// # Panics
    ///
    /// Panics if no reader producing `T` is registered.
    pub fn read_all<T: 'static>(&mut self) -> ContentResult<Vec<Rc<T>>> {
        let Some(section) = self.registry.section_of::<T>() else {
            panic!(
                "no reader registered for {}",
                std::any::type_name::<T>()
            );
        };

        let document = Rc::clone(&self.document);
        document
            .keys(section)
            .into_iter()
            .map(|key| self.read_object::<T>(key))
            .collect()
    }

    /// Location of `uri` relative to the asset root, without fetching it.
    pub fn get_asset_path(&self, uri: &str) -> PathBuf {
        let path = Path::new(uri);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_path.join(path)
        }
    }

    /// Fetch the raw bytes referenced by `uri`.
    pub fn read_external_reference(&self, uri: &str) -> ContentResult<Vec<u8>> {
        let path = self.get_asset_path(uri);
        let bytes = self
            .resolver
            .read_bytes(&path)
            .map_err(|source| ContentLoadError::ExternalReference {
                uri: uri.to_string(),
                path: path.clone(),
                source,
            })?;
        tracing::debug!("Fetched {} bytes from {}", bytes.len(), path.display());
        Ok(bytes)
    }

    /// Fetch `uri` as UTF-8 text.
    pub fn read_external_text(&self, uri: &str) -> ContentResult<String> {
        let bytes = self.read_external_reference(uri)?;
        String::from_utf8(bytes).map_err(|err| ContentLoadError::ExternalReference {
            uri: uri.to_string(),
            path: self.get_asset_path(uri),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, err),
        })
    }

    /// Fetch and decode the image referenced by `uri`.
    pub fn read_external_image(&self, uri: &str) -> ContentResult<Surface> {
        let path = self.get_asset_path(uri);
        self.resolver.read_image(&path).map_err(|err| match err {
            image::ImageError::IoError(source) => ContentLoadError::ExternalReference {
                uri: uri.to_string(),
                path,
                source,
            },
            source => ContentLoadError::ImageDecode {
                uri: uri.to_string(),
                source,
            },
        })
    }

    fn construct(&mut self, reader: &dyn ErasedReader, key: &str) -> ContentResult<Rc<dyn Any>> {
        let document = Rc::clone(&self.document);
        let value = document.entry(reader.section(), key)?;
        reader.read_erased(self, key, value)
    }

    /// Evict everything cached by the failed call chain.
    fn rollback(&mut self) {
        for key in self.journal.drain(..) {
            self.cache.remove(&key);
        }
    }
}

fn downcast<T: 'static>(object: Rc<dyn Any>) -> Rc<T> {
    match object.downcast::<T>() {
        Ok(typed) => typed,
        Err(_) => unreachable!("cache entries are keyed by their own TypeId"),
    }
}
