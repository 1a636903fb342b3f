//! Type reader registry
//!
//! Maps a requested result type to the reader that builds it from one
//! document entry. This is the only dynamic dispatch point in the loading
//! pipeline: supporting a new asset kind means registering one reader.

use hashbrown::HashMap;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::rc::Rc;

use super::ContentReader;
use crate::error::ContentResult;

/// Builds one asset kind from its document entry.
///
/// Readers are pure with respect to the JSON value they are given. Nested
/// references, caching, and external I/O all go through the
/// [`ContentReader`] handle.
///
/// # Example
///
/// ```ignore
/// struct LightReader;
///
/// impl TypeReader for LightReader {
///     type Output = Light;
///
///     fn section(&self) -> &'static str { "lights" }
///
///     fn read(&self, content: &mut ContentReader, key: &str, value: &Value) -> ContentResult<Light> {
///         // ...
///     }
/// }
///
/// registry.register(LightReader);
/// ```
pub trait TypeReader: 'static {
    /// Type produced by this reader
    type Output: 'static;

    /// Document section holding entries of this type.
    fn section(&self) -> &'static str;

    /// Build an instance from the entry `key` whose JSON is `value`.
    fn read(
        &self,
        content: &mut ContentReader,
        key: &str,
        value: &Value,
    ) -> ContentResult<Self::Output>;
}

/// Object-safe form of [`TypeReader`] stored in the registry.
pub(crate) trait ErasedReader {
    fn section(&self) -> &'static str;

    fn type_name(&self) -> &'static str;

    fn read_erased(
        &self,
        content: &mut ContentReader,
        key: &str,
        value: &Value,
    ) -> ContentResult<Rc<dyn Any>>;
}

struct Erased<R>(R);

impl<R: TypeReader> ErasedReader for Erased<R> {
    fn section(&self) -> &'static str {
        self.0.section()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<R::Output>()
    }

    fn read_erased(
        &self,
        content: &mut ContentReader,
        key: &str,
        value: &Value,
    ) -> ContentResult<Rc<dyn Any>> {
        let object: Rc<dyn Any> = Rc::new(self.0.read(content, key, value)?);
        Ok(object)
    }
}

/// Registry of readers keyed by the type they produce.
#[derive(Default)]
pub struct ReaderRegistry {
    readers: HashMap<TypeId, Rc<dyn ErasedReader>>,
}

impl ReaderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with a reader for every built-in asset kind.
    pub fn with_builtin_readers() -> Self {
        let mut registry = Self::new();
        super::readers::register_builtin(&mut registry);
        registry
    }

    /// Register a reader, replacing any previous reader for the same type.
    pub fn register<R: TypeReader>(&mut self, reader: R) {
        let previous = self
            .readers
            .insert(TypeId::of::<R::Output>(), Rc::new(Erased(reader)));
        if previous.is_some() {
            tracing::debug!(
                "Replaced reader for {}",
                std::any::type_name::<R::Output>()
            );
        }
    }

    /// Whether a reader producing `T` is registered.
    pub fn contains<T: 'static>(&self) -> bool {
        self.readers.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered readers
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// Section that entries of `T` are read from.
    pub fn section_of<T: 'static>(&self) -> Option<&'static str> {
        self.readers
            .get(&TypeId::of::<T>())
            .map(|reader| reader.section())
    }

    pub(crate) fn get(&self, type_id: TypeId) -> Option<Rc<dyn ErasedReader>> {
        self.readers.get(&type_id).cloned()
    }
}
