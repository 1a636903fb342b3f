//! Content loading
//!
//! - [`ContentReader`] walks the asset document and caches shared objects.
//! - [`ReaderRegistry`] maps result types to [`TypeReader`]s.
//! - [`ExternalReferenceResolver`] fetches URIs (files, in-memory blobs, images).
//! - [`readers`] holds the built-in reader for every asset kind.

mod reader;
pub mod readers;
mod registry;
mod resolver;

pub use reader::ContentReader;
pub use registry::{ReaderRegistry, TypeReader};
pub use resolver::{ExternalReferenceResolver, FileResolver, MemoryResolver};
