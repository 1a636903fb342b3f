//! External reference resolution
//!
//! Binary payloads, shader sources, and images are referenced by URI and
//! fetched through an [`ExternalReferenceResolver`]. The content reader turns
//! URIs into paths; the resolver only fetches.

use hashbrown::HashMap;
use image::ImageError;
use std::io;
use std::path::{Path, PathBuf};

use crate::texture::Surface;

/// Fetches external content for the content reader.
pub trait ExternalReferenceResolver {
    /// Read the raw bytes at `path`.
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Read and decode an image into an RGBA8 surface.
    fn read_image(&self, path: &Path) -> Result<Surface, ImageError> {
        let bytes = self.read_bytes(path).map_err(ImageError::IoError)?;
        let decoded = image::load_from_memory(&bytes)?.to_rgba8();
        let (width, height) = decoded.dimensions();
        Ok(Surface::from_rgba8(width, height, decoded.into_raw()))
    }
}

/// Resolver backed by the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileResolver;

impl ExternalReferenceResolver for FileResolver {
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Resolver backed by an in-memory map of path to bytes.
///
/// Useful for embedded assets and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_file(mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }
}

impl ExternalReferenceResolver for MemoryResolver {
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no in-memory file at {}", path.display()),
            )
        })
    }
}
