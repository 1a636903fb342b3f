//! Shared helpers for unit tests

use glam::Mat4;
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;

use crate::content::{ContentReader, MemoryResolver};
use crate::document::AssetDocument;

/// Root path every in-memory test document resolves URIs against
pub const TEST_ROOT: &str = "assets";

// ============================================================================
// Content
// ============================================================================

/// Content reader over `document`, with `files` served from memory under
/// [`TEST_ROOT`].
pub fn content_with_files(document: Value, files: &[(&str, Vec<u8>)]) -> ContentReader {
    let mut resolver = MemoryResolver::new();
    for (name, bytes) in files {
        resolver.insert(Path::new(TEST_ROOT).join(name), bytes.clone());
    }
    let document = AssetDocument::from_value(document).expect("test document must be an object");
    ContentReader::new(document, TEST_ROOT, Box::new(resolver))
}

// ============================================================================
// Binary payloads
// ============================================================================

/// Raw `f32` bytes (little-endian on every supported target)
pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

/// Column-major matrix bytes, 64 per matrix
pub fn mat4_bytes(matrices: &[Mat4]) -> Vec<u8> {
    bytemuck::cast_slice(matrices).to_vec()
}

/// A `width` x `height` PNG with a distinct color per pixel.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x * 40) as u8, (y * 40) as u8, 200, 255])
    });
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .expect("PNG encoding");
    png
}
