//! Built-in readers, one per asset kind
//!
//! Each reader deserializes its entry into a small serde struct, resolves
//! referenced entries through the [`ContentReader`](super::ContentReader),
//! and constructs the entity through its public constructor.

mod animation;
mod data;
mod material;
mod scene;
mod texture;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ReaderRegistry;
use crate::error::{ContentLoadError, ContentResult};

pub use animation::AnimationReader;
pub use data::{AccessorReader, BufferReader, BufferViewReader};
pub use material::{MaterialReader, ProgramReader, ShaderReader};
pub use scene::{MeshReader, NodeReader, SkinReader};
pub use texture::{ImageReader, SamplerReader, TextureReader};

/// Register a reader for every built-in asset kind.
pub fn register_builtin(registry: &mut ReaderRegistry) {
    registry.register(BufferReader);
    registry.register(BufferViewReader);
    registry.register(AccessorReader);
    registry.register(NodeReader);
    registry.register(SkinReader);
    registry.register(MeshReader);
    registry.register(AnimationReader);
    registry.register(MaterialReader);
    registry.register(ProgramReader);
    registry.register(ShaderReader);
    registry.register(SamplerReader);
    registry.register(TextureReader);
    registry.register(ImageReader);
}

/// Deserialize one entry, reporting shape errors against the entry.
fn parse<D: DeserializeOwned>(section: &str, key: &str, value: &Value) -> ContentResult<D> {
    D::deserialize(value).map_err(|err| ContentLoadError::invalid_entry(section, key, err.to_string()))
}
