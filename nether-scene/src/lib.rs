//! Scene asset loading and skeletal animation for Nethercore
//!
//! This crate turns a JSON scene document (buffers, buffer views, accessors,
//! nodes, skins, meshes, materials, textures, animations) into a typed,
//! cross-referenced object graph, and evaluates skinned skeletons at runtime.
//!
//! # Modules
//!
//! - [`content`] - Content reader, reader registry, and external reference resolution
//! - [`data`] - Buffer / buffer view / accessor data access
//! - [`document`] - The parsed asset document and its section names
//! - [`node`], [`skin`], [`mesh`], [`material`], [`texture`] - Loaded scene entities
//! - [`animation`] - Keyframe timelines and playback state
//! - [`skeleton`] - Bone arena and skin-matrix computation
//! - [`model`] - Scene graph builder
//! - [`config`] - Loader configuration
//!
//! # Example
//!
//! ```no_run
//! use nether_scene::{ContentConfig, ContentReader, Model};
//!
//! let mut content = ContentReader::open("assets/hero.gltf".as_ref(), ContentConfig::default())?;
//! let mut model = Model::load(&mut content)?;
//!
//! model.update(16.0, true);
//! let joints = model.skin_matrices(0).unwrap_or_default();
//! # Ok::<(), nether_scene::ContentLoadError>(())
//! ```

pub mod animation;
pub mod config;
pub mod content;
pub mod data;
pub mod document;
pub mod error;
pub mod material;
pub mod mesh;
pub mod model;
pub mod node;
pub mod skeleton;
pub mod skin;
pub mod texture;

#[cfg(test)]
pub(crate) mod test_utils;

pub use animation::{Animation, EndBehavior, Keyframe, PlaybackState};
pub use config::ContentConfig;
pub use content::{
    ContentReader, ExternalReferenceResolver, FileResolver, MemoryResolver, ReaderRegistry,
    TypeReader,
};
pub use data::{Accessor, AttributeType, Buffer, BufferView, ComponentType};
pub use document::AssetDocument;
pub use error::{ContentLoadError, ContentResult};
pub use model::{BoundSkin, Model, ModelMesh};
pub use node::{InstanceSkin, Node};
pub use skeleton::{Bone, BoneId, Skeleton};
pub use skin::ModelSkin;
