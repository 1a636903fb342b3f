//! Mesh geometry
//!
//! A [`Mesh`] is a list of [`ModelMeshPart`]s. Each part binds vertex
//! attribute accessors, an optional index accessor, and a material.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::data::Accessor;
use crate::material::Material;

/// Well-known attribute semantics
pub const POSITION: &str = "POSITION";
pub const NORMAL: &str = "NORMAL";
pub const TEXCOORD_0: &str = "TEXCOORD_0";
pub const JOINT: &str = "JOINT";
pub const WEIGHT: &str = "WEIGHT";

/// Primitive topology (GL enum codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "u32")]
#[repr(u32)]
pub enum PrimitiveMode {
    Points = 0,
    Lines = 1,
    LineLoop = 2,
    LineStrip = 3,
    #[default]
    Triangles = 4,
    TriangleStrip = 5,
    TriangleFan = 6,
}

impl TryFrom<u32> for PrimitiveMode {
    type Error = String;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Points,
            1 => Self::Lines,
            2 => Self::LineLoop,
            3 => Self::LineStrip,
            4 => Self::Triangles,
            5 => Self::TriangleStrip,
            6 => Self::TriangleFan,
            other => return Err(format!("unknown primitive mode {}", other)),
        })
    }
}

/// One drawable batch of a mesh.
#[derive(Debug, Clone, Default)]
pub struct ModelMeshPart {
    mode: PrimitiveMode,
    attributes: BTreeMap<String, Rc<Accessor>>,
    indices: Option<Rc<Accessor>>,
    material: Option<Rc<Material>>,
}

impl ModelMeshPart {
    pub fn new(mode: PrimitiveMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, semantic: impl Into<String>, accessor: Rc<Accessor>) -> Self {
        self.attributes.insert(semantic.into(), accessor);
        self
    }

    pub fn with_indices(mut self, indices: Rc<Accessor>) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_material(mut self, material: Rc<Material>) -> Self {
        self.material = Some(material);
        self
    }

    pub fn mode(&self) -> PrimitiveMode {
        self.mode
    }

    pub fn attribute(&self, semantic: &str) -> Option<&Rc<Accessor>> {
        self.attributes.get(semantic)
    }

    /// Attributes in semantic order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Rc<Accessor>)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn indices(&self) -> Option<&Rc<Accessor>> {
        self.indices.as_ref()
    }

    pub fn material(&self) -> Option<&Rc<Material>> {
        self.material.as_ref()
    }

    /// Vertex count, taken from the `POSITION` attribute.
    pub fn vertex_count(&self) -> usize {
        self.attribute(POSITION).map_or(0, |a| a.count())
    }

    /// Number of indices, or the vertex count for non-indexed parts.
    pub fn element_count(&self) -> usize {
        self.indices
            .as_ref()
            .map_or_else(|| self.vertex_count(), |a| a.count())
    }

    /// Whether the part carries skinning attributes.
    pub fn is_skinned(&self) -> bool {
        self.attributes.contains_key(JOINT) && self.attributes.contains_key(WEIGHT)
    }
}

/// A named list of mesh parts.
#[derive(Debug, Clone)]
pub struct Mesh {
    name: String,
    parts: Vec<ModelMeshPart>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, parts: Vec<ModelMeshPart>) -> Self {
        Self {
            name: name.into(),
            parts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parts(&self) -> &[ModelMeshPart] {
        &self.parts
    }
}
