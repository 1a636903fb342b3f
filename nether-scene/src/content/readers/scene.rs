//! Node, skin, and mesh readers

use glam::{Mat4, Quat, Vec3};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::parse;
use crate::content::{ContentReader, TypeReader};
use crate::data::Accessor;
use crate::document::{MESHES, NODES, SKINS};
use crate::error::{ContentLoadError, ContentResult};
use crate::material::Material;
use crate::mesh::{Mesh, ModelMeshPart, PrimitiveMode};
use crate::node::{InstanceSkin, Node};
use crate::skin::ModelSkin;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceSkinEntry {
    skin: String,
    #[serde(default)]
    skeletons: Vec<String>,
    #[serde(default)]
    meshes: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeEntry {
    name: Option<String>,
    #[serde(default)]
    children: Vec<String>,
    matrix: Option<[f32; 16]>,
    translation: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
    #[serde(default)]
    meshes: Vec<String>,
    camera: Option<String>,
    light: Option<String>,
    joint_name: Option<String>,
    skin: Option<String>,
    #[serde(default)]
    skeletons: Vec<String>,
    instance_skin: Option<InstanceSkinEntry>,
}

impl NodeEntry {
    /// Local transform: the explicit matrix, else T * R * S.
    fn transform(&self, key: &str) -> ContentResult<Mat4> {
        if let Some(matrix) = &self.matrix {
            return Ok(Mat4::from_cols_array(matrix));
        }

        let translation = self.translation.map(Vec3::from_array).unwrap_or(Vec3::ZERO);
        let scale = self.scale.map(Vec3::from_array).unwrap_or(Vec3::ONE);
        let rotation = match self.rotation {
            Some(xyzw) => {
                let rotation = Quat::from_array(xyzw);
                if rotation.length_squared() == 0.0 || !rotation.is_finite() {
                    return Err(ContentLoadError::invalid_entry(
                        NODES,
                        key,
                        format!("rotation {:?} is not a valid quaternion", xyzw),
                    ));
                }
                rotation.normalize()
            }
            None => Quat::IDENTITY,
        };

        Ok(Mat4::from_scale_rotation_translation(
            scale,
            rotation,
            translation,
        ))
    }
}

fn read_meshes(content: &mut ContentReader, keys: &[String]) -> ContentResult<Vec<Rc<Mesh>>> {
    keys.iter()
        .map(|key| content.read_object::<Mesh>(key))
        .collect()
}

/// Reads `nodes` entries, resolving children, meshes, and skins on demand.
pub struct NodeReader;

impl TypeReader for NodeReader {
    type Output = Node;

    fn section(&self) -> &'static str {
        NODES
    }

    fn read(&self, content: &mut ContentReader, key: &str, value: &Value) -> ContentResult<Node> {
        let entry: NodeEntry = parse(NODES, key, value)?;
        let transform = entry.transform(key)?;
        let meshes = read_meshes(content, &entry.meshes)?;

        let skin = match (&entry.instance_skin, &entry.skin) {
            (Some(instance), _) => Some(InstanceSkin::new(
                content.read_object::<ModelSkin>(&instance.skin)?,
                instance.skeletons.clone(),
                read_meshes(content, &instance.meshes)?,
            )),
            // Flat form: the node's own meshes are the skinned ones
            (None, Some(skin)) => Some(InstanceSkin::new(
                content.read_object::<ModelSkin>(skin)?,
                entry.skeletons.clone(),
                meshes.clone(),
            )),
            (None, None) => None,
        };

        let children = entry
            .children
            .iter()
            .map(|child| content.read_object::<Node>(child))
            .collect::<ContentResult<Vec<_>>>()?;

        let mut node = Node::new(key)
            .with_transform(transform)
            .with_meshes(meshes)
            .with_children(children);
        if let Some(name) = entry.name {
            node = node.with_name(name);
        }
        if let Some(camera) = entry.camera {
            node = node.with_camera(camera);
        }
        if let Some(light) = entry.light {
            node = node.with_light(light);
        }
        if let Some(joint_name) = entry.joint_name {
            node = node.with_joint_name(joint_name);
        }
        if let Some(skin) = skin {
            node = node.with_skin(skin);
        }
        Ok(node)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SkinEntry {
    name: Option<String>,
    bind_shape_matrix: Option<[f32; 16]>,
    inverse_bind_matrices: String,
    joint_names: Vec<String>,
}

/// Reads `skins` entries.
pub struct SkinReader;

impl TypeReader for SkinReader {
    type Output = ModelSkin;

    fn section(&self) -> &'static str {
        SKINS
    }

    fn read(
        &self,
        content: &mut ContentReader,
        key: &str,
        value: &Value,
    ) -> ContentResult<ModelSkin> {
        let entry: SkinEntry = parse(SKINS, key, value)?;
        let bind_shape_matrix = entry
            .bind_shape_matrix
            .map(|m| Mat4::from_cols_array(&m))
            .unwrap_or(Mat4::IDENTITY);
        let inverse_bind_matrices = content
            .read_object::<Accessor>(&entry.inverse_bind_matrices)?
            .read_mat4()?;

        ModelSkin::new(
            entry.name.as_deref().unwrap_or(key),
            bind_shape_matrix,
            inverse_bind_matrices,
            entry.joint_names,
        )
    }
}

#[derive(Deserialize)]
struct PrimitiveEntry {
    #[serde(default)]
    attributes: BTreeMap<String, String>,
    indices: Option<String>,
    material: Option<String>,
    #[serde(default)]
    mode: PrimitiveMode,
}

#[derive(Deserialize)]
struct MeshEntry {
    name: Option<String>,
    #[serde(default)]
    primitives: Vec<PrimitiveEntry>,
}

/// Reads `meshes` entries into mesh parts.
pub struct MeshReader;

impl TypeReader for MeshReader {
    type Output = Mesh;

    fn section(&self) -> &'static str {
        MESHES
    }

    fn read(&self, content: &mut ContentReader, key: &str, value: &Value) -> ContentResult<Mesh> {
        let entry: MeshEntry = parse(MESHES, key, value)?;

        let mut parts = Vec::with_capacity(entry.primitives.len());
        for primitive in &entry.primitives {
            let mut part = ModelMeshPart::new(primitive.mode);
            for (semantic, accessor) in &primitive.attributes {
                part = part.with_attribute(semantic, content.read_object::<Accessor>(accessor)?);
            }
            if let Some(indices) = &primitive.indices {
                part = part.with_indices(content.read_object::<Accessor>(indices)?);
            }
            if let Some(material) = &primitive.material {
                part = part.with_material(content.read_object::<Material>(material)?);
            }
            parts.push(part);
        }

        Ok(Mesh::new(entry.name.as_deref().unwrap_or(key), parts))
    }
}
