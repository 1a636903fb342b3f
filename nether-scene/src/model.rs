//! Scene graph builder
//!
//! [`Model::load`] pulls the root nodes out of a [`ContentReader`], flattens
//! the node tree into drawable [`ModelMesh`]es with world transforms, builds
//! one [`Skeleton`] from every skin's skeleton roots, and binds animations to
//! the bones they target.

use glam::Mat4;
use hashbrown::HashMap;
use serde_json::Value;
use std::rc::Rc;

use crate::animation::Animation;
use crate::content::ContentReader;
use crate::document::{DEFAULT_SCENE, SCENES};
use crate::error::{ContentLoadError, ContentResult};
use crate::mesh::{Mesh, ModelMeshPart};
use crate::node::{InstanceSkin, Node};
use crate::skeleton::{BoneId, Skeleton};
use crate::skin::ModelSkin;

/// A mesh placed in the scene.
#[derive(Debug, Clone)]
pub struct ModelMesh {
    node_key: String,
    mesh: Rc<Mesh>,
    transform: Mat4,
    skin: Option<usize>,
}

impl ModelMesh {
    /// Key of the node that instances this mesh
    pub fn node_key(&self) -> &str {
        &self.node_key
    }

    pub fn mesh(&self) -> &Rc<Mesh> {
        &self.mesh
    }

    /// World transform of the instancing node
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Index into [`Model::skins`] when the mesh is skinned
    pub fn skin(&self) -> Option<usize> {
        self.skin
    }
}

/// A skin whose joints have been resolved to bones.
#[derive(Debug, Clone)]
pub struct BoundSkin {
    skin: Rc<ModelSkin>,
    joints: Vec<BoneId>,
}

impl BoundSkin {
    pub fn skin(&self) -> &Rc<ModelSkin> {
        &self.skin
    }

    /// Bone for each joint, in skin order
    pub fn joints(&self) -> &[BoneId] {
        &self.joints
    }

    /// Per-joint skin matrices for the skeleton's current pose.
    pub fn skin_matrices(&self, skeleton: &Skeleton) -> Vec<Mat4> {
        skeleton.skin_matrices(&self.skin, &self.joints)
    }
}

/// A loaded scene: node tree, placed meshes, skeleton, and bound skins.
#[derive(Debug, Clone)]
pub struct Model {
    roots: Vec<Rc<Node>>,
    meshes: Vec<ModelMesh>,
    skeleton: Skeleton,
    skins: Vec<BoundSkin>,
    bones_by_node: HashMap<String, BoneId>,
}

impl Model {
    /// Build the scene held by `content`.
    ///
    /// Roots come from the document's default scene if it names one, then
    /// from the first scene in key order, and otherwise are every node that
    /// no other node lists as a child.
    pub fn load(content: &mut ContentReader) -> ContentResult<Self> {
        let roots = load_roots(content)?;

        let mut builder = SceneBuilder {
            content,
            meshes: Vec::new(),
            skeleton: Skeleton::new(),
            skins: Vec::new(),
            bones_by_node: HashMap::new(),
        };
        for root in &roots {
            builder.visit(root, Mat4::IDENTITY)?;
        }
        builder.bind_animations()?;
        builder.skeleton.update_world_transforms();

        let model = Self {
            roots,
            meshes: builder.meshes,
            skeleton: builder.skeleton,
            skins: builder.skins,
            bones_by_node: builder.bones_by_node,
        };
        tracing::info!(
            "Built model: {} roots, {} meshes, {} bones, {} skins",
            model.roots.len(),
            model.meshes.len(),
            model.skeleton.len(),
            model.skins.len()
        );
        Ok(model)
    }

    pub fn roots(&self) -> &[Rc<Node>] {
        &self.roots
    }

    pub fn meshes(&self) -> &[ModelMesh] {
        &self.meshes
    }

    /// Every mesh part of every placed mesh, in placement order.
    pub fn parts(&self) -> impl Iterator<Item = (&ModelMesh, &ModelMeshPart)> {
        self.meshes
            .iter()
            .flat_map(|mesh| mesh.mesh.parts().iter().map(move |part| (mesh, part)))
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn skeleton_mut(&mut self) -> &mut Skeleton {
        &mut self.skeleton
    }

    pub fn skins(&self) -> &[BoundSkin] {
        &self.skins
    }

    /// Bone built from the node `key`, if that node is part of a skeleton.
    pub fn bone_for_node(&self, key: &str) -> Option<BoneId> {
        self.bones_by_node.get(key).copied()
    }

    /// Advance bound animations and refresh bone transforms for one frame.
    pub fn update(&mut self, delta_time: f32, relative: bool) {
        self.skeleton.update(delta_time, relative);
    }

    /// Step every bound animation to its next keyframe.
    pub fn advance(&mut self) {
        self.skeleton.advance();
    }

    /// Skin matrices of bound skin `index` for the current pose.
    pub fn skin_matrices(&self, index: usize) -> Option<Vec<Mat4>> {
        self.skins
            .get(index)
            .map(|skin| skin.skin_matrices(&self.skeleton))
    }
}

struct SceneBuilder<'a> {
    content: &'a mut ContentReader,
    meshes: Vec<ModelMesh>,
    skeleton: Skeleton,
    skins: Vec<BoundSkin>,
    bones_by_node: HashMap<String, BoneId>,
}

impl SceneBuilder<'_> {
    fn visit(&mut self, node: &Rc<Node>, parent_world: Mat4) -> ContentResult<()> {
        let world = parent_world * node.transform();

        let skin = match node.skin() {
            Some(instance) => Some(self.bind_skin(instance)?),
            None => None,
        };

        for mesh in node.meshes() {
            let skinned = node
                .skin()
                .is_some_and(|instance| instance.meshes().iter().any(|m| Rc::ptr_eq(m, mesh)));
            if !skinned {
                self.place(node, mesh, world, None);
            }
        }
        if let (Some(instance), Some(index)) = (node.skin(), skin) {
            for mesh in instance.meshes() {
                self.place(node, mesh, world, Some(index));
            }
        }

        for child in node.children() {
            self.visit(child, world)?;
        }
        Ok(())
    }

    fn place(&mut self, node: &Node, mesh: &Rc<Mesh>, transform: Mat4, skin: Option<usize>) {
        self.meshes.push(ModelMesh {
            node_key: node.key().to_string(),
            mesh: Rc::clone(mesh),
            transform,
            skin,
        });
    }

    fn bind_skin(&mut self, instance: &InstanceSkin) -> ContentResult<usize> {
        let mut roots = Vec::with_capacity(instance.skeletons().len());
        for key in instance.skeletons() {
            let root = self.content.read_object::<Node>(key)?;
            roots.push(self.add_bones(&root, None)?);
        }

        let skin = instance.skin();
        let joints = skin
            .joint_names()
            .iter()
            .map(|joint| {
                let found = if roots.is_empty() {
                    self.skeleton.find(joint)
                } else {
                    roots
                        .iter()
                        .find_map(|&root| self.skeleton.find_under(root, joint))
                };
                found.ok_or_else(|| ContentLoadError::UnknownJoint {
                    skin: skin.name().to_string(),
                    joint: joint.clone(),
                })
            })
            .collect::<ContentResult<Vec<_>>>()?;

        tracing::debug!("Bound skin `{}` to {} joints", skin.name(), joints.len());
        self.skins.push(BoundSkin {
            skin: Rc::clone(skin),
            joints,
        });
        Ok(self.skins.len() - 1)
    }

    /// Add `node` and its subtree as bones and return the bone for `node`.
    /// Nodes already in the skeleton (shared by several skins) are reused.
    fn add_bones(&mut self, node: &Rc<Node>, parent: Option<BoneId>) -> ContentResult<BoneId> {
        if let Some(&id) = self.bones_by_node.get(node.key()) {
            return Ok(id);
        }

        let id = self
            .skeleton
            .add_bone(node.bone_name(), node.transform(), parent)?;
        self.bones_by_node.insert(node.key().to_string(), id);

        for child in node.children() {
            self.add_bones(child, Some(id))?;
        }
        Ok(id)
    }

    fn bind_animations(&mut self) -> ContentResult<()> {
        for animation in self.content.read_all::<Animation>()? {
            let Some(target) = animation.target() else {
                tracing::debug!("Animation `{}` has no target", animation.name());
                continue;
            };
            match self.bones_by_node.get(target) {
                Some(&bone) => {
                    self.skeleton.bind_animation(bone, Animation::clone(&animation))?;
                }
                None => {
                    tracing::debug!(
                        "Animation `{}` targets `{}`, which is not a bone",
                        animation.name(),
                        target
                    );
                }
            }
        }
        Ok(())
    }
}

fn load_roots(content: &mut ContentReader) -> ContentResult<Vec<Rc<Node>>> {
    let document = content.document();
    let scene_key = match document.get(DEFAULT_SCENE) {
        Some(Value::String(key)) => Some(key.clone()),
        Some(other) => {
            return Err(ContentLoadError::invalid_entry(
                DEFAULT_SCENE,
                DEFAULT_SCENE,
                format!("expected a scene key, found {}", crate::document::json_kind(other)),
            ));
        }
        None => document.keys(SCENES).first().map(|key| key.to_string()),
    };

    let Some(scene_key) = scene_key else {
        let nodes = content.read_all::<Node>()?;
        let children: hashbrown::HashSet<&str> = nodes
            .iter()
            .flat_map(|node| node.children().iter().map(|child| child.key()))
            .collect();
        return Ok(nodes
            .iter()
            .filter(|node| !children.contains(node.key()))
            .cloned()
            .collect());
    };

    let scene = document.entry(SCENES, &scene_key)?;
    let keys: Vec<String> = match scene.get("nodes") {
        Some(nodes) => serde_json::from_value(nodes.clone()).map_err(|err| {
            ContentLoadError::invalid_entry(SCENES, &scene_key, err.to_string())
        })?,
        None => Vec::new(),
    };
    tracing::debug!("Scene `{}` has {} root nodes", scene_key, keys.len());

    keys.iter()
        .map(|key| content.read_object::<Node>(key))
        .collect()
}
