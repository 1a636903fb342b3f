//! Scene graph nodes

use glam::Mat4;
use std::rc::Rc;

use crate::mesh::Mesh;
use crate::skin::ModelSkin;

/// A skin instanced on a node.
///
/// Skeleton roots are kept as node keys. They are linked to bones by the
/// scene builder once the node tree is complete, so a skeleton may live
/// anywhere in the tree (including above the skinned node).
#[derive(Debug, Clone)]
pub struct InstanceSkin {
    skin: Rc<ModelSkin>,
    skeletons: Vec<String>,
    meshes: Vec<Rc<Mesh>>,
}

impl InstanceSkin {
    pub fn new(skin: Rc<ModelSkin>, skeletons: Vec<String>, meshes: Vec<Rc<Mesh>>) -> Self {
        Self {
            skin,
            skeletons,
            meshes,
        }
    }

    pub fn skin(&self) -> &Rc<ModelSkin> {
        &self.skin
    }

    /// Keys of the skeleton root nodes
    pub fn skeletons(&self) -> &[String] {
        &self.skeletons
    }

    /// Meshes deformed by this skin
    pub fn meshes(&self) -> &[Rc<Mesh>] {
        &self.meshes
    }
}

/// One element of the scene graph.
#[derive(Debug, Clone)]
pub struct Node {
    key: String,
    name: Option<String>,
    transform: Mat4,
    camera: Option<String>,
    light: Option<String>,
    meshes: Vec<Rc<Mesh>>,
    skin: Option<InstanceSkin>,
    joint_name: Option<String>,
    children: Vec<Rc<Node>>,
}

impl Node {
    /// A node with an identity transform and no references.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: None,
            transform: Mat4::IDENTITY,
            camera: None,
            light: None,
            meshes: Vec::new(),
            skin: None,
            joint_name: None,
            children: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_camera(mut self, camera: impl Into<String>) -> Self {
        self.camera = Some(camera.into());
        self
    }

    pub fn with_light(mut self, light: impl Into<String>) -> Self {
        self.light = Some(light.into());
        self
    }

    pub fn with_meshes(mut self, meshes: Vec<Rc<Mesh>>) -> Self {
        self.meshes = meshes;
        self
    }

    pub fn with_skin(mut self, skin: InstanceSkin) -> Self {
        self.skin = Some(skin);
        self
    }

    pub fn with_joint_name(mut self, joint_name: impl Into<String>) -> Self {
        self.joint_name = Some(joint_name.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Rc<Node>>) -> Self {
        self.children = children;
        self
    }

    /// Document key of this node
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Local transform relative to the parent
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn camera(&self) -> Option<&str> {
        self.camera.as_deref()
    }

    pub fn light(&self) -> Option<&str> {
        self.light.as_deref()
    }

    pub fn meshes(&self) -> &[Rc<Mesh>] {
        &self.meshes
    }

    pub fn skin(&self) -> Option<&InstanceSkin> {
        self.skin.as_ref()
    }

    /// Joint name this node answers to when used as a bone
    pub fn joint_name(&self) -> Option<&str> {
        self.joint_name.as_deref()
    }

    pub fn children(&self) -> &[Rc<Node>] {
        &self.children
    }

    /// Name used when this node becomes a bone: the joint name, then the
    /// node name, then the key.
    pub fn bone_name(&self) -> &str {
        self.joint_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(&self.key)
    }
}
