//! Bone hierarchy
//!
//! A [`Skeleton`] is an arena of [`Bone`]s addressed by [`BoneId`]. Child
//! lists are owning edges (arena indices); the parent link is an observing
//! edge. A parent has to exist before a child can name it, so arena order is
//! always parent-before-child and the hierarchy cannot contain cycles.
//!
//! A skeleton can hold several bone trees. Names are unique within a tree, so
//! two copies of one character can both have a `"hip"`.
//!
//! Each frame, [`Skeleton::update`] advances the bound animations, copies
//! their active keyframe into the bones' local transforms, and recomputes
//! world transforms in arena order. A bone's world transform is therefore
//! never read before its parent's has been refreshed.

use glam::Mat4;
use hashbrown::HashMap;

use crate::animation::Animation;
use crate::error::{ContentLoadError, ContentResult};
use crate::skin::ModelSkin;

/// Index of a bone within its skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneId(pub usize);

/// One joint of a skeleton.
#[derive(Debug, Clone)]
pub struct Bone {
    index: BoneId,
    name: String,
    local_transform: Mat4,
    world_transform: Mat4,
    root: BoneId,
    parent: Option<BoneId>,
    children: Vec<BoneId>,
    animation: Option<Animation>,
}

impl Bone {
    pub fn index(&self) -> BoneId {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transform relative to the parent bone
    pub fn local_transform(&self) -> Mat4 {
        self.local_transform
    }

    /// Transform relative to the skeleton root, as of the last refresh
    pub fn world_transform(&self) -> Mat4 {
        self.world_transform
    }

    pub fn parent(&self) -> Option<BoneId> {
        self.parent
    }

    /// Root of the tree this bone belongs to
    pub fn root(&self) -> BoneId {
        self.root
    }

    pub fn children(&self) -> &[BoneId] {
        &self.children
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    pub fn animation_mut(&mut self) -> Option<&mut Animation> {
        self.animation.as_mut()
    }
}

/// Arena of bones in parent-before-child order.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
    by_name: HashMap<(BoneId, String), BoneId>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bone under `parent` (or as a new tree root).
    ///
    /// Fails if the parent is not already in this skeleton or the name is
    /// taken within the parent's tree.
    pub fn add_bone(
        &mut self,
        name: impl Into<String>,
        local_transform: Mat4,
        parent: Option<BoneId>,
    ) -> ContentResult<BoneId> {
        let name = name.into();
        let id = BoneId(self.bones.len());

        let (root, parent_world) = match parent {
            None => (id, Mat4::IDENTITY),
            Some(parent_id) => match self.bones.get(parent_id.0) {
                Some(parent) => (parent.root, parent.world_transform),
                None => {
                    return Err(ContentLoadError::InvalidBone {
                        name,
                        message: format!("parent bone {} does not exist", parent_id.0),
                    });
                }
            },
        };

        let tree_key = (root, name);
        if self.by_name.contains_key(&tree_key) {
            return Err(ContentLoadError::InvalidBone {
                name: tree_key.1,
                message: "a bone with this name already exists in its tree".to_string(),
            });
        }

        if let Some(parent) = parent {
            self.bones[parent.0].children.push(id);
        }
        let name = tree_key.1.clone();
        self.by_name.insert(tree_key, id);
        self.bones.push(Bone {
            index: id,
            name,
            local_transform,
            world_transform: parent_world * local_transform,
            root,
            parent,
            children: Vec::new(),
            animation: None,
        });
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.0)
    }

    pub fn bone_mut(&mut self, id: BoneId) -> Option<&mut Bone> {
        self.bones.get_mut(id.0)
    }

    /// Bones in parent-before-child order
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// First bone named `name` in any tree, in arena order.
    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.bones
            .iter()
            .find(|bone| bone.name == name)
            .map(|bone| bone.index)
    }

    /// Bone named `name` in the subtree under `root` (inclusive).
    pub fn find_under(&self, root: BoneId, name: &str) -> Option<BoneId> {
        let top = self.bones.get(root.0)?;
        let id = *self.by_name.get(&(top.root, name.to_string()))?;

        // Walk up from the match; it counts only if `root` is an ancestor
        let mut current = Some(id);
        while let Some(bone) = current {
            if bone == root {
                return Some(id);
            }
            current = self.bones[bone.0].parent;
        }
        None
    }

    /// Bones without a parent
    pub fn roots(&self) -> impl Iterator<Item = BoneId> + '_ {
        self.bones
            .iter()
            .filter(|bone| bone.parent.is_none())
            .map(|bone| bone.index)
    }

    /// Set a bone's local transform. World transforms are refreshed on the
    /// next [`update_world_transforms`](Self::update_world_transforms).
    pub fn set_local_transform(&mut self, id: BoneId, transform: Mat4) {
        if let Some(bone) = self.bones.get_mut(id.0) {
            bone.local_transform = transform;
        }
    }

    /// Bind `animation` to a bone, replacing any previous binding.
    ///
    /// The bone's local transform follows the animation's active keyframe.
    pub fn bind_animation(&mut self, id: BoneId, animation: Animation) -> ContentResult<()> {
        let Some(bone) = self.bones.get_mut(id.0) else {
            return Err(ContentLoadError::InvalidBone {
                name: format!("#{}", id.0),
                message: "cannot bind an animation to a missing bone".to_string(),
            });
        };
        bone.local_transform = animation.current_keyframe().transform();
        if let Some(previous) = bone.animation.replace(animation) {
            tracing::debug!(
                "Bone `{}` rebound from animation `{}`",
                bone.name,
                previous.name()
            );
        }
        Ok(())
    }

    /// Advance every bound animation and refresh world transforms.
    pub fn update(&mut self, delta_time: f32, relative: bool) {
        for bone in &mut self.bones {
            if let Some(animation) = &mut bone.animation {
                animation.update(delta_time, relative);
                bone.local_transform = animation.current_keyframe().transform();
            }
        }
        self.update_world_transforms();
    }

    /// Step every bound animation one keyframe and refresh world transforms.
    pub fn advance(&mut self) {
        for bone in &mut self.bones {
            if let Some(animation) = &mut bone.animation {
                animation.advance();
                bone.local_transform = animation.current_keyframe().transform();
            }
        }
        self.update_world_transforms();
    }

    /// Return every bound animation to its first keyframe.
    pub fn reset(&mut self) {
        for bone in &mut self.bones {
            if let Some(animation) = &mut bone.animation {
                animation.reset();
                bone.local_transform = animation.current_keyframe().transform();
            }
        }
        self.update_world_transforms();
    }

    /// Recompute `world = parent_world * local` for every bone.
    pub fn update_world_transforms(&mut self) {
        for i in 0..self.bones.len() {
            let parent_world = match self.bones[i].parent {
                Some(parent) => self.bones[parent.0].world_transform,
                None => Mat4::IDENTITY,
            };
            let bone = &mut self.bones[i];
            bone.world_transform = parent_world * bone.local_transform;
        }
    }

    pub fn world_transform(&self, id: BoneId) -> Option<Mat4> {
        self.bones.get(id.0).map(|bone| bone.world_transform)
    }

    /// Skin matrices for `skin`, whose joints map to `joints` in order.
    ///
    /// Joint `i` gets `world(joints[i]) * inverse_bind[i] * bind_shape`.
    /// Unknown joint ids fall back to the identity world transform.
    pub fn skin_matrices(&self, skin: &ModelSkin, joints: &[BoneId]) -> Vec<Mat4> {
        let bind_shape = skin.bind_shape_matrix();
        joints
            .iter()
            .zip(skin.inverse_bind_matrices())
            .map(|(&joint, inverse_bind)| {
                let world = self.world_transform(joint).unwrap_or(Mat4::IDENTITY);
                world * *inverse_bind * bind_shape
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{EndBehavior, Keyframe};
    use glam::Vec3;

    fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(x, y, z))
    }

    fn chain() -> (Skeleton, [BoneId; 3]) {
        let mut skeleton = Skeleton::new();
        let root = skeleton.add_bone("root", translation(1.0, 0.0, 0.0), None).unwrap();
        let mid = skeleton
            .add_bone("mid", translation(0.0, 2.0, 0.0), Some(root))
            .unwrap();
        let leaf = skeleton
            .add_bone("leaf", translation(0.0, 0.0, 3.0), Some(mid))
            .unwrap();
        (skeleton, [root, mid, leaf])
    }

    #[test]
    fn test_three_level_chain_sums_translations() {
        let (mut skeleton, [_, _, leaf]) = chain();
        skeleton.update_world_transforms();

        let world = skeleton.world_transform(leaf).unwrap();
        assert!(
            world
                .w_axis
                .truncate()
                .abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6)
        );
    }

    #[test]
    fn test_hierarchy_links() {
        let (skeleton, [root, mid, leaf]) = chain();
        assert_eq!(skeleton.len(), 3);
        assert_eq!(skeleton.bone(root).unwrap().children(), &[mid]);
        assert_eq!(skeleton.bone(leaf).unwrap().parent(), Some(mid));
        assert_eq!(skeleton.roots().collect::<Vec<_>>(), vec![root]);
        assert_eq!(skeleton.find("mid"), Some(mid));
        assert!(skeleton.find("tail").is_none());
    }

    #[test]
    fn test_parent_must_exist() {
        let mut skeleton = Skeleton::new();
        let result = skeleton.add_bone("orphan", Mat4::IDENTITY, Some(BoneId(4)));
        assert!(matches!(result, Err(ContentLoadError::InvalidBone { .. })));
        assert!(skeleton.is_empty());
    }

    #[test]
    fn test_duplicate_names_rejected_within_tree() {
        let (mut skeleton, [_, _, leaf]) = chain();
        let result = skeleton.add_bone("mid", Mat4::IDENTITY, Some(leaf));
        assert!(matches!(result, Err(ContentLoadError::InvalidBone { .. })));
        assert_eq!(skeleton.len(), 3);
    }

    #[test]
    fn test_same_names_allowed_in_separate_trees() {
        let (mut skeleton, [root, mid, leaf]) = chain();
        let other_root = skeleton.add_bone("root", Mat4::IDENTITY, None).unwrap();
        let other_mid = skeleton
            .add_bone("mid", Mat4::IDENTITY, Some(other_root))
            .unwrap();

        assert_eq!(skeleton.bone(other_mid).unwrap().root(), other_root);
        assert_eq!(skeleton.bone(leaf).unwrap().root(), root);
        assert_eq!(skeleton.find_under(root, "mid"), Some(mid));
        assert_eq!(skeleton.find_under(other_root, "mid"), Some(other_mid));
        assert_eq!(skeleton.find("mid"), Some(mid));
    }

    #[test]
    fn test_find_under_is_scoped_to_subtree() {
        let (skeleton, [root, mid, leaf]) = chain();
        assert_eq!(skeleton.find_under(mid, "leaf"), Some(leaf));
        assert_eq!(skeleton.find_under(mid, "mid"), Some(mid));
        // `root` sits above `mid`, outside its subtree
        assert!(skeleton.find_under(mid, "root").is_none());
        assert!(skeleton.find_under(root, "tail").is_none());
        assert!(skeleton.find_under(BoneId(9), "root").is_none());
    }

    #[test]
    fn test_parent_change_propagates_to_descendants() {
        let (mut skeleton, [root, _, leaf]) = chain();
        skeleton.set_local_transform(root, translation(10.0, 0.0, 0.0));
        skeleton.update_world_transforms();

        let world = skeleton.world_transform(leaf).unwrap();
        assert!(
            world
                .w_axis
                .truncate()
                .abs_diff_eq(Vec3::new(10.0, 2.0, 3.0), 1e-6)
        );
    }

    #[test]
    fn test_bound_animation_drives_bone() {
        let (mut skeleton, [root, _, leaf]) = chain();
        let animation = Animation::new(
            "sway",
            vec![
                Keyframe::new(0.0, translation(1.0, 0.0, 0.0)),
                Keyframe::new(100.0, translation(5.0, 0.0, 0.0)),
            ],
            EndBehavior::Clamp,
        )
        .unwrap();
        skeleton.bind_animation(root, animation).unwrap();

        skeleton.update(120.0, true);
        let world = skeleton.world_transform(leaf).unwrap();
        assert!(
            world
                .w_axis
                .truncate()
                .abs_diff_eq(Vec3::new(5.0, 2.0, 3.0), 1e-6)
        );

        skeleton.reset();
        let world = skeleton.world_transform(leaf).unwrap();
        assert!(
            world
                .w_axis
                .truncate()
                .abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6)
        );
    }

    #[test]
    fn test_advance_steps_bound_animations() {
        let (mut skeleton, [root, ..]) = chain();
        let animation = Animation::new(
            "steps",
            vec![
                Keyframe::new(0.0, Mat4::IDENTITY),
                Keyframe::new(33.0, translation(0.0, 1.0, 0.0)),
            ],
            EndBehavior::Loop,
        )
        .unwrap();
        skeleton.bind_animation(root, animation).unwrap();

        skeleton.advance();
        assert_eq!(
            skeleton.bone(root).unwrap().local_transform(),
            translation(0.0, 1.0, 0.0)
        );
        skeleton.advance();
        assert_eq!(skeleton.bone(root).unwrap().local_transform(), Mat4::IDENTITY);
    }

    #[test]
    fn test_bind_to_missing_bone_fails() {
        let mut skeleton = Skeleton::new();
        let animation =
            Animation::new("a", vec![Keyframe::new(0.0, Mat4::IDENTITY)], EndBehavior::Clamp)
                .unwrap();
        assert!(skeleton.bind_animation(BoneId(0), animation).is_err());
    }

    #[test]
    fn test_skin_matrices_at_bind_pose_are_identity() {
        let (mut skeleton, joints) = chain();
        skeleton.update_world_transforms();

        // Inverse bind matrices captured at the bind pose cancel the world transforms
        let inverse_binds = joints
            .iter()
            .map(|&j| skeleton.world_transform(j).unwrap().inverse())
            .collect();
        let skin = ModelSkin::new(
            "skin",
            Mat4::IDENTITY,
            inverse_binds,
            vec!["root".into(), "mid".into(), "leaf".into()],
        )
        .unwrap();

        for matrix in skeleton.skin_matrices(&skin, &joints) {
            assert!(matrix.abs_diff_eq(Mat4::IDENTITY, 1e-5));
        }
    }

    #[test]
    fn test_skin_matrices_include_bind_shape() {
        let mut skeleton = Skeleton::new();
        let root = skeleton
            .add_bone("root", translation(0.0, 4.0, 0.0), None)
            .unwrap();
        let skin = ModelSkin::new(
            "skin",
            Mat4::from_scale(Vec3::splat(2.0)),
            vec![Mat4::IDENTITY],
            vec!["root".into()],
        )
        .unwrap();

        let matrices = skeleton.skin_matrices(&skin, &[root]);
        let moved = matrices[0].transform_point3(Vec3::new(1.0, 0.0, 0.0));
        // Scaled by the bind shape first, then moved by the joint
        assert!(moved.abs_diff_eq(Vec3::new(2.0, 4.0, 0.0), 1e-6));
    }
}
