//! Skins
//!
//! A [`ModelSkin`] binds an ordered joint list to a mesh through one inverse
//! bind matrix per joint and a bind-shape matrix applied to the whole mesh.

use glam::Mat4;

use crate::error::{ContentLoadError, ContentResult};

/// Skin data shared by every node that instances it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSkin {
    name: String,
    bind_shape_matrix: Mat4,
    inverse_bind_matrices: Vec<Mat4>,
    joint_names: Vec<String>,
}

impl ModelSkin {
    /// Create a skin. Every joint needs exactly one inverse bind matrix.
    pub fn new(
        name: impl Into<String>,
        bind_shape_matrix: Mat4,
        inverse_bind_matrices: Vec<Mat4>,
        joint_names: Vec<String>,
    ) -> ContentResult<Self> {
        let name = name.into();
        if inverse_bind_matrices.len() != joint_names.len() {
            return Err(ContentLoadError::invalid_entry(
                crate::document::SKINS,
                &name,
                format!(
                    "{} inverse bind matrices for {} joints",
                    inverse_bind_matrices.len(),
                    joint_names.len()
                ),
            ));
        }

        Ok(Self {
            name,
            bind_shape_matrix,
            inverse_bind_matrices,
            joint_names,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bind_shape_matrix(&self) -> Mat4 {
        self.bind_shape_matrix
    }

    pub fn inverse_bind_matrices(&self) -> &[Mat4] {
        &self.inverse_bind_matrices
    }

    /// Joint names in skin order; index `i` pairs with inverse bind matrix `i`.
    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    pub fn joint_count(&self) -> usize {
        self.joint_names.len()
    }
}
