//! Materials, programs, and shaders

use hashbrown::HashMap;
use serde::Deserialize;
use std::rc::Rc;

use crate::texture::Texture;

/// Shader stage (GL enum codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
#[repr(u32)]
pub enum ShaderKind {
    Fragment = 35632,
    Vertex = 35633,
}

impl TryFrom<u32> for ShaderKind {
    type Error = String;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            35632 => Ok(Self::Fragment),
            35633 => Ok(Self::Vertex),
            other => Err(format!("unknown shader type {}", other)),
        }
    }
}

/// Shader source fetched from an external URI. Compilation happens in the
/// renderer.
#[derive(Debug, Clone)]
pub struct Shader {
    name: String,
    uri: String,
    kind: ShaderKind,
    source: String,
}

impl Shader {
    pub fn new(
        name: impl Into<String>,
        uri: impl Into<String>,
        kind: ShaderKind,
        source: String,
    ) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            kind,
            source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// A vertex/fragment shader pair plus the attributes it consumes.
#[derive(Debug, Clone)]
pub struct Program {
    name: String,
    vertex_shader: Rc<Shader>,
    fragment_shader: Rc<Shader>,
    attributes: Vec<String>,
}

impl Program {
    pub fn new(
        name: impl Into<String>,
        vertex_shader: Rc<Shader>,
        fragment_shader: Rc<Shader>,
        attributes: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            vertex_shader,
            fragment_shader,
            attributes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_shader(&self) -> &Rc<Shader> {
        &self.vertex_shader
    }

    pub fn fragment_shader(&self) -> &Rc<Shader> {
        &self.fragment_shader
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }
}

/// A material parameter value.
#[derive(Debug, Clone)]
pub enum MaterialValue {
    Bool(bool),
    Number(f32),
    Vector(Vec<f32>),
    Texture(Rc<Texture>),
}

/// Named parameter values plus the program that consumes them.
#[derive(Debug, Clone)]
pub struct Material {
    name: String,
    program: Option<Rc<Program>>,
    values: HashMap<String, MaterialValue>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: None,
            values: HashMap::new(),
        }
    }

    pub fn with_program(mut self, program: Rc<Program>) -> Self {
        self.program = Some(program);
        self
    }

    pub fn with_value(mut self, name: impl Into<String>, value: MaterialValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> Option<&Rc<Program>> {
        self.program.as_ref()
    }

    pub fn value(&self, name: &str) -> Option<&MaterialValue> {
        self.values.get(name)
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &MaterialValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every texture the material samples.
    pub fn textures(&self) -> impl Iterator<Item = &Rc<Texture>> {
        self.values.values().filter_map(|value| match value {
            MaterialValue::Texture(texture) => Some(texture),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_kind_codes() {
        assert_eq!(ShaderKind::Fragment as u32, 35632);
        assert_eq!(ShaderKind::Vertex as u32, 35633);
        assert_eq!(ShaderKind::try_from(35633), Ok(ShaderKind::Vertex));
        assert!(ShaderKind::try_from(0).is_err());
    }

    #[test]
    fn test_material_values() {
        let material = Material::new("skin")
            .with_value("shininess", MaterialValue::Number(16.0))
            .with_value("diffuse", MaterialValue::Vector(vec![1.0, 0.5, 0.5, 1.0]));

        assert!(matches!(
            material.value("shininess"),
            Some(MaterialValue::Number(v)) if *v == 16.0
        ));
        assert!(material.value("emission").is_none());
        assert_eq!(material.textures().count(), 0);
        assert!(material.program().is_none());
    }
}
