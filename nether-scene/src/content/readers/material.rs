//! Material, program, and shader readers

use serde::Deserialize;
use serde_json::{Map, Value};

use super::parse;
use crate::content::{ContentReader, TypeReader};
use crate::document::{MATERIALS, PROGRAMS, SHADERS, json_kind};
use crate::error::{ContentLoadError, ContentResult};
use crate::material::{Material, MaterialValue, Program, Shader, ShaderKind};
use crate::texture::Texture;

#[derive(Deserialize)]
struct MaterialEntry {
    name: Option<String>,
    program: Option<String>,
    #[serde(default)]
    values: Map<String, Value>,
}

/// Reads `materials` entries. String values name textures.
pub struct MaterialReader;

impl TypeReader for MaterialReader {
    type Output = Material;

    fn section(&self) -> &'static str {
        MATERIALS
    }

    fn read(
        &self,
        content: &mut ContentReader,
        key: &str,
        value: &Value,
    ) -> ContentResult<Material> {
        let entry: MaterialEntry = parse(MATERIALS, key, value)?;
        let mut material = Material::new(entry.name.as_deref().unwrap_or(key));

        if let Some(program) = &entry.program {
            material = material.with_program(content.read_object::<Program>(program)?);
        }

        for (name, raw) in &entry.values {
            let value = match raw {
                Value::Bool(flag) => MaterialValue::Bool(*flag),
                Value::Number(number) => MaterialValue::Number(number.as_f64().unwrap_or(0.0) as f32),
                Value::String(texture) => {
                    MaterialValue::Texture(content.read_object::<Texture>(texture)?)
                }
                Value::Array(items) => MaterialValue::Vector(
                    items
                        .iter()
                        .map(|item| {
                            item.as_f64().map(|v| v as f32).ok_or_else(|| {
                                ContentLoadError::invalid_entry(
                                    MATERIALS,
                                    key,
                                    format!("`{}` holds {}, expected numbers", name, json_kind(item)),
                                )
                            })
                        })
                        .collect::<ContentResult<Vec<_>>>()?,
                ),
                other => {
                    return Err(ContentLoadError::invalid_entry(
                        MATERIALS,
                        key,
                        format!("`{}` has unsupported value {}", name, json_kind(other)),
                    ));
                }
            };
            material = material.with_value(name, value);
        }

        Ok(material)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgramEntry {
    vertex_shader: String,
    fragment_shader: String,
    #[serde(default)]
    attributes: Vec<String>,
}

/// Reads `programs` entries and checks both shader stages.
pub struct ProgramReader;

impl TypeReader for ProgramReader {
    type Output = Program;

    fn section(&self) -> &'static str {
        PROGRAMS
    }

    fn read(
        &self,
        content: &mut ContentReader,
        key: &str,
        value: &Value,
    ) -> ContentResult<Program> {
        let entry: ProgramEntry = parse(PROGRAMS, key, value)?;
        let vertex_shader = content.read_object::<Shader>(&entry.vertex_shader)?;
        let fragment_shader = content.read_object::<Shader>(&entry.fragment_shader)?;

        for (shader, expected) in [
            (&vertex_shader, ShaderKind::Vertex),
            (&fragment_shader, ShaderKind::Fragment),
        ] {
            if shader.kind() != expected {
                return Err(ContentLoadError::invalid_entry(
                    PROGRAMS,
                    key,
                    format!(
                        "shader `{}` is a {:?} shader, expected {:?}",
                        shader.name(),
                        shader.kind(),
                        expected
                    ),
                ));
            }
        }

        Ok(Program::new(
            key,
            vertex_shader,
            fragment_shader,
            entry.attributes,
        ))
    }
}

#[derive(Deserialize)]
struct ShaderEntry {
    uri: String,
    #[serde(rename = "type")]
    kind: ShaderKind,
}

/// Reads `shaders` entries and fetches their source text.
pub struct ShaderReader;

impl TypeReader for ShaderReader {
    type Output = Shader;

    fn section(&self) -> &'static str {
        SHADERS
    }

    fn read(&self, content: &mut ContentReader, key: &str, value: &Value) -> ContentResult<Shader> {
        let entry: ShaderEntry = parse(SHADERS, key, value)?;
        let source = content.read_external_text(&entry.uri)?;
        Ok(Shader::new(key, entry.uri, entry.kind, source))
    }
}
