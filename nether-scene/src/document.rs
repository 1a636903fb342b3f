//! Asset document
//!
//! The parsed JSON document: a single object whose top-level sections map
//! string keys to entries. Cross-references between entries are plain keys
//! naming an entry in another section.

use serde_json::{Map, Value};

use crate::error::{ContentLoadError, ContentResult};

// Section names
pub const BUFFERS: &str = "buffers";
pub const BUFFER_VIEWS: &str = "bufferViews";
pub const ACCESSORS: &str = "accessors";
pub const NODES: &str = "nodes";
pub const SKINS: &str = "skins";
pub const ANIMATIONS: &str = "animations";
pub const MESHES: &str = "meshes";
pub const MATERIALS: &str = "materials";
pub const PROGRAMS: &str = "programs";
pub const SHADERS: &str = "shaders";
pub const SAMPLERS: &str = "samplers";
pub const TEXTURES: &str = "textures";
pub const IMAGES: &str = "images";
pub const SCENES: &str = "scenes";

/// Top-level field naming the default scene
pub const DEFAULT_SCENE: &str = "scene";

/// A parsed asset document.
#[derive(Debug, Clone, Default)]
pub struct AssetDocument {
    root: Map<String, Value>,
}

impl AssetDocument {
    /// Parse a document from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> ContentResult<Self> {
        Self::from_value(serde_json::from_slice(bytes)?)
    }

    /// Wrap an already parsed JSON value. The value must be an object.
    pub fn from_value(value: Value) -> ContentResult<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(ContentLoadError::invalid_entry(
                "document",
                "<root>",
                format!("expected an object, found {}", json_kind(&other)),
            )),
        }
    }

    /// Top-level field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.root.get(field)
    }

    /// A named section, if present and an object.
    pub fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.root.get(name).and_then(Value::as_object)
    }

    /// Look up an entry. A missing key (or section) is a malformed reference.
    pub fn entry(&self, section: &str, key: &str) -> ContentResult<&Value> {
        self.section(section)
            .and_then(|entries| entries.get(key))
            .ok_or_else(|| ContentLoadError::MissingEntry {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    /// Keys of a section in key order. A missing section has no keys.
    pub fn keys(&self, section: &str) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .section(section)
            .map(|entries| entries.keys().map(String::as_str).collect())
            .unwrap_or_default();
        keys.sort_unstable();
        keys
    }
}

/// Short name of a JSON value's kind, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_lookup() {
        let document = AssetDocument::from_value(json!({
            "buffers": { "b1": { "uri": "b1.bin", "byteLength": 4 } }
        }))
        .unwrap();

        assert_eq!(document.entry(BUFFERS, "b1").unwrap()["uri"], "b1.bin");
    }

    #[test]
    fn test_missing_entry_and_section() {
        let document = AssetDocument::from_value(json!({ "buffers": {} })).unwrap();

        let err = document.entry(BUFFERS, "nope").unwrap_err();
        assert_eq!(err.to_string(), "`buffers` has no entry named `nope`");
        assert!(matches!(
            document.entry(NODES, "root"),
            Err(ContentLoadError::MissingEntry { .. })
        ));
        assert!(document.keys(NODES).is_empty());
    }

    #[test]
    fn test_keys_are_sorted() {
        let document = AssetDocument::from_slice(br#"{"nodes": {"b": {}, "a": {}, "c": {}}}"#).unwrap();
        assert_eq!(document.keys(NODES), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_non_object_document_rejected() {
        assert!(AssetDocument::from_slice(b"[1, 2, 3]").is_err());
        assert!(matches!(
            AssetDocument::from_slice(b"{ not json"),
            Err(ContentLoadError::Json(_))
        ));
    }
}
