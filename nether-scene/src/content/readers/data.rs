//! Buffer, buffer view, and accessor readers

use serde::Deserialize;
use serde_json::Value;

use super::parse;
use crate::content::{ContentReader, TypeReader};
use crate::data::{
    Accessor, AccessorDesc, AttributeType, Buffer, BufferTarget, BufferView, ComponentType,
};
use crate::document::{ACCESSORS, BUFFER_VIEWS, BUFFERS};
use crate::error::{ContentLoadError, ContentResult};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferEntry {
    uri: String,
    byte_length: usize,
}

/// Reads `buffers` entries and fetches their payloads.
pub struct BufferReader;

impl TypeReader for BufferReader {
    type Output = Buffer;

    fn section(&self) -> &'static str {
        BUFFERS
    }

    fn read(&self, content: &mut ContentReader, key: &str, value: &Value) -> ContentResult<Buffer> {
        let entry: BufferEntry = parse(BUFFERS, key, value)?;
        let mut data = content.read_external_reference(&entry.uri)?;

        if data.len() < entry.byte_length {
            return Err(ContentLoadError::invalid_entry(
                BUFFERS,
                key,
                format!(
                    "`{}` holds {} bytes but byteLength is {}",
                    entry.uri,
                    data.len(),
                    entry.byte_length
                ),
            ));
        }
        if data.len() > entry.byte_length {
            if !content.config().buffers.allow_oversized {
                return Err(ContentLoadError::invalid_entry(
                    BUFFERS,
                    key,
                    format!(
                        "`{}` holds {} bytes but byteLength is {}",
                        entry.uri,
                        data.len(),
                        entry.byte_length
                    ),
                ));
            }
            tracing::debug!(
                "Truncating buffer `{}` from {} to {} bytes",
                key,
                data.len(),
                entry.byte_length
            );
            data.truncate(entry.byte_length);
        }

        Ok(Buffer::new(key, entry.uri, data))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferViewEntry {
    buffer: String,
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    #[serde(default)]
    target: Option<BufferTarget>,
}

/// Reads `bufferViews` entries.
pub struct BufferViewReader;

impl TypeReader for BufferViewReader {
    type Output = BufferView;

    fn section(&self) -> &'static str {
        BUFFER_VIEWS
    }

    fn read(
        &self,
        content: &mut ContentReader,
        key: &str,
        value: &Value,
    ) -> ContentResult<BufferView> {
        let entry: BufferViewEntry = parse(BUFFER_VIEWS, key, value)?;
        let buffer = content.read_object::<Buffer>(&entry.buffer)?;
        BufferView::new(
            key,
            buffer,
            entry.byte_offset,
            entry.byte_length,
            entry.target,
        )
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessorEntry {
    buffer_view: String,
    #[serde(default)]
    byte_offset: usize,
    #[serde(default)]
    byte_stride: usize,
    component_type: ComponentType,
    count: usize,
    #[serde(rename = "type")]
    attribute_type: AttributeType,
    #[serde(default)]
    min: Vec<f32>,
    #[serde(default)]
    max: Vec<f32>,
}

/// Reads `accessors` entries.
pub struct AccessorReader;

impl TypeReader for AccessorReader {
    type Output = Accessor;

    fn section(&self) -> &'static str {
        ACCESSORS
    }

    fn read(
        &self,
        content: &mut ContentReader,
        key: &str,
        value: &Value,
    ) -> ContentResult<Accessor> {
        let entry: AccessorEntry = parse(ACCESSORS, key, value)?;
        let buffer_view = content.read_object::<BufferView>(&entry.buffer_view)?;
        Accessor::new(
            key,
            buffer_view,
            AccessorDesc {
                byte_offset: entry.byte_offset,
                byte_stride: entry.byte_stride,
                component_type: entry.component_type,
                attribute_type: entry.attribute_type,
                count: entry.count,
                min: entry.min,
                max: entry.max,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ContentConfig;
    use crate::data::{Accessor, AttributeType, Buffer, BufferTarget, BufferView, ComponentType};
    use crate::error::ContentLoadError;
    use crate::test_utils::content_with_files;
    use serde_json::json;

    fn document() -> serde_json::Value {
        json!({
            "buffers": {
                "exact": { "uri": "exact.bin", "byteLength": 8 },
                "long": { "uri": "long.bin", "byteLength": 4 },
                "short": { "uri": "short.bin", "byteLength": 16 }
            },
            "bufferViews": {
                "whole": { "buffer": "exact", "byteLength": 8, "target": 34962 },
                "tail": { "buffer": "exact", "byteOffset": 6, "byteLength": 2 },
                "past_end": { "buffer": "exact", "byteOffset": 4, "byteLength": 8 },
                "bad_target": { "buffer": "exact", "byteLength": 8, "target": 7 }
            },
            "accessors": {
                "shorts": {
                    "bufferView": "whole", "componentType": 5123, "count": 4, "type": "SCALAR",
                    "min": [0.0], "max": [3.0]
                },
                "strided": {
                    "bufferView": "whole", "byteStride": 4, "componentType": 5121, "count": 2, "type": "VEC2"
                },
                "too_many": { "bufferView": "tail", "componentType": 5126, "count": 1, "type": "SCALAR" },
                "bad_type": { "bufferView": "whole", "componentType": 5125, "count": 1, "type": "SCALAR" }
            }
        })
    }

    fn files() -> Vec<(&'static str, Vec<u8>)> {
        vec![
            ("exact.bin", vec![0, 0, 1, 0, 2, 0, 3, 0]),
            ("long.bin", vec![9; 10]),
            ("short.bin", vec![0; 4]),
        ]
    }

    #[test]
    fn test_buffer_payload_fetched() {
        let mut content = content_with_files(document(), &files());
        let buffer = content.read_object::<Buffer>("exact").unwrap();
        assert_eq!(buffer.byte_length(), 8);
        assert_eq!(buffer.uri(), "exact.bin");
        assert_eq!(buffer.name(), "exact");
    }

    #[test]
    fn test_oversized_payload_truncated_by_default() {
        let mut content = content_with_files(document(), &files());
        let buffer = content.read_object::<Buffer>("long").unwrap();
        assert_eq!(buffer.data(), &[9, 9, 9, 9]);
    }

    #[test]
    fn test_oversized_payload_rejected_when_configured() {
        let mut config = ContentConfig::default();
        config.buffers.allow_oversized = false;
        let mut content = content_with_files(document(), &files()).with_config(config);

        let err = content.read_object::<Buffer>("long").unwrap_err();
        assert!(matches!(err, ContentLoadError::InvalidEntry { .. }));
    }

    #[test]
    fn test_short_payload_rejected() {
        let mut content = content_with_files(document(), &files());
        let err = content.read_object::<Buffer>("short").unwrap_err();
        assert!(err.to_string().contains("holds 4 bytes"), "{}", err);
    }

    #[test]
    fn test_buffer_view_fields() {
        let mut content = content_with_files(document(), &files());
        let view = content.read_object::<BufferView>("whole").unwrap();
        assert_eq!(view.target(), Some(BufferTarget::ArrayBuffer));
        assert_eq!(view.byte_offset(), 0);

        let tail = content.read_object::<BufferView>("tail").unwrap();
        assert_eq!(tail.get_data(0, 2).unwrap(), &[3, 0]);
        assert!(tail.target().is_none());
    }

    #[test]
    fn test_buffer_view_past_end_fails_at_construction() {
        let mut content = content_with_files(document(), &files());
        let err = content.read_object::<BufferView>("past_end").unwrap_err();
        assert!(matches!(err, ContentLoadError::OutOfBounds { .. }));
    }

    #[test]
    fn test_unknown_target_code_is_invalid_entry() {
        let mut content = content_with_files(document(), &files());
        let err = content.read_object::<BufferView>("bad_target").unwrap_err();
        assert!(matches!(err, ContentLoadError::InvalidEntry { .. }));
    }

    #[test]
    fn test_accessor_fields_and_values() {
        let mut content = content_with_files(document(), &files());
        let shorts = content.read_object::<Accessor>("shorts").unwrap();
        assert_eq!(shorts.component_type(), ComponentType::UnsignedShort);
        assert_eq!(shorts.attribute_type(), AttributeType::Scalar);
        assert_eq!(shorts.byte_stride(), 2);
        assert_eq!(shorts.max(), &[3.0]);
        assert_eq!(shorts.read_indices().unwrap(), vec![0, 1, 2, 3]);

        let strided = content.read_object::<Accessor>("strided").unwrap();
        assert_eq!(strided.byte_stride(), 4);
        assert_eq!(strided.read_f32().unwrap(), vec![0.0, 0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_accessor_range_checked_against_view() {
        let mut content = content_with_files(document(), &files());
        let err = content.read_object::<Accessor>("too_many").unwrap_err();
        assert!(matches!(err, ContentLoadError::OutOfBounds { .. }));
    }

    #[test]
    fn test_unknown_component_type_is_invalid_entry() {
        let mut content = content_with_files(document(), &files());
        let err = content.read_object::<Accessor>("bad_type").unwrap_err();
        assert!(matches!(err, ContentLoadError::InvalidEntry { .. }));
    }
}
