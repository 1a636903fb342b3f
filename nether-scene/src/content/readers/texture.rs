//! Image, sampler, and texture readers

use serde::Deserialize;
use serde_json::Value;

use super::parse;
use crate::content::{ContentReader, TypeReader};
use crate::document::{IMAGES, SAMPLERS, TEXTURES};
use crate::error::ContentResult;
use crate::texture::{
    FILTER_LINEAR, FILTER_NEAREST_MIPMAP_LINEAR, FORMAT_RGBA, Image, Sampler, TARGET_TEXTURE_2D,
    TYPE_UNSIGNED_BYTE, Texture, TextureFormat, WRAP_REPEAT,
};

#[derive(Deserialize)]
struct ImageEntry {
    uri: String,
}

/// Reads `images` entries and decodes them into surfaces.
pub struct ImageReader;

impl TypeReader for ImageReader {
    type Output = Image;

    fn section(&self) -> &'static str {
        IMAGES
    }

    fn read(&self, content: &mut ContentReader, key: &str, value: &Value) -> ContentResult<Image> {
        let entry: ImageEntry = parse(IMAGES, key, value)?;
        let surface = content.read_external_image(&entry.uri)?;
        tracing::debug!(
            "Decoded image `{}` ({}x{})",
            entry.uri,
            surface.width(),
            surface.height()
        );
        Ok(Image::new(key, entry.uri, surface))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SamplerEntry {
    #[serde(default = "default_mag_filter")]
    mag_filter: u32,
    #[serde(default = "default_min_filter")]
    min_filter: u32,
    #[serde(default = "default_wrap")]
    wrap_s: u32,
    #[serde(default = "default_wrap")]
    wrap_t: u32,
}

fn default_mag_filter() -> u32 {
    FILTER_LINEAR
}

fn default_min_filter() -> u32 {
    FILTER_NEAREST_MIPMAP_LINEAR
}

fn default_wrap() -> u32 {
    WRAP_REPEAT
}

/// Reads `samplers` entries.
pub struct SamplerReader;

impl TypeReader for SamplerReader {
    type Output = Sampler;

    fn section(&self) -> &'static str {
        SAMPLERS
    }

    fn read(&self, _: &mut ContentReader, key: &str, value: &Value) -> ContentResult<Sampler> {
        let entry: SamplerEntry = parse(SAMPLERS, key, value)?;
        Ok(Sampler {
            mag_filter: entry.mag_filter,
            min_filter: entry.min_filter,
            wrap_s: entry.wrap_s,
            wrap_t: entry.wrap_t,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextureEntry {
    source: String,
    sampler: String,
    #[serde(default = "default_format")]
    format: u32,
    #[serde(default = "default_format")]
    internal_format: u32,
    #[serde(default = "default_target")]
    target: u32,
    #[serde(rename = "type", default = "default_texel_type")]
    texel_type: u32,
}

fn default_format() -> u32 {
    FORMAT_RGBA
}

fn default_target() -> u32 {
    TARGET_TEXTURE_2D
}

fn default_texel_type() -> u32 {
    TYPE_UNSIGNED_BYTE
}

/// Reads `textures` entries.
pub struct TextureReader;

impl TypeReader for TextureReader {
    type Output = Texture;

    fn section(&self) -> &'static str {
        TEXTURES
    }

    fn read(
        &self,
        content: &mut ContentReader,
        key: &str,
        value: &Value,
    ) -> ContentResult<Texture> {
        let entry: TextureEntry = parse(TEXTURES, key, value)?;
        let source = content.read_object::<Image>(&entry.source)?;
        let sampler = content.read_object::<Sampler>(&entry.sampler)?;
        Ok(Texture::new(
            key,
            source,
            sampler,
            TextureFormat {
                format: entry.format,
                internal_format: entry.internal_format,
                target: entry.target,
                texel_type: entry.texel_type,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContentLoadError;
    use crate::test_utils::{content_with_files, png_bytes};
    use crate::texture::{FILTER_NEAREST, WRAP_CLAMP_TO_EDGE};
    use serde_json::json;
    use std::rc::Rc;

    fn content() -> ContentReader {
        content_with_files(
            json!({
                "images": {
                    "checker": { "uri": "checker.png" },
                    "garbage": { "uri": "garbage.png" },
                    "missing": { "uri": "missing.png" }
                },
                "samplers": {
                    "default": {},
                    "pixel": { "magFilter": 9728, "wrapS": 33071 }
                },
                "textures": {
                    "a": { "source": "checker", "sampler": "default" },
                    "b": { "source": "checker", "sampler": "pixel", "format": 6407, "type": 33635 }
                }
            }),
            &[
                ("checker.png", png_bytes(4, 2)),
                ("garbage.png", b"not an image".to_vec()),
            ],
        )
    }

    #[test]
    fn test_image_decoded_to_rgba_surface() {
        let mut content = content();
        let image = content.read_object::<Image>("checker").unwrap();
        let surface = image.surface();
        assert_eq!((surface.width(), surface.height()), (4, 2));
        assert_eq!(surface.level_count(), 1);
        assert_eq!(surface.base_level().data().len(), 4 * 2 * 4);
    }

    #[test]
    fn test_image_errors_carry_uri() {
        let mut content = content();
        let err = content.read_object::<Image>("garbage").unwrap_err();
        assert!(matches!(err, ContentLoadError::ImageDecode { ref uri, .. } if uri == "garbage.png"));

        let err = content.read_object::<Image>("missing").unwrap_err();
        assert!(matches!(err, ContentLoadError::ExternalReference { ref uri, .. } if uri == "missing.png"));
    }

    #[test]
    fn test_sampler_defaults_and_overrides() {
        let mut content = content();
        assert_eq!(*content.read_object::<Sampler>("default").unwrap(), Sampler::default());

        let pixel = content.read_object::<Sampler>("pixel").unwrap();
        assert_eq!(pixel.mag_filter, FILTER_NEAREST);
        assert_eq!(pixel.wrap_s, WRAP_CLAMP_TO_EDGE);
        assert_eq!(pixel.wrap_t, WRAP_REPEAT);
    }

    #[test]
    fn test_textures_share_images() {
        let mut content = content();
        let a = content.read_object::<Texture>("a").unwrap();
        let b = content.read_object::<Texture>("b").unwrap();

        assert!(Rc::ptr_eq(a.source(), b.source()));
        assert_eq!(a.format(), TextureFormat::default());
        assert_eq!(b.format().format, 6407);
        assert_eq!(b.format().internal_format, FORMAT_RGBA);
        assert_eq!(b.format().texel_type, 33635);
    }
}
