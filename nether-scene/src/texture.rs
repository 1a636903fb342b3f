//! Images, samplers, and textures
//!
//! Image decoding produces a [`Surface`]: a stack of RGBA8 mip levels. Only
//! the base level comes out of decoding; further levels are left to the
//! renderer.

use std::rc::Rc;

/// One mip level of a surface (RGBA8, row-major, tightly packed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceLevel {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl SurfaceLevel {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Decoded image data with its mip chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    levels: Vec<SurfaceLevel>,
}

impl Surface {
    /// A single-level surface from RGBA8 pixels.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            levels: vec![SurfaceLevel::new(width, height, data)],
        }
    }

    /// Append a smaller mip level.
    pub fn push_level(&mut self, level: SurfaceLevel) {
        self.levels.push(level);
    }

    pub fn width(&self) -> u32 {
        self.base_level().width
    }

    pub fn height(&self) -> u32 {
        self.base_level().height
    }

    pub fn base_level(&self) -> &SurfaceLevel {
        &self.levels[0]
    }

    pub fn level(&self, index: usize) -> Option<&SurfaceLevel> {
        self.levels.get(index)
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

/// An image entry: its URI and decoded surface.
#[derive(Debug, Clone)]
pub struct Image {
    name: String,
    uri: String,
    surface: Surface,
}

impl Image {
    pub fn new(name: impl Into<String>, uri: impl Into<String>, surface: Surface) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            surface,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }
}

// GL sampler codes
pub const FILTER_NEAREST: u32 = 9728;
pub const FILTER_LINEAR: u32 = 9729;
pub const FILTER_NEAREST_MIPMAP_LINEAR: u32 = 9986;
pub const WRAP_REPEAT: u32 = 10497;
pub const WRAP_CLAMP_TO_EDGE: u32 = 33071;

/// Texture sampling state (GL enum codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sampler {
    pub mag_filter: u32,
    pub min_filter: u32,
    pub wrap_s: u32,
    pub wrap_t: u32,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            mag_filter: FILTER_LINEAR,
            min_filter: FILTER_NEAREST_MIPMAP_LINEAR,
            wrap_s: WRAP_REPEAT,
            wrap_t: WRAP_REPEAT,
        }
    }
}

// GL texture codes
pub const FORMAT_RGBA: u32 = 6408;
pub const TARGET_TEXTURE_2D: u32 = 3553;
pub const TYPE_UNSIGNED_BYTE: u32 = 5121;

/// Pixel layout of a texture (GL enum codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureFormat {
    pub format: u32,
    pub internal_format: u32,
    pub target: u32,
    pub texel_type: u32,
}

impl Default for TextureFormat {
    fn default() -> Self {
        Self {
            format: FORMAT_RGBA,
            internal_format: FORMAT_RGBA,
            target: TARGET_TEXTURE_2D,
            texel_type: TYPE_UNSIGNED_BYTE,
        }
    }
}

/// An image paired with a sampler.
#[derive(Debug, Clone)]
pub struct Texture {
    name: String,
    source: Rc<Image>,
    sampler: Rc<Sampler>,
    format: TextureFormat,
}

impl Texture {
    pub fn new(
        name: impl Into<String>,
        source: Rc<Image>,
        sampler: Rc<Sampler>,
        format: TextureFormat,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            sampler,
            format,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Rc<Image> {
        &self.source
    }

    pub fn sampler(&self) -> &Rc<Sampler> {
        &self.sampler
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_levels() {
        let mut surface = Surface::from_rgba8(4, 2, vec![0; 32]);
        assert_eq!(surface.level_count(), 1);
        assert_eq!((surface.width(), surface.height()), (4, 2));

        surface.push_level(SurfaceLevel::new(2, 1, vec![0; 8]));
        assert_eq!(surface.level_count(), 2);
        assert_eq!(surface.level(1).unwrap().width(), 2);
        assert!(surface.level(2).is_none());
    }

    #[test]
    fn test_sampler_defaults() {
        let sampler = Sampler::default();
        assert_eq!(sampler.mag_filter, 9729);
        assert_eq!(sampler.min_filter, 9986);
        assert_eq!(sampler.wrap_s, 10497);
        assert_eq!(sampler.wrap_t, 10497);
    }
}
