//! Loader configuration (scene.toml)
//!
//! Settings that change how content is resolved and how loaded timelines
//! behave. Every field has a default, so an empty file is a valid config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::animation::EndBehavior;
use crate::error::{ContentLoadError, ContentResult};

/// Content loader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContentConfig {
    /// Directory relative URIs are resolved against.
    ///
    /// Defaults to the directory containing the asset document.
    #[serde(default)]
    pub root_path: Option<PathBuf>,
    /// Animation playback settings
    #[serde(default)]
    pub animation: AnimationConfig,
    /// Binary buffer settings
    #[serde(default)]
    pub buffers: BufferConfig,
}

/// Animation playback configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct AnimationConfig {
    /// What happens when a playhead reaches the end of its timeline (default: clamp)
    #[serde(default)]
    pub end_behavior: EndBehavior,
}

/// Binary buffer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Accept payloads longer than the declared `byteLength` (default: true)
    #[serde(default = "default_true")]
    pub allow_oversized: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            allow_oversized: default_true(),
        }
    }
}

impl ContentConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> ContentResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file from disk.
    pub fn load(path: &Path) -> ContentResult<Self> {
        let text =
            std::fs::read_to_string(path).map_err(|source| ContentLoadError::ExternalReference {
                uri: path.display().to_string(),
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded content config from {}", path.display());
        Ok(config)
    }
}
