//! Content-load errors
//!
//! Every failure in the loading pipeline is reported as a [`ContentLoadError`].
//! There is no partial-success mode: a load either returns a consistent graph
//! or one of these errors.

use std::io;
use std::path::PathBuf;

/// Error raised while loading scene content.
#[derive(Debug, thiserror::Error)]
pub enum ContentLoadError {
    /// The asset document is not valid JSON, or an entry has the wrong shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The loader configuration is not valid TOML.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// A key named in one section does not exist in the target section.
    #[error("`{section}` has no entry named `{key}`")]
    MissingEntry { section: String, key: String },

    /// An entry was found but one of its fields is unusable.
    #[error("invalid `{section}` entry `{key}`: {message}")]
    InvalidEntry {
        section: String,
        key: String,
        message: String,
    },

    /// A byte range exceeds its backing store.
    #[error("{what} range {offset}+{length} exceeds {limit} bytes")]
    OutOfBounds {
        what: &'static str,
        offset: usize,
        length: usize,
        limit: usize,
    },

    /// An external URI could not be fetched.
    #[error("failed to read external reference `{uri}` ({path}): {source}")]
    ExternalReference {
        uri: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An external image could not be decoded into a surface.
    #[error("failed to decode image `{uri}`: {source}")]
    ImageDecode {
        uri: String,
        #[source]
        source: image::ImageError,
    },

    /// An entry (transitively) references itself.
    #[error("reference cycle while reading {type_name} `{key}`")]
    ReferenceCycle {
        type_name: &'static str,
        key: String,
    },

    /// A skin names a joint that no skeleton node declares.
    #[error("skin `{skin}` references unknown joint `{joint}`")]
    UnknownJoint { skin: String, joint: String },

    /// A bone could not be added to its skeleton.
    #[error("invalid bone `{name}`: {message}")]
    InvalidBone { name: String, message: String },

    /// A keyframe list violates the timeline invariants.
    #[error("invalid animation `{name}`: {message}")]
    InvalidAnimation { name: String, message: String },
}

impl ContentLoadError {
    /// Shorthand for [`ContentLoadError::InvalidEntry`].
    pub fn invalid_entry(section: &str, key: &str, message: impl Into<String>) -> Self {
        Self::InvalidEntry {
            section: section.to_string(),
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Result alias used throughout the loader.
pub type ContentResult<T> = Result<T, ContentLoadError>;

/// Checks that `offset + length` fits in `limit` bytes without overflowing.
pub(crate) fn check_range(
    what: &'static str,
    offset: usize,
    length: usize,
    limit: usize,
) -> ContentResult<()> {
    match offset.checked_add(length) {
        Some(end) if end <= limit => Ok(()),
        _ => Err(ContentLoadError::OutOfBounds {
            what,
            offset,
            length,
            limit,
        }),
    }
}
