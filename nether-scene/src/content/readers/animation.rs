//! Animation reader

use glam::Mat4;
use serde::Deserialize;
use serde_json::Value;

use super::parse;
use crate::animation::{Animation, Keyframe};
use crate::content::{ContentReader, TypeReader};
use crate::data::{Accessor, AttributeType};
use crate::document::ANIMATIONS;
use crate::error::{ContentLoadError, ContentResult};

#[derive(Deserialize)]
struct AnimationEntry {
    name: Option<String>,
    target: Option<String>,
    /// URI of an external keyframe list
    keyframes: Option<String>,
    /// Accessor of keyframe times (ms)
    input: Option<String>,
    /// Accessor of keyframe transforms
    output: Option<String>,
}

/// One sample in an external keyframe list.
#[derive(Deserialize)]
struct KeyframeEntry {
    time: f32,
    #[serde(alias = "matrix")]
    transform: [f32; 16],
}

/// Reads `animations` entries.
///
/// Keyframes come either from an external JSON list or from a pair of
/// accessors (times and matrices). The end-of-timeline behavior comes from
/// the loader configuration.
pub struct AnimationReader;

impl TypeReader for AnimationReader {
    type Output = Animation;

    fn section(&self) -> &'static str {
        ANIMATIONS
    }

    fn read(
        &self,
        content: &mut ContentReader,
        key: &str,
        value: &Value,
    ) -> ContentResult<Animation> {
        let entry: AnimationEntry = parse(ANIMATIONS, key, value)?;

        let keyframes = match (&entry.keyframes, &entry.input, &entry.output) {
            (Some(uri), _, _) => read_keyframe_list(content, key, uri)?,
            (None, Some(input), Some(output)) => {
                let times = content.read_object::<Accessor>(input)?;
                let transforms = content.read_object::<Accessor>(output)?;
                read_keyframe_accessors(key, &times, &transforms)?
            }
            _ => {
                return Err(ContentLoadError::invalid_entry(
                    ANIMATIONS,
                    key,
                    "expected `keyframes`, or both `input` and `output`",
                ));
            }
        };

        let end_behavior = content.config().animation.end_behavior;
        let mut animation =
            Animation::new(entry.name.as_deref().unwrap_or(key), keyframes, end_behavior)?;
        if let Some(target) = entry.target {
            animation = animation.with_target(target);
        }

        tracing::debug!(
            "Animation `{}`: {} keyframes over {}ms",
            key,
            animation.keyframes().len(),
            animation.duration()
        );
        Ok(animation)
    }
}

fn read_keyframe_list(
    content: &ContentReader,
    key: &str,
    uri: &str,
) -> ContentResult<Vec<Keyframe>> {
    let bytes = content.read_external_reference(uri)?;
    let entries: Vec<KeyframeEntry> = serde_json::from_slice(&bytes).map_err(|err| {
        ContentLoadError::invalid_entry(ANIMATIONS, key, format!("keyframes `{}`: {}", uri, err))
    })?;

    Ok(entries
        .iter()
        .map(|entry| Keyframe::new(entry.time, Mat4::from_cols_array(&entry.transform)))
        .collect())
}

fn read_keyframe_accessors(
    key: &str,
    times: &Accessor,
    transforms: &Accessor,
) -> ContentResult<Vec<Keyframe>> {
    if times.attribute_type() != AttributeType::Scalar {
        return Err(ContentLoadError::invalid_entry(
            ANIMATIONS,
            key,
            format!("input `{}` must be SCALAR", times.name()),
        ));
    }
    if times.count() != transforms.count() {
        return Err(ContentLoadError::invalid_entry(
            ANIMATIONS,
            key,
            format!(
                "{} keyframe times for {} transforms",
                times.count(),
                transforms.count()
            ),
        ));
    }

    let times = times.read_f32()?;
    let transforms = transforms.read_mat4()?;
    Ok(times
        .into_iter()
        .zip(transforms)
        .map(|(time, transform)| Keyframe::new(time, transform))
        .collect())
}
