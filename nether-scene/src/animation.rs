//! Keyframe animation
//!
//! An [`Animation`] is a timeline of [`Keyframe`]s plus a playhead. Each
//! frame, `update` moves the playhead and the evaluator scans forward to the
//! last keyframe whose time is at or before it. Times are milliseconds.
//!
//! # States
//!
//! ```text
//! Stopped --update/advance--> Playing --playhead >= duration--> AtEnd (clamp)
//!    ^                                                            |
//!    +---------------------------- reset -------------------------+
//! ```
//!
//! With [`EndBehavior::Loop`] the playhead wraps instead of reaching `AtEnd`.

use glam::Mat4;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::error::{ContentLoadError, ContentResult};

/// What a playhead does when it reaches the end of its timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndBehavior {
    /// Hold the last keyframe
    #[default]
    Clamp,
    /// Wrap around to the start. A playhead landing exactly on the duration
    /// wraps to 0, so `update` shows the first keyframe there, not the last.
    Loop,
}

/// Playback state of an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Playhead at 0, first keyframe active
    Stopped,
    Playing,
    /// Playhead clamped at the duration
    AtEnd,
}

/// One timeline sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    time: f32,
    transform: Mat4,
}

impl Keyframe {
    pub fn new(time: f32, transform: Mat4) -> Self {
        Self { time, transform }
    }

    /// Offset from the start of the timeline, in milliseconds
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }
}

/// A keyframe timeline with its own playhead.
///
/// Cloning shares the keyframes and copies the playhead, so every bone bound
/// to the same loaded animation advances independently.
#[derive(Debug, Clone)]
pub struct Animation {
    name: String,
    target: Option<String>,
    keyframes: Rc<[Keyframe]>,
    end_behavior: EndBehavior,
    time: f32,
    current: usize,
    state: PlaybackState,
}

impl Animation {
    /// Create a stopped animation.
    ///
    /// Fails if `keyframes` is empty, holds a negative or non-finite time, or
    /// is not in non-decreasing time order.
    pub fn new(
        name: impl Into<String>,
        keyframes: Vec<Keyframe>,
        end_behavior: EndBehavior,
    ) -> ContentResult<Self> {
        let name = name.into();
        let invalid = |message: String| ContentLoadError::InvalidAnimation {
            name: name.clone(),
            message,
        };

        if keyframes.is_empty() {
            return Err(invalid("no keyframes".to_string()));
        }
        if let Some(bad) = keyframes.iter().position(|k| !k.time.is_finite()) {
            return Err(invalid(format!("keyframe {} has a non-finite time", bad)));
        }
        if let Some(bad) = keyframes.iter().position(|k| k.time < 0.0) {
            return Err(invalid(format!(
                "keyframe {} has a negative time {}ms",
                bad, keyframes[bad].time
            )));
        }
        if let Some(bad) = keyframes.windows(2).position(|w| w[1].time < w[0].time) {
            return Err(invalid(format!(
                "keyframe {} at {}ms comes before keyframe {} at {}ms",
                bad + 1,
                keyframes[bad + 1].time,
                bad,
                keyframes[bad].time
            )));
        }

        Ok(Self {
            name,
            target: None,
            keyframes: keyframes.into(),
            end_behavior,
            time: 0.0,
            current: 0,
            state: PlaybackState::Stopped,
        })
    }

    /// Set the key of the node this animation drives.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key of the node this animation drives
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn end_behavior(&self) -> EndBehavior {
        self.end_behavior
    }

    pub fn set_end_behavior(&mut self, end_behavior: EndBehavior) {
        self.end_behavior = end_behavior;
    }

    /// Time of the last keyframe
    pub fn duration(&self) -> f32 {
        self.keyframes[self.keyframes.len() - 1].time
    }

    /// Current playhead, in milliseconds
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The keyframe active at the playhead.
    pub fn current_keyframe(&self) -> &Keyframe {
        &self.keyframes[self.current]
    }

    /// Move the playhead by `delta_time` (`relative`) or to `delta_time`.
    ///
    /// The active keyframe becomes the last one whose time is at or before
    /// the playhead. Non-finite input is ignored.
    pub fn update(&mut self, delta_time: f32, relative: bool) {
        if !delta_time.is_finite() {
            tracing::warn!(
                "Ignoring non-finite animation time {} for `{}`",
                delta_time,
                self.name
            );
            return;
        }

        let requested = if relative {
            self.time + delta_time
        } else {
            delta_time
        };
        let duration = self.duration();

        let at_end = match self.end_behavior {
            EndBehavior::Clamp => {
                self.time = requested.clamp(0.0, duration);
                requested >= duration
            }
            EndBehavior::Loop => {
                self.time = if duration > 0.0 {
                    requested.rem_euclid(duration)
                } else {
                    0.0
                };
                false
            }
        };

        self.seek();
        self.state = if at_end {
            PlaybackState::AtEnd
        } else {
            PlaybackState::Playing
        };
    }

    /// Step to the next keyframe regardless of time.
    ///
    /// Past the last keyframe this holds (clamp) or wraps to the first (loop).
    /// The playhead jumps to the new keyframe's time.
    pub fn advance(&mut self) {
        let last = self.keyframes.len() - 1;
        if self.current < last {
            self.current += 1;
        } else if self.end_behavior == EndBehavior::Loop {
            self.current = 0;
        }

        self.time = self.keyframes[self.current].time;
        self.state = if self.end_behavior == EndBehavior::Clamp && self.current == last {
            PlaybackState::AtEnd
        } else {
            PlaybackState::Playing
        };
    }

    /// Back to the first keyframe with the playhead at 0.
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.current = 0;
        self.state = PlaybackState::Stopped;
    }

    /// Scan forward from the current keyframe; rewind first if the playhead
    /// moved backwards.
    fn seek(&mut self) {
        if self.time < self.keyframes[self.current].time {
            self.current = 0;
        }
        while self.current + 1 < self.keyframes.len()
            && self.keyframes[self.current + 1].time <= self.time
        {
            self.current += 1;
        }
    }
}
