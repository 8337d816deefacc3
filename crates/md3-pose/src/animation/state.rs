//! Per-model animation frame state

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Current position in a model's keyframe sequence
///
/// `t` is the blend factor from `frame` towards `next_frame` and stays in
/// `[0, 1)` while an animation advances.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct AnimationState {
    pub frame: usize,
    pub next_frame: usize,
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub t: f32,
}

impl AnimationState {
    pub const fn new(frame: usize, next_frame: usize, t: f32) -> Self {
        Self {
            frame,
            next_frame,
            t,
        }
    }

    /// Hold a single frame with no blending
    pub const fn still(frame: usize) -> Self {
        Self::new(frame, frame, 0.0)
    }

    /// Blend factor clamped to `[0, 1]`
    pub fn blend(&self) -> f32 {
        self.t.clamp(0.0, 1.0)
    }

    /// Whether the state blends between two distinct frames
    pub fn is_blending(&self) -> bool {
        self.frame != self.next_frame && self.t > 0.0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
