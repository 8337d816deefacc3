use bitflags::bitflags;
#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use crate::animation::NormalMode;

bitflags! {
    /// Switches that change what a frame draws
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
    pub struct RenderFlags: u32 {
        /// Draw triangle outlines instead of filled triangles
        const WIREFRAME = 0x01;
        /// Bind surface textures and emit texture coordinates
        const TEXTURES = 0x02;
        /// Light the models
        const LIGHTING = 0x04;
        /// Render the scene again through every mirror
        const MIRRORS = 0x08;
        /// Blend between the current and next keyframe
        const INTERPOLATE = 0x10;
        /// Draw the flashlight model
        const FLASHLIGHT = 0x20;
        /// Repeat one-shot animations
        const ANIM_LOOP = 0x40;
    }
}

impl Default for RenderFlags {
    fn default() -> Self {
        Self::TEXTURES | Self::LIGHTING | Self::INTERPOLATE
    }
}

/// Options read by every traversal
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RenderConfig {
    pub flags: RenderFlags,
    /// Distance from the camera to the scene origin
    pub camera_distance: f32,
    pub normal_mode: NormalMode,
}

impl RenderConfig {
    pub const DEFAULT_CAMERA_DISTANCE: f32 = 100.0;
    /// Camera pulled back so the flashlight beam is visible
    pub const FLASHLIGHT_CAMERA_DISTANCE: f32 = 400.0;

    pub fn new(flags: RenderFlags) -> Self {
        Self {
            flags,
            ..Self::default()
        }
    }

    pub fn is_set(&self, flag: RenderFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Turn `flag` on or off
    pub fn set(&mut self, flag: RenderFlags, enabled: bool) {
        self.flags.set(flag, enabled);
    }

    /// Toggle the flashlight, moving the camera to match
    pub fn set_flashlight(&mut self, enabled: bool) {
        self.set(RenderFlags::FLASHLIGHT, enabled);
        self.camera_distance = if enabled {
            Self::FLASHLIGHT_CAMERA_DISTANCE
        } else {
            Self::DEFAULT_CAMERA_DISTANCE
        };
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            flags: RenderFlags::default(),
            camera_distance: Self::DEFAULT_CAMERA_DISTANCE,
            normal_mode: NormalMode::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert!(config.is_set(RenderFlags::TEXTURES));
        assert!(config.is_set(RenderFlags::LIGHTING));
        assert!(config.is_set(RenderFlags::INTERPOLATE));
        assert!(!config.is_set(RenderFlags::WIREFRAME));
        assert!(!config.is_set(RenderFlags::MIRRORS));
        assert_eq!(config.camera_distance, 100.0);
        assert_eq!(config.normal_mode, NormalMode::AsIs);
    }

    #[test]
    fn test_flashlight_moves_camera() {
        let mut config = RenderConfig::default();
        config.set_flashlight(true);
        assert!(config.is_set(RenderFlags::FLASHLIGHT));
        assert_eq!(config.camera_distance, 400.0);
        config.set_flashlight(false);
        assert_eq!(config.camera_distance, 100.0);
    }

    #[test]
    fn test_set_flag() {
        let mut config = RenderConfig::default();
        config.set(RenderFlags::TEXTURES, false);
        config.set(RenderFlags::WIREFRAME, true);
        assert_eq!(
            config.flags,
            RenderFlags::LIGHTING | RenderFlags::INTERPOLATE | RenderFlags::WIREFRAME
        );
    }
}
