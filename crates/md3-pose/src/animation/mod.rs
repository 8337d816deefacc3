//! MD3 animation math
//!
//! This module provides the numeric side of tag-linked posing:
//! - Quaternions with matrix conversion and SLERP
//! - 3x3 tag orientations and column-major 4x4 transforms
//! - Per-vertex keyframe interpolation
//! - Frame state and a driver for named animation ranges
//!
//! # Example
//!
//! ```rust
//! use md3_pose::animation::{Quat, Vec3};
//!
//! let a = Quat::from_axis_angle(0.0, Vec3::Z);
//! let b = Quat::from_axis_angle(90.0, Vec3::Z);
//! let half = a.slerp(&b, 0.5);
//! assert!(half.same_rotation(&Quat::from_axis_angle(45.0, Vec3::Z), 1e-5));
//! ```

mod driver;
mod interpolation;
mod matrix;
mod quaternion;
mod state;
mod types;

pub use driver::{AnimationDriver, AnimationId, AnimationRange, AnimationSet, Playback};
pub use interpolation::{
    InterpolatedSurface, NormalMode, interpolate_surface, interpolate_surface_into, lerp_normal,
    lerp_vertex,
};
pub use matrix::{Mat3, Mat4};
pub use quaternion::{Quat, SLERP_LINEAR_THRESHOLD};
pub use state::AnimationState;
pub use types::{Lerp, Vec3};
