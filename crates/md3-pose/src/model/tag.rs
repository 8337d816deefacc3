#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use crate::animation::{Mat3, Mat4, Vec3};

/// Attachment point of a model for one animation frame
///
/// Origin and axes are expressed in the owning model's local space.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Tag {
    pub name: String,
    pub origin: Vec3,
    pub axis: Mat3,
}

/// Mount tag used for the root of a tree, which has no parent attachment
pub static PSEUDO_ROOT_TAG: Tag = Tag {
    name: String::new(),
    origin: Vec3::ZERO,
    axis: Mat3::IDENTITY,
};

impl Tag {
    pub fn new(name: impl Into<String>, origin: Vec3, axis: Mat3) -> Self {
        Self {
            name: name.into(),
            origin,
            axis,
        }
    }

    /// Tag at `origin` with identity orientation
    pub fn at(name: impl Into<String>, origin: Vec3) -> Self {
        Self::new(name, origin, Mat3::IDENTITY)
    }

    /// The tag as a rigid transform
    pub fn to_mat4(&self) -> Mat4 {
        self.axis.to_mat4(self.origin)
    }
}

impl Default for Tag {
    fn default() -> Self {
        PSEUDO_ROOT_TAG.clone()
    }
}

/// Per-frame bounds, as stored in MD3 frame headers
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Frame {
    pub name: String,
    pub min_bounds: Vec3,
    pub max_bounds: Vec3,
    pub local_origin: Vec3,
    pub radius: f32,
}

impl Frame {
    /// Frame whose bounds enclose a sphere of `radius` around `local_origin`
    pub fn with_radius(name: impl Into<String>, local_origin: Vec3, radius: f32) -> Self {
        let extent = Vec3::new(radius, radius, radius);
        Self {
            name: name.into(),
            min_bounds: local_origin - extent,
            max_bounds: local_origin + extent,
            local_origin,
            radius,
        }
    }
}
