use std::fmt;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use super::arena::ModelHandle;
use super::body_part::BodyPart;
use super::surface::Surface;
use super::tag::{Frame, Tag};
use crate::animation::AnimationState;
use crate::error::{PoseError, Result};

/// Smallest scale factor a model can be given; zero is mapped to this
pub const SCALE_EPSILON: f32 = 0.01;

/// Rotation axis for custom model edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-support", serde(rename_all = "lowercase"))]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "x"),
            Self::Y => write!(f, "y"),
            Self::Z => write!(f, "z"),
        }
    }
}

/// Tables produced by a model loader
///
/// Tags are frame-major: `tags[frame * num_tags + slot]`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct ModelData {
    pub name: String,
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub body_part: BodyPart,
    pub num_frames: usize,
    pub num_tags: usize,
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub tags: Vec<Tag>,
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub frames: Vec<Frame>,
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub surfaces: Vec<Surface>,
}

impl ModelData {
    /// Check every table size and index the traversal relies on
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| PoseError::ValidationError {
            model: self.name.clone(),
            reason,
        };

        if self.num_frames == 0 {
            return Err(fail("model has no frames".into()));
        }
        if self.tags.len() != self.num_frames * self.num_tags {
            return Err(fail(format!(
                "tag table has {} entries, expected {} ({} frames x {} tags)",
                self.tags.len(),
                self.num_frames * self.num_tags,
                self.num_frames,
                self.num_tags
            )));
        }
        if self.frames.len() != self.num_frames {
            return Err(fail(format!(
                "frame table has {} entries for {} frames",
                self.frames.len(),
                self.num_frames
            )));
        }
        for surface in &self.surfaces {
            surface.validate().map_err(fail)?;
        }
        Ok(())
    }

    /// Total triangle count over all surfaces
    pub fn triangle_count(&self) -> usize {
        self.surfaces.iter().map(|s| s.triangles.len()).sum()
    }

    /// Tag name of each slot, taken from frame 0
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().take(self.num_tags).map(|t| t.name.as_str())
    }
}

/// A loaded model plus its edit and animation state
///
/// The loader tables are reachable through `Deref` to [`ModelData`]; the
/// per-instance state is only changed through methods that keep it valid.
#[derive(Debug, Clone)]
pub struct ModelNode {
    data: ModelData,
    pub(crate) links: Vec<Option<ModelHandle>>,
    pub(crate) parent: Option<(ModelHandle, usize)>,
    scale: f32,
    rotation: [f32; 3],
    anim: AnimationState,
    /// Emit the frame-0 bounds when drawn
    pub draw_bounding_box: bool,
}

impl ModelNode {
    /// Validate the tables and wrap them in a node with default edits
    pub fn new(data: ModelData) -> Result<Self> {
        data.validate()?;
        let links = vec![None; data.num_tags];
        Ok(Self {
            data,
            links,
            parent: None,
            scale: 1.0,
            rotation: [0.0; 3],
            anim: AnimationState::default(),
            draw_bounding_box: false,
        })
    }

    pub fn data(&self) -> &ModelData {
        &self.data
    }

    pub fn into_data(self) -> ModelData {
        self.data
    }

    /// Tag of `slot` at `frame`, wrapping the frame index
    pub fn tag(&self, frame: usize, slot: usize) -> Option<&Tag> {
        if slot >= self.data.num_tags || self.data.num_frames == 0 {
            return None;
        }
        let index = (frame % self.data.num_frames) * self.data.num_tags + slot;
        self.data.tags.get(index)
    }

    /// Slot whose tag carries `name`
    pub fn find_tag_slot(&self, name: &str) -> Option<usize> {
        self.data.tag_names().position(|n| n == name)
    }

    pub fn links(&self) -> &[Option<ModelHandle>] {
        &self.links
    }

    pub fn link(&self, slot: usize) -> Option<ModelHandle> {
        self.links.get(slot).copied().flatten()
    }

    /// Parent node and the slot this node hangs from
    pub fn parent(&self) -> Option<(ModelHandle, usize)> {
        self.parent
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Set the uniform scale; zero is clamped to [`SCALE_EPSILON`]
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = if scale == 0.0 { SCALE_EPSILON } else { scale };
    }

    /// Custom rotation in degrees, indexed by axis
    pub fn rotation(&self) -> [f32; 3] {
        self.rotation
    }

    pub fn rotation_about(&self, axis: Axis) -> f32 {
        self.rotation[axis.index()]
    }

    pub fn set_rotation(&mut self, axis: Axis, degrees: f32) {
        self.rotation[axis.index()] = degrees;
    }

    pub fn animation_state(&self) -> AnimationState {
        self.anim
    }

    pub fn set_animation_state(&mut self, state: AnimationState) {
        self.anim = state;
    }

    /// Drop scale and rotation edits
    pub fn reset_edits(&mut self) {
        self.scale = 1.0;
        self.rotation = [0.0; 3];
    }

    /// Label for selection displays; lights use their own model name
    pub fn display_name(&self) -> &str {
        match self.data.body_part {
            BodyPart::Light => &self.data.name,
            part => part.display_name(),
        }
    }
}

impl std::ops::Deref for ModelNode {
    type Target = ModelData;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Vec3;

    fn data(num_frames: usize, num_tags: usize) -> ModelData {
        let tags = (0..num_frames * num_tags)
            .map(|i| Tag::at(format!("tag_{}", i % num_tags), Vec3::new(i as f32, 0.0, 0.0)))
            .collect();
        ModelData {
            name: "lower".into(),
            body_part: BodyPart::Legs,
            num_frames,
            num_tags,
            tags,
            frames: vec![Frame::default(); num_frames],
            surfaces: Vec::new(),
        }
    }

    #[test]
    fn test_tag_lookup_wraps() {
        let node = ModelNode::new(data(3, 2)).unwrap();
        assert_eq!(node.tag(1, 1).unwrap().origin.x, 3.0);
        assert_eq!(node.tag(4, 1).unwrap().origin.x, 3.0);
        assert!(node.tag(0, 2).is_none());
    }

    #[test]
    fn test_validation_rejects_short_tag_table() {
        let mut d = data(3, 2);
        d.tags.pop();
        let err = ModelNode::new(d).unwrap_err();
        assert!(matches!(err, PoseError::ValidationError { .. }));
    }

    #[test]
    fn test_validation_rejects_zero_frames() {
        let d = data(0, 0);
        assert!(ModelNode::new(d).is_err());
    }

    #[test]
    fn test_zero_scale_clamped() {
        let mut node = ModelNode::new(data(1, 0)).unwrap();
        node.set_scale(0.0);
        assert_eq!(node.scale(), SCALE_EPSILON);
        node.set_scale(2.5);
        assert_eq!(node.scale(), 2.5);
    }

    #[test]
    fn test_reset_edits() {
        let mut node = ModelNode::new(data(1, 0)).unwrap();
        node.set_rotation(Axis::Y, 45.0);
        node.set_scale(3.0);
        node.reset_edits();
        assert_eq!(node.rotation(), [0.0; 3]);
        assert_eq!(node.scale(), 1.0);
    }

    #[test]
    fn test_light_display_name() {
        let mut d = data(1, 0);
        d.body_part = BodyPart::Light;
        d.name = "flashlight".into();
        let node = ModelNode::new(d).unwrap();
        assert_eq!(node.display_name(), "flashlight");
    }
}
