//! Posing engine for tag-linked MD3 character models
//!
//! A player model is a tree: the legs carry a `tag_torso` the torso hangs
//! from, the torso carries `tag_head` and `tag_weapon`, and so on. Every frame
//! the tree is walked from the root, blending each tag between two keyframes
//! and composing the result with per-model edits, to produce world transforms
//! and interpolated triangle lists for a [`render::DrawSink`].
//!
//! ```rust
//! use md3_pose::animation::{Mat3, Mat4, Vec3};
//! use md3_pose::model::{BodyPart, Frame, ModelArena, ModelData, Tag};
//! use md3_pose::render::RenderConfig;
//! use md3_pose::pose::pose_tree;
//!
//! let mut arena = ModelArena::new();
//! let legs = arena.insert(ModelData {
//!     name: "lower".into(),
//!     body_part: BodyPart::Legs,
//!     num_frames: 1,
//!     num_tags: 1,
//!     tags: vec![Tag::new("tag_torso", Vec3::new(0.0, 0.0, 24.0), Mat3::IDENTITY)],
//!     frames: vec![Frame::default()],
//!     surfaces: vec![],
//! })?;
//! let torso = arena.insert(ModelData {
//!     name: "upper".into(),
//!     body_part: BodyPart::Torso,
//!     num_frames: 1,
//!     frames: vec![Frame::default()],
//!     ..ModelData::default()
//! })?;
//! arena.relink(legs, torso)?;
//!
//! let posed = pose_tree(&arena, legs, Mat4::IDENTITY, &RenderConfig::default())?;
//! assert_eq!(posed[1].origin(), Vec3::new(0.0, 0.0, 24.0));
//! # Ok::<(), md3_pose::PoseError>(())
//! ```

pub mod animation;
pub mod error;
pub mod model;
pub mod pose;
pub mod render;
pub mod scene;

// Re-export common types
pub use error::{PoseError, Result};
pub use model::{BodyPart, ModelArena, ModelHandle};
pub use scene::Scene;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
