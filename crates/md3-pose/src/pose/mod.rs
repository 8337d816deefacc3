//! Pose composition and the tree traversal built on it

mod compose;
mod traverse;

pub use compose::{compose_custom_rotation, compose_rotation};
pub use traverse::{NodeVisit, PosedNode, RenderPass, Renderer, pose_tree, walk_tree};
