//! Model tables, tag-linked trees and per-model edits

mod arena;
mod body_part;
mod node;
mod surface;
mod tag;

pub use arena::{ModelArena, ModelHandle, ReloadPolicy};
pub use body_part::BodyPart;
pub use node::{Axis, ModelData, ModelNode, SCALE_EPSILON};
pub use surface::{Shader, Surface, Triangle, Vertex};
pub use tag::{Frame, PSEUDO_ROOT_TAG, Tag};
