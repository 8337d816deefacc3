//! Render options and the draw sink the traversal writes to

mod config;
mod sink;

pub use config::{RenderConfig, RenderFlags};
pub use sink::{
    DrawCall, DrawMode, DrawSink, DrawVertex, Material, RecordedMesh, RecordingSink, SinkEvent,
    TextureHandle,
};
