use thiserror::Error;

use crate::model::{BodyPart, ModelHandle};

/// Error types for model loading, linking and editing
///
/// None of these are produced while walking a tree: every index the traversal
/// relies on is checked when a model enters the arena.
#[derive(Error, Debug)]
pub enum PoseError {
    /// Model tables are inconsistent (tag/frame/vertex counts, indices)
    #[error("Validation error in model '{model}': {reason}")]
    ValidationError { model: String, reason: String },

    /// The handle refers to a model that has been unloaded
    #[error("Stale model handle: {0}")]
    StaleHandle(ModelHandle),

    /// Tag slot index is not valid for the model
    #[error("Tag slot {slot} out of range for model '{model}' ({count} slots)")]
    SlotOutOfRange {
        model: String,
        slot: usize,
        count: usize,
    },

    /// Tag slot already holds a child
    #[error("Tag slot {slot} of model '{model}' is already occupied")]
    SlotOccupied { model: String, slot: usize },

    /// Link would break the tree shape (cycle, second parent, self-link)
    #[error("Link error: {0}")]
    LinkError(String),

    /// No free tag in the tree matches the attachment's body part
    #[error("No free mount point for {part} attachment")]
    NoMountPoint { part: BodyPart },

    /// Animation is not present in the loaded animation table
    #[error("Animation error: {0}")]
    AnimationError(String),
}

/// Result type using PoseError
pub type Result<T> = std::result::Result<T, PoseError>;
