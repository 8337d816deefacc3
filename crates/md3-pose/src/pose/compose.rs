use crate::animation::Quat;
use crate::model::{Axis, ModelNode, Tag};

/// Tag axis row each custom rotation turns about: x uses row 1, y uses row 0
const AXIS_ROWS: [(Axis, usize); 3] = [(Axis::X, 1), (Axis::Y, 0), (Axis::Z, 2)];

/// Orientation of a model's custom x/y/z rotation relative to its mount tag
///
/// The three rotations are applied in x, y, z order about the tag's axes and
/// accumulated left to right, so the result is `rx * ry * rz`. Order matters.
pub fn compose_custom_rotation(model: &ModelNode, mount_tag: &Tag) -> Quat {
    compose_rotation(model.rotation(), mount_tag)
}

/// [`compose_custom_rotation`] for a bare `[x, y, z]` degree triple
pub fn compose_rotation(degrees: [f32; 3], mount_tag: &Tag) -> Quat {
    AXIS_ROWS
        .iter()
        .fold(Quat::IDENTITY, |acc, &(axis, row)| {
            acc * Quat::from_axis_angle(degrees[axis.index()], mount_tag.axis.row(row))
        })
}
