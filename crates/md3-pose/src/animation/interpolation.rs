//! Per-vertex keyframe interpolation for MD3 surfaces

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use super::types::{Lerp, Vec3};
use crate::model::Surface;

/// How blended normals are post-processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum NormalMode {
    /// Use the linear blend directly; slightly shortened between keyframes
    #[default]
    AsIs,
    /// Rescale the blend back to unit length
    Renormalize,
}

/// Blend two keyframe positions
#[inline]
pub fn lerp_vertex(v1: Vec3, v2: Vec3, t: f32) -> Vec3 {
    v1.lerp(&v2, t)
}

/// Blend two keyframe normals
#[inline]
pub fn lerp_normal(n1: Vec3, n2: Vec3, t: f32, mode: NormalMode) -> Vec3 {
    let n = n1.lerp(&n2, t);
    match mode {
        NormalMode::AsIs => n,
        NormalMode::Renormalize => n.normalize(),
    }
}

/// Blended vertex data for one surface
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterpolatedSurface {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

/// Blend every vertex of `surface` between two frames
///
/// Frame indices wrap modulo the surface's own frame count, so a surface with
/// fewer frames than its model still yields data.
pub fn interpolate_surface(
    surface: &Surface,
    frame: usize,
    next_frame: usize,
    t: f32,
    mode: NormalMode,
) -> InterpolatedSurface {
    let mut out = InterpolatedSurface::default();
    interpolate_surface_into(surface, frame, next_frame, t, mode, &mut out);
    out
}

/// Same as [`interpolate_surface`] but reuses the output buffers
pub fn interpolate_surface_into(
    surface: &Surface,
    frame: usize,
    next_frame: usize,
    t: f32,
    mode: NormalMode,
    out: &mut InterpolatedSurface,
) {
    out.positions.clear();
    out.normals.clear();

    let current = surface.frame_vertices(frame);
    let next = surface.frame_vertices(next_frame);

    out.positions.reserve(current.len());
    out.normals.reserve(current.len());

    for (a, b) in current.iter().zip(next.iter()) {
        out.positions.push(lerp_vertex(a.position, b.position, t));
        out.normals.push(lerp_normal(a.normal, b.normal, t, mode));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Shader, Triangle, Vertex};

    fn two_frame_surface() -> Surface {
        Surface {
            name: "s".into(),
            num_frames: 2,
            num_verts: 1,
            vertices: vec![
                Vertex::new(Vec3::new(0.0, 0.0, 0.0), Vec3::X),
                Vertex::new(Vec3::new(4.0, 2.0, 0.0), Vec3::Y),
            ],
            uvs: vec![[0.0, 0.0]],
            triangles: vec![Triangle::new(0, 0, 0)],
            shader: Shader::default(),
        }
    }

    #[test]
    fn test_lerp_vertex_same_input() {
        let v = Vec3::new(1.0, -2.0, 3.0);
        for t in [0.0, 0.3, 0.99] {
            assert_eq!(lerp_vertex(v, v, t), v);
        }
    }

    #[test]
    fn test_lerp_normal_modes() {
        let n = lerp_normal(Vec3::X, Vec3::Y, 0.5, NormalMode::AsIs);
        assert!((n.length() - 0.5f32.sqrt()).abs() < 1e-6);

        let n = lerp_normal(Vec3::X, Vec3::Y, 0.5, NormalMode::Renormalize);
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_interpolate_surface_blend() {
        let surface = two_frame_surface();
        let out = interpolate_surface(&surface, 0, 1, 0.25, NormalMode::AsIs);
        assert_eq!(out.positions, vec![Vec3::new(1.0, 0.5, 0.0)]);
        assert_eq!(out.normals.len(), 1);
    }

    #[test]
    fn test_interpolate_surface_same_frame_passes_through() {
        let surface = two_frame_surface();
        let out = interpolate_surface(&surface, 1, 1, 0.7, NormalMode::AsIs);
        assert_eq!(out.positions[0], Vec3::new(4.0, 2.0, 0.0));
        assert_eq!(out.normals[0], Vec3::Y);
    }

    #[test]
    fn test_interpolate_surface_wraps_frames() {
        let surface = two_frame_surface();
        // Frame 3 wraps to 1, frame 2 wraps to 0
        let out = interpolate_surface(&surface, 3, 2, 1.0, NormalMode::AsIs);
        assert_eq!(out.positions[0], Vec3::ZERO);
    }
}
