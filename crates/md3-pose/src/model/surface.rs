#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use crate::animation::Vec3;
use crate::render::TextureHandle;

/// One keyframed vertex
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl Vertex {
    pub const fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }
}

/// Triangle as three indices into a surface's per-frame vertex list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Triangle {
    pub indices: [u32; 3],
}

impl Triangle {
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self { indices: [a, b, c] }
    }
}

/// Surface material binding
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Shader {
    pub name: String,
    /// Texture assigned by the host, `None` until loaded
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub texture: Option<TextureHandle>,
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub hflip: bool,
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub vflip: bool,
}

impl Shader {
    /// Apply the horizontal/vertical flip flags to a texture coordinate
    pub fn map_uv(&self, uv: [f32; 2]) -> [f32; 2] {
        let u = if self.hflip { 1.0 - uv[0] } else { uv[0] };
        let v = if self.vflip { 1.0 - uv[1] } else { uv[1] };
        [u, v]
    }
}

/// Triangle mesh with per-frame vertex positions and normals
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Surface {
    pub name: String,
    pub num_frames: usize,
    pub num_verts: usize,
    /// Frame-major: `vertices[frame * num_verts + index]`
    pub vertices: Vec<Vertex>,
    /// Texture coordinates, shared by all frames
    pub uvs: Vec<[f32; 2]>,
    pub triangles: Vec<Triangle>,
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub shader: Shader,
}

impl Surface {
    /// Vertices of one frame, with the frame index wrapped to the surface's count
    pub fn frame_vertices(&self, frame: usize) -> &[Vertex] {
        if self.num_frames == 0 || self.num_verts == 0 {
            return &[];
        }
        let start = (frame % self.num_frames) * self.num_verts;
        self.vertices
            .get(start..start + self.num_verts)
            .unwrap_or(&[])
    }

    /// Check the vertex, UV and index tables against the declared counts
    pub fn validate(&self) -> Result<(), String> {
        if self.num_frames == 0 {
            return Err(format!("surface '{}' has no frames", self.name));
        }

        let expected = self.num_frames * self.num_verts;
        if self.vertices.len() != expected {
            return Err(format!(
                "surface '{}' has {} vertices, expected {} ({} frames x {} verts)",
                self.name,
                self.vertices.len(),
                expected,
                self.num_frames,
                self.num_verts
            ));
        }

        if self.uvs.len() != self.num_verts {
            return Err(format!(
                "surface '{}' has {} texture coordinates for {} vertices",
                self.name,
                self.uvs.len(),
                self.num_verts
            ));
        }

        for (i, tri) in self.triangles.iter().enumerate() {
            if let Some(bad) = tri
                .indices
                .iter()
                .find(|&&index| index as usize >= self.num_verts)
            {
                return Err(format!(
                    "surface '{}' triangle {} references vertex {} (only {} vertices)",
                    self.name, i, bad, self.num_verts
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Surface {
        let v = |x: f32| Vertex::new(Vec3::new(x, 0.0, 0.0), Vec3::Z);
        Surface {
            name: "quad".into(),
            num_frames: 2,
            num_verts: 3,
            vertices: vec![v(0.0), v(1.0), v(2.0), v(10.0), v(11.0), v(12.0)],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            triangles: vec![Triangle::new(0, 1, 2)],
            shader: Shader::default(),
        }
    }

    #[test]
    fn test_frame_vertices_wrap() {
        let surface = quad();
        assert_eq!(surface.frame_vertices(1)[0].position.x, 10.0);
        assert_eq!(surface.frame_vertices(2)[0].position.x, 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_index() {
        let mut surface = quad();
        assert!(surface.validate().is_ok());
        surface.triangles.push(Triangle::new(0, 1, 3));
        let err = surface.validate().unwrap_err();
        assert!(err.contains("references vertex 3"));
    }

    #[test]
    fn test_validate_rejects_short_vertex_table() {
        let mut surface = quad();
        surface.vertices.pop();
        assert!(surface.validate().is_err());
    }

    #[test]
    fn test_uv_flips() {
        let shader = Shader {
            hflip: true,
            ..Shader::default()
        };
        assert_eq!(shader.map_uv([0.25, 0.75]), [0.75, 0.75]);
    }
}
