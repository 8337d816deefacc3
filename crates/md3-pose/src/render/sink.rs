//! Output side of the traversal
//!
//! The traversal does not rasterize anything. It hands fully posed triangle
//! lists to a [`DrawSink`], which may submit them to a GPU, print them, or
//! record them for inspection.

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use crate::animation::{Mat4, Vec3};
use crate::model::BodyPart;
use crate::scene::Mirror;

/// Texture identifier assigned by the host renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct TextureHandle(pub u32);

/// Fixed-function material, RGBA per term
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub emissive: [f32; 4],
    pub shininess: f32,
}

impl Material {
    /// Bright white, used under textures
    pub const WHITE: Self = Self {
        ambient: [1.0, 1.0, 1.0, 1.0],
        diffuse: [1.0, 1.0, 1.0, 1.0],
        specular: [1.0, 1.0, 1.0, 1.0],
        emissive: [0.0, 0.0, 0.0, 1.0],
        shininess: 32.0,
    };

    /// Translucent mirror surface
    pub const GLASS: Self = Self {
        ambient: [0.5, 0.5, 0.5, 0.5],
        diffuse: [0.1, 0.1, 0.1, 0.5],
        specular: [1.0, 1.0, 1.0, 1.0],
        emissive: [0.0, 0.0, 0.0, 1.0],
        shininess: 32.0,
    };
}

/// How triangles are rasterized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    Solid,
    Wireframe,
}

/// One posed vertex, in the model's local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawVertex {
    pub position: Vec3,
    pub normal: Vec3,
    /// Present only when textures are enabled
    pub uv: Option<[f32; 2]>,
}

/// A triangle list for one surface of one model
///
/// `vertices` holds three entries per triangle; `transform` maps them to
/// world space and already includes the model's own scale.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub model: &'a str,
    pub surface: &'a str,
    pub transform: Mat4,
    pub material: Material,
    pub texture: Option<TextureHandle>,
    pub vertices: &'a [DrawVertex],
    pub mode: DrawMode,
    pub lighting: bool,
    /// Body part reported by picking passes
    pub pick_name: Option<BodyPart>,
}

/// Receiver for everything a traversal produces
pub trait DrawSink {
    fn draw_mesh(&mut self, call: &DrawCall<'_>);

    /// Debug bounds: a box of half-size `radius` around `center`
    fn draw_bounds(&mut self, _transform: &Mat4, _center: Vec3, _radius: f32) {}

    /// Called before the scene is drawn again under a mirror's reflection
    ///
    /// `plane` places the mirror's unit plane in the world.
    fn begin_reflection(&mut self, _mirror: &Mirror, _plane: &Mat4) {}

    /// Called after the reflected scene, before the mirror itself is drawn
    fn end_reflection(&mut self, _mirror: &Mirror, _plane: &Mat4) {}
}

/// Owned copy of a [`DrawCall`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMesh {
    pub model: String,
    pub surface: String,
    pub transform: Mat4,
    pub material: Material,
    pub texture: Option<TextureHandle>,
    pub vertices: Vec<DrawVertex>,
    pub mode: DrawMode,
    pub lighting: bool,
    pub pick_name: Option<BodyPart>,
}

/// Everything a [`RecordingSink`] has seen, in order
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Mesh(RecordedMesh),
    Bounds {
        transform: Mat4,
        center: Vec3,
        radius: f32,
    },
    BeginReflection {
        normal: Vec3,
    },
    EndReflection,
}

/// Sink that keeps every call, for tests and offline inspection
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meshes(&self) -> impl Iterator<Item = &RecordedMesh> {
        self.events.iter().filter_map(|e| match e {
            SinkEvent::Mesh(mesh) => Some(mesh),
            _ => None,
        })
    }

    /// Meshes drawn for one model name
    pub fn meshes_for<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a RecordedMesh> {
        self.meshes().filter(move |m| m.model == model)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl DrawSink for RecordingSink {
    fn draw_mesh(&mut self, call: &DrawCall<'_>) {
        self.events.push(SinkEvent::Mesh(RecordedMesh {
            model: call.model.to_string(),
            surface: call.surface.to_string(),
            transform: call.transform,
            material: call.material,
            texture: call.texture,
            vertices: call.vertices.to_vec(),
            mode: call.mode,
            lighting: call.lighting,
            pick_name: call.pick_name,
        }));
    }

    fn draw_bounds(&mut self, transform: &Mat4, center: Vec3, radius: f32) {
        self.events.push(SinkEvent::Bounds {
            transform: *transform,
            center,
            radius,
        });
    }

    fn begin_reflection(&mut self, mirror: &Mirror, _plane: &Mat4) {
        self.events.push(SinkEvent::BeginReflection {
            normal: mirror.normal,
        });
    }

    fn end_reflection(&mut self, _mirror: &Mirror, _plane: &Mat4) {
        self.events.push(SinkEvent::EndReflection);
    }
}
