//! A posed character plus the flashlight and mirrors around it

use log::debug;
#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use crate::animation::{Mat4, Vec3};
use crate::error::Result;
use crate::model::{ModelArena, ModelHandle};
use crate::pose::{PosedNode, RenderPass, Renderer, pose_tree};
use crate::render::{DrawSink, RenderConfig, RenderFlags};

/// Uniform scale the flashlight model is drawn at
const FLASHLIGHT_SCALE: f32 = 0.8;

/// Side length of a mirror's plane, in world units
const MIRROR_PLANE_SIZE: f32 = 100.0;

/// The movable light and the pose of its flashlight model
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-support", serde(default))]
pub struct Light {
    pub position: Vec3,
    /// Orbit angles around the scene origin, in degrees
    pub trot: f32,
    pub prot: f32,
    /// Orbit radius
    pub distance: f32,
    /// Beam direction: turn about y (left/right) in degrees
    pub dir_trot: f32,
    /// Beam direction: turn about z (up/down) in degrees
    pub dir_prot: f32,
}

impl Light {
    /// Transform the flashlight model is drawn under, before the scene base
    pub fn flashlight_transform(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_axis_angle(self.dir_prot, Vec3::Z)
            * Mat4::from_axis_angle(self.dir_trot, Vec3::Y)
            * Mat4::from_axis_angle(-90.0, Vec3::Y)
            * Mat4::from_uniform_scale(FLASHLIGHT_SCALE)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec3::new(100.0, 1.0, 10.0),
            trot: 0.0,
            prot: 0.0,
            distance: 100.0,
            dir_trot: 0.0,
            dir_prot: 0.0,
        }
    }
}

/// Axis-aligned reflecting plane
///
/// `normal` components are expected to be -1, 0 or 1. The reflection scales
/// the scene by every nonzero component, so a -1 mirrors that axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Mirror {
    pub origin: Vec3,
    pub normal: Vec3,
    /// Rotation placing the unit plane, in degrees about `axis`
    #[cfg_attr(feature = "serde-support", serde(default))]
    pub angle: f32,
    #[cfg_attr(feature = "serde-support", serde(default = "default_mirror_axis"))]
    pub axis: Vec3,
}

#[cfg(feature = "serde-support")]
fn default_mirror_axis() -> Vec3 {
    Vec3::X
}

impl Mirror {
    pub fn new(origin: Vec3, normal: Vec3) -> Self {
        Self {
            origin,
            normal,
            angle: 0.0,
            axis: Vec3::X,
        }
    }

    /// Transform the scene is drawn under to appear in this mirror
    pub fn reflection(&self) -> Mat4 {
        let flip = |n: f32| if n == 0.0 { 1.0 } else { n };
        Mat4::from_translation(self.origin.scale_by(self.normal) * -2.0)
            * Mat4::from_scale(Vec3::new(
                flip(self.normal.x),
                flip(self.normal.y),
                flip(self.normal.z),
            ))
    }

    /// Placement of the mirror's unit plane
    pub fn plane_transform(&self) -> Mat4 {
        Mat4::from_axis_angle(self.angle, self.axis)
            * Mat4::from_translation(self.origin)
            * Mat4::from_scale(Vec3::new(MIRROR_PLANE_SIZE, 1.0, MIRROR_PLANE_SIZE))
    }
}

/// Everything drawn in a frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    /// Root of the character tree, usually the legs
    pub root: Option<ModelHandle>,
    pub light_model: Option<ModelHandle>,
    pub light: Light,
    pub mirrors: Vec<Mirror>,
}

impl Scene {
    pub fn new(root: Option<ModelHandle>) -> Self {
        Self {
            root,
            ..Self::default()
        }
    }

    /// Base transform of the character: model space is z-up, the view is y-up
    pub fn root_base() -> Mat4 {
        Mat4::from_axis_angle(-90.0, Vec3::X)
    }

    /// Draw the character, the flashlight and every mirror image
    pub fn render(
        &self,
        arena: &ModelArena,
        config: &RenderConfig,
        sink: &mut dyn DrawSink,
    ) -> Result<()> {
        let mut renderer = Renderer::new(arena, config);
        self.render_primitives(&mut renderer, Mat4::IDENTITY, true, sink)?;

        if config.is_set(RenderFlags::MIRRORS) {
            for mirror in &self.mirrors {
                let plane = mirror.plane_transform();
                sink.begin_reflection(mirror, &plane);
                self.render_primitives(&mut renderer, mirror.reflection(), false, sink)?;
                sink.end_reflection(mirror, &plane);
            }
        }
        Ok(())
    }

    /// Draw the ordinary models under `base`
    fn render_primitives(
        &self,
        renderer: &mut Renderer<'_>,
        base: Mat4,
        apply_names: bool,
        sink: &mut dyn DrawSink,
    ) -> Result<()> {
        let pass = RenderPass {
            apply_names,
            lighting: true,
        };
        renderer.render_node(self.root, None, base * Self::root_base(), pass, sink)?;

        if renderer.config().is_set(RenderFlags::FLASHLIGHT) {
            let pass = RenderPass {
                apply_names: true,
                lighting: false,
            };
            let transform = base * self.light.flashlight_transform();
            renderer.render_node(self.light_model, None, transform, pass, sink)?;
        }
        Ok(())
    }

    /// World placement of every node of the character tree, as drawn
    pub fn pose(&self, arena: &ModelArena, config: &RenderConfig) -> Result<Vec<PosedNode>> {
        let Some(root) = self.root else {
            debug!("Scene has no root model");
            return Ok(Vec::new());
        };
        pose_tree(arena, root, Self::root_base(), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BodyPart, Frame, ModelData, Shader, Surface, Triangle, Vertex};
    use crate::render::{RecordingSink, SinkEvent};

    fn mesh_model(name: &str, part: BodyPart) -> ModelData {
        ModelData {
            name: name.into(),
            body_part: part,
            num_frames: 1,
            num_tags: 0,
            tags: Vec::new(),
            frames: vec![Frame::default()],
            surfaces: vec![Surface {
                name: "s".into(),
                num_frames: 1,
                num_verts: 3,
                vertices: vec![Vertex::new(Vec3::X, Vec3::Z); 3],
                uvs: vec![[0.0, 0.0]; 3],
                triangles: vec![Triangle::new(0, 1, 2)],
                shader: Shader::default(),
            }],
        }
    }

    fn scene(arena: &mut ModelArena) -> Scene {
        let root = arena.insert(mesh_model("lower", BodyPart::Legs)).unwrap();
        let light = arena.insert(mesh_model("flashlight", BodyPart::Light)).unwrap();
        Scene {
            root: Some(root),
            light_model: Some(light),
            light: Light::default(),
            mirrors: vec![Mirror::new(Vec3::new(0.0, -5.0, 0.0), Vec3::new(0.0, -1.0, 0.0))],
        }
    }

    #[test]
    fn test_root_drawn_z_up() {
        let mut arena = ModelArena::new();
        let scene = scene(&mut arena);
        let mut sink = RecordingSink::new();
        scene.render(&arena, &RenderConfig::default(), &mut sink).unwrap();

        let meshes: Vec<_> = sink.meshes().collect();
        assert_eq!(meshes.len(), 1);
        // Model +z ends up on view +y
        let up = meshes[0].transform.transform_normal(Vec3::Z);
        assert!(up.abs_diff_eq(Vec3::Y, 1e-6));
        assert_eq!(meshes[0].pick_name, Some(BodyPart::Legs));
    }

    #[test]
    fn test_flashlight_unlit() {
        let mut arena = ModelArena::new();
        let scene = scene(&mut arena);
        let mut config = RenderConfig::default();
        config.set_flashlight(true);
        let mut sink = RecordingSink::new();
        scene.render(&arena, &config, &mut sink).unwrap();

        let light = sink.meshes_for("flashlight").next().unwrap();
        assert!(!light.lighting);
        let origin = light.transform.transform_point(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(100.0, 1.0, 10.0), 1e-4));
        assert!(sink.meshes_for("lower").next().unwrap().lighting);
    }

    #[test]
    fn test_mirror_pass() {
        let mut arena = ModelArena::new();
        let scene = scene(&mut arena);
        let mut config = RenderConfig::default();
        config.set(RenderFlags::MIRRORS, true);
        let mut sink = RecordingSink::new();
        scene.render(&arena, &config, &mut sink).unwrap();

        assert_eq!(sink.meshes().count(), 2);
        assert!(matches!(sink.events[1], SinkEvent::BeginReflection { .. }));
        assert_eq!(sink.events[3], SinkEvent::EndReflection);

        let SinkEvent::Mesh(reflected) = &sink.events[2] else {
            panic!("expected reflected mesh");
        };
        assert_eq!(reflected.pick_name, None);
        // Plane at y = -5 facing down: view +y maps to -y, origin moves to y = -10
        let p = reflected.transform.transform_point(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(0.0, -10.0, 0.0), 1e-5));
    }

    #[test]
    fn test_reflection_transform() {
        let mirror = Mirror::new(Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, 1.0));
        let m = mirror.reflection();
        assert!(m.transform_point(Vec3::new(1.0, 2.0, 3.0)).abs_diff_eq(Vec3::new(1.0, 2.0, -3.0), 1e-6));
    }

    #[test]
    fn test_scene_without_root() {
        let arena = ModelArena::new();
        let scene = Scene::default();
        let mut sink = RecordingSink::new();
        scene.render(&arena, &RenderConfig::default(), &mut sink).unwrap();
        assert!(sink.events.is_empty());
        assert!(scene.pose(&arena, &RenderConfig::default()).unwrap().is_empty());
    }
}
