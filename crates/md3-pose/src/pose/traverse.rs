//! Recursive posing walk over a tag-linked model tree
//!
//! Each node's world transform is its parent's transform, times the tag the
//! node hangs from (blended between the current and next frame), times the
//! node's own custom rotation. Transforms are passed down by value, so
//! siblings never see each other's state. A node's scale only affects its
//! own geometry and the origins of the tags it carries.

use log::trace;

use super::compose::compose_custom_rotation;
use crate::animation::{
    InterpolatedSurface, Mat4, Quat, Vec3, interpolate_surface_into, lerp_vertex,
};
use crate::error::Result;
use crate::model::{BodyPart, ModelArena, ModelHandle, ModelNode, PSEUDO_ROOT_TAG, Tag};
use crate::render::{DrawCall, DrawMode, DrawSink, DrawVertex, Material, RenderConfig, RenderFlags};

/// Bounding box half-size relative to the frame radius
const BOUNDS_RADIUS_DIVISOR: f32 = 2.5;

/// A node reached by [`walk_tree`], with everything needed to draw it
#[derive(Debug, Clone, Copy)]
pub struct NodeVisit<'a> {
    pub handle: ModelHandle,
    pub node: &'a ModelNode,
    /// Tag the node is mounted on, the pseudo root tag for the root
    pub mount_tag: &'a Tag,
    pub depth: usize,
    /// Transform inherited by children (custom rotation applied, no scale)
    pub world: Mat4,
    /// Transform for the node's own geometry (`world` times its scale)
    pub draw_transform: Mat4,
    pub frame: usize,
    pub next_frame: usize,
    /// Effective blend factor
    pub t: f32,
}

/// Visit `root` and every model linked below it, parents before children
///
/// `mount_tag` is the tag `root` hangs from; `None` uses the pseudo root tag.
/// A stale `root` handle is an error. Empty slots are skipped.
pub fn walk_tree<'a, F>(
    arena: &'a ModelArena,
    root: ModelHandle,
    mount_tag: Option<&'a Tag>,
    base: Mat4,
    config: &RenderConfig,
    visit: &mut F,
) -> Result<()>
where
    F: FnMut(&NodeVisit<'a>),
{
    let node = arena.get(root)?;
    let interpolate = config.is_set(RenderFlags::INTERPOLATE);
    walk_node(
        arena,
        root,
        node,
        mount_tag.unwrap_or(&PSEUDO_ROOT_TAG),
        base,
        0,
        interpolate,
        visit,
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn walk_node<'a, F>(
    arena: &'a ModelArena,
    handle: ModelHandle,
    node: &'a ModelNode,
    mount_tag: &'a Tag,
    inherited: Mat4,
    depth: usize,
    interpolate: bool,
    visit: &mut F,
) where
    F: FnMut(&NodeVisit<'a>),
{
    // Custom rotation propagates to children
    let custom = compose_custom_rotation(node, mount_tag).to_matrix4x4(None);
    let world = inherited * custom;

    // Scale does not
    let scale = node.scale();
    let draw_transform = if scale == 1.0 {
        world
    } else {
        world * Mat4::from_uniform_scale(scale)
    };

    let anim = node.animation_state();
    let t = if interpolate { anim.blend() } else { 0.0 };

    trace!(
        "Posing '{}' ({handle}) depth {depth} frame {}->{} t={t}",
        node.name,
        anim.frame,
        anim.next_frame
    );

    visit(&NodeVisit {
        handle,
        node,
        mount_tag,
        depth,
        world,
        draw_transform,
        frame: anim.frame,
        next_frame: anim.next_frame,
        t,
    });

    for (slot, link) in node.links().iter().enumerate() {
        let Some(child) = *link else {
            continue;
        };
        let Ok(child_node) = arena.get(child) else {
            continue;
        };
        let (Some(tag), Some(next_tag)) = (node.tag(anim.frame, slot), node.tag(anim.next_frame, slot))
        else {
            continue;
        };

        // The tag origin follows the scaled geometry so parts stay joined
        let origin = lerp_vertex(tag.origin, next_tag.origin, t) * scale;

        let q1 = Quat::from_matrix3x3(&tag.axis);
        let q2 = Quat::from_matrix3x3(&next_tag.axis);
        let rotation = q1.slerp(&q2, t);

        let child_inherited = world * rotation.to_matrix4x4(Some(origin));
        walk_node(
            arena,
            child,
            child_node,
            tag,
            child_inherited,
            depth + 1,
            interpolate,
            visit,
        );
    }
}

/// Options for one drawing pass over a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPass {
    /// Tag each draw with the node's body part for picking
    pub apply_names: bool,
    /// Allow lighting; the flashlight model turns this off
    pub lighting: bool,
}

impl Default for RenderPass {
    fn default() -> Self {
        Self {
            apply_names: true,
            lighting: true,
        }
    }
}

/// Draws trees into a [`DrawSink`], reusing vertex buffers between calls
#[derive(Debug)]
pub struct Renderer<'a> {
    arena: &'a ModelArena,
    config: &'a RenderConfig,
    interpolated: InterpolatedSurface,
    vertices: Vec<DrawVertex>,
}

impl<'a> Renderer<'a> {
    pub fn new(arena: &'a ModelArena, config: &'a RenderConfig) -> Self {
        Self {
            arena,
            config,
            interpolated: InterpolatedSurface::default(),
            vertices: Vec::new(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        self.config
    }

    /// Draw a model and everything linked below it
    ///
    /// `None` for the model draws nothing. `None` for the mount tag means the
    /// model is a root.
    pub fn render_node(
        &mut self,
        model: Option<ModelHandle>,
        mount_tag: Option<&'a Tag>,
        inherited: Mat4,
        pass: RenderPass,
        sink: &mut dyn DrawSink,
    ) -> Result<()> {
        let Some(model) = model else {
            return Ok(());
        };

        let config = self.config;
        let interpolated = &mut self.interpolated;
        let vertices = &mut self.vertices;
        walk_tree(self.arena, model, mount_tag, inherited, config, &mut |visit| {
            draw_node(visit, config, pass, interpolated, vertices, sink);
        })
    }

    /// Draw a tree from its root
    pub fn render_tree(
        &mut self,
        root: ModelHandle,
        base: Mat4,
        pass: RenderPass,
        sink: &mut dyn DrawSink,
    ) -> Result<()> {
        self.render_node(Some(root), None, base, pass, sink)
    }
}

fn draw_node(
    visit: &NodeVisit<'_>,
    config: &RenderConfig,
    pass: RenderPass,
    interpolated: &mut InterpolatedSurface,
    vertices: &mut Vec<DrawVertex>,
    sink: &mut dyn DrawSink,
) {
    let node = visit.node;
    let textures = config.is_set(RenderFlags::TEXTURES);
    let mode = if config.is_set(RenderFlags::WIREFRAME) {
        DrawMode::Wireframe
    } else {
        DrawMode::Solid
    };
    let lighting = pass.lighting && config.is_set(RenderFlags::LIGHTING);
    let pick_name = pass.apply_names.then_some(node.body_part);

    for (index, surface) in node.surfaces.iter().enumerate() {
        interpolate_surface_into(
            surface,
            visit.frame,
            visit.next_frame,
            visit.t,
            config.normal_mode,
            interpolated,
        );

        vertices.clear();
        for tri in &surface.triangles {
            for &i in &tri.indices {
                let i = i as usize;
                let (Some(&position), Some(&normal)) =
                    (interpolated.positions.get(i), interpolated.normals.get(i))
                else {
                    continue;
                };
                let uv = if textures {
                    surface.uvs.get(i).map(|&uv| surface.shader.map_uv(uv))
                } else {
                    None
                };
                vertices.push(DrawVertex {
                    position,
                    normal,
                    uv,
                });
            }
        }

        sink.draw_mesh(&DrawCall {
            model: &node.name,
            surface: &surface.name,
            transform: visit.draw_transform,
            material: Material::WHITE,
            texture: if textures { surface.shader.texture } else { None },
            vertices: vertices.as_slice(),
            mode,
            lighting,
            pick_name,
        });

        if index == 0
            && node.draw_bounding_box
            && let Some(frame) = node.frames.first()
        {
            sink.draw_bounds(
                &visit.draw_transform,
                frame.local_origin,
                frame.radius / BOUNDS_RADIUS_DIVISOR,
            );
        }
    }
}

/// World placement of one node, as computed by the traversal
#[derive(Debug, Clone, PartialEq)]
pub struct PosedNode {
    pub handle: ModelHandle,
    pub name: String,
    pub body_part: BodyPart,
    pub depth: usize,
    /// Tag slot name the node is mounted on, empty for the root
    pub mount_tag: String,
    pub world: Mat4,
}

impl PosedNode {
    pub fn origin(&self) -> Vec3 {
        self.world.translation()
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_matrix4x4(&self.world)
    }
}

/// Pose every node of `root`'s tree without drawing
pub fn pose_tree(
    arena: &ModelArena,
    root: ModelHandle,
    base: Mat4,
    config: &RenderConfig,
) -> Result<Vec<PosedNode>> {
    let mut posed = Vec::new();
    walk_tree(arena, root, None, base, config, &mut |visit| {
        posed.push(PosedNode {
            handle: visit.handle,
            name: visit.node.name.clone(),
            body_part: visit.node.body_part,
            depth: visit.depth,
            mount_tag: visit.mount_tag.name.clone(),
            world: visit.world,
        });
    })?;
    Ok(posed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationState, Mat3};
    use crate::model::{Axis, Frame, ModelData, Shader, Surface, Triangle, Vertex};
    use crate::render::{RecordingSink, SinkEvent, TextureHandle};

    fn triangle_surface(num_frames: usize) -> Surface {
        let vertices = (0..num_frames)
            .flat_map(|f| {
                let x = f as f32;
                [
                    Vertex::new(Vec3::new(x, 0.0, 0.0), Vec3::Z),
                    Vertex::new(Vec3::new(x, 1.0, 0.0), Vec3::Z),
                    Vertex::new(Vec3::new(x, 0.0, 1.0), Vec3::Z),
                ]
            })
            .collect();
        Surface {
            name: "mesh".into(),
            num_frames,
            num_verts: 3,
            vertices,
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            triangles: vec![Triangle::new(0, 1, 2)],
            shader: Shader {
                name: "skin".into(),
                texture: Some(TextureHandle(7)),
                hflip: false,
                vflip: true,
            },
        }
    }

    fn model(name: &str, part: BodyPart, tags: Vec<Tag>, num_frames: usize) -> ModelData {
        let num_tags = tags.len() / num_frames;
        ModelData {
            name: name.into(),
            body_part: part,
            num_frames,
            num_tags,
            tags,
            frames: vec![Frame::with_radius("f", Vec3::ZERO, 10.0); num_frames],
            surfaces: vec![triangle_surface(num_frames)],
        }
    }

    /// Legs with one tag that moves from z=10 to z=20 and turns 90 degrees about z
    fn two_node_tree(arena: &mut ModelArena) -> (ModelHandle, ModelHandle) {
        let turned = Mat3::from_rows([Vec3::Y, -Vec3::X, Vec3::Z]);
        let tags = vec![
            Tag::new("tag_torso", Vec3::new(0.0, 0.0, 10.0), Mat3::IDENTITY),
            Tag::new("tag_torso", Vec3::new(0.0, 0.0, 20.0), turned),
        ];
        let legs = arena
            .insert(model("lower", BodyPart::Legs, tags, 2))
            .unwrap();
        let torso = arena
            .insert(model("upper", BodyPart::Torso, vec![], 2))
            .unwrap();
        arena.link(legs, 0, torso).unwrap();
        (legs, torso)
    }

    #[test]
    fn test_blended_tag_transform() {
        let mut arena = ModelArena::new();
        let (legs, _) = two_node_tree(&mut arena);
        arena
            .get_mut(legs)
            .unwrap()
            .set_animation_state(AnimationState::new(0, 1, 0.5));

        let posed = pose_tree(&arena, legs, Mat4::IDENTITY, &RenderConfig::default()).unwrap();
        assert_eq!(posed.len(), 2);
        assert!(posed[1].origin().abs_diff_eq(Vec3::new(0.0, 0.0, 15.0), 1e-5));
        assert!(
            posed[1]
                .orientation()
                .same_rotation(&Quat::from_axis_angle(45.0, Vec3::Z), 1e-5)
        );
        assert_eq!(posed[1].mount_tag, "tag_torso");
        assert_eq!(posed[0].mount_tag, "");
    }

    #[test]
    fn test_interpolation_disabled_snaps_to_frame() {
        let mut arena = ModelArena::new();
        let (legs, _) = two_node_tree(&mut arena);
        arena
            .get_mut(legs)
            .unwrap()
            .set_animation_state(AnimationState::new(0, 1, 0.5));

        let mut config = RenderConfig::default();
        config.set(RenderFlags::INTERPOLATE, false);
        let posed = pose_tree(&arena, legs, Mat4::IDENTITY, &config).unwrap();
        assert!(posed[1].origin().abs_diff_eq(Vec3::new(0.0, 0.0, 10.0), 1e-6));
    }

    #[test]
    fn test_scale_moves_tag_origin_but_not_children() {
        let mut arena = ModelArena::new();
        let (legs, _) = two_node_tree(&mut arena);
        arena.set_scale(legs, 2.0).unwrap();

        let posed = pose_tree(&arena, legs, Mat4::IDENTITY, &RenderConfig::default()).unwrap();
        assert!(posed[1].origin().abs_diff_eq(Vec3::new(0.0, 0.0, 20.0), 1e-5));
        // Child transform carries no scale
        let x = posed[1].world.transform_normal(Vec3::X);
        assert!((x.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_custom_rotation_propagates() {
        let mut arena = ModelArena::new();
        let (legs, _) = two_node_tree(&mut arena);
        arena.set_rotation(legs, Axis::Z, 90.0).unwrap();

        let posed = pose_tree(&arena, legs, Mat4::IDENTITY, &RenderConfig::default()).unwrap();
        // Tag origin lies on the rotation axis, orientation picks up the turn
        assert!(posed[1].origin().abs_diff_eq(Vec3::new(0.0, 0.0, 10.0), 1e-5));
        assert!(
            posed[1]
                .orientation()
                .same_rotation(&Quat::from_axis_angle(90.0, Vec3::Z), 1e-5)
        );
    }

    #[test]
    fn test_render_emits_one_call_per_surface() {
        let mut arena = ModelArena::new();
        let (legs, _) = two_node_tree(&mut arena);
        let config = RenderConfig::default();
        let mut sink = RecordingSink::new();

        Renderer::new(&arena, &config)
            .render_tree(legs, Mat4::IDENTITY, RenderPass::default(), &mut sink)
            .unwrap();

        let meshes: Vec<_> = sink.meshes().collect();
        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].model, "lower");
        assert_eq!(meshes[0].vertices.len(), 3);
        assert_eq!(meshes[0].texture, Some(TextureHandle(7)));
        // vflip maps v to 1 - v
        assert_eq!(meshes[0].vertices[1].uv, Some([1.0, 1.0]));
        assert_eq!(meshes[0].pick_name, Some(BodyPart::Legs));
        assert_eq!(meshes[0].mode, DrawMode::Solid);
        assert!(meshes[0].lighting);
    }

    #[test]
    fn test_render_flags_gate_textures_and_mode() {
        let mut arena = ModelArena::new();
        let (legs, _) = two_node_tree(&mut arena);
        let mut config = RenderConfig::default();
        config.set(RenderFlags::TEXTURES, false);
        config.set(RenderFlags::WIREFRAME, true);
        config.set(RenderFlags::LIGHTING, false);
        let mut sink = RecordingSink::new();

        let pass = RenderPass {
            apply_names: false,
            lighting: true,
        };
        Renderer::new(&arena, &config)
            .render_tree(legs, Mat4::IDENTITY, pass, &mut sink)
            .unwrap();

        for mesh in sink.meshes() {
            assert_eq!(mesh.texture, None);
            assert!(mesh.vertices.iter().all(|v| v.uv.is_none()));
            assert_eq!(mesh.mode, DrawMode::Wireframe);
            assert!(!mesh.lighting);
            assert_eq!(mesh.pick_name, None);
        }
    }

    #[test]
    fn test_scaled_draw_transform() {
        let mut arena = ModelArena::new();
        let (legs, _) = two_node_tree(&mut arena);
        arena.set_scale(legs, 3.0).unwrap();
        let config = RenderConfig::default();
        let mut sink = RecordingSink::new();

        Renderer::new(&arena, &config)
            .render_tree(legs, Mat4::IDENTITY, RenderPass::default(), &mut sink)
            .unwrap();

        let legs_mesh = sink.meshes_for("lower").next().unwrap();
        let p = legs_mesh.transform.transform_point(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), 1e-6));
        let torso_mesh = sink.meshes_for("upper").next().unwrap();
        let p = torso_mesh.transform.transform_point(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, 30.0), 1e-5));
    }

    #[test]
    fn test_bounding_box_once_per_node() {
        let mut arena = ModelArena::new();
        let (legs, _) = two_node_tree(&mut arena);
        arena.get_mut(legs).unwrap().draw_bounding_box = true;
        let config = RenderConfig::default();
        let mut sink = RecordingSink::new();

        Renderer::new(&arena, &config)
            .render_tree(legs, Mat4::IDENTITY, RenderPass::default(), &mut sink)
            .unwrap();

        let bounds: Vec<_> = sink
            .events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Bounds { radius, .. } => Some(*radius),
                _ => None,
            })
            .collect();
        assert_eq!(bounds, vec![4.0]);
    }

    #[test]
    fn test_absent_model_draws_nothing() {
        let arena = ModelArena::new();
        let config = RenderConfig::default();
        let mut sink = RecordingSink::new();
        Renderer::new(&arena, &config)
            .render_node(None, None, Mat4::IDENTITY, RenderPass::default(), &mut sink)
            .unwrap();
        assert!(sink.events.is_empty());
    }
}
