//! The `pose` command: apply edits and animation, then report world placements

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, warn};
use serde::Serialize;

use md3_pose::animation::{AnimationDriver, AnimationId, AnimationState, Mat4, NormalMode};
use md3_pose::model::{Axis, BodyPart, ModelHandle};
use md3_pose::pose::{PosedNode, pose_tree};
use md3_pose::render::{RecordingSink, RenderConfig, RenderFlags, SinkEvent};

use crate::cli::{OutputFormat, PoseArgs, RenderArgs};
use crate::scene_file::{LoadedScene, load_scene};
use crate::utils::{add_table_row, create_table, format_float};

/// One posed model as printed by `pose --format json`
#[derive(Debug, Clone, Serialize)]
pub struct PoseReport {
    pub id: String,
    pub name: String,
    pub part: BodyPart,
    pub depth: usize,
    pub tag: String,
    pub origin: [f32; 3],
    /// Orientation quaternion as x, y, z, w
    pub orientation: [f32; 4],
}

/// What the draw pass produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct DrawSummary {
    pub meshes: usize,
    pub triangles: usize,
    pub reflections: usize,
    /// Triangles per model name
    pub per_model: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
struct PoseOutput {
    nodes: Vec<PoseReport>,
    draw: DrawSummary,
}

/// Render options selected on the command line
pub fn render_config(args: &RenderArgs) -> RenderConfig {
    let mut config = RenderConfig::default();
    config.set(RenderFlags::WIREFRAME, args.wireframe);
    config.set(RenderFlags::TEXTURES, !args.no_textures);
    config.set(RenderFlags::LIGHTING, !args.no_lighting);
    config.set(RenderFlags::INTERPOLATE, !args.no_interpolation);
    config.set(RenderFlags::MIRRORS, args.mirrors);
    config.set(RenderFlags::ANIM_LOOP, args.anim_loop);
    config.set_flashlight(args.flashlight);
    if args.renormalize {
        config.normal_mode = NormalMode::Renormalize;
    }
    config
}

/// Split `PART=VALUE` into a body part and the value text
fn split_edit(edit: &str) -> Result<(BodyPart, &str)> {
    let (part, value) = edit
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected PART=VALUE, got '{edit}'"))?;
    let body_part = BodyPart::from_part_name(part.trim());
    if body_part == BodyPart::Unknown {
        bail!("Unknown body part '{part}' (expected head, torso, legs, weapon or light)");
    }
    Ok((body_part, value.trim()))
}

/// Parse `PART=X,Y,Z`
pub fn parse_rotation(edit: &str) -> Result<(BodyPart, [f32; 3])> {
    let (part, value) = split_edit(edit)?;
    let angles = value
        .split(',')
        .map(|v| v.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid rotation '{value}'"))?;
    let [x, y, z] = angles[..] else {
        bail!("Rotation needs three angles, got '{value}'");
    };
    Ok((part, [x, y, z]))
}

/// Parse `PART=S`
pub fn parse_scale(edit: &str) -> Result<(BodyPart, f32)> {
    let (part, value) = split_edit(edit)?;
    let scale = value
        .parse::<f32>()
        .with_context(|| format!("Invalid scale '{value}'"))?;
    Ok((part, scale))
}

/// Every loaded model of the given body part
fn models_of(loaded: &LoadedScene, part: BodyPart) -> Vec<ModelHandle> {
    loaded
        .ids
        .iter()
        .map(|(_, h)| *h)
        .filter(|h| loaded.arena.get(*h).is_ok_and(|n| n.body_part == part))
        .collect()
}

fn apply_edits(loaded: &mut LoadedScene, args: &PoseArgs) -> Result<()> {
    for edit in &args.rotations {
        let (part, angles) = parse_rotation(edit)?;
        let targets = models_of(loaded, part);
        if targets.is_empty() {
            warn!("No {part} model to rotate");
        }
        for handle in targets {
            for (axis, degrees) in [Axis::X, Axis::Y, Axis::Z].into_iter().zip(angles) {
                loaded.arena.set_rotation(handle, axis, degrees)?;
            }
        }
    }

    for edit in &args.scales {
        let (part, scale) = parse_scale(edit)?;
        let targets = models_of(loaded, part);
        if targets.is_empty() {
            warn!("No {part} model to scale");
        }
        for handle in targets {
            loaded.arena.set_scale(handle, scale)?;
        }
    }

    if let Some(frame) = args.frame {
        let next = args.next_frame.unwrap_or(frame);
        let state = AnimationState::new(frame, next, args.blend.clamp(0.0, 1.0));
        debug!("Forcing frame state {state:?} on every model");
        let handles: Vec<_> = loaded.ids.iter().map(|(_, h)| *h).collect();
        for handle in handles {
            loaded.arena.get_mut(handle)?.set_animation_state(state);
        }
    }
    Ok(())
}

fn apply_animations(loaded: &mut LoadedScene, args: &PoseArgs, config: &RenderConfig) -> Result<()> {
    if args.animations.is_empty() {
        return Ok(());
    }
    let set = loaded
        .animations
        .clone()
        .ok_or_else(|| anyhow!("Scene has no animation_cfg to play animations from"))?;

    let mut driver = AnimationDriver::new(set);
    for name in &args.animations {
        let id = AnimationId::from_name(name)
            .ok_or_else(|| anyhow!("Unknown animation '{name}'"))?;
        driver.set_animation(id);
    }
    driver.tick(args.time, config.is_set(RenderFlags::ANIM_LOOP));
    let root = loaded.root()?;
    driver.apply(&mut loaded.arena, root)?;
    Ok(())
}

fn report(loaded: &LoadedScene, node: &PosedNode) -> PoseReport {
    let origin = node.origin();
    let q = node.orientation();
    PoseReport {
        id: loaded.id_of(node.handle).unwrap_or_default().to_string(),
        name: node.name.clone(),
        part: node.body_part,
        depth: node.depth,
        tag: node.mount_tag.clone(),
        origin: [origin.x, origin.y, origin.z],
        orientation: [q.x, q.y, q.z, q.w],
    }
}

/// Run the full scene draw and summarize what reached the sink
pub fn draw_summary(loaded: &LoadedScene, config: &RenderConfig) -> Result<DrawSummary> {
    let mut sink = RecordingSink::new();
    loaded.scene.render(&loaded.arena, config, &mut sink)?;

    let mut summary = DrawSummary::default();
    for event in &sink.events {
        match event {
            SinkEvent::Mesh(mesh) => {
                let triangles = mesh.vertices.len() / 3;
                summary.meshes += 1;
                summary.triangles += triangles;
                *summary.per_model.entry(mesh.model.clone()).or_default() += triangles;
            }
            SinkEvent::BeginReflection { .. } => summary.reflections += 1,
            SinkEvent::Bounds { .. } | SinkEvent::EndReflection => {}
        }
    }
    Ok(summary)
}

pub fn execute(args: &PoseArgs) -> Result<()> {
    let config = render_config(&args.render);
    let mut loaded = load_scene(&args.scene)?;

    apply_animations(&mut loaded, args, &config)?;
    apply_edits(&mut loaded, args)?;

    let posed = if args.model_space {
        pose_tree(&loaded.arena, loaded.root()?, Mat4::IDENTITY, &config)?
    } else {
        loaded.scene.pose(&loaded.arena, &config)?
    };
    let nodes: Vec<PoseReport> = posed.iter().map(|n| report(&loaded, n)).collect();
    let draw = draw_summary(&loaded, &config)?;

    match args.format {
        OutputFormat::Json => {
            let output = PoseOutput { nodes, draw };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table => print_table(&nodes, &draw, &config),
    }
    Ok(())
}

fn print_table(nodes: &[PoseReport], draw: &DrawSummary, config: &RenderConfig) {
    let mut table = create_table(&["Id", "Part", "Tag", "X", "Y", "Z", "Orientation (x, y, z, w)"]);
    for node in nodes {
        let [x, y, z] = node.origin;
        let orientation = node
            .orientation
            .iter()
            .map(|c| format_float(*c))
            .collect::<Vec<_>>()
            .join(", ");
        let indent = "  ".repeat(node.depth);
        add_table_row(
            &mut table,
            vec![
                format!("{indent}{}", node.id),
                node.part.display_name().to_string(),
                if node.tag.is_empty() {
                    "-".to_string()
                } else {
                    node.tag.clone()
                },
                format_float(x),
                format_float(y),
                format_float(z),
                orientation,
            ],
        );
    }
    table.printstd();

    println!();
    println!(
        "Drawn: {} meshes, {} triangles{}",
        draw.meshes,
        draw.triangles,
        if draw.reflections > 0 {
            format!(" ({} mirror passes)", draw.reflections)
        } else {
            String::new()
        }
    );
    println!("Flags: {:?}", config.flags);
}
