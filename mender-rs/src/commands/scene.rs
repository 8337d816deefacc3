//! Scene inspection commands

use std::path::Path;

use anyhow::Result;

use md3_pose::model::{ModelArena, ModelHandle};

use crate::scene_file::{LoadedScene, load_scene};
use crate::utils::{
    NodeType, RefType, TreeNode, TreeOptions, add_table_row, create_table, detect_ref_type,
    render_tree,
};

pub fn handle_info(path: &Path) -> Result<()> {
    let loaded = load_scene(path)?;
    let root = loaded.root()?;

    println!("Scene: {}", path.display());
    println!();

    let mut table = create_table(&[
        "Id", "Name", "Part", "Frames", "Tags", "Surfaces", "Triangles", "Parent",
    ]);
    for (id, handle) in &loaded.ids {
        let node = loaded.arena.get(*handle)?;
        let parent = node
            .parent()
            .map(|(parent, slot)| {
                let tag = loaded
                    .arena
                    .get(parent)
                    .ok()
                    .and_then(|p| p.tag(0, slot))
                    .map(|t| t.name.clone())
                    .unwrap_or_default();
                format!("{}:{tag}", loaded.id_of(parent).unwrap_or("?"))
            })
            .unwrap_or_else(|| "-".to_string());
        add_table_row(
            &mut table,
            vec![
                id.clone(),
                node.name.clone(),
                node.display_name().to_string(),
                node.num_frames.to_string(),
                node.num_tags.to_string(),
                node.surfaces.len().to_string(),
                node.triangle_count().to_string(),
                parent,
            ],
        );
    }
    table.printstd();

    println!();
    println!(
        "Triangles in character tree: {}",
        loaded.arena.triangle_count(root)?
    );
    if let Some(animations) = &loaded.animations {
        println!("Animations: {}", animations.iter().count());
    }
    if !loaded.scene.mirrors.is_empty() {
        println!("Mirrors: {}", loaded.scene.mirrors.len());
    }

    Ok(())
}

pub fn handle_tree(
    path: &Path,
    depth: Option<usize>,
    no_color: bool,
    compact: bool,
    no_metadata: bool,
) -> Result<()> {
    let loaded = load_scene(path)?;
    let tree = build_scene_tree(&loaded)?;

    let options = TreeOptions {
        max_depth: depth,
        no_color,
        show_metadata: !no_metadata,
        compact,
        ..TreeOptions::default()
    };
    print!("{}", render_tree(&tree, &options));

    let roots: Vec<_> = loaded
        .ids
        .iter()
        .filter(|(_, h)| {
            Some(*h) != loaded.scene.root
                && Some(*h) != loaded.scene.light_model
                && loaded.arena.get(*h).is_ok_and(|n| n.parent().is_none())
        })
        .map(|(id, _)| id.as_str())
        .collect();
    if !roots.is_empty() {
        println!();
        println!("Unattached models: {}", roots.join(", "));
    }

    Ok(())
}

/// Tree of the character plus the flashlight model
pub fn build_scene_tree(loaded: &LoadedScene) -> Result<TreeNode> {
    let name = loaded
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut tree = TreeNode::new(name, NodeType::Scene)
        .add_child(model_node(&loaded.arena, loaded.root()?, None)?);
    if let Some(light) = loaded.scene.light_model {
        tree = tree.add_child(model_node(&loaded.arena, light, None)?);
    }
    Ok(tree)
}

fn model_node(arena: &ModelArena, handle: ModelHandle, mount: Option<&str>) -> Result<TreeNode> {
    let node = arena.get(handle)?;
    let mut tree = TreeNode::new(node.name.clone(), NodeType::Model(node.body_part))
        .with_metadata("part", node.display_name())
        .with_metadata("frames", node.num_frames)
        .with_metadata("triangles", node.triangle_count());
    if let Some(tag) = mount {
        tree = tree.with_metadata("tag", tag);
    }
    if node.scale() != 1.0 {
        tree = tree.with_metadata("scale", node.scale());
    }
    if node.rotation() != [0.0; 3] {
        let [x, y, z] = node.rotation();
        tree = tree.with_metadata("rotation", format!("{x}, {y}, {z}"));
    }

    for surface in &node.surfaces {
        if !surface.shader.name.is_empty() {
            let ref_type = detect_ref_type(&surface.shader.name);
            let ref_type = if ref_type == RefType::Unknown {
                RefType::Shader
            } else {
                ref_type
            };
            tree = tree.with_external_ref(&surface.shader.name, ref_type);
        }
    }

    let tag_names: Vec<&str> = node.tag_names().collect();
    for (slot, link) in node.links().iter().enumerate() {
        let tag = tag_names.get(slot).copied().unwrap_or("?");
        tree = match link {
            Some(child) => tree.add_child(model_node(arena, *child, Some(tag))?),
            None => tree.add_child(TreeNode::new(tag, NodeType::EmptySlot)),
        };
    }
    Ok(tree)
}
