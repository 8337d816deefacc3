//! Small player models shared by the integration tests

#![allow(dead_code)]

use md3_pose::animation::{Mat3, Vec3};
use md3_pose::model::{
    BodyPart, Frame, ModelArena, ModelData, ModelHandle, Shader, Surface, Tag, Triangle, Vertex,
};

/// Tag axes turned 90 degrees about y: x goes to -z, y stays, z goes to x
pub fn turned_about_y() -> Mat3 {
    Mat3::from_rows([-Vec3::Z, Vec3::Y, Vec3::X])
}

/// One triangle per frame, shifted along x by the frame number
pub fn triangle_surface(name: &str, num_frames: usize) -> Surface {
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
        name: name.into(),
        num_frames,
        num_verts: 3,
        vertices,
        uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        triangles: vec![Triangle::new(0, 1, 2)],
        shader: Shader::default(),
    }
}

/// Model whose tag `slot` names repeat on every frame with per-frame tags
pub fn model(name: &str, part: BodyPart, num_frames: usize, tags: Vec<Tag>) -> ModelData {
    let num_tags = tags.len() / num_frames;
    ModelData {
        name: name.into(),
        body_part: part,
        num_frames,
        num_tags,
        tags,
        frames: (0..num_frames)
            .map(|f| Frame::with_radius(format!("frame {f}"), Vec3::ZERO, 20.0))
            .collect(),
        surfaces: vec![triangle_surface(&format!("{name}_mesh"), num_frames)],
    }
}

pub struct Player {
    pub legs: ModelHandle,
    pub torso: ModelHandle,
    pub head: ModelHandle,
    pub weapon: ModelHandle,
}

/// Legs (2 frames) -> torso -> head and weapon
pub fn player(arena: &mut ModelArena) -> Player {
    let legs = arena
        .insert(model(
            "lower",
            BodyPart::Legs,
            2,
            vec![
                Tag::new("tag_torso", Vec3::new(0.0, 0.0, 24.0), turned_about_y()),
                Tag::new("tag_torso", Vec3::new(0.0, 0.0, 26.0), turned_about_y()),
            ],
        ))
        .expect("legs load");

    let torso_tags = |z: f32| {
        [
            Tag::at("tag_head", Vec3::new(0.0, 0.0, z)),
            Tag::at("tag_weapon", Vec3::new(4.0, -8.0, 2.0)),
        ]
    };
    let torso = arena
        .insert(model(
            "upper",
            BodyPart::Torso,
            2,
            torso_tags(16.0).into_iter().chain(torso_tags(17.0)).collect(),
        ))
        .expect("torso load");

    let head = arena
        .insert(model("head", BodyPart::Head, 1, Vec::new()))
        .expect("head load");
    let weapon = arena
        .insert(model(
            "railgun",
            BodyPart::Weapon,
            1,
            vec![Tag::at("tag_flash", Vec3::new(32.0, 0.0, 0.0))],
        ))
        .expect("weapon load");

    arena.relink(legs, torso).expect("torso mount");
    arena.relink(legs, head).expect("head mount");
    arena.relink(legs, weapon).expect("weapon mount");

    Player {
        legs,
        torso,
        head,
        weapon,
    }
}
