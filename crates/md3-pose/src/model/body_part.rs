use std::fmt;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Semantic role of a model in the attachment tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-support", serde(rename_all = "lowercase"))]
pub enum BodyPart {
    Head,
    Torso,
    Legs,
    Weapon,
    Light,
    #[default]
    Unknown,
}

/// Display labels, indexed in declaration order
const DISPLAY_NAMES: [(BodyPart, &str); 6] = [
    (BodyPart::Head, "Head"),
    (BodyPart::Torso, "Torso"),
    (BodyPart::Legs, "Legs"),
    (BodyPart::Weapon, "Weapon"),
    (BodyPart::Light, "Light"),
    (BodyPart::Unknown, "Unknown Object"),
];

impl BodyPart {
    pub const ALL: [Self; 6] = [
        Self::Head,
        Self::Torso,
        Self::Legs,
        Self::Weapon,
        Self::Light,
        Self::Unknown,
    ];

    /// Label shown for a selected body area
    ///
    /// Lights are labelled with their own model name by callers, this is the
    /// fallback.
    pub fn display_name(self) -> &'static str {
        DISPLAY_NAMES
            .iter()
            .find(|(part, _)| *part == self)
            .map_or("Unknown Object", |(_, name)| *name)
    }

    /// Name of the parent tag this part is mounted on
    pub fn mount_tag(self) -> Option<&'static str> {
        match self {
            Self::Head => Some("tag_head"),
            Self::Torso => Some("tag_torso"),
            Self::Weapon => Some("tag_weapon"),
            Self::Legs | Self::Light | Self::Unknown => None,
        }
    }

    /// Map the part names used by player model files (`head`, `upper`, `lower`)
    pub fn from_part_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "head" => Self::Head,
            "upper" | "torso" => Self::Torso,
            "lower" | "legs" => Self::Legs,
            "weapon" => Self::Weapon,
            "light" => Self::Light,
            _ => Self::Unknown,
        }
    }

    /// Small integer identifier used for picking passes
    pub fn pick_id(self) -> u32 {
        match self {
            Self::Head => 1,
            Self::Torso => 2,
            Self::Legs => 3,
            Self::Weapon => 4,
            Self::Light => 5,
            Self::Unknown => 0,
        }
    }

    /// Reverse of [`BodyPart::pick_id`]
    pub fn from_pick_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|part| part.pick_id() == id)
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
