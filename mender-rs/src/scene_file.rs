//! Scene description files
//!
//! A scene lists the models to load (inline or from their own files), how
//! they attach to each other and the per-model edits to start from:
//!
//! ```yaml
//! root: lower
//! animation_cfg: animation.cfg
//! models:
//!   - id: lower
//!     path: lower.json
//!   - id: upper
//!     path: upper.yaml
//!     rotation: [0, 15, 0]
//! links:
//!   - parent: lower
//!     child: upper
//! ```
//!
//! The format is picked from the file extension: `.json`, `.yaml` or `.yml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use md3_pose::animation::{AnimationSet, AnimationState};
use md3_pose::model::{Axis, ModelArena, ModelData, ModelHandle};
use md3_pose::scene::{Light, Mirror, Scene};

/// On-disk scene description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneFile {
    /// Id of the model the character tree hangs from
    pub root: String,
    pub models: Vec<ModelEntry>,
    #[serde(default)]
    pub links: Vec<LinkEntry>,
    /// Id of the model drawn as the flashlight
    #[serde(default)]
    pub light_model: Option<String>,
    #[serde(default)]
    pub light: Light,
    #[serde(default)]
    pub mirrors: Vec<Mirror>,
    /// `animation.cfg` of the player model, relative to the scene file
    #[serde(default)]
    pub animation_cfg: Option<PathBuf>,
}

/// One model of a scene
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    /// Model tables in their own JSON or YAML file, relative to the scene file
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Model tables written out in the scene itself
    #[serde(default)]
    pub model: Option<ModelData>,
    #[serde(default)]
    pub state: Option<AnimationState>,
    /// Rotation edit about x, y and z in degrees
    #[serde(default)]
    pub rotation: Option<[f32; 3]>,
    #[serde(default)]
    pub scale: Option<f32>,
}

/// Attachment of `child` below `parent`
///
/// Without a `tag` the child is mounted on the first free slot named after
/// its body part, searching from `parent` down.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkEntry {
    pub parent: String,
    pub child: String,
    #[serde(default)]
    pub tag: Option<String>,
}

/// A scene with its models loaded into an arena
#[derive(Debug)]
pub struct LoadedScene {
    pub path: PathBuf,
    pub arena: ModelArena,
    pub scene: Scene,
    /// Scene ids of the models that loaded
    pub ids: Vec<(String, ModelHandle)>,
    pub animations: Option<AnimationSet>,
}

impl LoadedScene {
    /// Handle of the model with scene id `id`
    pub fn handle(&self, id: &str) -> Option<ModelHandle> {
        self.ids.iter().find(|(i, _)| i == id).map(|(_, h)| *h)
    }

    /// Scene id of a loaded model
    pub fn id_of(&self, handle: ModelHandle) -> Option<&str> {
        self.ids
            .iter()
            .find(|(_, h)| *h == handle)
            .map(|(i, _)| i.as_str())
    }

    pub fn root(&self) -> Result<ModelHandle> {
        self.scene
            .root
            .ok_or_else(|| anyhow!("Scene {} has no root model", self.path.display()))
    }
}

/// Parse JSON or YAML according to the extension of `path`
pub fn parse_by_extension<T: DeserializeOwned>(path: &Path, text: &str) -> Result<T> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "json" => serde_json::from_str(text)
            .with_context(|| format!("Failed to parse JSON in {}", path.display())),
        "yaml" | "yml" => serde_yaml_ng::from_str(text)
            .with_context(|| format!("Failed to parse YAML in {}", path.display())),
        _ => bail!(
            "Unsupported file extension for {} (expected .json, .yaml or .yml)",
            path.display()
        ),
    }
}

fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_by_extension(path, &text)
}

impl SceneFile {
    pub fn load(path: &Path) -> Result<Self> {
        read_file(path)
    }

    /// Load every model into a fresh arena and link them up
    ///
    /// A model that fails to load is skipped with a warning and so are the
    /// links that name it; only a missing root is fatal.
    pub fn build(&self, path: &Path) -> Result<LoadedScene> {
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut arena = ModelArena::new();
        let mut ids: Vec<(String, ModelHandle)> = Vec::with_capacity(self.models.len());

        for entry in &self.models {
            if ids.iter().any(|(id, _)| id == &entry.id) {
                bail!("Duplicate model id '{}' in {}", entry.id, path.display());
            }
            match load_model(entry, base_dir).and_then(|data| Ok(arena.insert(data)?)) {
                Ok(handle) => {
                    apply_edits(&mut arena, handle, entry)?;
                    ids.push((entry.id.clone(), handle));
                }
                Err(e) => warn!("Skipping model '{}': {e:#}", entry.id),
            }
        }

        let lookup = |id: &str| ids.iter().find(|(i, _)| i == id).map(|(_, h)| *h);
        for link in &self.links {
            let (Some(parent), Some(child)) = (lookup(&link.parent), lookup(&link.child)) else {
                warn!(
                    "Skipping link {} -> {}: model not loaded",
                    link.parent, link.child
                );
                continue;
            };
            let linked = link_entry(&mut arena, parent, child, link);
            if let Err(e) = linked {
                warn!("Could not link {} -> {}: {e:#}", link.parent, link.child);
            }
        }

        let root = lookup(&self.root)
            .ok_or_else(|| anyhow!("Root model '{}' did not load", self.root))?;
        let light_model = self.light_model.as_deref().and_then(|id| {
            let handle = lookup(id);
            if handle.is_none() {
                warn!("Light model '{id}' did not load");
            }
            handle
        });

        let animations = match &self.animation_cfg {
            Some(cfg) => {
                let cfg_path = base_dir.join(cfg);
                let text = fs::read_to_string(&cfg_path)
                    .with_context(|| format!("Failed to read {}", cfg_path.display()))?;
                let set = AnimationSet::parse_cfg(&text)
                    .with_context(|| format!("Failed to parse {}", cfg_path.display()))?;
                debug!("Loaded animation table {}", cfg_path.display());
                Some(set)
            }
            None => None,
        };

        info!(
            "Loaded scene {} ({} of {} models)",
            path.display(),
            ids.len(),
            self.models.len()
        );

        Ok(LoadedScene {
            path: path.to_path_buf(),
            arena,
            scene: Scene {
                root: Some(root),
                light_model,
                light: self.light,
                mirrors: self.mirrors.clone(),
            },
            ids,
            animations,
        })
    }
}

fn load_model(entry: &ModelEntry, base_dir: &Path) -> Result<ModelData> {
    match (&entry.model, &entry.path) {
        (Some(model), None) => Ok(model.clone()),
        (None, Some(path)) => read_file(&base_dir.join(path)),
        (Some(_), Some(_)) => bail!("both 'model' and 'path' given"),
        (None, None) => bail!("neither 'model' nor 'path' given"),
    }
}

fn link_entry(
    arena: &mut ModelArena,
    parent: ModelHandle,
    child: ModelHandle,
    link: &LinkEntry,
) -> Result<()> {
    match &link.tag {
        Some(tag) => {
            let slot = arena
                .get(parent)?
                .find_tag_slot(tag)
                .ok_or_else(|| anyhow!("'{}' has no tag {tag}", link.parent))?;
            arena.link(parent, slot, child)?;
        }
        None => {
            arena.relink(parent, child)?;
        }
    }
    Ok(())
}

fn apply_edits(arena: &mut ModelArena, handle: ModelHandle, entry: &ModelEntry) -> Result<()> {
    if let Some(rotation) = entry.rotation {
        for (axis, degrees) in [Axis::X, Axis::Y, Axis::Z].into_iter().zip(rotation) {
            arena.set_rotation(handle, axis, degrees)?;
        }
    }
    if let Some(scale) = entry.scale {
        arena.set_scale(handle, scale)?;
    }
    if let Some(state) = entry.state {
        arena.get_mut(handle)?.set_animation_state(state);
    }
    Ok(())
}

/// Load and build a scene in one step
pub fn load_scene(path: &Path) -> Result<LoadedScene> {
    SceneFile::load(path)?.build(path)
}
