//! Generational storage for linked models
//!
//! Models refer to their children through [`ModelHandle`]s. Unloading a model
//! frees its whole subtree and bumps the generation of every freed slot, so a
//! handle kept from before the unload is reported as stale instead of
//! silently reaching a different model.

use std::collections::VecDeque;
use std::fmt;

use log::{debug, warn};
#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use super::body_part::BodyPart;
use super::node::{Axis, ModelData, ModelNode};
use crate::error::{PoseError, Result};

/// Stable reference to a model in a [`ModelArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelHandle {
    index: u32,
    generation: u32,
}

impl ModelHandle {
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// What happens to the weapon when its carrier is reloaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum ReloadPolicy {
    /// Free the whole old subtree, weapon included
    #[default]
    Discard,
    /// Detach the weapon first and mount it on the new tree
    PreserveWeapon,
}

#[derive(Debug)]
struct Entry {
    generation: u32,
    node: Option<ModelNode>,
}

/// Owner of every loaded model and of the links between them
#[derive(Debug, Default)]
pub struct ModelArena {
    entries: Vec<Entry>,
    free: Vec<u32>,
    live: usize,
}

impl ModelArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live models
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Validate loader tables and store them as a new, unlinked model
    pub fn insert(&mut self, data: ModelData) -> Result<ModelHandle> {
        let node = ModelNode::new(data)?;
        Ok(self.insert_node(node))
    }

    fn insert_node(&mut self, mut node: ModelNode) -> ModelHandle {
        node.parent = None;
        node.links.iter_mut().for_each(|link| *link = None);

        let name = node.name.clone();
        let handle = if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.node = Some(node);
            ModelHandle {
                index,
                generation: entry.generation,
            }
        } else {
            let index = self.entries.len() as u32;
            self.entries.push(Entry {
                generation: 0,
                node: Some(node),
            });
            ModelHandle {
                index,
                generation: 0,
            }
        };

        self.live += 1;
        debug!("Loaded model '{name}' as {handle}");
        handle
    }

    pub fn is_alive(&self, handle: ModelHandle) -> bool {
        self.entries
            .get(handle.index())
            .is_some_and(|e| e.generation == handle.generation && e.node.is_some())
    }

    pub fn get(&self, handle: ModelHandle) -> Result<&ModelNode> {
        self.entries
            .get(handle.index())
            .filter(|e| e.generation == handle.generation)
            .and_then(|e| e.node.as_ref())
            .ok_or(PoseError::StaleHandle(handle))
    }

    pub fn get_mut(&mut self, handle: ModelHandle) -> Result<&mut ModelNode> {
        self.entries
            .get_mut(handle.index())
            .filter(|e| e.generation == handle.generation)
            .and_then(|e| e.node.as_mut())
            .ok_or(PoseError::StaleHandle(handle))
    }

    /// Handles of all live models, in storage order
    pub fn handles(&self) -> impl Iterator<Item = ModelHandle> + '_ {
        self.entries.iter().enumerate().filter_map(|(i, e)| {
            e.node.as_ref().map(|_| ModelHandle {
                index: i as u32,
                generation: e.generation,
            })
        })
    }

    /// Mount `child` on tag `slot` of `parent`
    pub fn link(&mut self, parent: ModelHandle, slot: usize, child: ModelHandle) -> Result<()> {
        if parent == child {
            return Err(PoseError::LinkError(format!(
                "cannot link {parent} to itself"
            )));
        }

        let child_node = self.get(child)?;
        if let Some((owner, owner_slot)) = child_node.parent {
            return Err(PoseError::LinkError(format!(
                "'{}' is already mounted on slot {owner_slot} of {owner}",
                child_node.name
            )));
        }

        let parent_node = self.get(parent)?;
        if slot >= parent_node.num_tags {
            return Err(PoseError::SlotOutOfRange {
                model: parent_node.name.clone(),
                slot,
                count: parent_node.num_tags,
            });
        }
        if parent_node.links[slot].is_some() {
            return Err(PoseError::SlotOccupied {
                model: parent_node.name.clone(),
                slot,
            });
        }

        // Child must not be an ancestor of the parent
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(PoseError::LinkError(format!(
                    "linking {child} under {parent} would create a cycle"
                )));
            }
            cursor = self.get(current)?.parent.map(|(p, _)| p);
        }

        self.get_mut(parent)?.links[slot] = Some(child);
        self.get_mut(child)?.parent = Some((parent, slot));
        debug!("Linked {child} to slot {slot} of {parent}");
        Ok(())
    }

    /// Remove the child mounted on `slot`, leaving it loaded but unattached
    pub fn unlink(&mut self, parent: ModelHandle, slot: usize) -> Result<Option<ModelHandle>> {
        let parent_node = self.get_mut(parent)?;
        let Some(link) = parent_node.links.get_mut(slot) else {
            return Err(PoseError::SlotOutOfRange {
                model: parent_node.name.clone(),
                slot,
                count: parent_node.num_tags,
            });
        };
        let child = link.take();

        if let Some(child) = child
            && let Ok(node) = self.get_mut(child)
        {
            node.parent = None;
        }
        Ok(child)
    }

    /// Detach a model from whatever it is mounted on
    pub fn detach(&mut self, child: ModelHandle) -> Result<()> {
        if let Some((parent, slot)) = self.get(child)?.parent {
            self.unlink(parent, slot)?;
        }
        Ok(())
    }

    /// Mount `child` on the first free tag in `root`'s tree named after its body part
    ///
    /// Torso goes on `tag_torso`, head on `tag_head`, weapon on `tag_weapon`.
    /// The tree is searched breadth first. Returns the parent and slot used.
    /// When no slot is found the child stays where it was.
    pub fn relink(&mut self, root: ModelHandle, child: ModelHandle) -> Result<(ModelHandle, usize)> {
        let part = self.get(child)?.body_part;
        let Some(tag_name) = part.mount_tag() else {
            warn!("{part} models have no mount tag");
            return Err(PoseError::NoMountPoint { part });
        };

        let mut queue = VecDeque::from([root]);
        let mut target = None;
        while let Some(current) = queue.pop_front() {
            // The child's own subtree cannot host it
            if current == child {
                continue;
            }
            let node = self.get(current)?;
            let free_slot = node
                .tag_names()
                .enumerate()
                .find(|(slot, name)| {
                    *name == tag_name && node.links[*slot].is_none_or(|h| h == child)
                })
                .map(|(slot, _)| slot);

            if let Some(slot) = free_slot {
                target = Some((current, slot));
                break;
            }
            queue.extend(node.links.iter().flatten().copied());
        }

        let Some((parent, slot)) = target else {
            warn!("No free '{tag_name}' in tree {root} for {part}");
            return Err(PoseError::NoMountPoint { part });
        };
        self.detach(child)?;
        self.link(parent, slot, child)?;
        Ok((parent, slot))
    }

    /// Free a model and everything mounted below it
    ///
    /// Every handle in the subtree becomes stale, including attachments such
    /// as a weapon that may have come from a different file. Returns the
    /// freed handles.
    pub fn unload(&mut self, handle: ModelHandle) -> Result<Vec<ModelHandle>> {
        let subtree = self.iter_subtree(handle)?;
        self.detach(handle)?;

        for &freed in &subtree {
            let entry = &mut self.entries[freed.index()];
            if let Some(node) = entry.node.take() {
                if freed != handle && node.body_part == BodyPart::Weapon {
                    warn!("Unloading {handle} also frees weapon '{}'", node.name);
                }
                entry.generation = entry.generation.wrapping_add(1);
                self.free.push(freed.index);
                self.live -= 1;
            }
        }

        debug!("Unloaded {handle} ({} models freed)", subtree.len());
        Ok(subtree)
    }

    /// Replace `old` with freshly loaded tables, keeping its mount point
    ///
    /// The new tables are validated before anything is freed, so a failed
    /// load leaves the old tree in place. With
    /// [`ReloadPolicy::PreserveWeapon`] a weapon found under `old` survives
    /// and is remounted on the new tree.
    pub fn reload(
        &mut self,
        old: ModelHandle,
        data: ModelData,
        policy: ReloadPolicy,
    ) -> Result<ModelHandle> {
        let node = ModelNode::new(data)?;
        let mount = self.get(old)?.parent;

        let weapon = match policy {
            ReloadPolicy::PreserveWeapon => self
                .find_by_body_part(old, BodyPart::Weapon)?
                .filter(|&w| w != old),
            ReloadPolicy::Discard => None,
        };
        if let Some(weapon) = weapon {
            self.detach(weapon)?;
        }

        self.unload(old)?;
        let new = self.insert_node(node);
        if let Some((parent, slot)) = mount {
            self.link(parent, slot, new)?;
        }

        if let Some(weapon) = weapon
            && let Err(e) = self.relink(new, weapon)
        {
            warn!("Weapon could not be remounted after reload: {e}");
            self.unload(weapon)?;
        }

        Ok(new)
    }

    /// Preorder walk over `root` and everything linked below it, in slot order
    pub fn iter_subtree(&self, root: ModelHandle) -> Result<Vec<ModelHandle>> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let node = self.get(current)?;
            out.push(current);
            stack.extend(node.links.iter().rev().flatten().copied());
        }
        Ok(out)
    }

    /// Closest model with the given body part in `root`'s tree
    pub fn find_by_body_part(&self, root: ModelHandle, part: BodyPart) -> Result<Option<ModelHandle>> {
        let mut queue = VecDeque::from([root]);
        while let Some(current) = queue.pop_front() {
            let node = self.get(current)?;
            if node.body_part == part {
                return Ok(Some(current));
            }
            queue.extend(node.links.iter().flatten().copied());
        }
        Ok(None)
    }

    /// Triangles drawn for `root`'s tree per frame
    pub fn triangle_count(&self, root: ModelHandle) -> Result<usize> {
        self.iter_subtree(root)?
            .into_iter()
            .map(|h| self.get(h).map(|n| n.triangle_count()))
            .sum()
    }

    pub fn set_scale(&mut self, handle: ModelHandle, scale: f32) -> Result<()> {
        self.get_mut(handle)?.set_scale(scale);
        Ok(())
    }

    pub fn set_rotation(&mut self, handle: ModelHandle, axis: Axis, degrees: f32) -> Result<()> {
        self.get_mut(handle)?.set_rotation(axis, degrees);
        Ok(())
    }

    /// Set the same absolute rotation on every model except one body part
    pub fn rotate_all(&mut self, axis: Axis, degrees: f32, except: BodyPart) {
        for node in self.nodes_mut().filter(|n| n.body_part != except) {
            node.set_rotation(axis, degrees);
        }
    }

    /// Set the same scale on every model except one body part
    pub fn scale_all(&mut self, scale: f32, except: BodyPart) {
        for node in self.nodes_mut().filter(|n| n.body_part != except) {
            node.set_scale(scale);
        }
    }

    /// Drop scale and rotation edits on one model, or on every model but lights
    pub fn reset_edits(&mut self, handle: Option<ModelHandle>) -> Result<()> {
        match handle {
            Some(handle) => self.get_mut(handle)?.reset_edits(),
            None => {
                for axis in Axis::ALL {
                    self.rotate_all(axis, 0.0, BodyPart::Light);
                }
                self.scale_all(1.0, BodyPart::Light);
            }
        }
        Ok(())
    }

    fn nodes_mut(&mut self) -> impl Iterator<Item = &mut ModelNode> {
        self.entries.iter_mut().filter_map(|e| e.node.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Vec3;
    use crate::model::{Frame, Tag};

    fn model(name: &str, part: BodyPart, tags: &[&str]) -> ModelData {
        ModelData {
            name: name.into(),
            body_part: part,
            num_frames: 1,
            num_tags: tags.len(),
            tags: tags.iter().map(|t| Tag::at(*t, Vec3::ZERO)).collect(),
            frames: vec![Frame::default()],
            surfaces: Vec::new(),
        }
    }

    fn player(arena: &mut ModelArena) -> (ModelHandle, ModelHandle, ModelHandle, ModelHandle) {
        let legs = arena
            .insert(model("lower", BodyPart::Legs, &["tag_torso"]))
            .unwrap();
        let torso = arena
            .insert(model(
                "upper",
                BodyPart::Torso,
                &["tag_head", "tag_weapon", "tag_torso"],
            ))
            .unwrap();
        let head = arena.insert(model("head", BodyPart::Head, &[])).unwrap();
        let weapon = arena
            .insert(model("railgun", BodyPart::Weapon, &["tag_flash"]))
            .unwrap();
        arena.relink(legs, torso).unwrap();
        arena.relink(legs, head).unwrap();
        arena.relink(legs, weapon).unwrap();
        (legs, torso, head, weapon)
    }

    #[test]
    fn test_relink_by_tag_name() {
        let mut arena = ModelArena::new();
        let (legs, torso, head, weapon) = player(&mut arena);
        assert_eq!(arena.get(legs).unwrap().link(0), Some(torso));
        assert_eq!(arena.get(torso).unwrap().link(0), Some(head));
        assert_eq!(arena.get(torso).unwrap().link(1), Some(weapon));
        assert_eq!(arena.get(weapon).unwrap().parent(), Some((torso, 1)));
        assert_eq!(
            arena.iter_subtree(legs).unwrap(),
            vec![legs, torso, head, weapon]
        );
    }

    #[test]
    fn test_relink_without_mount_point() {
        let mut arena = ModelArena::new();
        let legs = arena.insert(model("lower", BodyPart::Legs, &[])).unwrap();
        let weapon = arena.insert(model("gun", BodyPart::Weapon, &[])).unwrap();
        assert!(matches!(
            arena.relink(legs, weapon),
            Err(PoseError::NoMountPoint {
                part: BodyPart::Weapon
            })
        ));
    }

    #[test]
    fn test_failed_relink_keeps_mounted_child() {
        let mut arena = ModelArena::new();
        let (legs, torso, _, weapon) = player(&mut arena);
        let bare_legs = arena.insert(model("lower2", BodyPart::Legs, &[])).unwrap();

        assert!(matches!(
            arena.relink(bare_legs, weapon),
            Err(PoseError::NoMountPoint {
                part: BodyPart::Weapon
            })
        ));
        assert_eq!(arena.get(weapon).unwrap().parent(), Some((torso, 1)));
        assert_eq!(arena.get(torso).unwrap().link(1), Some(weapon));
        assert!(arena.iter_subtree(legs).unwrap().contains(&weapon));
    }

    #[test]
    fn test_relink_moves_mounted_child() {
        let mut arena = ModelArena::new();
        let (_, torso, _, weapon) = player(&mut arena);
        let legs2 = arena
            .insert(model("lower2", BodyPart::Legs, &["tag_torso"]))
            .unwrap();
        let torso2 = arena
            .insert(model("upper2", BodyPart::Torso, &["tag_weapon"]))
            .unwrap();
        arena.relink(legs2, torso2).unwrap();

        assert_eq!(arena.relink(legs2, weapon).unwrap(), (torso2, 0));
        assert_eq!(arena.get(torso).unwrap().link(1), None);
        // Relinking onto the slot it already occupies keeps it there
        assert_eq!(arena.relink(legs2, weapon).unwrap(), (torso2, 0));
        assert_eq!(arena.get(weapon).unwrap().parent(), Some((torso2, 0)));
    }

    #[test]
    fn test_link_errors() {
        let mut arena = ModelArena::new();
        let (legs, torso, _, _) = player(&mut arena);
        assert!(matches!(
            arena.link(legs, 5, torso),
            Err(PoseError::LinkError(_))
        ));
        let spare = arena.insert(model("spare", BodyPart::Unknown, &[])).unwrap();
        assert!(matches!(
            arena.link(legs, 5, spare),
            Err(PoseError::SlotOutOfRange { slot: 5, count: 1, .. })
        ));
        assert!(matches!(
            arena.link(legs, 0, spare),
            Err(PoseError::SlotOccupied { slot: 0, .. })
        ));
        // torso's tag_torso slot is free, but legs is its ancestor
        arena.detach(spare).unwrap();
        assert!(matches!(
            arena.link(torso, 2, legs),
            Err(PoseError::LinkError(_))
        ));
    }

    #[test]
    fn test_unload_frees_subtree() {
        let mut arena = ModelArena::new();
        let (legs, torso, head, weapon) = player(&mut arena);
        let freed = arena.unload(torso).unwrap();
        assert_eq!(freed, vec![torso, head, weapon]);
        assert!(arena.is_alive(legs));
        assert!(!arena.is_alive(weapon));
        assert!(matches!(arena.get(head), Err(PoseError::StaleHandle(h)) if h == head));
        assert_eq!(arena.get(legs).unwrap().link(0), None);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_reused_slot_does_not_revive_handle() {
        let mut arena = ModelArena::new();
        let a = arena.insert(model("a", BodyPart::Unknown, &[])).unwrap();
        arena.unload(a).unwrap();
        let b = arena.insert(model("b", BodyPart::Unknown, &[])).unwrap();
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(arena.get(a).is_err());
        assert_eq!(arena.get(b).unwrap().name, "b");
    }

    #[test]
    fn test_reload_preserving_weapon() {
        let mut arena = ModelArena::new();
        let (legs, torso, _, weapon) = player(&mut arena);
        let new_torso = arena
            .reload(
                torso,
                model("upper2", BodyPart::Torso, &["tag_weapon", "tag_head"]),
                ReloadPolicy::PreserveWeapon,
            )
            .unwrap();
        assert!(arena.is_alive(weapon));
        assert!(!arena.is_alive(torso));
        assert_eq!(arena.get(legs).unwrap().link(0), Some(new_torso));
        assert_eq!(arena.get(new_torso).unwrap().link(0), Some(weapon));
    }

    #[test]
    fn test_failed_reload_keeps_old_tree() {
        let mut arena = ModelArena::new();
        let (_, torso, _, weapon) = player(&mut arena);
        let mut broken = model("upper2", BodyPart::Torso, &["tag_head"]);
        broken.tags.clear();
        assert!(arena.reload(torso, broken, ReloadPolicy::Discard).is_err());
        assert!(arena.is_alive(torso));
        assert!(arena.is_alive(weapon));
    }

    #[test]
    fn test_bulk_edits_skip_light() {
        let mut arena = ModelArena::new();
        let (legs, torso, _, _) = player(&mut arena);
        let light = arena.insert(model("lamp", BodyPart::Light, &[])).unwrap();

        arena.rotate_all(Axis::Z, 30.0, BodyPart::Light);
        arena.scale_all(2.0, BodyPart::Light);
        arena.set_rotation(light, Axis::Z, 10.0).unwrap();
        assert_eq!(arena.get(torso).unwrap().rotation_about(Axis::Z), 30.0);
        assert_eq!(arena.get(light).unwrap().scale(), 1.0);

        arena.reset_edits(None).unwrap();
        assert_eq!(arena.get(legs).unwrap().rotation(), [0.0; 3]);
        assert_eq!(arena.get(legs).unwrap().scale(), 1.0);
        assert_eq!(arena.get(light).unwrap().rotation_about(Axis::Z), 10.0);

        arena.reset_edits(Some(light)).unwrap();
        assert_eq!(arena.get(light).unwrap().rotation_about(Axis::Z), 0.0);
    }
}
