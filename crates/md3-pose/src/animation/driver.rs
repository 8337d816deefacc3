//! Named animation ranges and fps-based frame stepping
//!
//! Player models split their keyframes into ranges (death, gestures, walk
//! cycles...). The driver advances one range for the legs and one for the
//! torso and writes the resulting [`AnimationState`] into the models.

use std::fmt;

use log::{debug, trace, warn};
#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use super::state::AnimationState;
use crate::error::{PoseError, Result};
use crate::model::{BodyPart, ModelArena, ModelHandle};

/// Animation ids in the order player animation tables list them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum AnimationId {
    BothDeath1,
    BothDead1,
    BothDeath2,
    BothDead2,
    BothDeath3,
    BothDead3,
    TorsoGesture,
    TorsoAttack,
    TorsoAttack2,
    TorsoDrop,
    TorsoRaise,
    TorsoStand,
    TorsoStand2,
    LegsWalkCr,
    LegsWalk,
    LegsRun,
    LegsBack,
    LegsSwim,
    LegsJump,
    LegsLand,
    LegsJumpB,
    LegsLandB,
    LegsIdle,
    LegsIdleCr,
    LegsTurn,
}

impl AnimationId {
    pub const COUNT: usize = 25;

    pub const ALL: [Self; Self::COUNT] = [
        Self::BothDeath1,
        Self::BothDead1,
        Self::BothDeath2,
        Self::BothDead2,
        Self::BothDeath3,
        Self::BothDead3,
        Self::TorsoGesture,
        Self::TorsoAttack,
        Self::TorsoAttack2,
        Self::TorsoDrop,
        Self::TorsoRaise,
        Self::TorsoStand,
        Self::TorsoStand2,
        Self::LegsWalkCr,
        Self::LegsWalk,
        Self::LegsRun,
        Self::LegsBack,
        Self::LegsSwim,
        Self::LegsJump,
        Self::LegsLand,
        Self::LegsJumpB,
        Self::LegsLandB,
        Self::LegsIdle,
        Self::LegsIdleCr,
        Self::LegsTurn,
    ];

    /// Position in the animation table
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Body parts this animation drives
    pub fn targets(self) -> &'static [BodyPart] {
        if self.index() <= Self::BothDead3.index() {
            &[BodyPart::Legs, BodyPart::Torso]
        } else if self.index() <= Self::TorsoStand2.index() {
            &[BodyPart::Torso]
        } else {
            &[BodyPart::Legs]
        }
    }

    /// Whether the frames live in the legs model's own numbering
    pub fn is_legs_only(self) -> bool {
        self.index() >= Self::LegsWalkCr.index()
    }

    /// Name as used in animation config comments (`BOTH_DEATH1`, `LEGS_IDLE`...)
    pub fn name(self) -> &'static str {
        match self {
            Self::BothDeath1 => "BOTH_DEATH1",
            Self::BothDead1 => "BOTH_DEAD1",
            Self::BothDeath2 => "BOTH_DEATH2",
            Self::BothDead2 => "BOTH_DEAD2",
            Self::BothDeath3 => "BOTH_DEATH3",
            Self::BothDead3 => "BOTH_DEAD3",
            Self::TorsoGesture => "TORSO_GESTURE",
            Self::TorsoAttack => "TORSO_ATTACK",
            Self::TorsoAttack2 => "TORSO_ATTACK2",
            Self::TorsoDrop => "TORSO_DROP",
            Self::TorsoRaise => "TORSO_RAISE",
            Self::TorsoStand => "TORSO_STAND",
            Self::TorsoStand2 => "TORSO_STAND2",
            Self::LegsWalkCr => "LEGS_WALKCR",
            Self::LegsWalk => "LEGS_WALK",
            Self::LegsRun => "LEGS_RUN",
            Self::LegsBack => "LEGS_BACK",
            Self::LegsSwim => "LEGS_SWIM",
            Self::LegsJump => "LEGS_JUMP",
            Self::LegsLand => "LEGS_LAND",
            Self::LegsJumpB => "LEGS_JUMPB",
            Self::LegsLandB => "LEGS_LANDB",
            Self::LegsIdle => "LEGS_IDLE",
            Self::LegsIdleCr => "LEGS_IDLECR",
            Self::LegsTurn => "LEGS_TURN",
        }
    }

    /// Case-insensitive lookup by table name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Keyframe range of one animation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct AnimationRange {
    pub first_frame: usize,
    pub num_frames: usize,
    /// Trailing frames repeated after the first pass, 0 for one-shot
    pub looping_frames: usize,
    pub fps: f32,
}

impl AnimationRange {
    pub const fn new(first_frame: usize, num_frames: usize, looping_frames: usize, fps: f32) -> Self {
        Self {
            first_frame,
            num_frames,
            looping_frames,
            fps,
        }
    }

    pub fn last_frame(&self) -> usize {
        self.first_frame + self.num_frames.saturating_sub(1)
    }

    /// Frame the animation jumps back to after the last one
    pub fn loop_start(&self, force_loop: bool) -> Option<usize> {
        if self.looping_frames > 0 {
            Some(self.first_frame + self.num_frames - self.looping_frames)
        } else if force_loop {
            Some(self.first_frame)
        } else {
            None
        }
    }

    /// Frame following `frame`, or `None` once a one-shot range is finished
    pub fn step(&self, frame: usize, force_loop: bool) -> Option<usize> {
        if frame < self.last_frame() {
            Some(frame + 1)
        } else {
            self.loop_start(force_loop)
        }
    }

    /// Frames in one repetition of the loop, `None` for a one-shot range
    pub fn loop_length(&self, force_loop: bool) -> Option<usize> {
        self.loop_start(force_loop)
            .map(|start| self.last_frame() + 1 - start)
    }

    /// Whether `frame` lies in the repeating part of the range
    pub fn in_loop(&self, frame: usize, force_loop: bool) -> bool {
        self.loop_start(force_loop)
            .is_some_and(|start| frame >= start && frame <= self.last_frame())
    }

    pub fn contains(&self, frame: usize) -> bool {
        frame >= self.first_frame && frame <= self.last_frame()
    }

    fn validate(&self, id: AnimationId) -> Result<()> {
        if self.num_frames == 0 {
            return Err(PoseError::AnimationError(format!("{id} has no frames")));
        }
        if self.looping_frames > self.num_frames {
            return Err(PoseError::AnimationError(format!(
                "{id} loops {} frames but only has {}",
                self.looping_frames, self.num_frames
            )));
        }
        if self.fps.is_nan() || self.fps <= 0.0 {
            return Err(PoseError::AnimationError(format!(
                "{id} has non-positive fps {}",
                self.fps
            )));
        }
        Ok(())
    }
}

/// Complete animation table of a player model
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct AnimationSet {
    ranges: Vec<AnimationRange>,
}

impl AnimationSet {
    /// Build from ranges in [`AnimationId`] order
    pub fn new(ranges: Vec<AnimationRange>) -> Result<Self> {
        if ranges.len() != AnimationId::COUNT {
            return Err(PoseError::AnimationError(format!(
                "expected {} animations, got {}",
                AnimationId::COUNT,
                ranges.len()
            )));
        }
        for (id, range) in AnimationId::ALL.iter().zip(&ranges) {
            range.validate(*id)?;
        }
        Ok(Self { ranges })
    }

    /// Parse an `animation.cfg` table
    ///
    /// Each animation line holds `first num looping fps`; keyword lines
    /// (`sex`, `headoffset`, `footsteps`) and `//` comments are skipped. Legs
    /// ranges are renumbered to the legs model, which omits the torso-only
    /// frames. A zero fps is read as 1.
    pub fn parse_cfg(text: &str) -> Result<Self> {
        let mut ranges = Vec::with_capacity(AnimationId::COUNT);

        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.split("//").next().unwrap_or("").trim();
            let Some(first) = line.split_whitespace().next() else {
                continue;
            };
            if !first.starts_with(|c: char| c.is_ascii_digit()) {
                continue;
            }
            if ranges.len() == AnimationId::COUNT {
                break;
            }

            let fields = line
                .split_whitespace()
                .take(4)
                .map(str::parse::<f32>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| {
                    PoseError::AnimationError(format!("line {}: {e}", line_no + 1))
                })?;
            let [first, num, looping, fps] = fields[..] else {
                return Err(PoseError::AnimationError(format!(
                    "line {}: expected 4 numbers",
                    line_no + 1
                )));
            };

            let fps = if fps > 0.0 { fps } else { 1.0 };
            ranges.push(AnimationRange::new(
                first as usize,
                num as usize,
                looping as usize,
                fps,
            ));
        }

        if ranges.len() == AnimationId::COUNT {
            let skip = ranges[AnimationId::LegsWalkCr.index()]
                .first_frame
                .saturating_sub(ranges[AnimationId::TorsoGesture.index()].first_frame);
            for range in &mut ranges[AnimationId::LegsWalkCr.index()..] {
                range.first_frame = range.first_frame.saturating_sub(skip);
            }
        }

        Self::new(ranges)
    }

    pub fn range(&self, id: AnimationId) -> &AnimationRange {
        &self.ranges[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnimationId, &AnimationRange)> {
        AnimationId::ALL.into_iter().zip(self.ranges.iter())
    }
}

/// One running animation for one body part
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playback {
    pub id: AnimationId,
    pub state: AnimationState,
    pub playing: bool,
}

impl Playback {
    fn start(id: AnimationId, range: &AnimationRange) -> Self {
        let next = range.step(range.first_frame, false).unwrap_or(range.first_frame);
        Self {
            id,
            state: AnimationState::new(range.first_frame, next, 0.0),
            playing: true,
        }
    }

    fn tick(&mut self, range: &AnimationRange, delta_secs: f32, force_loop: bool) {
        if !self.playing {
            return;
        }

        let advanced = self.state.t + delta_secs * range.fps;
        if !advanced.is_finite() {
            warn!("{} cannot advance by {delta_secs}s, keeping frame {}", self.id, self.state.frame);
            return;
        }
        let whole = advanced.floor();
        self.state.t = advanced - whole;

        // Saturates for very large deltas; whole loop cycles are dropped below
        let mut remaining = whole as usize;
        let cycle = range.loop_length(force_loop);
        let mut stepped = false;
        while remaining > 0 {
            if stepped
                && let Some(cycle) = cycle
                && remaining >= cycle
                && range.in_loop(self.state.frame, force_loop)
            {
                remaining %= cycle;
                if remaining == 0 {
                    break;
                }
            }

            self.state.frame = self.state.next_frame;
            stepped = true;
            remaining -= 1;
            match range.step(self.state.frame, force_loop) {
                Some(next) => self.state.next_frame = next,
                None => {
                    // One-shot finished: hold the last frame
                    self.state = AnimationState::still(self.state.frame);
                    self.playing = false;
                    trace!("{} finished on frame {}", self.id, self.state.frame);
                    return;
                }
            }
        }
    }

    fn stop(&mut self) {
        self.state = AnimationState::still(self.state.frame);
        self.playing = false;
    }
}

/// Plays animations on the legs and torso of a player model
#[derive(Debug, Clone)]
pub struct AnimationDriver {
    set: AnimationSet,
    legs: Option<Playback>,
    torso: Option<Playback>,
}

impl AnimationDriver {
    pub const DEFAULT_TORSO: AnimationId = AnimationId::TorsoStand;
    pub const DEFAULT_LEGS: AnimationId = AnimationId::LegsIdle;

    /// Create a driver running the default stand/idle pair
    pub fn new(set: AnimationSet) -> Self {
        let mut driver = Self {
            set,
            legs: None,
            torso: None,
        };
        driver.reset_to_defaults();
        driver
    }

    pub fn animation_set(&self) -> &AnimationSet {
        &self.set
    }

    /// Start `id` on every body part it targets
    pub fn set_animation(&mut self, id: AnimationId) {
        let range = *self.set.range(id);
        debug!(
            "Starting {id} (frames {}..={}, {} fps)",
            range.first_frame,
            range.last_frame(),
            range.fps
        );
        for part in id.targets() {
            let playback = Some(Playback::start(id, &range));
            match part {
                BodyPart::Legs => self.legs = playback,
                _ => self.torso = playback,
            }
        }
    }

    /// Freeze the animation of a body part on its current frame
    pub fn stop(&mut self, part: BodyPart) {
        if let Some(playback) = self.playback_mut(part) {
            playback.stop();
        }
    }

    pub fn stop_all(&mut self) {
        self.stop(BodyPart::Legs);
        self.stop(BodyPart::Torso);
    }

    pub fn reset_to_defaults(&mut self) {
        self.set_animation(Self::DEFAULT_TORSO);
        self.set_animation(Self::DEFAULT_LEGS);
    }

    /// Advance all playing animations by `delta_secs`
    ///
    /// `force_loop` repeats one-shot ranges from their first frame. Non-finite
    /// steps are ignored.
    pub fn tick(&mut self, delta_secs: f32, force_loop: bool) {
        if !delta_secs.is_finite() {
            warn!("Ignoring non-finite animation step {delta_secs}");
            return;
        }
        let delta_secs = delta_secs.max(0.0);
        for playback in [&mut self.legs, &mut self.torso].into_iter().flatten() {
            let range = self.set.ranges[playback.id.index()];
            playback.tick(&range, delta_secs, force_loop);
        }
    }

    pub fn playback(&self, part: BodyPart) -> Option<&Playback> {
        match part {
            BodyPart::Legs => self.legs.as_ref(),
            BodyPart::Torso => self.torso.as_ref(),
            _ => None,
        }
    }

    fn playback_mut(&mut self, part: BodyPart) -> Option<&mut Playback> {
        match part {
            BodyPart::Legs => self.legs.as_mut(),
            BodyPart::Torso => self.torso.as_mut(),
            _ => None,
        }
    }

    pub fn state(&self, part: BodyPart) -> Option<AnimationState> {
        self.playback(part).map(|p| p.state)
    }

    /// Write the current frame state into the legs and torso of a tree
    pub fn apply(&self, arena: &mut ModelArena, root: ModelHandle) -> Result<()> {
        for handle in arena.iter_subtree(root)? {
            let node = arena.get_mut(handle)?;
            if let Some(state) = self.state(node.body_part) {
                node.set_animation_state(state);
            }
        }
        Ok(())
    }
}
