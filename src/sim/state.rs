//! Core simulation types shared between components

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Top-level phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for StartGame, or between Reset and GameStart on replay
    #[default]
    Idle,
    /// Ball is simulating and the path is advancing
    Playing,
    /// Run ended
    GameOver,
}

/// Index of a segment inside its pool (stable for the pool's lifetime)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

impl SegmentId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A segment handle that is only valid for one activation of that segment.
///
/// Items anchor to this so a recycled segment does not drag old items along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Anchor {
    pub segment: SegmentId,
    pub generation: u32,
}

/// One platform tile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    /// Visual variant this segment was warmed for
    pub archetype: u32,
    /// Center of the top surface
    pub pos: Vec3,
    /// Z-extent
    pub length: f32,
    pub active: bool,
    /// Successor in traversal order; set only while both are active
    pub next: Option<SegmentId>,
    /// Predecessor, kept so a release can clear the inbound link
    pub(crate) prev: Option<SegmentId>,
    /// Bumped on every acquire
    pub generation: u32,
}

impl Segment {
    pub fn new(id: SegmentId, archetype: u32, length: f32) -> Self {
        Self {
            id,
            archetype,
            pos: Vec3::ZERO,
            length,
            active: false,
            next: None,
            prev: None,
            generation: 0,
        }
    }

    pub fn anchor(&self) -> Anchor {
        Anchor {
            segment: self.id,
            generation: self.generation,
        }
    }

    /// Z of the near (camera-side) edge
    #[inline]
    pub fn near_z(&self) -> f32 {
        self.pos.z - self.length / 2.0
    }

    /// Z of the far edge
    #[inline]
    pub fn far_z(&self) -> f32 {
        self.pos.z + self.length / 2.0
    }
}

/// Read-only view of the active path used by the ball and items
pub trait Terrain {
    fn segment(&self, id: SegmentId) -> Option<&Segment>;

    /// Active segments, oldest first
    fn active_segments(&self) -> Box<dyn Iterator<Item = &Segment> + '_>;

    /// Surface position of an anchor if that activation is still live
    fn anchor_position(&self, anchor: Anchor) -> Option<Vec3> {
        self.segment(anchor.segment)
            .filter(|s| s.active && s.generation == anchor.generation)
            .map(|s| s.pos)
    }
}

/// Item rarity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Common,
    Rare,
    Epic,
}

/// A spawned collectible
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub tier: Tier,
    pub name: String,
    pub value: u32,
    pub anchor: Anchor,
    /// Offset from the anchor's surface position
    pub offset: Vec3,
}
