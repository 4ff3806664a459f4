//! Lake records, handles, and the per-node ownership map.
//!
//! Lakes live in an arena indexed by small integer handles; a merged lake's
//! handle is retired by pointing it at the survivor rather than deleted, so
//! stale handles held elsewhere (e.g. in the cross-lake queue) resolve
//! safely. Node ownership is a tagged claim per node, replacing any
//! overloaded integer coding: a candidate or declared-spill node is never
//! mistakable for an already-flooded one.

use crate::queue::ElevQueue;

/// Handle of a lake in the arena. Stable for the duration of a fill pass;
/// resolves to the surviving lake after merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LakeId(pub u32);

/// Per-node ownership state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeClaim {
    /// No lake has any interest in this node yet.
    #[default]
    Unclaimed,
    /// Node is inundated by the given lake.
    Owned(LakeId),
    /// Node is adjacent to the given lake's extent, pending evaluation.
    Candidate(LakeId),
    /// Node is the declared overflow point of the given lake.
    Spill(LakeId),
}

/// State of one lake, keyed by its originating pit node.
#[derive(Debug, Clone, Default)]
pub struct Lake {
    /// Pit node this lake grew from.
    pub pit: u32,
    /// Current water-surface elevation (m); non-decreasing while active.
    pub level: f64,
    /// Accumulated inundated area (m²).
    pub area: f64,
    /// Remaining water volume budget (m³).
    pub volume: f64,
    /// Accumulated depth-proportional balance term over all flooded nodes.
    pub accum_k: f64,
    /// True when the last raise attempt ran out of volume.
    pub full: bool,
    /// Declared overflow node, once determined.
    pub spill_node: Option<u32>,
    /// Boundary frontier: not-yet-flooded candidates ordered by elevation.
    pub frontier: ElevQueue,
    /// Set when this lake has been folded into another; retires the handle.
    pub merged_into: Option<LakeId>,
    /// True once the pit's neighborhood has been loaded into the frontier.
    pub seeded: bool,
}

/// Arena of lakes for one fill pass.
#[derive(Debug, Clone, Default)]
pub struct Lakes {
    slots: Vec<Lake>,
}

impl Lakes {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lake at `pit` with a starting `level` and volume budget.
    pub fn register(&mut self, pit: u32, level: f64, volume: f64) -> LakeId {
        let id = LakeId(self.slots.len() as u32);
        self.slots.push(Lake { pit, level, volume, ..Lake::default() });
        id
    }

    /// Follow merge links to the surviving lake for `id`.
    pub fn resolve(&self, id: LakeId) -> LakeId {
        let mut cur = id;
        while let Some(next) = self.slots[cur.0 as usize].merged_into {
            cur = next;
        }
        cur
    }

    /// True if `id` has not been merged away.
    pub fn is_live(&self, id: LakeId) -> bool {
        self.slots[id.0 as usize].merged_into.is_none()
    }

    /// Shared access to the lake at `id` (not resolved).
    pub fn get(&self, id: LakeId) -> &Lake {
        &self.slots[id.0 as usize]
    }

    /// Mutable access to the lake at `id` (not resolved).
    pub fn get_mut(&mut self, id: LakeId) -> &mut Lake {
        &mut self.slots[id.0 as usize]
    }

    /// Iterate over live lakes with their handles.
    pub fn iter_live(&self) -> impl Iterator<Item = (LakeId, &Lake)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, l)| l.merged_into.is_none())
            .map(|(i, l)| (LakeId(i as u32), l))
    }
}
