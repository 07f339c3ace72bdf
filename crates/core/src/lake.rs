//! Process-wide node context shared by every worker of one node.

use crate::grid::GridTopology;
use crate::store::FrameStore;
use crate::types::{
    NodeId, DEATH_TIMEOUT_MS, IDLE_YIELD_MS, MOVE_INTERVAL_MAX_MS, MOVE_INTERVAL_MIN_MS,
    MOVE_X_FLIP_CHANCE, MOVE_Y_CHANCE,
};

/// Tunables for fish movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRules {
    /// Chance per step of also moving one row.
    pub y_chance: f64,
    /// Chance of turning around when swimming past the lake's x edge.
    pub flip_chance: f64,
    pub interval_min_ms: u32,
    pub interval_max_ms: u32,
    /// Remaining timeout at or below which a fish dies.
    pub death_timeout_ms: u32,
    /// Pause before re-posting a fish with no step due.
    pub idle_yield_ms: u64,
}

impl Default for MoveRules {
    fn default() -> Self {
        Self {
            y_chance: MOVE_Y_CHANCE,
            flip_chance: MOVE_X_FLIP_CHANCE,
            interval_min_ms: MOVE_INTERVAL_MIN_MS,
            interval_max_ms: MOVE_INTERVAL_MAX_MS,
            death_timeout_ms: DEATH_TIMEOUT_MS,
            idle_yield_ms: IDLE_YIELD_MS,
        }
    }
}

/// One node's view of the lake: who it is, the shared geometry and its
/// pending frames.
#[derive(Debug)]
pub struct Lake {
    node: NodeId,
    grid: GridTopology,
    rules: MoveRules,
    frames: FrameStore,
}

impl Lake {
    pub fn new(node: NodeId, grid: GridTopology) -> Self {
        Self {
            node,
            grid,
            rules: MoveRules::default(),
            frames: FrameStore::new(),
        }
    }

    pub fn with_rules(mut self, rules: MoveRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn grid(&self) -> &GridTopology {
        &self.grid
    }

    pub fn rules(&self) -> &MoveRules {
        &self.rules
    }

    pub fn frames(&self) -> &FrameStore {
        &self.frames
    }
}
