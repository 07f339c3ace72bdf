//! Shared lake types and constants.
//!
//! Pure data with no dependencies so every other crate (core logic, wire
//! protocol, terminal display) can use them.
//!
//! # Lake layout
//!
//! The lake is split into four node windows arranged as a 2x2 grid. Node ids
//! are assigned by quadrant:
//!
//! ```text
//!              x max        x min
//!   y min        2            0
//!   y max        3            1
//! ```
//!
//! Nodes 0 and 1 own the min-x half, 2 and 3 the max-x half. Nodes 0 and 2
//! own the min-y half, 1 and 3 the max-y half.
//!
//! # Timing constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `MOVE_INTERVAL_MIN_MS` | 500 | Fastest per-fish step cadence |
//! | `MOVE_INTERVAL_MAX_MS` | 1500 | Slowest per-fish step cadence |
//! | `DEATH_TIMEOUT_MS` | 2000 | Remaining lifespan at which a fish dies |
//! | `IDLE_YIELD_MS` | 100 | Pause before re-posting a fish with no step due |
//! | `PACE_MS` | 1000 | Self-throttle period of the view and hatchery loops |
//! | `HATCH_RATE_SECS` | 45 | Seconds between births |
//! | `LIFESPAN_MIN_SECS` | 120 | Shortest fish lifespan |
//! | `LIFESPAN_MAX_SECS` | 240 | Longest fish lifespan |
//!
//! # Examples
//!
//! ```
//! use fish_lake_types::{FishKind, NodeId};
//!
//! let node = NodeId::new(2).unwrap();
//! assert_eq!(node.bit(), 0b100);
//! assert!(NodeId::new(4).is_none());
//!
//! assert_eq!(FishKind::from_str("Carp"), Some(FishKind::Carp));
//! assert_eq!(FishKind::Salmon.glyphs(true, node), "<·}}2→<");
//! ```

use std::fmt;

/// Number of nodes sharing the lake.
pub const NODE_COUNT: usize = 4;

/// Default rows per node window.
pub const DEFAULT_ROWS: u16 = 2;

/// Default columns per node window.
pub const DEFAULT_COLUMNS: u16 = 16;

/// Fastest step cadence drawn for a new fish (milliseconds).
pub const MOVE_INTERVAL_MIN_MS: u32 = 500;

/// Slowest step cadence drawn for a new fish (milliseconds).
pub const MOVE_INTERVAL_MAX_MS: u32 = 1500;

/// Probability that a step also moves the fish vertically.
pub const MOVE_Y_CHANCE: f64 = 0.10;

/// Probability that a fish turns around at the lake's x edge.
pub const MOVE_X_FLIP_CHANCE: f64 = 0.60;

/// A fish whose remaining timeout is at or below this dies (milliseconds).
pub const DEATH_TIMEOUT_MS: u32 = 2000;

/// Pause before re-posting a fish that had no step due (milliseconds).
pub const IDLE_YIELD_MS: u64 = 100;

/// Self-throttle period of the view and hatchery handlers (milliseconds).
pub const PACE_MS: u64 = 1000;

/// Seconds between fish births on one node.
pub const HATCH_RATE_SECS: u64 = 45;

/// Shortest lifespan of a new fish (seconds).
pub const LIFESPAN_MIN_SECS: u32 = 120;

/// Longest lifespan of a new fish (seconds).
pub const LIFESPAN_MAX_SECS: u32 = 240;

/// Identifier of one of the four lake nodes (0..=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u8);

impl NodeId {
    /// All node ids in ascending order.
    pub const ALL: [NodeId; NODE_COUNT] = [NodeId(0), NodeId(1), NodeId(2), NodeId(3)];

    /// Create a node id, `None` when outside 0..=3.
    pub const fn new(id: u8) -> Option<Self> {
        if (id as usize) < NODE_COUNT {
            Some(Self(id))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Slot in per-node arrays.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Bitmask identifying this node in merge headers (`2^id`).
    pub const fn bit(self) -> u8 {
        1 << self.0
    }

    /// True for nodes owning the min-x half of the lake.
    pub const fn is_min_x(self) -> bool {
        matches!(self.0, 0 | 1)
    }

    /// True for nodes owning the min-y half of the lake.
    pub const fn is_min_y(self) -> bool {
        matches!(self.0, 0 | 2)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for NodeId {
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::new(id).ok_or(id)
    }
}

/// Visual variants a fish can hatch as.
///
/// ASCII art inspired by <https://github.com/lericson/fish>.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FishKind {
    Bass,
    Salmon,
    Carp,
}

impl FishKind {
    pub const ALL: [FishKind; 3] = [FishKind::Bass, FishKind::Salmon, FishKind::Carp];

    /// Parse a kind name (case-insensitive).
    ///
    /// # Examples
    ///
    /// ```
    /// use fish_lake_types::FishKind;
    ///
    /// assert_eq!(FishKind::from_str("bass"), Some(FishKind::Bass));
    /// assert_eq!(FishKind::from_str("SALMON"), Some(FishKind::Salmon));
    /// assert_eq!(FishKind::from_str("trout"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bass" => Some(FishKind::Bass),
            "salmon" => Some(FishKind::Salmon),
            "carp" => Some(FishKind::Carp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FishKind::Bass => "bass",
            FishKind::Salmon => "salmon",
            FishKind::Carp => "carp",
        }
    }

    /// Glyph string for this kind, labelled with the hatching node.
    ///
    /// Character `i` is drawn at global x `x - i`, so the string runs toward
    /// decreasing x and reads left-to-right on the mirrored display.
    pub fn glyphs(&self, facing_min: bool, hatched: NodeId) -> String {
        let n = hatched.get();
        match (self, facing_min) {
            (FishKind::Bass, true) => format!("<°({n}<"),
            (FishKind::Bass, false) => format!(">{n})°>"),
            (FishKind::Salmon, true) => format!("<·}}}}{n}→<"),
            (FishKind::Salmon, false) => format!(">←{n}{{{{·>"),
            (FishKind::Carp, true) => format!("<θ]]]]{n}→<"),
            (FishKind::Carp, false) => format!(">←{n}[[[[θ>"),
        }
    }
}

/// Widest glyph string of any kind, in chars.
pub const MAX_GLYPH_WIDTH: u16 = 9;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_bits_are_powers_of_two() {
        let bits: Vec<u8> = NodeId::ALL.iter().map(|n| n.bit()).collect();
        assert_eq!(bits, vec![1, 2, 4, 8]);
    }

    #[test]
    fn node_halves_match_quadrant_layout() {
        let n = |id| NodeId::new(id).unwrap();
        assert!(n(0).is_min_x() && n(0).is_min_y());
        assert!(n(1).is_min_x() && !n(1).is_min_y());
        assert!(!n(2).is_min_x() && n(2).is_min_y());
        assert!(!n(3).is_min_x() && !n(3).is_min_y());
    }

    #[test]
    fn node_try_from_rejects_out_of_range() {
        assert_eq!(NodeId::try_from(3).map(NodeId::get), Ok(3));
        assert_eq!(NodeId::try_from(7), Err(7));
    }

    #[test]
    fn glyph_strings_match_art() {
        let n0 = NodeId::new(0).unwrap();
        assert_eq!(FishKind::Bass.glyphs(true, n0), "<°(0<");
        assert_eq!(FishKind::Bass.glyphs(false, n0), ">0)°>");
        assert_eq!(FishKind::Salmon.glyphs(false, n0), ">←0{{·>");
        assert_eq!(FishKind::Carp.glyphs(true, n0), "<θ]]]]0→<");
        assert_eq!(FishKind::Carp.glyphs(false, n0), ">←0[[[[θ>");
    }

    #[test]
    fn max_glyph_width_covers_every_kind() {
        let n3 = NodeId::new(3).unwrap();
        let widest = FishKind::ALL
            .iter()
            .flat_map(|k| [k.glyphs(true, n3), k.glyphs(false, n3)])
            .map(|g| g.chars().count())
            .max()
            .unwrap();
        assert_eq!(widest as u16, MAX_GLYPH_WIDTH);
    }

    #[test]
    fn timing_defaults() {
        assert_eq!(DEATH_TIMEOUT_MS, 2000);
        assert_eq!(MOVE_INTERVAL_MIN_MS, 500);
        assert_eq!(MOVE_INTERVAL_MAX_MS, 1500);
        assert_eq!(HATCH_RATE_SECS, 45);
        assert_eq!(LIFESPAN_MIN_SECS, 120);
        assert_eq!(LIFESPAN_MAX_SECS, 240);
    }
}
