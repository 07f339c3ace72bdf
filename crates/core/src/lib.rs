//! Core lake logic - pure, clock-free and transport-free
//!
//! Everything here takes the current time and a random source as arguments,
//! so each rule can be unit tested without a message bus or real sleeping.
//!
//! # Module Structure
//!
//! - [`grid`]: 2x2 partition of the lake into node windows
//! - [`frame`]: character frames covering one node window
//! - [`paint`]: routing glyph cells into the frames of the nodes they land on
//! - [`store`]: per-node pending frames and the merge batch wire format
//! - [`fish`]: fish movement, hand-off and death
//! - [`hatchery`]: spawn cadence with catch-up
//! - [`lake`]: one node's shared context
//! - [`pace`]: self-throttling of periodic handlers
//!
//! # Example
//!
//! ```
//! use fish_lake_core::{Fish, GridTopology, Lake, Movement};
//! use fish_lake_core::types::NodeId;
//!
//! let node = NodeId::new(0).unwrap();
//! let lake = Lake::new(node, GridTopology::default());
//! let mut rng = rand::rng();
//!
//! let mut fish = Fish::hatch(&lake, 0, &mut rng);
//! // A generous timeout and 100 ms elapsed: nothing is due yet.
//! assert_eq!(fish.tick(&lake, 60_000, 100, &mut rng), Movement::Idle);
//! ```

pub mod fish;
pub mod frame;
pub mod grid;
pub mod hatchery;
pub mod lake;
pub mod pace;
pub mod paint;
pub mod store;

pub use fish_lake_types as types;

pub use fish::{Fish, Movement};
pub use frame::{Frame, FrameError};
pub use grid::{GridTopology, Placement, TopologyError, Window};
pub use hatchery::{HatchRules, Hatchery};
pub use lake::{Lake, MoveRules};
pub use pace::Pacer;
pub use paint::Painter;
pub use store::{blank_display, decode_batch, encode_batch, BatchError, FrameStore, MergeFrame};
