//! Adapter module - nodes talking over a message transport
//!
//! This crate connects the pure lake rules in `fish-lake-core` to a message
//! bus. A lake is split across four nodes; each node owns a topic prefix and
//! serves the topics under it.
//!
//! # Topics
//!
//! Under a node prefix `<base><n>/` (default base `/odroid/fish/`):
//!
//! - **lake**: one message per fish, carrying its JSON record; the message
//!   timeout is the fish's remaining lifespan
//! - **hatchery**: the node's single hatchery record, re-posted every second
//! - **view**: an empty tick, re-posted every second, that flushes frames
//! - **display**: blank frame sent once at startup (outbound only)
//! - **display/merge**: frame batches from every node (outbound only)
//!
//! # Message Flow
//!
//! ```text
//! hatchery ──spawn──> <n>/lake ──move──> <n>/lake        (still ours)
//!                                  └──> <m>/lake        (hand-off)
//! moves ──frames──> FrameStore ──view tick──> <m>/display/merge
//! ```
//!
//! # Environment Variables
//!
//! - `FISH_ROWS`, `FISH_COLUMNS`: node window size (default 2 x 16)
//! - `FISH_LAKE_WORKERS`: workers on the lake topic (default 4)
//! - `FISH_HATCH_RATE_SECS`: seconds between births (default 45)
//!
//! # Implementation
//!
//! - Handlers in [`router`] are synchronous and return the pause to take
//! - [`runtime`] runs them on **tokio** worker tasks
//! - [`transport::LocalBus`] is an in-process bus with per-message deadlines

pub mod clock;
pub mod config;
pub mod protocol;
pub mod router;
pub mod runtime;
pub mod topic;
pub mod transport;

pub use fish_lake_core as core;
pub use fish_lake_types as types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, NodeConfig};
pub use protocol::{
    decode_fish, decode_hatchery, encode_fish, encode_hatchery, FishRecord, HatcheryRecord,
    ProtocolError, COORD_LIMIT,
};
pub use router::{NodeRouter, Outbound, Reply, RouterError};
pub use runtime::{start_node, NodeHandle};
pub use topic::{NodeAddress, DEFAULT_BASE};
pub use transport::{LocalBus, Request, Subscription, TransId, Transport, TransportError};
