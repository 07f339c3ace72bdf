//! Terminal display for the lake.
//!
//! A small, game-style rendering layer: the four node screens are kept in a
//! [`LakeDisplay`], laid out by [`LakeView`] into a framebuffer and flushed
//! by [`TerminalRenderer`], which only repaints cells that changed.
//!
//! Goals:
//! - Keep display state and layout pure and testable
//! - Accept exactly the bytes nodes send to their `display` topics

pub mod display;
pub mod fb;
pub mod lake_view;
pub mod renderer;

pub use fish_lake_core as core;
pub use fish_lake_types as types;

pub use display::{DisplayError, LakeDisplay};
pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use lake_view::{LakeView, Viewport};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
