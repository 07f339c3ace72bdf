//! Fish lake (workspace facade crate).
//!
//! Re-exports the workspace crates under one name so the binary, the
//! integration tests and the benches share a single import root.

pub use fish_lake_adapter as adapter;
pub use fish_lake_core as core;
pub use fish_lake_term as term;
pub use fish_lake_types as types;
