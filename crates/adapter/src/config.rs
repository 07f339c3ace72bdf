//! Node configuration.

use thiserror::Error;

use crate::core::{GridTopology, HatchRules, MoveRules, TopologyError};
use crate::types::{DEFAULT_COLUMNS, DEFAULT_ROWS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("topic prefix {0:?} is not of the form <base><node>/")]
    MalformedPrefix(String),
    #[error("topic prefix {prefix:?} names node {id:?}, expected 0..=3")]
    UnknownNode { prefix: String, id: String },
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Everything one node needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    /// Topic prefix naming the node, `<base><n>/`.
    pub prefix: String,
    pub rows: u16,
    pub columns: u16,
    pub view_workers: usize,
    pub hatchery_workers: usize,
    pub lake_workers: usize,
    pub hatch: HatchRules,
    pub moves: MoveRules,
}

impl NodeConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            view_workers: 2,
            hatchery_workers: 2,
            lake_workers: 4,
            hatch: HatchRules::default(),
            moves: MoveRules::default(),
        }
    }

    /// Defaults overridden by `FISH_ROWS`, `FISH_COLUMNS`,
    /// `FISH_LAKE_WORKERS` and `FISH_HATCH_RATE_SECS`.
    pub fn from_env(prefix: impl Into<String>) -> Self {
        use std::env;

        fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
            env::var(key).ok().and_then(|s| s.trim().parse().ok())
        }

        let mut config = Self::new(prefix);
        if let Some(rows) = parsed("FISH_ROWS") {
            config.rows = rows;
        }
        if let Some(columns) = parsed("FISH_COLUMNS") {
            config.columns = columns;
        }
        if let Some(workers) = parsed::<usize>("FISH_LAKE_WORKERS") {
            config.lake_workers = workers.max(1);
        }
        if let Some(rate) = parsed::<u64>("FISH_HATCH_RATE_SECS") {
            config.hatch.rate_secs = rate.max(1);
        }
        config
    }

    pub fn topology(&self) -> Result<GridTopology, ConfigError> {
        Ok(GridTopology::new(self.rows, self.columns)?)
    }
}
