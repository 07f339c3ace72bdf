//! Grid topology - maps global lake coordinates onto the four node windows.
//!
//! Pure geometry: no state beyond the configured window size, no side effects.

use thiserror::Error;

use crate::types::{NodeId, MAX_GLYPH_WIDTH};

/// Inclusive coordinate window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

impl Window {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    pub fn width(&self) -> i32 {
        self.x_max - self.x_min + 1
    }

    pub fn height(&self) -> i32 {
        self.y_max - self.y_min + 1
    }
}

/// A global coordinate resolved to its owning node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub node: NodeId,
    pub local_x: u16,
    pub local_y: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("node windows need at least one row")]
    NoRows,
    #[error("node windows are {columns} columns wide, fish need at least {needed}")]
    TooNarrow { columns: u16, needed: u16 },
}

/// Fixed 2x2 partition of the lake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridTopology {
    rows: u16,
    columns: u16,
}

impl GridTopology {
    /// Build a topology from the per-node window size.
    ///
    /// Windows must fit the widest fish so a hatchling can start fully
    /// inside its node.
    pub fn new(rows: u16, columns: u16) -> Result<Self, TopologyError> {
        if rows == 0 {
            return Err(TopologyError::NoRows);
        }
        let needed = MAX_GLYPH_WIDTH + 1;
        if columns < needed {
            return Err(TopologyError::TooNarrow { columns, needed });
        }
        Ok(Self { rows, columns })
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn columns(&self) -> u16 {
        self.columns
    }

    pub fn lake_width(&self) -> i32 {
        2 * self.columns as i32
    }

    pub fn lake_height(&self) -> i32 {
        2 * self.rows as i32
    }

    /// Bounds of the whole lake.
    pub fn outer_bounds(&self) -> Window {
        Window {
            x_min: 0,
            x_max: self.lake_width() - 1,
            y_min: 0,
            y_max: self.lake_height() - 1,
        }
    }

    /// Bounds of one node's window.
    pub fn window(&self, node: NodeId) -> Window {
        let columns = self.columns as i32;
        let rows = self.rows as i32;
        let x_min = if node.is_min_x() { 0 } else { columns };
        let y_min = if node.is_min_y() { 0 } else { rows };
        Window {
            x_min,
            x_max: x_min + columns - 1,
            y_min,
            y_max: y_min + rows - 1,
        }
    }

    /// Resolve a global coordinate to its node and window-local coordinate.
    ///
    /// Returns `None` for coordinates outside the lake; that is a normal
    /// outcome (a fish swimming off the edge), not an error.
    pub fn map_to_node(&self, x: i32, y: i32) -> Option<Placement> {
        let columns = self.columns as i32;
        let rows = self.rows as i32;
        if x < 0 || y < 0 {
            return None;
        }
        let (min_x, local_x) = if x < columns {
            (true, x)
        } else if x < 2 * columns {
            (false, x - columns)
        } else {
            return None;
        };
        let (min_y, local_y) = if y < rows {
            (true, y)
        } else if y < 2 * rows {
            (false, y - rows)
        } else {
            return None;
        };
        let id = match (min_x, min_y) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        };
        Some(Placement {
            node: NodeId::new(id)?,
            local_x: local_x as u16,
            local_y: local_y as u16,
        })
    }
}

impl Default for GridTopology {
    fn default() -> Self {
        Self {
            rows: crate::types::DEFAULT_ROWS,
            columns: crate::types::DEFAULT_COLUMNS,
        }
    }
}
