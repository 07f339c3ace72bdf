//! Display state: what each node's screen currently shows.
//!
//! Nodes never send whole screens after startup. Every `display` message
//! replaces a screen and every `display/merge` batch is overlaid frame by
//! frame, with `'\0'` cells leaving the screen untouched.

use thiserror::Error;

use crate::core::{decode_batch, BatchError, Frame, FrameError, GridTopology};
use crate::types::{NodeId, NODE_COUNT};

/// Length of the header in front of a `display` frame.
const DISPLAY_HEADER_LEN: usize = 3;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("display message shorter than its 3 byte header")]
    TruncatedHeader,
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Screens of all four nodes.
#[derive(Debug, Clone)]
pub struct LakeDisplay {
    grid: GridTopology,
    screens: [Frame; NODE_COUNT],
    generation: u64,
    merged: u64,
}

impl LakeDisplay {
    pub fn new(grid: GridTopology) -> Self {
        let blank = Frame::filled(grid.columns(), grid.rows(), ' ');
        Self {
            grid,
            screens: std::array::from_fn(|_| blank.clone()),
            generation: 0,
            merged: 0,
        }
    }

    pub fn grid(&self) -> &GridTopology {
        &self.grid
    }

    pub fn screen(&self, node: NodeId) -> &Frame {
        &self.screens[node.index()]
    }

    /// Bumped by every applied message.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Merge frames applied so far.
    pub fn merged_frames(&self) -> u64 {
        self.merged
    }

    /// Apply a `display` message: header then one full frame.
    pub fn apply_display(&mut self, node: NodeId, bytes: &[u8]) -> Result<(), DisplayError> {
        let body = bytes
            .get(DISPLAY_HEADER_LEN..)
            .ok_or(DisplayError::TruncatedHeader)?;
        let frame = Frame::from_bytes(self.grid.columns(), self.grid.rows(), body)?;
        self.screens[node.index()].overlay(&frame);
        self.generation += 1;
        Ok(())
    }

    /// Apply a `display/merge` batch; returns the number of frames applied.
    ///
    /// A bad frame stops the batch; frames before it stay applied.
    pub fn apply_merge(&mut self, node: NodeId, bytes: &[u8]) -> Result<usize, DisplayError> {
        let (columns, rows) = (self.grid.columns(), self.grid.rows());
        let mut applied = 0;
        let mut result: Result<(), DisplayError> = Ok(());
        for merge in decode_batch(bytes)? {
            match Frame::from_bytes(columns, rows, &merge.bytes) {
                Ok(frame) => {
                    self.screens[node.index()].overlay(&frame);
                    applied += 1;
                }
                Err(e) => {
                    result = Err(e.into());
                    break;
                }
            }
        }
        if applied > 0 || result.is_ok() {
            self.merged += applied as u64;
            self.generation += 1;
        }
        result.map(|()| applied)
    }
}
