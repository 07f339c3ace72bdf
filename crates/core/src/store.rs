//! Frame store and merge batches.
//!
//! Movement workers append rendered frames per destination node; the view
//! worker drains them about once a second and ships each node's frames as one
//! `display/merge` batch.
//!
//! # Batch layout
//!
//! ```text
//! +----------------+----+----+------+-------------------+
//! | u32 LE len + 3 | 0  | 0  | mask | frame bytes (len) |  repeated
//! +----------------+----+----+------+-------------------+
//! ```
//!
//! `mask` is `2^emitter`: the node that rendered the frame.

use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::frame::BLANK;
use crate::grid::GridTopology;
use crate::types::{NodeId, NODE_COUNT};

/// Bytes preceding each frame in a batch.
pub const FRAME_HEADER_LEN: usize = 7;

/// Mask byte of the initial full-screen display message.
pub const DISPLAY_ALL_MASK: u8 = 0xff;

type Queues = [Vec<Vec<u8>>; NODE_COUNT];

/// Per-node queues of rendered, not yet flushed frames.
#[derive(Debug, Default)]
pub struct FrameStore {
    queues: Mutex<Queues>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Pushes and takes are single operations; a poisoned lock still holds whole queues.
    fn lock(&self) -> MutexGuard<'_, Queues> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, node: NodeId, frame: Vec<u8>) {
        self.lock()[node.index()].push(frame);
    }

    /// Take every queued frame for `node`, leaving its queue empty.
    pub fn drain(&self, node: NodeId) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.lock()[node.index()])
    }

    pub fn pending(&self, node: NodeId) -> usize {
        self.lock()[node.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().iter().all(Vec::is_empty)
    }
}

/// Concatenate `frames` into one merge batch sent by `emitter`.
pub fn encode_batch(emitter: NodeId, frames: &[Vec<u8>]) -> Vec<u8> {
    let total: usize = frames.iter().map(|f| f.len() + FRAME_HEADER_LEN).sum();
    let mut out = Vec::with_capacity(total);
    for frame in frames {
        let len = (frame.len() + 3) as u32;
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&[0, 0, emitter.bit()]);
        out.extend_from_slice(frame);
    }
    out
}

/// One frame recovered from a merge batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeFrame {
    pub mask: u8,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("truncated frame header at offset {0}")]
    TruncatedHeader(usize),
    #[error("frame at offset {offset} declares length {len} but only {available} bytes remain")]
    TruncatedFrame {
        offset: usize,
        len: usize,
        available: usize,
    },
    #[error("frame at offset {0} declares a length below the header size")]
    BadLength(usize),
}

/// Split a merge batch back into its frames.
pub fn decode_batch(mut bytes: &[u8]) -> Result<Vec<MergeFrame>, BatchError> {
    let mut frames = Vec::new();
    let mut offset = 0;
    while !bytes.is_empty() {
        if bytes.len() < FRAME_HEADER_LEN {
            return Err(BatchError::TruncatedHeader(offset));
        }
        let declared = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        let len = declared.checked_sub(3).ok_or(BatchError::BadLength(offset))?;
        let mask = bytes[6];
        let rest = &bytes[FRAME_HEADER_LEN..];
        if rest.len() < len {
            return Err(BatchError::TruncatedFrame {
                offset,
                len,
                available: rest.len(),
            });
        }
        frames.push(MergeFrame {
            mask,
            bytes: rest[..len].to_vec(),
        });
        bytes = &rest[len..];
        offset += FRAME_HEADER_LEN + len;
    }
    Ok(frames)
}

/// Initial `display` message: a full blank window addressed to every layer.
pub fn blank_display(grid: &GridTopology) -> Vec<u8> {
    let cells = grid.columns() as usize * grid.rows() as usize;
    let mut out = Vec::with_capacity(3 + cells);
    out.extend_from_slice(&[DISPLAY_ALL_MASK, 0, 0]);
    out.extend(std::iter::repeat(BLANK as u8).take(cells));
    out
}
