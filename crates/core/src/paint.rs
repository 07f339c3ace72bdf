//! Painting fish onto node frames.
//!
//! Every glyph cell is routed through [`GridTopology::map_to_node`] on its
//! own, so a fish straddling a partition writes partial glyphs into two
//! nodes' frames at once. Each touched node gets exactly one frame per paint.

use arrayvec::ArrayVec;

use crate::frame::{Frame, BLANK};
use crate::grid::GridTopology;
use crate::store::FrameStore;
use crate::types::{NodeId, NODE_COUNT};

/// Accumulates erase/draw strokes for one step.
#[derive(Debug)]
pub struct Painter<'a> {
    grid: &'a GridTopology,
    frames: [Option<Frame>; NODE_COUNT],
}

impl<'a> Painter<'a> {
    pub fn new(grid: &'a GridTopology) -> Self {
        Self {
            grid,
            frames: Default::default(),
        }
    }

    /// Blank `width` cells ending at `x` (running toward decreasing x).
    pub fn erase(&mut self, width: u16, x: i32, y: i32) {
        for i in 0..width as i32 {
            self.put(x - i, y, BLANK);
        }
    }

    /// Draw `glyphs` with its first char at `x`, the rest toward decreasing x.
    pub fn draw(&mut self, glyphs: &str, x: i32, y: i32) {
        for (i, ch) in glyphs.chars().enumerate() {
            self.put(x - i as i32, y, ch);
        }
    }

    fn put(&mut self, x: i32, y: i32, ch: char) {
        let Some(p) = self.grid.map_to_node(x, y) else {
            return;
        };
        let columns = self.grid.columns();
        let rows = self.grid.rows();
        let frame = self.frames[p.node.index()]
            .get_or_insert_with(|| Frame::transparent(columns, rows));
        // Displays show the x axis mirrored: column 0 is the window's max x.
        frame.set(columns - 1 - p.local_x, p.local_y, ch);
    }

    /// Frames for every touched node, in node order.
    pub fn finish(self) -> ArrayVec<(NodeId, Frame), NODE_COUNT> {
        NodeId::ALL
            .into_iter()
            .zip(self.frames)
            .filter_map(|(node, frame)| frame.map(|f| (node, f)))
            .collect()
    }

    /// Append the painted frames to `store`, returning the touched nodes.
    pub fn commit(self, store: &FrameStore) -> ArrayVec<NodeId, NODE_COUNT> {
        let mut touched = ArrayVec::new();
        for (node, frame) in self.finish() {
            store.append(node, frame.to_bytes());
            touched.push(node);
        }
        touched
    }
}
