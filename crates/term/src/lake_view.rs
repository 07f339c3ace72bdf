//! LakeView: lays the four node screens out as one lake.
//!
//! This module is pure (no I/O). It can be unit-tested.
//!
//! Node screens are mirrored in x, so the node holding the higher x range
//! sits on the left:
//!
//! ```text
//! ┌ 2 ───────┬ 0 ───────┐
//! │ screen 2 │ screen 0 │
//! ├ 3 ───────┼ 1 ───────┤
//! │ screen 3 │ screen 1 │
//! └──────────┴──────────┘
//! ```

use crate::display::LakeDisplay;
use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::types::NodeId;

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

const WATER: Rgb = Rgb::new(16, 40, 80);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LakeView {
    water: CellStyle,
    fish: CellStyle,
    border: CellStyle,
    status: CellStyle,
}

impl Default for LakeView {
    fn default() -> Self {
        Self {
            water: CellStyle::new(Rgb::new(60, 90, 140), WATER),
            fish: CellStyle::new(Rgb::new(250, 210, 90), WATER).bold(),
            border: CellStyle::new(Rgb::new(200, 200, 200), Rgb::new(0, 0, 0)),
            status: CellStyle::default().dim(),
        }
    }
}

/// Panel column and row of a node on screen.
fn panel(node: NodeId) -> (u16, u16) {
    let col = if node.is_min_x() { 1 } else { 0 };
    let row = if node.is_min_y() { 0 } else { 1 };
    (col, row)
}

impl LakeView {
    /// Size of the bordered lake, status line excluded.
    pub fn frame_size(&self, display: &LakeDisplay) -> (u16, u16) {
        let grid = display.grid();
        (grid.columns() * 2 + 3, grid.rows() * 2 + 3)
    }

    /// Render into an existing framebuffer, resizing it to `viewport`.
    pub fn render_into(
        &self,
        display: &LakeDisplay,
        status: &str,
        viewport: Viewport,
        fb: &mut FrameBuffer,
    ) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::default().into_cell(' '));

        let (frame_w, frame_h) = self.frame_size(display);
        let start_x = viewport.width.saturating_sub(frame_w) / 2;
        let start_y = viewport.height.saturating_sub(frame_h + 1) / 2;

        self.draw_grid(fb, display, start_x, start_y);

        for node in NodeId::ALL {
            self.draw_screen(fb, display, node, start_x, start_y);
        }

        fb.put_str(start_x, start_y + frame_h, status, self.status);
    }

    pub fn render(&self, display: &LakeDisplay, status: &str, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(display, status, viewport, &mut fb);
        fb
    }

    fn draw_grid(&self, fb: &mut FrameBuffer, display: &LakeDisplay, x: u16, y: u16) {
        let grid = display.grid();
        let (w, h) = self.frame_size(display);
        let mid_x = x + grid.columns() + 1;
        let mid_y = y + grid.rows() + 1;
        let style = self.border;

        for dx in 1..w - 1 {
            fb.put_char(x + dx, y, '─', style);
            fb.put_char(x + dx, mid_y, '─', style);
            fb.put_char(x + dx, y + h - 1, '─', style);
        }
        for dy in 1..h - 1 {
            fb.put_char(x, y + dy, '│', style);
            fb.put_char(mid_x, y + dy, '│', style);
            fb.put_char(x + w - 1, y + dy, '│', style);
        }

        fb.put_char(x, y, '┌', style);
        fb.put_char(mid_x, y, '┬', style);
        fb.put_char(x + w - 1, y, '┐', style);
        fb.put_char(x, mid_y, '├', style);
        fb.put_char(mid_x, mid_y, '┼', style);
        fb.put_char(x + w - 1, mid_y, '┤', style);
        fb.put_char(x, y + h - 1, '└', style);
        fb.put_char(mid_x, y + h - 1, '┴', style);
        fb.put_char(x + w - 1, y + h - 1, '┘', style);

        // Node labels on the top edge of each panel.
        for node in NodeId::ALL {
            let (col, row) = panel(node);
            let label_x = x + 1 + col * (grid.columns() + 1);
            let label_y = y + row * (grid.rows() + 1);
            fb.put_str(label_x, label_y, &format!(" {node} "), style);
        }
    }

    fn draw_screen(
        &self,
        fb: &mut FrameBuffer,
        display: &LakeDisplay,
        node: NodeId,
        start_x: u16,
        start_y: u16,
    ) {
        let screen = display.screen(node);
        let (col, row) = panel(node);
        let px = start_x + 1 + col * (screen.width() + 1);
        let py = start_y + 1 + row * (screen.height() + 1);

        for y in 0..screen.height() {
            for x in 0..screen.width() {
                let ch = screen.get(x, y).unwrap_or(' ');
                let (ch, style) = match ch {
                    ' ' | '\0' => ('~', self.water),
                    ch => (ch, self.fish),
                };
                fb.put_char(px + x, py + y, ch, style);
            }
        }
    }
}
