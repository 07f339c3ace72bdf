//! Node frames - one character per cell over a node's window.
//!
//! A frame is a delta: cells holding [`TRANSPARENT`] leave whatever the
//! display already shows untouched. Frames travel as UTF-8 text, row-major,
//! `width` chars per row.

use thiserror::Error;

/// Cell value meaning "no change".
pub const TRANSPARENT: char = '\0';

/// Blank cell value (used to erase).
pub const BLANK: char = ' ';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame is not valid utf-8")]
    Utf8,
    #[error("frame has {got} cells, expected {expected}")]
    Size { got: usize, expected: usize },
}

/// 2D grid of character cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u16,
    height: u16,
    cells: Vec<char>,
}

impl Frame {
    /// A frame where every cell is transparent.
    pub fn transparent(width: u16, height: u16) -> Self {
        Self::filled(width, height, TRANSPARENT)
    }

    pub fn filled(width: u16, height: u16, ch: char) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            cells: vec![ch; len],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn cells(&self) -> &[char] {
        &self.cells
    }

    #[inline(always)]
    fn idx(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    pub fn get(&self, x: u16, y: u16) -> Option<char> {
        self.idx(x, y).map(|i| self.cells[i])
    }

    pub fn set(&mut self, x: u16, y: u16, ch: char) {
        if let Some(i) = self.idx(x, y) {
            self.cells[i] = ch;
        }
    }

    /// Copy every non-transparent cell of `delta` onto this frame.
    ///
    /// Frames of a different size are ignored.
    pub fn overlay(&mut self, delta: &Frame) {
        if delta.width != self.width || delta.height != self.height {
            return;
        }
        for (dst, &src) in self.cells.iter_mut().zip(delta.cells.iter()) {
            if src != TRANSPARENT {
                *dst = src;
            }
        }
    }

    /// Row `y` as a string (transparent cells included verbatim).
    pub fn row(&self, y: u16) -> String {
        let w = self.width as usize;
        let start = (y as usize) * w;
        self.cells
            .get(start..start + w)
            .map(|r| r.iter().collect())
            .unwrap_or_default()
    }

    /// Wire form: UTF-8 text of every cell, row-major.
    pub fn to_bytes(&self) -> Vec<u8> {
        let s: String = self.cells.iter().collect();
        s.into_bytes()
    }

    /// Parse a wire frame of known dimensions.
    pub fn from_bytes(width: u16, height: u16, bytes: &[u8]) -> Result<Self, FrameError> {
        let text = std::str::from_utf8(bytes).map_err(|_| FrameError::Utf8)?;
        let cells: Vec<char> = text.chars().collect();
        let expected = (width as usize) * (height as usize);
        if cells.len() != expected {
            return Err(FrameError::Size {
                got: cells.len(),
                expected,
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_ignores_out_of_range_cells() {
        let mut f = Frame::transparent(3, 2);
        f.set(3, 0, 'x');
        f.set(0, 2, 'x');
        assert!(f.cells().iter().all(|&c| c == TRANSPARENT));
        f.set(2, 1, 'x');
        assert_eq!(f.get(2, 1), Some('x'));
    }

    #[test]
    fn overlay_skips_transparent_cells() {
        let mut screen = Frame::filled(4, 1, BLANK);
        screen.set(0, 0, 'a');
        let mut delta = Frame::transparent(4, 1);
        delta.set(1, 0, 'b');
        delta.set(0, 0, BLANK);
        screen.overlay(&delta);
        assert_eq!(screen.row(0), " b  ");
    }

    #[test]
    fn wire_form_counts_chars_not_bytes() {
        let mut f = Frame::transparent(3, 1);
        f.set(0, 0, '°');
        f.set(1, 0, '→');
        let bytes = f.to_bytes();
        assert!(bytes.len() > 3);
        let back = Frame::from_bytes(3, 1, &bytes).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn from_bytes_rejects_wrong_size() {
        assert_eq!(
            Frame::from_bytes(2, 2, b"abc"),
            Err(FrameError::Size { got: 3, expected: 4 })
        );
        assert_eq!(Frame::from_bytes(1, 1, &[0xff]), Err(FrameError::Utf8));
    }
}
