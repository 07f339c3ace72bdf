//! Fish movement and lifecycle.
//!
//! A fish is advanced by [`Fish::tick`] each time its `lake` message is
//! handled. Movement is time based: the number of steps due is derived from
//! wall-clock time since `move_epoch_ms`, so a fish that waited in a queue
//! catches up in one invocation. Stepping stops as soon as another node owns
//! the fish; that node resynchronizes the epoch against its own clock.

use log::{debug, info};
use rand::Rng;

use crate::lake::Lake;
use crate::paint::Painter;
use crate::types::{FishKind, NodeId};

/// State of one fish, carried inside its `lake` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fish {
    pub spawn_node: NodeId,
    pub kind: FishKind,
    pub facing_min: bool,
    /// Glyphs for `kind`, `facing_min` and `spawn_node`.
    pub view: String,
    /// Glyph count in chars.
    pub view_width: u16,
    /// Offset from `x` of the cell that decides ownership.
    pub view_center: u16,
    pub x: i32,
    pub y: i32,
    pub move_interval_ms: u32,
    /// Start of the current step accounting window, on the owner's clock.
    pub move_epoch_ms: Option<u64>,
    /// Steps applied since `move_epoch_ms`.
    pub move_steps: u64,
    /// Vertical drift direction: toward min y when set.
    pub drift_min: bool,
}

/// Outcome of one [`Fish::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    /// Epoch was missing or ahead of this node's clock; restarted at now.
    Resync,
    /// No step due yet.
    Idle,
    /// Moved and still owned by this node.
    Moved { steps: u64 },
    /// Moved into another node's window.
    HandOff(NodeId),
    /// Lifespan ran out or the fish left the lake.
    Died,
}

impl Movement {
    /// Node that must handle the fish next, `None` once it is dead.
    pub fn next_owner(&self, here: NodeId) -> Option<NodeId> {
        match self {
            Movement::Resync | Movement::Idle | Movement::Moved { .. } => Some(here),
            Movement::HandOff(node) => Some(*node),
            Movement::Died => None,
        }
    }
}

/// Glyph width and ownership offset for a glyph string.
fn view_metrics(view: &str) -> (u16, u16) {
    let width = view.chars().count() as u16;
    (width, (width + 1) / 2)
}

impl Fish {
    /// Hatch a fish inside `lake`'s own window.
    ///
    /// The starting column keeps the whole glyph string inside the window.
    pub fn hatch<R: Rng + ?Sized>(lake: &Lake, now_ms: u64, rng: &mut R) -> Self {
        let node = lake.node();
        let rules = lake.rules();
        let window = lake.grid().window(node);

        let kind = FishKind::ALL[rng.random_range(0..FishKind::ALL.len())];
        let facing_min = rng.random_bool(0.5);
        let view = kind.glyphs(facing_min, node);
        let (view_width, view_center) = view_metrics(&view);

        let x_lo = (window.x_min + view_width as i32 - 1).min(window.x_max);
        let x = rng.random_range(x_lo..=window.x_max);
        let y = rng.random_range(window.y_min..=window.y_max);
        let (lo, hi) = (
            rules.interval_min_ms.min(rules.interval_max_ms),
            rules.interval_min_ms.max(rules.interval_max_ms),
        );

        Self {
            spawn_node: node,
            kind,
            facing_min,
            view,
            view_width,
            view_center,
            x,
            y,
            move_interval_ms: rng.random_range(lo..=hi).max(1),
            move_epoch_ms: Some(now_ms),
            move_steps: 0,
            drift_min: rng.random_bool(0.5),
        }
    }

    /// Recompute the glyphs after `kind`, `facing_min` or `spawn_node` changed.
    pub fn refresh_view(&mut self) {
        self.view = self.kind.glyphs(self.facing_min, self.spawn_node);
        let (width, center) = view_metrics(&self.view);
        self.view_width = width;
        self.view_center = center;
    }

    /// Advance the fish given its remaining `timeout_ms` budget.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        lake: &Lake,
        timeout_ms: u32,
        now_ms: u64,
        rng: &mut R,
    ) -> Movement {
        if timeout_ms <= lake.rules().death_timeout_ms {
            self.render_dead(lake);
            return Movement::Died;
        }

        let epoch = match self.move_epoch_ms {
            Some(epoch) if epoch <= now_ms => epoch,
            _ => {
                self.move_epoch_ms = Some(now_ms);
                self.move_steps = 0;
                return Movement::Resync;
            }
        };

        let total = (now_ms - epoch) / self.move_interval_ms.max(1) as u64;
        if total <= self.move_steps {
            return Movement::Idle;
        }
        let due = total - self.move_steps;

        let here = lake.node();
        let mut outcome = None;
        let mut steps = 0;
        while steps < due {
            steps += 1;
            match self.step(lake, rng) {
                Some(owner) if owner == here => {}
                Some(owner) => {
                    outcome = Some(Movement::HandOff(owner));
                    break;
                }
                None => {
                    outcome = Some(Movement::Died);
                    break;
                }
            }
        }
        self.move_steps += steps;

        match outcome {
            Some(Movement::HandOff(owner)) => {
                debug!("fish ({}, {}) handed off {} -> {}", self.x, self.y, here, owner);
                // The receiving node's clock is unrelated to ours.
                self.move_epoch_ms = None;
                Movement::HandOff(owner)
            }
            Some(Movement::Died) => {
                self.render_dead(lake);
                Movement::Died
            }
            _ => Movement::Moved { steps },
        }
    }

    /// Node owning the fish at its current position, `None` once the whole
    /// glyph string has left the lake.
    pub fn owner(&self, lake: &Lake) -> Option<NodeId> {
        let grid = lake.grid();
        let outer = grid.outer_bounds();
        let tail = self.view_width as i32 - 1;
        if self.x < outer.x_min || self.x - tail > outer.x_max {
            return None;
        }
        let center = self.x - self.view_center as i32;
        Some(
            grid.map_to_node(center, self.y)
                .map(|p| p.node)
                .unwrap_or_else(|| lake.node()),
        )
    }

    fn step<R: Rng + ?Sized>(&mut self, lake: &Lake, rng: &mut R) -> Option<NodeId> {
        let rules = lake.rules();
        let outer = lake.grid().outer_bounds();
        let (x_old, y_old) = (self.x, self.y);

        self.x += if self.facing_min { -1 } else { 1 };
        if rng.random::<f64>() < rules.y_chance {
            self.y += if self.drift_min { -1 } else { 1 };
        }

        let tail = self.view_width as i32 - 1;
        let overshot = if self.facing_min {
            self.x < outer.x_min
        } else {
            self.x - tail > outer.x_max
        };
        if overshot && rng.random::<f64>() < rules.flip_chance {
            self.x += if self.facing_min { 1 } else { -1 };
            self.facing_min = !self.facing_min;
            self.refresh_view();
        }

        if self.y < outer.y_min {
            self.y += 1;
            self.drift_min = !self.drift_min;
        } else if self.y > outer.y_max {
            self.y -= 1;
            self.drift_min = !self.drift_min;
        }

        debug!("moved fish ({}, {}) -> ({}, {})", x_old, y_old, self.x, self.y);

        let mut painter = Painter::new(lake.grid());
        painter.erase(self.view_width, x_old, y_old);
        painter.draw(&self.view, self.x, self.y);
        painter.commit(lake.frames());

        self.owner(lake)
    }

    fn render_dead(&self, lake: &Lake) {
        info!("dead fish ({}, {})", self.x, self.y);
        let mut painter = Painter::new(lake.grid());
        painter.erase(self.view_width, self.x, self.y);
        painter.commit(lake.frames());
    }
}
