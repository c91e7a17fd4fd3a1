//! Hunt/target search for the computer opponent.
//!
//! Hunt mode samples unshot cells of even parity; once a ship is hit the AI
//! switches to target mode and works through a queue of follow-up cells,
//! narrowing to the two line extensions as soon as two hits share a row or
//! column.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::bitboard::Grid;
use crate::config::GRID_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum AiMode {
    Hunt,
    Target,
}

/// Axis of the ship being pursued, once two hits pin it down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum LineOrientation {
    Horizontal,
    Vertical,
    Unknown,
}

/// Search state. `mode == Target` exactly when `hit_trail` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct HuntTargetAi {
    mode: AiMode,
    hit_trail: Vec<(usize, usize)>,
    line: LineOrientation,
    target_queue: VecDeque<(usize, usize)>,
}

impl Default for HuntTargetAi {
    fn default() -> Self {
        Self::new()
    }
}

impl HuntTargetAi {
    pub fn new() -> Self {
        Self {
            mode: AiMode::Hunt,
            hit_trail: Vec::new(),
            line: LineOrientation::Unknown,
            target_queue: VecDeque::new(),
        }
    }

    pub fn mode(&self) -> AiMode {
        self.mode
    }

    pub fn hit_trail(&self) -> &[(usize, usize)] {
        &self.hit_trail
    }

    pub fn line(&self) -> LineOrientation {
        self.line
    }

    pub fn target_queue(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.target_queue.iter().copied()
    }

    /// `mode` agrees with the hit trail; checked when loading saved state.
    pub fn is_consistent(&self) -> bool {
        let in_bounds = |&(r, c): &(usize, usize)| r < GRID_SIZE && c < GRID_SIZE;
        (self.mode == AiMode::Target) == !self.hit_trail.is_empty()
            && self.hit_trail.iter().all(in_bounds)
            && self.target_queue.iter().all(in_bounds)
    }

    /// Choose the next cell to fire at, given the cells already shot on the
    /// target board. Queue entries that have gone stale are dropped; with no
    /// usable queue entry the parity hunt takes over. `None` only when every
    /// cell has been shot.
    pub fn choose_cell<R: Rng>(&mut self, shots: &Grid, rng: &mut R) -> Option<(usize, usize)> {
        while let Some((row, col)) = self.target_queue.pop_front() {
            if !shots.get(row, col).unwrap_or(true) {
                return Some((row, col));
            }
        }
        hunt_cell(shots, rng)
    }

    /// Record a hit that did not sink its ship.
    pub fn record_hit(&mut self, row: usize, col: usize) {
        self.hit_trail.push((row, col));
        self.mode = AiMode::Target;

        if let [a, b, ..] = self.hit_trail.as_slice() {
            if a.0 == b.0 {
                self.line = LineOrientation::Horizontal;
            } else if a.1 == b.1 {
                self.line = LineOrientation::Vertical;
            }
        }

        match self.line {
            LineOrientation::Unknown => {
                let (r, c) = (row as isize, col as isize);
                for (nr, nc) in [(r - 1, c), (r + 1, c), (r, c - 1), (r, c + 1)] {
                    self.enqueue(nr, nc);
                }
            }
            line => {
                // Only the two cells just past either end of the trail.
                self.target_queue.clear();
                let (row0, col0) = self.hit_trail[0];
                match line {
                    LineOrientation::Horizontal => {
                        let min = self.hit_trail.iter().map(|h| h.1).min().unwrap_or(col0);
                        let max = self.hit_trail.iter().map(|h| h.1).max().unwrap_or(col0);
                        self.enqueue(row0 as isize, min as isize - 1);
                        self.enqueue(row0 as isize, max as isize + 1);
                    }
                    _ => {
                        let min = self.hit_trail.iter().map(|h| h.0).min().unwrap_or(row0);
                        let max = self.hit_trail.iter().map(|h| h.0).max().unwrap_or(row0);
                        self.enqueue(min as isize - 1, col0 as isize);
                        self.enqueue(max as isize + 1, col0 as isize);
                    }
                }
            }
        }
    }

    /// Drop all target memory and go back to hunting.
    pub fn reset_to_hunt(&mut self) {
        *self = Self::new();
    }

    fn enqueue(&mut self, row: isize, col: isize) {
        if !Grid::in_bounds(row, col) {
            return;
        }
        let cell = (row as usize, col as usize);
        if !self.target_queue.contains(&cell) {
            self.target_queue.push_back(cell);
        }
    }
}

/// Uniform pick among unshot even-parity cells, falling back to the odd
/// cells once the checkerboard is exhausted.
pub fn hunt_cell<R: Rng>(shots: &Grid, rng: &mut R) -> Option<(usize, usize)> {
    let open = !*shots;
    let (parity, rest): (Vec<_>, Vec<_>) = open.iter_set_bits().partition(|(r, c)| (r + c) % 2 == 0);
    let pool = if parity.is_empty() { rest } else { parity };
    pool.choose(rng).copied()
}
