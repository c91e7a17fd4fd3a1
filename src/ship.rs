//! Ship records and orientation.

use core::fmt;

use crate::bitboard::Grid;
use crate::common::BoardError;
use crate::config::{ship_name, GRID_SIZE};

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// The other orientation.
    pub fn rotate(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }

    /// Row/column step from one segment to the next.
    fn step(self) -> (usize, usize) {
        match self {
            Orientation::Horizontal => (0, 1),
            Orientation::Vertical => (1, 0),
        }
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Horizontal
    }
}

/// A ship placed on the board: origin is its top-left segment.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Ship {
    row: usize,
    col: usize,
    length: usize,
    orientation: Orientation,
    hit_count: usize,
}

impl Ship {
    /// Build an undamaged ship, rejecting zero length or any segment off
    /// the board.
    pub fn new(
        row: usize,
        col: usize,
        length: usize,
        orientation: Orientation,
    ) -> Result<Self, BoardError> {
        if length == 0 {
            return Err(BoardError::InvalidLength(length));
        }
        let (dr, dc) = orientation.step();
        let end_row = row
            .checked_add(dr * (length - 1))
            .ok_or(BoardError::ShipOutOfBounds)?;
        let end_col = col
            .checked_add(dc * (length - 1))
            .ok_or(BoardError::ShipOutOfBounds)?;
        if end_row >= GRID_SIZE || end_col >= GRID_SIZE {
            return Err(BoardError::ShipOutOfBounds);
        }
        Ok(Ship {
            row,
            col,
            length,
            orientation,
            hit_count: 0,
        })
    }

    pub fn origin(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn hit_count(&self) -> usize {
        self.hit_count
    }

    pub fn name(&self) -> &'static str {
        ship_name(self.length)
    }

    pub fn is_sunk(&self) -> bool {
        self.hit_count == self.length
    }

    /// Covered cells, origin first.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let (dr, dc) = self.orientation.step();
        let (row, col) = (self.row, self.col);
        (0..self.length).map(move |i| (row + dr * i, col + dc * i))
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.cells().any(|cell| cell == (row, col))
    }

    /// Occupancy mask of the ship.
    pub fn mask(&self) -> Grid {
        let mut mask = Grid::new();
        for (r, c) in self.cells() {
            // in bounds by construction
            let _ = mask.set(r, c);
        }
        mask
    }

    /// Count one more hit; saturates at `length`.
    pub(crate) fn register_hit(&mut self) {
        if self.hit_count < self.length {
            self.hit_count += 1;
        }
    }

    pub(crate) fn with_hits(mut self, hit_count: usize) -> Self {
        self.hit_count = hit_count;
        self
    }
}

impl fmt::Debug for Ship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ship {{ name: \"{}\", origin: ({}, {}), length: {}, orientation: {:?}, hits: {} }}",
            self.name(),
            self.row,
            self.col,
            self.length,
            self.orientation,
            self.hit_count,
        )
    }
}
