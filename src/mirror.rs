//! The shooter's view of a remote peer's board.
//!
//! The peer resolves shots against its real board and replies with a
//! [`ShotReport`]; the mirror only learns what those reports reveal plus any
//! placements the peer announced.

use alloc::vec::Vec;

use crate::bitboard::Grid;
use crate::common::{BoardError, ShotOutcome, ShotReport};
use crate::fleet::Placement;
use crate::ship::{Orientation, Ship};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct MirrorBoard {
    fleet_size: usize,
    no_touching: bool,
    announced: Vec<Placement>,
    shots: Grid,
    hits: Grid,
    sunk: Vec<Ship>,
}

impl MirrorBoard {
    pub fn new(fleet_size: usize, no_touching: bool) -> Self {
        Self {
            fleet_size,
            no_touching,
            announced: Vec::new(),
            shots: Grid::new(),
            hits: Grid::new(),
            sunk: Vec::new(),
        }
    }

    /// Record a placement announced by the peer. A re-announced placement
    /// is recorded once.
    pub fn record_placement(&mut self, placement: Placement) {
        if !self.announced.contains(&placement) {
            self.announced.push(placement);
        }
    }

    /// `true` once the peer has announced its whole fleet.
    pub fn peer_ready(&self) -> bool {
        self.announced.len() >= self.fleet_size
    }

    pub fn announced(&self) -> &[Placement] {
        &self.announced
    }

    pub fn shots(&self) -> Grid {
        self.shots
    }

    pub fn hits(&self) -> Grid {
        self.hits
    }

    pub fn sunk(&self) -> &[Ship] {
        &self.sunk
    }

    pub fn is_shot(&self, row: usize, col: usize) -> Result<bool, BoardError> {
        Ok(self.shots.get(row, col)?)
    }

    /// Apply the peer's report for a shot at (`row`, `col`).
    ///
    /// For `Sunk` the ship is rebuilt from the run of connected hits through
    /// the cell and, under the no-touching rule, its surrounding cells are
    /// marked as shot. A report for a cell already recorded is a `Repeat`.
    pub fn apply_report(
        &mut self,
        row: usize,
        col: usize,
        report: ShotReport,
    ) -> Result<ShotOutcome, BoardError> {
        if self.shots.get(row, col)? {
            log::debug!("ignoring duplicate report for ({}, {})", row, col);
            return Ok(ShotOutcome::Repeat);
        }
        self.shots.set(row, col)?;
        match report {
            ShotReport::Miss => Ok(ShotOutcome::Miss),
            ShotReport::Hit => {
                self.hits.set(row, col)?;
                Ok(ShotOutcome::Hit)
            }
            ShotReport::Sunk => {
                self.hits.set(row, col)?;
                let ship = self.trace_ship(row, col)?;
                if self.no_touching {
                    let mask = ship.mask();
                    self.shots |= mask.dilate() & !mask;
                }
                self.sunk.push(ship);
                Ok(ShotOutcome::Sunk(ship))
            }
        }
    }

    /// `true` once every ship of the peer's fleet has been reported sunk.
    pub fn all_sunk(&self) -> bool {
        self.fleet_size > 0 && self.sunk.len() >= self.fleet_size
    }

    /// Structural checks for a mirror loaded from a snapshot.
    pub fn is_consistent(&self) -> bool {
        self.shots.is_canonical()
            && self.hits.is_canonical()
            && self.shots.contains_all(&self.hits)
            && self.sunk.len() <= self.fleet_size
            && self.sunk.iter().all(|s| {
                let (row, col) = s.origin();
                Ship::new(row, col, s.length(), s.orientation()).is_ok()
                    && s.is_sunk()
                    && self.hits.contains_all(&s.mask())
            })
    }

    /// Walk the straight run of hits through (`row`, `col`).
    fn trace_ship(&self, row: usize, col: usize) -> Result<Ship, BoardError> {
        let hit = |r: isize, c: isize| {
            Grid::in_bounds(r, c) && self.hits.get(r as usize, c as usize).unwrap_or(false)
        };
        let run = |dr: isize, dc: isize| {
            let mut n = 0;
            while hit(row as isize + dr * (n + 1), col as isize + dc * (n + 1)) {
                n += 1;
            }
            n as usize
        };
        let (left, right) = (run(0, -1), run(0, 1));
        let (up, down) = (run(-1, 0), run(1, 0));
        let ship = if left + right >= up + down && left + right > 0 {
            Ship::new(row, col - left, left + right + 1, Orientation::Horizontal)?
        } else {
            Ship::new(row - up, col, up + down + 1, Orientation::Vertical)?
        };
        Ok(ship.with_hits(ship.length()))
    }
}
