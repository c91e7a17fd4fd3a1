//! Per-side board: ship occupancy, shot and hit history, ship damage.

use alloc::vec::Vec;
use core::fmt;
use rand::Rng;

use crate::bitboard::Grid;
use crate::common::{BoardError, ShotOutcome};
use crate::config::GRID_SIZE;
use crate::ship::{Orientation, Ship};

/// Attempts per ship before random placement falls back to a full scan.
const RANDOM_TRIES: usize = 800;
/// Whole-fleet attempts before random placement gives up.
const FLEET_TRIES: usize = 16;

/// Serializable board state for syncing or saving games.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct BoardState {
    pub no_touching: bool,
    pub ships: Vec<Ship>,
    pub occupancy: Grid,
    pub shots: Grid,
    pub hits: Grid,
}

/// Main board state: ship placements, shots, hits.
///
/// `hits` is always a subset of `shots`, and the number of hit cells always
/// equals the summed hit count of the ships.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    no_touching: bool,
    ships: Vec<Ship>,
    occupancy: Grid,
    shots: Grid,
    hits: Grid,
}

impl Board {
    /// Empty board; `no_touching` enables the adjacency rule for placement.
    pub fn new(no_touching: bool) -> Self {
        Board {
            no_touching,
            ships: Vec::new(),
            occupancy: Grid::new(),
            shots: Grid::new(),
            hits: Grid::new(),
        }
    }

    pub fn no_touching(&self) -> bool {
        self.no_touching
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn occupancy(&self) -> Grid {
        self.occupancy
    }

    pub fn shots(&self) -> Grid {
        self.shots
    }

    pub fn hits(&self) -> Grid {
        self.hits
    }

    pub fn is_shot(&self, row: usize, col: usize) -> Result<bool, BoardError> {
        Ok(self.shots.get(row, col)?)
    }

    /// Ship covering (`row`, `col`), if any.
    pub fn ship_at(&self, row: usize, col: usize) -> Option<&Ship> {
        self.ships.iter().find(|s| s.contains(row, col))
    }

    /// Validate a placement without touching the board.
    pub fn check_placement(
        &self,
        row: usize,
        col: usize,
        length: usize,
        orientation: Orientation,
    ) -> Result<Ship, BoardError> {
        let ship = Ship::new(row, col, length, orientation)?;
        let mask = ship.mask();
        if !(self.occupancy & mask).is_empty() {
            return Err(BoardError::ShipOverlaps);
        }
        if self.no_touching && !(self.occupancy & mask.dilate()).is_empty() {
            return Err(BoardError::ShipTouches);
        }
        Ok(ship)
    }

    pub fn can_place(&self, row: usize, col: usize, length: usize, orientation: Orientation) -> bool {
        self.check_placement(row, col, length, orientation).is_ok()
    }

    /// Place a ship; re-validates and leaves the board untouched on error.
    pub fn place(
        &mut self,
        row: usize,
        col: usize,
        length: usize,
        orientation: Orientation,
    ) -> Result<Ship, BoardError> {
        let ship = self.check_placement(row, col, length, orientation)?;
        self.occupancy |= ship.mask();
        self.ships.push(ship);
        Ok(ship)
    }

    /// Reverse the most recent `place`.
    pub fn undo_last_placement(&mut self) -> Option<Ship> {
        let ship = self.ships.pop()?;
        for (r, c) in ship.cells() {
            let _ = self.occupancy.clear(r, c);
        }
        Some(ship)
    }

    /// Resolve a shot at (`row`, `col`).
    ///
    /// A cell already shot yields `Repeat` and changes nothing, so replays of
    /// the same shot are harmless.
    pub fn receive_shot(&mut self, row: usize, col: usize) -> Result<ShotOutcome, BoardError> {
        if self.shots.get(row, col)? {
            return Ok(ShotOutcome::Repeat);
        }
        if !self.occupancy.get(row, col)? {
            self.shots.set(row, col)?;
            return Ok(ShotOutcome::Miss);
        }
        let ship = self
            .ships
            .iter_mut()
            .find(|s| s.contains(row, col))
            .ok_or(BoardError::UnknownShipHit)?;
        ship.register_hit();
        let outcome = if ship.is_sunk() {
            ShotOutcome::Sunk(*ship)
        } else {
            ShotOutcome::Hit
        };
        self.shots.set(row, col)?;
        self.hits.set(row, col)?;
        Ok(outcome)
    }

    /// `true` once at least one ship exists and every ship is sunk.
    pub fn all_sunk(&self) -> bool {
        !self.ships.is_empty() && self.ships.iter().all(Ship::is_sunk)
    }

    /// Mark every unshot cell around a sunk ship as shot (never as hit).
    /// Returns the newly marked cells. Only sound under the no-touching rule.
    pub fn mark_surrounding(&mut self, ship: &Ship) -> Vec<(usize, usize)> {
        let mask = ship.mask();
        let ring = mask.dilate() & !mask & !self.shots;
        let marked: Vec<_> = ring.iter_set_bits().collect();
        self.shots |= ring;
        marked
    }

    /// Remove all ships and shots.
    pub fn clear(&mut self) {
        self.ships.clear();
        self.occupancy.clear_all();
        self.shots.clear_all();
        self.hits.clear_all();
    }

    /// Place every length in `fleet` at random legal positions on a cleared
    /// board. On failure the board is left empty.
    pub fn place_fleet_randomly<R: Rng>(
        &mut self,
        rng: &mut R,
        fleet: &[usize],
    ) -> Result<(), BoardError> {
        self.clear();
        self.extend_fleet_randomly(rng, fleet)
    }

    /// Add ships of `lengths` at random legal positions, keeping the ships
    /// already on the board. On failure only the pre-existing ships remain.
    pub fn extend_fleet_randomly<R: Rng>(
        &mut self,
        rng: &mut R,
        lengths: &[usize],
    ) -> Result<(), BoardError> {
        let keep = self.ships.len();
        'attempt: for attempt in 0..FLEET_TRIES {
            for &len in lengths {
                if self.place_one_randomly(&mut *rng, len).is_err() {
                    log::debug!("random fleet attempt {} failed, retrying", attempt + 1);
                    while self.ships.len() > keep {
                        self.undo_last_placement();
                    }
                    continue 'attempt;
                }
            }
            return Ok(());
        }
        Err(BoardError::UnableToPlaceShip)
    }

    fn place_one_randomly<R: Rng>(
        &mut self,
        rng: &mut R,
        length: usize,
    ) -> Result<Ship, BoardError> {
        for _ in 0..RANDOM_TRIES {
            let orientation = if rng.random_bool(0.5) {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let row = rng.random_range(0..GRID_SIZE);
            let col = rng.random_range(0..GRID_SIZE);
            if let Ok(ship) = self.place(row, col, length, orientation) {
                return Ok(ship);
            }
        }
        for row in 0..GRID_SIZE {
            for col in 0..GRID_SIZE {
                for orientation in [Orientation::Horizontal, Orientation::Vertical] {
                    if let Ok(ship) = self.place(row, col, length, orientation) {
                        return Ok(ship);
                    }
                }
            }
        }
        Err(BoardError::UnableToPlaceShip)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Board {{\n  occupancy: {:?},\n  shots: {:?},\n  hits: {:?},\n  ships: {:?}\n}}",
            self.occupancy, self.shots, self.hits, self.ships
        )
    }
}

impl From<&Board> for BoardState {
    fn from(b: &Board) -> Self {
        BoardState {
            no_touching: b.no_touching,
            ships: b.ships.clone(),
            occupancy: b.occupancy,
            shots: b.shots,
            hits: b.hits,
        }
    }
}

impl TryFrom<BoardState> for Board {
    type Error = BoardError;

    /// Rebuild a board from saved state, replaying ship placement so the
    /// placement rules and every board invariant are re-checked.
    fn try_from(state: BoardState) -> Result<Self, Self::Error> {
        if !state.occupancy.is_canonical() || !state.shots.is_canonical() || !state.hits.is_canonical()
        {
            return Err(BoardError::Inconsistent("grid has bits outside the board"));
        }
        let mut board = Board::new(state.no_touching);
        for ship in &state.ships {
            let (row, col) = ship.origin();
            if ship.hit_count() > ship.length() {
                return Err(BoardError::Inconsistent("ship has more hits than segments"));
            }
            let placed = board.place(row, col, ship.length(), ship.orientation())?;
            if let Some(last) = board.ships.last_mut() {
                *last = placed.with_hits(ship.hit_count());
            }
        }
        if board.occupancy != state.occupancy {
            return Err(BoardError::Inconsistent("occupancy does not match ships"));
        }
        if !state.shots.contains_all(&state.hits) {
            return Err(BoardError::Inconsistent("hit recorded without a shot"));
        }
        if !state.occupancy.contains_all(&state.hits) {
            return Err(BoardError::Inconsistent("hit recorded on open water"));
        }
        for ship in &board.ships {
            if (ship.mask() & state.hits).count_ones() != ship.hit_count() {
                return Err(BoardError::Inconsistent("ship hit count disagrees with hits"));
            }
        }
        board.shots = state.shots;
        board.hits = state.hits;
        Ok(board)
    }
}
