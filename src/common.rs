//! Shot outcomes and the error types shared by the rules core.

use core::fmt;

use crate::bitboard::BitBoardError;
use crate::ship::Ship;
use crate::turn::{Phase, Side};

/// Result of resolving a shot against a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum ShotOutcome {
    /// Open water.
    Miss,
    /// Struck a ship that is still afloat.
    Hit,
    /// Struck the last intact segment of the carried ship.
    Sunk(Ship),
    /// The cell had already been shot; nothing changed.
    Repeat,
}

impl ShotOutcome {
    /// `true` for `Hit` and `Sunk`.
    pub fn is_hit(&self) -> bool {
        matches!(self, ShotOutcome::Hit | ShotOutcome::Sunk(_))
    }

    /// What the shooter is told over the wire; `None` for `Repeat`.
    pub fn report(&self) -> Option<ShotReport> {
        match self {
            ShotOutcome::Miss => Some(ShotReport::Miss),
            ShotOutcome::Hit => Some(ShotReport::Hit),
            ShotOutcome::Sunk(_) => Some(ShotReport::Sunk),
            ShotOutcome::Repeat => None,
        }
    }
}

/// Shot result as carried in a `result` message: the shooter learns
/// miss/hit/sunk without the layout of the ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
pub enum ShotReport {
    Miss,
    Hit,
    Sunk,
}

/// Errors returned by board and ship operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Underlying bitboard error.
    Grid(BitBoardError),
    /// Shot or lookup at a cell that is not on the board.
    OutOfBounds { row: usize, col: usize },
    /// Some segment of the ship would lie off the board.
    ShipOutOfBounds,
    /// Ship placement overlaps another ship.
    ShipOverlaps,
    /// Ship placement touches another ship while the no-touching rule is on.
    ShipTouches,
    /// Ship length outside the configured fleet or zero.
    InvalidLength(usize),
    /// Random placement gave up.
    UnableToPlaceShip,
    /// Occupied cell with no ship record behind it.
    UnknownShipHit,
    /// Saved board failed validation.
    Inconsistent(&'static str),
}

impl From<BitBoardError> for BoardError {
    fn from(err: BitBoardError) -> Self {
        match err {
            BitBoardError::IndexOutOfBounds { row, col } => BoardError::OutOfBounds { row, col },
            other => BoardError::Grid(other),
        }
    }
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::Grid(e) => write!(f, "grid error: {}", e),
            BoardError::OutOfBounds { row, col } => {
                write!(f, "cell ({}, {}) is outside the board", row, col)
            }
            BoardError::ShipOutOfBounds => write!(f, "ship placement is out of bounds"),
            BoardError::ShipOverlaps => write!(f, "ship placement overlaps with another ship"),
            BoardError::ShipTouches => write!(f, "ship placement touches another ship"),
            BoardError::InvalidLength(len) => write!(f, "invalid ship length {}", len),
            BoardError::UnableToPlaceShip => write!(f, "unable to place ship"),
            BoardError::UnknownShipHit => write!(f, "occupied cell has no ship record"),
            BoardError::Inconsistent(what) => write!(f, "inconsistent board: {}", what),
        }
    }
}

/// Errors returned by the fleet ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetError {
    /// Every ship has already been placed.
    Complete,
    /// No ship of this length is waiting to be placed.
    LengthNotRemaining(usize),
}

impl fmt::Display for FleetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FleetError::Complete => write!(f, "fleet is already complete"),
            FleetError::LengthNotRemaining(len) => {
                write!(f, "no ship of length {} left to place", len)
            }
        }
    }
}

/// Errors returned by the turn coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnError {
    /// Operation not allowed in the current phase.
    WrongPhase { expected: Phase, actual: Phase },
    /// Play cannot start before the fleet is complete.
    FleetIncomplete,
    /// A shot by the side not holding the turn.
    OutOfTurn { shooter: Side },
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::WrongPhase { expected, actual } => {
                write!(f, "expected phase {:?}, currently {:?}", expected, actual)
            }
            TurnError::FleetIncomplete => write!(f, "fleet placement is not complete"),
            TurnError::OutOfTurn { shooter } => write!(f, "{:?} fired out of turn", shooter),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BitBoardError {}
#[cfg(feature = "std")]
impl std::error::Error for BoardError {}
#[cfg(feature = "std")]
impl std::error::Error for FleetError {}
#[cfg(feature = "std")]
impl std::error::Error for TurnError {}
