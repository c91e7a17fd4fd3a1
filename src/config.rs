//! Board dimensions, fleet composition and rule switches.

use alloc::vec::Vec;

pub const BOARD_SIZE: u8 = 10;

/// Board side length as an index bound.
pub const GRID_SIZE: usize = BOARD_SIZE as usize;

/// Standard fleet, in placement order.
pub const DEFAULT_FLEET: [usize; 5] = [5, 4, 3, 3, 2];

/// Version carried by the `Hello` frame exchanged before a networked match.
pub const PROTOCOL_VERSION: u32 = 1;

/// Version written into every persistence snapshot.
pub const SNAPSHOT_VERSION: u32 = 2;

/// Display name for a ship of the given length.
pub fn ship_name(length: usize) -> &'static str {
    match length {
        5 => "Carrier",
        4 => "Battleship",
        3 => "Cruiser",
        2 => "Destroyer",
        _ => "Ship",
    }
}

/// Rule set shared by both sides of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Rules {
    /// Ship lengths in the order they are placed.
    pub fleet: Vec<usize>,
    /// Forbid ships from touching, diagonals included.
    pub no_touching: bool,
}

impl Rules {
    /// Total number of cells covered by the fleet.
    pub fn fleet_cells(&self) -> usize {
        self.fleet.iter().sum()
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            fleet: DEFAULT_FLEET.to_vec(),
            no_touching: true,
        }
    }
}
