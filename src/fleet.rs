//! Fleet ledger: which ship lengths still need placing, and the placement
//! history used for undo.

use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec::Vec;

use crate::common::FleetError;
use crate::ship::Orientation;

/// One recorded placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Placement {
    pub row: usize,
    pub col: usize,
    pub length: usize,
    pub orientation: Orientation,
}

/// Remaining lengths (FIFO) plus placed ships in placement order.
///
/// At all times `remaining ++ lengths(placed)` is a permutation of the
/// configured fleet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetLedger {
    fleet: Vec<usize>,
    remaining: VecDeque<usize>,
    placed: Vec<Placement>,
}

impl FleetLedger {
    pub fn new(fleet: &[usize]) -> Self {
        Self {
            fleet: fleet.to_vec(),
            remaining: fleet.iter().copied().collect(),
            placed: Vec::new(),
        }
    }

    /// Length of the next ship to place.
    pub fn current_length(&self) -> Option<usize> {
        self.remaining.front().copied()
    }

    /// Record a successful placement of `length`.
    ///
    /// The front of the queue is consumed when it matches; otherwise the
    /// first remaining entry of that length is removed instead.
    pub fn advance(
        &mut self,
        row: usize,
        col: usize,
        length: usize,
        orientation: Orientation,
    ) -> Result<(), FleetError> {
        let idx = match self.remaining.front() {
            None => return Err(FleetError::Complete),
            Some(&front) if front == length => 0,
            Some(&front) => {
                let idx = self
                    .remaining
                    .iter()
                    .position(|&l| l == length)
                    .ok_or(FleetError::LengthNotRemaining(length))?;
                log::debug!(
                    "placed length {} out of order (expected {}), removing by value",
                    length,
                    front
                );
                idx
            }
        };
        self.remaining.remove(idx);
        self.placed.push(Placement {
            row,
            col,
            length,
            orientation,
        });
        Ok(())
    }

    /// Take back the last placement; its length goes to the front of the
    /// queue so it is asked for next.
    pub fn undo(&mut self) -> Option<Placement> {
        let last = self.placed.pop()?;
        self.remaining.push_front(last.length);
        Some(last)
    }

    pub fn complete(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Remaining ship count per length; every fleet length is listed, even
    /// when none are left.
    pub fn summary(&self) -> BTreeMap<usize, usize> {
        let mut counts: BTreeMap<usize, usize> = self.fleet.iter().map(|&l| (l, 0)).collect();
        for &len in &self.remaining {
            *counts.entry(len).or_insert(0) += 1;
        }
        counts
    }

    pub fn remaining(&self) -> impl Iterator<Item = usize> + '_ {
        self.remaining.iter().copied()
    }

    pub fn placed(&self) -> &[Placement] {
        &self.placed
    }

    pub fn fleet(&self) -> &[usize] {
        &self.fleet
    }

    /// Start over with the full fleet.
    pub fn reset(&mut self) {
        self.remaining = self.fleet.iter().copied().collect();
        self.placed.clear();
    }
}
