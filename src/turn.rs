//! Phase state machine and the authoritative "whose turn" flag.

use crate::common::{ShotOutcome, TurnError};

/// Game phase. Progresses linearly; `GameOver -> Setup` is the only way back
/// short of a full reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// Boards not yet anchored.
    Placement,
    /// Local fleet being placed.
    Setup,
    Play,
    GameOver,
}

/// One side of the match, from the local participant's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Local,
    Opponent,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Local => Side::Opponent,
            Side::Opponent => Side::Local,
        }
    }
}

/// What a resolved shot did to the turn state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnUpdate {
    /// Shot was a repeat; nothing moved.
    Unchanged,
    /// The turn passed to this side.
    Passed(Side),
    /// The shooter sank the last ship.
    Won(Side),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnCoordinator {
    phase: Phase,
    active: Side,
    winner: Option<Side>,
    /// Turn saved when the peer was declared stalled.
    saved_turn: Option<Side>,
}

impl Default for TurnCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnCoordinator {
    pub fn new() -> Self {
        Self {
            phase: Phase::Placement,
            active: Side::Local,
            winner: None,
            saved_turn: None,
        }
    }

    /// Restore a coordinator from saved fields.
    pub fn from_parts(phase: Phase, active: Side, winner: Option<Side>) -> Self {
        Self {
            phase,
            active,
            winner,
            saved_turn: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Side allowed to shoot. Only meaningful during `Play`.
    pub fn active(&self) -> Side {
        self.active
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    /// `true` while the local turn is forced because the peer looks stalled.
    pub fn stall_override(&self) -> bool {
        self.saved_turn.is_some()
    }

    /// Shots are accepted from `side` only during its turn in `Play`.
    pub fn can_fire(&self, side: Side) -> bool {
        self.phase == Phase::Play && self.active == side
    }

    fn expect(&self, expected: Phase) -> Result<(), TurnError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(TurnError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Both boards exist: `Placement -> Setup`.
    pub fn start_setup(&mut self) -> Result<(), TurnError> {
        self.expect(Phase::Placement)?;
        self.phase = Phase::Setup;
        Ok(())
    }

    /// `Setup -> Play` with `first` to move.
    pub fn start_play(&mut self, fleet_complete: bool, first: Side) -> Result<(), TurnError> {
        self.expect(Phase::Setup)?;
        if !fleet_complete {
            return Err(TurnError::FleetIncomplete);
        }
        self.phase = Phase::Play;
        self.active = first;
        self.winner = None;
        self.saved_turn = None;
        Ok(())
    }

    /// Advance after `shooter`'s shot resolved to `outcome`. One shot per
    /// turn: any non-repeat passes the turn unless the target fleet is gone.
    /// The shooter must hold the turn, or be the side whose turn a stall
    /// override took away.
    pub fn apply_shot_outcome(
        &mut self,
        outcome: &ShotOutcome,
        shooter: Side,
        target_defeated: bool,
    ) -> Result<TurnUpdate, TurnError> {
        self.expect(Phase::Play)?;
        if shooter != self.active && self.saved_turn != Some(shooter) {
            return Err(TurnError::OutOfTurn { shooter });
        }
        if matches!(outcome, ShotOutcome::Repeat) {
            return Ok(TurnUpdate::Unchanged);
        }
        self.saved_turn = None;
        if target_defeated {
            self.phase = Phase::GameOver;
            self.winner = Some(shooter);
            return Ok(TurnUpdate::Won(shooter));
        }
        self.active = shooter.other();
        Ok(TurnUpdate::Passed(self.active))
    }

    /// Round finished: `GameOver -> Setup`, keeping the board anchor.
    pub fn rematch(&mut self) -> Result<(), TurnError> {
        self.expect(Phase::GameOver)?;
        self.phase = Phase::Setup;
        self.active = Side::Local;
        self.winner = None;
        self.saved_turn = None;
        Ok(())
    }

    /// Back to `Placement` from anywhere.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Peer round-trip exceeded the stall threshold: hand control to the
    /// local side, remembering whose turn it was. Returns `false` if there
    /// was nothing to override.
    pub fn peer_stalled(&mut self) -> bool {
        if self.phase != Phase::Play || self.saved_turn.is_some() || self.active == Side::Local {
            return false;
        }
        self.saved_turn = Some(self.active);
        self.active = Side::Local;
        true
    }

    /// Peer responsive again: put back the turn saved by `peer_stalled`.
    pub fn peer_recovered(&mut self) -> bool {
        match self.saved_turn.take() {
            Some(turn) if self.phase == Phase::Play => {
                self.active = turn;
                true
            }
            _ => false,
        }
    }
}
