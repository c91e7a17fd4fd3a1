//! `GameSession`: one participant's complete match state.
//!
//! All operations are validate-then-mutate. Caller mistakes that a UI can
//! produce in normal use (wrong phase, not your turn, bad placement) come
//! back as [`Action::Invalid`]; contract violations such as off-board
//! coordinates are returned as `Err(GameError)`.

use alloc::vec::Vec;
use core::fmt;
use rand::Rng;

use crate::ai::HuntTargetAi;
use crate::bitboard::Grid;
use crate::board::Board;
use crate::common::{BoardError, FleetError, ShotOutcome, ShotReport, TurnError};
use crate::config::{Rules, GRID_SIZE};
use crate::fleet::{FleetLedger, Placement};
use crate::mirror::MirrorBoard;
use crate::ship::{Orientation, Ship};
use crate::turn::{Phase, Side, TurnCoordinator, TurnUpdate};

/// Who sits across the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opponent {
    /// Local computer: its real board plus the AI hunting ours.
    Computer { board: Board, ai: HuntTargetAi },
    /// Networked peer: only our view of its board.
    Remote(MirrorBoard),
}

/// Which kind of opponent a new session is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentKind {
    Computer,
    Remote,
}

/// Why an input was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    WrongPhase(Phase),
    NotYourTurn,
    Placement(BoardError),
    Fleet(FleetError),
    FleetIncomplete,
    NothingToUndo,
    /// A shot to the remote peer is still waiting for its result.
    ShotPending,
    /// A result arrived for a cell we are not waiting on.
    UnexpectedReport { row: usize, col: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::WrongPhase(p) => write!(f, "not allowed during {:?}", p),
            Rejection::NotYourTurn => write!(f, "not your turn"),
            Rejection::Placement(e) => write!(f, "invalid placement: {}", e),
            Rejection::Fleet(e) => write!(f, "{}", e),
            Rejection::FleetIncomplete => write!(f, "place all ships first"),
            Rejection::NothingToUndo => write!(f, "nothing to undo"),
            Rejection::ShotPending => write!(f, "waiting for the previous shot's result"),
            Rejection::UnexpectedReport { row, col } => {
                write!(f, "unexpected result for ({}, {})", row, col)
            }
        }
    }
}

/// A resolved shot, with everything a presentation layer needs to show it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotRecord {
    pub shooter: Side,
    pub row: usize,
    pub col: usize,
    pub outcome: ShotOutcome,
    /// Cells auto-marked around a sunk ship.
    pub marked: Vec<(usize, usize)>,
    pub update: TurnUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    BoardsAnchored,
    Placed(Ship),
    Undone(Placement),
    Rotated(Orientation),
    PlayStarted { first: Side },
    /// Shot resolved on a board we hold.
    Shot(ShotRecord),
    /// Shot handed to the remote peer; its result arrives later.
    ShotSent { row: usize, col: usize },
    NewRound,
}

/// Outcome of a render/input call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Ok(Effect),
    Invalid(Rejection),
    /// Cell already shot; nothing changed.
    Repeat,
}

/// Contract violations and impossible states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    Board(BoardError),
    Turn(TurnError),
    /// Operation needs the other kind of opponent.
    WrongOpponent(OpponentKind),
    /// AI found no unshot cell before the game ended.
    NoLegalMove,
}

impl From<BoardError> for GameError {
    fn from(e: BoardError) -> Self {
        GameError::Board(e)
    }
}

impl From<TurnError> for GameError {
    fn from(e: TurnError) -> Self {
        GameError::Turn(e)
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::Board(e) => write!(f, "{}", e),
            GameError::Turn(e) => write!(f, "{}", e),
            GameError::WrongOpponent(kind) => {
                write!(f, "operation requires a {:?} opponent", kind)
            }
            GameError::NoLegalMove => write!(f, "no unshot cell left"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GameError {}

fn check_cell(row: usize, col: usize) -> Result<(), GameError> {
    if row < GRID_SIZE && col < GRID_SIZE {
        Ok(())
    } else {
        Err(GameError::Board(BoardError::OutOfBounds { row, col }))
    }
}

#[derive(Debug, Clone)]
pub struct GameSession {
    pub(crate) rules: Rules,
    pub(crate) turn: TurnCoordinator,
    pub(crate) fleet: FleetLedger,
    pub(crate) player: Board,
    pub(crate) opponent: Opponent,
    pub(crate) orientation: Orientation,
    pub(crate) pending_shot: Option<(usize, usize)>,
    /// Shots whose delivery failed. The peer may still have resolved them.
    pub(crate) abandoned: Vec<(usize, usize)>,
}

impl GameSession {
    pub fn new(rules: Rules, kind: OpponentKind) -> Self {
        let opponent = Self::fresh_opponent(&rules, kind);
        Self {
            fleet: FleetLedger::new(&rules.fleet),
            player: Board::new(rules.no_touching),
            turn: TurnCoordinator::new(),
            orientation: Orientation::Horizontal,
            pending_shot: None,
            abandoned: Vec::new(),
            opponent,
            rules,
        }
    }

    fn fresh_opponent(rules: &Rules, kind: OpponentKind) -> Opponent {
        match kind {
            OpponentKind::Computer => Opponent::Computer {
                board: Board::new(rules.no_touching),
                ai: HuntTargetAi::new(),
            },
            OpponentKind::Remote => Opponent::Remote(MirrorBoard::new(rules.fleet.len(), rules.no_touching)),
        }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn phase(&self) -> Phase {
        self.turn.phase()
    }

    pub fn turn(&self) -> &TurnCoordinator {
        &self.turn
    }

    pub fn fleet(&self) -> &FleetLedger {
        &self.fleet
    }

    pub fn player_board(&self) -> &Board {
        &self.player
    }

    pub fn opponent(&self) -> &Opponent {
        &self.opponent
    }

    pub fn opponent_kind(&self) -> OpponentKind {
        match self.opponent {
            Opponent::Computer { .. } => OpponentKind::Computer,
            Opponent::Remote(_) => OpponentKind::Remote,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn pending_shot(&self) -> Option<(usize, usize)> {
        self.pending_shot
    }

    /// Shots given up after a delivery failure whose result may still arrive.
    pub fn abandoned_shots(&self) -> &[(usize, usize)] {
        &self.abandoned
    }

    pub fn winner(&self) -> Option<Side> {
        self.turn.winner()
    }

    /// `true` when the local side may fire now.
    pub fn can_fire(&self) -> bool {
        self.turn.can_fire(Side::Local) && self.pending_shot.is_none()
    }

    /// Cells already shot on the opponent's board, as far as we know.
    pub fn opponent_shots(&self) -> Grid {
        self.opponent_view().0
    }

    /// Shots and hits on the opponent's board, as far as we know.
    pub fn opponent_view(&self) -> (Grid, Grid) {
        match &self.opponent {
            Opponent::Computer { board, .. } => (board.shots(), board.hits()),
            Opponent::Remote(mirror) => (mirror.shots(), mirror.hits()),
        }
    }

    pub fn mirror_mut(&mut self) -> Result<&mut MirrorBoard, GameError> {
        match &mut self.opponent {
            Opponent::Remote(mirror) => Ok(mirror),
            Opponent::Computer { .. } => Err(GameError::WrongOpponent(OpponentKind::Remote)),
        }
    }

    fn clear_round(&mut self) {
        self.player.clear();
        self.fleet.reset();
        self.pending_shot = None;
        self.abandoned.clear();
        self.opponent = Self::fresh_opponent(&self.rules, self.opponent_kind());
    }

    /// Both boards are in place: start fleet setup with an empty ledger.
    pub fn anchor_boards(&mut self) -> Action {
        if let Err(TurnError::WrongPhase { actual, .. }) = self.turn.start_setup() {
            return Action::Invalid(Rejection::WrongPhase(actual));
        }
        self.clear_round();
        Action::Ok(Effect::BoardsAnchored)
    }

    /// Place a ship of `length` on the local board.
    pub fn place_ship(
        &mut self,
        row: usize,
        col: usize,
        length: usize,
        orientation: Orientation,
    ) -> Action {
        if self.phase() != Phase::Setup {
            return Action::Invalid(Rejection::WrongPhase(self.phase()));
        }
        if self.fleet.complete() {
            return Action::Invalid(Rejection::Fleet(FleetError::Complete));
        }
        if !self.fleet.remaining().any(|l| l == length) {
            return Action::Invalid(Rejection::Fleet(FleetError::LengthNotRemaining(length)));
        }
        let ship = match self.player.place(row, col, length, orientation) {
            Ok(ship) => ship,
            Err(e) => return Action::Invalid(Rejection::Placement(e)),
        };
        if let Err(e) = self.fleet.advance(row, col, length, orientation) {
            // checked above; keep board and ledger in step regardless
            self.player.undo_last_placement();
            return Action::Invalid(Rejection::Fleet(e));
        }
        Action::Ok(Effect::Placed(ship))
    }

    /// Place the ledger's next ship at (`row`, `col`) in the current
    /// orientation.
    pub fn place_next(&mut self, row: usize, col: usize) -> Action {
        match self.fleet.current_length() {
            Some(length) => self.place_ship(row, col, length, self.orientation),
            None => Action::Invalid(Rejection::Fleet(FleetError::Complete)),
        }
    }

    pub fn rotate_orientation(&mut self) -> Action {
        if self.phase() != Phase::Setup {
            return Action::Invalid(Rejection::WrongPhase(self.phase()));
        }
        self.orientation = self.orientation.rotate();
        Action::Ok(Effect::Rotated(self.orientation))
    }

    pub fn undo_last_placement(&mut self) -> Action {
        if self.phase() != Phase::Setup {
            return Action::Invalid(Rejection::WrongPhase(self.phase()));
        }
        match (self.player.undo_last_placement(), self.fleet.undo()) {
            (Some(_), Some(placement)) => Action::Ok(Effect::Undone(placement)),
            (None, None) => Action::Invalid(Rejection::NothingToUndo),
            _ => {
                log::error!("board and fleet ledger disagreed on undo");
                Action::Invalid(Rejection::NothingToUndo)
            }
        }
    }

    /// Start play against the computer: its fleet is laid out at random and
    /// the local side moves first.
    pub fn start_play<R: Rng>(&mut self, rng: &mut R) -> Result<Action, GameError> {
        if self.phase() != Phase::Setup {
            return Ok(Action::Invalid(Rejection::WrongPhase(self.phase())));
        }
        if !self.fleet.complete() {
            return Ok(Action::Invalid(Rejection::FleetIncomplete));
        }
        let fleet = self.rules.fleet.clone();
        match &mut self.opponent {
            Opponent::Computer { board, ai } => {
                board.place_fleet_randomly(rng, &fleet)?;
                ai.reset_to_hunt();
            }
            Opponent::Remote(_) => return Err(GameError::WrongOpponent(OpponentKind::Computer)),
        }
        self.turn.start_play(true, Side::Local)?;
        log::info!("play started against the computer");
        Ok(Action::Ok(Effect::PlayStarted { first: Side::Local }))
    }

    /// Start play against a remote peer with `first` to move.
    pub fn start_remote_play(&mut self, first: Side) -> Result<Action, GameError> {
        if self.opponent_kind() != OpponentKind::Remote {
            return Err(GameError::WrongOpponent(OpponentKind::Remote));
        }
        if self.phase() != Phase::Setup {
            return Ok(Action::Invalid(Rejection::WrongPhase(self.phase())));
        }
        if !self.fleet.complete() {
            return Ok(Action::Invalid(Rejection::FleetIncomplete));
        }
        self.turn.start_play(true, first)?;
        log::info!("play started against remote peer, {:?} moves first", first);
        Ok(Action::Ok(Effect::PlayStarted { first }))
    }

    /// Local shot at the opponent's (`row`, `col`).
    ///
    /// Against the computer the shot is resolved immediately. Against a
    /// remote peer it is recorded as pending and `Effect::ShotSent` tells the
    /// caller to transmit it.
    pub fn fire_shot(&mut self, row: usize, col: usize) -> Result<Action, GameError> {
        check_cell(row, col)?;
        if self.phase() != Phase::Play {
            return Ok(Action::Invalid(Rejection::WrongPhase(self.phase())));
        }
        if !self.turn.can_fire(Side::Local) {
            return Ok(Action::Invalid(Rejection::NotYourTurn));
        }
        match &mut self.opponent {
            Opponent::Computer { board, .. } => {
                let outcome = board.receive_shot(row, col)?;
                if outcome == ShotOutcome::Repeat {
                    return Ok(Action::Repeat);
                }
                let marked = match (&outcome, board.no_touching()) {
                    (ShotOutcome::Sunk(ship), true) => board.mark_surrounding(ship),
                    _ => Vec::new(),
                };
                let defeated = board.all_sunk();
                let update = self.turn.apply_shot_outcome(&outcome, Side::Local, defeated)?;
                Ok(Action::Ok(Effect::Shot(ShotRecord {
                    shooter: Side::Local,
                    row,
                    col,
                    outcome,
                    marked,
                    update,
                })))
            }
            Opponent::Remote(mirror) => {
                if mirror.is_shot(row, col)? {
                    return Ok(Action::Repeat);
                }
                if self.pending_shot.is_some() {
                    return Ok(Action::Invalid(Rejection::ShotPending));
                }
                self.pending_shot = Some((row, col));
                Ok(Action::Ok(Effect::ShotSent { row, col }))
            }
        }
    }

    /// The remote peer's verdict on our pending shot, or on a shot we gave
    /// up on whose result arrived late.
    pub fn apply_remote_report(
        &mut self,
        row: usize,
        col: usize,
        report: ShotReport,
    ) -> Result<Action, GameError> {
        check_cell(row, col)?;
        if self.phase() != Phase::Play {
            return Ok(Action::Invalid(Rejection::WrongPhase(self.phase())));
        }
        if self.pending_shot != Some((row, col)) {
            return self.apply_late_report(row, col, report);
        }
        let mirror = self.mirror_mut()?;
        let outcome = mirror.apply_report(row, col, report)?;
        let defeated = mirror.all_sunk();
        self.pending_shot = None;
        self.abandoned.retain(|&cell| cell != (row, col));
        if outcome == ShotOutcome::Repeat {
            return Ok(Action::Repeat);
        }
        let update = self.turn.apply_shot_outcome(&outcome, Side::Local, defeated)?;
        Ok(Action::Ok(Effect::Shot(ShotRecord {
            shooter: Side::Local,
            row,
            col,
            outcome,
            marked: Vec::new(),
            update,
        })))
    }

    /// A report for an abandoned shot. The peer resolved the shot even
    /// though we never saw the ack, so the mirror and the turn catch up.
    fn apply_late_report(
        &mut self,
        row: usize,
        col: usize,
        report: ShotReport,
    ) -> Result<Action, GameError> {
        let Some(index) = self.abandoned.iter().position(|&cell| cell == (row, col)) else {
            return Ok(Action::Invalid(Rejection::UnexpectedReport { row, col }));
        };
        self.abandoned.swap_remove(index);
        let mirror = self.mirror_mut()?;
        let outcome = mirror.apply_report(row, col, report)?;
        let defeated = mirror.all_sunk();
        if outcome == ShotOutcome::Repeat {
            return Ok(Action::Repeat);
        }
        log::info!("late result for abandoned shot at ({}, {})", row, col);
        let update = if self.turn.active() == Side::Local {
            self.turn.apply_shot_outcome(&outcome, Side::Local, defeated)?
        } else {
            TurnUpdate::Unchanged
        };
        Ok(Action::Ok(Effect::Shot(ShotRecord {
            shooter: Side::Local,
            row,
            col,
            outcome,
            marked: Vec::new(),
            update,
        })))
    }

    /// Forget the pending remote shot after its delivery failed, so the
    /// player can fire again. A result that still turns up for it is
    /// applied by [`GameSession::apply_remote_report`].
    pub fn abandon_pending_shot(&mut self) -> Option<(usize, usize)> {
        let cell = self.pending_shot.take()?;
        if !self.abandoned.contains(&cell) {
            self.abandoned.push(cell);
        }
        Some(cell)
    }

    /// Resolve the remote peer's shot against our board.
    pub fn resolve_incoming_shot(&mut self, row: usize, col: usize) -> Result<Action, GameError> {
        check_cell(row, col)?;
        if self.opponent_kind() != OpponentKind::Remote {
            return Err(GameError::WrongOpponent(OpponentKind::Remote));
        }
        if self.phase() != Phase::Play {
            return Ok(Action::Invalid(Rejection::WrongPhase(self.phase())));
        }
        if self.player.is_shot(row, col)? {
            return Ok(Action::Repeat);
        }
        if self.turn.active() != Side::Opponent && !self.turn.stall_override() {
            log::warn!("peer fired at ({}, {}) out of turn", row, col);
            return Ok(Action::Invalid(Rejection::NotYourTurn));
        }
        let outcome = self.player.receive_shot(row, col)?;
        let record = self.settle_shot_on_player(row, col, outcome)?;
        Ok(Action::Ok(Effect::Shot(record)))
    }

    /// What a shot at our (`row`, `col`) revealed, for re-answering a
    /// repeated shot.
    pub fn recorded_report(&self, row: usize, col: usize) -> Result<ShotReport, GameError> {
        check_cell(row, col)?;
        let hit = self.player.hits().get(row, col).map_err(BoardError::from)?;
        Ok(match self.player.ship_at(row, col) {
            Some(ship) if hit && ship.is_sunk() => ShotReport::Sunk,
            _ if hit => ShotReport::Hit,
            _ => ShotReport::Miss,
        })
    }

    /// The computer takes its turn against our board.
    ///
    /// Stale target-queue cells never cost the computer its turn: selection
    /// repeats until an unshot cell is found.
    pub fn computer_turn<R: Rng>(&mut self, rng: &mut R) -> Result<Action, GameError> {
        if self.phase() != Phase::Play {
            return Ok(Action::Invalid(Rejection::WrongPhase(self.phase())));
        }
        if !self.turn.can_fire(Side::Opponent) {
            return Ok(Action::Invalid(Rejection::NotYourTurn));
        }
        let shots = self.player.shots();
        let (row, col, outcome) = match &mut self.opponent {
            Opponent::Computer { ai, .. } => {
                let mut shots = shots;
                loop {
                    let (row, col) = ai.choose_cell(&shots, rng).ok_or(GameError::NoLegalMove)?;
                    match self.player.receive_shot(row, col)? {
                        ShotOutcome::Repeat => {
                            shots.set(row, col).map_err(BoardError::from)?;
                            continue;
                        }
                        outcome => break (row, col, outcome),
                    }
                }
            }
            Opponent::Remote(_) => return Err(GameError::WrongOpponent(OpponentKind::Computer)),
        };
        let record = self.settle_shot_on_player(row, col, outcome)?;
        if let Opponent::Computer { ai, .. } = &mut self.opponent {
            match record.outcome {
                ShotOutcome::Hit => ai.record_hit(row, col),
                ShotOutcome::Sunk(_) => ai.reset_to_hunt(),
                _ => {}
            }
        }
        log::debug!("computer fired at ({}, {}): {:?}", row, col, record.outcome);
        Ok(Action::Ok(Effect::Shot(record)))
    }

    fn settle_shot_on_player(
        &mut self,
        row: usize,
        col: usize,
        outcome: ShotOutcome,
    ) -> Result<ShotRecord, GameError> {
        let marked = match (&outcome, self.player.no_touching()) {
            (ShotOutcome::Sunk(ship), true) => self.player.mark_surrounding(ship),
            _ => Vec::new(),
        };
        let defeated = self.player.all_sunk();
        let update = self.turn.apply_shot_outcome(&outcome, Side::Opponent, defeated)?;
        Ok(ShotRecord {
            shooter: Side::Opponent,
            row,
            col,
            outcome,
            marked,
            update,
        })
    }

    /// Liveness heuristic hook: the peer looks stalled.
    pub fn peer_stalled(&mut self) -> bool {
        self.turn.peer_stalled()
    }

    /// Liveness heuristic hook: the peer answers in time again.
    pub fn peer_recovered(&mut self) -> bool {
        self.turn.peer_recovered()
    }

    /// After game over, go straight back to setup on the same anchored
    /// boards.
    pub fn rematch(&mut self) -> Action {
        if let Err(TurnError::WrongPhase { actual, .. }) = self.turn.rematch() {
            return Action::Invalid(Rejection::WrongPhase(actual));
        }
        self.clear_round();
        Action::Ok(Effect::NewRound)
    }

    /// Abandon everything and return to board placement.
    pub fn reset(&mut self) {
        self.turn.reset();
        self.orientation = Orientation::Horizontal;
        self.clear_round();
    }
}
