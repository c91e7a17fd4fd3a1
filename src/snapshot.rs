//! Versioned save/restore of a [`GameSession`].
//!
//! Loading never touches the live session until the whole snapshot has been
//! decoded and validated.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ai::HuntTargetAi;
use crate::board::{Board, BoardState};
use crate::common::BoardError;
use crate::config::{Rules, GRID_SIZE, SNAPSHOT_VERSION};
use crate::fleet::{FleetLedger, Placement};
use crate::game::{GameSession, Opponent};
use crate::mirror::MirrorBoard;
use crate::ship::Orientation;
use crate::turn::{Phase, Side, TurnCoordinator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OpponentSnapshot {
    Computer { board: BoardState, ai: HuntTargetAi },
    Remote { mirror: MirrorBoard },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub rules: Rules,
    pub phase: Phase,
    pub active: Side,
    pub winner: Option<Side>,
    pub orientation: Orientation,
    pub pending_shot: Option<(usize, usize)>,
    /// Remote shots given up after a delivery failure.
    #[serde(default)]
    pub abandoned_shots: Vec<(usize, usize)>,
    /// Fleet ledger placements, oldest first.
    pub placements: Vec<Placement>,
    pub player: BoardState,
    pub opponent: OpponentSnapshot,
}

#[derive(Debug)]
pub enum SnapshotError {
    /// Not valid JSON, or not shaped like a snapshot.
    Malformed(String),
    UnsupportedVersion { found: u64, expected: u32 },
    /// Decoded fine but the state breaks a game invariant.
    Inconsistent(String),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Malformed(e) => write!(f, "malformed snapshot: {}", e),
            SnapshotError::UnsupportedVersion { found, expected } => write!(
                f,
                "unsupported snapshot version {} (expected {})",
                found, expected
            ),
            SnapshotError::Inconsistent(e) => write!(f, "inconsistent snapshot: {}", e),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<BoardError> for SnapshotError {
    fn from(e: BoardError) -> Self {
        SnapshotError::Inconsistent(e.to_string())
    }
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Malformed(e.to_string()))
    }

    /// Decode a snapshot, checking the version before the body so a newer
    /// layout reports as a version problem rather than a parse error.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        #[derive(Deserialize)]
        struct VersionHeader {
            version: Option<u64>,
        }

        let header: VersionHeader =
            serde_json::from_str(json).map_err(|e| SnapshotError::Malformed(e.to_string()))?;
        let found = header
            .version
            .ok_or_else(|| SnapshotError::Malformed("missing version field".into()))?;
        if found != u64::from(SNAPSHOT_VERSION) {
            return Err(SnapshotError::UnsupportedVersion {
                found,
                expected: SNAPSHOT_VERSION,
            });
        }
        serde_json::from_str(json).map_err(|e| SnapshotError::Malformed(e.to_string()))
    }
}

fn inconsistent(msg: &str) -> SnapshotError {
    SnapshotError::Inconsistent(msg.into())
}

impl GameSession {
    pub fn snapshot(&self) -> Snapshot {
        let opponent = match &self.opponent {
            Opponent::Computer { board, ai } => OpponentSnapshot::Computer {
                board: BoardState::from(board),
                ai: ai.clone(),
            },
            Opponent::Remote(mirror) => OpponentSnapshot::Remote {
                mirror: mirror.clone(),
            },
        };
        Snapshot {
            version: SNAPSHOT_VERSION,
            rules: self.rules.clone(),
            phase: self.turn.phase(),
            active: self.turn.active(),
            winner: self.turn.winner(),
            orientation: self.orientation,
            pending_shot: self.pending_shot,
            abandoned_shots: self.abandoned.clone(),
            placements: self.fleet.placed().to_vec(),
            player: BoardState::from(&self.player),
            opponent,
        }
    }

    /// Build a session from a snapshot, re-validating every invariant.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: u64::from(snapshot.version),
                expected: SNAPSHOT_VERSION,
            });
        }
        let rules = snapshot.rules;
        if snapshot.player.no_touching != rules.no_touching {
            return Err(inconsistent("board rule differs from session rules"));
        }

        // Replay the ledger against an empty board so every placement is
        // checked again under the saved rules.
        let mut fleet = FleetLedger::new(&rules.fleet);
        let mut replay = Board::new(rules.no_touching);
        for p in &snapshot.placements {
            replay.place(p.row, p.col, p.length, p.orientation)?;
            fleet
                .advance(p.row, p.col, p.length, p.orientation)
                .map_err(|e| SnapshotError::Inconsistent(e.to_string()))?;
        }

        let player = Board::try_from(snapshot.player)?;
        if player.occupancy() != replay.occupancy() {
            return Err(inconsistent("placements do not match the player board"));
        }

        let phase = snapshot.phase;
        match phase {
            Phase::Placement if !snapshot.placements.is_empty() => {
                return Err(inconsistent("ships placed before boards were anchored"))
            }
            Phase::Play | Phase::GameOver if !fleet.complete() => {
                return Err(inconsistent("play started with an incomplete fleet"))
            }
            _ => {}
        }
        if (phase == Phase::GameOver) != snapshot.winner.is_some() {
            return Err(inconsistent("winner does not match phase"));
        }

        let opponent = match snapshot.opponent {
            OpponentSnapshot::Computer { board, ai } => {
                if !ai.is_consistent() {
                    return Err(inconsistent("AI state is contradictory"));
                }
                Opponent::Computer {
                    board: Board::try_from(board)?,
                    ai,
                }
            }
            OpponentSnapshot::Remote { mirror } => {
                if !mirror.is_consistent() {
                    return Err(inconsistent("opponent view is contradictory"));
                }
                Opponent::Remote(mirror)
            }
        };
        let remote = matches!(opponent, Opponent::Remote(_));
        if snapshot.pending_shot.is_some() && !remote {
            return Err(inconsistent("pending shot without a remote opponent"));
        }
        if !snapshot.abandoned_shots.is_empty() && !remote {
            return Err(inconsistent("abandoned shots without a remote opponent"));
        }
        if snapshot
            .abandoned_shots
            .iter()
            .any(|&(row, col)| row >= GRID_SIZE || col >= GRID_SIZE)
        {
            return Err(inconsistent("abandoned shot off the board"));
        }

        Ok(GameSession {
            turn: TurnCoordinator::from_parts(phase, snapshot.active, snapshot.winner),
            fleet,
            player,
            opponent,
            orientation: snapshot.orientation,
            pending_shot: snapshot.pending_shot,
            abandoned: snapshot.abandoned_shots,
            rules,
        })
    }

    /// Replace this session with the snapshot's state. On error `self` is
    /// left exactly as it was.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<(), SnapshotError> {
        let restored = Self::from_snapshot(snapshot)?;
        *self = restored;
        log::info!("session restored in phase {:?}", self.turn.phase());
        Ok(())
    }

    /// [`restore`](Self::restore) from JSON text.
    pub fn restore_json(&mut self, json: &str) -> Result<(), SnapshotError> {
        self.restore(Snapshot::from_json(json)?)
    }
}
