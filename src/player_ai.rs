use alloc::vec::Vec;
use rand::rngs::SmallRng;

use crate::ai::HuntTargetAi;
use crate::common::{BoardError, ShotOutcome};
use crate::game::{Action, GameError, GameSession, Rejection, ShotRecord};
use crate::player::Player;

/// Computer player driven by the hunt/target search.
#[derive(Debug, Default)]
pub struct AiPlayer {
    ai: HuntTargetAi,
}

impl AiPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ai(&self) -> &HuntTargetAi {
        &self.ai
    }
}

/// Lay out the remaining fleet at random and feed it through `session`.
pub fn place_fleet_randomly(rng: &mut SmallRng, session: &mut GameSession) -> Result<(), GameError> {
    let remaining: Vec<usize> = session.fleet().remaining().collect();
    let mut scratch = session.player_board().clone();
    let before = scratch.ships().len();
    scratch.extend_fleet_randomly(rng, &remaining)?;
    for ship in &scratch.ships()[before..] {
        let (row, col) = ship.origin();
        match session.place_ship(row, col, ship.length(), ship.orientation()) {
            Action::Ok(_) => {}
            Action::Invalid(Rejection::Placement(e)) => return Err(GameError::Board(e)),
            other => {
                log::error!("random placement refused: {:?}", other);
                return Err(GameError::Board(BoardError::UnableToPlaceShip));
            }
        }
    }
    Ok(())
}

impl Player for AiPlayer {
    fn place_fleet(&mut self, rng: &mut SmallRng, session: &mut GameSession) -> Result<(), GameError> {
        self.ai.reset_to_hunt();
        place_fleet_randomly(rng, session)
    }

    fn select_target(&mut self, rng: &mut SmallRng, session: &GameSession) -> Option<(usize, usize)> {
        self.ai.choose_cell(&session.opponent_shots(), rng)
    }

    fn handle_shot_result(&mut self, record: &ShotRecord) {
        match record.outcome {
            ShotOutcome::Hit => self.ai.record_hit(record.row, record.col),
            ShotOutcome::Sunk(_) => self.ai.reset_to_hunt(),
            ShotOutcome::Miss | ShotOutcome::Repeat => {}
        }
    }
}
