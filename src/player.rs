use rand::rngs::SmallRng;

use crate::game::{GameError, GameSession, ShotRecord};

/// Decision source for the local side of a session.
pub trait Player {
    /// Place the whole fleet through `session` (which must be in `Setup`).
    fn place_fleet(&mut self, rng: &mut SmallRng, session: &mut GameSession) -> Result<(), GameError>;

    /// Choose the next cell to fire at, or `None` to give up.
    fn select_target(&mut self, rng: &mut SmallRng, session: &GameSession) -> Option<(usize, usize)>;

    /// Inform the player of the result of its own shot.
    fn handle_shot_result(&mut self, _record: &ShotRecord) {}

    /// Inform the player of an opponent shot against its board.
    fn handle_opponent_shot(&mut self, _record: &ShotRecord) {}
}
