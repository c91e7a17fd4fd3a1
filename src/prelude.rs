//! Commonly used types for ease of import.

pub use crate::{
    Action, AiPlayer, Effect, GameSession, HuntTargetAi, Opponent, OpponentKind, Orientation, Phase,
    Player, Rejection, Rules, ShotOutcome, ShotReport, Side,
};

#[cfg(feature = "std")]
pub use crate::{CliPlayer, PeerNode, ReliableLink, Snapshot};

#[cfg(feature = "std")]
pub use crate::transport::{in_memory::InMemoryTransport, tcp::TcpTransport, Transport};
