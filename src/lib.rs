#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod ai;
mod bitboard;
mod board;
mod common;
mod config;
mod fleet;
mod game;
mod mirror;
mod player;
mod player_ai;
pub mod prelude;
pub mod protocol;
mod ship;
mod turn;

#[cfg(feature = "std")]
pub mod channel;
#[cfg(feature = "std")]
pub mod link;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
mod player_cli;
#[cfg(feature = "std")]
mod player_node;
#[cfg(feature = "std")]
mod snapshot;
#[cfg(feature = "std")]
pub mod transport;
#[cfg(feature = "std")]
pub mod ui;

pub use ai::*;
pub use bitboard::{neighbours, BitBoard, BitBoardError, Grid};
pub use board::*;
pub use common::*;
pub use config::*;
pub use fleet::*;
pub use game::*;
pub use mirror::*;
pub use player::*;
pub use player_ai::*;
pub use protocol::{Frame, Message, MessageId};
pub use ship::*;
pub use turn::*;

#[cfg(feature = "std")]
pub use channel::{ChannelConfig, ChannelEvent, Dispatch, ReliableChannel};
#[cfg(feature = "std")]
pub use link::ReliableLink;
#[cfg(feature = "std")]
pub use logging::{init_logging, level_from, LOG_ENV};
#[cfg(feature = "std")]
pub use player_cli::*;
#[cfg(feature = "std")]
pub use player_node::*;
#[cfg(feature = "std")]
pub use snapshot::*;
#[cfg(feature = "std")]
pub use transport::heartbeat::HeartbeatTransport;
#[cfg(feature = "std")]
pub use transport::in_memory::InMemoryTransport;
#[cfg(feature = "std")]
pub use transport::tcp::TcpTransport;
