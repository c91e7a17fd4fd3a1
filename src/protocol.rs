//! Messages exchanged between two peers.
//!
//! Application messages ([`Message`]) travel inside [`Frame::Data`] with a
//! channel-assigned id; the receiver answers every data frame with
//! [`Frame::Ack`] carrying the same id.

use crate::common::ShotReport;
use crate::ship::Orientation;

pub use crate::config::PROTOCOL_VERSION;

/// Identifier assigned to each outbound data frame, unique within a match.
pub type MessageId = u64;

/// Game-level messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
pub enum Message {
    /// Announce a placement to the peer's mirror of our board.
    Place {
        row: usize,
        col: usize,
        length: usize,
        orientation: Orientation,
    },
    /// Fire at the receiver's (`row`, `col`).
    Shot { row: usize, col: usize },
    /// The receiver's verdict on a shot.
    Result {
        row: usize,
        col: usize,
        result: ShotReport,
    },
}

/// What actually crosses the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Frame {
    /// First frame on every connection.
    Hello { version: u32 },
    Data { id: MessageId, msg: Message },
    Ack { id: MessageId },
    /// Keep-alive; never acknowledged or echoed.
    Heartbeat,
}

impl Message {
    /// Board cell the message refers to.
    pub fn cell(&self) -> (usize, usize) {
        match *self {
            Message::Place { row, col, .. }
            | Message::Shot { row, col }
            | Message::Result { row, col, .. } => (row, col),
        }
    }
}
