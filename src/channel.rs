//! Reliable delivery over an unreliable frame transport.
//!
//! [`ReliableChannel`] is a pure state machine: it never sleeps or touches a
//! socket. Callers pass the current time in, transmit the frames it hands
//! back, and call [`ReliableChannel::poll_timers`] once
//! [`ReliableChannel::next_deadline`] has passed. Acks and retry timers for
//! one message id are therefore always handled one after the other, so an
//! ack can never race a retransmission of the same id.

use std::collections::{BTreeMap, HashSet};

use tokio::time::{Duration, Instant};

use crate::protocol::{Frame, Message, MessageId};

/// Retransmission interval.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(1000);
/// Retransmissions before a message is abandoned.
pub const DEFAULT_MAX_RETRIES: u32 = 5;
/// Round-trip time above which the peer is treated as stalled.
pub const DEFAULT_STALL_THRESHOLD: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    pub retry_interval: Duration,
    pub max_retries: u32,
    pub stall_threshold: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            retry_interval: DEFAULT_RETRY_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
            stall_threshold: DEFAULT_STALL_THRESHOLD,
        }
    }
}

/// Notifications surfaced to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A new inbound message, delivered exactly once per id.
    Delivered(Message),
    /// One of our messages was acknowledged.
    Acknowledged { id: MessageId, rtt: Duration },
    /// Retry budget exhausted; the message is lost.
    DeliveryFailed { id: MessageId, msg: Message },
    /// A round trip went over the stall threshold.
    PeerStalled { rtt: Duration },
    /// First round trip back under the threshold after a stall.
    PeerRecovered { rtt: Duration },
    /// The connection is gone for good.
    Disconnected(String),
}

/// Frames to transmit and events to hand up, produced by one input.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub outbound: Vec<Frame>,
    pub events: Vec<ChannelEvent>,
}

#[derive(Debug, Clone)]
struct Pending {
    msg: Message,
    first_sent: Instant,
    retries: u32,
    next_retry: Instant,
}

#[derive(Debug)]
pub struct ReliableChannel {
    config: ChannelConfig,
    next_id: MessageId,
    pending: BTreeMap<MessageId, Pending>,
    seen: HashSet<MessageId>,
    stalled: bool,
}

impl Default for ReliableChannel {
    fn default() -> Self {
        Self::new(ChannelConfig::default())
    }
}

impl ReliableChannel {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            next_id: 1,
            pending: BTreeMap::new(),
            seen: HashSet::new(),
            stalled: false,
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Ids of messages still awaiting an ack, oldest first.
    pub fn pending_ids(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.pending.keys().copied()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Wrap `msg` in a data frame with a fresh id and start its retry timer.
    /// The returned frame must be transmitted by the caller.
    pub fn send(&mut self, msg: Message, now: Instant) -> (MessageId, Frame) {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert(
            id,
            Pending {
                msg,
                first_sent: now,
                retries: 0,
                next_retry: now + self.config.retry_interval,
            },
        );
        (id, Frame::Data { id, msg })
    }

    /// Process one inbound frame.
    pub fn on_frame(&mut self, frame: Frame, now: Instant) -> Dispatch {
        let mut out = Dispatch::default();
        match frame {
            Frame::Data { id, msg } => {
                // Duplicates are acked again: the first ack may have been lost.
                out.outbound.push(Frame::Ack { id });
                if self.seen.insert(id) {
                    out.events.push(ChannelEvent::Delivered(msg));
                } else {
                    log::debug!("dropping duplicate message {}", id);
                }
            }
            Frame::Ack { id } => match self.pending.remove(&id) {
                Some(p) => {
                    let rtt = now.saturating_duration_since(p.first_sent);
                    out.events.push(ChannelEvent::Acknowledged { id, rtt });
                    self.observe_rtt(rtt, &mut out.events);
                }
                None => log::debug!("ack for unknown or abandoned message {}", id),
            },
            Frame::Heartbeat => {}
            Frame::Hello { version } => {
                log::warn!("unexpected hello (version {}) mid-session", version);
            }
        }
        out
    }

    fn observe_rtt(&mut self, rtt: Duration, events: &mut Vec<ChannelEvent>) {
        if rtt > self.config.stall_threshold {
            if !self.stalled {
                log::warn!("peer round trip {:?} over stall threshold", rtt);
                self.stalled = true;
                events.push(ChannelEvent::PeerStalled { rtt });
            }
        } else if self.stalled {
            log::info!("peer responsive again ({:?})", rtt);
            self.stalled = false;
            events.push(ChannelEvent::PeerRecovered { rtt });
        }
    }

    /// Retransmit or abandon every message whose timer has expired.
    pub fn poll_timers(&mut self, now: Instant) -> Dispatch {
        let mut out = Dispatch::default();
        let due: Vec<MessageId> = self
            .pending
            .iter()
            .filter(|(_, p)| p.next_retry <= now)
            .map(|(&id, _)| id)
            .collect();
        for id in due {
            let Some(p) = self.pending.get_mut(&id) else {
                continue;
            };
            if p.retries >= self.config.max_retries {
                let msg = p.msg;
                self.pending.remove(&id);
                log::warn!("giving up on message {} after {} retries", id, self.config.max_retries);
                out.events.push(ChannelEvent::DeliveryFailed { id, msg });
            } else {
                p.retries += 1;
                p.next_retry = now + self.config.retry_interval;
                log::debug!("retransmitting message {} (retry {})", id, p.retries);
                out.outbound.push(Frame::Data { id, msg: p.msg });
            }
        }
        out
    }

    /// Earliest instant at which [`poll_timers`](Self::poll_timers) has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.next_retry).min()
    }

    /// Re-send everything still pending, e.g. after a reconnect. Retry
    /// counters are kept; the timers restart from `now`.
    pub fn resend_all(&mut self, now: Instant) -> Vec<Frame> {
        let interval = self.config.retry_interval;
        self.pending
            .iter_mut()
            .map(|(&id, p)| {
                p.next_retry = now + interval;
                Frame::Data { id, msg: p.msg }
            })
            .collect()
    }

    /// End of match: drop every timer and all dedup state, restart ids.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.seen.clear();
        self.next_id = 1;
        self.stalled = false;
    }
}
