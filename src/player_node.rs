//! Networked match driver: one [`GameSession`] against a remote peer over a
//! [`ReliableLink`].

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use tokio::time::{Duration, Instant};

use crate::channel::ChannelEvent;
use crate::fleet::Placement;
use crate::game::{Action, Effect, GameSession, OpponentKind, Rejection, ShotRecord};
use crate::link::ReliableLink;
use crate::player::Player;
use crate::protocol::{Message, MessageId};
use crate::transport::reconnect::{connect_with_backoff, Connector, ReconnectPolicy};
use crate::turn::{Phase, Side};

/// How long a finished match keeps servicing acks for its last messages.
const FINAL_DRAIN: Duration = Duration::from_secs(3);

/// Summary of a finished match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReport {
    pub winner: Side,
    pub shots_fired: usize,
    pub shots_received: usize,
}

pub struct PeerNode {
    player: Box<dyn Player + Send>,
    session: GameSession,
    link: ReliableLink,
    connector: Option<Box<dyn Connector>>,
    policy: ReconnectPolicy,
    think_time: Duration,
    /// Peer shots that arrived before it was the peer's turn.
    deferred: VecDeque<(usize, usize)>,
    /// Messages already sent a second time after a delivery failure.
    resent: Vec<Message>,
    shots_fired: usize,
    shots_received: usize,
}

impl PeerNode {
    pub fn new(player: Box<dyn Player + Send>, session: GameSession, link: ReliableLink) -> Self {
        Self {
            player,
            session,
            link,
            connector: None,
            policy: ReconnectPolicy::default(),
            think_time: Duration::ZERO,
            deferred: VecDeque::new(),
            resent: Vec::new(),
            shots_fired: 0,
            shots_received: 0,
        }
    }

    /// Reconnect through `connector` when the link drops.
    pub fn with_reconnect(mut self, connector: Box<dyn Connector>, policy: ReconnectPolicy) -> Self {
        self.connector = Some(connector);
        self.policy = policy;
        self
    }

    /// Pause before each local shot, while still servicing the link.
    pub fn with_think_time(mut self, think_time: Duration) -> Self {
        self.think_time = think_time;
        self
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn link(&self) -> &ReliableLink {
        &self.link
    }

    /// Play one match. `first` is the side that shoots first, as agreed by
    /// both peers (the host goes first).
    pub async fn run(&mut self, rng: &mut SmallRng, first: Side) -> anyhow::Result<MatchReport> {
        if self.session.opponent_kind() != OpponentKind::Remote {
            return Err(anyhow::anyhow!("peer node needs a session with a remote opponent"));
        }
        self.link.handshake().await?;

        if self.session.phase() == Phase::Placement {
            self.session.anchor_boards();
        }
        self.player
            .place_fleet(rng, &mut self.session)
            .map_err(|e| anyhow::anyhow!("fleet placement failed: {}", e))?;
        let placements: Vec<Placement> = self.session.fleet().placed().to_vec();
        for p in placements {
            self.link
                .send(Message::Place {
                    row: p.row,
                    col: p.col,
                    length: p.length,
                    orientation: p.orientation,
                })
                .await;
        }
        log::info!("fleet placed and announced, waiting for peer");

        while !self.peer_ready() {
            let event = self.link.next_event().await;
            self.handle_event(event).await?;
        }
        match self.session.start_remote_play(first)? {
            Action::Ok(_) => {}
            other => return Err(anyhow::anyhow!("could not start play: {:?}", other)),
        }

        while self.session.phase() == Phase::Play {
            if !self.deferred.is_empty() && self.session.turn().can_fire(Side::Opponent) {
                self.answer_deferred().await?;
                continue;
            }
            if self.session.can_fire() {
                self.think().await?;
                if self.session.can_fire() {
                    self.fire(rng).await?;
                    continue;
                }
            }
            let event = self.link.next_event().await;
            self.handle_event(event).await?;
        }

        for ev in self.link.drain(FINAL_DRAIN).await {
            log::debug!("after game over: {:?}", ev);
        }
        let winner = self
            .session
            .winner()
            .ok_or_else(|| anyhow::anyhow!("match ended without a winner"))?;
        log::info!("match over, winner: {:?}", winner);
        Ok(MatchReport {
            winner,
            shots_fired: self.shots_fired,
            shots_received: self.shots_received,
        })
    }

    fn peer_ready(&mut self) -> bool {
        self.session
            .mirror_mut()
            .map(|m| m.peer_ready())
            .unwrap_or(false)
    }

    /// Retry held-back peer shots now that the turn may have moved.
    async fn answer_deferred(&mut self) -> anyhow::Result<()> {
        for _ in 0..self.deferred.len() {
            if let Some((row, col)) = self.deferred.pop_front() {
                self.answer_shot(row, col).await?;
            }
        }
        Ok(())
    }

    /// Keep the link serviced for the configured think time.
    async fn think(&mut self) -> anyhow::Result<()> {
        if self.think_time.is_zero() {
            return Ok(());
        }
        let until = Instant::now() + self.think_time;
        while let Some(event) = self.link.next_event_until(until).await {
            self.handle_event(event).await?;
        }
        Ok(())
    }

    async fn fire(&mut self, rng: &mut SmallRng) -> anyhow::Result<()> {
        let (row, col) = self
            .player
            .select_target(rng, &self.session)
            .ok_or_else(|| anyhow::anyhow!("player has no target to fire at"))?;
        match self.session.fire_shot(row, col)? {
            Action::Ok(Effect::ShotSent { row, col }) => {
                self.link.send(Message::Shot { row, col }).await;
            }
            Action::Repeat => log::debug!("({}, {}) already fired at, choosing again", row, col),
            other => log::warn!("shot at ({}, {}) refused: {:?}", row, col, other),
        }
        Ok(())
    }

    async fn handle_event(&mut self, event: ChannelEvent) -> anyhow::Result<()> {
        match event {
            ChannelEvent::Delivered(msg) => self.handle_message(msg).await,
            ChannelEvent::Acknowledged { id, rtt } => {
                log::trace!("message {} acknowledged after {:?}", id, rtt);
                Ok(())
            }
            ChannelEvent::DeliveryFailed { id, msg } => self.delivery_failed(id, msg).await,
            ChannelEvent::PeerStalled { rtt } => {
                if self.session.peer_stalled() {
                    log::warn!("peer stalled ({:?}), taking the turn back", rtt);
                }
                Ok(())
            }
            ChannelEvent::PeerRecovered { rtt } => {
                if self.session.peer_recovered() {
                    log::info!("peer recovered ({:?}), turn restored", rtt);
                }
                Ok(())
            }
            ChannelEvent::Disconnected(reason) => self.reconnect(reason).await,
        }
    }

    /// A lost shot is abandoned so we can fire again. The peer waits on a
    /// lost result or placement, so those go out once more under a fresh
    /// id; losing the same message twice ends the match.
    async fn delivery_failed(&mut self, id: MessageId, msg: Message) -> anyhow::Result<()> {
        log::warn!("message {} lost: {:?}", id, msg);
        match msg {
            Message::Shot { row, col } => {
                if self.session.pending_shot() == Some((row, col)) {
                    self.session.abandon_pending_shot();
                }
                Ok(())
            }
            Message::Result { .. } | Message::Place { .. } => {
                if self.resent.contains(&msg) {
                    return Err(anyhow::anyhow!("peer unreachable, {:?} lost twice", msg));
                }
                self.resent.push(msg);
                let id = self.link.send(msg).await;
                log::info!("resent {:?} as message {}", msg, id);
                Ok(())
            }
        }
    }

    async fn handle_message(&mut self, msg: Message) -> anyhow::Result<()> {
        match msg {
            Message::Place {
                row,
                col,
                length,
                orientation,
            } => {
                let mirror = self.session.mirror_mut()?;
                mirror.record_placement(Placement {
                    row,
                    col,
                    length,
                    orientation,
                });
                Ok(())
            }
            Message::Shot { row, col } => {
                if self.session.phase() == Phase::Setup {
                    log::debug!("deferring shot at ({}, {}) until play starts", row, col);
                    self.deferred.push_back((row, col));
                    Ok(())
                } else {
                    self.answer_shot(row, col).await
                }
            }
            Message::Result { row, col, result } => {
                match self.session.apply_remote_report(row, col, result)? {
                    Action::Ok(Effect::Shot(record)) => {
                        self.shots_fired += 1;
                        self.player.handle_shot_result(&record);
                    }
                    Action::Repeat => log::debug!("duplicate result for ({}, {})", row, col),
                    other => log::warn!("result for ({}, {}) ignored: {:?}", row, col, other),
                }
                Ok(())
            }
        }
    }

    /// Resolve a peer shot against our board and reply with the result.
    async fn answer_shot(&mut self, row: usize, col: usize) -> anyhow::Result<()> {
        let report = match self.session.resolve_incoming_shot(row, col)? {
            Action::Ok(Effect::Shot(record)) => {
                self.shots_received += 1;
                self.player.handle_opponent_shot(&record);
                report_of(&record)?
            }
            Action::Repeat => {
                log::debug!("peer repeated shot at ({}, {})", row, col);
                self.session.recorded_report(row, col)?
            }
            Action::Invalid(Rejection::NotYourTurn) => {
                log::debug!("holding shot at ({}, {}) until the peer's turn", row, col);
                self.deferred.push_back((row, col));
                return Ok(());
            }
            Action::Invalid(Rejection::WrongPhase(phase)) => {
                log::warn!("ignoring shot at ({}, {}) during {:?}", row, col, phase);
                return Ok(());
            }
            other => {
                log::warn!("shot at ({}, {}) not resolved: {:?}", row, col, other);
                return Ok(());
            }
        };
        self.link
            .send(Message::Result {
                row,
                col,
                result: report,
            })
            .await;
        Ok(())
    }

    async fn reconnect(&mut self, reason: String) -> anyhow::Result<()> {
        let Some(connector) = self.connector.as_mut() else {
            return Err(anyhow::anyhow!("connection lost: {}", reason));
        };
        log::warn!("connection lost ({}), reconnecting", reason);
        let transport = connect_with_backoff(connector.as_mut(), &self.policy)
            .await
            .map_err(|e| e.context("connection lost; restart matchmaking"))?;
        self.link.replace_transport(transport).await
    }
}

fn report_of(record: &ShotRecord) -> anyhow::Result<crate::common::ShotReport> {
    record
        .outcome
        .report()
        .ok_or_else(|| anyhow::anyhow!("repeat shot has no report"))
}
