//! Async driver joining a [`Transport`] with a [`ReliableChannel`].
//!
//! Callers see only [`ChannelEvent`]s. Transport errors never escape as
//! errors: they turn into a single `Disconnected` event, after which the
//! link holds outbound messages until [`ReliableLink::replace_transport`]
//! hands it a fresh connection.

use std::collections::VecDeque;

use tokio::time::{sleep_until, Duration, Instant};

use crate::channel::{ChannelConfig, ChannelEvent, Dispatch, ReliableChannel};
use crate::protocol::{Frame, Message, MessageId, PROTOCOL_VERSION};
use crate::transport::Transport;

/// How long the handshake waits for the peer's hello.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

enum Wake {
    Frame(anyhow::Result<Frame>),
    Timer,
    Deadline,
}

async fn sleep_opt(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

pub struct ReliableLink {
    transport: Box<dyn Transport>,
    channel: ReliableChannel,
    events: VecDeque<ChannelEvent>,
    /// Set while the transport is known to be dead.
    down: Option<String>,
}

impl ReliableLink {
    pub fn new(transport: Box<dyn Transport>, config: ChannelConfig) -> Self {
        Self {
            transport,
            channel: ReliableChannel::new(config),
            events: VecDeque::new(),
            down: None,
        }
    }

    pub fn channel(&self) -> &ReliableChannel {
        &self.channel
    }

    pub fn is_connected(&self) -> bool {
        self.down.is_none()
    }

    /// Exchange `Hello` frames and check protocol versions. Both sides send
    /// first, so neither needs to know who dialled.
    pub async fn handshake(&mut self) -> anyhow::Result<()> {
        self.transport
            .send(Frame::Hello {
                version: PROTOCOL_VERSION,
            })
            .await?;
        let deadline = Instant::now() + HANDSHAKE_TIMEOUT;
        loop {
            let frame = tokio::time::timeout_at(deadline, self.transport.recv())
                .await
                .map_err(|_| anyhow::anyhow!("Handshake timed out"))??;
            match frame {
                Frame::Hello { version } if version == PROTOCOL_VERSION => {
                    log::debug!("handshake complete (protocol {})", version);
                    return Ok(());
                }
                Frame::Hello { version } => {
                    log::error!(
                        "protocol version mismatch: expected {}, peer sent {}",
                        PROTOCOL_VERSION,
                        version
                    );
                    return Err(anyhow::anyhow!(
                        "Protocol version mismatch: expected {}, got {}",
                        PROTOCOL_VERSION,
                        version
                    ));
                }
                Frame::Heartbeat => continue,
                other => {
                    return Err(anyhow::anyhow!(
                        "Expected Hello, got unexpected frame {:?} (closing session)",
                        other
                    ))
                }
            }
        }
    }

    /// Queue `msg` for reliable delivery. While disconnected it is only
    /// recorded and goes out when a new transport is installed.
    pub async fn send(&mut self, msg: Message) -> MessageId {
        let (id, frame) = self.channel.send(msg, Instant::now());
        if self.down.is_none() {
            self.transmit(vec![frame]).await;
        }
        id
    }

    /// Next notification, waiting as long as it takes.
    pub async fn next_event(&mut self) -> ChannelEvent {
        loop {
            if let Some(ev) = self.poll_event(None).await {
                return ev;
            }
        }
    }

    /// Next notification, or `None` once `deadline` passes. Acks and
    /// retransmissions keep flowing while waiting.
    pub async fn next_event_until(&mut self, deadline: Instant) -> Option<ChannelEvent> {
        self.poll_event(Some(deadline)).await
    }

    async fn poll_event(&mut self, deadline: Option<Instant>) -> Option<ChannelEvent> {
        loop {
            if let Some(ev) = self.events.pop_front() {
                return Some(ev);
            }
            if let Some(reason) = &self.down {
                return Some(ChannelEvent::Disconnected(reason.clone()));
            }
            let retry_at = self.channel.next_deadline();
            let wake = tokio::select! {
                res = self.transport.recv() => Wake::Frame(res),
                _ = sleep_opt(retry_at) => Wake::Timer,
                _ = sleep_opt(deadline) => Wake::Deadline,
            };
            let now = Instant::now();
            let dispatch = match wake {
                Wake::Frame(Ok(frame)) => self.channel.on_frame(frame, now),
                Wake::Frame(Err(e)) => {
                    self.mark_down(e.to_string());
                    continue;
                }
                Wake::Timer => self.channel.poll_timers(now),
                Wake::Deadline => return None,
            };
            self.apply(dispatch).await;
        }
    }

    async fn apply(&mut self, dispatch: Dispatch) {
        self.transmit(dispatch.outbound).await;
        self.events.extend(dispatch.events);
    }

    async fn transmit(&mut self, frames: Vec<Frame>) {
        for frame in frames {
            if let Err(e) = self.transport.send(frame).await {
                self.mark_down(e.to_string());
                return;
            }
        }
    }

    fn mark_down(&mut self, reason: String) {
        if self.down.is_none() {
            log::warn!("connection lost: {}", reason);
            self.events.push_back(ChannelEvent::Disconnected(reason.clone()));
            self.down = Some(reason);
        }
    }

    /// Install a new connection to the same peer: handshake, then resend
    /// everything still unacknowledged. Dedup state carries over.
    pub async fn replace_transport(&mut self, transport: Box<dyn Transport>) -> anyhow::Result<()> {
        self.transport = transport;
        self.handshake().await?;
        self.down = None;
        self.events
            .retain(|ev| !matches!(ev, ChannelEvent::Disconnected(_)));
        let frames = self.channel.resend_all(Instant::now());
        log::info!("link restored, resending {} pending message(s)", frames.len());
        self.transmit(frames).await;
        Ok(())
    }

    /// Keep servicing acks and retries until nothing is pending or `wait`
    /// runs out. Returns the events seen meanwhile.
    pub async fn drain(&mut self, wait: Duration) -> Vec<ChannelEvent> {
        let deadline = Instant::now() + wait;
        let mut seen = Vec::new();
        while self.channel.has_pending() && self.down.is_none() {
            match self.poll_event(Some(deadline)).await {
                Some(ev) => seen.push(ev),
                None => break,
            }
        }
        seen
    }

    /// End of match: drop pending messages, dedup state and queued events.
    pub fn reset(&mut self) {
        self.channel.reset();
        self.events.clear();
    }
}
