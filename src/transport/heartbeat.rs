use tokio::time::{sleep_until, Duration, Instant};

use crate::protocol::Frame;
use crate::transport::Transport;

/// Default heartbeat interval (10 seconds).
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Default idle timeout before considering connection dead (45 seconds).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(45);

/// Transport wrapper that keeps a quiet connection alive and notices a dead
/// one.
///
/// - a heartbeat frame goes out whenever nothing was sent for
///   `heartbeat_interval`
/// - inbound heartbeats count as activity and are filtered out; they are not
///   echoed, each side runs its own timer
/// - `recv` fails once nothing has arrived for `idle_timeout`
///
/// Can be disabled for transports that detect closure on their own (e.g.
/// `InMemoryTransport`).
pub struct HeartbeatTransport<T: Transport> {
    inner: T,
    heartbeat_interval: Duration,
    idle_timeout: Duration,
    last_sent: Instant,
    last_received: Instant,
    enabled: bool,
}

enum Wake {
    Frame(anyhow::Result<Frame>),
    Timer,
}

impl<T: Transport> HeartbeatTransport<T> {
    pub fn new(inner: T, heartbeat_interval: Duration, idle_timeout: Duration) -> Self {
        let now = Instant::now();
        Self {
            inner,
            heartbeat_interval,
            idle_timeout,
            last_sent: now,
            last_received: now,
            enabled: true,
        }
    }

    pub fn with_defaults(inner: T) -> Self {
        Self::new(inner, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn disabled(inner: T) -> Self {
        Self {
            enabled: false,
            ..Self::with_defaults(inner)
        }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[async_trait::async_trait]
impl<T: Transport> Transport for HeartbeatTransport<T> {
    async fn send(&mut self, frame: Frame) -> anyhow::Result<()> {
        self.inner.send(frame).await?;
        self.last_sent = Instant::now();
        Ok(())
    }

    async fn recv(&mut self) -> anyhow::Result<Frame> {
        if !self.enabled {
            return self.inner.recv().await;
        }
        loop {
            let idle_at = self.last_received + self.idle_timeout;
            let beat_at = self.last_sent + self.heartbeat_interval;
            let wake = tokio::select! {
                res = self.inner.recv() => Wake::Frame(res),
                _ = sleep_until(idle_at.min(beat_at)) => Wake::Timer,
            };
            match wake {
                Wake::Frame(Ok(Frame::Heartbeat)) => {
                    self.last_received = Instant::now();
                }
                Wake::Frame(Ok(frame)) => {
                    self.last_received = Instant::now();
                    return Ok(frame);
                }
                Wake::Frame(Err(e)) => return Err(e),
                Wake::Timer => {
                    let now = Instant::now();
                    if now >= self.last_received + self.idle_timeout {
                        log::warn!("no peer activity for {:?}", self.idle_timeout);
                        return Err(anyhow::anyhow!(
                            "Connection idle timeout exceeded ({:?})",
                            self.idle_timeout
                        ));
                    }
                    if now >= self.last_sent + self.heartbeat_interval {
                        self.inner.send(Frame::Heartbeat).await?;
                        self.last_sent = now;
                    }
                }
            }
        }
    }
}
