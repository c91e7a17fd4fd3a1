//! Bounded reconnection with exponential backoff.

use tokio::net::TcpListener;
use tokio::time::{sleep, timeout, Duration};

use crate::transport::heartbeat::HeartbeatTransport;
use crate::transport::tcp::TcpTransport;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Connection attempts before giving up.
    pub attempts: u32,
    /// Wait before the first attempt; doubles after each failure.
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl ReconnectPolicy {
    /// Backoff before attempt `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Something that can (re)establish a transport to the same peer.
#[async_trait::async_trait]
pub trait Connector: Send {
    async fn connect(&mut self) -> anyhow::Result<Box<dyn Transport>>;
}

/// Try `connector` up to `policy.attempts` times, sleeping with exponential
/// backoff before each try.
pub async fn connect_with_backoff(
    connector: &mut dyn Connector,
    policy: &ReconnectPolicy,
) -> anyhow::Result<Box<dyn Transport>> {
    let mut last_err = anyhow::anyhow!("no reconnect attempts allowed");
    for attempt in 0..policy.attempts {
        let delay = policy.delay(attempt);
        sleep(delay).await;
        match connector.connect().await {
            Ok(transport) => {
                log::info!("reconnected on attempt {}", attempt + 1);
                return Ok(transport);
            }
            Err(e) => {
                log::warn!(
                    "reconnect attempt {}/{} failed after {:?}: {}",
                    attempt + 1,
                    policy.attempts,
                    delay,
                    e
                );
                last_err = e;
            }
        }
    }
    Err(last_err.context(format!(
        "gave up after {} reconnect attempts",
        policy.attempts
    )))
}

/// Heartbeat settings applied to every TCP connection.
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    pub interval: Duration,
    pub idle_timeout: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: crate::transport::heartbeat::DEFAULT_HEARTBEAT_INTERVAL,
            idle_timeout: crate::transport::heartbeat::DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// Client side: dial the host again.
pub struct TcpConnector {
    addr: String,
    heartbeat: HeartbeatConfig,
}

impl TcpConnector {
    pub fn new(addr: impl Into<String>, heartbeat: HeartbeatConfig) -> Self {
        Self {
            addr: addr.into(),
            heartbeat,
        }
    }
}

#[async_trait::async_trait]
impl Connector for TcpConnector {
    async fn connect(&mut self) -> anyhow::Result<Box<dyn Transport>> {
        let tcp = TcpTransport::connect(self.addr.as_str()).await?;
        Ok(Box::new(HeartbeatTransport::new(
            tcp,
            self.heartbeat.interval,
            self.heartbeat.idle_timeout,
        )))
    }
}

/// Host side: wait for the peer to dial back in.
pub struct TcpAcceptor {
    listener: TcpListener,
    accept_timeout: Duration,
    heartbeat: HeartbeatConfig,
}

impl TcpAcceptor {
    pub fn new(listener: TcpListener, accept_timeout: Duration, heartbeat: HeartbeatConfig) -> Self {
        Self {
            listener,
            accept_timeout,
            heartbeat,
        }
    }

    /// Wait for the first connection.
    pub async fn accept(&mut self) -> anyhow::Result<Box<dyn Transport>> {
        let (stream, addr) = self.listener.accept().await?;
        log::info!("peer connected from {}", addr);
        Ok(self.wrap(stream))
    }

    fn wrap(&self, stream: tokio::net::TcpStream) -> Box<dyn Transport> {
        Box::new(HeartbeatTransport::new(
            TcpTransport::new(stream),
            self.heartbeat.interval,
            self.heartbeat.idle_timeout,
        ))
    }
}

#[async_trait::async_trait]
impl Connector for TcpAcceptor {
    async fn connect(&mut self) -> anyhow::Result<Box<dyn Transport>> {
        let (stream, addr) = timeout(self.accept_timeout, self.listener.accept())
            .await
            .map_err(|_| anyhow::anyhow!("no peer reconnected within {:?}", self.accept_timeout))??;
        log::info!("peer reconnected from {}", addr);
        Ok(self.wrap(stream))
    }
}
