use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::protocol::Frame;
use crate::transport::Transport;

/// One end of an in-process duplex pipe. Dropping either end closes the pipe
/// for the other.
pub struct InMemoryTransport {
    tx: Option<UnboundedSender<Frame>>,
    rx: UnboundedReceiver<Frame>,
}

impl InMemoryTransport {
    pub fn pair() -> (Self, Self) {
        let (tx1, rx1) = unbounded_channel();
        let (tx2, rx2) = unbounded_channel();
        (
            Self {
                tx: Some(tx1),
                rx: rx2,
            },
            Self {
                tx: Some(tx2),
                rx: rx1,
            },
        )
    }

    /// Simulate a dropped connection: the peer's `recv` fails once it has
    /// drained what was already sent, and our own sends fail from now on.
    pub fn disconnect(&mut self) {
        self.tx = None;
        self.rx.close();
    }
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn send(&mut self, frame: Frame) -> anyhow::Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Channel closed"))?;
        tx.send(frame).map_err(|_| anyhow::anyhow!("Channel closed"))
    }

    async fn recv(&mut self) -> anyhow::Result<Frame> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("Channel closed"))
    }
}
