//! Frame transports. Implementations must make `recv` cancel-safe: the
//! reliable link polls it inside `tokio::select!` against retry timers.

use crate::protocol::Frame;

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&mut self, frame: Frame) -> anyhow::Result<()>;
    async fn recv(&mut self) -> anyhow::Result<Frame>;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&mut self, frame: Frame) -> anyhow::Result<()> {
        (**self).send(frame).await
    }

    async fn recv(&mut self) -> anyhow::Result<Frame> {
        (**self).recv().await
    }
}

pub mod heartbeat;
pub mod in_memory;
pub mod reconnect;
pub mod tcp;
