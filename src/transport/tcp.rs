use std::io::ErrorKind;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::protocol::Frame;
use crate::transport::Transport;

/// Default timeout for writing one frame.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum frame size. Real frames are a few dozen bytes.
const MAX_MESSAGE_SIZE: u32 = 64 * 1024;

/// Length-prefixed bincode frames over TCP: a 4-byte big-endian length, then
/// the payload.
///
/// Inbound bytes are accumulated in `read_buf`, so a `recv` dropped half way
/// through a frame loses nothing.
pub struct TcpTransport {
    stream: TcpStream,
    timeout_duration: Duration,
    max_message_size: u32,
    read_buf: Vec<u8>,
}

fn io_error(e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::UnexpectedEof => {
            anyhow::anyhow!("Connection closed by peer")
        }
        _ => anyhow::anyhow!("I/O error: {}", e),
    }
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_config(stream, DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE)
    }

    pub fn with_config(stream: TcpStream, timeout_duration: Duration, max_message_size: u32) -> Self {
        // Latency matters more than throughput for tiny frames.
        if let Err(e) = stream.set_nodelay(true) {
            log::debug!("could not set TCP_NODELAY: {}", e);
        }
        Self {
            stream,
            timeout_duration,
            max_message_size,
            read_buf: Vec::with_capacity(256),
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }

    /// Pop one complete frame off the read buffer, if there is one.
    fn take_frame(&mut self) -> anyhow::Result<Option<Frame>> {
        let Some(header) = self.read_buf.get(..4) else {
            return Ok(None);
        };
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        if len == 0 {
            return Err(anyhow::anyhow!("Invalid message length: 0"));
        }
        if len > self.max_message_size {
            return Err(anyhow::anyhow!(
                "Message too large: {} bytes (max: {})",
                len,
                self.max_message_size
            ));
        }
        let end = 4 + len as usize;
        if self.read_buf.len() < end {
            return Ok(None);
        }
        let frame = bincode::deserialize(&self.read_buf[4..end])
            .map_err(|e| anyhow::anyhow!("Deserialization error: {}", e));
        self.read_buf.drain(..end);
        frame.map(Some)
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, frame: Frame) -> anyhow::Result<()> {
        let data =
            bincode::serialize(&frame).map_err(|e| anyhow::anyhow!("Serialization error: {}", e))?;
        if data.len() as u64 > u64::from(self.max_message_size) {
            return Err(anyhow::anyhow!(
                "Message too large: {} bytes (max: {})",
                data.len(),
                self.max_message_size
            ));
        }
        let mut out = Vec::with_capacity(4 + data.len());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(&data);

        timeout(self.timeout_duration, self.stream.write_all(&out))
            .await
            .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", self.timeout_duration))?
            .map_err(io_error)
    }

    async fn recv(&mut self) -> anyhow::Result<Frame> {
        loop {
            if let Some(frame) = self.take_frame()? {
                return Ok(frame);
            }
            self.read_buf.reserve(1024);
            let n = self.stream.read_buf(&mut self.read_buf).await.map_err(io_error)?;
            if n == 0 {
                return Err(anyhow::anyhow!("Connection closed by peer"));
            }
        }
    }
}
