use std::time::Duration;

use battlegrid::transport::Transport;
use battlegrid::{
    ChannelConfig, ChannelEvent, Frame, InMemoryTransport, Message, ReliableLink, PROTOCOL_VERSION,
};
use tokio::time::Instant;

const SHOT: Message = Message::Shot { row: 2, col: 7 };

fn link(t: InMemoryTransport) -> ReliableLink {
    ReliableLink::new(Box::new(t), ChannelConfig::default())
}

/// Drops the first `drop_data` data frames it is asked to send.
struct Lossy {
    inner: InMemoryTransport,
    drop_data: usize,
}

#[async_trait::async_trait]
impl Transport for Lossy {
    async fn send(&mut self, frame: Frame) -> anyhow::Result<()> {
        if matches!(frame, Frame::Data { .. }) && self.drop_data > 0 {
            self.drop_data -= 1;
            return Ok(());
        }
        self.inner.send(frame).await
    }

    async fn recv(&mut self) -> anyhow::Result<Frame> {
        self.inner.recv().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_handshake_and_delivery() {
    let (t1, t2) = InMemoryTransport::pair();
    let (mut a, mut b) = (link(t1), link(t2));
    let (ha, hb) = tokio::join!(a.handshake(), b.handshake());
    ha.unwrap();
    hb.unwrap();

    assert_eq!(a.send(SHOT).await, 1);
    assert_eq!(b.next_event().await, ChannelEvent::Delivered(SHOT));
    match a.next_event().await {
        ChannelEvent::Acknowledged { id, rtt } => {
            assert_eq!(id, 1);
            assert_eq!(rtt, Duration::ZERO);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(!a.channel().has_pending());
}

#[tokio::test(start_paused = true)]
async fn test_handshake_version_mismatch() {
    let (t1, mut raw) = InMemoryTransport::pair();
    let mut a = link(t1);
    raw.send(Frame::Hello {
        version: PROTOCOL_VERSION + 1,
    })
    .await
    .unwrap();
    assert!(a.handshake().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_handshake_times_out() {
    let (t1, _raw) = InMemoryTransport::pair();
    let mut a = link(t1);
    let started = Instant::now();
    assert!(a.handshake().await.is_err());
    assert_eq!(started.elapsed(), Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_lost_frames_are_retransmitted() {
    let (t1, t2) = InMemoryTransport::pair();
    let mut a = ReliableLink::new(
        Box::new(Lossy {
            inner: t1,
            drop_data: 2,
        }),
        ChannelConfig::default(),
    );
    let mut b = link(t2);

    a.send(SHOT).await;
    let (ev_a, ev_b) = tokio::join!(a.next_event(), b.next_event());
    assert_eq!(ev_b, ChannelEvent::Delivered(SHOT));
    assert_eq!(
        ev_a,
        ChannelEvent::Acknowledged {
            id: 1,
            rtt: Duration::from_secs(2)
        }
    );
    // Two seconds is over the stall threshold.
    assert_eq!(
        a.next_event().await,
        ChannelEvent::PeerStalled {
            rtt: Duration::from_secs(2)
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_message_fails_after_retries() {
    let (t1, _silent) = InMemoryTransport::pair();
    let mut a = link(t1);
    let started = Instant::now();
    let id = a.send(SHOT).await;
    assert_eq!(
        a.next_event().await,
        ChannelEvent::DeliveryFailed { id, msg: SHOT }
    );
    assert_eq!(started.elapsed(), Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn test_next_event_until_times_out() {
    let (t1, _t2) = InMemoryTransport::pair();
    let mut a = link(t1);
    let deadline = Instant::now() + Duration::from_millis(500);
    assert_eq!(a.next_event_until(deadline).await, None);
    assert_eq!(Instant::now(), deadline);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_then_replace_transport() {
    let (t1, t2) = InMemoryTransport::pair();
    let (mut a, b) = (link(t1), link(t2));
    drop(b);

    assert!(matches!(a.next_event().await, ChannelEvent::Disconnected(_)));
    assert!(!a.is_connected());
    // Still reported until a new transport arrives.
    assert!(matches!(a.next_event().await, ChannelEvent::Disconnected(_)));

    let id = a.send(SHOT).await;
    assert!(a.channel().has_pending());

    let (n1, n2) = InMemoryTransport::pair();
    let mut b = link(n2);
    let (ra, rb) = tokio::join!(a.replace_transport(Box::new(n1)), b.handshake());
    ra.unwrap();
    rb.unwrap();
    assert!(a.is_connected());

    let (ev_a, ev_b) = tokio::join!(a.next_event(), b.next_event());
    assert_eq!(ev_b, ChannelEvent::Delivered(SHOT));
    assert!(matches!(ev_a, ChannelEvent::Acknowledged { id: got, .. } if got == id));
}

#[tokio::test(start_paused = true)]
async fn test_drain_waits_for_outstanding_acks() {
    let (t1, t2) = InMemoryTransport::pair();
    let (mut a, mut b) = (link(t1), link(t2));
    a.send(SHOT).await;
    let (seen, delivered) = tokio::join!(a.drain(Duration::from_secs(3)), b.next_event());
    assert_eq!(delivered, ChannelEvent::Delivered(SHOT));
    assert_eq!(seen.len(), 1);
    assert!(!a.channel().has_pending());

    a.reset();
    assert_eq!(a.send(SHOT).await, 1);
}
