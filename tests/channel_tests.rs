use std::time::Duration;

use battlegrid::{
    ChannelConfig, ChannelEvent, Frame, Message, ReliableChannel, ShotReport,
};
use tokio::time::Instant;

const SHOT: Message = Message::Shot { row: 3, col: 4 };

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

#[test]
fn test_retries_then_delivery_failed() {
    let mut ch = ReliableChannel::default();
    let t0 = Instant::now();
    let (id, frame) = ch.send(SHOT, t0);
    assert_eq!(id, 1);
    assert_eq!(frame, Frame::Data { id, msg: SHOT });
    assert_eq!(ch.next_deadline(), Some(t0 + secs(1)));

    // Nothing due before the first deadline.
    assert_eq!(ch.poll_timers(t0 + Duration::from_millis(999)), Default::default());

    let mut sends = 1;
    for n in 1..=5 {
        let out = ch.poll_timers(t0 + secs(n));
        assert_eq!(out.outbound, vec![Frame::Data { id, msg: SHOT }]);
        assert!(out.events.is_empty());
        sends += out.outbound.len();
    }
    assert_eq!(sends, 6);

    let out = ch.poll_timers(t0 + secs(6));
    assert!(out.outbound.is_empty());
    assert_eq!(out.events, vec![ChannelEvent::DeliveryFailed { id, msg: SHOT }]);
    assert!(!ch.has_pending());
    assert_eq!(ch.next_deadline(), None);

    // A late ack does not bring the message back.
    let late = ch.on_frame(Frame::Ack { id }, t0 + secs(7));
    assert!(late.events.is_empty());
    assert!(late.outbound.is_empty());
}

#[test]
fn test_ack_stops_retries() {
    let mut ch = ReliableChannel::default();
    let t0 = Instant::now();
    let (id, _) = ch.send(SHOT, t0);
    let out = ch.on_frame(Frame::Ack { id }, t0 + Duration::from_millis(40));
    assert_eq!(
        out.events,
        vec![ChannelEvent::Acknowledged {
            id,
            rtt: Duration::from_millis(40)
        }]
    );
    assert!(out.outbound.is_empty());
    assert!(ch.poll_timers(t0 + secs(10)).outbound.is_empty());
}

#[test]
fn test_duplicate_data_delivered_once_acked_twice() {
    let mut ch = ReliableChannel::default();
    let t0 = Instant::now();
    let msg = Message::Result {
        row: 0,
        col: 0,
        result: ShotReport::Sunk,
    };
    let first = ch.on_frame(Frame::Data { id: 9, msg }, t0);
    assert_eq!(first.outbound, vec![Frame::Ack { id: 9 }]);
    assert_eq!(first.events, vec![ChannelEvent::Delivered(msg)]);

    let second = ch.on_frame(Frame::Data { id: 9, msg }, t0 + secs(1));
    assert_eq!(second.outbound, vec![Frame::Ack { id: 9 }]);
    assert!(second.events.is_empty());
}

#[test]
fn test_stall_and_recovery() {
    let config = ChannelConfig {
        stall_threshold: Duration::from_millis(1500),
        ..ChannelConfig::default()
    };
    let mut ch = ReliableChannel::new(config);
    let t0 = Instant::now();

    let (slow, _) = ch.send(SHOT, t0);
    let (slower, _) = ch.send(Message::Shot { row: 0, col: 0 }, t0);
    let out = ch.on_frame(Frame::Ack { id: slow }, t0 + Duration::from_millis(1600));
    assert!(out.events.contains(&ChannelEvent::PeerStalled {
        rtt: Duration::from_millis(1600)
    }));
    assert!(ch.is_stalled());

    // Still slow: no second stall event.
    let out = ch.on_frame(Frame::Ack { id: slower }, t0 + secs(2));
    assert_eq!(out.events.len(), 1);

    let t1 = t0 + secs(3);
    let (fast, _) = ch.send(SHOT, t1);
    let out = ch.on_frame(Frame::Ack { id: fast }, t1 + Duration::from_millis(100));
    assert!(out.events.contains(&ChannelEvent::PeerRecovered {
        rtt: Duration::from_millis(100)
    }));
    assert!(!ch.is_stalled());
}

#[test]
fn test_ids_increase_and_reset() {
    let mut ch = ReliableChannel::default();
    let t0 = Instant::now();
    let ids: Vec<_> = (0..3).map(|_| ch.send(SHOT, t0).0).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(ch.pending_ids().collect::<Vec<_>>(), ids);

    ch.on_frame(Frame::Data { id: 1, msg: SHOT }, t0);
    ch.reset();
    assert!(!ch.has_pending());
    assert_eq!(ch.send(SHOT, t0).0, 1);
    // Dedup state is gone too.
    let out = ch.on_frame(Frame::Data { id: 1, msg: SHOT }, t0);
    assert_eq!(out.events, vec![ChannelEvent::Delivered(SHOT)]);
}

#[test]
fn test_resend_all_restarts_timers() {
    let mut ch = ReliableChannel::new(ChannelConfig {
        max_retries: 1,
        ..ChannelConfig::default()
    });
    let t0 = Instant::now();
    let (a, _) = ch.send(SHOT, t0);
    let (b, _) = ch.send(Message::Shot { row: 1, col: 1 }, t0);
    assert_eq!(ch.poll_timers(t0 + secs(1)).outbound.len(), 2);

    let t1 = t0 + secs(30);
    let frames = ch.resend_all(t1);
    let ids: Vec<_> = frames
        .iter()
        .map(|f| match f {
            Frame::Data { id, .. } => *id,
            other => panic!("unexpected {:?}", other),
        })
        .collect();
    assert_eq!(ids, vec![a, b]);
    assert_eq!(ch.next_deadline(), Some(t1 + secs(1)));
    // Retry budget carries over: the next deadline abandons both.
    let out = ch.poll_timers(t1 + secs(1));
    assert_eq!(out.events.len(), 2);
}

#[test]
fn test_heartbeat_and_hello_ignored() {
    let mut ch = ReliableChannel::default();
    let t0 = Instant::now();
    assert_eq!(ch.on_frame(Frame::Heartbeat, t0), Default::default());
    assert_eq!(ch.on_frame(Frame::Hello { version: 1 }, t0), Default::default());
}
