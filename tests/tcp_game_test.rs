use std::time::Duration;

use battlegrid::transport::reconnect::{Connector, HeartbeatConfig, TcpAcceptor, TcpConnector};
use battlegrid::transport::Transport;
use battlegrid::{
    AiPlayer, ChannelConfig, Frame, GameSession, HeartbeatTransport, Message, OpponentKind,
    PeerNode, ReliableLink, Rules, ShotReport, Side, TcpTransport,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

async fn tcp_pair() -> (TcpTransport, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (client, server) = tokio::join!(TcpTransport::connect(addr), listener.accept());
    (client.unwrap(), server.unwrap().0)
}

#[tokio::test]
async fn test_frames_cross_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (client, server) = tokio::join!(TcpTransport::connect(addr), listener.accept());
    let mut client = client.unwrap();
    let mut server = TcpTransport::new(server.unwrap().0);

    let frames = [
        Frame::Hello { version: 1 },
        Frame::Data {
            id: 7,
            msg: Message::Result {
                row: 9,
                col: 0,
                result: ShotReport::Sunk,
            },
        },
        Frame::Ack { id: 7 },
        Frame::Heartbeat,
    ];
    for frame in frames {
        client.send(frame).await.unwrap();
    }
    for frame in frames {
        assert_eq!(server.recv().await.unwrap(), frame);
    }
}

#[tokio::test]
async fn test_zero_length_frame_rejected() {
    let (mut transport, mut raw) = tcp_pair().await;
    raw.write_all(&0u32.to_be_bytes()).await.unwrap();
    let err = transport.recv().await.unwrap_err();
    assert!(err.to_string().contains("length"));
}

#[tokio::test]
async fn test_oversized_frame_rejected() {
    let (mut transport, mut raw) = tcp_pair().await;
    raw.write_all(&(1024u32 * 1024).to_be_bytes()).await.unwrap();
    let err = transport.recv().await.unwrap_err();
    assert!(err.to_string().contains("too large"));
}

#[tokio::test]
async fn test_closed_peer_is_an_error() {
    let (mut transport, raw) = tcp_pair().await;
    drop(raw);
    assert!(transport.recv().await.is_err());
}

#[tokio::test]
async fn test_heartbeats_are_filtered_and_idle_times_out() {
    let (client, raw) = tcp_pair().await;
    let mut server = TcpTransport::new(raw);
    let mut quiet = HeartbeatTransport::new(
        client,
        Duration::from_millis(20),
        Duration::from_millis(150),
    );

    server.send(Frame::Heartbeat).await.unwrap();
    server.send(Frame::Ack { id: 3 }).await.unwrap();
    assert_eq!(quiet.recv().await.unwrap(), Frame::Ack { id: 3 });

    // The server never answers: our heartbeats go out, then we give up.
    let err = quiet.recv().await.unwrap_err();
    assert!(err.to_string().contains("idle"));
    assert_eq!(server.recv().await.unwrap(), Frame::Heartbeat);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ai_match_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let heartbeat = HeartbeatConfig::default();
    let mut acceptor = TcpAcceptor::new(listener, Duration::from_secs(5), heartbeat);
    let mut connector = TcpConnector::new(addr, heartbeat);

    let (host_t, join_t) = tokio::join!(acceptor.accept(), connector.connect());
    let host_link = ReliableLink::new(host_t.unwrap(), ChannelConfig::default());
    let join_link = ReliableLink::new(join_t.unwrap(), ChannelConfig::default());

    let mut host = PeerNode::new(
        Box::new(AiPlayer::new()),
        GameSession::new(Rules::default(), OpponentKind::Remote),
        host_link,
    );
    let mut joiner = PeerNode::new(
        Box::new(AiPlayer::new()),
        GameSession::new(Rules::default(), OpponentKind::Remote),
        join_link,
    );
    let mut rng1 = SmallRng::seed_from_u64(100);
    let mut rng2 = SmallRng::seed_from_u64(200);
    let (r1, r2) = tokio::join!(
        host.run(&mut rng1, Side::Local),
        joiner.run(&mut rng2, Side::Opponent)
    );
    let (r1, r2) = (r1.unwrap(), r2.unwrap());
    assert_eq!(r1.winner.other(), r2.winner);
    assert_eq!(r1.shots_fired, r2.shots_received);
}
