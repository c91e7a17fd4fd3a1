use battlegrid::{
    init_logging, AiPlayer, ChannelConfig, GameSession, InMemoryTransport, MatchReport,
    OpponentKind, PeerNode, ReliableLink, Rules, Side,
};
use rand::{rngs::SmallRng, SeedableRng};
use serde_json::json;

fn node(transport: InMemoryTransport) -> PeerNode {
    let session = GameSession::new(Rules::default(), OpponentKind::Remote);
    let link = ReliableLink::new(Box::new(transport), ChannelConfig::default());
    PeerNode::new(Box::new(AiPlayer::new()), session, link)
}

fn summary(report: &MatchReport) -> serde_json::Value {
    json!({
        "status": if report.winner == Side::Local { "Won" } else { "Lost" },
        "shots": report.shots_fired,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <seed1> <seed2>", args[0]);
        std::process::exit(1);
    }
    let seed1: u64 = args[1].parse()?;
    let seed2: u64 = args[2].parse()?;

    let mut rng1 = SmallRng::seed_from_u64(seed1);
    let mut rng2 = SmallRng::seed_from_u64(seed2);
    let (t1, t2) = InMemoryTransport::pair();
    let mut n1 = node(t1);
    let mut n2 = node(t2);

    let (r1, r2) = tokio::try_join!(n1.run(&mut rng1, Side::Local), n2.run(&mut rng2, Side::Opponent))?;

    let winner = match (r1.winner, r2.winner) {
        (Side::Local, Side::Opponent) => Some("player1"),
        (Side::Opponent, Side::Local) => Some("player2"),
        _ => None,
    };

    let result = json!({
        "player1": summary(&r1),
        "player2": summary(&r2),
        "winner": winner,
    });

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
