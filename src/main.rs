use battlegrid::{
    init_logging,
    transport::reconnect::{Connector, HeartbeatConfig, ReconnectPolicy, TcpAcceptor, TcpConnector},
    transport::Transport,
    ui::print_player_view,
    Action, AiPlayer, ChannelConfig, CliPlayer, Effect, GameSession, OpponentKind, PeerNode, Phase,
    Player, ReliableLink, Rules, Side, TurnUpdate,
};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::net::TcpListener;
use tokio::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PlayerType {
    Human,
    Ai,
}

#[derive(clap::Args, Clone, Debug)]
struct GameArgs {
    #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
    seed: Option<u64>,
    #[arg(long, value_enum, default_value_t = PlayerType::Human)]
    player: PlayerType,
    #[arg(long, help = "Allow ships to touch, diagonals included")]
    allow_touching: bool,
    #[arg(long, default_value_t = 600, help = "Computer thinking time in milliseconds")]
    think_ms: u64,
}

#[derive(clap::Args, Clone, Debug)]
struct NetArgs {
    #[arg(long, default_value_t = 1000, help = "Retransmission interval in milliseconds")]
    retry_ms: u64,
    #[arg(long, default_value_t = 5, help = "Retransmissions before a message is dropped")]
    max_retries: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Play against the computer on this machine.
    Local {
        #[command(flatten)]
        game: GameArgs,
    },
    /// Host a networked game and wait for a peer to connect.
    Host {
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
        #[command(flatten)]
        game: GameArgs,
        #[command(flatten)]
        net: NetArgs,
    },
    /// Join a networked game hosted by a peer.
    Join {
        #[arg(long, default_value = "127.0.0.1:8080")]
        connect: String,
        #[command(flatten)]
        game: GameArgs,
        #[command(flatten)]
        net: NetArgs,
    },
}

fn make_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(s) => {
            println!("Using fixed seed: {} (game will be reproducible)", s);
            SmallRng::seed_from_u64(s)
        }
        None => {
            let mut seed_rng = rand::rng();
            SmallRng::from_rng(&mut seed_rng)
        }
    }
}

fn rules(game: &GameArgs) -> Rules {
    Rules {
        no_touching: !game.allow_touching,
        ..Rules::default()
    }
}

fn make_player(kind: PlayerType) -> Box<dyn Player + Send> {
    match kind {
        PlayerType::Human => Box::new(CliPlayer::new()),
        PlayerType::Ai => Box::new(AiPlayer::new()),
    }
}

fn channel_config(net: &NetArgs) -> ChannelConfig {
    ChannelConfig {
        retry_interval: Duration::from_millis(net.retry_ms),
        max_retries: net.max_retries,
        ..ChannelConfig::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Local { game } => run_local(game).await,
        Commands::Host { bind, game, net } => {
            println!("Hosting at {}, waiting for a player to connect...", bind);
            let listener = TcpListener::bind(&bind).await?;
            let mut acceptor = TcpAcceptor::new(listener, Duration::from_secs(30), HeartbeatConfig::default());
            let transport = acceptor.accept().await?;
            println!("Player connected.");
            run_remote(game, net, transport, Box::new(acceptor), Side::Local).await
        }
        Commands::Join { connect, game, net } => {
            println!("Connecting to {}...", connect);
            let mut connector = TcpConnector::new(connect, HeartbeatConfig::default());
            let transport = connector.connect().await?;
            println!("Connected successfully!");
            run_remote(game, net, transport, Box::new(connector), Side::Opponent).await
        }
    }
}

async fn run_remote(
    game: GameArgs,
    net: NetArgs,
    transport: Box<dyn Transport>,
    connector: Box<dyn Connector>,
    first: Side,
) -> anyhow::Result<()> {
    let mut rng = make_rng(game.seed);
    let session = GameSession::new(rules(&game), OpponentKind::Remote);
    let link = ReliableLink::new(transport, channel_config(&net));
    let think = match game.player {
        PlayerType::Ai => Duration::from_millis(game.think_ms),
        PlayerType::Human => Duration::ZERO,
    };
    let mut node = PeerNode::new(make_player(game.player), session, link)
        .with_reconnect(connector, ReconnectPolicy::default())
        .with_think_time(think);
    match node.run(&mut rng, first).await {
        Ok(report) => {
            print_player_view(node.session());
            println!(
                "\n{} after {} shots.",
                if report.winner == Side::Local { "VICTORY" } else { "DEFEAT" },
                report.shots_fired
            );
        }
        Err(e) => eprintln!("Game ended with an error: {:#}", e),
    }
    Ok(())
}

async fn run_local(game: GameArgs) -> anyhow::Result<()> {
    let mut rng = make_rng(game.seed);
    let mut session = GameSession::new(rules(&game), OpponentKind::Computer);
    let mut player = make_player(game.player);
    let think = Duration::from_millis(game.think_ms);

    session.anchor_boards();
    player
        .place_fleet(&mut rng, &mut session)
        .map_err(|e| anyhow::anyhow!(e))?;
    match session.start_play(&mut rng)? {
        Action::Ok(_) => {}
        other => return Err(anyhow::anyhow!("could not start play: {:?}", other)),
    }

    while session.phase() == Phase::Play {
        if session.can_fire() {
            print_player_view(&session);
            let (row, col) = player
                .select_target(&mut rng, &session)
                .ok_or_else(|| anyhow::anyhow!("no target chosen"))?;
            match session.fire_shot(row, col)? {
                Action::Ok(Effect::Shot(record)) => player.handle_shot_result(&record),
                Action::Repeat => println!("Already fired there."),
                Action::Invalid(reason) => println!("{}", reason),
                Action::Ok(_) => {}
            }
        } else {
            tokio::time::sleep(think).await;
            if let Action::Ok(Effect::Shot(record)) = session.computer_turn(&mut rng)? {
                player.handle_opponent_shot(&record);
                if let TurnUpdate::Won(Side::Opponent) = record.update {
                    println!("The computer sank your last ship.");
                }
            }
        }
    }

    print_player_view(&session);
    match session.winner() {
        Some(Side::Local) => println!("\nVICTORY! You have sunk all enemy ships!"),
        Some(Side::Opponent) => println!("\nDEFEAT. All your ships have been destroyed."),
        None => {}
    }
    Ok(())
}
