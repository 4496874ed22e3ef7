use clap::{Parser, ValueEnum};
use log::{debug, info};
use server::game::GameState;
use server::identity::{HostAddressResolver, IdentityResolver, SocketAddressResolver};
use server::network::Server;
use shared::{BoardGenerator, GoalList, DEFAULT_PORT};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum IdentityMode {
    /// One player per remote host; reconnecting keeps earlier marks
    Host,
    /// One player per socket
    Socket,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Host a shared bingo board", long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Board dimension N (the board has N×N cells)
    #[arg(short = 'n', long = "size")]
    board_size: usize,

    /// Seed for the board layout; a random one is picked and logged when omitted
    #[arg(short, long)]
    seed: Option<u64>,

    /// Goal description file
    #[arg(short, long, default_value = "bingo.json")]
    goals: PathBuf,

    /// How connections are mapped to players
    #[arg(long, value_enum, default_value_t = IdentityMode::Host)]
    identity: IdentityMode,

    /// Maximum number of simultaneous connections
    #[arg(long, default_value = "64")]
    max_clients: usize,
}

/// Shown on stdout regardless of log level so any board can be recreated
fn board_banner(size: usize, seed: u64) -> String {
    format!(
        "Board {}x{} generated with seed {} (pass --seed {} to reproduce it)",
        size, size, seed, seed
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let goals = GoalList::from_json_str(&std::fs::read_to_string(&args.goals)?)?;
    info!("Loaded {} goals from {}", goals.len(), args.goals.display());

    let generator = match args.seed {
        Some(seed) => BoardGenerator::new(seed),
        None => BoardGenerator::from_entropy(),
    };
    let board = generator.generate_board(goals.len(), args.board_size)?;
    println!("{}", board_banner(args.board_size, generator.seed()));
    for (index, goal) in board.goal_indices().into_iter().enumerate() {
        debug!("Cell {}: {}", index, goals.describe(goal));
    }

    let resolver: Box<dyn IdentityResolver> = match args.identity {
        IdentityMode::Host => Box::new(HostAddressResolver),
        IdentityMode::Socket => Box::new(SocketAddressResolver),
    };

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::bind(&address, GameState::new(board), resolver, args.max_clients).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
