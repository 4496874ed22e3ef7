use clap::Parser;
use client::game::BoardEvent;
use client::input::{parse_command, Command, HELP};
use client::network::{BoardClient, ClientError};
use client::rendering::render_board;
use log::{debug, info, warn};
use shared::{GoalList, JoinRequest, Rgb};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tokio::time::interval;

#[derive(Parser, Debug)]
#[command(author, version, about = "Join a shared bingo board", long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Marker color; a random one is picked when omitted
    #[arg(short, long, num_args = 3, value_names = ["R", "G", "B"])]
    color: Option<Vec<u8>>,

    /// Watch the board without playing
    #[arg(long, conflicts_with = "color")]
    spectate: bool,

    /// Log every mark made by other players
    #[arg(short, long)]
    verbose: bool,

    /// Goal description file, must match the server's
    #[arg(short, long, default_value = "bingo.json")]
    goals: PathBuf,

    /// Network poll interval in milliseconds
    #[arg(long, default_value = "100")]
    tick_ms: u64,
}

fn load_goals(path: &PathBuf) -> GoalList {
    let loaded = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| GoalList::from_json_str(&json).map_err(|e| e.to_string()));
    match loaded {
        Ok(goals) => {
            info!("Loaded {} goals from {}", goals.len(), path.display());
            goals
        }
        Err(e) => {
            warn!("No goal texts from {}: {}", path.display(), e);
            GoalList::from_descriptions(Vec::<String>::new())
        }
    }
}

fn report(event: &BoardEvent, goals: &GoalList, client: &BoardClient, verbose: bool) {
    let own = client.board().own_color() == Some(event.color);
    if verbose && !own {
        let goal = client
            .board()
            .board()
            .cell(event.index)
            .map(|cell| goals.describe(cell.goal_index()))
            .unwrap_or_default();
        info!(
            "{} {} cell {} ({})",
            event.color,
            if event.added { "marked" } else { "unmarked" },
            event.index,
            goal
        );
    }
    if !event.exposed.is_empty() {
        println!("Revealed cells {:?}", event.exposed);
    }
    if !event.hidden.is_empty() {
        println!("Hid cells {:?}", event.hidden);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let goals = load_goals(&args.goals);

    let request = if args.spectate {
        JoinRequest::Spectator
    } else {
        let color = match args.color.as_deref() {
            Some(&[r, g, b]) => Rgb::new(r, g, b),
            _ => Rgb::new(rand::random(), rand::random(), rand::random()),
        };
        JoinRequest::Player { color }
    };

    info!("Connecting to: {}", args.server);
    let mut client = BoardClient::connect(&args.server, request).await?;
    if let Some(color) = client.board().own_color() {
        println!("Playing as {}", color);
    } else {
        println!("Spectating");
    }
    println!("{}", render_board(client.board(), &goals));
    println!("{}", HELP);

    let tick = Duration::from_millis(args.tick_ms.max(1));
    let mut poll_interval = interval(tick);
    let mut lines = BufReader::new(stdin()).lines();

    loop {
        tokio::select! {
            _ = poll_interval.tick() => {
                match client.poll(tick / 2).await {
                    Ok(events) => {
                        for event in &events {
                            report(event, &goals, &client, args.verbose);
                        }
                    }
                    Err(ClientError::Disconnected) => {
                        println!("Server closed the connection");
                        break;
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                match parse_command(&line, client.board().geometry()) {
                    Ok(Command::Mark(index)) => match client.mark(index)? {
                        Some(event) => {
                            println!(
                                "{} cell {}",
                                if event.added { "Marked" } else { "Unmarked" },
                                index
                            );
                            report(&event, &goals, &client, args.verbose);
                        }
                        None if client.is_spectator() => println!("Spectators cannot mark cells"),
                        None => println!("Cell {} is not visible yet", index),
                    },
                    Ok(Command::Show) => println!("{}", render_board(client.board(), &goals)),
                    Ok(Command::Help) => println!("{}", HELP),
                    Ok(Command::Quit) => break,
                    Err(e) => println!("{}", e),
                }
            }
        }
    }

    info!("Leaving board");
    Ok(())
}
