use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use oracle_chess::game::{GameSession, MoveSource, Phase};
use oracle_chess::moves::parse_coordinates;
use oracle_chess::oracle::{NoisyOracle, Oracle, OracleConfig, ScriptedOracle};

/// Play White against a move oracle from the terminal.
///
/// Moves are typed as coordinates (`e2e4` or `e2-e4`). `new` restarts the
/// game, `quit` leaves. Set `RUST_LOG=debug` to watch resolution decisions.
#[derive(Parser)]
#[command(name = "play")]
#[command(about = "Play chess against an untrusted move oracle")]
struct Args {
    /// File with one oracle reply per line (replayed in order)
    #[arg(short, long, value_name = "FILE")]
    replies: Option<PathBuf>,

    /// Seed for the built-in noisy oracle, used when no replies file is given
    #[arg(long, default_value = "1")]
    seed: u64,

    /// Oracle configuration as JSON
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the game state as JSON after every round
    #[arg(long)]
    json: bool,

    /// Print the prompt sent to the oracle each turn
    #[arg(long)]
    show_prompt: bool,
}

fn load_config(path: &Option<PathBuf>) -> Result<OracleConfig, String> {
    match path {
        None => Ok(OracleConfig::default()),
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            OracleConfig::from_json(&text).map_err(|e| format!("bad config {}: {e}", path.display()))
        }
    }
}

fn load_oracle(args: &Args) -> Result<Box<dyn Oracle>, String> {
    match &args.replies {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            Ok(Box::new(ScriptedOracle::new(text.lines())))
        }
        None => Ok(Box::new(NoisyOracle::new(args.seed))),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args.config).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });
    let mut oracle = load_oracle(&args).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });

    let mut game = GameSession::new();
    println!("{}", game.board());

    let stdin = io::stdin();
    loop {
        print!("White to move> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();

        match input {
            "" => continue,
            "quit" | "exit" => break,
            "new" => {
                game.initialize();
                println!("{}", game.board());
                continue;
            }
            _ => {}
        }

        let Some((from, to)) = parse_coordinates(input) else {
            println!("Enter a move like e2e4, or 'new' / 'quit'.");
            continue;
        };

        let human = match game.play_human(from, to) {
            Ok(record) => record,
            Err(e) => {
                println!("Illegal: {e}");
                continue;
            }
        };
        println!("You played {}", human.notation());

        if args.show_prompt {
            let request = game.oracle_request(&config);
            println!("--- prompt ---\n{}\n{}\n--------------", request.system_prompt(), request.user_prompt());
        }

        debug_assert_eq!(game.phase(), Phase::AwaitingOracleMove);
        let turn = match game.play_oracle_turn(oracle.as_mut(), &config) {
            Ok(turn) => turn,
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        };

        let raw = turn.raw.as_deref().unwrap_or("<no reply>");
        match &turn.source {
            MoveSource::Oracle => {
                println!("Oracle said {raw:?} and played {}", turn.notation().unwrap_or_default());
            }
            MoveSource::Fallback { reason, strategy } => {
                println!(
                    "Oracle said {raw:?} ({reason}); played {} instead ({strategy:?})",
                    turn.notation().unwrap_or_default()
                );
            }
            MoveSource::Degenerate { reason } => {
                println!("Oracle said {raw:?} ({reason}); no move available, turn passed");
            }
        }

        if args.json {
            match serde_json::to_string_pretty(&game.state()) {
                Ok(text) => println!("{text}"),
                Err(e) => eprintln!("Error: {e}"),
            }
        } else {
            println!("{}", game.board());
        }
    }
}
