use std::collections::BTreeMap;
use std::io::Write;

use clap::Parser;
use oracle_chess::fallback::fallback;
use oracle_chess::game::{GameSession, MoveSource, Phase, ResolutionError, HUMAN_SIDE};
use oracle_chess::oracle::{NoisyOracle, OracleConfig};

const DEFAULT_GAMES: usize = 20;
const DEFAULT_MAX_ROUNDS: usize = 60;

/// Pit a scripted White player against the noisy oracle and count how often
/// the oracle's replies are used, replaced by the fallback, or leave nothing
/// playable.
#[derive(Parser)]
#[command(name = "simulate")]
struct Args {
    /// Number of games to play
    #[arg(long, default_value_t = DEFAULT_GAMES)]
    games: usize,

    /// Rounds (White move plus oracle reply) per game
    #[arg(long, default_value_t = DEFAULT_MAX_ROUNDS)]
    max_rounds: usize,

    /// Seed of the first game; game N uses seed + N
    #[arg(long, default_value = "0")]
    seed: u64,
}

#[derive(Debug, Default)]
struct Tally {
    oracle: u32,
    fallback: u32,
    degenerate: u32,
    reasons: BTreeMap<&'static str, u32>,
    strategies: BTreeMap<String, u32>,
    white_stuck: u32,
}

fn reason_label(reason: &ResolutionError) -> &'static str {
    match reason {
        ResolutionError::Oracle(_) => "oracle failure",
        ResolutionError::Malformed(_) => "malformed",
        ResolutionError::Unresolved(_) => "no such piece",
        ResolutionError::Invalid(_) => "invalid move",
    }
}

fn play_game(seed: u64, max_rounds: usize, config: &OracleConfig, tally: &mut Tally) {
    let mut game = GameSession::new();
    let mut oracle = NoisyOracle::new(seed);

    for _ in 0..max_rounds {
        // White just plays its own fallback move; it is always playable on
        // any board that still has a White piece and an empty square.
        let mv = fallback(game.board(), HUMAN_SIDE);
        if game.play_human(mv.from, mv.to).is_err() {
            tally.white_stuck += 1;
            return;
        }

        let turn = match game.play_oracle_turn(&mut oracle, config) {
            Ok(turn) => turn,
            Err(e) => panic!("oracle turn refused in game {seed}: {e}"),
        };
        assert_eq!(game.phase(), Phase::AwaitingHumanMove, "oracle turn did not advance");

        match &turn.source {
            MoveSource::Oracle => tally.oracle += 1,
            MoveSource::Fallback { reason, strategy } => {
                tally.fallback += 1;
                *tally.reasons.entry(reason_label(reason)).or_default() += 1;
                *tally.strategies.entry(format!("{strategy:?}")).or_default() += 1;
            }
            MoveSource::Degenerate { reason } => {
                tally.degenerate += 1;
                *tally.reasons.entry(reason_label(reason)).or_default() += 1;
            }
        }
    }
}

fn main() {
    let args = Args::parse();
    let config = OracleConfig::default();
    let mut tally = Tally::default();

    println!(
        "Simulating {} games of up to {} rounds (seeds {}..{})",
        args.games,
        args.max_rounds,
        args.seed,
        args.seed + args.games as u64
    );

    for i in 0..args.games {
        play_game(args.seed + i as u64, args.max_rounds, &config, &mut tally);
        print!(".");
        std::io::stdout().flush().ok();
    }
    println!();

    let turns = tally.oracle + tally.fallback + tally.degenerate;
    let pct = |n: u32| if turns == 0 { 0.0 } else { 100.0 * n as f64 / turns as f64 };

    println!("\n=== Oracle turns: {turns} ===");
    println!("  oracle move used   {:>6} ({:5.1}%)", tally.oracle, pct(tally.oracle));
    println!("  fallback played    {:>6} ({:5.1}%)", tally.fallback, pct(tally.fallback));
    println!("  turn passed        {:>6} ({:5.1}%)", tally.degenerate, pct(tally.degenerate));

    println!("\n=== Why replies were rejected ===");
    for (label, count) in &tally.reasons {
        println!("  {label:<18} {count:>6}");
    }

    println!("\n=== Fallback strategies ===");
    for (label, count) in &tally.strategies {
        println!("  {label:<18} {count:>6}");
    }

    if tally.white_stuck > 0 {
        println!("\n{} games ended early: White had no playable move", tally.white_stuck);
    }
}
