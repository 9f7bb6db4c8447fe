//! Switcharoo AI Arena
//!
//! Plays AI-vs-AI matches, runs puzzle catalogs against the AI, and prints
//! position evaluations.

mod arena;
mod stats;

use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use switcheroo_core::ai::{self, AiConfig, Difficulty, EvaluationBreakdown};
use switcheroo_core::{Board, Player, PuzzleCatalog, PuzzleSource, StartingLayout, SwapRule};

use crate::arena::{run_puzzle, Arena};

#[derive(Debug, Parser)]
#[command(name = "arena", version, about = "Switcharoo AI arena")]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Play AI-vs-AI games and print a summary
    Match {
        #[arg(long, default_value = "expert")]
        white: Difficulty,
        #[arg(long, default_value = "standard")]
        black: Difficulty,
        #[arg(long, default_value_t = 10)]
        games: u64,
        /// standard, midfield, checkerboard or diagonal
        #[arg(long, default_value = "standard")]
        layout: StartingLayout,
        /// classic, clears_own, swapped_clears or swapped_clears_own
        #[arg(long, default_value = "classic")]
        rule: SwapRule,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Games reaching this many plies count as draws
        #[arg(long, default_value_t = 200)]
        max_plies: u64,
        /// JSON AI config replacing the side named by its `player` field
        #[arg(long)]
        profile: Option<PathBuf>,
        /// Seconds between progress lines
        #[arg(long, default_value_t = 5)]
        log_interval: u64,
    },
    /// Let the AI attack each puzzle in a catalog
    Puzzles {
        #[arg(long)]
        file: PathBuf,
        /// Only run puzzles for this rule
        #[arg(long)]
        rule: Option<SwapRule>,
        #[arg(long, default_value = "expert")]
        difficulty: Difficulty,
        #[arg(long, default_value_t = 10)]
        plies: u64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Print a starting layout and its evaluation for both sides
    Show {
        #[arg(long, default_value = "standard")]
        layout: StartingLayout,
        #[arg(long, default_value = "classic")]
        rule: SwapRule,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    // Stop cleanly between moves on Ctrl-C
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        println!("\n\nInterrupt received, finishing the current move...");
        r.store(false, Ordering::SeqCst);
    })?;

    match args.cmd {
        Cmd::Match { white, black, games, layout, rule, seed, max_plies, profile, log_interval } => {
            let mut white = AiConfig::new(rule, white, Player::White);
            let mut black = AiConfig::new(rule, black, Player::Black);
            if let Some(path) = profile {
                let config = load_profile(&path)?;
                info!("profile {} replaces {}", path.display(), config.player);
                match config.player {
                    Player::White => white = config,
                    Player::Black => black = config,
                }
            }
            run_match(Arena::new(white, black, layout, rule, max_plies), games, seed, &running, log_interval)
        }
        Cmd::Puzzles { file, rule, difficulty, plies, seed } => {
            run_puzzles(&file, rule, difficulty, plies, seed, &running)
        }
        Cmd::Show { layout, rule } => {
            show(layout, rule);
            Ok(())
        }
    }
}

fn load_profile(path: &Path) -> Result<AiConfig, Box<dyn Error>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn run_match(
    mut arena: Arena,
    games: u64,
    seed: u64,
    running: &AtomicBool,
    log_interval: u64,
) -> Result<(), Box<dyn Error>> {
    println!("Switcharoo AI Arena");
    println!("===================");
    println!("White: {}  Black: {}", arena.white.difficulty, arena.black.difficulty);
    println!("Layout: {}  Rule: {}", arena.layout, arena.rule);
    println!("Games: {}  Max plies: {}  Seed: {}", games, arena.max_plies, seed);
    println!();

    let mut rng = StdRng::seed_from_u64(seed);
    let start = Instant::now();
    let played = arena.run(games, &mut rng, running, log_interval)?;

    println!("\n===================");
    if played < games {
        println!("Match interrupted after {} of {} games", played, games);
    } else {
        println!("Match complete!");
    }
    println!("===================");
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());
    println!();
    arena.stats.print_summary();
    Ok(())
}

fn run_puzzles(
    file: &Path,
    rule: Option<SwapRule>,
    difficulty: Difficulty,
    plies: u64,
    seed: u64,
    running: &AtomicBool,
) -> Result<(), Box<dyn Error>> {
    let mut catalog = PuzzleCatalog::from_reader(BufReader::new(File::open(file)?))?;
    if let Some(rule) = rule {
        catalog = catalog.filtered(rule);
    }
    if catalog.is_empty() {
        warn!("no puzzles to run in {}", file.display());
    }

    println!("Switcharoo Puzzle Run");
    println!("=====================");
    println!("Catalog: {}  Puzzles: {}  AI: {}  Plies: {}", file.display(), catalog.len(), difficulty, plies);
    println!();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut solved = 0;
    let mut attempted = 0;
    for puzzle in catalog.iter() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let result = run_puzzle(puzzle, difficulty, plies, &mut rng, running)?;
        attempted += 1;
        if result.solved {
            solved += 1;
        }
        let first = result.first_move.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "  [{}] {:<24} {:<20} plies={:<3} first={}",
            if result.solved { "x" } else { " " },
            result.id,
            puzzle.swap_rule.as_str(),
            result.plies,
            first
        );
    }

    println!();
    println!("Solved {} of {} puzzles", solved, attempted);
    Ok(())
}

fn show(layout: StartingLayout, rule: SwapRule) {
    let board = Board::with_layout(layout);
    println!("Layout: {}  Rule: {}", layout, rule);
    println!();
    print!("{}", board);
    println!();

    for player in Player::all() {
        let config = AiConfig::new(rule, Difficulty::Expert, player);
        let breakdown = ai::evaluate_with_breakdown(&board, player, &config);
        println!(
            "{} to move: {} legal moves, {} zone rows covered",
            player,
            board.legal_moves(player).len(),
            board.zone_rows_covered(player)
        );
        print_breakdown(&breakdown);
        println!();
    }
}

fn print_breakdown(breakdown: &EvaluationBreakdown) {
    println!("  connection:    {:>7}", breakdown.connection);
    println!("  bridge:        {:>7}", breakdown.bridge);
    println!("  swap pressure: {:>7}", breakdown.swap_pressure);
    println!("  blocking:      {:>7}", breakdown.blocking);
    println!("  mobility:      {:>7}", breakdown.mobility);
    println!("  development:   {:>7}", breakdown.development);
    println!("  total:         {:>7}", breakdown.total);
}
