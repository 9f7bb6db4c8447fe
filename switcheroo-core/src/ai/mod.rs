//! Heuristic move selection.
//!
//! The AI plays one ply deep with tactical probes on top:
//!
//! 1. [`ordering`] scores every legal move cheaply and spots immediate wins
//!    and losses.
//! 2. [`search`] evaluates each candidate with [`eval`], checks forced wins
//!    and forcing replies, and applies the difficulty policy from [`config`].

pub mod config;
pub mod eval;
pub mod ordering;
pub mod search;
mod tactics;

use rand::Rng;

use crate::progress::Probe;
use crate::{Board, Player, Silent, SwapRule};

pub use config::{AiConfig, BlunderKind, Difficulty, Weights};
pub use eval::{EvaluationBreakdown, SCORE_LOSS, SCORE_MAX, SCORE_WIN};
pub use ordering::{Candidate, OrderedMoves, MAX_ORDERED_MOVES};
pub use search::{evaluate_move, find_best_move, Decision, MoveAssessment};

/// Evaluate `board` from `perspective` with `to_move` on turn.
pub fn evaluate(board: &Board, to_move: Player, perspective: Player, config: &AiConfig) -> i32 {
    eval::assess(board, to_move, perspective, config, &mut Probe::new(&mut Silent)).total
}

/// Evaluate from `player`'s point of view with `player` to move.
pub fn evaluate_board(board: &Board, player: Player, config: &AiConfig) -> i32 {
    evaluate(board, player, player, config)
}

/// Per-feature contributions for `player` to move.
pub fn evaluate_with_breakdown(board: &Board, player: Player, config: &AiConfig) -> EvaluationBreakdown {
    eval::assess(board, player, player, config, &mut Probe::new(&mut Silent))
}

/// Ordered candidates for `player`, as the search sees them.
pub fn ordered_moves<R: Rng + ?Sized>(board: &Board, player: Player, config: &AiConfig, rng: &mut R) -> OrderedMoves {
    ordering::generate(board, player, config, rng, &mut Probe::new(&mut Silent))
}

/// Can `player` connect with one move?
pub fn immediate_win_available(board: &Board, player: Player, rule: SwapRule) -> bool {
    tactics::immediate_win_available(board, player, rule, &mut Probe::new(&mut Silent))
}

/// Does every reply to the position `after` leave `mover` a winning move?
pub fn creates_forced_win(after: &Board, mover: Player, rule: SwapRule) -> bool {
    tactics::creates_forced_win(after, mover, rule, &mut Probe::new(&mut Silent))
}

/// Does `attacker` have a Swap the defender cannot answer safely?
pub fn forcing_move_available(board: &Board, attacker: Player, rule: SwapRule) -> bool {
    tactics::forcing_move_available(board, attacker, rule, &mut Probe::new(&mut Silent))
}
