//! Candidate generation and move ordering.
//!
//! Each legal move gets a cheap heuristic order score, is played once on a
//! scratch board to spot immediate wins and losses, and lands in a bounded
//! buffer sorted best first.

use log::trace;
use rand::Rng;

use crate::progress::Probe;
use crate::{Board, Move, MoveKind, Player, Pos};

use super::config::AiConfig;
use super::tactics;

/// Candidates kept after ordering.
pub const MAX_ORDERED_MOVES: usize = 32;

const SELF_WIN_BONUS: i32 = 25000;
const OPPONENT_WIN_PENALTY: i32 = 12000;

/// One ordered candidate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Candidate {
    pub mov: Move,
    /// Order score including the random tiebreak.
    pub score: i32,
    /// The move wins on the spot.
    pub self_immediate: bool,
    /// After the move the opponent is connected or can connect in one move.
    pub opponent_immediate: bool,
}

/// Output of [`generate`].
#[derive(Clone, Debug, Default)]
pub struct OrderedMoves {
    /// Best first. A winning move, if found, is the only entry.
    pub candidates: Vec<Candidate>,
    /// Per-cell move enumerations performed.
    pub enumerations: u32,
}

impl OrderedMoves {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn has_self_immediate(&self) -> bool {
        self.candidates.iter().any(|c| c.self_immediate)
    }

    /// True when every candidate hands the opponent a win.
    pub fn all_opponent_immediate(&self) -> bool {
        !self.candidates.is_empty() && self.candidates.iter().all(|c| c.opponent_immediate)
    }
}

/// Back-rank pieces of `player` that have no legal move.
fn trapped_back_rank(board: &Board, player: Player, enumerations: &mut u32) -> i32 {
    let back = player.back_rank();
    let mut trapped = 0;
    for col in 0..crate::BOARD_COLS {
        let pos = Pos::from_row_col(back, col);
        if board.owner(pos) != Some(player) {
            continue;
        }
        *enumerations += 1;
        if board.mobility_at(pos) == 0 {
            trapped += 1;
        }
    }
    trapped
}

/// Heuristic score of a move before it is played.
fn order_score(board: &Board, mov: Move, config: &AiConfig, trapped: i32) -> i32 {
    let player = mov.player;
    let (from, to) = (mov.from, mov.to);
    let mover_swapped = board.swapped_mask() & from.bit() != 0;
    let advancing = player.is_advancing(from.row(), to.row());
    let mut score = 0;

    match mov.kind {
        MoveKind::Swap => {
            score += 900;
            score += if mover_swapped { 220 } else { 500 };
            if to.col() == 1 || to.col() == 2 {
                score += 150;
            }
        }
        MoveKind::Step => {
            if board.step_would_clear(from, config.swap_rule) {
                score -= 1400;
            } else if mover_swapped {
                score += 220;
            }
        }
    }

    if advancing {
        score += 400;
    }
    if to.row() == player.far_edge() {
        score += 300;
    }
    if advancing && from.row() == player.back_rank() {
        score += 1200;
    }
    if advancing && from.row() == player.second_rank() {
        score += 500;
    }

    if mov.kind == MoveKind::Step {
        if to.in_zone() {
            score += 120;
        }
        // Vacating the second rank can free pieces stuck behind it
        if from.row() == player.second_rank() {
            score += trapped * 400;
        }
    }

    if mov.reverses(config.last_opponent_move) {
        score -= 600;
    }
    if mov.reverses(config.own_previous_move) {
        score -= 700;
    }
    score
}

/// Order every legal move of `player`.
///
/// Stops early and returns only the winning move if one exists. Moves after
/// which the opponent is connected, or can connect in one move, are kept but
/// flagged and pushed down the list.
pub(crate) fn generate<R: Rng + ?Sized>(
    board: &Board,
    player: Player,
    config: &AiConfig,
    rng: &mut R,
    probe: &mut Probe<'_>,
) -> OrderedMoves {
    let opponent = player.opponent();
    let mut ordered = OrderedMoves {
        candidates: Vec::with_capacity(MAX_ORDERED_MOVES),
        enumerations: 0,
    };
    let trapped = trapped_back_rank(board, player, &mut ordered.enumerations);

    for from in Pos::iter_mask(board.occupancy(player)) {
        ordered.enumerations += 1;
        for mov in board.legal_moves_from(from) {
            let mut score = order_score(board, mov, config, trapped);

            let mut after = *board;
            after.apply_legal(mov, config.swap_rule);

            let mut opponent_immediate = false;
            if probe.has_won(&after, opponent) {
                opponent_immediate = true;
                score -= OPPONENT_WIN_PENALTY;
            } else if probe.has_won(&after, player) {
                trace!("ordering: {mov} wins immediately");
                ordered.candidates.clear();
                ordered.candidates.push(Candidate {
                    mov,
                    score: score + SELF_WIN_BONUS,
                    self_immediate: true,
                    opponent_immediate: false,
                });
                return ordered;
            } else if tactics::immediate_win_available(&after, opponent, config.swap_rule, probe) {
                opponent_immediate = true;
                score -= OPPONENT_WIN_PENALTY;
            }

            let slot = if ordered.candidates.len() < MAX_ORDERED_MOVES {
                ordered.candidates.push(Candidate { mov, score: 0, self_immediate: false, opponent_immediate });
                ordered.candidates.len() - 1
            } else {
                // First minimum wins ties
                let (min_idx, min_score) = ordered
                    .candidates
                    .iter()
                    .enumerate()
                    .fold((0, i32::MAX), |best, (i, c)| if c.score < best.1 { (i, c.score) } else { best });
                if score <= min_score {
                    continue;
                }
                ordered.candidates[min_idx] = Candidate { mov, score: 0, self_immediate: false, opponent_immediate };
                min_idx
            };
            ordered.candidates[slot].score = score + (rng.random::<u32>() & 0x0F) as i32;
        }
    }

    // Stable: equal scores keep enumeration order
    ordered.candidates.sort_by(|a, b| b.score.cmp(&a.score));
    trace!("ordering: {} candidates for {player}", ordered.candidates.len());
    ordered
}
