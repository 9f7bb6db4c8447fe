//! Static position evaluation.
//!
//! Five weighted features are scored for both sides and differenced:
//!
//! ```text
//! connection     zone rows covered, row links, branching, edge bonuses
//! bridge         empty cells two friendly pieces could join through
//! swap pressure  swapped pieces and normal pieces touching enemy normals
//! blocking       central zone pieces and contact with enemy pieces
//! mobility       legal move count
//! ```
//!
//! A sixth term, development, is added unweighted and pushes pieces off the
//! two back ranks.

use serde::{Deserialize, Serialize};

use crate::progress::Probe;
use crate::{Board, Player, Pos, BOARD_COLS, CELL_COUNT, WIN_START_ROW, ZONE_ROWS};

use super::config::AiConfig;
use super::tactics;

/// Score of a won position before the move-count adjustment.
pub const SCORE_WIN: i32 = 30000;
/// Score of a lost position before the move-count adjustment.
pub const SCORE_LOSS: i32 = -30000;
/// Every score is clamped to `-SCORE_MAX..=SCORE_MAX`.
pub const SCORE_MAX: i32 = 32000;

/// Extra margin on the loss score when the opponent holds a forcing move.
pub(crate) const FORCED_LOSS_MARGIN: i32 = 1000;

const MAX_BRANCHING_PER_COMPONENT: u8 = 12;

/// Cells of the win zone.
const ZONE_CELLS: u32 = 0x0FFF_FFF0;

/// Columns 1 and 2 of every zone row.
const ZONE_CENTER: u32 = 0x0666_6660;

const fn build_diagonal_masks() -> [u32; CELL_COUNT] {
    let mut masks = [0u32; CELL_COUNT];
    let mut idx = 0;
    while idx < CELL_COUNT {
        let row = (idx / BOARD_COLS as usize) as i8;
        let col = (idx % BOARD_COLS as usize) as i8;
        let mut dir = 1;
        while dir < 8 {
            let r = row + crate::DIR_ROW[dir];
            let c = col + crate::DIR_COL[dir];
            if r >= 0 && r < crate::BOARD_ROWS as i8 && c >= 0 && c < BOARD_COLS as i8 {
                masks[idx] |= 1 << (r as u32 * BOARD_COLS as u32 + c as u32);
            }
            dir += 2;
        }
        idx += 1;
    }
    masks
}

/// Diagonal part of each cell's neighbourhood.
const DIAGONAL_MASKS: [u32; CELL_COUNT] = build_diagonal_masks();

/// Weighted contribution of each feature to an evaluation.
///
/// For decided positions every feature is zero and `total` holds the
/// terminal score.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct EvaluationBreakdown {
    pub connection: i32,
    pub bridge: i32,
    pub swap_pressure: i32,
    pub blocking: i32,
    pub mobility: i32,
    pub development: i32,
    pub total: i32,
}

impl EvaluationBreakdown {
    fn decided(total: i32) -> EvaluationBreakdown {
        EvaluationBreakdown { total, ..EvaluationBreakdown::default() }
    }
}

#[inline]
pub(crate) fn clamp_score(value: i32) -> i32 {
    value.clamp(-SCORE_MAX, SCORE_MAX)
}

/// Move count folded into 15 bits, as used by terminal scores.
#[inline]
pub(crate) fn ply_bias(board: &Board) -> i32 {
    (board.move_count() & 0x7FFF) as i32
}

/// Zone-row coverage of one player's connected groups.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub(crate) struct ConnectionMetrics {
    /// Zone rows touched by any group (bit 0 = zone row 1).
    pub row_mask: u8,
    /// Adjacent zone-row pairs, summed over groups.
    pub row_links: u8,
    pub branching: u8,
    /// Row mask of the group covering the most zone rows.
    pub best_component: u8,
}

impl ConnectionMetrics {
    pub(crate) fn measure(board: &Board, player: Player) -> ConnectionMetrics {
        let own = board.occupancy(player);
        let mut metrics = ConnectionMetrics::default();
        let mut unvisited = own;

        // Groups come out in order of their lowest cell.
        while unvisited != 0 {
            let mut group = unvisited & unvisited.wrapping_neg();
            loop {
                let grown = group | (Pos::iter_mask(group).fold(0, |acc, p| acc | p.neighbors()) & own);
                if grown == group {
                    break;
                }
                group = grown;
            }
            unvisited &= !group;

            let mut rows = 0u8;
            let mut branching = 0u8;
            for pos in Pos::iter_mask(group) {
                if pos.in_zone() {
                    rows |= 1 << (pos.row() - WIN_START_ROW);
                }
                if (pos.neighbors() & own).count_ones() >= 3 && branching < MAX_BRANCHING_PER_COMPONENT {
                    branching += 1;
                }
            }

            metrics.row_mask |= rows;
            metrics.row_links += (rows & (rows >> 1)).count_ones() as u8;
            metrics.branching += branching;
            if rows.count_ones() > metrics.best_component.count_ones() {
                metrics.best_component = rows;
            }
        }
        metrics
    }

    pub(crate) fn score(&self) -> i32 {
        const START: u8 = 1;
        const END: u8 = 1 << (ZONE_ROWS - 1);

        let mut score = self.row_mask.count_ones() as i32 * 12 + self.row_links as i32 * 18 + self.branching as i32 * 5;
        let has_start = self.best_component & START != 0;
        let has_end = self.best_component & END != 0;
        if has_start {
            score += 25;
        }
        if has_end {
            score += 25;
        }
        if has_start && has_end {
            score += 80;
        }
        score
    }
}

/// Empty cells with two or more friendly neighbours, counting again when two
/// of them are diagonal.
pub(crate) fn bridge_potential(board: &Board, player: Player) -> i32 {
    let own = board.occupancy(player);
    let mut bridges = 0;
    for pos in Pos::iter_mask(board.empty_mask()) {
        if (pos.neighbors() & own).count_ones() >= 2 {
            bridges += 1;
        }
        if (DIAGONAL_MASKS[pos.index()] & own).count_ones() >= 2 {
            bridges += 1;
        }
    }
    bridges
}

pub(crate) fn swap_pressure(board: &Board, player: Player) -> i32 {
    let own = board.occupancy(player);
    let own_swapped = own & board.swapped_mask();
    let enemy_normal = board.occupancy(player.opponent()) & !board.swapped_mask();

    let mut pressure = 0i32;
    for pos in Pos::iter_mask(own) {
        let touching = (pos.neighbors() & enemy_normal).count_ones() as i32;
        if own_swapped & pos.bit() != 0 {
            pressure += 3 + 2 * touching;
            if pos.neighbors() & own == 0 {
                pressure -= 2;
            }
        } else {
            pressure += touching;
        }
    }
    pressure.clamp(0, 255)
}

pub(crate) fn blocking(board: &Board, player: Player) -> i32 {
    let own = board.occupancy(player);
    let enemy = board.occupancy(player.opponent());
    let central = (own & ZONE_CENTER).count_ones() as i32 * 2;
    let contact: i32 = Pos::iter_mask(own).map(|pos| (pos.neighbors() & enemy).count_ones() as i32).sum();
    central + contact
}

pub(crate) fn mobility(board: &Board, player: Player) -> i32 {
    Pos::iter_mask(board.occupancy(player)).map(|pos| board.mobility_at(pos) as i32).sum()
}

/// Development term: penalises back-rank crowding, rewards zone presence.
pub(crate) fn development(board: &Board, player: Player) -> i32 {
    let back = board.row_mask(player, player.back_rank()).count_ones() as i32;
    let second = board.row_mask(player, player.second_rank()).count_ones() as i32;
    let victory = (board.occupancy(player) & ZONE_CELLS).count_ones() as i32;
    let rows = board.zone_rows_covered(player) as i32;

    let mut score = -150 * back;
    if back >= 2 {
        score -= (back - 1) * 100;
    }
    score -= 60 * second;
    if second >= 3 {
        score -= (second - 2) * 80;
    }
    if back + second >= 4 {
        score -= (back + second - 3) * 100;
    }

    score += 30 * victory;
    if victory >= 6 {
        score += 60;
    }
    score += 20 * rows;
    if victory >= 6 && back <= 1 {
        score += 50;
    }
    if victory < 5 {
        score -= (5 - victory) * 25;
    }
    score
}

/// Full evaluation from `perspective`'s point of view with `to_move` on turn.
pub(crate) fn assess(
    board: &Board,
    to_move: Player,
    perspective: Player,
    config: &AiConfig,
    probe: &mut Probe<'_>,
) -> EvaluationBreakdown {
    let opponent = perspective.opponent();
    let bias = ply_bias(board);

    if probe.has_won(board, perspective) {
        return EvaluationBreakdown::decided(SCORE_WIN - bias);
    }
    if probe.has_won(board, opponent) {
        return EvaluationBreakdown::decided(SCORE_LOSS + bias);
    }
    if tactics::immediate_win_available(board, to_move, config.swap_rule, probe) {
        let score = if to_move == perspective { SCORE_WIN - bias } else { SCORE_LOSS + bias };
        return EvaluationBreakdown::decided(score);
    }
    if config.forcing_check && tactics::forcing_move_available(board, opponent, config.swap_rule, probe) {
        return EvaluationBreakdown::decided(SCORE_LOSS + bias + FORCED_LOSS_MARGIN);
    }

    let weights = &config.weights;
    let diff = |f: fn(&Board, Player) -> i32| f(board, perspective) - f(board, opponent);
    let weighted = |weight: i16, d: i32| clamp_score(weight as i32 * d);

    let connection = ConnectionMetrics::measure(board, perspective).score()
        - ConnectionMetrics::measure(board, opponent).score();

    let mut breakdown = EvaluationBreakdown {
        connection: weighted(weights.connection, connection),
        bridge: weighted(weights.bridge, diff(bridge_potential)),
        swap_pressure: weighted(weights.swap_pressure, diff(swap_pressure)),
        blocking: weighted(weights.blocking, diff(blocking)),
        mobility: weighted(weights.mobility, diff(mobility)),
        development: diff(development),
        total: 0,
    };
    breakdown.total = clamp_score(
        breakdown.connection
            + breakdown.bridge
            + breakdown.swap_pressure
            + breakdown.blocking
            + breakdown.mobility
            + breakdown.development,
    );
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Difficulty;
    use crate::testing::board_from;
    use crate::{Silent, StartingLayout, SwapRule};

    fn score(board: &Board, to_move: Player, perspective: Player, config: &AiConfig) -> EvaluationBreakdown {
        let mut silent = Silent;
        assess(board, to_move, perspective, config, &mut Probe::new(&mut silent))
    }

    #[test]
    fn test_zone_masks() {
        for pos in Pos::all() {
            assert_eq!(ZONE_CELLS & pos.bit() != 0, pos.in_zone());
            assert_eq!(ZONE_CENTER & pos.bit() != 0, pos.in_zone() && (pos.col() == 1 || pos.col() == 2));
        }
    }

    #[test]
    fn test_diagonal_masks_are_subset_of_neighbors() {
        for pos in Pos::all() {
            let diag = DIAGONAL_MASKS[pos.index()];
            assert_eq!(diag & !pos.neighbors(), 0);
            for other in Pos::iter_mask(diag) {
                assert!(other.row() != pos.row() && other.col() != pos.col());
            }
        }
        assert_eq!(DIAGONAL_MASKS[Pos::from_row_col(3, 1).index()].count_ones(), 4);
        assert_eq!(DIAGONAL_MASKS[Pos::from_row_col(0, 0).index()].count_ones(), 1);
    }

    #[test]
    fn test_connection_metrics() {
        // One group spanning zone rows 1-3, one isolated piece on row 6
        let board = board_from(["....", "W...", "WW..", ".W..", "....", "....", "...W", "...."]);
        let metrics = ConnectionMetrics::measure(&board, Player::White);
        assert_eq!(metrics.row_mask, 0b100111);
        assert_eq!(metrics.row_links, 2);
        // (2,0) and (2,1) each touch three friends
        assert_eq!(metrics.branching, 2);
        assert_eq!(metrics.best_component, 0b000111);
        assert_eq!(metrics.score(), 4 * 12 + 2 * 18 + 2 * 5 + 25);
    }

    #[test]
    fn test_connection_edge_bonus() {
        let board = board_from(["....", "W...", "W...", "W...", "W...", "W...", "W...", "...."]);
        let metrics = ConnectionMetrics::measure(&board, Player::White);
        assert_eq!(metrics.best_component, 0b111111);
        assert_eq!(metrics.score(), 6 * 12 + 5 * 18 + 25 + 25 + 80);
    }

    #[test]
    fn test_best_component_keeps_first_on_tie() {
        // Two groups of two rows each; the lower-index one wins the tie
        let board = board_from(["....", "W...", "W...", "....", "...W", "...W", "....", "...."]);
        let metrics = ConnectionMetrics::measure(&board, Player::White);
        assert_eq!(metrics.best_component, 0b000011);
    }

    #[test]
    fn test_branching_is_capped() {
        let board = board_from(["WWWW", "WWWW", "WWWW", "WWWW", "WWWW", "....", "....", "...."]);
        let metrics = ConnectionMetrics::measure(&board, Player::White);
        assert_eq!(metrics.branching, MAX_BRANCHING_PER_COMPONENT);
    }

    #[test]
    fn test_bridge_potential() {
        // (3,0) joins them orthogonally, (3,1) diagonally
        let board = board_from(["....", "....", "W...", "....", "W...", "....", "....", "...."]);
        assert_eq!(bridge_potential(&board, Player::White), 3);
        let board = board_from(["....", "....", "W.W.", "....", "....", "....", "....", "...."]);
        // (1,1) and (3,1): two diagonal friends each, (2,1): two orthogonal
        assert_eq!(bridge_potential(&board, Player::White), 5);
    }

    #[test]
    fn test_swap_pressure() {
        // Lone swapped piece next to two enemy normals: 3 + 4 - 2
        let board = board_from(["....", "....", ".B..", ".wB.", "....", "....", "....", "...."]);
        assert_eq!(swap_pressure(&board, Player::White), 5);
        // Swapped enemy neighbours do not count
        let board = board_from(["....", "....", ".b..", ".Wb.", "....", "....", "....", "...."]);
        assert_eq!(swap_pressure(&board, Player::White), 0);
        let board = board_from(["....", "....", "....", ".w..", "....", "....", "....", "...."]);
        assert_eq!(swap_pressure(&board, Player::White), 1);
    }

    #[test]
    fn test_blocking() {
        let board = board_from(["....", "....", ".W..", "..B.", "....", "....", "....", "W..."]);
        assert_eq!(blocking(&board, Player::White), 3);
        assert_eq!(blocking(&board, Player::Black), 3);
    }

    #[test]
    fn test_development_start_position() {
        let board = Board::new();
        // back 4, second 4, victory 4, rows 1
        let expected = -600 - 300 - 240 - 160 - 500 + 120 + 20 - 25;
        assert_eq!(development(&board, Player::White), expected);
        assert_eq!(development(&board, Player::Black), expected);
    }

    #[test]
    fn test_development_advanced() {
        let board = board_from(["....", ".W..", ".W..", ".W..", ".W..", ".W..", "W...", "...."]);
        // back 0, second 1, victory 6, rows 6
        assert_eq!(development(&board, Player::White), -60 + 180 + 60 + 120 + 50);
    }

    #[test]
    fn test_start_position_is_symmetric() {
        let config = AiConfig::new(SwapRule::Classic, Difficulty::Easy, Player::White);
        for layout in [StartingLayout::Standard, StartingLayout::Midfield] {
            let board = Board::with_layout(layout);
            let white = score(&board, Player::White, Player::White, &config);
            let black = score(&board, Player::Black, Player::Black, &config);
            assert_eq!(white.total, 0, "{layout}");
            assert_eq!(black.total, 0, "{layout}");
        }
    }

    #[test]
    fn test_won_positions() {
        let config = AiConfig::new(SwapRule::Classic, Difficulty::Expert, Player::White);
        let mut board = board_from(["....", "W...", "W...", "W...", "W...", "W...", "W...", "...B"]);
        for _ in 0..7 {
            board.apply_legal(crate::Move::step(Player::Black, Pos::from_row_col(7, 3), Pos::from_row_col(7, 2)), SwapRule::Classic);
            board.apply_legal(crate::Move::step(Player::Black, Pos::from_row_col(7, 2), Pos::from_row_col(7, 3)), SwapRule::Classic);
        }
        assert_eq!(board.move_count(), 14);
        assert_eq!(score(&board, Player::Black, Player::White, &config).total, SCORE_WIN - 14);
        assert_eq!(score(&board, Player::Black, Player::Black, &config).total, SCORE_LOSS + 14);
    }

    #[test]
    fn test_immediate_win_for_side_to_move() {
        let config = AiConfig::new(SwapRule::Classic, Difficulty::Easy, Player::White);
        // Five zone rows, but no single step fills row 3 without emptying another
        let board = board_from(["..B.", "W...", "W...", "....", "W...", "W...", "W...", ".W.."]);
        let white = score(&board, Player::White, Player::White, &config);
        let black = score(&board, Player::White, Player::Black, &config);
        assert_eq!(white.total, -black.total);
        assert_ne!(white.total.abs(), SCORE_WIN);

        // (4,1) can now step into row 3
        let mut near = board;
        near.set_piece(Pos::from_row_col(4, 1), Some(crate::Piece::Normal(Player::White)));
        assert_eq!(score(&near, Player::White, Player::White, &config).total, SCORE_WIN);
        assert_eq!(score(&near, Player::White, Player::Black, &config).total, SCORE_LOSS);
    }

    #[test]
    fn test_breakdown_sums_to_total() {
        let config = AiConfig::new(SwapRule::ClearsOwn, Difficulty::Easy, Player::White);
        let board = board_from(["B.B.", ".BB.", "W.B.", ".W.b", "..wB", "W...", ".W.W", "W..W"]);
        let breakdown = score(&board, Player::White, Player::White, &config);
        let sum = breakdown.connection
            + breakdown.bridge
            + breakdown.swap_pressure
            + breakdown.blocking
            + breakdown.mobility
            + breakdown.development;
        assert_eq!(breakdown.total, clamp_score(sum));
    }
}
