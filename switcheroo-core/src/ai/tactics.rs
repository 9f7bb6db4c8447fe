//! One- and two-ply tactical probes.
//!
//! Every win test goes through [`Probe`] so long searches keep ticking the
//! host's progress sink.

use crate::progress::Probe;
use crate::{Board, Move, MoveKind, Player, Pos, SwapRule};

/// Zone rows a player must already cover before a one-move win is possible.
const MIN_ROWS_FOR_IMMEDIATE_WIN: u8 = 5;

/// Every legal move of `player`, applied to a copy of `board`.
fn children(board: &Board, player: Player, rule: SwapRule) -> impl Iterator<Item = (Move, Board)> + '_ {
    Pos::iter_mask(board.occupancy(player)).flat_map(move |from| {
        board.legal_moves_from(from).into_iter().map(move |mov| {
            let mut child = *board;
            child.apply_legal(mov, rule);
            (mov, child)
        })
    })
}

/// Can `player` win with a single move?
pub(crate) fn immediate_win_available(board: &Board, player: Player, rule: SwapRule, probe: &mut Probe<'_>) -> bool {
    if board.zone_rows_covered(player) < MIN_ROWS_FOR_IMMEDIATE_WIN {
        return false;
    }
    children(board, player, rule).any(|(_, child)| probe.has_won(&child, player))
}

/// After `mover` has played into `after`, does every opponent reply leave
/// `mover` an immediate win without winning itself?
///
/// An opponent with no replies counts as forced.
pub(crate) fn creates_forced_win(after: &Board, mover: Player, rule: SwapRule, probe: &mut Probe<'_>) -> bool {
    let opponent = mover.opponent();
    for (_, reply) in children(after, opponent, rule) {
        if probe.has_won(&reply, opponent) {
            return false;
        }
        if !immediate_win_available(&reply, mover, rule, probe) {
            return false;
        }
    }
    true
}

/// Does `attacker` have a Swap that wins outright or leaves the defender
/// without a safe reply?
///
/// A safe reply neither hands `attacker` the win nor leaves `attacker` an
/// immediate win.
pub(crate) fn forcing_move_available(board: &Board, attacker: Player, rule: SwapRule, probe: &mut Probe<'_>) -> bool {
    let defender = attacker.opponent();
    for (mov, after) in children(board, attacker, rule) {
        if mov.kind != MoveKind::Swap {
            continue;
        }
        if probe.has_won(&after, attacker) {
            return true;
        }

        let mut has_safe_reply = false;
        for (_, reply) in children(&after, defender, rule) {
            if probe.has_won(&reply, attacker) {
                continue;
            }
            if !immediate_win_available(&reply, attacker, rule, probe) {
                has_safe_reply = true;
                break;
            }
        }
        if !has_safe_reply {
            return true;
        }
    }
    false
}
