//! Candidate evaluation and the selection policy.

use log::{debug, trace};
use rand::Rng;
use serde::Serialize;

use crate::progress::Probe;
use crate::{Board, Error, Move, Player, Progress, Result};

use super::config::{AiConfig, BlunderKind, Difficulty};
use super::eval::{self, EvaluationBreakdown, FORCED_LOSS_MARGIN, SCORE_LOSS, SCORE_WIN};
use super::ordering::{self, OrderedMoves};
use super::tactics;

/// Penalty for moving a piece straight back to where it stood two plies ago.
const SELF_REVERSAL_PENALTY: i32 = 2000;

/// The move chosen by [`find_best_move`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub mov: Move,
    /// The move was picked by a deliberate mistake.
    pub blunder: bool,
    /// Evaluation after the move, when diagnostics are enabled.
    pub breakdown: Option<EvaluationBreakdown>,
    /// Candidates that survived ordering.
    pub candidates: usize,
    pub win_checks: u64,
}

/// A candidate after deeper analysis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Evaluated {
    mov: Move,
    eval: i32,
    self_win: bool,
    opponent_wins_next: bool,
    forced_win: bool,
    opponent_forced: bool,
}

/// Tactical flags and score of the position after one move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MoveAssessment {
    pub self_wins: bool,
    pub opponent_wins_next: bool,
    pub forced_win: bool,
    pub opponent_forced: bool,
    pub evaluation: i32,
}

/// Uniform draw from `0..limit`; 0 when `limit` is 0.
fn random_below<R: Rng + ?Sized>(rng: &mut R, limit: usize) -> usize {
    if limit == 0 {
        0
    } else {
        rng.random_range(0..limit)
    }
}

/// True with probability `pct` percent.
fn roll<R: Rng + ?Sized>(rng: &mut R, pct: u8) -> bool {
    match pct {
        0 => false,
        100.. => true,
        _ => rng.random_range(0..100u8) < pct,
    }
}

fn evaluate_candidates(board: &Board, ordered: &OrderedMoves, config: &AiConfig, probe: &mut Probe<'_>) -> Vec<Evaluated> {
    let rule = config.swap_rule;
    let eval_config = AiConfig { forcing_check: false, ..config.clone() };
    let mut found_forced_win = false;
    let mut evaluated = Vec::with_capacity(ordered.len());

    for candidate in &ordered.candidates {
        let mov = candidate.mov;
        if candidate.self_immediate {
            evaluated.clear();
            evaluated.push(Evaluated {
                mov,
                eval: SCORE_WIN - eval::ply_bias(board),
                self_win: true,
                opponent_wins_next: false,
                forced_win: false,
                opponent_forced: false,
            });
            break;
        }

        let mover = mov.player;
        let opponent = mover.opponent();
        let mut child = *board;
        child.apply_legal(mov, rule);

        let opponent_wins_next =
            candidate.opponent_immediate || tactics::immediate_win_available(&child, opponent, rule, probe);

        let forced_win = config.forcing_check
            && config.difficulty >= Difficulty::Standard
            && !found_forced_win
            && tactics::creates_forced_win(&child, mover, rule, probe);
        found_forced_win |= forced_win;

        let opponent_forced = config.forcing_check
            && config.difficulty == Difficulty::Expert
            && !opponent_wins_next
            && !found_forced_win
            && tactics::forcing_move_available(&child, opponent, rule, probe);

        let mut score = eval::assess(&child, opponent, config.player, &eval_config, probe).total;
        if opponent_forced {
            score = SCORE_LOSS + eval::ply_bias(&child) + FORCED_LOSS_MARGIN;
        }
        if !opponent_wins_next && !opponent_forced && mov.reverses(config.own_previous_move) {
            score -= SELF_REVERSAL_PENALTY;
        }

        trace!(
            "candidate {mov}: eval {score} opp_next {opponent_wins_next} forced {forced_win} opp_forced {opponent_forced}"
        );
        evaluated.push(Evaluated { mov, eval: score, self_win: false, opponent_wins_next, forced_win, opponent_forced });
    }
    evaluated
}

/// Apply the selection policy. Returns the move, or `None` when no safe move
/// exists, and whether a blunder was applied. A skipped forced win stays
/// flagged even when nothing safe is left.
fn choose<R: Rng + ?Sized>(evaluated: &[Evaluated], config: &AiConfig, rng: &mut R) -> (Option<Move>, bool) {
    if let Some(win) = evaluated.iter().find(|e| e.self_win) {
        return (Some(win.mov), false);
    }

    let blunders_allowed = config.blunder_enabled
        && !config.hint_profile
        && config.blunder_chance_pct > 0
        && config.difficulty != Difficulty::Expert
        && config.blunder_kind != BlunderKind::None;

    let mut skipped_forced_win = false;
    if config.forcing_check && config.difficulty >= Difficulty::Standard {
        let best_forced = evaluated
            .iter()
            .filter(|e| e.forced_win)
            .fold(None::<&Evaluated>, |best, e| match best {
                Some(b) if b.eval >= e.eval => Some(b),
                _ => Some(e),
            });
        if let Some(forced) = best_forced {
            if config.difficulty == Difficulty::Expert || !(blunders_allowed && roll(rng, config.blunder_chance_pct)) {
                debug!("search: forced win {}", forced.mov);
                return (Some(forced.mov), false);
            }
            debug!("search: blunder skips forced win {}", forced.mov);
            skipped_forced_win = true;
        }
    }
    let blunder_enabled = blunders_allowed && !skipped_forced_win;

    let mut safe: Vec<&Evaluated> = Vec::with_capacity(evaluated.len());
    let mut mistakes: Vec<&Evaluated> = Vec::new();
    for e in evaluated {
        if skipped_forced_win && e.forced_win {
            continue;
        }
        if e.opponent_wins_next {
            if blunder_enabled && config.blunder_kind == BlunderKind::AllowImmediateWin {
                mistakes.push(e);
            }
        } else if e.opponent_forced && config.forcing_check {
            if blunder_enabled && config.blunder_kind == BlunderKind::AllowForcingMove {
                mistakes.push(e);
            }
        } else {
            safe.push(e);
        }
    }

    if safe.is_empty() {
        return (None, skipped_forced_win);
    }

    if blunder_enabled && !mistakes.is_empty() && roll(rng, config.blunder_chance_pct) {
        let pick = mistakes[random_below(rng, mistakes.len())];
        debug!("search: blunder {} (eval {})", pick.mov, pick.eval);
        return (Some(pick.mov), true);
    }

    safe.sort_by(|a, b| b.eval.cmp(&a.eval));
    let tiers: Vec<&[&Evaluated]> = safe.chunk_by(|a, b| a.eval == b.eval).collect();

    let mut tier = 0;
    if !config.hint_profile
        && config.random_top_k > 1
        && config.random_epsilon_pct > 0
        && tiers.len() > 1
        && roll(rng, config.random_epsilon_pct)
    {
        tier = random_below(rng, tiers.len().min(config.random_top_k as usize));
    }

    let members = tiers[tier];
    let pick = if config.hint_profile || members.len() == 1 { 0 } else { random_below(rng, members.len()) };
    trace!("search: tier {tier} of {}, pick {pick} of {}", tiers.len(), members.len());
    (Some(members[pick].mov), skipped_forced_win)
}

/// Pick a move for `player`.
///
/// Unless `config.hint_profile` is set, `config.player` is replaced by
/// `player` for this call. Fails with [`Error::NoLegalMoves`] when `player`
/// cannot move.
pub fn find_best_move<R: Rng + ?Sized>(
    board: &Board,
    player: Player,
    config: &AiConfig,
    rng: &mut R,
    progress: &mut dyn Progress,
) -> Result<Decision> {
    let mut tuned = config.clone();
    if !tuned.hint_profile {
        tuned.player = player;
    }
    let mut probe = Probe::new(progress);

    let ordered = ordering::generate(board, player, &tuned, rng, &mut probe);
    if ordered.is_empty() {
        return Err(Error::NoLegalMoves(player));
    }
    if tuned.forcing_check && ordered.all_opponent_immediate() && !ordered.has_self_immediate() {
        debug!("search: every move concedes, forcing checks off");
        tuned.forcing_check = false;
    }

    let evaluated = evaluate_candidates(board, &ordered, &tuned, &mut probe);
    let (choice, blunder) = choose(&evaluated, &tuned, rng);
    let mov = match choice {
        Some(mov) => mov,
        None => {
            let fallback = if tuned.difficulty >= Difficulty::Standard {
                ordered.candidates.iter().find(|c| !c.opponent_immediate)
            } else {
                None
            };
            let fallback = fallback.or_else(|| ordered.candidates.first()).ok_or(Error::SearchFoundNothing)?;
            debug!("search: no safe move, falling back to {}", fallback.mov);
            fallback.mov
        }
    };

    let breakdown = if tuned.diagnostics {
        let mut after = *board;
        after.apply_legal(mov, tuned.swap_rule);
        Some(eval::assess(&after, tuned.player.opponent(), tuned.player, &tuned, &mut probe))
    } else {
        None
    };

    debug!("search: {player} plays {mov} (blunder {blunder}, {} win checks)", probe.win_checks);
    Ok(Decision { mov, blunder, breakdown, candidates: ordered.len(), win_checks: probe.win_checks })
}

/// Analyse a single move the way the search would.
pub fn evaluate_move(board: &Board, mov: Move, config: &AiConfig) -> Result<MoveAssessment> {
    let mut child = *board;
    child.apply(mov, config.swap_rule)?;

    let mut silent = crate::Silent;
    let mut probe = Probe::new(&mut silent);
    let rule = config.swap_rule;
    let mover = mov.player;
    let opponent = mover.opponent();

    let self_wins = probe.has_won(&child, mover);
    let opponent_wins_next =
        probe.has_won(&child, opponent) || tactics::immediate_win_available(&child, opponent, rule, &mut probe);
    let forced_win = !self_wins
        && config.forcing_check
        && config.difficulty >= Difficulty::Standard
        && tactics::creates_forced_win(&child, mover, rule, &mut probe);
    let opponent_forced = config.forcing_check
        && config.difficulty == Difficulty::Expert
        && !opponent_wins_next
        && tactics::forcing_move_available(&child, opponent, rule, &mut probe);
    let evaluation = eval::assess(&child, opponent, config.player, config, &mut probe).total;

    Ok(MoveAssessment { self_wins, opponent_wins_next, forced_win, opponent_forced, evaluation })
}
