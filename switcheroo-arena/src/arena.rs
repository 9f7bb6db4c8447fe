//! AI-vs-AI games and puzzle runs.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use rand::Rng;
use switcheroo_core::ai::{AiConfig, Difficulty};
use switcheroo_core::{Game, GameStatus, Move, Player, PuzzleLayout, Result, Silent, StartingLayout, SwapRule};

use crate::stats::{GameOutcome, MatchStats};

/// Two AI configurations playing repeated games from one layout.
pub struct Arena {
    pub white: AiConfig,
    pub black: AiConfig,
    pub layout: StartingLayout,
    pub rule: SwapRule,
    /// Games longer than this are scored as draws
    pub max_plies: u64,
    pub stats: MatchStats,
}

impl Arena {
    pub fn new(white: AiConfig, black: AiConfig, layout: StartingLayout, rule: SwapRule, max_plies: u64) -> Self {
        Self { white, black, layout, rule, max_plies, stats: MatchStats::new() }
    }

    /// Play one game to completion, the ply limit, or an interrupt.
    pub fn play_game<R: Rng + ?Sized>(&mut self, rng: &mut R, running: &AtomicBool) -> Result<GameOutcome> {
        let mut game = Game::new(self.layout, self.rule);
        let mut plies = 0;

        let outcome = loop {
            if !running.load(Ordering::SeqCst) {
                break GameOutcome::Interrupted;
            }
            match game.status() {
                GameStatus::Won(path) => break GameOutcome::Won(path.winner),
                GameStatus::Stalemate(player) => break GameOutcome::Stalemate(player),
                GameStatus::InProgress => {}
            }
            if plies >= self.max_plies {
                break GameOutcome::PlyCap;
            }

            let config = match game.to_move() {
                Player::White => &self.white,
                Player::Black => &self.black,
            };
            let (decision, _) = game.play_ai(config, rng, &mut Silent)?;
            debug!("ply {}: {} blunder={} candidates={}", plies + 1, decision.mov, decision.blunder, decision.candidates);
            self.stats.record_move(&decision);
            plies += 1;
        };

        self.stats.record_game(outcome, plies);
        Ok(outcome)
    }

    /// Play up to `games` games, logging every `log_interval_secs`.
    ///
    /// Returns the number of games completed.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        games: u64,
        rng: &mut R,
        running: &AtomicBool,
        log_interval_secs: u64,
    ) -> Result<u64> {
        for index in 0..games {
            if !running.load(Ordering::SeqCst) {
                break;
            }
            let outcome = self.play_game(rng, running)?;
            info!("game {}: {:?}", index + 1, outcome);

            if self.stats.should_log(log_interval_secs) {
                self.stats.log_progress(games);
            }
        }
        Ok(self.stats.games)
    }
}

/// Result of letting the AI attack one puzzle.
#[derive(Clone, Debug)]
pub struct PuzzleResult {
    pub id: String,
    pub solved: bool,
    pub plies: u64,
    pub first_move: Option<Move>,
}

/// Let the AI at `difficulty` play the puzzle's side to move against an
/// Expert defender. Solved means the attacker connects within `max_plies`.
pub fn run_puzzle<R: Rng + ?Sized>(
    puzzle: &PuzzleLayout,
    difficulty: Difficulty,
    max_plies: u64,
    rng: &mut R,
    running: &AtomicBool,
) -> Result<PuzzleResult> {
    let attacker = puzzle.to_move;
    let attack = AiConfig::new(puzzle.swap_rule, difficulty, attacker);
    let defend = AiConfig::new(puzzle.swap_rule, Difficulty::Expert, attacker.opponent());

    let mut game = Game::from_puzzle(puzzle)?;
    let mut plies = 0;
    let mut first_move = None;

    while plies < max_plies && running.load(Ordering::SeqCst) {
        if game.status().is_over() {
            break;
        }
        let config = if game.to_move() == attacker { &attack } else { &defend };
        let (decision, _) = game.play_ai(config, rng, &mut Silent)?;
        first_move.get_or_insert(decision.mov);
        plies += 1;
    }

    let solved = matches!(game.status(), GameStatus::Won(path) if path.winner == attacker);
    Ok(PuzzleResult { id: puzzle.id.clone(), solved, plies, first_move })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use switcheroo_core::{PuzzleCatalog, PuzzleSource};

    fn arena(max_plies: u64) -> Arena {
        Arena::new(
            AiConfig::new(SwapRule::Classic, Difficulty::Expert, Player::White),
            AiConfig::new(SwapRule::Classic, Difficulty::Learning, Player::Black),
            StartingLayout::Standard,
            SwapRule::Classic,
            max_plies,
        )
    }

    #[test]
    fn test_ply_cap() {
        let mut arena = arena(0);
        let running = AtomicBool::new(true);
        let outcome = arena.play_game(&mut StdRng::seed_from_u64(1), &running).unwrap();
        assert_eq!(outcome, GameOutcome::PlyCap);
        assert_eq!(arena.stats.games, 1);
        assert_eq!(arena.stats.moves, 0);
    }

    #[test]
    fn test_interrupted_game_not_counted() {
        let mut arena = arena(100);
        let running = AtomicBool::new(false);
        let outcome = arena.play_game(&mut StdRng::seed_from_u64(1), &running).unwrap();
        assert_eq!(outcome, GameOutcome::Interrupted);
        assert_eq!(arena.stats.games, 0);
        assert_eq!(arena.run(5, &mut StdRng::seed_from_u64(1), &running, 3600).unwrap(), 0);
    }

    #[test]
    fn test_run_match() {
        let mut arena = arena(30);
        let running = AtomicBool::new(true);
        let games = arena.run(2, &mut StdRng::seed_from_u64(7), &running, 3600).unwrap();
        assert_eq!(games, 2);
        assert!(arena.stats.moves > 0);
        assert!(arena.stats.total_plies <= 60);
        assert_eq!(arena.stats.moves, arena.stats.total_plies);
        assert_eq!(arena.stats.white_blunders, 0);
    }

    #[test]
    fn test_puzzle_solved() {
        let catalog = PuzzleCatalog::from_json(
            r#"{ "puzzles": [ { "id": "gap", "swap_rule": "classic", "to_move": "white",
                 "packed": [[1, 0], [2, 0], [3, 2], [4, 0], [5, 0], [6, 0], [0, 7]] } ] }"#,
        )
        .unwrap();
        let puzzle = catalog.puzzle(0).unwrap();
        let running = AtomicBool::new(true);
        let result = run_puzzle(puzzle, Difficulty::Expert, 5, &mut StdRng::seed_from_u64(3), &running).unwrap();
        assert!(result.solved);
        assert_eq!(result.plies, 1);
        assert_eq!(result.first_move.map(|m| m.to.col()), Some(1));
    }
}
