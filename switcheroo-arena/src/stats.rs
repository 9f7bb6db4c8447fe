//! Match statistics tracking.

use std::time::Instant;

use switcheroo_core::ai::Decision;
use switcheroo_core::Player;

/// How a single arena game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOutcome {
    Won(Player),
    /// The side to move had no legal move.
    Stalemate(Player),
    /// Neither side connected within the ply limit.
    PlyCap,
    /// Stopped by Ctrl-C.
    Interrupted,
}

/// Statistics collected while playing games.
#[derive(Debug, Default)]
pub struct MatchStats {
    pub games: u64,
    pub white_wins: u64,
    pub black_wins: u64,
    pub stalemates: u64,
    pub ply_capped: u64,

    /// AI moves played, both sides
    pub moves: u64,
    pub total_plies: u64,
    pub longest_game: u64,

    /// Moves flagged as blunders, per side
    pub white_blunders: u64,
    pub black_blunders: u64,

    /// Win checks spent by the search
    pub win_checks: u64,

    /// For rate calculation
    start_time: Option<Instant>,
    last_log_time: Option<Instant>,
    last_log_moves: u64,
}

impl MatchStats {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            last_log_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Record one AI move
    pub fn record_move(&mut self, decision: &Decision) {
        self.moves += 1;
        self.win_checks += decision.win_checks;
        if decision.blunder {
            match decision.mov.player {
                Player::White => self.white_blunders += 1,
                Player::Black => self.black_blunders += 1,
            }
        }
    }

    /// Record a finished game. Interrupted games are not counted.
    pub fn record_game(&mut self, outcome: GameOutcome, plies: u64) {
        match outcome {
            GameOutcome::Won(Player::White) => self.white_wins += 1,
            GameOutcome::Won(Player::Black) => self.black_wins += 1,
            GameOutcome::Stalemate(_) => self.stalemates += 1,
            GameOutcome::PlyCap => self.ply_capped += 1,
            GameOutcome::Interrupted => return,
        }
        self.games += 1;
        self.total_plies += plies;
        self.longest_game = self.longest_game.max(plies);
    }

    pub fn average_plies(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.total_plies as f64 / self.games as f64
        }
    }

    /// Get current moves per second
    pub fn moves_per_sec(&self) -> f64 {
        if let Some(start) = self.start_time {
            let elapsed = start.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                return self.moves as f64 / elapsed;
            }
        }
        0.0
    }

    /// Check if we should log progress
    pub fn should_log(&self, interval_secs: u64) -> bool {
        if let Some(last) = self.last_log_time {
            last.elapsed().as_secs() >= interval_secs
        } else {
            true
        }
    }

    /// Log progress and reset log timer
    pub fn log_progress(&mut self, games_planned: u64) {
        let now = Instant::now();
        let elapsed_total = self.start_time.map(|s| s.elapsed().as_secs()).unwrap_or(0);

        // Rate since last log
        let rate = match self.last_log_time {
            Some(last) if last.elapsed().as_secs_f64() > 0.0 => {
                (self.moves - self.last_log_moves) as f64 / last.elapsed().as_secs_f64()
            }
            _ => self.moves_per_sec(),
        };

        println!(
            "[{:02}:{:02}:{:02}] games={}/{} moves={} rate={:.0}/s avg_plies={:.1}",
            elapsed_total / 3600,
            (elapsed_total % 3600) / 60,
            elapsed_total % 60,
            self.games,
            games_planned,
            self.moves,
            rate,
            self.average_plies(),
        );
        println!(
            "           results: white={} black={} stalemate={} capped={}",
            self.white_wins, self.black_wins, self.stalemates, self.ply_capped
        );

        self.last_log_time = Some(now);
        self.last_log_moves = self.moves;
    }

    /// Print final summary
    pub fn print_summary(&self) {
        println!("Games played: {}", self.games);
        println!("  - White wins: {}", self.white_wins);
        println!("  - Black wins: {}", self.black_wins);
        println!("  - Stalemates: {}", self.stalemates);
        println!("  - Ply-capped draws: {}", self.ply_capped);
        println!("Blunders: white={} black={}", self.white_blunders, self.black_blunders);
        println!("Average plies: {:.1}", self.average_plies());
        println!("Longest game: {}", self.longest_game);
        println!("Win checks: {}", self.win_checks);

        if let Some(start) = self.start_time {
            let elapsed = start.elapsed().as_secs_f64();
            println!("Average rate: {:.0} moves/sec", self.moves as f64 / elapsed.max(1e-6));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_game() {
        let mut stats = MatchStats::new();
        stats.record_game(GameOutcome::Won(Player::White), 30);
        stats.record_game(GameOutcome::Won(Player::Black), 10);
        stats.record_game(GameOutcome::Stalemate(Player::White), 20);
        stats.record_game(GameOutcome::PlyCap, 200);
        stats.record_game(GameOutcome::Interrupted, 5);

        assert_eq!(stats.games, 4);
        assert_eq!((stats.white_wins, stats.black_wins), (1, 1));
        assert_eq!((stats.stalemates, stats.ply_capped), (1, 1));
        assert_eq!(stats.longest_game, 200);
        assert!((stats.average_plies() - 65.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_average() {
        assert_eq!(MatchStats::new().average_plies(), 0.0);
        assert!(MatchStats::default().should_log(3600));
    }
}
