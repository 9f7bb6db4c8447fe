//! Game context: board, side to move, recent moves and undo snapshots.

use std::collections::VecDeque;

use log::debug;
use rand::Rng;
use serde::Serialize;

use crate::ai::{self, AiConfig, Decision};
use crate::{Board, Error, IllegalMove, Move, Player, Progress, PuzzleLayout, Result, Silent, StartingLayout, SwapRule, WinPath};

/// Moves remembered by [`MoveHistory`].
pub const HISTORY_CAPACITY: usize = 40;

/// Undo depth kept by [`Game`].
pub const UNDO_DEPTH: usize = 4;

/// Bounded ring of recent moves, newest first.
#[derive(Clone, Debug)]
pub struct MoveHistory {
    moves: [Option<Move>; HISTORY_CAPACITY],
    /// Slot the next push writes to.
    head: usize,
    len: usize,
}

impl MoveHistory {
    pub const fn new() -> MoveHistory {
        MoveHistory { moves: [None; HISTORY_CAPACITY], head: 0, len: 0 }
    }

    /// Record a move, dropping the oldest one when full.
    pub fn push(&mut self, mov: Move) {
        self.moves[self.head] = Some(mov);
        self.head = (self.head + 1) % HISTORY_CAPACITY;
        self.len = (self.len + 1).min(HISTORY_CAPACITY);
    }

    /// Remove and return the newest move.
    pub fn pop(&mut self) -> Option<Move> {
        if self.len == 0 {
            return None;
        }
        self.head = (self.head + HISTORY_CAPACITY - 1) % HISTORY_CAPACITY;
        self.len -= 1;
        self.moves[self.head].take()
    }

    /// Move `age` plies back; 0 is the newest.
    pub fn get(&self, age: usize) -> Option<Move> {
        if age >= self.len {
            return None;
        }
        self.moves[(self.head + HISTORY_CAPACITY - 1 - age) % HISTORY_CAPACITY]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        *self = MoveHistory::new();
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        (0..self.len).filter_map(move |age| self.get(age))
    }
}

impl Default for MoveHistory {
    fn default() -> Self {
        MoveHistory::new()
    }
}

/// Where a game stands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Won(WinPath),
    /// The named side is to move and has no legal move.
    Stalemate(Player),
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

#[derive(Clone, Copy, Debug)]
struct Snapshot {
    board: Board,
    to_move: Player,
}

/// A game in progress.
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    initial: Board,
    first_to_move: Player,
    to_move: Player,
    rule: SwapRule,
    history: MoveHistory,
    snapshots: VecDeque<Snapshot>,
}

impl Game {
    /// New game from a starting layout. White moves first.
    pub fn new(layout: StartingLayout, rule: SwapRule) -> Game {
        Game::from_board(Board::with_layout(layout), Player::White, rule)
    }

    /// New game from puzzle data, under the puzzle's rule and side to move.
    pub fn from_puzzle(puzzle: &PuzzleLayout) -> Result<Game> {
        debug!("puzzle {}: {} to move, {}", puzzle.id, puzzle.to_move, puzzle.swap_rule);
        Ok(Game::from_board(puzzle.to_board()?, puzzle.to_move, puzzle.swap_rule))
    }

    pub fn from_board(board: Board, to_move: Player, rule: SwapRule) -> Game {
        Game {
            board,
            initial: board,
            first_to_move: to_move,
            to_move,
            rule,
            history: MoveHistory::new(),
            snapshots: VecDeque::with_capacity(UNDO_DEPTH),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Player {
        self.to_move
    }

    pub fn rule(&self) -> SwapRule {
        self.rule
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    /// Undo steps currently available.
    pub fn undo_depth(&self) -> usize {
        self.snapshots.len()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.board.legal_moves(self.to_move)
    }

    pub fn status(&self) -> GameStatus {
        for player in Player::all() {
            if let Some(path) = self.board.winning_path(player) {
                return GameStatus::Won(path);
            }
        }
        if !self.board.has_legal_moves(self.to_move) {
            return GameStatus::Stalemate(self.to_move);
        }
        GameStatus::InProgress
    }

    /// Validate and play a move for the side to move.
    ///
    /// On error nothing changes.
    pub fn play(&mut self, mov: Move) -> Result<GameStatus> {
        if self.status().is_over() {
            return Err(Error::GameOver);
        }
        if mov.player != self.to_move {
            return Err(IllegalMove::WrongOwner.into());
        }
        let before = Snapshot { board: self.board, to_move: self.to_move };
        self.board.apply(mov, self.rule)?;

        if self.snapshots.len() == UNDO_DEPTH {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(before);
        self.history.push(mov);
        self.to_move = self.to_move.opponent();
        Ok(self.status())
    }

    /// Take back the last move. Returns false when no snapshot is left.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.snapshots.pop_back() else {
            return false;
        };
        self.board = snapshot.board;
        self.to_move = snapshot.to_move;
        self.history.pop();
        true
    }

    /// Back to the initial position.
    pub fn reset(&mut self) {
        self.board = self.initial;
        self.to_move = self.first_to_move;
        self.history.clear();
        self.snapshots.clear();
    }

    /// Let the AI pick and play a move for the side to move.
    ///
    /// The game's rule and side to move override those in `config`.
    pub fn play_ai<R: Rng + ?Sized>(
        &mut self,
        config: &AiConfig,
        rng: &mut R,
        progress: &mut dyn Progress,
    ) -> Result<(Decision, GameStatus)> {
        if self.status().is_over() {
            return Err(Error::GameOver);
        }
        let mut config = AiConfig { player: self.to_move, ..config.clone() };
        if config.swap_rule != self.rule {
            config.set_swap_rule(self.rule);
        }
        let config = config.with_history(&self.history);
        let decision = ai::find_best_move(&self.board, self.to_move, &config, rng, progress)?;
        let status = self.play(decision.mov)?;
        Ok((decision, status))
    }

    /// Suggest a move for the side to move without playing it.
    pub fn hint<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Move> {
        let config = AiConfig::hint(self.rule, self.to_move).with_history(&self.history);
        Ok(ai::find_best_move(&self.board, self.to_move, &config, rng, &mut Silent)?.mov)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Difficulty;
    use crate::{Piece, PlacedPiece, Pos};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn step(player: Player, from: (u8, u8), to: (u8, u8)) -> Move {
        Move::step(player, Pos::from_row_col(from.0, from.1), Pos::from_row_col(to.0, to.1))
    }

    #[test]
    fn test_history_newest_first() {
        let mut history = MoveHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.get(0), None);
        let a = step(Player::White, (6, 0), (5, 0));
        let b = step(Player::Black, (1, 0), (2, 0));
        history.push(a);
        history.push(b);
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(0), Some(b));
        assert_eq!(history.get(1), Some(a));
        assert_eq!(history.get(2), None);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![b, a]);
    }

    #[test]
    fn test_history_wraps_at_capacity() {
        let mut history = MoveHistory::new();
        let moves: Vec<Move> = (0..HISTORY_CAPACITY + 5)
            .map(|i| step(Player::White, ((i % 7) as u8, 0), ((i % 7) as u8 + 1, 0)))
            .collect();
        for &mov in &moves {
            history.push(mov);
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.get(0), moves.last().copied());
        assert_eq!(history.get(HISTORY_CAPACITY - 1), Some(moves[5]));
        assert_eq!(history.get(HISTORY_CAPACITY), None);

        assert_eq!(history.pop(), moves.last().copied());
        assert_eq!(history.len(), HISTORY_CAPACITY - 1);
        assert_eq!(history.get(0), Some(moves[moves.len() - 2]));
    }

    #[test]
    fn test_play_switches_sides_and_records() {
        let mut game = Game::new(StartingLayout::Standard, SwapRule::Classic);
        let mov = step(Player::White, (6, 1), (5, 1));
        assert_eq!(game.play(mov).unwrap(), GameStatus::InProgress);
        assert_eq!(game.to_move(), Player::Black);
        assert_eq!(game.history().get(0), Some(mov));
        assert_eq!(game.board().move_count(), 1);
    }

    #[test]
    fn test_play_rejects_wrong_side_without_change() {
        let mut game = Game::new(StartingLayout::Standard, SwapRule::Classic);
        let before = *game.board();
        let result = game.play(step(Player::Black, (1, 0), (2, 0)));
        assert!(matches!(result, Err(Error::IllegalMove(IllegalMove::WrongOwner))));
        let result = game.play(step(Player::White, (7, 0), (6, 0)));
        assert!(matches!(result, Err(Error::IllegalMove(IllegalMove::OwnPieceAtDestination))));
        assert_eq!(*game.board(), before);
        assert!(game.history().is_empty());
        assert_eq!(game.undo_depth(), 0);
    }

    #[test]
    fn test_undo_restores_snapshots() {
        let mut game = Game::new(StartingLayout::Standard, SwapRule::Classic);
        let mut boards = vec![*game.board()];
        let line = [
            step(Player::White, (6, 0), (5, 0)),
            step(Player::Black, (1, 0), (2, 0)),
            step(Player::White, (5, 0), (4, 0)),
            step(Player::Black, (2, 0), (3, 0)),
            step(Player::White, (6, 1), (5, 1)),
            step(Player::Black, (1, 1), (2, 1)),
        ];
        for mov in line {
            game.play(mov).unwrap();
            boards.push(*game.board());
        }
        assert_eq!(game.undo_depth(), UNDO_DEPTH);

        for expected in boards.iter().rev().skip(1).take(UNDO_DEPTH) {
            assert!(game.undo());
            assert_eq!(game.board(), expected);
        }
        assert!(!game.undo());
        assert_eq!(game.to_move(), Player::White);
        assert_eq!(game.history().len(), line.len() - UNDO_DEPTH);
    }

    #[test]
    fn test_reset() {
        let mut game = Game::new(StartingLayout::Midfield, SwapRule::ClearsOwn);
        let mov = game.legal_moves()[0];
        game.play(mov).unwrap();
        game.reset();
        assert_eq!(*game.board(), Board::with_layout(StartingLayout::Midfield));
        assert_eq!(game.to_move(), Player::White);
        assert!(game.history().is_empty());
        assert_eq!(game.undo_depth(), 0);
    }

    #[test]
    fn test_win_ends_game() {
        let layout = PuzzleLayout {
            id: "near-win".into(),
            name: String::new(),
            swap_rule: SwapRule::Classic,
            difficulty: 1,
            to_move: Player::White,
            pieces: [(1, 0), (2, 0), (3, 2), (4, 0), (5, 0), (6, 0)]
                .into_iter()
                .map(|(row, col)| PlacedPiece { row, col, player: Player::White, swapped: false })
                .chain([PlacedPiece { row: 0, col: 3, player: Player::Black, swapped: false }])
                .collect(),
            packed: vec![],
            solution: vec![],
        };
        let mut game = Game::from_puzzle(&layout).unwrap();
        let status = game.play(step(Player::White, (3, 2), (3, 1))).unwrap();
        let GameStatus::Won(path) = status else {
            panic!("expected a win, got {status:?}");
        };
        assert_eq!(path.winner, Player::White);
        assert!(matches!(game.play(step(Player::Black, (0, 3), (0, 2))), Err(Error::GameOver)));
    }

    #[test]
    fn test_stalemate_status() {
        let mut board = Board::empty();
        board.set_piece(Pos::from_row_col(7, 0), Some(Piece::Normal(Player::White)));
        for (row, col) in [(6, 0), (6, 1), (7, 1)] {
            board.set_piece(Pos::from_row_col(row, col), Some(Piece::Swapped(Player::Black)));
        }
        let game = Game::from_board(board, Player::White, SwapRule::Classic);
        assert_eq!(game.status(), GameStatus::Stalemate(Player::White));
    }

    #[test]
    fn test_hint_and_ai_play() {
        let mut game = Game::new(StartingLayout::Standard, SwapRule::SwappedClears);
        let mut rng = StdRng::seed_from_u64(21);
        let hint = game.hint(&mut rng).unwrap();
        assert!(game.legal_moves().contains(&hint));

        let config = AiConfig::new(SwapRule::Classic, Difficulty::Easy, Player::Black);
        for _ in 0..6 {
            let (decision, status) = game.play_ai(&config, &mut rng, &mut Silent).unwrap();
            assert_eq!(game.history().get(0), Some(decision.mov));
            if status.is_over() {
                break;
            }
        }
        assert_eq!(game.rule(), SwapRule::SwappedClears);
    }
}
