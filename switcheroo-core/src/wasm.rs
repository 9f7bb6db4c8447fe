//! WASM bindings for switcheroo-core
//!
//! Provides a JavaScript-friendly API around [`Game`].

use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;

use crate::ai::{self, AiConfig, Difficulty};
use crate::{Game, GameStatus, Move, MoveKind, Player, Pos, PuzzleLayout, Silent, StartingLayout, SwapRule};

fn js_error(err: crate::Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// WASM-friendly wrapper around a game in progress
#[wasm_bindgen]
pub struct WasmGame {
    inner: Game,
}

#[wasm_bindgen]
impl WasmGame {
    /// Start a game, e.g. `new WasmGame("standard", "classic")`
    #[wasm_bindgen(constructor)]
    pub fn new(layout: &str, rule: &str) -> Result<WasmGame, JsValue> {
        let layout: StartingLayout = layout.parse().map_err(js_error)?;
        let rule: SwapRule = rule.parse().map_err(js_error)?;
        Ok(WasmGame { inner: Game::new(layout, rule) })
    }

    /// Start from a single puzzle object in catalog JSON form
    #[wasm_bindgen(js_name = fromPuzzleJson)]
    pub fn from_puzzle_json(json: &str) -> Result<WasmGame, JsValue> {
        let puzzle: PuzzleLayout = serde_json::from_str(json).map_err(|e| js_error(e.into()))?;
        Ok(WasmGame { inner: Game::from_puzzle(&puzzle).map_err(js_error)? })
    }

    /// Back to the starting position
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Side to move (1 = White, 2 = Black)
    #[wasm_bindgen(js_name = toMove)]
    pub fn to_move(&self) -> u8 {
        self.inner.to_move() as u8
    }

    /// 3-bit piece code at a cell: bit 0 White, bit 1 Black, bit 2 swapped.
    /// Returns 0 for empty or off-board cells.
    pub fn cell(&self, row: u8, col: u8) -> u8 {
        match self.inner.board().get(row, col) {
            Ok(Some(piece)) => piece.to_bits(),
            _ => 0,
        }
    }

    /// All 32 piece codes, row-major
    pub fn cells(&self) -> Vec<u8> {
        Pos::all()
            .map(|pos| self.inner.board().piece(pos).map_or(0, |p| p.to_bits()))
            .collect()
    }

    /// Legal moves of the piece on a cell as JSON array
    /// Each move is { from: [row, col], to: [row, col], swap: bool }
    #[wasm_bindgen(js_name = legalMovesFrom)]
    pub fn legal_moves_from(&self, row: u8, col: u8) -> Result<JsValue, JsValue> {
        let pos = Pos::try_from_row_col(row, col).map_err(js_error)?;
        let moves: Vec<WasmMove> = self.inner.board().legal_moves_from(pos).iter().map(WasmMove::from).collect();
        Ok(serde_wasm_bindgen::to_value(&moves)?)
    }

    /// Apply a move for the side to move. Returns true if successful.
    /// Step or swap is inferred from the destination.
    #[wasm_bindgen(js_name = applyMove)]
    pub fn apply_move(&mut self, from_row: u8, from_col: u8, to_row: u8, to_col: u8) -> bool {
        let (Ok(from), Ok(to)) = (Pos::try_from_row_col(from_row, from_col), Pos::try_from_row_col(to_row, to_col)) else {
            return false;
        };
        let player = self.inner.to_move();
        let Some(kind) = self.inner.board().can_move(player, from, to) else {
            return false;
        };
        self.inner.play(Move { from, to, kind, player }).is_ok()
    }

    /// Take back the last move. Returns false once the undo buffer is empty.
    pub fn undo(&mut self) -> bool {
        self.inner.undo()
    }

    /// Check for winner. Returns 0 (none), 1 (White), or 2 (Black)
    #[wasm_bindgen(js_name = checkWinner)]
    pub fn check_winner(&self) -> u8 {
        self.inner.board().check_winner().map_or(0, |p| p as u8)
    }

    /// Winning path as [row, col, row, col, ...] from zone row 1 to zone row 6.
    /// Returns empty array if no winner
    #[wasm_bindgen(js_name = winningPath)]
    pub fn winning_path(&self) -> Vec<u8> {
        match self.inner.status() {
            GameStatus::Won(path) => path.cells.iter().flat_map(|pos| [pos.row(), pos.col()]).collect(),
            _ => vec![],
        }
    }

    /// Check if game is over (has winner or side to move is stuck)
    #[wasm_bindgen(js_name = isGameOver)]
    pub fn is_game_over(&self) -> bool {
        self.inner.status().is_over()
    }

    /// Let the AI move for the side to move. Returns the move played.
    /// `difficulty` is one of "learning", "easy", "standard", "expert".
    #[wasm_bindgen(js_name = aiMove)]
    pub fn ai_move(&mut self, difficulty: &str, seed: u64) -> Result<JsValue, JsValue> {
        let difficulty: Difficulty = difficulty.parse().map_err(js_error)?;
        let config = AiConfig::new(self.inner.rule(), difficulty, self.inner.to_move());
        let mut rng = StdRng::seed_from_u64(seed);
        let (decision, _) = self.inner.play_ai(&config, &mut rng, &mut Silent).map_err(js_error)?;
        Ok(serde_wasm_bindgen::to_value(&WasmMove::from(decision.mov))?)
    }

    /// Suggested move for the side to move, without playing it
    pub fn hint(&self, seed: u64) -> Result<JsValue, JsValue> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mov = self.inner.hint(&mut rng).map_err(js_error)?;
        Ok(serde_wasm_bindgen::to_value(&WasmMove::from(mov))?)
    }

    /// Evaluation breakdown for a player (1 = White, 2 = Black) as JSON
    pub fn evaluate(&self, player: u8) -> Result<JsValue, JsValue> {
        let player = Player::from_bits(player).ok_or_else(|| JsValue::from_str("player must be 1 or 2"))?;
        let config = AiConfig::new(self.inner.rule(), Difficulty::Expert, player);
        let breakdown = ai::evaluate_with_breakdown(self.inner.board(), player, &config);
        Ok(serde_wasm_bindgen::to_value(&breakdown)?)
    }
}

/// Serializable move for JavaScript
#[derive(serde::Serialize)]
struct WasmMove {
    from: [u8; 2],
    to: [u8; 2],
    swap: bool,
}

impl From<Move> for WasmMove {
    fn from(mov: Move) -> Self {
        WasmMove {
            from: [mov.from.row(), mov.from.col()],
            to: [mov.to.row(), mov.to.col()],
            swap: mov.kind == MoveKind::Swap,
        }
    }
}
