//! Puzzle layouts supplied from outside the engine.
//!
//! A catalog is plain JSON:
//!
//! ```text
//! { "puzzles": [
//!     { "id": "classic-01", "swap_rule": "classic", "to_move": "white",
//!       "pieces": [ { "row": 1, "col": 0, "player": "white" }, ... ],
//!       "packed": [ [6, 9], ... ] } ] }
//! ```
//!
//! `packed` entries are `[row, piece]` pairs using the compact piece nibble:
//!
//! ```text
//! Bit 3:    swapped
//! Bit 2:    player (0 = White, 1 = Black)
//! Bits 0-1: column
//! ```

use std::io::Read;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Board, Error, MoveRecord, Piece, Player, Pos, Result, SwapRule};

/// One piece of a puzzle position.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PlacedPiece {
    pub row: u8,
    pub col: u8,
    pub player: Player,
    #[serde(default)]
    pub swapped: bool,
}

impl PlacedPiece {
    /// Decode a `[row, piece-nibble]` pair.
    pub const fn from_packed(row: u8, packed: u8) -> PlacedPiece {
        PlacedPiece {
            row,
            col: packed & 0x03,
            player: if packed & 0x04 == 0 { Player::White } else { Player::Black },
            swapped: packed & 0x08 != 0,
        }
    }

    /// Encode the piece nibble (row travels separately).
    pub const fn packed(&self) -> u8 {
        let player = match self.player {
            Player::White => 0,
            Player::Black => 0x04,
        };
        (if self.swapped { 0x08 } else { 0 }) | player | (self.col & 0x03)
    }

    fn piece(&self) -> Piece {
        if self.swapped {
            Piece::Swapped(self.player)
        } else {
            Piece::Normal(self.player)
        }
    }
}

fn white() -> Player {
    Player::White
}

/// A puzzle position and the rule it is played under.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PuzzleLayout {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub swap_rule: SwapRule,
    #[serde(default)]
    pub difficulty: u8,
    #[serde(default = "white")]
    pub to_move: Player,
    #[serde(default)]
    pub pieces: Vec<PlacedPiece>,
    #[serde(default)]
    pub packed: Vec<[u8; 2]>,
    /// Known solution line, if the catalog provides one.
    #[serde(default)]
    pub solution: Vec<MoveRecord>,
}

impl PuzzleLayout {
    /// All pieces, explicit ones first, then packed ones.
    pub fn placed_pieces(&self) -> impl Iterator<Item = PlacedPiece> + '_ {
        self.pieces
            .iter()
            .copied()
            .chain(self.packed.iter().map(|&[row, piece]| PlacedPiece::from_packed(row, piece)))
    }

    /// Build a fresh board: no other pieces, zero move and swap counts.
    pub fn to_board(&self) -> Result<Board> {
        let mut board = Board::empty();
        for placed in self.placed_pieces() {
            let pos = Pos::try_from_row_col(placed.row, placed.col)?;
            if !board.is_empty(pos) {
                return Err(Error::DuplicatePiece { row: placed.row, col: placed.col });
            }
            board.set_piece(pos, Some(placed.piece()));
        }
        Ok(board)
    }
}

/// Something that hands out puzzle layouts by index.
pub trait PuzzleSource {
    fn len(&self) -> usize;

    fn puzzle(&self, index: usize) -> Option<&PuzzleLayout>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory puzzle catalog.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PuzzleCatalog {
    pub puzzles: Vec<PuzzleLayout>,
}

impl PuzzleCatalog {
    pub fn from_json(text: &str) -> Result<PuzzleCatalog> {
        let catalog: PuzzleCatalog = serde_json::from_str(text)?;
        debug!("loaded {} puzzles", catalog.puzzles.len());
        Ok(catalog)
    }

    pub fn from_reader(reader: impl Read) -> Result<PuzzleCatalog> {
        let catalog: PuzzleCatalog = serde_json::from_reader(reader)?;
        debug!("loaded {} puzzles", catalog.puzzles.len());
        Ok(catalog)
    }

    /// Only the puzzles played under `rule`, in catalog order.
    pub fn filtered(&self, rule: SwapRule) -> PuzzleCatalog {
        PuzzleCatalog {
            puzzles: self.puzzles.iter().filter(|p| p.swap_rule == rule).cloned().collect(),
        }
    }

    pub fn find(&self, id: &str) -> Option<&PuzzleLayout> {
        self.puzzles.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PuzzleLayout> {
        self.puzzles.iter()
    }
}

impl PuzzleSource for PuzzleCatalog {
    fn len(&self) -> usize {
        self.puzzles.len()
    }

    fn puzzle(&self, index: usize) -> Option<&PuzzleLayout> {
        self.puzzles.get(index)
    }
}
