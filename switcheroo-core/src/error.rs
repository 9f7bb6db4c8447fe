//! Error types for the Switcharoo engine.

use thiserror::Error;

use crate::{MoveKind, Player};

/// Why a move was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalMove {
    /// Destination is not one king-step from the source
    #[error("destination is not adjacent to the source")]
    NotAdjacent,

    /// Source cell is empty or belongs to the other player
    #[error("source piece does not belong to the mover")]
    WrongOwner,

    #[error("destination holds the mover's own piece")]
    OwnPieceAtDestination,

    /// Swapped pieces cannot be swapped again until cleared
    #[error("destination holds an already swapped piece")]
    DestinationSwapped,

    #[error("move declared as {declared:?} but the board makes it a {actual:?}")]
    KindMismatch { declared: MoveKind, actual: MoveKind },
}

/// Errors that can occur in the engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Row or column off the 8×4 board
    #[error("invalid coordinate ({row}, {col})")]
    InvalidCoordinate { row: u8, col: u8 },

    #[error("illegal move: {0}")]
    IllegalMove(#[from] IllegalMove),

    /// The side to move is stalemated
    #[error("{0} has no legal moves")]
    NoLegalMoves(Player),

    /// A move was submitted after the game ended
    #[error("the game is already over")]
    GameOver,

    /// Candidates existed but selection produced none
    #[error("search produced no move from a non-empty candidate list")]
    SearchFoundNothing,

    /// Puzzle data placed two pieces on one cell
    #[error("duplicate piece at ({row}, {col})")]
    DuplicatePiece { row: u8, col: u8 },

    #[error("unknown {kind}: {name:?}")]
    UnknownName { kind: &'static str, name: String },

    #[error("puzzle catalog: {0}")]
    Catalog(#[from] serde_json::Error),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
