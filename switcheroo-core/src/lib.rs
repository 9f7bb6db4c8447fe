//! Switcharoo game logic with bitboard representation.
//!
//! # Board Layout (8 rows × 4 columns)
//!
//! ```text
//!          col 0  col 1  col 2  col 3
//! row 0:     0      1      2      3     <- Black back rank
//! row 1:     4      5      6      7     <- win zone starts
//!   ...
//! row 6:    24     25     26     27     <- win zone ends
//! row 7:    28     29     30     31     <- White back rank
//! ```
//!
//! White advances toward row 0, Black toward row 7. A player wins by linking
//! zone row 1 to zone row 6 through 8-adjacent pieces of their own.
//!
//! # Board Encoding (3 × 32-bit masks)
//!
//! ```text
//! white:   bit i set if cell i holds a White piece
//! black:   bit i set if cell i holds a Black piece
//! swapped: bit i set if the piece on cell i is swapped
//! ```
//!
//! Counts (pieces, swapped pieces) are popcounts of these masks, so they are
//! always consistent with the cells.
//!
//! # Piece Encoding (3-bit interchange form)
//!
//! ```text
//! Bit 0: White owner
//! Bit 1: Black owner
//! Bit 2: Swapped flag
//! ```

pub mod ai;
pub mod error;
pub mod history;
pub mod progress;
pub mod puzzle;
pub mod win;

#[cfg(feature = "wasm")]
pub mod wasm;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use error::{Error, IllegalMove, Result};
pub use history::{Game, GameStatus, MoveHistory};
pub use progress::{Progress, Silent};
pub use puzzle::{PlacedPiece, PuzzleCatalog, PuzzleLayout, PuzzleSource};
pub use win::WinPath;

/// Number of rows on the board.
pub const BOARD_ROWS: u8 = 8;
/// Number of columns on the board.
pub const BOARD_COLS: u8 = 4;
/// Total number of cells.
pub const CELL_COUNT: usize = (BOARD_ROWS as usize) * (BOARD_COLS as usize);
/// First row of the win zone.
pub const WIN_START_ROW: u8 = 1;
/// Last row of the win zone.
pub const WIN_END_ROW: u8 = 6;
/// Number of rows in the win zone.
pub const ZONE_ROWS: usize = (WIN_END_ROW - WIN_START_ROW + 1) as usize;

/// Row delta per direction: N, NE, E, SE, S, SW, W, NW.
pub const DIR_ROW: [i8; 8] = [-1, -1, 0, 1, 1, 1, 0, -1];
/// Column delta per direction, same order as [`DIR_ROW`].
pub const DIR_COL: [i8; 8] = [0, 1, 1, 1, 0, -1, -1, -1];

/// Player identifier.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Player {
    White = 1,
    Black = 2,
}

impl Player {
    /// Get the opponent player.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }

    /// Convert from owner bits (1 or 2) to Player.
    #[inline]
    pub fn from_bits(bits: u8) -> Option<Player> {
        match bits {
            1 => Some(Player::White),
            2 => Some(Player::Black),
            _ => None,
        }
    }

    /// The row this player's pieces start furthest back on.
    #[inline]
    pub const fn back_rank(self) -> u8 {
        match self {
            Player::White => 7,
            Player::Black => 0,
        }
    }

    /// The row just in front of the back rank.
    #[inline]
    pub const fn second_rank(self) -> u8 {
        match self {
            Player::White => 6,
            Player::Black => 1,
        }
    }

    /// The zone row nearest the opponent's back rank.
    #[inline]
    pub const fn far_edge(self) -> u8 {
        match self {
            Player::White => WIN_START_ROW,
            Player::Black => WIN_END_ROW,
        }
    }

    /// True if moving from `from_row` to `to_row` heads toward the opponent.
    #[inline]
    pub const fn is_advancing(self, from_row: u8, to_row: u8) -> bool {
        match self {
            Player::White => to_row < from_row,
            Player::Black => to_row > from_row,
        }
    }

    /// Both players, White first.
    pub fn all() -> impl Iterator<Item = Player> {
        [Player::White, Player::Black].into_iter()
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::White => write!(f, "White"),
            Player::Black => write!(f, "Black"),
        }
    }
}

/// A piece on the board.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Piece {
    Normal(Player),
    Swapped(Player),
}

impl Piece {
    const SWAPPED_BIT: u8 = 0x04;

    /// Owner of the piece.
    #[inline]
    pub const fn owner(self) -> Player {
        match self {
            Piece::Normal(p) | Piece::Swapped(p) => p,
        }
    }

    /// Check if the piece has been swapped.
    #[inline]
    pub const fn is_swapped(self) -> bool {
        matches!(self, Piece::Swapped(_))
    }

    /// 3-bit interchange code (see module docs).
    #[inline]
    pub const fn to_bits(self) -> u8 {
        match self {
            Piece::Normal(p) => p as u8,
            Piece::Swapped(p) => p as u8 | Self::SWAPPED_BIT,
        }
    }

    /// Decode a 3-bit interchange code. Zero means an empty cell.
    pub fn from_bits(bits: u8) -> Option<Piece> {
        let owner = Player::from_bits(bits & 0x03)?;
        if bits & Self::SWAPPED_BIT != 0 {
            Some(Piece::Swapped(owner))
        } else {
            Some(Piece::Normal(owner))
        }
    }
}

/// Position on the 8×4 board (0-31).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos(pub u8);

impl Pos {
    /// Create a position from row (0-7) and column (0-3).
    #[inline]
    pub const fn from_row_col(row: u8, col: u8) -> Pos {
        debug_assert!(row < BOARD_ROWS && col < BOARD_COLS);
        Pos(row * BOARD_COLS + col)
    }

    /// Create a position, rejecting coordinates off the board.
    pub fn try_from_row_col(row: u8, col: u8) -> Result<Pos> {
        if row < BOARD_ROWS && col < BOARD_COLS {
            Ok(Pos(row * BOARD_COLS + col))
        } else {
            Err(Error::InvalidCoordinate { row, col })
        }
    }

    /// Get the row (0-7).
    #[inline]
    pub const fn row(self) -> u8 {
        self.0 / BOARD_COLS
    }

    /// Get the column (0-3).
    #[inline]
    pub const fn col(self) -> u8 {
        self.0 % BOARD_COLS
    }

    /// Check if this is a valid position (0-31).
    #[inline]
    pub const fn is_valid(self) -> bool {
        (self.0 as usize) < CELL_COUNT
    }

    /// Single-bit mask for this cell. Zero for positions off the board.
    #[inline]
    pub const fn bit(self) -> u32 {
        if self.is_valid() {
            1 << self.0
        } else {
            0
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if the cell lies in the win zone.
    #[inline]
    pub const fn in_zone(self) -> bool {
        let row = self.row();
        row >= WIN_START_ROW && row <= WIN_END_ROW
    }

    /// Chebyshev distance of exactly one.
    #[inline]
    pub const fn is_adjacent(self, other: Pos) -> bool {
        self.is_valid() && other.is_valid() && NEIGHBOR_MASKS[self.0 as usize] & other.bit() != 0
    }

    /// Mask of all on-board neighbours. Empty for positions off the board.
    #[inline]
    pub const fn neighbors(self) -> u32 {
        if self.is_valid() {
            NEIGHBOR_MASKS[self.0 as usize]
        } else {
            0
        }
    }

    /// Neighbour in direction `dir` (index into [`DIR_ROW`]), if on the board.
    pub fn offset(self, dir: usize) -> Option<Pos> {
        if !self.is_valid() || dir >= DIR_ROW.len() {
            return None;
        }
        let row = self.row() as i8 + DIR_ROW[dir];
        let col = self.col() as i8 + DIR_COL[dir];
        if (0..BOARD_ROWS as i8).contains(&row) && (0..BOARD_COLS as i8).contains(&col) {
            Some(Pos::from_row_col(row as u8, col as u8))
        } else {
            None
        }
    }

    /// Iterate over all 32 positions.
    pub fn all() -> impl Iterator<Item = Pos> {
        (0..CELL_COUNT as u8).map(Pos)
    }

    /// Iterate over the positions whose bits are set in `mask`.
    pub fn iter_mask(mut mask: u32) -> impl Iterator<Item = Pos> {
        std::iter::from_fn(move || {
            if mask == 0 {
                return None;
            }
            let idx = mask.trailing_zeros() as u8;
            mask &= mask - 1;
            Some(Pos(idx))
        })
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row(), self.col())
    }
}

const fn build_neighbor_masks() -> [u32; CELL_COUNT] {
    let mut masks = [0u32; CELL_COUNT];
    let mut idx = 0;
    while idx < CELL_COUNT {
        let row = (idx / BOARD_COLS as usize) as i8;
        let col = (idx % BOARD_COLS as usize) as i8;
        let mut dir = 0;
        while dir < 8 {
            let r = row + DIR_ROW[dir];
            let c = col + DIR_COL[dir];
            if r >= 0 && r < BOARD_ROWS as i8 && c >= 0 && c < BOARD_COLS as i8 {
                masks[idx] |= 1 << (r as u32 * BOARD_COLS as u32 + c as u32);
            }
            dir += 1;
        }
        idx += 1;
    }
    masks
}

/// 8-neighbourhood of every cell.
const NEIGHBOR_MASKS: [u32; CELL_COUNT] = build_neighbor_masks();

/// Kind of move.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveKind {
    /// Relocate onto an adjacent empty cell.
    Step,
    /// Exchange places with an adjacent non-swapped opponent piece.
    Swap,
}

/// A move in the game.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Pos,
    pub to: Pos,
    pub kind: MoveKind,
    pub player: Player,
}

impl Move {
    #[inline]
    pub const fn step(player: Player, from: Pos, to: Pos) -> Move {
        Move { from, to, kind: MoveKind::Step, player }
    }

    #[inline]
    pub const fn swap(player: Player, from: Pos, to: Pos) -> Move {
        Move { from, to, kind: MoveKind::Swap, player }
    }

    /// Source/destination pair without kind or player.
    #[inline]
    pub const fn record(&self) -> MoveRecord {
        MoveRecord { from: self.from, to: self.to }
    }

    /// True if this move undoes `prev` (same two cells, opposite direction).
    #[inline]
    pub fn reverses(&self, prev: Option<MoveRecord>) -> bool {
        prev.is_some_and(|r| r.from == self.to && r.to == self.from)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = match self.kind {
            MoveKind::Step => "->",
            MoveKind::Swap => "<>",
        };
        write!(f, "{} {}{}{}", self.player, self.from, sep, self.to)
    }
}

/// Compact from/to pair kept for anti-oscillation checks.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct MoveRecord {
    pub from: Pos,
    pub to: Pos,
}

/// Which swapped pieces a Step move reverts to normal.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapRule {
    /// Every Step clears all swapped pieces.
    #[default]
    Classic,
    /// Every Step clears the mover's swapped pieces.
    ClearsOwn,
    /// A Step by a swapped piece clears all swapped pieces.
    SwappedClears,
    /// A Step by a swapped piece clears the mover's swapped pieces.
    SwappedClearsOwn,
}

/// Scope of a swapped-piece reset.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClearScope {
    Nothing,
    All,
    Only(Player),
}

impl SwapRule {
    pub const ALL: [SwapRule; 4] = [
        SwapRule::Classic,
        SwapRule::ClearsOwn,
        SwapRule::SwappedClears,
        SwapRule::SwappedClearsOwn,
    ];

    /// What a Step by `mover` clears, given whether the moved piece was swapped.
    #[inline]
    pub const fn clear_scope(self, mover: Player, moved_swapped: bool) -> ClearScope {
        match self {
            SwapRule::Classic => ClearScope::All,
            SwapRule::ClearsOwn => ClearScope::Only(mover),
            SwapRule::SwappedClears if moved_swapped => ClearScope::All,
            SwapRule::SwappedClearsOwn if moved_swapped => ClearScope::Only(mover),
            SwapRule::SwappedClears | SwapRule::SwappedClearsOwn => ClearScope::Nothing,
        }
    }

    /// Lower-case identifier used in data files and on the command line.
    pub const fn as_str(self) -> &'static str {
        match self {
            SwapRule::Classic => "classic",
            SwapRule::ClearsOwn => "clears_own",
            SwapRule::SwappedClears => "swapped_clears",
            SwapRule::SwappedClearsOwn => "swapped_clears_own",
        }
    }
}

impl fmt::Display for SwapRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SwapRule::Classic => "CLASSIC",
            SwapRule::ClearsOwn => "CLEARS OWN",
            SwapRule::SwappedClears => "SWAPPED CLEARS",
            SwapRule::SwappedClearsOwn => "SWAPPED CLEARS OWN",
        };
        f.write_str(label)
    }
}

impl FromStr for SwapRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<SwapRule> {
        SwapRule::ALL
            .into_iter()
            .find(|rule| rule.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownName { kind: "swap rule", name: s.to_string() })
    }
}

/// Named starting positions.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartingLayout {
    /// Each side fills its two back ranks.
    #[default]
    Standard,
    /// Both sides start in the middle rows, face to face.
    Midfield,
    /// Interleaved pieces on rows 2-5.
    Checkerboard,
    /// Staggered wedges along the diagonal.
    Diagonal,
}

impl StartingLayout {
    pub const ALL: [StartingLayout; 4] = [
        StartingLayout::Standard,
        StartingLayout::Midfield,
        StartingLayout::Checkerboard,
        StartingLayout::Diagonal,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            StartingLayout::Standard => "standard",
            StartingLayout::Midfield => "midfield",
            StartingLayout::Checkerboard => "checkerboard",
            StartingLayout::Diagonal => "diagonal",
        }
    }

    /// (white, black) occupancy masks.
    const fn masks(self) -> (u32, u32) {
        match self {
            // Black rows 0-1, White rows 6-7
            StartingLayout::Standard => (0xFF00_0000, 0x0000_00FF),
            // Black rows 2-3, White rows 4-5
            StartingLayout::Midfield => (0x00FF_0000, 0x0000_FF00),
            // row2 BWBW, row3 WBWB, row4 BWBW, row5 WBWB
            StartingLayout::Checkerboard => (0x005A_5A00, 0x00A5_A500),
            StartingLayout::Diagonal => (0x8CCE_0000, 0x0000_7331),
        }
    }
}

impl fmt::Display for StartingLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StartingLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<StartingLayout> {
        let s = s.trim();
        if let Ok(idx) = s.parse::<usize>() {
            if let Some(&layout) = StartingLayout::ALL.get(idx) {
                return Ok(layout);
            }
        }
        StartingLayout::ALL
            .into_iter()
            .find(|layout| layout.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownName { kind: "layout", name: s.to_string() })
    }
}

/// Maximum moves from a single cell (one per direction).
pub const MAX_CELL_MOVES: usize = 8;

/// A fixed-size move list that avoids heap allocation.
#[derive(Clone, Copy)]
pub struct MoveList {
    moves: [Move; MAX_CELL_MOVES],
    len: u8,
}

impl MoveList {
    const FILLER: Move = Move::step(Player::White, Pos(0), Pos(0));

    /// Create an empty move list.
    #[inline]
    pub const fn new() -> MoveList {
        MoveList { moves: [Self::FILLER; MAX_CELL_MOVES], len: 0 }
    }

    /// Add a move to the list.
    #[inline]
    pub fn push(&mut self, mov: Move) {
        debug_assert!((self.len as usize) < MAX_CELL_MOVES);
        self.moves[self.len as usize] = mov;
        self.len += 1;
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn get(&self, idx: usize) -> Move {
        self.moves[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.moves[..self.len as usize].iter().copied()
    }
}

impl Default for MoveList {
    fn default() -> Self {
        MoveList::new()
    }
}

impl IntoIterator for MoveList {
    type Item = Move;
    type IntoIter = std::iter::Take<std::array::IntoIter<Move, MAX_CELL_MOVES>>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.into_iter().take(self.len as usize)
    }
}

/// Compact board state.
///
/// See module documentation for encoding details.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Board {
    white: u32,
    black: u32,
    swapped: u32,
    move_count: u16,
}

impl Board {
    const ROW_MASK: u32 = 0x0F;

    /// Create a board in the standard starting layout.
    #[inline]
    pub fn new() -> Board {
        Board::with_layout(StartingLayout::Standard)
    }

    /// Create a board with no pieces.
    #[inline]
    pub const fn empty() -> Board {
        Board { white: 0, black: 0, swapped: 0, move_count: 0 }
    }

    /// Create a board in one of the named starting layouts.
    pub fn with_layout(layout: StartingLayout) -> Board {
        let (white, black) = layout.masks();
        Board { white, black, swapped: 0, move_count: 0 }
    }

    /// Get the piece on a cell.
    #[inline]
    pub fn piece(&self, pos: Pos) -> Option<Piece> {
        let bit = pos.bit();
        let owner = if self.white & bit != 0 {
            Player::White
        } else if self.black & bit != 0 {
            Player::Black
        } else {
            return None;
        };
        if self.swapped & bit != 0 {
            Some(Piece::Swapped(owner))
        } else {
            Some(Piece::Normal(owner))
        }
    }

    /// Get the piece at a row/column, rejecting coordinates off the board.
    pub fn get(&self, row: u8, col: u8) -> Result<Option<Piece>> {
        Ok(self.piece(Pos::try_from_row_col(row, col)?))
    }

    /// Get the owner of a cell.
    #[inline]
    pub fn owner(&self, pos: Pos) -> Option<Player> {
        self.piece(pos).map(Piece::owner)
    }

    /// Check if a cell is empty.
    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        (self.white | self.black) & pos.bit() == 0
    }

    /// Overwrite a cell. Does NOT validate and does not touch the move count.
    pub fn set_piece(&mut self, pos: Pos, piece: Option<Piece>) {
        let bit = pos.bit();
        self.white &= !bit;
        self.black &= !bit;
        self.swapped &= !bit;
        if let Some(piece) = piece {
            match piece.owner() {
                Player::White => self.white |= bit,
                Player::Black => self.black |= bit,
            }
            if piece.is_swapped() {
                self.swapped |= bit;
            }
        }
    }

    /// Remove every piece and reset the move count.
    pub fn clear(&mut self) {
        *self = Board::empty();
    }

    /// Occupancy mask of a player's pieces.
    #[inline]
    pub const fn occupancy(&self, player: Player) -> u32 {
        match player {
            Player::White => self.white,
            Player::Black => self.black,
        }
    }

    /// Mask of swapped pieces (both players).
    #[inline]
    pub const fn swapped_mask(&self) -> u32 {
        self.swapped
    }

    /// Mask of empty cells.
    #[inline]
    pub const fn empty_mask(&self) -> u32 {
        !(self.white | self.black)
    }

    /// Total number of swapped pieces.
    #[inline]
    pub const fn swapped_count(&self) -> u8 {
        self.swapped.count_ones() as u8
    }

    /// Number of swapped pieces owned by `player`.
    #[inline]
    pub const fn swapped_count_for(&self, player: Player) -> u8 {
        (self.swapped & self.occupancy(player)).count_ones() as u8
    }

    /// Number of pieces owned by `player`.
    #[inline]
    pub const fn piece_count(&self, player: Player) -> u8 {
        self.occupancy(player).count_ones() as u8
    }

    /// Number of moves executed on this board.
    #[inline]
    pub const fn move_count(&self) -> u16 {
        self.move_count
    }

    /// 4-bit column mask of a player's pieces on one row.
    #[inline]
    pub const fn row_mask(&self, player: Player, row: u8) -> u8 {
        ((self.occupancy(player) >> (row as u32 * BOARD_COLS as u32)) & Self::ROW_MASK) as u8
    }

    /// Number of zone rows holding at least one of the player's pieces.
    pub fn zone_rows_covered(&self, player: Player) -> u8 {
        (WIN_START_ROW..=WIN_END_ROW)
            .filter(|&row| self.row_mask(player, row) != 0)
            .count() as u8
    }

    // ========== Legality ==========

    /// Classify a candidate move, or explain why it is illegal.
    ///
    /// Checks run in a fixed order: adjacency, ownership, then destination.
    pub fn classify(&self, player: Player, from: Pos, to: Pos) -> std::result::Result<MoveKind, IllegalMove> {
        if !from.is_adjacent(to) {
            return Err(IllegalMove::NotAdjacent);
        }
        if self.owner(from) != Some(player) {
            return Err(IllegalMove::WrongOwner);
        }
        match self.piece(to) {
            None => Ok(MoveKind::Step),
            Some(piece) if piece.owner() == player => Err(IllegalMove::OwnPieceAtDestination),
            Some(Piece::Normal(_)) => Ok(MoveKind::Swap),
            Some(Piece::Swapped(_)) => Err(IllegalMove::DestinationSwapped),
        }
    }

    /// Kind of the move if legal.
    #[inline]
    pub fn can_move(&self, player: Player, from: Pos, to: Pos) -> Option<MoveKind> {
        self.classify(player, from, to).ok()
    }

    /// Legal moves for the piece on `from`, in direction order.
    pub fn legal_moves_from(&self, from: Pos) -> MoveList {
        let mut list = MoveList::new();
        let Some(player) = self.owner(from) else {
            return list;
        };
        let own = self.occupancy(player);
        let enemy_normal = self.occupancy(player.opponent()) & !self.swapped;
        for dir in 0..8 {
            let Some(to) = from.offset(dir) else { continue };
            let bit = to.bit();
            if own & bit != 0 {
                continue;
            }
            if self.is_empty(to) {
                list.push(Move::step(player, from, to));
            } else if enemy_normal & bit != 0 {
                list.push(Move::swap(player, from, to));
            }
        }
        list
    }

    /// Number of legal moves for the piece on `from`.
    #[inline]
    pub fn mobility_at(&self, from: Pos) -> u8 {
        let Some(player) = self.owner(from) else { return 0 };
        let targets = self.empty_mask() | (self.occupancy(player.opponent()) & !self.swapped);
        (from.neighbors() & targets).count_ones() as u8
    }

    /// All legal moves for a player, by cell then direction.
    pub fn legal_moves(&self, player: Player) -> Vec<Move> {
        let mut moves = Vec::new();
        for from in Pos::iter_mask(self.occupancy(player)) {
            moves.extend(self.legal_moves_from(from).iter());
        }
        moves
    }

    /// Check if a player has at least one legal move.
    pub fn has_legal_moves(&self, player: Player) -> bool {
        Pos::iter_mask(self.occupancy(player)).any(|from| self.mobility_at(from) > 0)
    }

    /// Would a Step by the piece on `from` revert any swapped piece under `rule`?
    pub fn step_would_clear(&self, from: Pos, rule: SwapRule) -> bool {
        let Some(piece) = self.piece(from) else { return false };
        match rule.clear_scope(piece.owner(), piece.is_swapped()) {
            ClearScope::Nothing => false,
            ClearScope::All => self.swapped != 0,
            ClearScope::Only(player) => self.swapped_count_for(player) > 0,
        }
    }

    // ========== Execution ==========

    /// Validate and execute a move.
    ///
    /// The board is left untouched if the move is rejected.
    pub fn apply(&mut self, mov: Move, rule: SwapRule) -> Result<()> {
        if !mov.from.is_valid() {
            return Err(Error::InvalidCoordinate { row: mov.from.row(), col: mov.from.col() });
        }
        if !mov.to.is_valid() {
            return Err(Error::InvalidCoordinate { row: mov.to.row(), col: mov.to.col() });
        }
        let actual = self.classify(mov.player, mov.from, mov.to)?;
        if actual != mov.kind {
            return Err(IllegalMove::KindMismatch { declared: mov.kind, actual }.into());
        }
        self.apply_legal(mov, rule);
        Ok(())
    }

    /// Execute a move already known to be legal (generated by this board).
    pub(crate) fn apply_legal(&mut self, mov: Move, rule: SwapRule) {
        debug_assert_eq!(self.can_move(mov.player, mov.from, mov.to), Some(mov.kind));
        let (from, to) = (mov.from.bit(), mov.to.bit());
        match mov.kind {
            MoveKind::Step => {
                let moved_swapped = self.swapped & from != 0;
                match mov.player {
                    Player::White => self.white = (self.white & !from) | to,
                    Player::Black => self.black = (self.black & !from) | to,
                }
                if moved_swapped {
                    self.swapped = (self.swapped & !from) | to;
                }
                self.clear_swapped(rule.clear_scope(mov.player, moved_swapped));
            }
            MoveKind::Swap => {
                let both = from | to;
                self.white ^= both;
                self.black ^= both;
                self.swapped |= both;
            }
        }
        self.move_count = self.move_count.wrapping_add(1);
    }

    /// Revert swapped pieces to normal.
    pub fn clear_swapped(&mut self, scope: ClearScope) {
        match scope {
            ClearScope::Nothing => {}
            ClearScope::All => self.swapped = 0,
            ClearScope::Only(player) => self.swapped &= !self.occupancy(player),
        }
    }
}

impl fmt::Display for Board {
    /// ASCII grid: `.` empty, `W`/`B` normal, `w`/`b` swapped.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    0 1 2 3")?;
        for row in 0..BOARD_ROWS {
            let marker = if (WIN_START_ROW..=WIN_END_ROW).contains(&row) { '|' } else { ' ' };
            write!(f, " {row}{marker} ")?;
            for col in 0..BOARD_COLS {
                let c = match self.piece(Pos::from_row_col(row, col)) {
                    None => '.',
                    Some(Piece::Normal(Player::White)) => 'W',
                    Some(Piece::Normal(Player::Black)) => 'B',
                    Some(Piece::Swapped(Player::White)) => 'w',
                    Some(Piece::Swapped(Player::Black)) => 'b',
                };
                write!(f, "{c}")?;
                if col + 1 < BOARD_COLS {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
