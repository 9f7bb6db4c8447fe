//! Win detection.
//!
//! The fast check works on one 4-bit occupancy mask per zone row:
//!
//! ```text
//! row 1:  occ[0]  <- reach[0] != 0 means a win
//! row 2:  occ[1]
//!  ...
//! row 6:  occ[5]  <- seeded with reach[5] = occ[5]
//! ```
//!
//! `CONNECTIVITY[(occ << 4) | seed]` gives the columns of `occ` joined to
//! `seed`'s diagonal/orthogonal neighbourhood, flooding sideways through
//! contiguous runs. Sweeps alternate upward and downward until no row
//! changes, which also catches paths that dip back toward row 6.

use std::collections::VecDeque;

use crate::{Board, Player, Pos, BOARD_COLS, CELL_COUNT, WIN_END_ROW, WIN_START_ROW, ZONE_ROWS};

const COL_MASK: u8 = (1 << BOARD_COLS) - 1;

/// Columns 8-adjacent to any column in `mask`.
const fn spread(mask: u8) -> u8 {
    (mask | (mask << 1) | (mask >> 1)) & COL_MASK
}

/// Columns of `occupied` connected to the neighbourhood of `seed`.
const fn flood_row(occupied: u8, seed: u8) -> u8 {
    let mut reach = spread(seed) & occupied;
    loop {
        let next = reach | (spread(reach) & occupied);
        if next == reach {
            return reach;
        }
        reach = next;
    }
}

const fn build_connectivity() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut idx = 0;
    while idx < 256 {
        table[idx] = flood_row((idx >> 4) as u8, (idx & 0x0F) as u8);
        idx += 1;
    }
    table
}

/// Row-to-row reachability lookup, indexed by `(occupied << 4) | seed`.
pub(crate) const CONNECTIVITY: [u8; 256] = build_connectivity();

#[inline]
fn connect(occupied: u8, seed: u8) -> u8 {
    CONNECTIVITY[((occupied << 4) | seed) as usize]
}

/// A winning connection, ordered from zone row 1 to zone row 6.
#[derive(Clone, PartialEq, Eq, Debug, serde::Serialize)]
pub struct WinPath {
    pub winner: Player,
    pub cells: Vec<Pos>,
}

impl Board {
    /// Occupancy mask of each zone row, first zone row first.
    #[inline]
    fn zone_masks(&self, player: Player) -> [u8; ZONE_ROWS] {
        let mut masks = [0u8; ZONE_ROWS];
        for (i, mask) in masks.iter_mut().enumerate() {
            *mask = self.row_mask(player, WIN_START_ROW + i as u8);
        }
        masks
    }

    /// Check if the player connects both ends of the win zone.
    pub fn has_won(&self, player: Player) -> bool {
        let occ = self.zone_masks(player);
        if occ.contains(&0) {
            return false;
        }

        let last = ZONE_ROWS - 1;
        let mut reach = [0u8; ZONE_ROWS];
        reach[last] = occ[last];

        loop {
            let mut changed = false;

            for i in (0..last).rev() {
                let next = connect(occ[i], reach[i + 1] | reach[i]);
                if next != reach[i] {
                    reach[i] = next;
                    changed = true;
                }
            }
            if reach[0] != 0 {
                return true;
            }

            for i in 1..last {
                let next = connect(occ[i], reach[i - 1] | reach[i]);
                if next != reach[i] {
                    reach[i] = next;
                    changed = true;
                }
            }

            if !changed {
                return false;
            }
        }
    }

    /// Check if either player has won. White is checked first.
    pub fn check_winner(&self) -> Option<Player> {
        Player::all().find(|&p| self.has_won(p))
    }

    /// Reconstruct one winning path for the player, if any.
    ///
    /// Breadth-first from every piece on zone row 1; the first cell reached on
    /// zone row 6 ends the search.
    pub fn winning_path(&self, player: Player) -> Option<WinPath> {
        let own = self.occupancy(player);
        let mut parent: [Option<Pos>; CELL_COUNT] = [None; CELL_COUNT];
        let mut seen = 0u32;
        let mut queue = VecDeque::new();

        let first_row = own & (0x0F << (WIN_START_ROW as u32 * BOARD_COLS as u32));
        for pos in Pos::iter_mask(first_row) {
            seen |= pos.bit();
            queue.push_back(pos);
        }

        while let Some(pos) = queue.pop_front() {
            if pos.row() == WIN_END_ROW {
                let mut cells = vec![pos];
                let mut cur = pos;
                while let Some(prev) = parent[cur.index()] {
                    cells.push(prev);
                    cur = prev;
                }
                cells.reverse();
                return Some(WinPath { winner: player, cells });
            }
            for next in Pos::iter_mask(pos.neighbors() & own & !seen) {
                seen |= next.bit();
                parent[next.index()] = Some(pos);
                queue.push_back(next);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{board_from, random_board};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_connectivity_table_samples() {
        // Isolated column 0 seeded from column 0
        assert_eq!(connect(0b0101, 0b0001), 0b0001);
        // Run 1-2 reached through column 3's neighbour
        assert_eq!(connect(0b0110, 0b1000), 0b0110);
        // Columns 2-3 are too far from column 0
        assert_eq!(connect(0b1100, 0b0001), 0);
        // 0,2,3 flood from column 1 into everything
        assert_eq!(connect(0b1101, 0b0010), 0b1101);
        assert_eq!(connect(0, 0b1111), 0);
    }

    #[test]
    fn test_start_layouts_have_no_winner() {
        for layout in crate::StartingLayout::ALL {
            let board = Board::with_layout(layout);
            assert_eq!(board.check_winner(), None, "{layout}");
        }
    }

    #[test]
    fn test_diagonal_staircase_wins() {
        let board = board_from(["....", "W...", ".W..", "..W.", "...W", "..W.", ".W..", "...."]);
        assert!(board.has_won(Player::White));
        assert!(!board.has_won(Player::Black));
        let path = board.winning_path(Player::White).unwrap();
        assert_eq!(path.winner, Player::White);
        assert_eq!(path.cells.len(), 6);
        assert_eq!(path.cells.first().map(|p| p.row()), Some(1));
        assert_eq!(path.cells.last().map(|p| p.row()), Some(6));
    }

    #[test]
    fn test_gap_row_blocks_win() {
        let board = board_from(["....", "W...", "W...", "....", "W...", "W...", "W...", "...."]);
        assert!(!board.has_won(Player::White));
        assert!(board.winning_path(Player::White).is_none());
    }

    #[test]
    fn test_back_ranks_do_not_count() {
        // Rows 0 and 7 bridge nothing
        let board = board_from(["BBBB", "B...", "B...", "B...", "...B", "...B", "...B", "BBBB"]);
        assert!(!board.has_won(Player::Black));
        assert!(board.winning_path(Player::Black).is_none());
    }

    #[test]
    fn test_swapped_pieces_count_for_owner() {
        let board = board_from(["....", ".b..", ".B..", ".b..", ".B..", ".b..", ".B..", "...."]);
        assert!(board.has_won(Player::Black));
    }

    #[test]
    fn test_zigzag_path_found() {
        // The only route from row 6 dips back down from row 4 to row 5.
        let board = board_from(["....", "...W", "...W", "...W", ".W.W", "W.W.", "W...", "...."]);
        assert!(board.has_won(Player::White));
        let path = board.winning_path(Player::White).unwrap();
        assert!(path.cells.contains(&Pos::from_row_col(5, 2)));
    }

    #[test]
    fn test_path_is_connected_and_owned() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut found = 0;
        for _ in 0..2000 {
            let board = random_board(&mut rng, 65, 20);
            for player in Player::all() {
                if let Some(path) = board.winning_path(player) {
                    found += 1;
                    for pair in path.cells.windows(2) {
                        assert!(pair[0].is_adjacent(pair[1]));
                    }
                    for pos in &path.cells {
                        assert_eq!(board.owner(*pos), Some(player));
                    }
                }
            }
        }
        assert!(found > 0);
    }

    #[test]
    fn test_fast_check_matches_path_fuzz() {
        let mut rng = StdRng::seed_from_u64(42);
        for density in [40, 55, 70, 85] {
            for _ in 0..3000 {
                let board = random_board(&mut rng, density, 10);
                for player in Player::all() {
                    assert_eq!(
                        board.has_won(player),
                        board.winning_path(player).is_some(),
                        "{player}\n{board}"
                    );
                }
            }
        }
    }
}
