//! Game state and move legality for Hex.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Cell};
use crate::disjoint_set::DisjointSet;
use crate::error::HexError;

/// Player color. Red connects top<->bottom (row extremes); Blue connects
/// left<->right (column extremes). Red always moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    None,
    Red,
    Blue,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::Red => Player::Blue,
            Player::Blue => Player::Red,
            Player::None => Player::None,
        }
    }
}

/// A move is the cell a stone is placed on.
pub type Move = Cell;

/// Key type for the per-color disjoint-sets: either a real cell or one of
/// the two virtual edge sentinels for that color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum GroupKey {
    Cell(Cell),
    Edge1,
    Edge2,
}

/// A mutable Hex position: the stone grid, whose turn it is, and the two
/// per-color disjoint-sets used to detect a connecting path.
#[derive(Clone, Debug)]
pub struct GameState {
    board: Board,
    to_play: Player,
    red_groups: DisjointSet<GroupKey>,
    blue_groups: DisjointSet<GroupKey>,
    red_played: u32,
    blue_played: u32,
}

impl GameState {
    pub fn new(size: u8) -> Self {
        let mut red_groups = DisjointSet::new();
        let mut blue_groups = DisjointSet::new();
        red_groups.set_ignored([GroupKey::Edge1, GroupKey::Edge2]);
        blue_groups.set_ignored([GroupKey::Edge1, GroupKey::Edge2]);

        Self {
            board: Board::new(size),
            to_play: Player::Red,
            red_groups,
            blue_groups,
            red_played: 0,
            blue_played: 0,
        }
    }

    pub fn size(&self) -> u8 {
        self.board.size()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_play(&self) -> Player {
        self.to_play
    }

    pub fn red_played(&self) -> u32 {
        self.red_played
    }

    pub fn blue_played(&self) -> u32 {
        self.blue_played
    }

    pub fn set_turn(&mut self, player: Player) -> Result<(), HexError> {
        if player == Player::None {
            return Err(HexError::InvalidTurn);
        }
        self.to_play = player;
        Ok(())
    }

    /// The winning color, or `Player::None` if the game is still ongoing.
    /// Once non-`None`, it is stable: no further move will change it, since
    /// `play` rejects moves once a winner exists.
    pub fn winner(&mut self) -> Player {
        if self.red_groups.connected(GroupKey::Edge1, GroupKey::Edge2) {
            Player::Red
        } else if self.blue_groups.connected(GroupKey::Edge1, GroupKey::Edge2) {
            Player::Blue
        } else {
            Player::None
        }
    }

    /// In-bounds neighbors of `cell`.
    pub fn neighbors(&self, cell: Cell) -> Vec<Cell> {
        self.board.neighbors(cell).collect()
    }

    /// All empty cells, in deterministic row-major order.
    pub fn moves(&self) -> Vec<Move> {
        self.board.empty_cells().collect()
    }

    /// Place the current player's stone at `cell` and flip `to_play`.
    ///
    /// Fails with `IllegalMove` if the cell is occupied, out of bounds, or
    /// the game has already been won.
    pub fn play(&mut self, cell: Move) -> Result<(), HexError> {
        if !self.board.in_bounds(cell) || !self.board.is_empty(cell) || self.winner() != Player::None {
            return Err(HexError::IllegalMove { cell });
        }

        let player = self.to_play;
        self.board.set(cell, player);
        let size = self.board.size();
        let neighbors: Vec<Cell> = self.board.neighbors(cell).collect();

        match player {
            Player::Red => {
                self.red_played += 1;
                if cell.row == 0 {
                    self.red_groups.join(GroupKey::Edge1, GroupKey::Cell(cell));
                }
                if cell.row == size - 1 {
                    self.red_groups.join(GroupKey::Edge2, GroupKey::Cell(cell));
                }
                for n in neighbors {
                    if self.board.get(n) == Player::Red {
                        self.red_groups.join(GroupKey::Cell(n), GroupKey::Cell(cell));
                    }
                }
            }
            Player::Blue => {
                self.blue_played += 1;
                if cell.col == 0 {
                    self.blue_groups.join(GroupKey::Edge1, GroupKey::Cell(cell));
                }
                if cell.col == size - 1 {
                    self.blue_groups.join(GroupKey::Edge2, GroupKey::Cell(cell));
                }
                for n in neighbors {
                    if self.board.get(n) == Player::Blue {
                        self.blue_groups.join(GroupKey::Cell(n), GroupKey::Cell(cell));
                    }
                }
            }
            Player::None => unreachable!("to_play is never Player::None"),
        }

        self.to_play = player.opponent();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_red_moves_first() {
        let state = GameState::new(5);
        assert_eq!(state.to_play(), Player::Red);
    }

    #[test]
    fn test_occupied_cell_is_illegal() {
        let mut state = GameState::new(5);
        let cell = Cell::new(2, 2);
        state.play(cell).unwrap();
        assert!(state.play(cell).is_err());
    }

    #[test]
    fn test_turn_alternates() {
        let mut state = GameState::new(5);
        state.play(Cell::new(0, 0)).unwrap();
        assert_eq!(state.to_play(), Player::Blue);
        state.play(Cell::new(1, 1)).unwrap();
        assert_eq!(state.to_play(), Player::Red);
    }

    #[test]
    fn test_invalid_turn_is_rejected() {
        let mut state = GameState::new(5);
        assert!(state.set_turn(Player::None).is_err());
        assert!(state.set_turn(Player::Blue).is_ok());
        assert_eq!(state.to_play(), Player::Blue);
    }

    // N=3 board where Red fully occupies the top row and a contiguous
    // column down to the bottom row - Red must win.
    #[test]
    fn test_trivial_red_win() {
        let mut state = GameState::new(3);
        state.set_turn(Player::Red).unwrap();
        for col in 0..3 {
            state.play(Cell::new(0, col)).unwrap();
            state.set_turn(Player::Red).unwrap();
        }
        state.play(Cell::new(1, 0)).unwrap();
        state.set_turn(Player::Red).unwrap();
        state.play(Cell::new(2, 0)).unwrap();

        assert_eq!(state.winner(), Player::Red);
    }

    #[test]
    fn test_winner_stable_once_set_further_play_fails() {
        let mut state = GameState::new(3);
        state.set_turn(Player::Red).unwrap();
        for col in 0..3 {
            state.play(Cell::new(0, col)).unwrap();
            state.set_turn(Player::Red).unwrap();
        }
        state.play(Cell::new(1, 0)).unwrap();
        state.set_turn(Player::Red).unwrap();
        state.play(Cell::new(2, 0)).unwrap();
        assert_eq!(state.winner(), Player::Red);

        assert!(state.play(Cell::new(2, 2)).is_err());
    }

    #[test]
    fn test_moves_returns_exactly_empty_cells() {
        let mut state = GameState::new(3);
        state.play(Cell::new(0, 0)).unwrap();
        let moves = state.moves();
        assert_eq!(moves.len(), 8);
        assert!(!moves.contains(&Cell::new(0, 0)));
    }

    #[test]
    fn test_played_counts_track_board_state() {
        let mut state = GameState::new(3);
        state.play(Cell::new(0, 0)).unwrap(); // red
        state.play(Cell::new(1, 1)).unwrap(); // blue
        state.play(Cell::new(0, 1)).unwrap(); // red
        assert_eq!(state.red_played(), 2);
        assert_eq!(state.blue_played(), 1);
        assert!((state.red_played() as i64 - state.blue_played() as i64).abs() <= 1);
    }

    #[test]
    fn test_random_playout_terminates_without_draw() {
        use rand::SeedableRng;
        use rand::seq::SliceRandom;

        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
        let mut state = GameState::new(5);
        let mut moves = state.moves();

        while state.winner() == Player::None {
            moves.shuffle(&mut rng);
            let mv = moves.pop().expect("Hex cannot draw before moves run out");
            state.play(mv).unwrap();
        }

        assert_ne!(state.winner(), Player::None);
        assert!(state.red_played() + state.blue_played() <= 25);
    }
}
