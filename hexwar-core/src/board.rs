//! Hex board geometry: cell coordinates and the stone grid.

use serde::{Deserialize, Serialize};

use crate::game::Player;

/// A board cell, addressed by (row, col) with 0 <= row,col < size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: u8,
    pub col: u8,
}

impl Cell {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

impl From<(u8, u8)> for Cell {
    fn from(p: (u8, u8)) -> Self {
        Cell::new(p.0, p.1)
    }
}

/// The six adjacency offsets on a Hex grid, as (d_row, d_col).
pub const NEIGHBOR_OFFSETS: [(i16, i16); 6] =
    [(-1, 0), (1, 0), (0, -1), (0, 1), (-1, 1), (1, -1)];

/// Stone grid. Initialized to `Player::None` everywhere; indexed row-major.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Board {
    size: u8,
    cells: Vec<Player>,
}

impl Board {
    pub fn new(size: u8) -> Self {
        Self {
            size,
            cells: vec![Player::None; size as usize * size as usize],
        }
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        (cell.row as usize) < self.size as usize && (cell.col as usize) < self.size as usize
    }

    fn index_of(&self, cell: Cell) -> usize {
        cell.row as usize * self.size as usize + cell.col as usize
    }

    pub fn get(&self, cell: Cell) -> Player {
        self.cells[self.index_of(cell)]
    }

    pub fn set(&mut self, cell: Cell, player: Player) {
        let idx = self.index_of(cell);
        self.cells[idx] = player;
    }

    pub fn is_empty(&self, cell: Cell) -> bool {
        self.get(cell) == Player::None
    }

    /// Neighbors of `cell` that lie on the board, in a fixed deterministic order.
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dr, dc)| {
            let row = cell.row as i16 + dr;
            let col = cell.col as i16 + dc;
            if row >= 0 && col >= 0 {
                let candidate = Cell::new(row as u8, col as u8);
                self.in_bounds(candidate).then_some(candidate)
            } else {
                None
            }
        })
    }

    /// All empty cells, in row-major order.
    pub fn empty_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == Player::None)
            .map(move |(idx, _)| {
                Cell::new((idx / self.size as usize) as u8, (idx % self.size as usize) as u8)
            })
    }
}
