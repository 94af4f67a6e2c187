//! Error types for board/game-state operations.

use thiserror::Error;

use crate::board::Cell;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HexError {
    #[error("cell {cell:?} is occupied or the game has already ended")]
    IllegalMove { cell: Cell },

    #[error("cannot set turn to Player::None")]
    InvalidTurn,
}
