//! HEXWAR Core - Hex board geometry and game rules
//!
//! This crate provides the core game logic for Hex:
//! - Board geometry and adjacency
//! - Edge-connectivity via union-find
//! - Game state, move legality, and turn handling

pub mod board;
pub mod disjoint_set;
pub mod error;
pub mod game;

pub use board::{Board, Cell, NEIGHBOR_OFFSETS};
pub use disjoint_set::DisjointSet;
pub use error::HexError;
pub use game::{GameState, Move, Player};
