mod board;
mod engine;

pub use board::{Board, Cell, PlaceError, WIN_LENGTH};
pub use engine::{GameError, GameHub, GameSession, MoveOutcome, Phase};
