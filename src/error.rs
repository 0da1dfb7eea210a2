// Error taxonomy for the game engine
//
// Every variant carries a human-readable message. The HTTP layer maps the
// variant to a status code; the engine never mutates state before returning one.

use derive_more::{Display, Error};

/// Failures surfaced by game creation and move handling
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum GameError {
    /// Symbol or difficulty outside the allowed values
    #[display("Invalid argument: {_0}")]
    InvalidArgument(#[error(not(source))] String),

    /// No game stored under the identifier, or it has expired
    #[display("Game not found: {_0}")]
    GameNotFound(#[error(not(source))] String),

    /// Game already over, coordinates off the board, or cell taken
    #[display("Invalid move: {_0}")]
    InvalidMove(#[error(not(source))] String),

    /// Broken engine invariant, e.g. a strategy with no move to offer
    #[display("Internal error: {_0}")]
    Internal(#[error(not(source))] String),
}

impl GameError {
    /// Short category label used in error response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::InvalidArgument(_) => "Invalid argument",
            GameError::GameNotFound(_) => "Game not found",
            GameError::InvalidMove(_) => "Invalid move",
            GameError::Internal(_) => "Internal server error",
        }
    }

    /// The message without the category prefix
    pub fn message(&self) -> &str {
        match self {
            GameError::InvalidArgument(m)
            | GameError::GameNotFound(m)
            | GameError::InvalidMove(m)
            | GameError::Internal(m) => m,
        }
    }
}
