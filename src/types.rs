// Core value types shared by the board, the game engine and the HTTP layer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GameError;

/// Contents of a single board cell
#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Mark {
    #[default]
    #[serde(rename = "")]
    Empty,
    X,
    O,
}

impl Mark {
    /// The mark played against this one. `Empty` has no opponent.
    pub fn opponent(&self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
            Mark::Empty => Mark::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Mark::Empty
    }

    /// Wire representation, empty cells render as an empty string
    pub fn as_str(&self) -> &'static str {
        match self {
            Mark::Empty => "",
            Mark::X => "X",
            Mark::O => "O",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a player symbol. Only `X` and `O` are accepted.
impl FromStr for Mark {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(Mark::X),
            "O" => Ok(Mark::O),
            other => Err(GameError::InvalidArgument(format!(
                "Symbol must be either X or O, got '{}'",
                other
            ))),
        }
    }
}

/// Board coordinate. Signed so that out-of-range requests such as (-1, 0)
/// can be represented and rejected rather than wrapped.
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Position { row, col }
    }

    /// Steps `distance` cells along a direction vector
    pub fn offset(&self, direction: (i32, i32), distance: i32) -> Position {
        Position {
            row: self.row + direction.0 * distance,
            col: self.col + direction.1 * distance,
        }
    }

    /// Chebyshev (king-move) distance
    pub fn chebyshev_distance(&self, other: &Position) -> i32 {
        (self.row - other.row).abs().max((self.col - other.col).abs())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Who controls a player
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Human,
    Computer,
}

/// Strength of the computer opponent
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "hard" => Ok(Difficulty::Hard),
            other => Err(GameError::InvalidArgument(format!(
                "Difficulty level must be either easy or hard, got '{}'",
                other
            ))),
        }
    }
}

/// Lifecycle of a game. Every state except `InProgress` is terminal.
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum GameState {
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "X_WON")]
    XWon,
    #[serde(rename = "O_WON")]
    OWon,
    #[serde(rename = "DRAW")]
    Draw,
}

impl GameState {
    /// The won state belonging to a mark
    pub fn won_by(mark: Mark) -> Option<GameState> {
        match mark {
            Mark::X => Some(GameState::XWon),
            Mark::O => Some(GameState::OWon),
            Mark::Empty => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self != GameState::InProgress
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::InProgress => "IN_PROGRESS",
            GameState::XWon => "X_WON",
            GameState::OWon => "O_WON",
            GameState::Draw => "DRAW",
        }
    }
}
