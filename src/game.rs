// Game aggregate and its lifecycle state machine
//
// A Game owns its board and both players. All marks reach the board through
// `apply_move`, which validates first and only then mutates, so a rejected
// move leaves the game exactly as it was.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use rand::Rng;
use serde::Serialize;

use crate::ai::MoveStrategy;
use crate::board::{Board, WIN_LENGTH};
use crate::error::GameError;
use crate::types::{Difficulty, GameState, Mark, Position, Role};

/// A participant: the symbol it plays and who controls it
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    pub mark: Mark,
    pub role: Role,
}

impl Player {
    pub fn is_human(&self) -> bool {
        self.role == Role::Human
    }
}

/// One mark applied to the board, with the state it led to
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    pub position: Position,
    pub mark: Mark,
    pub role: Role,
    pub state: GameState,
}

/// Generates a random 128-bit identifier as 32 hex digits
pub fn new_game_id() -> String {
    format!("{:032x}", rand::rng().random::<u128>())
}

#[derive(Serialize, Debug, Clone)]
pub struct Game {
    id: String,
    board: Board,
    human: Player,
    computer: Player,
    current: Role,
    state: GameState,
    difficulty: Difficulty,
    started_at: DateTime<Utc>,
    last_move_at: DateTime<Utc>,
    time_limit_minutes: i64,
    winning_sequence: Option<[Position; WIN_LENGTH]>,
}

impl Game {
    /// Starts a game in which the human plays `human_mark`. X always moves
    /// first, so the computer is current when the human picks O.
    pub fn new(
        id: String,
        human_mark: Mark,
        difficulty: Difficulty,
        board_size: usize,
        time_limit_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<Self, GameError> {
        if human_mark.is_empty() {
            return Err(GameError::InvalidArgument(
                "Symbol must be either X or O".to_string(),
            ));
        }

        let human = Player {
            mark: human_mark,
            role: Role::Human,
        };
        let computer = Player {
            mark: human_mark.opponent(),
            role: Role::Computer,
        };
        let current = if human_mark == Mark::X {
            Role::Human
        } else {
            Role::Computer
        };

        Ok(Game {
            id,
            board: Board::new(board_size),
            human,
            computer,
            current,
            state: GameState::InProgress,
            difficulty,
            started_at: now,
            last_move_at: now,
            time_limit_minutes,
            winning_sequence: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn human(&self) -> &Player {
        &self.human
    }

    pub fn computer(&self) -> &Player {
        &self.computer
    }

    pub fn current_player(&self) -> &Player {
        match self.current {
            Role::Human => &self.human,
            Role::Computer => &self.computer,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_move_at(&self) -> DateTime<Utc> {
        self.last_move_at
    }

    pub fn time_limit_minutes(&self) -> i64 {
        self.time_limit_minutes
    }

    pub fn winning_sequence(&self) -> Option<&[Position; WIN_LENGTH]> {
        self.winning_sequence.as_ref()
    }

    fn deadline(&self) -> DateTime<Utc> {
        self.started_at + Duration::minutes(self.time_limit_minutes)
    }

    /// True once the game clock has run strictly past the time limit
    pub fn is_time_limit_exceeded(&self, now: DateTime<Utc>) -> bool {
        self.deadline() < now
    }

    /// Whole seconds left on the game clock, never negative
    pub fn time_remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.deadline() - now).num_seconds().max(0)
    }

    /// Places the current player's mark at (row, col) and advances the state
    /// machine: win, then full board, then time limit. The turn passes only
    /// while the game stays in progress.
    pub fn apply_move(&mut self, row: i32, col: i32, now: DateTime<Utc>) -> Result<MoveRecord, GameError> {
        if self.state.is_terminal() {
            return Err(GameError::InvalidMove("Game is already over".to_string()));
        }

        let position = Position::new(row, col);
        if !self.board.is_valid_position(position) {
            return Err(GameError::InvalidMove(format!("Invalid position: {}", position)));
        }

        let player = *self.current_player();
        if !self.board.place(row, col, player.mark) {
            return Err(GameError::InvalidMove(format!(
                "Cell already occupied at: {}",
                position
            )));
        }
        self.last_move_at = now;

        self.update_state(position, player.mark, now);
        if !self.state.is_terminal() {
            self.switch_player();
        }

        debug!(
            "Game {}: {:?} placed {} at {} -> {}",
            self.id,
            player.role,
            player.mark,
            position,
            self.state.as_str()
        );

        Ok(MoveRecord {
            position,
            mark: player.mark,
            role: player.role,
            state: self.state,
        })
    }

    /// Human entry point. A game whose clock ran out before the move arrived
    /// becomes a draw and the move is not applied (`Ok(None)`).
    pub fn play_human(&mut self, row: i32, col: i32, now: DateTime<Utc>) -> Result<Option<MoveRecord>, GameError> {
        if self.state.is_terminal() {
            return Err(GameError::InvalidMove("Game is already over".to_string()));
        }

        if self.is_time_limit_exceeded(now) {
            info!("Game {}: time limit exceeded before move, declaring draw", self.id);
            self.state = GameState::Draw;
            return Ok(None);
        }

        if !self.current_player().is_human() {
            return Err(GameError::InvalidMove(
                "It is not the human player's turn".to_string(),
            ));
        }

        self.apply_move(row, col, now).map(Some)
    }

    /// Lets `strategy` move for the computer when it is the computer's turn
    /// in a live game. Returns `Ok(None)` when there is nothing to do.
    pub fn play_computer(
        &mut self,
        strategy: &mut dyn MoveStrategy,
        now: DateTime<Utc>,
    ) -> Result<Option<MoveRecord>, GameError> {
        if self.state.is_terminal() || self.current_player().is_human() {
            return Ok(None);
        }

        let mark = self.computer.mark;
        let position = strategy.select_move(&mut self.board, mark).ok_or_else(|| {
            GameError::Internal(format!("No move available for computer in game {}", self.id))
        })?;

        self.apply_move(position.row, position.col, now).map(Some)
    }

    fn update_state(&mut self, position: Position, mark: Mark, now: DateTime<Utc>) {
        if let Some(sequence) = self.board.winning_sequence_from(position.row, position.col, mark) {
            self.winning_sequence = Some(sequence);
            if let Some(won) = GameState::won_by(mark) {
                self.state = won;
            }
            info!("Game {}: player {} won the game", self.id, mark);
            return;
        }

        if self.board.is_full() {
            self.state = GameState::Draw;
            info!("Game {}: ended in a draw (full board)", self.id);
            return;
        }

        if self.is_time_limit_exceeded(now) {
            self.state = GameState::Draw;
            info!("Game {}: ended in a draw (time limit exceeded)", self.id);
        }
    }

    fn switch_player(&mut self) {
        self.current = match self.current {
            Role::Human => Role::Computer,
            Role::Computer => Role::Human,
        };
    }

    /// Result text for a finished game, `None` while in progress
    pub fn result_message(&self) -> Option<String> {
        match self.state {
            GameState::InProgress => None,
            GameState::XWon => Some("Player X won the game!".to_string()),
            GameState::OWon => Some("Player O won the game!".to_string()),
            GameState::Draw if self.board.is_full() => {
                Some("Game ended in a draw (board is full).".to_string())
            }
            GameState::Draw => Some("Game ended in a draw due to time limit.".to_string()),
        }
    }
}
