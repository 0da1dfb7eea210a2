// Game service: orchestrates the store, the state machine and the computer
//
// Each request loads a snapshot, works on that private copy and saves it once
// at the end. A failed request never saves, so no partial mutation becomes
// visible. Requests for the same game are serialised by a per-game lock;
// different games proceed independently.

use chrono::{DateTime, Utc};
use log::info;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::ai::{strategy_for, MoveStrategy};
use crate::config::Config;
use crate::error::GameError;
use crate::game::{new_game_id, Game, MoveRecord};
use crate::store::GameStore;
use crate::types::{Difficulty, Mark};

/// Builds the strategy used for a game's computer moves
pub type StrategyFactory = Box<dyn Fn(Difficulty) -> Box<dyn MoveStrategy + Send> + Send + Sync>;

/// Result of a request that may have placed marks
#[derive(Debug, Clone)]
pub struct Turn {
    pub game: Game,
    /// Moves applied by this request, in order
    pub moves: Vec<MoveRecord>,
}

pub struct GameService {
    config: Config,
    store: Arc<dyn GameStore>,
    strategies: StrategyFactory,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl GameService {
    /// Creates a service whose computer strategies follow `config`
    pub fn new(config: Config, store: Arc<dyn GameStore>) -> Self {
        let hard_ai = config.hard_ai.clone();
        let strategies: StrategyFactory =
            Box::new(move |difficulty| strategy_for(difficulty, &hard_ai));
        Self::with_strategy_factory(config, store, strategies)
    }

    /// Creates a service with a custom strategy source, e.g. seeded opponents
    pub fn with_strategy_factory(
        config: Config,
        store: Arc<dyn GameStore>,
        strategies: StrategyFactory,
    ) -> Self {
        GameService {
            config,
            store,
            strategies,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn game_lock(&self, game_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(game_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the map entry once no other request holds or waits on `lock`
    fn release_lock(&self, game_id: &str, lock: &Arc<Mutex<()>>) {
        let mut locks = self.locks.lock();
        let idle = locks.get(game_id).is_some_and(|held| Arc::ptr_eq(held, lock))
            && Arc::strong_count(lock) == 2;
        if idle {
            locks.remove(game_id);
        }
    }

    /// Number of games with a request in flight
    pub fn active_locks(&self) -> usize {
        self.locks.lock().len()
    }

    /// Purges expired snapshots from the store along with any idle lock
    /// entries, returning how many games were purged
    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let purged = self.store.purge_expired_at(now);
        self.locks.lock().retain(|_, lock| Arc::strong_count(lock) > 1);
        purged
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    fn load(&self, game_id: &str) -> Result<Game, GameError> {
        self.store
            .find(game_id)
            .ok_or_else(|| GameError::GameNotFound(format!("Game not found with ID: {}", game_id)))
    }

    /// Starts a game. When the human picks O the computer opens immediately.
    pub fn create_game(&self, symbol: &str, difficulty: &str) -> Result<Turn, GameError> {
        info!("Creating new game with symbol: {} and difficulty: {}", symbol, difficulty);

        let human_mark: Mark = symbol.parse()?;
        let difficulty: Difficulty = difficulty.parse()?;

        let mut game = Game::new(
            new_game_id(),
            human_mark,
            difficulty,
            self.config.board.size,
            self.config.game.time_limit_minutes,
            Utc::now(),
        )?;

        let mut moves = Vec::new();
        if let Some(record) = self.computer_turn(&mut game)? {
            moves.push(record);
        }

        self.store.save(&game);
        info!("Game {} created", game.id());
        Ok(Turn { game, moves })
    }

    /// Applies the human's move and, if the game continues, the computer's reply
    pub fn make_move(&self, game_id: &str, row: i32, col: i32) -> Result<Turn, GameError> {
        info!("Making move for game: {} at position: ({}, {})", game_id, row, col);

        let lock = self.game_lock(game_id);
        let result = {
            let _guard = lock.lock();
            self.play_turn(game_id, row, col)
        };
        self.release_lock(game_id, &lock);
        result
    }

    /// Body of `make_move`, run under the game's lock
    fn play_turn(&self, game_id: &str, row: i32, col: i32) -> Result<Turn, GameError> {
        let mut game = self.load(game_id)?;
        let mut moves = Vec::new();

        match game.play_human(row, col, Utc::now())? {
            Some(record) => {
                moves.push(record);
                if let Some(reply) = self.computer_turn(&mut game)? {
                    moves.push(reply);
                }
            }
            None => info!("Game {}: ended in a draw (time limit exceeded)", game_id),
        }

        self.store.save(&game);
        Ok(Turn { game, moves })
    }

    /// Current snapshot of a game
    pub fn get_game(&self, game_id: &str) -> Result<Game, GameError> {
        info!("Retrieving game with ID: {}", game_id);
        self.load(game_id)
    }

    /// Runs the configured computer opponent if it is its turn
    fn computer_turn(&self, game: &mut Game) -> Result<Option<MoveRecord>, GameError> {
        if game.state().is_terminal() || game.current_player().is_human() {
            return Ok(None);
        }

        info!(
            "Making AI move for game: {} with difficulty: {}",
            game.id(),
            game.difficulty().as_str()
        );
        let started = Instant::now();
        let mut strategy = (self.strategies)(game.difficulty());
        let record = game.play_computer(strategy.as_mut(), Utc::now())?;

        if let Some(record) = &record {
            info!(
                "Game {}: computer played {} at {} ({}ms)",
                game.id(),
                record.mark,
                record.position,
                started.elapsed().as_millis()
            );
        }
        Ok(record)
    }
}
