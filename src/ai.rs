// Computer opponents
//
// Difficulty is a closed set, so dispatch is a factory over the two
// strategies rather than a registry.

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::board::Board;
use crate::config::HardAiConfig;
use crate::search::SearchStrategy;
use crate::types::{Difficulty, Mark, Position};

/// Something that can choose the computer's next move.
///
/// Implementations may place trial marks while deciding but must hand the
/// board back exactly as they received it.
pub trait MoveStrategy {
    /// Picks an empty cell for `mark`, or `None` if the board has no empty cell
    fn select_move(&mut self, board: &mut Board, mark: Mark) -> Option<Position>;
}

/// Returns the strategy for a difficulty level
pub fn strategy_for(difficulty: Difficulty, hard_ai: &HardAiConfig) -> Box<dyn MoveStrategy + Send> {
    match difficulty {
        Difficulty::Easy => Box::new(RandomStrategy::new(StdRng::from_os_rng())),
        Difficulty::Hard => Box::new(SearchStrategy::new(hard_ai.clone())),
    }
}

/// Easy opponent: uniform choice over every empty cell
pub struct RandomStrategy<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomStrategy<R> {
    pub fn new(rng: R) -> Self {
        RandomStrategy { rng }
    }
}

impl RandomStrategy<StdRng> {
    /// Deterministic variant for tests and replays
    pub fn seeded(seed: u64) -> Self {
        RandomStrategy::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MoveStrategy for RandomStrategy<R> {
    fn select_move(&mut self, board: &mut Board, mark: Mark) -> Option<Position> {
        let available = board.empty_positions();
        match available.choose(&mut self.rng) {
            Some(&position) => {
                debug!("Easy AI ({}) chose {} from {} options", mark, position, available.len());
                Some(position)
            }
            None => {
                warn!("No available moves for easy AI");
                None
            }
        }
    }
}
