// Hard computer opponent: iterative-deepening minimax with alpha-beta pruning
//
// The search mutates the live board in place. Every trial mark is held by a
// `Trial` guard, so each stack frame empties its cell again on the way out and
// the board is unchanged once `select_move` returns.
//
// Time management has two levels:
// - coarse: no new depth starts after `deadline_fraction` of the budget
// - fine: any node entered after the full budget scores 0 and marks the
//   current depth as interrupted, so its result is discarded

use log::debug;
use std::time::{Duration, Instant};

use crate::ai::MoveStrategy;
use crate::board::{Board, AXES, WIN_LENGTH};
use crate::config::HardAiConfig;
use crate::types::{Mark, Position};

/// Score returned as soon as a trial move completes five in a row
pub const WIN_SCORE: i32 = 10_000;

/// Half-width of the block around the center used when nothing is occupied
const FALLBACK_HALF_WIDTH: i32 = 2;

/// 10^k for k own marks in an unblocked window
const WINDOW_SCORES: [i32; WIN_LENGTH + 1] = [1, 10, 100, 1_000, 10_000, 100_000];

/// Diagnostics from the most recent decision
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Deepest depth that finished inside the budget
    pub depth_completed: u8,
    /// Root score at that depth
    pub best_score: i32,
    /// Nodes entered across all depths
    pub nodes: u64,
    /// Whether the budget cut a depth short
    pub interrupted: bool,
    /// Set when a fixed shortcut answered without searching
    pub shortcut: bool,
}

/// Empty cells within `radius` (Chebyshev) of any occupied cell, in row-major
/// order. Falls back to the empty cells of the 5x5 block around the center
/// when that set is empty.
pub fn candidate_moves(board: &Board, radius: i32) -> Vec<Position> {
    let size = board.size() as i32;
    let mut considered = vec![false; board.size() * board.size()];

    for cell in board.cells().filter(|c| !c.is_empty()) {
        let pos = cell.position();
        for row in (pos.row - radius).max(0)..=(pos.row + radius).min(size - 1) {
            for col in (pos.col - radius).max(0)..=(pos.col + radius).min(size - 1) {
                considered[(row * size + col) as usize] = true;
            }
        }
    }

    let mut moves: Vec<Position> = board
        .cells()
        .filter(|c| c.is_empty() && considered[(c.position().row * size + c.position().col) as usize])
        .map(|c| c.position())
        .collect();

    if moves.is_empty() {
        let center = board.center();
        for row in center.row - FALLBACK_HALF_WIDTH..=center.row + FALLBACK_HALF_WIDTH {
            for col in center.col - FALLBACK_HALF_WIDTH..=center.col + FALLBACK_HALF_WIDTH {
                let pos = Position::new(row, col);
                if board.mark_at(pos) == Some(Mark::Empty) {
                    moves.push(pos);
                }
            }
        }
    }

    moves
}

/// Static evaluation from the computer's point of view.
///
/// Every five-cell window on the four axes is scored once per mark: 0 if it
/// holds any opposing mark, otherwise 10 to the number of own marks. The
/// result is the computer's total minus the opponent's.
pub fn evaluate(board: &Board, computer: Mark) -> i32 {
    let human = computer.opponent();
    let span = WIN_LENGTH as i32 - 1;
    let mut computer_total = 0;
    let mut human_total = 0;

    for cell in board.cells() {
        let start = cell.position();
        for direction in AXES {
            if !board.is_valid_position(start.offset(direction, span)) {
                continue;
            }

            let mut own = 0;
            let mut theirs = 0;
            for i in 0..WIN_LENGTH as i32 {
                match board.mark_at(start.offset(direction, i)) {
                    Some(m) if m == computer => own += 1,
                    Some(m) if m == human => theirs += 1,
                    _ => {}
                }
            }

            if theirs == 0 {
                computer_total += WINDOW_SCORES[own];
            }
            if own == 0 {
                human_total += WINDOW_SCORES[theirs];
            }
        }
    }

    computer_total - human_total
}

/// Fixed-depth alpha-beta value of `board` with the computer to move and no
/// time limit
pub fn alpha_beta_value(board: &mut Board, computer: Mark, depth: u8, radius: i32) -> i32 {
    let mut searcher = Searcher::new(computer, radius, Budget::Unlimited);
    searcher.alpha_beta(board, depth, i32::MIN, i32::MAX, true, true)
}

/// Limits that stop a decision
#[derive(Debug, Clone, Copy)]
enum Budget {
    Unlimited,
    /// Wall clock: no new depth after `soft`, in-flight nodes abort after `hard`
    Clock {
        start: Instant,
        soft: Duration,
        hard: Duration,
    },
    /// Node counts in place of elapsed time, so cutoffs are reproducible
    #[cfg(test)]
    Nodes { soft: u64, hard: u64 },
}

/// State for one decision
struct Searcher {
    computer: Mark,
    human: Mark,
    radius: i32,
    budget: Budget,
    nodes: u64,
    interrupted: bool,
    root_best: Option<Position>,
}

impl Searcher {
    fn new(computer: Mark, radius: i32, budget: Budget) -> Self {
        Searcher {
            computer,
            human: computer.opponent(),
            radius,
            budget,
            nodes: 0,
            interrupted: false,
            root_best: None,
        }
    }

    fn out_of_time(&self) -> bool {
        match self.budget {
            Budget::Unlimited => false,
            Budget::Clock { start, hard, .. } => start.elapsed() > hard,
            #[cfg(test)]
            Budget::Nodes { hard, .. } => self.nodes >= hard,
        }
    }

    fn past_soft_deadline(&self) -> bool {
        match self.budget {
            Budget::Unlimited => false,
            Budget::Clock { start, soft, .. } => start.elapsed() > soft,
            #[cfg(test)]
            Budget::Nodes { soft, .. } => self.nodes > soft,
        }
    }

    /// Minimax with alpha-beta bounds. The computer maximizes. At the root
    /// every strict improvement is remembered in `root_best`.
    fn alpha_beta(
        &mut self,
        board: &mut Board,
        depth: u8,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
        root: bool,
    ) -> i32 {
        if self.out_of_time() {
            self.interrupted = true;
            return 0;
        }
        self.nodes += 1;

        if depth == 0 {
            return evaluate(board, self.computer);
        }

        let moves = candidate_moves(board, self.radius);
        if moves.is_empty() {
            return 0;
        }

        let mover = if maximizing { self.computer } else { self.human };
        let mut best = if maximizing { i32::MIN } else { i32::MAX };

        for pos in moves {
            let Some(mut trial) = board.trial(pos, mover) else {
                continue;
            };

            if trial.winning_sequence_from(pos.row, pos.col, mover).is_some() {
                if root {
                    self.root_best = Some(pos);
                }
                return if maximizing { WIN_SCORE } else { -WIN_SCORE };
            }

            let score = self.alpha_beta(&mut trial, depth - 1, alpha, beta, !maximizing, false);
            drop(trial);

            if maximizing {
                if score > best {
                    best = score;
                    if root {
                        self.root_best = Some(pos);
                    }
                }
                alpha = alpha.max(best);
            } else {
                best = best.min(score);
                beta = beta.min(best);
            }

            if beta <= alpha {
                break;
            }
        }

        best
    }
}

/// Hard opponent
pub struct SearchStrategy {
    config: HardAiConfig,
    last_stats: SearchStats,
}

impl SearchStrategy {
    pub fn new(config: HardAiConfig) -> Self {
        SearchStrategy {
            config,
            last_stats: SearchStats::default(),
        }
    }

    pub fn last_stats(&self) -> &SearchStats {
        &self.last_stats
    }

    /// First candidate that completes five for `mark`
    fn immediate_win(board: &mut Board, candidates: &[Position], mark: Mark) -> Option<Position> {
        candidates.iter().copied().find(|&pos| {
            board
                .trial(pos, mark)
                .is_some_and(|trial| trial.winning_sequence_from(pos.row, pos.col, mark).is_some())
        })
    }

    /// Iterative deepening from depth 1. Returns the root move of the deepest
    /// depth that finished; a depth cut short by the budget is discarded.
    fn deepen(&mut self, board: &mut Board, mut searcher: Searcher) -> Option<Position> {
        let mut best = None;

        for depth in 1..=self.config.max_depth {
            if searcher.past_soft_deadline() {
                debug!("Time limit approaching, stopping at depth {}", depth - 1);
                break;
            }

            searcher.root_best = None;
            let score = searcher.alpha_beta(board, depth, i32::MIN, i32::MAX, true, true);

            if searcher.interrupted {
                debug!("Depth {} interrupted by the time budget, keeping previous result", depth);
                self.last_stats.interrupted = true;
                break;
            }

            if let Some(pos) = searcher.root_best {
                best = Some(pos);
                self.last_stats.depth_completed = depth;
                self.last_stats.best_score = score;
            }

            debug!(
                "Depth {} complete: best {:?} score {} ({} nodes)",
                depth, searcher.root_best, score, searcher.nodes
            );
        }

        self.last_stats.nodes = searcher.nodes;
        best
    }
}

impl MoveStrategy for SearchStrategy {
    fn select_move(&mut self, board: &mut Board, mark: Mark) -> Option<Position> {
        let start = Instant::now();
        self.last_stats = SearchStats::default();

        if board.is_empty() {
            self.last_stats.shortcut = true;
            return Some(board.center());
        }

        let candidates = candidate_moves(board, self.config.neighbor_radius);
        if candidates.is_empty() {
            return None;
        }

        if let Some(pos) = Self::immediate_win(board, &candidates, mark) {
            debug!("Hard AI ({}) takes immediate win at {}", mark, pos);
            self.last_stats.shortcut = true;
            self.last_stats.best_score = WIN_SCORE;
            return Some(pos);
        }

        let budget = Budget::Clock {
            start,
            soft: Duration::from_millis(self.config.soft_deadline_ms()),
            hard: Duration::from_millis(self.config.time_limit_ms),
        };
        let best = self.deepen(board, Searcher::new(mark, self.config.neighbor_radius, budget));
        let chosen = best.or_else(|| candidates.first().copied());

        debug!(
            "Hard AI ({}) chose {:?} in {}ms: {:?}",
            mark,
            chosen,
            start.elapsed().as_millis(),
            self.last_stats
        );
        chosen
    }
}
