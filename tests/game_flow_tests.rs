//! Game Lifecycle Tests
//!
//! End-to-end scenarios through the game state machine and the service:
//! wins, draws, rejected moves, time limits and turn order.

use chrono::{Duration, Utc};
use gomoku_server::ai::{MoveStrategy, RandomStrategy};
use gomoku_server::board::{Board, WIN_LENGTH};
use gomoku_server::config::Config;
use gomoku_server::error::GameError;
use gomoku_server::game::Game;
use gomoku_server::service::{GameService, StrategyFactory};
use gomoku_server::store::{GameStore, InMemoryGameStore};
use gomoku_server::types::{Difficulty, GameState, Mark, Position, Role};
use std::sync::Arc;

/// Plays the last empty cell in row-major order, far from the human's lines
struct LastEmptyStrategy;

impl MoveStrategy for LastEmptyStrategy {
    fn select_move(&mut self, board: &mut Board, _mark: Mark) -> Option<Position> {
        board.empty_positions().last().copied()
    }
}

fn scripted_service() -> (GameService, Arc<InMemoryGameStore>) {
    let store = Arc::new(InMemoryGameStore::with_retention_hours(24));
    let factory: StrategyFactory =
        Box::new(|_: Difficulty| -> Box<dyn MoveStrategy + Send> { Box::new(LastEmptyStrategy) });
    let service = GameService::with_strategy_factory(Config::default_hardcoded(), store.clone(), factory);
    (service, store)
}

fn new_game(human: Mark, size: usize) -> Game {
    Game::new("test-game".to_string(), human, Difficulty::Easy, size, 15, Utc::now()).expect("valid game")
}

#[test]
fn test_x_moves_first_and_players_get_disjoint_symbols() {
    let game = new_game(Mark::X, 20);
    assert_eq!(game.current_player().role, Role::Human);
    assert_eq!(game.computer().mark, Mark::O);

    let game = new_game(Mark::O, 20);
    assert_eq!(game.current_player().role, Role::Computer);
    assert_eq!(game.current_player().mark, Mark::X);
    assert_eq!(game.human().mark, Mark::O);
}

#[test]
fn test_empty_symbol_is_rejected() {
    let result = Game::new("g".to_string(), Mark::Empty, Difficulty::Hard, 20, 15, Utc::now());
    assert!(matches!(result, Err(GameError::InvalidArgument(_))));
}

#[test]
fn test_human_completes_five_in_a_row_and_wins() {
    let (service, _) = scripted_service();
    let turn = service.create_game("X", "easy").expect("game created");
    assert!(turn.moves.is_empty(), "X moves first, the computer must wait");
    let id = turn.game.id().to_string();

    for col in 3..7 {
        let turn = service.make_move(&id, 10, col).expect("legal move");
        assert_eq!(turn.game.state(), GameState::InProgress);
        assert_eq!(turn.moves.len(), 2, "human move plus computer reply");
    }

    let turn = service.make_move(&id, 10, 7).expect("winning move");
    assert_eq!(turn.game.state(), GameState::XWon);
    assert_eq!(turn.moves.len(), 1, "no computer reply after a win");

    let sequence = turn.game.winning_sequence().expect("winning cells recorded");
    assert_eq!(sequence.len(), WIN_LENGTH);
    let expected: Vec<Position> = (3..8).map(|c| Position::new(10, c)).collect();
    assert_eq!(sequence.to_vec(), expected);
    assert_eq!(turn.game.result_message().as_deref(), Some("Player X won the game!"));
}

#[test]
fn test_human_beats_random_opponent_along_a_row() {
    // The human always extends the row segment it is closest to completing,
    // so a random block only delays the win.
    let mut game = new_game(Mark::X, 20);
    let mut computer = RandomStrategy::seeded(42);

    for _ in 0..200 {
        if game.state() != GameState::InProgress {
            break;
        }
        let target = best_row_window_cell(game.board());
        game.play_human(target.row, target.col, Utc::now()).expect("legal human move");
        game.play_computer(&mut computer, Utc::now()).expect("computer move");
    }

    assert_eq!(game.state(), GameState::XWon);
    let sequence = game.winning_sequence().unwrap();
    assert!(sequence.iter().all(|p| game.board().mark_at(*p) == Some(Mark::X)));
}

/// First empty cell of the horizontal window with the most X and no O
fn best_row_window_cell(board: &Board) -> Position {
    let size = board.size() as i32;
    let mut best: Option<(usize, Position)> = None;
    for row in 0..size {
        for start in 0..=size - WIN_LENGTH as i32 {
            let cells: Vec<Position> = (start..start + WIN_LENGTH as i32).map(|c| Position::new(row, c)).collect();
            if cells.iter().any(|p| board.mark_at(*p) == Some(Mark::O)) {
                continue;
            }
            let own = cells.iter().filter(|p| board.mark_at(**p) == Some(Mark::X)).count();
            let free = cells.iter().copied().find(|p| board.mark_at(*p) == Some(Mark::Empty));
            if let Some(free) = free {
                if best.map_or(true, |(count, _)| own > count) {
                    best = Some((own, free));
                }
            }
        }
    }
    best.expect("an open window exists").1
}

#[test]
fn test_move_after_game_over_is_rejected() {
    let mut game = new_game(Mark::X, 20);
    for col in 0..4 {
        game.apply_move(0, col, Utc::now()).unwrap(); // human X
        game.apply_move(5, col, Utc::now()).unwrap(); // computer O
    }
    game.apply_move(0, 4, Utc::now()).unwrap();
    assert_eq!(game.state(), GameState::XWon);

    let before = game.board().clone();
    let result = game.apply_move(9, 9, Utc::now());
    assert!(matches!(result, Err(GameError::InvalidMove(_))));
    assert!(matches!(game.play_human(9, 9, Utc::now()), Err(GameError::InvalidMove(_))));
    assert_eq!(game.board(), &before);
    assert_eq!(game.state(), GameState::XWon);
}

#[test]
fn test_service_rejects_move_after_win() {
    let (service, _) = scripted_service();
    let id = service.create_game("X", "easy").unwrap().game.id().to_string();
    for col in 0..5 {
        service.make_move(&id, 2, col).unwrap();
    }
    assert_eq!(service.get_game(&id).unwrap().state(), GameState::XWon);

    let err = service.make_move(&id, 3, 3).unwrap_err();
    assert_eq!(err, GameError::InvalidMove("Game is already over".to_string()));
}

#[test]
fn test_out_of_range_move_is_rejected() {
    let (service, _) = scripted_service();
    let id = service.create_game("X", "easy").unwrap().game.id().to_string();
    service.make_move(&id, 0, 0).unwrap();
    let before = service.get_game(&id).unwrap();

    for (row, col) in [(-1, 0), (0, -1), (20, 3), (3, 20)] {
        let err = service.make_move(&id, row, col).unwrap_err();
        assert!(matches!(err, GameError::InvalidMove(_)), "({}, {}) gave {:?}", row, col, err);
    }

    let after = service.get_game(&id).unwrap();
    assert_eq!(after.board(), before.board());
    assert_eq!(after.current_player(), before.current_player());
}

#[test]
fn test_occupied_cell_is_rejected_without_side_effects() {
    let (service, _) = scripted_service();
    let id = service.create_game("X", "easy").unwrap().game.id().to_string();
    let turn = service.make_move(&id, 4, 4).unwrap();
    let reply = turn.moves[1].position;

    for (row, col) in [(4, 4), (reply.row, reply.col)] {
        let err = service.make_move(&id, row, col).unwrap_err();
        assert!(matches!(err, GameError::InvalidMove(_)));
    }
    assert_eq!(service.get_game(&id).unwrap().board(), turn.game.board());
}

#[test]
fn test_full_board_without_five_is_a_draw() {
    // Two-column stripes: no row, column or diagonal of the 5x5 board is uniform
    let pattern = [
        "XXOOX", //
        "OOXXO", //
        "XXOOX", //
        "OOXXO", //
        "XXOOX",
    ];
    let mut xs = Vec::new();
    let mut os = Vec::new();
    for (row, line) in pattern.iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            let pos = (row as i32, col as i32);
            if ch == 'X' {
                xs.push(pos)
            } else {
                os.push(pos)
            }
        }
    }
    assert_eq!((xs.len(), os.len()), (13, 12));

    let mut game = new_game(Mark::X, 5);
    for i in 0..xs.len() {
        let (row, col) = xs[i];
        game.apply_move(row, col, Utc::now()).unwrap();
        if let Some(&(row, col)) = os.get(i) {
            assert_eq!(game.state(), GameState::InProgress);
            game.apply_move(row, col, Utc::now()).unwrap();
        }
    }

    assert!(game.board().is_full());
    assert_eq!(game.state(), GameState::Draw);
    assert!(game.winning_sequence().is_none());
    assert_eq!(
        game.result_message().as_deref(),
        Some("Game ended in a draw (board is full).")
    );
}

#[test]
fn test_expired_clock_turns_next_move_into_draw() {
    let started = Utc::now() - Duration::minutes(16);
    let mut game = Game::new("late".to_string(), Mark::X, Difficulty::Easy, 20, 15, started).unwrap();

    let outcome = game.play_human(10, 10, Utc::now()).expect("time-out is not an error");
    assert!(outcome.is_none(), "move must not be applied");
    assert_eq!(game.state(), GameState::Draw);
    assert!(game.board().is_empty());
    assert_eq!(game.time_remaining_secs(Utc::now()), 0);
    assert_eq!(
        game.result_message().as_deref(),
        Some("Game ended in a draw due to time limit.")
    );
}

#[test]
fn test_clock_expiring_during_move_ends_in_draw() {
    let started = Utc::now();
    let mut game = Game::new("g".to_string(), Mark::X, Difficulty::Easy, 20, 15, started).unwrap();
    let late = started + Duration::minutes(15) + Duration::seconds(1);

    let record = game.apply_move(3, 3, late).unwrap();
    assert_eq!(record.state, GameState::Draw);
    assert_eq!(game.state(), GameState::Draw);
}

#[test]
fn test_win_takes_priority_over_time_limit() {
    let started = Utc::now();
    let mut game = Game::new("g".to_string(), Mark::X, Difficulty::Easy, 20, 15, started).unwrap();
    for col in 0..4 {
        game.apply_move(1, col, started).unwrap();
        game.apply_move(8, col, started).unwrap();
    }

    let late = started + Duration::minutes(30);
    game.apply_move(1, 4, late).unwrap();
    assert_eq!(game.state(), GameState::XWon);
}

#[test]
fn test_turn_alternates_only_while_in_progress() {
    let mut game = new_game(Mark::X, 20);
    let first = game.apply_move(0, 0, Utc::now()).unwrap();
    assert_eq!(first.role, Role::Human);
    assert_eq!(game.current_player().role, Role::Computer);

    let second = game.apply_move(1, 1, Utc::now()).unwrap();
    assert_eq!(second.mark, Mark::O);
    assert_eq!(game.current_player().role, Role::Human);
}

#[test]
fn test_human_cannot_move_on_computer_turn() {
    let mut game = new_game(Mark::O, 20);
    let err = game.play_human(0, 0, Utc::now()).unwrap_err();
    assert!(matches!(err, GameError::InvalidMove(_)));
    assert!(game.board().is_empty());
}

#[test]
fn test_computer_opens_when_human_picks_o() {
    let store = Arc::new(InMemoryGameStore::with_retention_hours(24));
    let service = GameService::new(Config::default_hardcoded(), store.clone());

    let turn = service.create_game("O", "hard").expect("game created");
    assert_eq!(turn.moves.len(), 1);
    assert_eq!(turn.moves[0].mark, Mark::X);
    assert_eq!(turn.moves[0].position, Position::new(10, 10));
    assert_eq!(turn.game.current_player().role, Role::Human);

    let stored = store.find(turn.game.id()).expect("game saved");
    assert_eq!(stored.board().mark_at(Position::new(10, 10)), Some(Mark::X));
}

#[test]
fn test_invalid_arguments_at_creation() {
    let (service, store) = scripted_service();
    assert!(matches!(service.create_game("Z", "easy"), Err(GameError::InvalidArgument(_))));
    assert!(matches!(service.create_game("X", "medium"), Err(GameError::InvalidArgument(_))));
    assert!(store.is_empty(), "failed creation must not store anything");
}

#[test]
fn test_unknown_game_is_not_found() {
    let (service, _) = scripted_service();
    assert!(matches!(service.get_game("missing"), Err(GameError::GameNotFound(_))));
    assert!(matches!(service.make_move("missing", 0, 0), Err(GameError::GameNotFound(_))));
}

#[test]
fn test_easy_game_through_service_stays_consistent() {
    let store = Arc::new(InMemoryGameStore::with_retention_hours(24));
    let service = GameService::new(Config::default_hardcoded(), store);
    let turn = service.create_game("X", "easy").unwrap();
    let id = turn.game.id().to_string();

    let turn = service.make_move(&id, 10, 10).unwrap();
    assert_eq!(turn.moves.len(), 2);
    let reply = turn.moves[1];
    assert_eq!(reply.role, Role::Computer);
    assert_eq!(turn.game.board().mark_at(reply.position), Some(Mark::O));
    assert_eq!(turn.game.board().empty_positions().len(), 398);
}

#[test]
fn test_lock_entries_do_not_outlive_requests() {
    let (service, store) = scripted_service();
    let ids: Vec<String> = (0..50)
        .map(|_| service.create_game("X", "easy").unwrap().game.id().to_string())
        .collect();

    for (i, id) in ids.iter().enumerate() {
        service.make_move(id, 0, (i % 20) as i32).unwrap();
    }
    assert!(service.make_move("missing", 0, 0).is_err());
    assert_eq!(service.active_locks(), 0);

    let purged = service.purge_expired_at(Utc::now() + Duration::hours(25));
    assert_eq!(purged, 50);
    assert!(store.is_empty());
    assert!(ids.iter().all(|id| service.get_game(id).is_err()));
    assert_eq!(service.active_locks(), 0);
}

#[test]
fn test_concurrent_moves_on_one_game_are_serialised() {
    let (service, _) = scripted_service();
    let service = Arc::new(service);
    let id = service.create_game("X", "easy").unwrap().game.id().to_string();

    let handles: Vec<_> = (0..8)
        .map(|col| {
            let service = Arc::clone(&service);
            let id = id.clone();
            std::thread::spawn(move || service.make_move(&id, 5, col * 2).is_ok())
        })
        .collect();
    let applied = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
    assert!(applied > 0);

    let game = service.get_game(&id).unwrap();
    let xs = game.board().cells().filter(|c| c.mark() == Mark::X).count();
    let os = game.board().cells().filter(|c| c.mark() == Mark::O).count();
    assert_eq!(xs, applied, "every accepted move is kept");
    assert_eq!(os, applied, "each accepted move got exactly one reply");
    assert_eq!(service.active_locks(), 0);
}
