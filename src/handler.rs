// HTTP handler bindings for the game API
//
// This module provides thin wrapper functions that bind Rocket HTTP routes
// to the GameService. Handlers are responsible for:
// - Deserializing incoming requests
// - Extracting the service from Rocket's managed state
// - Delegating to service methods (on the blocking pool for moves)
// - Serializing game views and mapping errors to status codes

use chrono::Utc;
use log::error;
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::debug_logger::DebugLogger;
use crate::error::GameError;
use crate::game::Game;
use crate::service::{GameService, Turn};
use crate::types::Position;

/// Body of POST /game/<id>/move
#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct MoveRequest {
    pub row: i32,
    pub col: i32,
}

/// Client-facing rendering of a game
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub game_id: String,
    pub board: Vec<Vec<String>>,
    pub current_player: String,
    pub game_state: String,
    pub winning_sequence: Option<Vec<Position>>,
    pub human_symbol: String,
    pub difficulty: String,
    pub time_remaining: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

impl GameView {
    pub fn from_game(game: &Game) -> Self {
        GameView {
            game_id: game.id().to_string(),
            board: game
                .board()
                .rows()
                .into_iter()
                .map(|row| row.iter().map(|m| m.as_str().to_string()).collect())
                .collect(),
            current_player: game.current_player().mark.as_str().to_string(),
            game_state: game.state().as_str().to_string(),
            winning_sequence: game.winning_sequence().map(|s| s.to_vec()),
            human_symbol: game.human().mark.as_str().to_string(),
            difficulty: game.difficulty().as_str().to_string(),
            time_remaining: game.time_remaining_secs(Utc::now()),
            message: game.result_message(),
        }
    }
}

impl<'r> Responder<'r, 'static> for GameError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = match &self {
            GameError::InvalidArgument(_) | GameError::InvalidMove(_) => Status::BadRequest,
            GameError::GameNotFound(_) => Status::NotFound,
            GameError::Internal(_) => Status::InternalServerError,
        };
        error!("{}", self);

        let body = match &self {
            GameError::Internal(_) => json!({
                "error": self.kind(),
                "message": "An unexpected error occurred",
            }),
            _ => json!({
                "error": self.kind(),
                "message": self.message(),
            }),
        };

        (status, Json(body)).respond_to(req)
    }
}

fn respond(turn: Turn, journal: &DebugLogger) -> Json<GameView> {
    journal.log_moves(turn.game.id(), &turn.moves);
    Json(GameView::from_game(&turn.game))
}

/// GET / endpoint
/// Returns server metadata
#[get("/")]
pub fn index(service: &State<Arc<GameService>>) -> Json<Value> {
    Json(json!({
        "name": "gomoku-server",
        "boardSize": service.config().board.size,
        "winLength": crate::board::WIN_LENGTH,
        "symbols": ["X", "O"],
        "difficulties": ["easy", "hard"],
    }))
}

/// POST /game/start endpoint
/// Creates a game; the computer opens when the human picks O
#[post("/game/start?<symbol>&<difficulty>")]
pub async fn start(
    service: &State<Arc<GameService>>,
    journal: &State<DebugLogger>,
    symbol: Option<String>,
    difficulty: Option<String>,
) -> Result<(Status, Json<GameView>), GameError> {
    let service = Arc::clone(service.inner());
    let symbol = symbol.unwrap_or_default();
    let difficulty = difficulty.unwrap_or_default();
    let turn = tokio::task::spawn_blocking(move || service.create_game(&symbol, &difficulty))
        .await
        .map_err(|e| GameError::Internal(format!("Game worker failed: {}", e)))??;

    Ok((Status::Created, respond(turn, journal)))
}

/// POST /game/<id>/move endpoint
/// Applies the human move and the computer's reply
#[post("/game/<game_id>/move", format = "json", data = "<move_req>")]
pub async fn make_move(
    service: &State<Arc<GameService>>,
    journal: &State<DebugLogger>,
    game_id: String,
    move_req: Json<MoveRequest>,
) -> Result<Json<GameView>, GameError> {
    let service = Arc::clone(service.inner());
    let MoveRequest { row, col } = move_req.into_inner();
    let turn = tokio::task::spawn_blocking(move || service.make_move(&game_id, row, col))
        .await
        .map_err(|e| GameError::Internal(format!("Game worker failed: {}", e)))??;

    Ok(respond(turn, journal))
}

/// GET /game/<id>/state endpoint
#[get("/game/<game_id>/state")]
pub fn game_state(service: &State<Arc<GameService>>, game_id: &str) -> Result<Json<GameView>, GameError> {
    service
        .get_game(game_id)
        .map(|game| Json(GameView::from_game(&game)))
}
