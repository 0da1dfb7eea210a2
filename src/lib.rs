// Library exports for the five-in-a-row server
// This allows the binary and the integration tests to share the engine and routes

#[macro_use]
extern crate rocket;

pub mod ai;
pub mod board;
pub mod config;
pub mod debug_logger;
pub mod error;
pub mod game;
pub mod handler;
pub mod search;
pub mod service;
pub mod store;
pub mod types;

use rocket::fairing::AdHoc;
use std::sync::Arc;

/// Assembles the HTTP server around a service and a move journal
pub fn build_rocket(
    service: Arc<service::GameService>,
    journal: debug_logger::DebugLogger,
) -> rocket::Rocket<rocket::Build> {
    rocket::build()
        .manage(service)
        .manage(journal)
        .attach(AdHoc::on_response("Server ID Middleware", |_, res| {
            Box::pin(async move {
                res.set_raw_header("Server", "gomoku-server");
            })
        }))
        .mount(
            "/",
            routes![
                handler::index,
                handler::start,
                handler::make_move,
                handler::game_state
            ],
        )
}
