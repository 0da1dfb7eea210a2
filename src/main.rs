use gomoku_server::config::Config;
use gomoku_server::debug_logger::DebugLogger;
use gomoku_server::service::GameService;
use gomoku_server::store::InMemoryGameStore;
use log::info;
use rocket::fairing::AdHoc;
use std::env;
use std::sync::Arc;
use std::time::Duration;

/// How often expired game snapshots are swept from the store
const PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[rocket::launch]
async fn rocket() -> _ {
    // Lots of web hosting services expect you to bind to the port specified by the `PORT`
    // environment variable. However, Rocket looks at the `ROCKET_PORT` environment variable.
    // If we find a value for `PORT`, we set `ROCKET_PORT` to that value.
    if let Ok(port) = env::var("PORT") {
        env::set_var("ROCKET_PORT", &port);
    }

    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    info!("Starting Gomoku Server...");

    // Load configuration once at startup
    let config = Config::load_or_default();
    let store = Arc::new(InMemoryGameStore::with_retention_hours(
        config.store.retention_hours,
    ));
    let journal = DebugLogger::new(config.debug.enabled, &config.debug.log_file_path).await;
    let service = Arc::new(GameService::new(config, store));
    let purger = Arc::clone(&service);

    gomoku_server::build_rocket(service, journal).attach(AdHoc::on_liftoff(
        "Expired Game Purge",
        move |_| {
            Box::pin(async move {
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(PURGE_INTERVAL);
                    loop {
                        ticker.tick().await;
                        let purged = purger.purge_expired();
                        if purged > 0 {
                            info!("Purged {} expired games", purged);
                        }
                    }
                });
            })
        },
    ))
}
