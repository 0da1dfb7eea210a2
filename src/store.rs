// Game snapshot storage
//
// Snapshots are keyed by game id and expire a fixed retention window after
// their last save. The engine never deletes games itself; they age out.

use chrono::{DateTime, Duration, Utc};
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::game::Game;

/// Identifier-keyed snapshot store
pub trait GameStore: Send + Sync {
    /// Stores a snapshot, replacing any previous one and restarting its expiry
    fn save(&self, game: &Game);

    /// Latest snapshot, or `None` if absent or expired
    fn find(&self, game_id: &str) -> Option<Game>;

    fn delete(&self, game_id: &str);

    /// Drops every snapshot expired at `now`, returning how many were removed
    fn purge_expired_at(&self, now: DateTime<Utc>) -> usize;

    fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }
}

#[derive(Debug)]
struct StoredGame {
    game: Game,
    expires_at: DateTime<Utc>,
}

/// Process-local store backed by a hash map
#[derive(Debug)]
pub struct InMemoryGameStore {
    retention: Duration,
    entries: RwLock<HashMap<String, StoredGame>>,
}

impl InMemoryGameStore {
    pub fn new(retention: Duration) -> Self {
        InMemoryGameStore {
            retention,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Store with retention given in hours
    pub fn with_retention_hours(hours: i64) -> Self {
        Self::new(Duration::hours(hours))
    }

    pub fn save_at(&self, game: &Game, now: DateTime<Utc>) {
        let entry = StoredGame {
            game: game.clone(),
            expires_at: now + self.retention,
        };
        self.entries.write().insert(game.id().to_string(), entry);
    }

    pub fn find_at(&self, game_id: &str, now: DateTime<Utc>) -> Option<Game> {
        {
            let entries = self.entries.read();
            match entries.get(game_id) {
                None => return None,
                Some(entry) if now < entry.expires_at => return Some(entry.game.clone()),
                Some(_) => {}
            }
        }

        // Expired: evict under the write lock, re-checking in case it was re-saved
        let mut entries = self.entries.write();
        if entries.get(game_id).is_some_and(|e| now >= e.expires_at) {
            entries.remove(game_id);
            debug!("Evicted expired game {}", game_id);
        }
        None
    }

    /// Number of snapshots held, expired ones included until evicted
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl GameStore for InMemoryGameStore {
    fn save(&self, game: &Game) {
        self.save_at(game, Utc::now());
    }

    fn find(&self, game_id: &str) -> Option<Game> {
        self.find_at(game_id, Utc::now())
    }

    fn delete(&self, game_id: &str) {
        self.entries.write().remove(game_id);
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| now < e.expires_at);
        before - entries.len()
    }
}
