// Debug logging module for asynchronous move journaling
//
// This module provides fire-and-forget async logging to avoid blocking
// the main request/response cycle. Each applied move is written as one line
// of a JSONL file.

use log::error;
use serde::Serialize;
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::game::MoveRecord;

/// Represents a single debug log entry
#[derive(Debug, Serialize)]
struct DebugLogEntry {
    game_id: String,
    #[serde(flatten)]
    record: MoveRecord,
    timestamp: String,
}

/// Shared debug logger state
/// Uses Arc<Mutex<File>> to allow concurrent async writes from multiple tasks
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Move journal enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create move journal '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs applied moves asynchronously (fire-and-forget)
    /// This spawns a tokio task that writes to the file without blocking
    pub fn log_moves(&self, game_id: &str, records: &[MoveRecord]) {
        if !self.enabled || records.is_empty() {
            return;
        }

        let file_handle = self.file.clone();
        let game_id = game_id.to_string();
        let records = records.to_vec();

        tokio::spawn(async move {
            Self::log_moves_internal(file_handle, game_id, records).await;
        });
    }

    /// Internal async function that performs the actual file write
    async fn log_moves_internal(
        file_handle: Arc<Mutex<Option<File>>>,
        game_id: String,
        records: Vec<MoveRecord>,
    ) {
        let mut file_guard = file_handle.lock().await;

        let Some(file) = file_guard.as_mut() else {
            return;
        };

        let timestamp = chrono::Utc::now().to_rfc3339();
        let mut lines = String::new();
        for record in records {
            let entry = DebugLogEntry {
                game_id: game_id.clone(),
                record,
                timestamp: timestamp.clone(),
            };
            match serde_json::to_string(&entry) {
                Ok(json_line) => {
                    lines.push_str(&json_line);
                    lines.push('\n');
                }
                Err(e) => error!("Failed to serialize move journal entry: {}", e),
            }
        }

        if let Err(e) = file.write_all(lines.as_bytes()).await {
            error!("Failed to write move journal entry: {}", e);
        } else if let Err(e) = file.flush().await {
            // Flush to ensure data is written to disk
            error!("Failed to flush move journal: {}", e);
        }
    }
}
