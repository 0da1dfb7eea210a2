// Configuration module for reading Gomoku.toml
// This module provides OOP-style configuration management for the game server

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub board: BoardConfig,
    pub game: GameConfig,
    pub hard_ai: HardAiConfig,
    pub store: StoreConfig,
    pub debug: DebugConfig,
}

/// Board geometry
#[derive(Debug, Deserialize, Clone)]
pub struct BoardConfig {
    pub size: usize,
}

/// Per-game rules
#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    pub time_limit_minutes: i64,
}

/// Search limits for the hard computer opponent
#[derive(Debug, Deserialize, Clone)]
pub struct HardAiConfig {
    pub max_depth: u8,
    pub time_limit_ms: u64,
    /// Share of the budget after which no new depth is started
    pub deadline_fraction: f64,
    /// Chebyshev radius around occupied cells that candidate moves come from
    pub neighbor_radius: i32,
}

impl HardAiConfig {
    /// Elapsed time after which iterative deepening stops starting new depths
    pub fn soft_deadline_ms(&self) -> u64 {
        (self.time_limit_ms as f64 * self.deadline_fraction) as u64
    }
}

/// Game snapshot retention
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub retention_hours: i64,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Gomoku.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: Config =
            toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads default configuration from Gomoku.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Gomoku.toml")
    }

    /// Rejects values the engine cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.board.size < crate::board::WIN_LENGTH {
            return Err(format!(
                "board.size must be at least {}, got {}",
                crate::board::WIN_LENGTH,
                self.board.size
            ));
        }
        if self.hard_ai.max_depth < 1 {
            return Err("hard_ai.max_depth must be at least 1".to_string());
        }
        if self.hard_ai.time_limit_ms == 0 {
            return Err("hard_ai.time_limit_ms must be positive".to_string());
        }
        if !(self.hard_ai.deadline_fraction > 0.0 && self.hard_ai.deadline_fraction <= 1.0) {
            return Err("hard_ai.deadline_fraction must be in (0, 1]".to_string());
        }
        if self.hard_ai.neighbor_radius < 0 {
            return Err(format!(
                "hard_ai.neighbor_radius must not be negative, got {}",
                self.hard_ai.neighbor_radius
            ));
        }
        if self.game.time_limit_minutes <= 0 {
            return Err("game.time_limit_minutes must be positive".to_string());
        }
        Ok(())
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Gomoku.toml
    pub fn default_hardcoded() -> Self {
        Config {
            board: BoardConfig { size: 20 },
            game: GameConfig {
                time_limit_minutes: 15,
            },
            hard_ai: HardAiConfig {
                max_depth: 3,
                time_limit_ms: 2000,
                deadline_fraction: 0.8,
                neighbor_radius: 2,
            },
            store: StoreConfig {
                retention_hours: 24,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "gomoku_moves.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!(
                "Could not load Gomoku.toml ({}), using hardcoded defaults",
                e
            );
            Self::default_hardcoded()
        })
    }
}
