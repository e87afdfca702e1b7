//! Fixed-at-startup game and server settings
//!
//! Defaults reproduce the reference pacing and board exactly: an 18×12
//! torus, 10 points per food and one tick every 200ms.

use shared::{BOARD_HEIGHT, BOARD_WIDTH, FOOD_SCORE, START_LENGTH, TICK_MILLIS};
use std::time::Duration;

/// Rules shared by every session on this server
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub width: i32,
    pub height: i32,
    pub food_score: u32,
    pub tick_duration: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            food_score: FOOD_SCORE,
            tick_duration: Duration::from_millis(TICK_MILLIS),
        }
    }
}

impl GameConfig {
    /// Checks that a starting snake fits on one row without overlapping itself
    pub fn validate(&self) -> Result<(), String> {
        if self.width < START_LENGTH as i32 {
            return Err(format!(
                "board width {} is narrower than the starting snake ({})",
                self.width, START_LENGTH
            ));
        }
        if self.height < 1 {
            return Err(format!("board height must be positive, got {}", self.height));
        }
        if self.tick_duration.is_zero() {
            return Err("tick duration must be non-zero".to_string());
        }
        Ok(())
    }
}

/// Connection-level settings for the network server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub game: GameConfig,
    /// Maximum number of concurrent clients allowed
    pub max_clients: usize,
    /// Silence after which a client is considered gone
    pub client_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            max_clients: 32,
            client_timeout: Duration::from_secs(5),
        }
    }
}
