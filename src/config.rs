use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::constants::{
    BALANCING_COOLDOWN_MS, CHAOS_INTERVAL_MAX_MS, CHAOS_INTERVAL_MIN_MS, CONFUSION_DURATION_MS,
    DEATH_PENALTY, DEFAULT_AGGRESSION, DEFAULT_CHAOS_PREFERENCE, DEFAULT_FAIRNESS,
    FREEZE_DURATION_MS, GHOST_COUNT, GHOST_MIN_SEPARATION, GHOST_MOVE_COOLDOWN_MS, MAZE_HEIGHT,
    MAZE_WIDTH, MAX_GHOST_COUNT, MAX_PELLETS_PER_RESPAWN, MESSAGE_CAPACITY, MESSAGE_DISPLAY_MS, PELLET_POINTS,
    PELLET_RESPAWN_INTERVAL_MS, PLAYER_MOVE_COOLDOWN_MS, POWERUP_DURATION_MS,
    POWERUP_SPAWN_RADIUS, SCORE_DIFFERENCE_THRESHOLD, TRACKING_INTERVAL_MS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub balance: BalanceConfig,
    pub ghosts: GhostConfig,
    pub maze: MazeConfig,
    pub players: PlayerConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BalanceConfig {
    pub tracking_interval_ms: u64,
    pub score_difference_threshold: f64,
    pub balancing_cooldown_ms: u64,
    pub chaos_interval_min_ms: u64,
    pub chaos_interval_max_ms: u64,
    pub powerup_spawn_radius: i32,
    pub aggression: f32,
    pub chaos_preference: f32,
    pub fairness: f32,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            tracking_interval_ms: TRACKING_INTERVAL_MS,
            score_difference_threshold: SCORE_DIFFERENCE_THRESHOLD,
            balancing_cooldown_ms: BALANCING_COOLDOWN_MS,
            chaos_interval_min_ms: CHAOS_INTERVAL_MIN_MS,
            chaos_interval_max_ms: CHAOS_INTERVAL_MAX_MS,
            powerup_spawn_radius: POWERUP_SPAWN_RADIUS,
            aggression: DEFAULT_AGGRESSION,
            chaos_preference: DEFAULT_CHAOS_PREFERENCE,
            fairness: DEFAULT_FAIRNESS,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GhostConfig {
    pub count: usize,
    pub move_cooldown_ms: u64,
    pub min_separation: i32,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            count: GHOST_COUNT,
            move_cooldown_ms: GHOST_MOVE_COOLDOWN_MS,
            min_separation: GHOST_MIN_SEPARATION,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MazeConfig {
    pub width: i32,
    pub height: i32,
    pub pellet_respawn_interval_ms: u64,
    pub max_pellets_per_respawn: usize,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            width: MAZE_WIDTH,
            height: MAZE_HEIGHT,
            pellet_respawn_interval_ms: PELLET_RESPAWN_INTERVAL_MS,
            max_pellets_per_respawn: MAX_PELLETS_PER_RESPAWN,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerConfig {
    pub move_cooldown_ms: u64,
    pub pellet_points: i32,
    pub death_penalty: i32,
    pub powerup_duration_ms: u64,
    pub freeze_duration_ms: u64,
    pub confusion_duration_ms: u64,
    pub message_capacity: usize,
    pub message_display_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_cooldown_ms: PLAYER_MOVE_COOLDOWN_MS,
            pellet_points: PELLET_POINTS,
            death_penalty: DEATH_PENALTY,
            powerup_duration_ms: POWERUP_DURATION_MS,
            freeze_duration_ms: FREEZE_DURATION_MS,
            confusion_duration_ms: CONFUSION_DURATION_MS,
            message_capacity: MESSAGE_CAPACITY,
            message_display_ms: MESSAGE_DISPLAY_MS,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let balance = &self.balance;
        if balance.tracking_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "balance.trackingIntervalMs must be positive".to_string(),
            ));
        }
        if balance.chaos_interval_min_ms > balance.chaos_interval_max_ms {
            return Err(ConfigError::Invalid(format!(
                "balance.chaosIntervalMinMs ({}) exceeds chaosIntervalMaxMs ({})",
                balance.chaos_interval_min_ms, balance.chaos_interval_max_ms
            )));
        }
        if !balance.score_difference_threshold.is_finite()
            || balance.score_difference_threshold < 0.0
        {
            return Err(ConfigError::Invalid(
                "balance.scoreDifferenceThreshold must be a non-negative number".to_string(),
            ));
        }
        if self.ghosts.move_cooldown_ms == 0 {
            return Err(ConfigError::Invalid(
                "ghosts.moveCooldownMs must be positive".to_string(),
            ));
        }
        if self.ghosts.count > MAX_GHOST_COUNT {
            return Err(ConfigError::Invalid(format!(
                "ghosts.count must be at most {MAX_GHOST_COUNT}, got {}",
                self.ghosts.count
            )));
        }
        if self.maze.width < 7 || self.maze.height < 7 {
            return Err(ConfigError::Invalid(format!(
                "maze must be at least 7x7, got {}x{}",
                self.maze.width, self.maze.height
            )));
        }
        Ok(())
    }
}
