//! The narrow views the balance and ghost engines have of the rest of the game.

use crate::rng::Rng;
use crate::types::{PlayerId, Vec2};

/// Read-only player state sampled by the balance engine and chased by ghosts.
pub trait PlayerReading {
    fn player_id(&self) -> PlayerId;
    fn position(&self) -> Vec2;
    fn score(&self) -> i32;
    fn death_count(&self) -> u32;
    /// Cells per second over the player's recent movement window.
    fn average_speed(&self, now_ms: u64) -> f32;
    fn pellet_collection_rate(&self, now_ms: u64) -> f32;
}

pub trait MazeOps {
    /// In bounds and not a wall.
    fn is_valid_position(&self, x: i32, y: i32) -> bool;
    fn find_empty_positions_near(&self, center: Vec2, radius: i32) -> Vec<Vec2>;
    fn place_powerup(&mut self, x: i32, y: i32) -> bool;
    fn place_pellet(&mut self, x: i32, y: i32) -> bool;
    /// Opens up to `wall_count` interior walls, each closing again at `now_ms + duration_ms`.
    fn apply_chaos_mode(&mut self, duration_ms: u64, wall_count: usize, now_ms: u64, rng: &mut Rng);
    fn find_path_positions(&self) -> Vec<Vec2>;
    /// Open cells that `place_pellet` would accept.
    fn find_pellet_free_positions(&self) -> Vec<Vec2>;
}

pub trait GhostControl {
    fn set_target_priorities(&mut self, priorities: &[(PlayerId, f32)]);
    fn set_all_confused(&mut self, duration_ms: u64, now_ms: u64);
    fn scale_all_speeds(&mut self, factor: f32);
    /// Applies `multiplier` to every ghost currently targeting `player_id`; returns how many changed.
    fn set_speed_for_target(&mut self, player_id: PlayerId, multiplier: f32) -> usize;
}
