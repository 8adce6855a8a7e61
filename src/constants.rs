pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const MAZE_WIDTH: i32 = 25;
pub const MAZE_HEIGHT: i32 = 19;
pub const GHOST_PEN_RADIUS: i32 = 2;
pub const PELLET_RESPAWN_INTERVAL_MS: u64 = 15_000;
pub const MAX_PELLETS_PER_RESPAWN: usize = 10;

pub const TRACKING_INTERVAL_MS: u64 = 2_000;
pub const SCORE_HISTORY_CAPACITY: usize = 10;
pub const SCORE_VELOCITY_WINDOW: usize = 5;

pub const SCORE_DIFFERENCE_THRESHOLD: f64 = 0.2;
pub const BALANCING_COOLDOWN_MS: u64 = 5_000;
pub const MAX_SEVERITY: u8 = 3;
pub const WINNER_PRIORITY: f32 = 2.0;
pub const LOSER_PRIORITY: f32 = 0.5;
pub const REDUCED_GHOST_SPEED: f32 = 0.7;
pub const POWERUP_SPAWN_RADIUS: i32 = 3;

pub const CHAOS_INTERVAL_MIN_MS: u64 = 30_000;
pub const CHAOS_INTERVAL_MAX_MS: u64 = 45_000;
pub const CHAOS_WALLS_MIN: i32 = 3;
pub const CHAOS_WALLS_MAX: i32 = 7;
pub const CHAOS_PELLETS_MIN: i32 = 5;
pub const CHAOS_PELLETS_MAX: i32 = 10;
pub const GHOST_SPEED_BOOST_FACTOR: f32 = 1.5;

pub const PERSONALITY_SCALE_MIN: f32 = 0.5;
pub const PERSONALITY_SCALE_MAX: f32 = 2.0;
pub const DEFAULT_AGGRESSION: f32 = 1.0;
pub const DEFAULT_CHAOS_PREFERENCE: f32 = 1.0;
pub const DEFAULT_FAIRNESS: f32 = 0.8;

pub const GHOST_COUNT: usize = 4;
/// Spawn rings stay inside the pen: four cells per ring.
pub const MAX_GHOST_COUNT: usize = 4 * GHOST_PEN_RADIUS as usize;
pub const GHOST_MOVE_COOLDOWN_MS: u64 = 500;
pub const GHOST_MIN_SEPARATION: i32 = 3;
pub const GHOST_HISTORY_CAPACITY: usize = 10;
pub const SPEED_MULTIPLIER_MIN: f32 = 0.1;
pub const SPEED_MULTIPLIER_MAX: f32 = 3.0;
pub const PRIORITY_SPEED_FACTOR: f32 = 0.5;

pub const PLAYER_MOVE_COOLDOWN_MS: u64 = 150;
pub const PLAYER_SPEED_BOOST: f32 = 1.5;
pub const PLAYER_TRACKING_WINDOW_MS: u64 = 10_000;
pub const PELLET_POINTS: i32 = 10;
pub const DEATH_PENALTY: i32 = 50;
pub const POWERUP_DURATION_MS: u64 = 5_000;
pub const FREEZE_DURATION_MS: u64 = 3_000;
pub const CONFUSION_DURATION_MS: u64 = 5_000;

pub const MESSAGE_CAPACITY: usize = 5;
pub const MESSAGE_DISPLAY_MS: u64 = 3_000;

pub const BOT_DANGER_DISTANCE: i32 = 3;

/// Maps an imbalance ratio onto the integer severity that gates the response.
///
/// Ratios below 2.0 floor to severity 0 even when they already count as an
/// imbalance; an unbounded ratio (trailing player at zero) saturates.
pub fn severity_for_ratio(ratio: f64) -> u8 {
    if ratio.is_nan() {
        return 0;
    }
    if !ratio.is_finite() {
        return if ratio > 0.0 { MAX_SEVERITY } else { 0 };
    }
    (ratio - 1.0).floor().clamp(0.0, MAX_SEVERITY as f64) as u8
}

pub fn clamp_speed_multiplier(multiplier: f32) -> f32 {
    if multiplier.is_nan() {
        return SPEED_MULTIPLIER_MIN;
    }
    multiplier.clamp(SPEED_MULTIPLIER_MIN, SPEED_MULTIPLIER_MAX)
}
