//! Hand-built collaborators shared by unit tests.

use crate::capabilities::{GhostControl, MazeOps, PlayerReading};
use crate::rng::Rng;
use crate::types::{PlayerId, Vec2};

#[derive(Clone, Debug)]
pub struct StubPlayer {
    pub id: PlayerId,
    pub position: Vec2,
    pub score: i32,
    pub deaths: u32,
    pub speed: f32,
    pub pellet_rate: f32,
}

impl StubPlayer {
    pub fn new(id: PlayerId, score: i32) -> Self {
        Self {
            id,
            position: Vec2::new(1, 1),
            score,
            deaths: 0,
            speed: 0.0,
            pellet_rate: 0.0,
        }
    }

    pub fn at(id: PlayerId, x: i32, y: i32, score: i32) -> Self {
        Self {
            position: Vec2::new(x, y),
            ..Self::new(id, score)
        }
    }
}

impl PlayerReading for StubPlayer {
    fn player_id(&self) -> PlayerId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn score(&self) -> i32 {
        self.score
    }

    fn death_count(&self) -> u32 {
        self.deaths
    }

    fn average_speed(&self, _now_ms: u64) -> f32 {
        self.speed
    }

    fn pellet_collection_rate(&self, _now_ms: u64) -> f32 {
        self.pellet_rate
    }
}

/// `#` is a wall, anything else is open floor.
#[derive(Clone, Debug)]
pub struct GridMaze {
    rows: Vec<Vec<bool>>,
    pub powerups: Vec<Vec2>,
    pub pellets: Vec<Vec2>,
    pub chaos_calls: Vec<(u64, usize)>,
}

impl GridMaze {
    pub fn from_rows(rows: &[&str]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| row.chars().map(|c| c == '#').collect())
                .collect(),
            powerups: Vec::new(),
            pellets: Vec::new(),
            chaos_calls: Vec::new(),
        }
    }

    pub fn open(width: usize, height: usize) -> Self {
        let row = ".".repeat(width);
        let rows: Vec<&str> = (0..height).map(|_| row.as_str()).collect();
        Self::from_rows(&rows)
    }

    /// A maze where every cell is a wall.
    pub fn solid(width: usize, height: usize) -> Self {
        let row = "#".repeat(width);
        let rows: Vec<&str> = (0..height).map(|_| row.as_str()).collect();
        Self::from_rows(&rows)
    }

    fn is_wall(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 {
            return true;
        }
        self.rows
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .unwrap_or(true)
    }
}

impl MazeOps for GridMaze {
    fn is_valid_position(&self, x: i32, y: i32) -> bool {
        !self.is_wall(x, y)
    }

    fn find_empty_positions_near(&self, center: Vec2, radius: i32) -> Vec<Vec2> {
        let mut out = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let (x, y) = (center.x + dx, center.y + dy);
                if !self.is_wall(x, y) {
                    out.push(Vec2::new(x, y));
                }
            }
        }
        out
    }

    fn place_powerup(&mut self, x: i32, y: i32) -> bool {
        if self.is_wall(x, y) {
            return false;
        }
        self.powerups.push(Vec2::new(x, y));
        true
    }

    fn place_pellet(&mut self, x: i32, y: i32) -> bool {
        if self.is_wall(x, y) || self.pellets.contains(&Vec2::new(x, y)) {
            return false;
        }
        self.pellets.push(Vec2::new(x, y));
        true
    }

    fn apply_chaos_mode(&mut self, duration_ms: u64, wall_count: usize, _now_ms: u64, _rng: &mut Rng) {
        self.chaos_calls.push((duration_ms, wall_count));
    }

    fn find_path_positions(&self) -> Vec<Vec2> {
        let mut out = Vec::new();
        for (y, row) in self.rows.iter().enumerate() {
            for (x, wall) in row.iter().enumerate() {
                if !wall {
                    out.push(Vec2::new(x as i32, y as i32));
                }
            }
        }
        out
    }

    fn find_pellet_free_positions(&self) -> Vec<Vec2> {
        self.find_path_positions()
            .into_iter()
            .filter(|cell| !self.pellets.contains(cell))
            .collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct RecordingGhosts {
    pub priorities: Vec<Vec<(PlayerId, f32)>>,
    pub confused: Vec<(u64, u64)>,
    pub speed_scales: Vec<f32>,
    pub slowed: Vec<(PlayerId, f32)>,
}

impl GhostControl for RecordingGhosts {
    fn set_target_priorities(&mut self, priorities: &[(PlayerId, f32)]) {
        self.priorities.push(priorities.to_vec());
    }

    fn set_all_confused(&mut self, duration_ms: u64, now_ms: u64) {
        self.confused.push((duration_ms, now_ms));
    }

    fn scale_all_speeds(&mut self, factor: f32) {
        self.speed_scales.push(factor);
    }

    fn set_speed_for_target(&mut self, player_id: PlayerId, multiplier: f32) -> usize {
        self.slowed.push((player_id, multiplier));
        1
    }
}
