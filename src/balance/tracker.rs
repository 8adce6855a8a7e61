use std::collections::{BTreeMap, VecDeque};

use crate::capabilities::PlayerReading;
use crate::constants::{SCORE_HISTORY_CAPACITY, SCORE_VELOCITY_WINDOW};
use crate::types::{PerformanceSummary, PlayerId};

#[derive(Clone, Debug)]
pub struct PlayerMetrics {
    pub player_id: PlayerId,
    pub avg_speed: f32,
    pub pellet_collection_rate: f32,
    /// Deaths per minute since the game started.
    pub death_frequency: f32,
    score_history: VecDeque<i32>,
    pub last_updated_ms: u64,
}

impl PlayerMetrics {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            avg_speed: 0.0,
            pellet_collection_rate: 0.0,
            death_frequency: 0.0,
            score_history: VecDeque::with_capacity(SCORE_HISTORY_CAPACITY + 1),
            last_updated_ms: 0,
        }
    }

    pub fn record_score(&mut self, score: i32) {
        self.score_history.push_back(score);
        while self.score_history.len() > SCORE_HISTORY_CAPACITY {
            self.score_history.pop_front();
        }
    }

    pub fn score_history(&self) -> impl Iterator<Item = i32> + '_ {
        self.score_history.iter().copied()
    }

    pub fn history_len(&self) -> usize {
        self.score_history.len()
    }

    /// Score change across the last few samples divided by the sample count.
    /// This is a per-sample slope, not a per-second rate.
    pub fn score_velocity(&self) -> f32 {
        let len = self.score_history.len();
        if len < 2 {
            return 0.0;
        }
        let window = len.min(SCORE_VELOCITY_WINDOW);
        let first = self.score_history[len - window];
        let last = self.score_history[len - 1];
        (last - first) as f32 / window as f32
    }

    pub fn summary(&self) -> PerformanceSummary {
        PerformanceSummary {
            avg_speed: self.avg_speed,
            collection_rate: self.pellet_collection_rate,
            death_frequency: self.death_frequency,
            score_velocity: self.score_velocity(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PerformanceTracker {
    metrics: BTreeMap<PlayerId, PlayerMetrics>,
    tracking_interval_ms: u64,
    last_sample_ms: Option<u64>,
    game_start_ms: u64,
}

impl PerformanceTracker {
    pub fn new(tracking_interval_ms: u64, game_start_ms: u64) -> Self {
        Self {
            metrics: BTreeMap::new(),
            tracking_interval_ms,
            last_sample_ms: None,
            game_start_ms,
        }
    }

    pub fn register_player(&mut self, player_id: PlayerId) {
        self.metrics.insert(player_id, PlayerMetrics::new(player_id));
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last_sample_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.tracking_interval_ms,
            None => true,
        }
    }

    /// Samples every player when the tracking interval has elapsed. Returns
    /// whether a sampling pass ran.
    pub fn update<P: PlayerReading>(&mut self, players: &[P], now_ms: u64) -> bool {
        if !self.is_due(now_ms) {
            return false;
        }

        let game_secs = (now_ms.saturating_sub(self.game_start_ms) as f32 / 1000.0).max(1.0);
        for player in players {
            let metrics = self
                .metrics
                .entry(player.player_id())
                .or_insert_with(|| PlayerMetrics::new(player.player_id()));
            metrics.avg_speed = player.average_speed(now_ms);
            metrics.pellet_collection_rate = player.pellet_collection_rate(now_ms);
            metrics.death_frequency = player.death_count() as f32 / game_secs * 60.0;
            metrics.record_score(player.score());
            metrics.last_updated_ms = now_ms;
        }

        self.last_sample_ms = Some(now_ms);
        true
    }

    pub fn metrics(&self, player_id: PlayerId) -> Option<&PlayerMetrics> {
        self.metrics.get(&player_id)
    }

    pub fn score_velocity(&self, player_id: PlayerId) -> f32 {
        self.metrics
            .get(&player_id)
            .map(PlayerMetrics::score_velocity)
            .unwrap_or(0.0)
    }

    pub fn summary(&self) -> BTreeMap<PlayerId, PerformanceSummary> {
        self.metrics
            .iter()
            .map(|(id, metrics)| (*id, metrics.summary()))
            .collect()
    }

    pub fn game_start_ms(&self) -> u64 {
        self.game_start_ms
    }
}
