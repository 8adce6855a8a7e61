//! Adaptive balance engine: performance sampling, imbalance detection,
//! graduated counter-measures and the chaos schedule.

pub mod chaos;
pub mod policy;
pub mod tracker;

use std::collections::BTreeMap;

use crate::capabilities::{GhostControl, MazeOps, PlayerReading};
use crate::config::BalanceConfig;
use crate::constants::{PERSONALITY_SCALE_MAX, PERSONALITY_SCALE_MIN};
use crate::rng::Rng;
use crate::types::{AiStats, PerformanceSummary, PlayerId};

use chaos::ChaosScheduler;
use policy::{BalancingPolicy, ImbalanceAnalyzer};
use tracker::PerformanceTracker;

/// Mutable collaborators borrowed for the duration of one tick.
pub struct TickContext<'a, M: MazeOps, G: GhostControl> {
    pub maze: &'a mut M,
    pub ghosts: &'a mut G,
    pub rng: &'a mut Rng,
    pub now_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Personality {
    pub aggression: f32,
    pub chaos_preference: f32,
    pub fairness: f32,
}

impl Personality {
    pub fn new(aggression: f32, chaos_preference: f32, fairness: f32) -> Self {
        let mut personality = Self {
            aggression: 1.0,
            chaos_preference: 1.0,
            fairness: 0.0,
        };
        personality.adjust(Some(aggression), Some(chaos_preference), Some(fairness));
        personality
    }

    /// Each value is optional and clamped independently. NaN leaves the field unchanged.
    pub fn adjust(&mut self, aggression: Option<f32>, chaos_preference: Option<f32>, fairness: Option<f32>) {
        if let Some(value) = aggression.filter(|v| !v.is_nan()) {
            self.aggression = value.clamp(PERSONALITY_SCALE_MIN, PERSONALITY_SCALE_MAX);
        }
        if let Some(value) = chaos_preference.filter(|v| !v.is_nan()) {
            self.chaos_preference = value.clamp(PERSONALITY_SCALE_MIN, PERSONALITY_SCALE_MAX);
        }
        if let Some(value) = fairness.filter(|v| !v.is_nan()) {
            self.fairness = value.clamp(0.0, 1.0);
        }
    }
}

#[derive(Clone, Debug)]
pub struct BalanceEngine {
    tracker: PerformanceTracker,
    analyzer: ImbalanceAnalyzer,
    policy: BalancingPolicy,
    chaos: ChaosScheduler,
    personality: Personality,
    game_start_ms: u64,
}

impl BalanceEngine {
    pub fn new(config: &BalanceConfig, now_ms: u64, rng: &mut Rng) -> Self {
        let personality = Personality::new(config.aggression, config.chaos_preference, config.fairness);
        let mut chaos = ChaosScheduler::new(
            config.chaos_interval_min_ms,
            config.chaos_interval_max_ms,
            now_ms,
            rng,
        );
        chaos.set_chaos_preference(personality.chaos_preference);
        if personality.chaos_preference != 1.0 {
            chaos.reschedule_from(now_ms, rng);
        }
        Self {
            tracker: PerformanceTracker::new(config.tracking_interval_ms, now_ms),
            analyzer: ImbalanceAnalyzer::new(config.score_difference_threshold),
            policy: BalancingPolicy::new(config.balancing_cooldown_ms, config.powerup_spawn_radius),
            chaos,
            personality,
            game_start_ms: now_ms,
        }
    }

    pub fn register_player(&mut self, player_id: PlayerId) {
        self.tracker.register_player(player_id);
    }

    /// One balance pass. Scores are read straight from `players`, not from the
    /// tracker's sampled history. Returns the messages produced this tick.
    pub fn update<P, M, G>(&mut self, players: &[P], ctx: &mut TickContext<'_, M, G>) -> Vec<String>
    where
        P: PlayerReading,
        M: MazeOps,
        G: GhostControl,
    {
        self.tracker.update(players, ctx.now_ms);

        let mut messages = Vec::new();
        if let Some(imbalance) = self.analyzer.analyze(players) {
            let actions = self.policy.decide(imbalance.ratio);
            if !actions.is_empty() {
                messages.extend(self.policy.apply(
                    &actions,
                    &imbalance,
                    players,
                    &mut self.chaos,
                    ctx,
                ));
            }
        }

        if let Some(message) = self.chaos.tick(ctx) {
            messages.push(message);
        }
        messages
    }

    pub fn performance_summary(&self) -> BTreeMap<PlayerId, PerformanceSummary> {
        self.tracker.summary()
    }

    pub fn ai_stats(&self, now_ms: u64) -> AiStats {
        AiStats {
            total_balancing_actions: self.policy.total_actions(),
            total_chaos_events: self.chaos.total_fired(),
            game_duration_secs: now_ms.saturating_sub(self.game_start_ms) / 1000,
        }
    }

    pub fn adjust_personality(
        &mut self,
        aggression: Option<f32>,
        chaos_preference: Option<f32>,
        fairness: Option<f32>,
    ) {
        self.personality.adjust(aggression, chaos_preference, fairness);
        self.chaos.set_chaos_preference(self.personality.chaos_preference);
        log::debug!("personality adjusted: {:?}", self.personality);
    }

    pub fn personality(&self) -> Personality {
        self.personality
    }

    pub fn tracker(&self) -> &PerformanceTracker {
        &self.tracker
    }

    pub fn chaos(&self) -> &ChaosScheduler {
        &self.chaos
    }

    pub fn policy(&self) -> &BalancingPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{GridMaze, RecordingGhosts, StubPlayer};

    fn engine(rng: &mut Rng) -> BalanceEngine {
        BalanceEngine::new(&BalanceConfig::default(), 0, rng)
    }

    #[test]
    fn personality_values_are_clamped() {
        let mut personality = Personality::new(1.0, 1.0, 0.8);
        personality.adjust(Some(9.0), Some(0.1), Some(-3.0));
        assert_eq!(personality.aggression, 2.0);
        assert_eq!(personality.chaos_preference, 0.5);
        assert_eq!(personality.fairness, 0.0);

        personality.adjust(None, Some(1.2), None);
        assert_eq!(personality.aggression, 2.0);
        assert_eq!(personality.chaos_preference, 1.2);
        assert_eq!(personality.fairness, 0.0);

        personality.adjust(Some(f32::NAN), None, Some(4.0));
        assert_eq!(personality.aggression, 2.0);
        assert_eq!(personality.fairness, 1.0);
    }

    #[test]
    fn scenario_a_detects_imbalance_without_acting() {
        let mut rng = Rng::new(21);
        let mut balance = engine(&mut rng);
        let mut maze = GridMaze::open(10, 10);
        let mut ghosts = RecordingGhosts::default();
        let players = [StubPlayer::new(1, 100), StubPlayer::new(2, 80)];
        let mut ctx = TickContext {
            maze: &mut maze,
            ghosts: &mut ghosts,
            rng: &mut rng,
            now_ms: 1_000,
        };
        let messages = balance.update(&players, &mut ctx);
        assert!(messages.is_empty());
        assert!(ghosts.priorities.is_empty());
        assert_eq!(balance.ai_stats(1_000).total_balancing_actions, 0);
    }

    #[test]
    fn large_lead_retargets_ghosts_and_counts_actions() {
        let mut rng = Rng::new(22);
        let mut balance = engine(&mut rng);
        let mut maze = GridMaze::open(10, 10);
        let mut ghosts = RecordingGhosts::default();
        let players = [StubPlayer::at(1, 2, 2, 300), StubPlayer::at(2, 6, 6, 100)];
        let mut ctx = TickContext {
            maze: &mut maze,
            ghosts: &mut ghosts,
            rng: &mut rng,
            now_ms: 2_000,
        };
        let messages = balance.update(&players, &mut ctx);
        assert_eq!(messages.len(), 2);
        assert_eq!(ghosts.priorities.len(), 1);
        assert_eq!(maze.powerups.len(), 1);

        let stats = balance.ai_stats(62_000);
        assert_eq!(stats.total_balancing_actions, 2);
        assert_eq!(stats.game_duration_secs, 62);
    }

    #[test]
    fn tracker_samples_through_engine() {
        let mut rng = Rng::new(23);
        let mut balance = engine(&mut rng);
        let mut maze = GridMaze::open(5, 5);
        let mut ghosts = RecordingGhosts::default();
        balance.register_player(1);
        balance.register_player(2);
        let players = [StubPlayer::new(1, 10), StubPlayer::new(2, 10)];
        for now_ms in (0..=10_000).step_by(500) {
            let mut ctx = TickContext {
                maze: &mut maze,
                ghosts: &mut ghosts,
                rng: &mut rng,
                now_ms,
            };
            balance.update(&players, &mut ctx);
        }
        let summary = balance.performance_summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(balance.tracker().metrics(1).map(|m| m.history_len()), Some(6));
    }

    #[test]
    fn autonomous_chaos_fires_once_schedule_passes() {
        let mut rng = Rng::new(24);
        let mut balance = engine(&mut rng);
        let due = balance.chaos().next_chaos_ms();
        let mut maze = GridMaze::open(10, 10);
        let mut ghosts = RecordingGhosts::default();
        let players = [StubPlayer::new(1, 10), StubPlayer::new(2, 10)];

        let mut ctx = TickContext {
            maze: &mut maze,
            ghosts: &mut ghosts,
            rng: &mut rng,
            now_ms: due,
        };
        let messages = balance.update(&players, &mut ctx);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("CHAOS EVENT: "));
        assert_eq!(balance.ai_stats(due).total_chaos_events, 1);
    }

    #[test]
    fn chaos_preference_from_config_shortens_first_interval() {
        for seed in 1..=50u32 {
            let mut rng = Rng::new(seed);
            let config = BalanceConfig {
                chaos_preference: 2.0,
                ..BalanceConfig::default()
            };
            let balance = BalanceEngine::new(&config, 0, &mut rng);
            let next = balance.chaos().next_chaos_ms();
            assert!((15_000..=22_500).contains(&next), "seed {seed}: {next}");
        }
    }
}
