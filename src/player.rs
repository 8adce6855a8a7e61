use std::collections::VecDeque;

use crate::capabilities::PlayerReading;
use crate::constants::{PLAYER_SPEED_BOOST, PLAYER_TRACKING_WINDOW_MS};
use crate::types::{Direction, PlayerId, PlayerView, PowerUpKind, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivePowerUp {
    pub kind: PowerUpKind,
    pub expires_at_ms: u64,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub position: Vec2,
    pub start_position: Vec2,
    pub score: i32,
    pub deaths: u32,
    pub pellets_collected: u32,
    pub bot: bool,
    pub desired_dir: Direction,
    base_cooldown_ms: u64,
    last_move_ms: Option<u64>,
    frozen_until_ms: Option<u64>,
    power_ups: Vec<ActivePowerUp>,
    /// Position left behind and when, for the speed window.
    moves: VecDeque<(Vec2, u64)>,
    pellet_times: VecDeque<u64>,
}

impl Player {
    pub fn new(id: PlayerId, start_position: Vec2, base_cooldown_ms: u64) -> Self {
        Self {
            id,
            position: start_position,
            start_position,
            score: 0,
            deaths: 0,
            pellets_collected: 0,
            bot: false,
            desired_dir: Direction::None,
            base_cooldown_ms,
            last_move_ms: None,
            frozen_until_ms: None,
            power_ups: Vec::new(),
            moves: VecDeque::new(),
            pellet_times: VecDeque::new(),
        }
    }

    pub fn with_bot(mut self, bot: bool) -> Self {
        self.bot = bot;
        self
    }

    pub fn has_power_up(&self, kind: PowerUpKind, now_ms: u64) -> bool {
        self.power_ups
            .iter()
            .any(|p| p.kind == kind && now_ms < p.expires_at_ms)
    }

    /// Stacking speed boosts multiply.
    pub fn current_speed(&self, now_ms: u64) -> f32 {
        self.power_ups
            .iter()
            .filter(|p| p.kind == PowerUpKind::SpeedBoost && now_ms < p.expires_at_ms)
            .fold(1.0, |speed, _| speed * PLAYER_SPEED_BOOST)
    }

    pub fn is_frozen(&self, now_ms: u64) -> bool {
        self.frozen_until_ms.is_some_and(|until| now_ms < until)
    }

    pub fn can_move(&self, now_ms: u64) -> bool {
        if self.is_frozen(now_ms) {
            return false;
        }
        match self.last_move_ms {
            Some(last) => {
                let required = self.base_cooldown_ms as f32 / self.current_speed(now_ms);
                now_ms.saturating_sub(last) as f32 >= required
            }
            None => true,
        }
    }

    /// Steps to `destination` when the cooldown allows it. Passability is the
    /// caller's concern.
    pub fn try_move(&mut self, destination: Vec2, now_ms: u64) -> bool {
        if !self.can_move(now_ms) || destination == self.position {
            return false;
        }
        self.moves.push_back((self.position, now_ms));
        self.trim_windows(now_ms);
        self.position = destination;
        self.last_move_ms = Some(now_ms);
        true
    }

    pub fn add_power_up(&mut self, kind: PowerUpKind, duration_ms: u64, now_ms: u64) {
        self.power_ups.push(ActivePowerUp {
            kind,
            expires_at_ms: now_ms.saturating_add(duration_ms),
        });
    }

    pub fn freeze(&mut self, duration_ms: u64, now_ms: u64) {
        self.frozen_until_ms = Some(now_ms.saturating_add(duration_ms));
    }

    /// Drops expired effects and returns the kinds that ran out.
    pub fn update_power_ups(&mut self, now_ms: u64) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();
        self.power_ups.retain(|p| {
            if now_ms >= p.expires_at_ms {
                expired.push(p.kind);
                false
            } else {
                true
            }
        });
        if self.frozen_until_ms.is_some_and(|until| now_ms >= until) {
            self.frozen_until_ms = None;
        }
        self.trim_windows(now_ms);
        expired
    }

    pub fn active_power_ups(&self, now_ms: u64) -> Vec<PowerUpKind> {
        self.power_ups
            .iter()
            .filter(|p| now_ms < p.expires_at_ms)
            .map(|p| p.kind)
            .collect()
    }

    pub fn collect_pellet(&mut self, points: i32, now_ms: u64) {
        self.score += points;
        self.pellets_collected += 1;
        self.pellet_times.push_back(now_ms);
        self.trim_windows(now_ms);
    }

    /// Score floors at zero; the player goes back to its start cell.
    pub fn die(&mut self, penalty: i32) {
        self.score = (self.score - penalty).max(0);
        self.deaths += 1;
        self.position = self.start_position;
        self.desired_dir = Direction::None;
    }

    fn trim_windows(&mut self, now_ms: u64) {
        let horizon = now_ms.saturating_sub(PLAYER_TRACKING_WINDOW_MS);
        while self.moves.front().is_some_and(|&(_, at)| at < horizon) {
            self.moves.pop_front();
        }
        while self.pellet_times.front().is_some_and(|&at| at < horizon) {
            self.pellet_times.pop_front();
        }
    }

    pub fn view(&self, now_ms: u64) -> PlayerView {
        PlayerView {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            score: self.score,
            deaths: self.deaths,
            bot: self.bot,
            frozen: self.is_frozen(now_ms),
            active_power_ups: self.active_power_ups(now_ms),
        }
    }
}

impl PlayerReading for Player {
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

    /// Manhattan distance between consecutive recorded moves over their time
    /// span, restricted to the tracking window.
    fn average_speed(&self, now_ms: u64) -> f32 {
        let horizon = now_ms.saturating_sub(PLAYER_TRACKING_WINDOW_MS);
        let recent: Vec<(Vec2, u64)> = self
            .moves
            .iter()
            .copied()
            .filter(|&(_, at)| at >= horizon && at <= now_ms)
            .collect();
        if recent.len() < 2 {
            return 0.0;
        }
        let mut distance = 0;
        for pair in recent.windows(2) {
            distance += pair[0].0.manhattan(pair[1].0);
        }
        let span_ms = recent[recent.len() - 1].1 - recent[0].1;
        distance as f32 / (span_ms as f32 / 1000.0).max(0.001)
    }

    /// Pellets per second across the tracking window; zero once the last
    /// pellet has fallen out of it.
    fn pellet_collection_rate(&self, now_ms: u64) -> f32 {
        let horizon = now_ms.saturating_sub(PLAYER_TRACKING_WINDOW_MS);
        let recent = self
            .pellet_times
            .iter()
            .filter(|&&at| at >= horizon && at <= now_ms)
            .count();
        recent as f32 / (PLAYER_TRACKING_WINDOW_MS as f32 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    fn player() -> Player {
        Player::new(1, Vec2::new(1, 1), 150)
    }

    #[test]
    fn move_cooldown_applies_between_steps() {
        let mut p = player();
        assert!(p.try_move(Vec2::new(2, 1), 0));
        assert!(!p.try_move(Vec2::new(3, 1), 149));
        assert!(p.try_move(Vec2::new(3, 1), 150));
        assert!(!p.try_move(Vec2::new(3, 1), 1_000));
    }

    #[test]
    fn speed_boost_shortens_cooldown_until_expiry() {
        let mut p = player();
        p.add_power_up(PowerUpKind::SpeedBoost, 5_000, 0);
        assert!(approx_eq(p.current_speed(100), 1.5, 1e-6));
        assert!(p.try_move(Vec2::new(2, 1), 0));
        assert!(p.try_move(Vec2::new(3, 1), 100));
        assert!(approx_eq(p.current_speed(5_000), 1.0, 1e-6));

        assert_eq!(p.update_power_ups(5_000), vec![PowerUpKind::SpeedBoost]);
        assert!(p.active_power_ups(5_000).is_empty());
    }

    #[test]
    fn frozen_player_cannot_move() {
        let mut p = player();
        p.freeze(3_000, 1_000);
        assert!(p.is_frozen(1_000));
        assert!(!p.try_move(Vec2::new(2, 1), 3_999));
        assert!(!p.is_frozen(4_000));
        assert!(p.try_move(Vec2::new(2, 1), 4_000));
        p.update_power_ups(4_000);
        assert!(!p.view(4_000).frozen);
    }

    #[test]
    fn death_applies_penalty_with_floor() {
        let mut p = player();
        p.collect_pellet(10, 0);
        p.collect_pellet(10, 0);
        p.try_move(Vec2::new(5, 5), 0);
        p.die(50);
        assert_eq!(p.score, 0);
        assert_eq!(p.deaths, 1);
        assert_eq!(p.position, Vec2::new(1, 1));

        p.score = 120;
        p.die(50);
        assert_eq!(p.score, 70);
        assert_eq!(p.deaths, 2);
    }

    #[test]
    fn average_speed_over_recent_moves() {
        let mut p = player();
        assert_eq!(p.average_speed(0), 0.0);
        for step in 0..5 {
            assert!(p.try_move(Vec2::new(2 + step, 1), step as u64 * 500));
        }
        // four gaps of one cell across two seconds
        assert!(approx_eq(p.average_speed(2_000), 2.0, 1e-4));
        assert_eq!(p.average_speed(30_000), 0.0);
    }

    #[test]
    fn pellet_rate_uses_tracking_window() {
        let mut p = player();
        for t in [1_000, 2_000, 3_000, 4_000] {
            p.collect_pellet(10, t);
        }
        assert!(approx_eq(p.pellet_collection_rate(5_000), 0.4, 1e-6));
        assert!(approx_eq(p.pellet_collection_rate(12_500), 0.2, 1e-6));
        assert_eq!(p.pellet_collection_rate(20_000), 0.0);
        assert_eq!(p.pellets_collected, 4);
    }
}
