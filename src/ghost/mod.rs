//! Ghost agents: per-ghost state machine plus the coordinator that assigns
//! targets and keeps the pack spread out.

pub mod behavior;
pub mod coordinator;

use std::collections::VecDeque;

use crate::constants::{clamp_speed_multiplier, GHOST_HISTORY_CAPACITY};
use crate::types::{Direction, GhostBehavior, GhostId, GhostView, PlayerId, Vec2};

#[derive(Clone, Debug)]
pub struct Ghost {
    pub id: GhostId,
    pub position: Vec2,
    pub start_position: Vec2,
    behavior: GhostBehavior,
    target_player: Option<PlayerId>,
    speed_multiplier: f32,
    base_cooldown_ms: u64,
    last_move_ms: Option<u64>,
    confusion_end_ms: Option<u64>,
    history: VecDeque<Vec2>,
}

impl Ghost {
    pub fn new(id: GhostId, position: Vec2, base_cooldown_ms: u64) -> Self {
        Self {
            id,
            position,
            start_position: position,
            behavior: GhostBehavior::Neutral,
            target_player: None,
            speed_multiplier: 1.0,
            base_cooldown_ms,
            last_move_ms: None,
            confusion_end_ms: None,
            history: VecDeque::with_capacity(GHOST_HISTORY_CAPACITY + 1),
        }
    }

    pub fn behavior(&self) -> GhostBehavior {
        self.behavior
    }

    pub fn target_player(&self) -> Option<PlayerId> {
        self.target_player
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    pub fn last_move_ms(&self) -> Option<u64> {
        self.last_move_ms
    }

    pub fn confusion_end_ms(&self) -> Option<u64> {
        self.confusion_end_ms
    }

    pub fn history(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.history.iter().copied()
    }

    /// `duration_ms` only matters for `Confused`; confusion without a duration lapses on the
    /// next `refresh_behavior`.
    pub fn set_behavior(&mut self, behavior: GhostBehavior, duration_ms: Option<u64>, now_ms: u64) {
        self.behavior = behavior;
        self.confusion_end_ms = match (behavior, duration_ms) {
            (GhostBehavior::Confused, Some(duration)) => Some(now_ms.saturating_add(duration)),
            (GhostBehavior::Confused, None) => Some(now_ms),
            _ => None,
        };
    }

    pub fn set_target_player(&mut self, player_id: Option<PlayerId>) {
        self.target_player = player_id;
    }

    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        self.speed_multiplier = clamp_speed_multiplier(multiplier);
    }

    pub fn move_interval_ms(&self) -> u64 {
        (self.base_cooldown_ms as f64 / self.speed_multiplier as f64).round() as u64
    }

    pub fn can_move(&self, now_ms: u64) -> bool {
        match self.last_move_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.move_interval_ms(),
            None => true,
        }
    }

    pub fn is_confused(&self, now_ms: u64) -> bool {
        self.behavior == GhostBehavior::Confused
            && self.confusion_end_ms.is_none_or(|end| now_ms < end)
    }

    /// Confused with a deadline that has passed.
    pub fn confusion_expired(&self, now_ms: u64) -> bool {
        self.behavior == GhostBehavior::Confused
            && self.confusion_end_ms.is_some_and(|end| now_ms >= end)
    }

    /// Applies timed transitions. Returns whether the state changed.
    pub fn refresh_behavior(&mut self, now_ms: u64) -> bool {
        if self.confusion_expired(now_ms) {
            self.behavior = GhostBehavior::Neutral;
            self.confusion_end_ms = None;
            return true;
        }
        false
    }

    /// Direction of the most recent committed step, if any.
    pub fn heading(&self) -> Direction {
        let Some(prev) = self.history.back() else {
            return Direction::None;
        };
        let delta = (self.position.x - prev.x, self.position.y - prev.y);
        Direction::CARDINAL
            .into_iter()
            .find(|dir| dir.delta() == delta)
            .unwrap_or(Direction::None)
    }

    /// Moves to `destination` and stamps the move time. Staying in place is
    /// not a move and leaves the cooldown untouched.
    pub fn commit_move(&mut self, destination: Vec2, now_ms: u64) -> bool {
        if destination == self.position {
            return false;
        }
        self.history.push_back(self.position);
        while self.history.len() > GHOST_HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.position = destination;
        self.last_move_ms = Some(now_ms);
        true
    }

    pub fn view(&self) -> GhostView {
        GhostView {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            behavior: self.behavior,
            target_player: self.target_player,
            speed_multiplier: self.speed_multiplier,
        }
    }
}
