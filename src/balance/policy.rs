use std::cmp::Reverse;

use crate::balance::chaos::ChaosScheduler;
use crate::balance::TickContext;
use crate::capabilities::{GhostControl, MazeOps, PlayerReading};
use crate::constants::{
    severity_for_ratio, LOSER_PRIORITY, REDUCED_GHOST_SPEED, WINNER_PRIORITY,
};
use crate::types::PlayerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalancingAction {
    IncreaseGhostAggression,
    SpawnPowerUp,
    TriggerChaos,
    ReduceGhostSpeed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Imbalance {
    pub winner: PlayerId,
    pub loser: PlayerId,
    pub ratio: f64,
}

/// Leader score over trailer score. A trailer at zero gives an unbounded
/// ratio unless the leader is also at zero.
pub fn imbalance_ratio(winner_score: i32, loser_score: i32) -> f64 {
    if loser_score == 0 {
        if winner_score > 0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        winner_score as f64 / loser_score as f64
    }
}

#[derive(Clone, Debug)]
pub struct ImbalanceAnalyzer {
    threshold: f64,
}

impl ImbalanceAnalyzer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Compares the raw scores of the current leader and trailer.
    pub fn analyze<P: PlayerReading>(&self, players: &[P]) -> Option<Imbalance> {
        if players.len() < 2 {
            return None;
        }
        let mut ranked: Vec<&P> = players.iter().collect();
        ranked.sort_by_key(|player| Reverse(player.score()));
        let winner = ranked.first()?;
        let loser = ranked.last()?;

        let ratio = imbalance_ratio(winner.score(), loser.score());
        if ratio > 1.0 + self.threshold {
            Some(Imbalance {
                winner: winner.player_id(),
                loser: loser.player_id(),
                ratio,
            })
        } else {
            None
        }
    }
}

#[derive(Clone, Debug)]
pub struct BalancingPolicy {
    cooldown_ms: u64,
    powerup_spawn_radius: i32,
    last_action_ms: Option<u64>,
    total_actions: u32,
}

impl BalancingPolicy {
    pub fn new(cooldown_ms: u64, powerup_spawn_radius: i32) -> Self {
        Self {
            cooldown_ms,
            powerup_spawn_radius,
            last_action_ms: None,
            total_actions: 0,
        }
    }

    /// Nested response: each severity level keeps the actions of the level below.
    pub fn decide(&self, ratio: f64) -> Vec<BalancingAction> {
        let severity = severity_for_ratio(ratio);
        let mut actions = Vec::new();
        if severity >= 1 {
            actions.push(BalancingAction::IncreaseGhostAggression);
        }
        if severity >= 2 {
            actions.push(BalancingAction::SpawnPowerUp);
        }
        if severity >= 3 {
            actions.push(BalancingAction::TriggerChaos);
        }
        actions
    }

    pub fn is_ready(&self, now_ms: u64) -> bool {
        match self.last_action_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.cooldown_ms,
            None => true,
        }
    }

    pub fn total_actions(&self) -> u32 {
        self.total_actions
    }

    pub fn last_action_ms(&self) -> Option<u64> {
        self.last_action_ms
    }

    /// Applies a batch of actions under the shared cooldown. Returns one
    /// message per action that actually took effect.
    pub fn apply<P, M, G>(
        &mut self,
        actions: &[BalancingAction],
        imbalance: &Imbalance,
        players: &[P],
        chaos: &mut ChaosScheduler,
        ctx: &mut TickContext<'_, M, G>,
    ) -> Vec<String>
    where
        P: PlayerReading,
        M: MazeOps,
        G: GhostControl,
    {
        let mut messages = Vec::new();
        if !self.is_ready(ctx.now_ms) {
            return messages;
        }

        let winner = imbalance.winner;
        let loser = imbalance.loser;
        for action in actions {
            match action {
                BalancingAction::IncreaseGhostAggression => {
                    ctx.ghosts
                        .set_target_priorities(&[(winner, WINNER_PRIORITY), (loser, LOSER_PRIORITY)]);
                    messages.push(format!(
                        "Ghosts are now hunting Player {winner} more aggressively!"
                    ));
                }
                BalancingAction::SpawnPowerUp => {
                    let Some(loser_player) = players.iter().find(|p| p.player_id() == loser) else {
                        continue;
                    };
                    let nearby = ctx
                        .maze
                        .find_empty_positions_near(loser_player.position(), self.powerup_spawn_radius);
                    let Some(spot) = ctx.rng.choose(&nearby).copied() else {
                        continue;
                    };
                    if ctx.maze.place_powerup(spot.x, spot.y) {
                        messages.push(format!("A power-up appeared near Player {loser}!"));
                    }
                }
                BalancingAction::TriggerChaos => {
                    if let Some(description) = chaos.trigger_random(ctx) {
                        messages.push(format!("CHAOS: {description}!"));
                    }
                }
                BalancingAction::ReduceGhostSpeed => {
                    ctx.ghosts.set_speed_for_target(loser, REDUCED_GHOST_SPEED);
                    messages.push(format!("Ghosts chasing Player {loser} have slowed down!"));
                }
            }
        }

        if !messages.is_empty() {
            self.last_action_ms = Some(ctx.now_ms);
            self.total_actions += messages.len() as u32;
            log::debug!(
                "balancing applied: winner={winner} loser={loser} ratio={:.2} actions={}",
                imbalance.ratio,
                messages.len()
            );
        }
        messages
    }
}
