use std::collections::BTreeSet;

use crate::balance::{BalanceEngine, TickContext};
use crate::capabilities::{GhostControl, MazeOps};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::ghost::coordinator::GhostCoordinator;
use crate::maze::Maze;
use crate::player::Player;
use crate::rng::Rng;
use crate::types::{
    Direction, DisplayMessage, GameSummary, MessageCategory, PlayerId, PowerUpKind, RuntimeEvent, ScoreEntry,
    Snapshot,
};

mod bot_system;
mod utils;

pub use self::utils::MessageLog;

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    pub seed: u32,
    /// Which of the two seats the built-in bot drives.
    pub bots: [bool; 2],
}

impl Default for GameEngineOptions {
    fn default() -> Self {
        Self {
            seed: 1,
            bots: [false, false],
        }
    }
}

/// Owns every piece of match state and advances it one tick at a time
/// against the injected clock.
#[derive(Clone, Debug)]
pub struct GameEngine<C: Clock> {
    pub started_at_ms: u64,
    pub config: EngineConfig,

    clock: C,
    rng: Rng,
    maze: Maze,
    players: Vec<Player>,
    ghosts: GhostCoordinator,
    balance: BalanceEngine,
    events: Vec<RuntimeEvent>,
    messages: MessageLog,
    bot_think_at: Vec<u64>,
    tick_counter: u64,
    last_tick_ms: u64,
}

impl<C: Clock> GameEngine<C> {
    pub fn new(config: EngineConfig, options: GameEngineOptions, clock: C) -> Self {
        let mut rng = Rng::new(options.seed);
        let started_at_ms = clock.now_ms();
        let maze = Maze::generate(&config.maze, started_at_ms);

        let players: Vec<Player> = maze
            .player_starts()
            .into_iter()
            .zip(options.bots)
            .enumerate()
            .map(|(idx, (start, bot))| {
                Player::new(idx as PlayerId + 1, start, config.players.move_cooldown_ms).with_bot(bot)
            })
            .collect();

        let ghosts = GhostCoordinator::create_default_ghosts(&config.ghosts, maze.ghost_pen_center());
        let mut balance = BalanceEngine::new(&config.balance, started_at_ms, &mut rng);
        for player in &players {
            balance.register_player(player.id);
        }
        let bot_think_at = players
            .iter()
            .map(|_| started_at_ms + rng.int(50, 180) as u64)
            .collect();
        let messages = MessageLog::new(config.players.message_capacity, config.players.message_display_ms);

        log::info!(
            "match created: seed={} maze={}x{} ghosts={} pellets={}",
            options.seed,
            maze.width,
            maze.height,
            ghosts.ghosts().len(),
            maze.pellet_count()
        );

        Self {
            started_at_ms,
            config,
            clock,
            rng,
            maze,
            players,
            ghosts,
            balance,
            events: Vec::new(),
            messages,
            bot_think_at,
            tick_counter: 0,
            last_tick_ms: started_at_ms,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.last_tick_ms.saturating_sub(self.started_at_ms)
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn ghosts(&self) -> &GhostCoordinator {
        &self.ghosts
    }

    pub fn balance(&self) -> &BalanceEngine {
        &self.balance
    }

    pub fn visible_messages(&self) -> Vec<DisplayMessage> {
        self.messages.visible()
    }

    /// Sets the direction a player keeps heading in. Returns false for an
    /// unknown player.
    pub fn queue_move(&mut self, player_id: PlayerId, dir: Direction) -> bool {
        match self.players.iter_mut().find(|p| p.id == player_id) {
            Some(player) => {
                player.desired_dir = dir;
                true
            }
            None => false,
        }
    }

    pub fn adjust_personality(
        &mut self,
        aggression: Option<f32>,
        chaos_preference: Option<f32>,
        fairness: Option<f32>,
    ) {
        self.balance.adjust_personality(aggression, chaos_preference, fairness);
    }

    pub fn step(&mut self) {
        let now_ms = self.clock.now_ms().max(self.last_tick_ms);
        self.tick_counter += 1;
        self.last_tick_ms = now_ms;

        self.update_maze(now_ms);
        for player in &mut self.players {
            player.update_power_ups(now_ms);
        }
        self.update_bots(now_ms);
        self.update_players(now_ms);
        self.update_balance(now_ms);
        self.ghosts
            .update_all(&self.maze, &self.players, &mut self.rng, now_ms);
        self.resolve_ghost_collisions(now_ms);
        self.messages.expire(now_ms);
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let now_ms = self.last_tick_ms;
        let snapshot = Snapshot {
            tick: self.tick_counter,
            now_ms,
            players: self.players.iter().map(|p| p.view(now_ms)).collect(),
            ghosts: self.ghosts.views(),
            pellets_remaining: self.maze.pellet_count(),
            completion: self.maze.completion_percentage(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
            messages: self.messages.visible(),
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn build_summary(&self) -> GameSummary {
        let mut ranking: Vec<ScoreEntry> = self
            .players
            .iter()
            .map(|player| ScoreEntry {
                player_id: player.id,
                score: player.score,
                pellets: player.pellets_collected,
                deaths: player.deaths,
            })
            .collect();
        ranking.sort_by(|a, b| b.score.cmp(&a.score));

        GameSummary {
            duration_ms: self.elapsed_ms(),
            ranking,
            performance: self.balance.performance_summary(),
            ai_stats: self.balance.ai_stats(self.last_tick_ms),
            pellets_remaining: self.maze.pellet_count(),
            completion: self.maze.completion_percentage(),
        }
    }

    fn emit(&mut self, event: RuntimeEvent, now_ms: u64) {
        self.messages.push(event.message(), event.category(), now_ms);
        self.events.push(event);
    }

    fn update_maze(&mut self, now_ms: u64) {
        let update = self.maze.update_temporary_modifications(now_ms, &mut self.rng);
        if update.pellets_respawned > 0 {
            self.emit(
                RuntimeEvent::PelletsRespawned {
                    count: update.pellets_respawned,
                },
                now_ms,
            );
        }
    }

    fn update_players(&mut self, now_ms: u64) {
        for idx in 0..self.players.len() {
            let dir = self.players[idx].desired_dir;
            if dir == Direction::None || !self.players[idx].can_move(now_ms) {
                continue;
            }
            let next = self.players[idx].position.offset(dir);
            if !self.maze.is_valid_position(next.x, next.y) {
                continue;
            }
            if self.players[idx].try_move(next, now_ms) {
                self.handle_pickups(idx, now_ms);
            }
        }
    }

    fn handle_pickups(&mut self, idx: usize, now_ms: u64) {
        let player_id = self.players[idx].id;
        let pos = self.players[idx].position;

        if self.maze.collect_pellet(pos.x, pos.y) {
            let points = self.config.players.pellet_points;
            self.players[idx].collect_pellet(points, now_ms);
            self.emit(RuntimeEvent::PelletCollected { player_id, points }, now_ms);
        }

        if self.maze.collect_powerup(pos.x, pos.y) {
            let kind = self
                .rng
                .choose(&PowerUpKind::ALL)
                .copied()
                .unwrap_or(PowerUpKind::SpeedBoost);
            let duration_ms = self.config.players.powerup_duration_ms;
            self.players[idx].add_power_up(kind, duration_ms, now_ms);
            self.apply_power_up(idx, kind, now_ms);
            self.emit(RuntimeEvent::PowerUpCollected { player_id, kind }, now_ms);
        }
    }

    fn apply_power_up(&mut self, idx: usize, kind: PowerUpKind, now_ms: u64) {
        let player_id = self.players[idx].id;
        match kind {
            PowerUpKind::FreezeOpponent => {
                let freeze_ms = self.config.players.freeze_duration_ms;
                let frozen: Vec<PlayerId> = self
                    .players
                    .iter_mut()
                    .filter(|p| p.id != player_id)
                    .map(|p| {
                        p.freeze(freeze_ms, now_ms);
                        p.id
                    })
                    .collect();
                for other in frozen {
                    self.emit(RuntimeEvent::PlayerFrozen { player_id: other }, now_ms);
                }
            }
            PowerUpKind::GhostConfusion => {
                let confusion_ms = self.config.players.confusion_duration_ms;
                self.ghosts.set_all_confused(confusion_ms, now_ms);
                self.emit(RuntimeEvent::GhostsConfused, now_ms);
            }
            PowerUpKind::SpeedBoost => {
                self.emit(RuntimeEvent::SpeedBoosted { player_id }, now_ms);
            }
        }
    }

    fn update_balance(&mut self, now_ms: u64) {
        let mut ctx = TickContext {
            maze: &mut self.maze,
            ghosts: &mut self.ghosts,
            rng: &mut self.rng,
            now_ms,
        };
        let messages = self.balance.update(&self.players, &mut ctx);
        for message in messages {
            let event = match MessageCategory::classify(&message) {
                MessageCategory::Chaos => RuntimeEvent::Chaos { message },
                _ => RuntimeEvent::Balancing { message },
            };
            self.emit(event, now_ms);
        }
    }

    /// Same-cell contact only. A player touched by several ghosts on one
    /// tick is caught once.
    fn resolve_ghost_collisions(&mut self, now_ms: u64) {
        let mut caught = BTreeSet::new();
        for (player_id, ghost_id) in self.ghosts.check_collisions(&self.players) {
            if !caught.insert(player_id) {
                continue;
            }
            let penalty = self.config.players.death_penalty;
            if let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) {
                player.die(penalty);
                log::info!(
                    "player {player_id} caught by ghost {ghost_id} at {now_ms}ms (deaths={})",
                    player.deaths
                );
            }
            self.emit(RuntimeEvent::PlayerCaught { player_id, ghost_id }, now_ms);
        }
    }
}
