use crate::capabilities::{GhostControl, MazeOps, PlayerReading};
use crate::config::GhostConfig;
use crate::constants::PRIORITY_SPEED_FACTOR;
use crate::ghost::behavior::{select_move, valid_moves};
use crate::ghost::Ghost;
use crate::rng::Rng;
use crate::types::{GhostBehavior, GhostId, GhostView, PlayerId, Vec2};

/// Drops candidates closer than `min_separation` to any other ghost. Falls
/// back to the unfiltered list rather than leaving nothing to choose from.
pub fn filter_for_clustering(
    candidates: &[Vec2],
    self_id: GhostId,
    ghosts: &[Ghost],
    min_separation: i32,
) -> Vec<Vec2> {
    let filtered: Vec<Vec2> = candidates
        .iter()
        .copied()
        .filter(|cell| {
            ghosts
                .iter()
                .filter(|other| other.id != self_id)
                .all(|other| cell.manhattan(other.position) >= min_separation)
        })
        .collect();
    if filtered.is_empty() {
        candidates.to_vec()
    } else {
        filtered
    }
}

/// Spawn cells around the pen centre: left, right, above, below, then
/// further rings for packs larger than four.
pub fn default_spawn_cells(center: Vec2, count: usize) -> Vec<Vec2> {
    let mut cells = Vec::with_capacity(count);
    let mut ring = 1;
    while cells.len() < count {
        for (dx, dy) in [(-ring, 0), (ring, 0), (0, -ring), (0, ring)] {
            if cells.len() == count {
                break;
            }
            cells.push(Vec2::new(center.x + dx, center.y + dy));
        }
        ring += 1;
    }
    cells
}

#[derive(Clone, Debug)]
pub struct GhostCoordinator {
    ghosts: Vec<Ghost>,
    min_separation: i32,
}

impl GhostCoordinator {
    pub fn new(ghosts: Vec<Ghost>, min_separation: i32) -> Self {
        Self {
            ghosts,
            min_separation,
        }
    }

    pub fn create_default_ghosts(config: &GhostConfig, center: Vec2) -> Self {
        let ghosts = default_spawn_cells(center, config.count)
            .into_iter()
            .enumerate()
            .map(|(id, cell)| Ghost::new(id, cell, config.move_cooldown_ms))
            .collect();
        Self::new(ghosts, config.min_separation)
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn ghost_mut(&mut self, id: GhostId) -> Option<&mut Ghost> {
        self.ghosts.iter_mut().find(|ghost| ghost.id == id)
    }

    pub fn positions(&self) -> Vec<Vec2> {
        self.ghosts.iter().map(|ghost| ghost.position).collect()
    }

    /// Advances one ghost. Confusion expiry is evaluated before the move
    /// cooldown, so an expired ghost is back to neutral even on a tick it
    /// cannot move. Returns whether the ghost moved.
    pub fn update_ghost<M, P>(
        &mut self,
        idx: usize,
        maze: &M,
        players: &[P],
        rng: &mut Rng,
        now_ms: u64,
    ) -> bool
    where
        M: MazeOps,
        P: PlayerReading,
    {
        let Some(ghost) = self.ghosts.get_mut(idx) else {
            return false;
        };
        if ghost.refresh_behavior(now_ms) {
            log::debug!("ghost {} confusion expired at {now_ms}ms", ghost.id);
        }
        if !ghost.can_move(now_ms) {
            return false;
        }

        let ghost = &self.ghosts[idx];
        let candidates = valid_moves(maze, ghost.position);
        if candidates.is_empty() {
            return false;
        }
        let candidates = filter_for_clustering(&candidates, ghost.id, &self.ghosts, self.min_separation);
        let target_position = ghost.target_player().and_then(|target| {
            players
                .iter()
                .find(|player| player.player_id() == target)
                .map(|player| player.position())
        });
        let Some(destination) = select_move(ghost, &candidates, target_position, rng) else {
            return false;
        };
        self.ghosts[idx].commit_move(destination, now_ms)
    }

    /// Updates every ghost in id order. Later ghosts see the positions
    /// earlier ghosts moved to this tick.
    pub fn update_all<M, P>(&mut self, maze: &M, players: &[P], rng: &mut Rng, now_ms: u64) -> usize
    where
        M: MazeOps,
        P: PlayerReading,
    {
        (0..self.ghosts.len())
            .filter(|&idx| self.update_ghost(idx, maze, players, rng, now_ms))
            .count()
    }

    /// `(player, ghost)` pairs sharing a cell.
    pub fn check_collisions<P: PlayerReading>(&self, players: &[P]) -> Vec<(PlayerId, GhostId)> {
        let mut hits = Vec::new();
        for ghost in &self.ghosts {
            for player in players {
                if player.position() == ghost.position {
                    hits.push((player.player_id(), ghost.id));
                }
            }
        }
        hits
    }

    pub fn views(&self) -> Vec<GhostView> {
        self.ghosts.iter().map(Ghost::view).collect()
    }
}

impl GhostControl for GhostCoordinator {
    fn set_target_priorities(&mut self, priorities: &[(PlayerId, f32)]) {
        if priorities.is_empty() {
            return;
        }
        for (idx, ghost) in self.ghosts.iter_mut().enumerate() {
            let (player_id, priority) = priorities[idx % priorities.len()];
            ghost.set_target_player(Some(player_id));
            ghost.set_behavior(GhostBehavior::Chase, None, 0);
            ghost.set_speed_multiplier(1.0 + priority * PRIORITY_SPEED_FACTOR);
        }
    }

    fn set_all_confused(&mut self, duration_ms: u64, now_ms: u64) {
        for ghost in &mut self.ghosts {
            ghost.set_behavior(GhostBehavior::Confused, Some(duration_ms), now_ms);
        }
    }

    fn scale_all_speeds(&mut self, factor: f32) {
        for ghost in &mut self.ghosts {
            ghost.set_speed_multiplier(ghost.speed_multiplier() * factor);
        }
    }

    fn set_speed_for_target(&mut self, player_id: PlayerId, multiplier: f32) -> usize {
        let mut changed = 0;
        for ghost in &mut self.ghosts {
            if ghost.target_player() == Some(player_id) {
                ghost.set_speed_multiplier(multiplier);
                changed += 1;
            }
        }
        changed
    }
}
