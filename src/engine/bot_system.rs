use super::utils::{nearest_distance, random_direction};
use super::GameEngine;
use crate::capabilities::MazeOps;
use crate::clock::Clock;
use crate::constants::BOT_DANGER_DISTANCE;
use crate::types::{Direction, Vec2};

impl<C: Clock> GameEngine<C> {
    pub(super) fn update_bots(&mut self, now_ms: u64) {
        for idx in 0..self.players.len() {
            if self.players[idx].bot {
                self.update_bot(idx, now_ms);
            }
        }
    }

    fn update_bot(&mut self, player_idx: usize, now_ms: u64) {
        if now_ms < self.bot_think_at[player_idx] {
            return;
        }
        self.bot_think_at[player_idx] = now_ms + self.rng.int(90, 190) as u64;

        let position = self.players[player_idx].position;
        let ghost_dist = self.distance_to_nearest_ghost(position);
        let dir = match ghost_dist {
            Some(dist) if dist <= BOT_DANGER_DISTANCE => self.choose_escape_direction(position),
            _ => self.choose_dot_direction(position),
        };
        self.players[player_idx].desired_dir = dir;
    }

    pub(super) fn distance_to_nearest_ghost(&self, cell: Vec2) -> Option<i32> {
        nearest_distance(cell, self.ghosts.positions())
    }

    fn open_neighbours(&self, from: Vec2) -> impl Iterator<Item = (Direction, Vec2)> + '_ {
        Direction::CARDINAL
            .into_iter()
            .map(move |dir| (dir, from.offset(dir)))
            .filter(|(_, next)| self.maze.is_valid_position(next.x, next.y))
    }

    pub(super) fn choose_dot_direction(&mut self, from: Vec2) -> Direction {
        let nearest_pellet = self
            .maze
            .pellet_positions()
            .min_by_key(|cell| from.manhattan(*cell));
        let options: Vec<(Direction, Vec2)> = self.open_neighbours(from).collect();

        let mut best = Direction::None;
        let mut best_score = f32::NEG_INFINITY;
        for (dir, next) in options {
            let mut score = 0.0;
            if self.maze.pellet_positions().any(|cell| cell == next) {
                score += 12.0;
            }
            if let Some(pellet) = nearest_pellet {
                let before = from.manhattan(pellet);
                let after = next.manhattan(pellet);
                score += (before - after) as f32 * 0.9;
            }
            if let Some(ghost_dist) = self.distance_to_nearest_ghost(next) {
                score += ghost_dist as f32 * 0.15;
            }
            score += self.rng.next_f32() * 0.4;

            if score > best_score {
                best_score = score;
                best = dir;
            }
        }

        if best == Direction::None {
            random_direction(&mut self.rng)
        } else {
            best
        }
    }

    pub(super) fn choose_escape_direction(&mut self, from: Vec2) -> Direction {
        let options: Vec<(Direction, Vec2)> = self.open_neighbours(from).collect();
        let mut best = Direction::None;
        let mut best_dist = i32::MIN;
        for (dir, next) in options {
            let dist = self.distance_to_nearest_ghost(next).unwrap_or(99);
            if dist > best_dist {
                best_dist = dist;
                best = dir;
            }
        }
        if best == Direction::None {
            random_direction(&mut self.rng)
        } else {
            best
        }
    }
}
