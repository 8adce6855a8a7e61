use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use crate::capabilities::MazeOps;
use crate::config::MazeConfig;
use crate::constants::GHOST_PEN_RADIUS;
use crate::rng::Rng;
use crate::types::{Direction, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Path,
    Wall,
    Pellet,
    PowerUp,
    /// Walkable floor whose pellet has been eaten.
    Empty,
}

impl Cell {
    pub fn is_wall(self) -> bool {
        self == Cell::Wall
    }

    fn glyph(self) -> char {
        match self {
            Cell::Path => '.',
            Cell::Wall => '#',
            Cell::Pellet => 'o',
            Cell::PowerUp => '*',
            Cell::Empty => ' ',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TemporaryOpening {
    restore: Cell,
    expires_at_ms: u64,
}

/// What a timer pass changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MazeUpdate {
    pub walls_restored: usize,
    pub pellets_respawned: usize,
}

#[derive(Clone, Debug)]
pub struct Maze {
    pub width: i32,
    pub height: i32,
    grid: Vec<Vec<Cell>>,
    pellets: BTreeSet<(i32, i32)>,
    total_pellets: usize,
    openings: BTreeMap<(i32, i32), TemporaryOpening>,
    respawn_interval_ms: u64,
    max_pellets_per_respawn: usize,
    last_respawn_ms: u64,
}

impl Maze {
    pub fn generate(config: &MazeConfig, now_ms: u64) -> Self {
        let width = config.width;
        let height = config.height;
        let mut maze = Self {
            width,
            height,
            grid: carve_layout(width, height),
            pellets: BTreeSet::new(),
            total_pellets: 0,
            openings: BTreeMap::new(),
            respawn_interval_ms: config.pellet_respawn_interval_ms,
            max_pellets_per_respawn: config.max_pellets_per_respawn,
            last_respawn_ms: now_ms,
        };
        maze.seed_pellets();
        maze
    }

    fn seed_pellets(&mut self) {
        self.pellets.clear();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.cell(x, y) == Some(Cell::Path) && self.accepts_pellet_spawn(x, y) {
                    self.set_cell(x, y, Cell::Pellet);
                    self.pellets.insert((x, y));
                }
            }
        }
        self.total_pellets = self.pellets.len();
    }

    pub fn player_starts(&self) -> [Vec2; 2] {
        [Vec2::new(1, 1), Vec2::new(self.width - 2, self.height - 2)]
    }

    pub fn ghost_pen_center(&self) -> Vec2 {
        Vec2::new(self.width / 2, self.height / 2)
    }

    pub fn in_ghost_pen(&self, x: i32, y: i32) -> bool {
        let center = self.ghost_pen_center();
        (x - center.x).abs() <= GHOST_PEN_RADIUS && (y - center.y).abs() <= GHOST_PEN_RADIUS
    }

    fn accepts_pellet_spawn(&self, x: i32, y: i32) -> bool {
        let cell = Vec2::new(x, y);
        !self.player_starts().contains(&cell) && !self.in_ghost_pen(x, y)
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.grid
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
    }

    fn set_cell(&mut self, x: i32, y: i32, cell: Cell) {
        if let Some(slot) = self
            .grid
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
        {
            *slot = cell;
        }
    }

    /// Out of bounds counts as wall.
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).is_none_or(Cell::is_wall)
    }

    pub fn collect_pellet(&mut self, x: i32, y: i32) -> bool {
        if self.pellets.remove(&(x, y)) {
            self.set_cell(x, y, Cell::Empty);
            return true;
        }
        false
    }

    pub fn collect_powerup(&mut self, x: i32, y: i32) -> bool {
        if self.cell(x, y) == Some(Cell::PowerUp) {
            self.set_cell(x, y, Cell::Empty);
            return true;
        }
        false
    }

    pub fn valid_adjacent(&self, x: i32, y: i32) -> Vec<Vec2> {
        let from = Vec2::new(x, y);
        Direction::CARDINAL
            .into_iter()
            .map(|dir| from.offset(dir))
            .filter(|cell| self.is_valid_position(cell.x, cell.y))
            .collect()
    }

    /// Flood fill from `start`; true when every target is reachable.
    pub fn is_area_accessible(&self, start: Vec2, targets: &[Vec2]) -> bool {
        if targets.is_empty() {
            return true;
        }
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(start);
        queue.push_back(start);
        while let Some(cell) = queue.pop_front() {
            for next in self.valid_adjacent(cell.x, cell.y) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        targets.iter().all(|target| seen.contains(target))
    }

    /// Restores expired wall openings, then runs the pellet respawn timer.
    pub fn update_temporary_modifications(&mut self, now_ms: u64, rng: &mut Rng) -> MazeUpdate {
        let expired: Vec<(i32, i32)> = self
            .openings
            .iter()
            .filter(|(_, opening)| now_ms >= opening.expires_at_ms)
            .map(|(pos, _)| *pos)
            .collect();
        for (x, y) in &expired {
            if let Some(opening) = self.openings.remove(&(*x, *y)) {
                // anything dropped on the opening is lost with it
                self.pellets.remove(&(*x, *y));
                self.set_cell(*x, *y, opening.restore);
            }
        }
        if !expired.is_empty() {
            log::debug!("restored {} chaos walls at {now_ms}ms", expired.len());
        }

        let pellets_respawned = if now_ms.saturating_sub(self.last_respawn_ms) >= self.respawn_interval_ms {
            self.last_respawn_ms = now_ms;
            self.respawn_pellets(rng)
        } else {
            0
        };

        MazeUpdate {
            walls_restored: expired.len(),
            pellets_respawned,
        }
    }

    /// Refills up to the per-respawn cap of eaten cells, away from the
    /// starts and the ghost pen.
    pub fn respawn_pellets(&mut self, rng: &mut Rng) -> usize {
        let mut candidates = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.cell(x, y) == Some(Cell::Empty)
                    && !self.pellets.contains(&(x, y))
                    && self.accepts_pellet_spawn(x, y)
                {
                    candidates.push((x, y));
                }
            }
        }
        let picked = rng.sample_indices(candidates.len(), self.max_pellets_per_respawn);
        for idx in &picked {
            let (x, y) = candidates[*idx];
            self.set_cell(x, y, Cell::Pellet);
            self.pellets.insert((x, y));
        }
        picked.len()
    }

    pub fn pellet_count(&self) -> usize {
        self.pellets.len()
    }

    pub fn total_pellets(&self) -> usize {
        self.total_pellets
    }

    pub fn temporary_openings(&self) -> usize {
        self.openings.len()
    }

    /// Share of the initial pellets eaten, in percent. Extra pellets from
    /// respawns and showers can push the raw value below zero, so it is clamped.
    pub fn completion_percentage(&self) -> f32 {
        if self.total_pellets == 0 {
            return 100.0;
        }
        let eaten = self.total_pellets as f32 - self.pellets.len() as f32;
        (eaten / self.total_pellets as f32 * 100.0).clamp(0.0, 100.0)
    }

    pub fn tiles(&self) -> Vec<String> {
        self.grid
            .iter()
            .map(|row| row.iter().map(|cell| cell.glyph()).collect())
            .collect()
    }

    pub fn pellet_positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.pellets.iter().map(|&(x, y)| Vec2::new(x, y))
    }
}

impl MazeOps for Maze {
    fn is_valid_position(&self, x: i32, y: i32) -> bool {
        !self.is_wall(x, y)
    }

    fn find_empty_positions_near(&self, center: Vec2, radius: i32) -> Vec<Vec2> {
        let mut out = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let (x, y) = (center.x + dx, center.y + dy);
                if matches!(self.cell(x, y), Some(Cell::Path | Cell::Empty)) {
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
        self.pellets.remove(&(x, y));
        self.set_cell(x, y, Cell::PowerUp);
        true
    }

    fn place_pellet(&mut self, x: i32, y: i32) -> bool {
        if !matches!(self.cell(x, y), Some(Cell::Path | Cell::Empty)) {
            return false;
        }
        self.set_cell(x, y, Cell::Pellet);
        self.pellets.insert((x, y));
        true
    }

    fn apply_chaos_mode(&mut self, duration_ms: u64, wall_count: usize, now_ms: u64, rng: &mut Rng) {
        let mut interior_walls = Vec::new();
        for y in 1..self.height - 1 {
            for x in 1..self.width - 1 {
                if self.cell(x, y) == Some(Cell::Wall) {
                    interior_walls.push((x, y));
                }
            }
        }
        let expires_at_ms = now_ms.saturating_add(duration_ms);
        let picked = rng.sample_indices(interior_walls.len(), wall_count);
        for idx in &picked {
            let (x, y) = interior_walls[*idx];
            self.openings.insert(
                (x, y),
                TemporaryOpening {
                    restore: Cell::Wall,
                    expires_at_ms,
                },
            );
            self.set_cell(x, y, Cell::Path);
        }
        log::debug!(
            "opened {} walls until {expires_at_ms}ms",
            picked.len()
        );
    }

    fn find_path_positions(&self) -> Vec<Vec2> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.is_wall(x, y) {
                    out.push(Vec2::new(x, y));
                }
            }
        }
        out
    }

    fn find_pellet_free_positions(&self) -> Vec<Vec2> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if matches!(self.cell(x, y), Some(Cell::Path | Cell::Empty)) {
                    out.push(Vec2::new(x, y));
                }
            }
        }
        out
    }
}

/// Corridor lattice with a cleared 5x5 ghost pen and open player corners.
fn carve_layout(width: i32, height: i32) -> Vec<Vec<Cell>> {
    let mut grid = vec![vec![Cell::Wall; width.max(0) as usize]; height.max(0) as usize];
    let mut open = |x: i32, y: i32| {
        if x >= 0 && y >= 0 && x < width && y < height {
            grid[y as usize][x as usize] = Cell::Path;
        }
    };

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let lattice = (x % 2 == 1 && y % 2 == 1)
                || (x % 4 == 0 && y % 2 == 1)
                || (y % 4 == 0 && x % 2 == 1);
            if lattice {
                open(x, y);
            }
        }
    }

    let (cx, cy) = (width / 2, height / 2);
    for dy in -GHOST_PEN_RADIUS..=GHOST_PEN_RADIUS {
        for dx in -GHOST_PEN_RADIUS..=GHOST_PEN_RADIUS {
            open(cx + dx, cy + dy);
        }
    }

    for (x, y) in [(1, 1), (2, 1), (1, 2), (3, 1), (1, 3)] {
        open(x, y);
    }
    let (px, py) = (width - 2, height - 2);
    for (x, y) in [(px, py), (px - 1, py), (px, py - 1), (px - 2, py), (px, py - 2)] {
        open(x, y);
    }

    for y in (0..height).filter(|y| y % 6 == 0) {
        for x in (1..width - 1).filter(|x| x % 3 == 0) {
            open(x, y);
        }
    }
    for y in (1..height - 1).step_by(4) {
        for x in 1..width - 1 {
            open(x, y);
        }
    }
    for x in (1..width - 1).step_by(4) {
        for y in 1..height - 1 {
            open(x, y);
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_maze() -> Maze {
        Maze::generate(&MazeConfig::default(), 0)
    }

    fn count_cells(maze: &Maze, kind: Cell) -> usize {
        let mut n = 0;
        for y in 0..maze.height {
            for x in 0..maze.width {
                if maze.cell(x, y) == Some(kind) {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn default_layout_shape() {
        let maze = default_maze();
        assert_eq!(maze.tiles().len(), 19);
        assert!(maze.tiles().iter().all(|row| row.chars().count() == 25));
        assert_eq!(maze.find_path_positions().len(), 288);
        assert_eq!(maze.pellet_count(), 261);
        assert_eq!(maze.total_pellets(), 261);
        assert_eq!(maze.completion_percentage(), 0.0);
    }

    #[test]
    fn starts_and_pen_hold_no_pellets() {
        let maze = default_maze();
        for start in maze.player_starts() {
            assert_eq!(maze.cell(start.x, start.y), Some(Cell::Path));
        }
        for cell in maze.pellet_positions() {
            assert!(!maze.in_ghost_pen(cell.x, cell.y));
        }
        let pen = maze.ghost_pen_center();
        assert_eq!(pen, Vec2::new(12, 9));
        assert!(maze.is_valid_position(pen.x - 1, pen.y));
    }

    #[test]
    fn every_open_cell_is_reachable_from_first_start() {
        let maze = default_maze();
        let open = maze.find_path_positions();
        assert!(maze.is_area_accessible(Vec2::new(1, 1), &open));
        assert!(maze.is_area_accessible(Vec2::new(1, 1), &[]));
        assert!(!maze.is_area_accessible(Vec2::new(1, 1), &[Vec2::new(0, 0)]));
    }

    #[test]
    fn out_of_bounds_is_wall() {
        let maze = default_maze();
        assert!(maze.is_wall(-1, 3));
        assert!(maze.is_wall(25, 3));
        assert!(!maze.is_valid_position(3, 19));
        assert_eq!(maze.cell(100, 100), None);
    }

    #[test]
    fn collecting_pellets_and_powerups() {
        let mut maze = default_maze();
        assert!(maze.collect_pellet(2, 1));
        assert!(!maze.collect_pellet(2, 1));
        assert_eq!(maze.cell(2, 1), Some(Cell::Empty));
        assert_eq!(maze.pellet_count(), 260);
        assert!(maze.completion_percentage() > 0.0);

        assert!(maze.place_powerup(2, 1));
        assert!(!maze.place_powerup(0, 0));
        assert!(maze.collect_powerup(2, 1));
        assert!(!maze.collect_powerup(2, 1));
    }

    #[test]
    fn powerup_over_pellet_removes_the_pellet() {
        let mut maze = default_maze();
        assert!(maze.place_powerup(3, 1));
        assert_eq!(maze.pellet_count(), 260);
        assert!(!maze.collect_pellet(3, 1));
        assert_eq!(maze.cell(3, 1), Some(Cell::PowerUp));
    }

    #[test]
    fn place_pellet_needs_bare_floor() {
        let mut maze = default_maze();
        assert!(!maze.place_pellet(0, 0));
        assert!(!maze.place_pellet(2, 1));
        assert!(maze.place_pellet(1, 1));
        assert_eq!(maze.pellet_count(), 262);
        assert_eq!(maze.completion_percentage(), 0.0);
    }

    #[test]
    fn empty_positions_near_only_lists_bare_floor() {
        let mut maze = default_maze();
        let near = maze.find_empty_positions_near(Vec2::new(1, 1), 2);
        assert_eq!(near, vec![Vec2::new(1, 1)]);
        maze.collect_pellet(2, 1);
        maze.collect_pellet(1, 2);
        let near = maze.find_empty_positions_near(Vec2::new(1, 1), 2);
        assert_eq!(near.len(), 3);
        assert!(near.iter().all(|cell| cell.manhattan(Vec2::new(1, 1)) <= 4));
    }

    #[test]
    fn chaos_openings_revert_at_expiry() {
        let mut maze = default_maze();
        let mut rng = Rng::new(9);
        let walls_before = count_cells(&maze, Cell::Wall);
        maze.apply_chaos_mode(10_000, 5, 1_000, &mut rng);
        assert_eq!(maze.temporary_openings(), 5);
        assert_eq!(count_cells(&maze, Cell::Wall), walls_before - 5);

        let update = maze.update_temporary_modifications(10_999, &mut rng);
        assert_eq!(update.walls_restored, 0);
        let update = maze.update_temporary_modifications(11_000, &mut rng);
        assert_eq!(update.walls_restored, 5);
        assert_eq!(count_cells(&maze, Cell::Wall), walls_before);
        assert_eq!(maze.temporary_openings(), 0);
    }

    #[test]
    fn overlapping_chaos_windows_revert_independently() {
        let mut maze = default_maze();
        let mut rng = Rng::new(10);
        maze.apply_chaos_mode(10_000, 3, 0, &mut rng);
        maze.apply_chaos_mode(10_000, 4, 5_000, &mut rng);
        assert_eq!(maze.temporary_openings(), 7);
        assert_eq!(maze.update_temporary_modifications(10_000, &mut rng).walls_restored, 3);
        assert_eq!(maze.temporary_openings(), 4);
        assert_eq!(maze.update_temporary_modifications(15_000, &mut rng).walls_restored, 4);
    }

    #[test]
    fn chaos_never_touches_the_border_and_caps_at_available_walls() {
        let mut maze = default_maze();
        let mut rng = Rng::new(11);
        maze.apply_chaos_mode(1_000, 500, 0, &mut rng);
        assert_eq!(maze.temporary_openings(), 117);
        for x in 0..maze.width {
            if x % 3 != 0 || x == 0 || x == maze.width - 1 {
                assert!(maze.is_wall(x, 0), "x={x}");
            }
        }
    }

    #[test]
    fn pellet_lost_when_opening_closes() {
        let mut maze = default_maze();
        let mut rng = Rng::new(12);
        maze.apply_chaos_mode(1_000, 1, 0, &mut rng);
        let opened = maze
            .find_path_positions()
            .into_iter()
            .find(|cell| maze.cell(cell.x, cell.y) == Some(Cell::Path) && !maze.player_starts().contains(cell) && !maze.in_ghost_pen(cell.x, cell.y))
            .expect("opened cell");
        assert!(maze.place_pellet(opened.x, opened.y));
        let before = maze.pellet_count();
        maze.update_temporary_modifications(1_000, &mut rng);
        assert_eq!(maze.pellet_count(), before - 1);
        assert!(maze.is_wall(opened.x, opened.y));
    }

    #[test]
    fn respawn_refills_eaten_cells_on_interval() {
        let mut maze = default_maze();
        let mut rng = Rng::new(13);
        let eaten: Vec<Vec2> = maze.pellet_positions().take(30).collect();
        for cell in &eaten {
            maze.collect_pellet(cell.x, cell.y);
        }
        assert_eq!(maze.pellet_count(), 231);

        assert_eq!(maze.update_temporary_modifications(14_999, &mut rng).pellets_respawned, 0);
        assert_eq!(maze.update_temporary_modifications(15_000, &mut rng).pellets_respawned, 10);
        assert_eq!(maze.pellet_count(), 241);
        assert_eq!(maze.update_temporary_modifications(20_000, &mut rng).pellets_respawned, 0);
        assert_eq!(maze.update_temporary_modifications(30_000, &mut rng).pellets_respawned, 10);
        assert_eq!(maze.update_temporary_modifications(45_000, &mut rng).pellets_respawned, 10);
        assert_eq!(maze.update_temporary_modifications(60_000, &mut rng).pellets_respawned, 0);
        assert_eq!(maze.pellet_count(), 261);
    }

    #[test]
    fn respawn_skips_starts_and_pen() {
        let mut maze = default_maze();
        let mut rng = Rng::new(14);
        let pen = maze.ghost_pen_center();
        maze.place_pellet(pen.x, pen.y);
        maze.collect_pellet(pen.x, pen.y);
        maze.place_pellet(1, 1);
        maze.collect_pellet(1, 1);
        assert_eq!(maze.respawn_pellets(&mut rng), 0);
    }
}
