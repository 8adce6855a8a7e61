use crate::balance::TickContext;
use crate::capabilities::{GhostControl, MazeOps};
use crate::constants::{
    CHAOS_PELLETS_MAX, CHAOS_PELLETS_MIN, CHAOS_WALLS_MAX, CHAOS_WALLS_MIN,
    GHOST_SPEED_BOOST_FACTOR,
};
use crate::rng::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChaosKind {
    WallRemoval,
    GhostSpeedBoost,
    PelletShower,
    ConfusionStorm,
    /// Catalogued but has no effect when fired.
    SpeedReversal,
}

#[derive(Clone, Debug)]
pub struct ChaosEventDefinition {
    pub kind: ChaosKind,
    pub name: &'static str,
    pub description: &'static str,
    pub duration_ms: u64,
    pub cooldown_ms: u64,
    last_triggered_ms: Option<u64>,
}

impl ChaosEventDefinition {
    fn new(
        kind: ChaosKind,
        name: &'static str,
        description: &'static str,
        duration_ms: u64,
        cooldown_ms: u64,
    ) -> Self {
        Self {
            kind,
            name,
            description,
            duration_ms,
            cooldown_ms,
            last_triggered_ms: None,
        }
    }

    pub fn can_trigger(&self, now_ms: u64) -> bool {
        match self.last_triggered_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.cooldown_ms,
            None => true,
        }
    }

    pub fn last_triggered_ms(&self) -> Option<u64> {
        self.last_triggered_ms
    }

    fn mark_triggered(&mut self, now_ms: u64) {
        self.last_triggered_ms = Some(now_ms);
    }
}

pub fn default_catalog() -> Vec<ChaosEventDefinition> {
    vec![
        ChaosEventDefinition::new(
            ChaosKind::WallRemoval,
            "Wall Removal",
            "Temporarily removes random walls",
            10_000,
            20_000,
        ),
        ChaosEventDefinition::new(
            ChaosKind::GhostSpeedBoost,
            "Ghost Speed Boost",
            "Increases all ghost speeds",
            8_000,
            25_000,
        ),
        ChaosEventDefinition::new(
            ChaosKind::PelletShower,
            "Pellet Shower",
            "Spawns extra pellets",
            0,
            30_000,
        ),
        ChaosEventDefinition::new(
            ChaosKind::ConfusionStorm,
            "Confusion Storm",
            "Makes all ghosts confused",
            6_000,
            15_000,
        ),
        ChaosEventDefinition::new(
            ChaosKind::SpeedReversal,
            "Speed Reversal",
            "Swaps player speeds temporarily",
            5_000,
            35_000,
        ),
    ]
}

#[derive(Clone, Debug)]
pub struct ChaosScheduler {
    catalog: Vec<ChaosEventDefinition>,
    interval_min_ms: u64,
    interval_max_ms: u64,
    chaos_preference: f32,
    next_chaos_ms: u64,
    total_fired: u32,
}

impl ChaosScheduler {
    pub fn new(interval_min_ms: u64, interval_max_ms: u64, now_ms: u64, rng: &mut Rng) -> Self {
        let mut scheduler = Self {
            catalog: default_catalog(),
            interval_min_ms,
            interval_max_ms,
            chaos_preference: 1.0,
            next_chaos_ms: now_ms,
            total_fired: 0,
        };
        scheduler.reschedule_from(now_ms, rng);
        scheduler
    }

    pub fn catalog(&self) -> &[ChaosEventDefinition] {
        &self.catalog
    }

    pub fn next_chaos_ms(&self) -> u64 {
        self.next_chaos_ms
    }

    pub fn total_fired(&self) -> u32 {
        self.total_fired
    }

    pub fn set_chaos_preference(&mut self, chaos_preference: f32) {
        self.chaos_preference = chaos_preference;
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.next_chaos_ms
    }

    pub fn eligible(&self, now_ms: u64) -> Vec<usize> {
        self.catalog
            .iter()
            .enumerate()
            .filter(|(_, event)| event.can_trigger(now_ms))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Fires a uniformly chosen off-cooldown event immediately. Returns its
    /// description, or `None` when every event is cooling down.
    pub fn trigger_random<M, G>(&mut self, ctx: &mut TickContext<'_, M, G>) -> Option<&'static str>
    where
        M: MazeOps,
        G: GhostControl,
    {
        let eligible = self.eligible(ctx.now_ms);
        let idx = *ctx.rng.choose(&eligible)?;
        self.fire(idx, ctx);
        self.catalog.get(idx).map(|event| event.description)
    }

    /// Timed path: fires only once the scheduled time has passed.
    pub fn tick<M, G>(&mut self, ctx: &mut TickContext<'_, M, G>) -> Option<String>
    where
        M: MazeOps,
        G: GhostControl,
    {
        if !self.is_due(ctx.now_ms) {
            return None;
        }
        self.trigger_random(ctx)
            .map(|description| format!("CHAOS EVENT: {description}!"))
    }

    fn fire<M, G>(&mut self, idx: usize, ctx: &mut TickContext<'_, M, G>)
    where
        M: MazeOps,
        G: GhostControl,
    {
        let Some(event) = self.catalog.get_mut(idx) else {
            return;
        };
        event.mark_triggered(ctx.now_ms);
        let kind = event.kind;
        let duration_ms = event.duration_ms;
        log::info!("chaos event fired: {} at {}ms", event.name, ctx.now_ms);

        match kind {
            ChaosKind::WallRemoval => {
                let walls = ctx.rng.int(CHAOS_WALLS_MIN, CHAOS_WALLS_MAX) as usize;
                ctx.maze
                    .apply_chaos_mode(duration_ms, walls, ctx.now_ms, ctx.rng);
            }
            ChaosKind::GhostSpeedBoost => {
                // no reversion timer: the boost stands until something else sets the speed
                ctx.ghosts.scale_all_speeds(GHOST_SPEED_BOOST_FACTOR);
            }
            ChaosKind::PelletShower => {
                let free_cells = ctx.maze.find_pellet_free_positions();
                let count = ctx.rng.int(CHAOS_PELLETS_MIN, CHAOS_PELLETS_MAX) as usize;
                let placed = ctx
                    .rng
                    .sample_indices(free_cells.len(), count)
                    .into_iter()
                    .filter(|&idx| ctx.maze.place_pellet(free_cells[idx].x, free_cells[idx].y))
                    .count();
                log::debug!("pellet shower placed {placed} of {count} pellets");
            }
            ChaosKind::ConfusionStorm => {
                ctx.ghosts.set_all_confused(duration_ms, ctx.now_ms);
            }
            ChaosKind::SpeedReversal => {}
        }

        self.total_fired += 1;
        self.reschedule_from(ctx.now_ms, ctx.rng);
    }

    /// Draws the next autonomous firing time from `now_ms`.
    pub fn reschedule_from(&mut self, now_ms: u64, rng: &mut Rng) {
        let base = rng.uniform_u64(self.interval_min_ms, self.interval_max_ms) as f64;
        let preference = (self.chaos_preference as f64).max(f64::EPSILON);
        self.next_chaos_ms = now_ms.saturating_add((base / preference).round() as u64);
    }
}
