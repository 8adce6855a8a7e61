use crate::capabilities::MazeOps;
use crate::ghost::Ghost;
use crate::rng::Rng;
use crate::types::{Direction, GhostBehavior, Vec2};

/// How a ghost picks among its candidate cells this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveRule {
    Random,
    Toward(Vec2),
    Continue(Direction),
}

/// Passable 4-neighbours in `Direction::CARDINAL` order.
pub fn valid_moves<M: MazeOps>(maze: &M, from: Vec2) -> Vec<Vec2> {
    Direction::CARDINAL
        .into_iter()
        .map(|dir| from.offset(dir))
        .filter(|cell| maze.is_valid_position(cell.x, cell.y))
        .collect()
}

/// Closest candidate to `target`; the earliest candidate wins a tie.
pub fn choose_chase_move(candidates: &[Vec2], target: Vec2) -> Option<Vec2> {
    let mut best: Option<(Vec2, i32)> = None;
    for &cell in candidates {
        let dist = cell.manhattan(target);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((cell, dist)),
        }
    }
    best.map(|(cell, _)| cell)
}

pub fn choose_random_move(candidates: &[Vec2], rng: &mut Rng) -> Option<Vec2> {
    rng.choose(candidates).copied()
}

/// Maps the ghost's state to a selection rule. `target_position` is the live
/// position of the chased player, `None` if it is not in play.
pub fn move_rule(ghost: &Ghost, target_position: Option<Vec2>) -> MoveRule {
    match ghost.behavior() {
        GhostBehavior::Confused | GhostBehavior::Random => MoveRule::Random,
        GhostBehavior::Chase => match target_position {
            Some(target) => MoveRule::Toward(target),
            None => MoveRule::Random,
        },
        GhostBehavior::Neutral => match ghost.heading() {
            Direction::None => MoveRule::Random,
            heading => MoveRule::Continue(heading),
        },
    }
}

pub fn select_move(
    ghost: &Ghost,
    candidates: &[Vec2],
    target_position: Option<Vec2>,
    rng: &mut Rng,
) -> Option<Vec2> {
    match move_rule(ghost, target_position) {
        MoveRule::Random => choose_random_move(candidates, rng),
        MoveRule::Toward(target) => choose_chase_move(candidates, target),
        MoveRule::Continue(heading) => {
            let ahead = ghost.position.offset(heading);
            if candidates.contains(&ahead) {
                Some(ahead)
            } else {
                choose_random_move(candidates, rng)
            }
        }
    }
}
