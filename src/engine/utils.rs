use std::collections::VecDeque;

use crate::rng::Rng;
use crate::types::{Direction, DisplayMessage, MessageCategory, Vec2};

pub(super) fn random_direction(rng: &mut Rng) -> Direction {
    match rng.int(0, 3) {
        0 => Direction::Up,
        1 => Direction::Down,
        2 => Direction::Left,
        _ => Direction::Right,
    }
}

pub(super) fn nearest_distance(from: Vec2, cells: impl IntoIterator<Item = Vec2>) -> Option<i32> {
    cells.into_iter().map(|cell| from.manhattan(cell)).min()
}

/// On-screen message feed: newest last, bounded, each line visible for a
/// fixed time.
#[derive(Clone, Debug)]
pub struct MessageLog {
    capacity: usize,
    display_ms: u64,
    entries: VecDeque<DisplayMessage>,
}

impl MessageLog {
    pub fn new(capacity: usize, display_ms: u64) -> Self {
        Self {
            capacity,
            display_ms,
            entries: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn push(&mut self, text: String, category: MessageCategory, now_ms: u64) {
        self.entries.push_back(DisplayMessage {
            category,
            text,
            posted_at_ms: now_ms,
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Drops lines older than the display time.
    pub fn expire(&mut self, now_ms: u64) {
        while self
            .entries
            .front()
            .is_some_and(|m| now_ms.saturating_sub(m.posted_at_ms) > self.display_ms)
        {
            self.entries.pop_front();
        }
    }

    pub fn visible(&self) -> Vec<DisplayMessage> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
