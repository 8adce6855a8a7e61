use std::collections::BTreeMap;

use serde::Serialize;

pub type PlayerId = u32;
pub type GhostId = usize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Vec2) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn offset(self, dir: Direction) -> Vec2 {
        let (dx, dy) = dir.delta();
        Vec2::new(self.x + dx, self.y + dy)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Neighbour scan order used everywhere a cell's moves are listed.
    pub const CARDINAL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::None => (0, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostBehavior {
    Neutral,
    Chase,
    Random,
    Confused,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    SpeedBoost,
    FreezeOpponent,
    GhostConfusion,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::SpeedBoost,
        PowerUpKind::FreezeOpponent,
        PowerUpKind::GhostConfusion,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    Pellet,
    PowerUp,
    Death,
    Balancing,
    Chaos,
}

impl MessageCategory {
    /// Recovers the category of a display string from its wording.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.starts_with("chaos") {
            MessageCategory::Chaos
        } else if lower.contains("hunting")
            || lower.contains("appeared near")
            || lower.contains("slowed down")
        {
            MessageCategory::Balancing
        } else if lower.contains("caught") {
            MessageCategory::Death
        } else if lower.contains("pellet") {
            MessageCategory::Pellet
        } else if lower.contains("power-up")
            || lower.contains("frozen")
            || lower.contains("confused")
            || lower.contains("speed boost")
        {
            MessageCategory::PowerUp
        } else {
            MessageCategory::Balancing
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletCollected {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        points: i32,
    },
    PowerUpCollected {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        kind: PowerUpKind,
    },
    PlayerFrozen {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    GhostsConfused,
    SpeedBoosted {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    PlayerCaught {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "ghostId")]
        ghost_id: GhostId,
    },
    PelletsRespawned {
        count: usize,
    },
    Balancing {
        message: String,
    },
    Chaos {
        message: String,
    },
}

impl RuntimeEvent {
    pub fn message(&self) -> String {
        match self {
            RuntimeEvent::PelletCollected { player_id, points } => {
                format!("Player {player_id} collected a pellet! (+{points} points)")
            }
            RuntimeEvent::PowerUpCollected { player_id, .. } => {
                format!("Player {player_id} collected a power-up!")
            }
            RuntimeEvent::PlayerFrozen { player_id } => format!("Player {player_id} is frozen!"),
            RuntimeEvent::GhostsConfused => "All ghosts are confused!".to_string(),
            RuntimeEvent::SpeedBoosted { player_id } => {
                format!("Player {player_id} got a speed boost!")
            }
            RuntimeEvent::PlayerCaught { player_id, .. } => {
                format!("Player {player_id} was caught by a ghost!")
            }
            RuntimeEvent::PelletsRespawned { count } => format!("{count} pellets respawned!"),
            RuntimeEvent::Balancing { message } | RuntimeEvent::Chaos { message } => {
                message.clone()
            }
        }
    }

    pub fn category(&self) -> MessageCategory {
        match self {
            RuntimeEvent::PelletCollected { .. } | RuntimeEvent::PelletsRespawned { .. } => {
                MessageCategory::Pellet
            }
            RuntimeEvent::PowerUpCollected { .. }
            | RuntimeEvent::PlayerFrozen { .. }
            | RuntimeEvent::GhostsConfused
            | RuntimeEvent::SpeedBoosted { .. } => MessageCategory::PowerUp,
            RuntimeEvent::PlayerCaught { .. } => MessageCategory::Death,
            RuntimeEvent::Balancing { .. } => MessageCategory::Balancing,
            RuntimeEvent::Chaos { .. } => MessageCategory::Chaos,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PerformanceSummary {
    #[serde(rename = "avgSpeed")]
    pub avg_speed: f32,
    #[serde(rename = "collectionRate")]
    pub collection_rate: f32,
    #[serde(rename = "deathFrequency")]
    pub death_frequency: f32,
    #[serde(rename = "scoreVelocity")]
    pub score_velocity: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AiStats {
    #[serde(rename = "totalBalancingActions")]
    pub total_balancing_actions: u32,
    #[serde(rename = "totalChaosEvents")]
    pub total_chaos_events: u32,
    #[serde(rename = "gameDurationSecs")]
    pub game_duration_secs: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub x: i32,
    pub y: i32,
    pub score: i32,
    pub deaths: u32,
    pub bot: bool,
    pub frozen: bool,
    #[serde(rename = "activePowerUps")]
    pub active_power_ups: Vec<PowerUpKind>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: GhostId,
    pub x: i32,
    pub y: i32,
    pub behavior: GhostBehavior,
    #[serde(rename = "targetPlayer")]
    pub target_player: Option<PlayerId>,
    #[serde(rename = "speedMultiplier")]
    pub speed_multiplier: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct DisplayMessage {
    pub category: MessageCategory,
    pub text: String,
    #[serde(rename = "postedAtMs")]
    pub posted_at_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "nowMs")]
    pub now_ms: u64,
    pub players: Vec<PlayerView>,
    pub ghosts: Vec<GhostView>,
    #[serde(rename = "pelletsRemaining")]
    pub pellets_remaining: usize,
    pub completion: f32,
    pub events: Vec<RuntimeEvent>,
    pub messages: Vec<DisplayMessage>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ScoreEntry {
    #[serde(rename = "playerId")]
    pub player_id: PlayerId,
    pub score: i32,
    pub pellets: u32,
    pub deaths: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    pub ranking: Vec<ScoreEntry>,
    pub performance: BTreeMap<PlayerId, PerformanceSummary>,
    #[serde(rename = "aiStats")]
    pub ai_stats: AiStats,
    #[serde(rename = "pelletsRemaining")]
    pub pellets_remaining: usize,
    pub completion: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_recovers_categories_from_text() {
        assert_eq!(
            MessageCategory::classify("CHAOS EVENT: Makes all ghosts confused!"),
            MessageCategory::Chaos
        );
        assert_eq!(
            MessageCategory::classify("A power-up appeared near Player 2!"),
            MessageCategory::Balancing
        );
        assert_eq!(
            MessageCategory::classify("Ghosts are now hunting Player 1 more aggressively!"),
            MessageCategory::Balancing
        );
        assert_eq!(
            MessageCategory::classify("Player 1 was caught by a ghost!"),
            MessageCategory::Death
        );
        assert_eq!(
            MessageCategory::classify("4 pellets respawned!"),
            MessageCategory::Pellet
        );
        assert_eq!(
            MessageCategory::classify("Player 2 collected a power-up!"),
            MessageCategory::PowerUp
        );
    }

    #[test]
    fn event_category_matches_classified_message() {
        let events = [
            RuntimeEvent::PelletCollected {
                player_id: 1,
                points: 10,
            },
            RuntimeEvent::PowerUpCollected {
                player_id: 2,
                kind: PowerUpKind::SpeedBoost,
            },
            RuntimeEvent::PlayerFrozen { player_id: 2 },
            RuntimeEvent::GhostsConfused,
            RuntimeEvent::PlayerCaught {
                player_id: 1,
                ghost_id: 0,
            },
            RuntimeEvent::PelletsRespawned { count: 3 },
        ];
        for event in events {
            assert_eq!(MessageCategory::classify(&event.message()), event.category());
        }
    }

    #[test]
    fn offset_follows_direction_delta() {
        let origin = Vec2::new(5, 5);
        assert_eq!(origin.offset(Direction::Up), Vec2::new(5, 4));
        assert_eq!(origin.offset(Direction::Right), Vec2::new(6, 5));
        assert_eq!(origin.offset(Direction::None), origin);
        assert_eq!(origin.manhattan(Vec2::new(7, 7)), 4);
    }
}
