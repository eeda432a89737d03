//! Events emitted by the simulation during a tick
//!
//! The session layer turns these into wire notifications; the payload
//! structs double as the bodies of `switchPlayer` and `levelUp`.

use serde::{Deserialize, Serialize};

use crate::game::state::{Brick, GameOverReason, PlayerSlot, PowerUpKind};

/// Turn handover: the next player and the post-shift brick layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnHandover {
    pub current_player: PlayerSlot,
    #[serde(default)]
    pub bricks: Vec<Brick>,
    /// Level-up rows still in flight, shifted with the field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropping_bricks: Vec<Brick>,
}

/// Level transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelAdvance {
    pub ball_speed: f32,
    pub level: u32,
    #[serde(default)]
    pub dropping_bricks: Vec<Brick>,
}

/// Terminal match state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOverNotice {
    pub reason: GameOverReason,
    pub score: u64,
}

/// What destroyed a brick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSource {
    Ball,
    Projectile,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    BrickDestroyed { points: u32, source: HitSource },
    PowerUpSpawned(PowerUpKind),
    PowerUpCollected(PowerUpKind),
    /// Cosmetic; renderers emit the growth burst
    PaddleGrew { growth_factor: f32 },
    GunsArmed,
    GunsExpired,
    GunsFired,
    LevelUp(LevelAdvance),
    TurnEnded { handover: TurnHandover, combo_bonus: u64 },
    GameOver(GameOverNotice),
}
