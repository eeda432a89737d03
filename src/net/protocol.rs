//! Wire protocol
//!
//! Every message is a JSON object with a `type` discriminator. Field names
//! are camelCase. The sync record [`GameSnapshot`] is shared by full
//! snapshots (every field set) and deltas (only changed fields set).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::events::{GameOverNotice, LevelAdvance, TurnHandover};
use crate::game::state::{
    Ball, Brick, GameState, GuideLine, GunsSnapshot, PlayerSlot, PowerUp, Projectile, Scores,
};

/// Messages from client to relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    Join {
        room_id: String,
    },
    /// Full or partial state from the peer holding the turn
    GameUpdate {
        #[serde(default)]
        game_state: GameSnapshot,
    },
    SwitchPlayer(TurnHandover),
    LevelUp(LevelAdvance),
    GameOver(GameOverNotice),
}

/// Messages from relay to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Joined {
        player: PlayerSlot,
        current_player: PlayerSlot,
    },
    /// Only the fields that changed on the authoritative peer
    GameUpdateDelta {
        delta: GameSnapshot,
    },
    SwitchPlayer(TurnHandover),
    LevelUp(LevelAdvance),
    GameOver(GameOverNotice),
    Error {
        message: String,
    },
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Join { .. } => "join",
            ClientMessage::GameUpdate { .. } => "gameUpdate",
            ClientMessage::SwitchPlayer(_) => "switchPlayer",
            ClientMessage::LevelUp(_) => "levelUp",
            ClientMessage::GameOver(_) => "gameOver",
        }
    }
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Joined { .. } => "joined",
            ServerMessage::GameUpdateDelta { .. } => "gameUpdateDelta",
            ServerMessage::SwitchPlayer(_) => "switchPlayer",
            ServerMessage::LevelUp(_) => "levelUp",
            ServerMessage::GameOver(_) => "gameOver",
            ServerMessage::Error { .. } => "error",
        }
    }
}

/// Top-level fields eligible for delta sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncField {
    PaddleX,
    Balls,
    Bricks,
    GuideLine,
    PowerUps,
    Scores,
    Projectiles,
    GunsState,
    Level,
}

impl SyncField {
    pub const ALL: [SyncField; 9] = [
        SyncField::PaddleX,
        SyncField::Balls,
        SyncField::Bricks,
        SyncField::GuideLine,
        SyncField::PowerUps,
        SyncField::Scores,
        SyncField::Projectiles,
        SyncField::GunsState,
        SyncField::Level,
    ];

    /// Wire name
    pub fn name(self) -> &'static str {
        match self {
            SyncField::PaddleX => "paddleX",
            SyncField::Balls => "balls",
            SyncField::Bricks => "bricks",
            SyncField::GuideLine => "guideLine",
            SyncField::PowerUps => "powerUps",
            SyncField::Scores => "scores",
            SyncField::Projectiles => "projectiles",
            SyncField::GunsState => "gunsState",
            SyncField::Level => "level",
        }
    }
}

/// Externally visible game state. Absent fields mean "unchanged"; unknown
/// fields on the wire are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paddle_x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balls: Option<Vec<Ball>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bricks: Option<Vec<Brick>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide_line: Option<GuideLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_ups: Option<Vec<PowerUp>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Scores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projectiles: Option<Vec<Projectile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guns_state: Option<GunsSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

impl GameSnapshot {
    /// Full snapshot of the authoritative state
    pub fn from_game_state(state: &GameState) -> Self {
        Self {
            paddle_x: Some(state.paddle.x),
            balls: Some(state.balls.clone()),
            bricks: Some(state.bricks.clone()),
            guide_line: Some(state.guide_line.clone()),
            power_ups: Some(state.power_ups.clone()),
            scores: Some(state.scores.clone()),
            projectiles: Some(state.projectiles.clone()),
            guns_state: Some(state.guns.snapshot(state.now_ms)),
            level: Some(state.level),
        }
    }

    pub fn has(&self, field: SyncField) -> bool {
        match field {
            SyncField::PaddleX => self.paddle_x.is_some(),
            SyncField::Balls => self.balls.is_some(),
            SyncField::Bricks => self.bricks.is_some(),
            SyncField::GuideLine => self.guide_line.is_some(),
            SyncField::PowerUps => self.power_ups.is_some(),
            SyncField::Scores => self.scores.is_some(),
            SyncField::Projectiles => self.projectiles.is_some(),
            SyncField::GunsState => self.guns_state.is_some(),
            SyncField::Level => self.level.is_some(),
        }
    }

    /// Fields present, in wire order
    pub fn fields(&self) -> Vec<SyncField> {
        SyncField::ALL.into_iter().filter(|f| self.has(*f)).collect()
    }

    pub fn is_empty(&self) -> bool {
        SyncField::ALL.iter().all(|f| !self.has(*f))
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("malformed message: {0}")]
    Decode(#[source] serde_json::Error),
}

pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(message).map_err(ProtocolError::Encode)
}

pub fn decode_client(bytes: &[u8]) -> Result<ClientMessage, ProtocolError> {
    serde_json::from_slice(bytes).map_err(ProtocolError::Decode)
}

pub fn decode_server(bytes: &[u8]) -> Result<ServerMessage, ProtocolError> {
    serde_json::from_slice(bytes).map_err(ProtocolError::Decode)
}
