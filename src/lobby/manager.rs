use std::sync::Arc;

use hashbrown::HashMap;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::game::state::PlayerSlot;
use crate::lobby::room::{Room, RoomError};
use crate::metrics::Metrics;
use crate::net::connection::ConnectionId;
use crate::net::protocol::{ClientMessage, GameSnapshot, ServerMessage};

/// A message the relay owes one connection
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: ConnectionId,
    pub message: ServerMessage,
}

impl Outbound {
    fn new(to: ConnectionId, message: ServerMessage) -> Self {
        Self { to, message }
    }
}

/// Result of seating a connection
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub slot: PlayerSlot,
    pub current_player: PlayerSlot,
    /// Retained state for bringing the joiner to parity
    pub snapshot: Option<GameSnapshot>,
}

/// Room bookkeeping for the relay
pub struct LobbyManager {
    rooms: HashMap<String, Room>,
    memberships: FxHashMap<ConnectionId, String>,
    max_rooms: usize,
    metrics: Option<Arc<Metrics>>,
}

impl LobbyManager {
    pub fn new(max_rooms: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            memberships: FxHashMap::default(),
            max_rooms,
            metrics: None,
        }
    }

    pub fn with_metrics(max_rooms: usize, metrics: Arc<Metrics>) -> Self {
        Self {
            metrics: Some(metrics),
            ..Self::new(max_rooms)
        }
    }

    /// Route one inbound message. Returns what to send, and to whom.
    pub fn handle(&mut self, from: ConnectionId, message: ClientMessage) -> Vec<Outbound> {
        match message {
            ClientMessage::Join { room_id } => self.handle_join(from, room_id),
            ClientMessage::GameUpdate { game_state } => {
                let Some(room) = self.room_of_mut(from) else {
                    debug!(connection = %from, "Update from unseated connection ignored");
                    return Vec::new();
                };
                match room.absorb_update(from, &game_state) {
                    Some(delta) => room
                        .recipients(Some(from))
                        .into_iter()
                        .map(|to| {
                            Outbound::new(to, ServerMessage::GameUpdateDelta { delta: delta.clone() })
                        })
                        .collect(),
                    None => {
                        if let Some(metrics) = &self.metrics {
                            metrics
                                .updates_suppressed
                                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        }
                        Vec::new()
                    }
                }
            }
            ClientMessage::SwitchPlayer(handover) => {
                let Some(room) = self.room_of_mut(from) else {
                    return Vec::new();
                };
                room.note_turn_switch(&handover);
                info!(room = %room.id, player = %handover.current_player, "Turn switched");
                broadcast(room, ServerMessage::SwitchPlayer(handover))
            }
            ClientMessage::LevelUp(advance) => {
                let Some(room) = self.room_of_mut(from) else {
                    return Vec::new();
                };
                room.note_level_up(&advance);
                info!(room = %room.id, level = advance.level, "Level up");
                broadcast(room, ServerMessage::LevelUp(advance))
            }
            ClientMessage::GameOver(notice) => {
                let Some(room) = self.room_of_mut(from) else {
                    return Vec::new();
                };
                room.note_game_over();
                info!(room = %room.id, reason = %String::from(notice.reason.clone()), score = notice.score, "Game over");
                broadcast(room, ServerMessage::GameOver(notice))
            }
        }
    }

    fn handle_join(&mut self, from: ConnectionId, room_id: String) -> Vec<Outbound> {
        match self.join_room(from, &room_id) {
            Ok(outcome) => {
                // Always followed by the retained state, empty for a fresh
                // room, so the joiner knows when it is at parity
                let delta = outcome.snapshot.unwrap_or_default();
                vec![
                    Outbound::new(
                        from,
                        ServerMessage::Joined {
                            player: outcome.slot,
                            current_player: outcome.current_player,
                        },
                    ),
                    Outbound::new(from, ServerMessage::GameUpdateDelta { delta }),
                ]
            }
            Err(e) => {
                warn!(connection = %from, room = %room_id, "Join rejected: {}", e);
                if let Some(metrics) = &self.metrics {
                    metrics
                        .join_rejections
                        .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                }
                vec![Outbound::new(
                    from,
                    ServerMessage::Error {
                        message: e.to_string(),
                    },
                )]
            }
        }
    }

    /// Seat a connection, creating the room on first join
    pub fn join_room(
        &mut self,
        connection_id: ConnectionId,
        room_id: &str,
    ) -> Result<JoinOutcome, ManagerError> {
        if room_id.is_empty() {
            return Err(ManagerError::InvalidRoomId);
        }
        if self.memberships.contains_key(&connection_id) {
            return Err(ManagerError::AlreadyInRoom);
        }
        if !self.rooms.contains_key(room_id) && self.rooms.len() >= self.max_rooms {
            return Err(ManagerError::TooManyRooms);
        }

        let room = self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Room::new(room_id.to_string()));
        let slot = room.join(connection_id)?;
        let outcome = JoinOutcome {
            slot,
            current_player: room.current_player,
            snapshot: room.snapshot().cloned(),
        };
        self.memberships.insert(connection_id, room_id.to_string());
        info!(connection = %connection_id, room = %room_id, player = %slot, "Joined room");
        self.refresh_gauges();
        Ok(outcome)
    }

    /// Drop a connection from its room, discarding the room once empty
    pub fn leave_room(&mut self, connection_id: ConnectionId) -> Result<PlayerSlot, ManagerError> {
        let room_id = self
            .memberships
            .remove(&connection_id)
            .ok_or(ManagerError::NotInRoom)?;

        let mut slot = None;
        if let Some(room) = self.rooms.get_mut(&room_id) {
            slot = room.leave(connection_id).map(|m| m.slot);
            if room.is_empty() {
                self.rooms.remove(&room_id);
                debug!(room = %room_id, "Room discarded");
            }
        }
        self.refresh_gauges();
        info!(connection = %connection_id, room = %room_id, "Left room");
        slot.ok_or(ManagerError::NotInRoom)
    }

    pub fn get_room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn room_of(&self, connection_id: ConnectionId) -> Option<&Room> {
        self.memberships
            .get(&connection_id)
            .and_then(|id| self.rooms.get(id))
    }

    fn room_of_mut(&mut self, connection_id: ConnectionId) -> Option<&mut Room> {
        let id = self.memberships.get(&connection_id)?;
        self.rooms.get_mut(id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn member_count(&self) -> usize {
        self.memberships.len()
    }

    fn refresh_gauges(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.set_lobby_gauges(self.rooms.len(), self.memberships.len());
        }
    }

    pub fn shutdown(&mut self) {
        self.rooms.clear();
        self.memberships.clear();
        self.refresh_gauges();
    }
}

impl Default for LobbyManager {
    fn default() -> Self {
        Self::new(1000)
    }
}

fn broadcast(room: &Room, message: ServerMessage) -> Vec<Outbound> {
    room.recipients(None)
        .into_iter()
        .map(|to| Outbound::new(to, message.clone()))
        .collect()
}

/// Manager errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManagerError {
    #[error("Too many rooms")]
    TooManyRooms,
    #[error("Room id must not be empty")]
    InvalidRoomId,
    #[error("Already in a room")]
    AlreadyInRoom,
    #[error("Not in a room")]
    NotInRoom,
    #[error(transparent)]
    Room(#[from] RoomError),
}
