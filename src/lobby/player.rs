use std::time::Instant;

use crate::game::state::PlayerSlot;
use crate::net::connection::ConnectionId;

/// A connection seated in a room
#[derive(Debug, Clone)]
pub struct RoomMember {
    pub connection_id: ConnectionId,
    pub slot: PlayerSlot,
    pub joined_at: Instant,
    /// Updates received from this member that changed the room snapshot
    pub updates_applied: u64,
}

impl RoomMember {
    pub fn new(connection_id: ConnectionId, slot: PlayerSlot) -> Self {
        Self {
            connection_id,
            slot,
            joined_at: Instant::now(),
            updates_applied: 0,
        }
    }

    pub fn record_update(&mut self) {
        self.updates_applied += 1;
    }
}
