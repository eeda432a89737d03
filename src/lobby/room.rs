use std::time::Instant;

use smallvec::SmallVec;
use tracing::debug;

use crate::game::constants::net::ROOM_CAPACITY;
use crate::game::events::{LevelAdvance, TurnHandover};
use crate::game::state::PlayerSlot;
use crate::lobby::player::RoomMember;
use crate::net::connection::ConnectionId;
use crate::net::delta::{apply_delta, generate_delta};
use crate::net::protocol::GameSnapshot;

/// Room lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// Fewer than two members seated
    Waiting,
    Playing,
    /// A game-over notice went through
    Ended,
}

/// Relay-side room: up to two members plus the last merged snapshot
pub struct Room {
    pub id: String,
    pub state: RoomState,
    pub current_player: PlayerSlot,
    pub created_at: Instant,
    members: SmallVec<[RoomMember; ROOM_CAPACITY]>,
    snapshot: GameSnapshot,
}

impl Room {
    pub fn new(id: String) -> Self {
        Self {
            id,
            state: RoomState::Waiting,
            current_player: PlayerSlot::One,
            created_at: Instant::now(),
            members: SmallVec::new(),
            snapshot: GameSnapshot::default(),
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= ROOM_CAPACITY
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member(&self, connection_id: ConnectionId) -> Option<&RoomMember> {
        self.members.iter().find(|m| m.connection_id == connection_id)
    }

    /// Seat a connection in the lowest free slot
    pub fn join(&mut self, connection_id: ConnectionId) -> Result<PlayerSlot, RoomError> {
        if self.member(connection_id).is_some() {
            return Err(RoomError::AlreadySeated);
        }
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }
        let slot = [PlayerSlot::One, PlayerSlot::Two]
            .into_iter()
            .find(|slot| self.members.iter().all(|m| m.slot != *slot))
            .ok_or(RoomError::RoomFull)?;

        self.members.push(RoomMember::new(connection_id, slot));
        if self.is_full() && self.state == RoomState::Waiting {
            self.state = RoomState::Playing;
        }
        Ok(slot)
    }

    pub fn leave(&mut self, connection_id: ConnectionId) -> Option<RoomMember> {
        let index = self
            .members
            .iter()
            .position(|m| m.connection_id == connection_id)?;
        let member = self.members.remove(index);
        if self.state == RoomState::Playing {
            self.state = RoomState::Waiting;
        }
        Some(member)
    }

    /// Merge an inbound full or partial snapshot. Returns the fields that
    /// actually changed, or `None` when the update repeats known state.
    pub fn absorb_update(
        &mut self,
        sender: ConnectionId,
        update: &GameSnapshot,
    ) -> Option<GameSnapshot> {
        let delta = generate_delta(&self.snapshot, update)?;
        apply_delta(&mut self.snapshot, &delta);
        if let Some(member) = self.members.iter_mut().find(|m| m.connection_id == sender) {
            member.record_update();
        }
        debug!(room = %self.id, fields = delta.fields().len(), "Snapshot updated");
        Some(delta)
    }

    /// Turn switch: new authority and the post-shift bricks
    pub fn note_turn_switch(&mut self, handover: &TurnHandover) {
        self.current_player = handover.current_player;
        self.snapshot.bricks = Some(handover.bricks.clone());
    }

    pub fn note_level_up(&mut self, advance: &LevelAdvance) {
        self.snapshot.level = Some(advance.level);
    }

    pub fn note_game_over(&mut self) {
        self.state = RoomState::Ended;
    }

    /// Last merged state, offered to a late joiner. `None` before any update.
    pub fn snapshot(&self) -> Option<&GameSnapshot> {
        (!self.snapshot.is_empty()).then_some(&self.snapshot)
    }

    /// Member connections, optionally excluding one
    pub fn recipients(&self, except: Option<ConnectionId>) -> SmallVec<[ConnectionId; ROOM_CAPACITY]> {
        self.members
            .iter()
            .map(|m| m.connection_id)
            .filter(|id| Some(*id) != except)
            .collect()
    }
}

/// Room errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("Room is full")]
    RoomFull,
    #[error("Already in this room")]
    AlreadySeated,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{Brick, Scores};

    #[test]
    fn test_room_new() {
        let room = Room::new("abc123".into());
        assert_eq!(room.state, RoomState::Waiting);
        assert!(room.is_empty());
        assert!(room.snapshot().is_none());
    }

    #[test]
    fn test_slots_in_join_order() {
        let mut room = Room::new("r".into());
        assert_eq!(room.join(ConnectionId::new()), Ok(PlayerSlot::One));
        assert_eq!(room.join(ConnectionId::new()), Ok(PlayerSlot::Two));
        assert_eq!(room.state, RoomState::Playing);
    }

    #[test]
    fn test_room_full() {
        let mut room = Room::new("r".into());
        room.join(ConnectionId::new()).unwrap();
        room.join(ConnectionId::new()).unwrap();
        assert_eq!(room.join(ConnectionId::new()), Err(RoomError::RoomFull));
        assert_eq!(room.member_count(), 2);
    }

    #[test]
    fn test_rejoin_takes_freed_slot() {
        let mut room = Room::new("r".into());
        let first = ConnectionId::new();
        room.join(first).unwrap();
        room.join(ConnectionId::new()).unwrap();
        assert_eq!(room.leave(first).unwrap().slot, PlayerSlot::One);
        assert_eq!(room.state, RoomState::Waiting);
        assert_eq!(room.join(ConnectionId::new()), Ok(PlayerSlot::One));
    }

    #[test]
    fn test_double_join_rejected() {
        let mut room = Room::new("r".into());
        let id = ConnectionId::new();
        room.join(id).unwrap();
        assert_eq!(room.join(id), Err(RoomError::AlreadySeated));
    }

    #[test]
    fn test_absorb_update_filters_unchanged() {
        let mut room = Room::new("r".into());
        let sender = ConnectionId::new();
        room.join(sender).unwrap();

        let update = GameSnapshot {
            paddle_x: Some(100.0),
            level: Some(1),
            ..Default::default()
        };
        let delta = room.absorb_update(sender, &update).unwrap();
        assert_eq!(delta, update);
        assert!(room.absorb_update(sender, &update).is_none());

        let moved = GameSnapshot {
            paddle_x: Some(120.0),
            level: Some(1),
            ..Default::default()
        };
        let delta = room.absorb_update(sender, &moved).unwrap();
        assert_eq!(delta.paddle_x, Some(120.0));
        assert!(delta.level.is_none());
        assert_eq!(room.member(sender).unwrap().updates_applied, 2);
    }

    #[test]
    fn test_turn_switch_replaces_bricks() {
        let mut room = Room::new("r".into());
        room.absorb_update(
            ConnectionId::new(),
            &GameSnapshot {
                scores: Some(Scores::default()),
                bricks: Some(vec![Brick::new(0.0, 0.0, 1, 0)]),
                ..Default::default()
            },
        );
        room.note_turn_switch(&TurnHandover {
            current_player: PlayerSlot::Two,
            bricks: vec![],
            dropping_bricks: vec![],
        });
        assert_eq!(room.current_player, PlayerSlot::Two);
        assert_eq!(room.snapshot().unwrap().bricks, Some(vec![]));
    }

    #[test]
    fn test_recipients_excludes_sender() {
        let mut room = Room::new("r".into());
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        room.join(a).unwrap();
        room.join(b).unwrap();
        assert_eq!(room.recipients(Some(a)).as_slice(), &[b]);
        assert_eq!(room.recipients(None).len(), 2);
    }
}
