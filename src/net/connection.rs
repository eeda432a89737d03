use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;
use uuid::Uuid;

/// Relay-side connection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encoded frame payload shared between recipients
pub type Payload = Arc<[u8]>;

/// Client connection information
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub remote_addr: SocketAddr,
    pub created_at: Instant,
    pub last_activity: Instant,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub messages_sent: u64,
    pub messages_received: u64,
    outbound: mpsc::Sender<Payload>,
}

impl Connection {
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn record_received(&mut self, bytes: usize) {
        self.bytes_received += bytes as u64;
        self.messages_received += 1;
        self.touch();
    }
}

/// Why a frame could not be queued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    UnknownConnection,
    QueueFull,
    Closed,
}

/// Open connections and their outbound queues. Writer tasks own the
/// receiving halves and drain them onto the wire.
pub struct ConnectionManager {
    connections: HashMap<ConnectionId, Connection>,
    queue_capacity: usize,
}

impl ConnectionManager {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            connections: HashMap::new(),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Register a connection, returning its id and outbound queue receiver
    pub fn register(&mut self, remote_addr: SocketAddr) -> (ConnectionId, mpsc::Receiver<Payload>) {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let id = ConnectionId::new();
        let now = Instant::now();
        self.connections.insert(
            id,
            Connection {
                id,
                remote_addr,
                created_at: now,
                last_activity: now,
                bytes_sent: 0,
                bytes_received: 0,
                messages_sent: 0,
                messages_received: 0,
                outbound: tx,
            },
        );
        (id, rx)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    /// Queue a frame without blocking
    pub fn deliver(&mut self, id: ConnectionId, payload: Payload) -> Result<(), DeliveryError> {
        let conn = self
            .connections
            .get_mut(&id)
            .ok_or(DeliveryError::UnknownConnection)?;
        let len = payload.len();
        match conn.outbound.try_send(payload) {
            Ok(()) => {
                conn.bytes_sent += len as u64;
                conn.messages_sent += 1;
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                warn!(connection = %id, "Outbound queue full, dropping message");
                Err(DeliveryError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(DeliveryError::Closed),
        }
    }

    /// Remove a connection; dropping the sender ends its writer task
    pub fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    pub fn count(&self) -> usize {
        self.connections.len()
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }
}
