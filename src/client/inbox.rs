//! Inbound message queue between a client's network task and its frame loop
//!
//! The network task decodes frames and pushes messages without blocking;
//! the frame loop drains everything pending at the frame boundary, so a
//! render pass never observes a half-applied message.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::game::constants::net::INBOX_CAPACITY;
use crate::net::protocol::{decode_server, ProtocolError, ServerMessage};

/// Bounded inbound queue
pub struct Inbox {
    sender: Sender<ServerMessage>,
    receiver: Receiver<ServerMessage>,
    capacity: usize,
}

impl Inbox {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Handle for the network task
    pub fn sender(&self) -> InboxSender {
        InboxSender {
            sender: self.sender.clone(),
        }
    }

    /// Everything queued since the last frame, in arrival order
    pub fn drain(&self) -> Vec<ServerMessage> {
        self.receiver.try_iter().collect()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new(INBOX_CAPACITY)
    }
}

/// Clonable producer handle
#[derive(Clone)]
pub struct InboxSender {
    sender: Sender<ServerMessage>,
}

impl InboxSender {
    /// Queue a decoded message (non-blocking)
    pub fn try_send(&self, message: ServerMessage) -> Result<(), InboxError> {
        self.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => InboxError::Full,
            TrySendError::Disconnected(_) => InboxError::Disconnected,
        })
    }

    /// Decode a raw frame payload and queue it
    pub fn push_frame(&self, payload: &[u8]) -> Result<(), InboxError> {
        let message = decode_server(payload)?;
        self.try_send(message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InboxError {
    #[error("inbox is full")]
    Full,
    #[error("frame loop has gone away")]
    Disconnected,
    #[error(transparent)]
    Malformed(#[from] ProtocolError),
}
