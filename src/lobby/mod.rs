//! Relay room bookkeeping
//!
//! Seats up to two connections per room, retains the merged snapshot for
//! late joiners and decides who receives each forwarded message.

pub mod manager;
pub mod player;
pub mod room;
