//! Peer side: inbound queue, mirrored state and authority switching

pub mod inbox;
pub mod mirror;
pub mod session;
