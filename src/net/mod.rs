//! Networking: wire protocol, delta sync, framing and the WebTransport relay

pub mod connection;
pub mod delta;
pub mod framing;
pub mod protocol;
pub mod tls;
pub mod transport;
