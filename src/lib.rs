//! Cooperative Brick Breaker
//!
//! Two players share one brick field and alternate turns. The peer holding
//! the turn simulates and streams state deltas; the other mirrors. A small
//! WebTransport relay pairs peers into rooms and forwards the deltas.
//!
//! # Features
//!
//! - `metrics_extended` - Rolling p95 of forwarded delta sizes (enabled by default)

pub mod client;
pub mod config;
pub mod game;
pub mod lobby;
pub mod metrics;
pub mod net;
pub mod util;
