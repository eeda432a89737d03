//! Prometheus-compatible metrics endpoint
//!
//! Exposes relay metrics in Prometheus format.
//! Default endpoint: http://localhost:9090/metrics

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Samples kept for the delta size percentile
const DELTA_SIZE_WINDOW: usize = 1000;

/// Metrics registry for the relay
#[derive(Debug)]
pub struct Metrics {
    // Rooms and seats
    pub rooms_active: AtomicU64,
    pub members_active: AtomicU64,
    pub join_rejections: AtomicU64,

    // Network stats
    pub connections_active: AtomicU64,
    pub connections_total: AtomicU64,
    pub messages_sent: AtomicU64,
    pub messages_received: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub bytes_received: AtomicU64,
    pub malformed_messages: AtomicU64,
    pub dropped_messages: AtomicU64,

    // Delta sync
    pub deltas_forwarded: AtomicU64,
    pub delta_fields_forwarded: AtomicU64,
    pub updates_suppressed: AtomicU64,
    pub delta_bytes_p95: AtomicU64,

    start_time: Instant,

    // Rolling encoded delta sizes (VecDeque for O(1) pop_front)
    delta_sizes: RwLock<VecDeque<u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            rooms_active: AtomicU64::new(0),
            members_active: AtomicU64::new(0),
            join_rejections: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            connections_total: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            malformed_messages: AtomicU64::new(0),
            dropped_messages: AtomicU64::new(0),
            deltas_forwarded: AtomicU64::new(0),
            delta_fields_forwarded: AtomicU64::new(0),
            updates_suppressed: AtomicU64::new(0),
            delta_bytes_p95: AtomicU64::new(0),
            start_time: Instant::now(),
            delta_sizes: RwLock::new(VecDeque::with_capacity(DELTA_SIZE_WINDOW)),
        }
    }

    pub fn record_received(&self, bytes: usize) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_sent(&self, bytes: usize) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record a forwarded delta. The size percentile needs `metrics_extended`.
    pub fn record_delta(&self, fields: usize, encoded_bytes: usize) {
        self.deltas_forwarded.fetch_add(1, Ordering::Relaxed);
        self.delta_fields_forwarded
            .fetch_add(fields as u64, Ordering::Relaxed);

        #[cfg(feature = "metrics_extended")]
        {
            let mut history = self.delta_sizes.write();
            history.push_back(encoded_bytes as u64);
            while history.len() > DELTA_SIZE_WINDOW {
                history.pop_front();
            }

            if history.len() >= 10 {
                let mut sorted: Vec<u64> = history.iter().copied().collect();
                sorted.sort_unstable();
                let p95_idx = (sorted.len() as f32 * 0.95) as usize;
                self.delta_bytes_p95
                    .store(sorted[p95_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            }
        }
        #[cfg(not(feature = "metrics_extended"))]
        let _ = encoded_bytes;
    }

    pub fn set_lobby_gauges(&self, rooms: usize, members: usize) {
        self.rooms_active.store(rooms as u64, Ordering::Relaxed);
        self.members_active.store(members as u64, Ordering::Relaxed);
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Generate Prometheus-format metrics output
    pub fn to_prometheus(&self) -> String {
        let mut output = String::with_capacity(2048);

        macro_rules! metric {
            ($name:expr, $help:expr, $type:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $name, $help, $name, $type, $name, $value
                ));
            };
        }

        metric!("brick_relay_rooms_active", "Rooms with at least one member", "gauge",
            self.rooms_active.load(Ordering::Relaxed));
        metric!("brick_relay_members_active", "Seated room members", "gauge",
            self.members_active.load(Ordering::Relaxed));
        metric!("brick_relay_join_rejections_total", "Join attempts rejected", "counter",
            self.join_rejections.load(Ordering::Relaxed));

        metric!("brick_relay_connections_active", "Active WebTransport connections", "gauge",
            self.connections_active.load(Ordering::Relaxed));
        metric!("brick_relay_connections_total", "Connections accepted since start", "counter",
            self.connections_total.load(Ordering::Relaxed));
        metric!("brick_relay_messages_sent_total", "Total messages sent", "counter",
            self.messages_sent.load(Ordering::Relaxed));
        metric!("brick_relay_messages_received_total", "Total messages received", "counter",
            self.messages_received.load(Ordering::Relaxed));
        metric!("brick_relay_bytes_sent_total", "Total bytes sent", "counter",
            self.bytes_sent.load(Ordering::Relaxed));
        metric!("brick_relay_bytes_received_total", "Total bytes received", "counter",
            self.bytes_received.load(Ordering::Relaxed));
        metric!("brick_relay_malformed_messages_total", "Inbound messages that failed to decode", "counter",
            self.malformed_messages.load(Ordering::Relaxed));
        metric!("brick_relay_dropped_messages_total", "Outbound messages dropped on full queues", "counter",
            self.dropped_messages.load(Ordering::Relaxed));

        metric!("brick_relay_deltas_forwarded_total", "Deltas forwarded to mirror peers", "counter",
            self.deltas_forwarded.load(Ordering::Relaxed));
        metric!("brick_relay_delta_fields_forwarded_total", "Fields carried by forwarded deltas", "counter",
            self.delta_fields_forwarded.load(Ordering::Relaxed));
        metric!("brick_relay_updates_suppressed_total", "Updates with no changed fields", "counter",
            self.updates_suppressed.load(Ordering::Relaxed));
        metric!("brick_relay_delta_bytes_p95", "95th percentile encoded delta size", "gauge",
            self.delta_bytes_p95.load(Ordering::Relaxed));

        metric!("brick_relay_uptime_seconds", "Relay uptime in seconds", "counter",
            self.uptime_seconds());

        output
    }

    /// JSON format metrics (alternative for direct API access)
    pub fn to_json(&self) -> String {
        let load = |v: &AtomicU64| v.load(Ordering::Relaxed);
        serde_json::json!({
            "lobby": {
                "rooms": load(&self.rooms_active),
                "members": load(&self.members_active),
                "join_rejections": load(&self.join_rejections),
            },
            "network": {
                "connections": load(&self.connections_active),
                "connections_total": load(&self.connections_total),
                "messages_sent": load(&self.messages_sent),
                "messages_received": load(&self.messages_received),
                "bytes_sent": load(&self.bytes_sent),
                "bytes_received": load(&self.bytes_received),
                "malformed": load(&self.malformed_messages),
                "dropped": load(&self.dropped_messages),
            },
            "sync": {
                "deltas_forwarded": load(&self.deltas_forwarded),
                "delta_fields_forwarded": load(&self.delta_fields_forwarded),
                "updates_suppressed": load(&self.updates_suppressed),
                "delta_bytes_p95": load(&self.delta_bytes_p95),
            },
            "uptime_seconds": self.uptime_seconds(),
        })
        .to_string()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn http_response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    )
}

fn route(metrics: &Metrics, request: &str) -> String {
    if request.starts_with("GET /metrics/json") {
        http_response("200 OK", "application/json", &metrics.to_json())
    } else if request.starts_with("GET /metrics") {
        http_response("200 OK", "text/plain; version=0.0.4", &metrics.to_prometheus())
    } else if request.starts_with("GET /health") {
        http_response("200 OK", "text/plain", "OK")
    } else {
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
    }
}

/// Start the metrics HTTP server
pub async fn start_metrics_server(metrics: Arc<Metrics>, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Metrics server listening on http://{}/metrics", addr);

    loop {
        let (mut socket, peer) = listener.accept().await?;
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 1024];
            match socket.read(&mut buffer).await {
                Ok(n) if n > 0 => {
                    let request = String::from_utf8_lossy(&buffer[..n]);
                    let response = route(&metrics, &request);
                    if let Err(e) = socket.write_all(response.as_bytes()).await {
                        debug!("Failed to write metrics response to {}: {}", peer, e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Failed to read from metrics socket {}: {}", peer, e);
                }
            }
        });
    }
}
