//! WebTransport relay
//!
//! Each client opens one bidirectional stream. A reader task decodes
//! inbound frames and routes them through the lobby; a writer task drains
//! the connection's outbound queue onto the stream. The lobby lock is held
//! only while one message is routed, never across I/O.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::game::constants::net::OUTBOUND_QUEUE;
use crate::lobby::manager::{LobbyManager, Outbound};
use crate::metrics::Metrics;
use crate::net::connection::{ConnectionId, ConnectionManager, DeliveryError, Payload};
use crate::net::framing::{read_message, write_message, FramingError};
use crate::net::protocol::{decode_client, encode, ServerMessage};
use crate::net::tls::TlsConfig;

/// State shared by every connection task
#[derive(Clone)]
pub struct RelayContext {
    pub lobby: Arc<RwLock<LobbyManager>>,
    pub connections: Arc<Mutex<ConnectionManager>>,
    pub metrics: Arc<Metrics>,
    pub max_message_size: usize,
}

impl RelayContext {
    pub fn new(config: &ServerConfig, lobby: Arc<RwLock<LobbyManager>>, metrics: Arc<Metrics>) -> Self {
        Self {
            lobby,
            connections: Arc::new(Mutex::new(ConnectionManager::new(OUTBOUND_QUEUE))),
            metrics,
            max_message_size: config.max_message_size,
        }
    }

    /// Encode and queue routed messages. Identical consecutive messages
    /// (broadcasts) are encoded once.
    fn dispatch(&self, outbound: Vec<Outbound>) {
        let mut previous: Option<(ServerMessage, Payload)> = None;
        for Outbound { to, message } in outbound {
            let cached = previous
                .as_ref()
                .filter(|(last, _)| *last == message)
                .map(|(_, bytes)| bytes.clone());
            let payload = match cached {
                Some(bytes) => bytes,
                None => match encode(&message) {
                    Ok(bytes) => {
                        let bytes: Payload = Arc::from(bytes);
                        previous = Some((message.clone(), bytes.clone()));
                        bytes
                    }
                    Err(e) => {
                        warn!(kind = message.kind(), "Failed to encode message: {}", e);
                        continue;
                    }
                },
            };

            if let ServerMessage::GameUpdateDelta { delta } = &message {
                let fields = delta.fields().len();
                if fields > 0 {
                    self.metrics.record_delta(fields, payload.len());
                }
            }

            match self.connections.lock().deliver(to, payload) {
                Ok(()) => {}
                Err(DeliveryError::QueueFull) => {
                    self.metrics.dropped_messages.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => debug!(connection = %to, kind = message.kind(), "Not delivered: {:?}", e),
            }
        }
    }
}

/// WebTransport relay server
pub struct RelayServer {
    config: ServerConfig,
    tls_config: TlsConfig,
    context: RelayContext,
}

impl RelayServer {
    pub async fn new(
        config: ServerConfig,
        lobby: Arc<RwLock<LobbyManager>>,
        metrics: Arc<Metrics>,
    ) -> anyhow::Result<Self> {
        let tls_config = TlsConfig::load(&config).await?;
        let context = RelayContext::new(&config, lobby, metrics);
        Ok(Self {
            config,
            tls_config,
            context,
        })
    }

    pub fn cert_hash(&self) -> &str {
        self.tls_config.cert_hash()
    }

    /// Accept sessions until the endpoint fails
    pub async fn run(self) -> anyhow::Result<()> {
        use wtransport::Endpoint;
        use wtransport::ServerConfig;

        // Dual-stack bind so both localhost and LAN clients connect
        let server_config = ServerConfig::builder()
            .with_bind_default(self.config.port)
            .with_identity(self.tls_config.identity)
            .build();

        let server = Endpoint::server(server_config)?;

        info!("WebTransport relay listening on port {}", self.config.port);
        info!("Certificate hash: {}", self.tls_config.cert_hash);

        loop {
            let incoming = server.accept().await;
            let context = self.context.clone();

            tokio::spawn(async move {
                if let Err(e) = handle_connection(incoming, context).await {
                    warn!("Connection error: {}", e);
                }
            });
        }
    }
}

/// Handle a single WebTransport session
async fn handle_connection(
    incoming: wtransport::endpoint::IncomingSession,
    context: RelayContext,
) -> anyhow::Result<()> {
    let session_request = incoming.await?;
    debug!(
        "New session from: {:?}, path: {}",
        session_request.authority(),
        session_request.path()
    );

    let connection = session_request.accept().await?;
    let remote = connection.remote_address();

    let (send, recv) = connection.accept_bi().await?;
    debug!(%remote, "Accepted bidirectional stream");

    serve_stream(context, remote, recv, send).await
}

/// Serve one client over any byte stream pair until it closes
pub async fn serve_stream<R, W>(
    context: RelayContext,
    remote: SocketAddr,
    mut reader: R,
    writer: W,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (id, outbound) = context.connections.lock().register(remote);
    context.metrics.connections_active.fetch_add(1, Ordering::Relaxed);
    context.metrics.connections_total.fetch_add(1, Ordering::Relaxed);
    info!(connection = %id, %remote, "Connection opened");

    let writer_task = tokio::spawn(write_loop(
        id,
        writer,
        outbound,
        context.max_message_size,
        context.metrics.clone(),
    ));

    let result = read_loop(&context, id, &mut reader).await;

    // Deregister; dropping the queue sender stops the writer
    {
        let mut lobby = context.lobby.write().await;
        if let Ok(slot) = lobby.leave_room(id) {
            debug!(connection = %id, player = %slot, "Seat released");
        }
    }
    context.connections.lock().remove(id);
    context.metrics.connections_active.fetch_sub(1, Ordering::Relaxed);
    if let Err(e) = writer_task.await {
        debug!(connection = %id, "Writer task ended abnormally: {}", e);
    }
    info!(connection = %id, "Connection closed");
    result
}

async fn read_loop<R: AsyncRead + Unpin>(
    context: &RelayContext,
    id: ConnectionId,
    reader: &mut R,
) -> anyhow::Result<()> {
    loop {
        let bytes = match read_message(reader, context.max_message_size).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_closed() => {
                debug!(connection = %id, "Stream closed");
                return Ok(());
            }
            Err(e @ FramingError::MessageTooLarge(..)) => {
                // The rest of the stream cannot be resynchronised
                warn!(connection = %id, "Rejected oversized frame: {}", e);
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        context.metrics.record_received(bytes.len());
        if let Some(conn) = context.connections.lock().get_mut(id) {
            conn.record_received(bytes.len());
        }

        let message = match decode_client(&bytes) {
            Ok(message) => message,
            Err(e) => {
                warn!(connection = %id, "Dropping message: {}", e);
                context.metrics.malformed_messages.fetch_add(1, Ordering::Relaxed);
                continue;
            }
        };
        debug!(connection = %id, kind = message.kind(), "Received");

        let outbound = context.lobby.write().await.handle(id, message);
        context.dispatch(outbound);
    }
}

async fn write_loop<W: AsyncWrite + Unpin>(
    id: ConnectionId,
    mut writer: W,
    mut outbound: mpsc::Receiver<Payload>,
    max_message_size: usize,
    metrics: Arc<Metrics>,
) {
    while let Some(payload) = outbound.recv().await {
        match write_message(&mut writer, &payload, max_message_size).await {
            Ok(()) => metrics.record_sent(payload.len()),
            Err(FramingError::MessageTooLarge(len, max)) => {
                warn!(connection = %id, len, max, "Outbound message too large, dropped");
            }
            Err(e) => {
                debug!(connection = %id, "Write failed: {}", e);
                break;
            }
        }
    }
}

/// Placeholder peer address for streams without one
pub fn unspecified_peer() -> SocketAddr {
    SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::net::MAX_MESSAGE_SIZE;
    use crate::game::events::TurnHandover;
    use crate::game::state::PlayerSlot;
    use crate::net::protocol::{decode_server, ClientMessage, GameSnapshot};
    use std::time::Duration;
    use tokio::io::DuplexStream;

    fn context() -> RelayContext {
        RelayContext::new(
            &ServerConfig::default(),
            Arc::new(RwLock::new(LobbyManager::new(10))),
            Arc::new(Metrics::new()),
        )
    }

    fn connect(context: &RelayContext) -> DuplexStream {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (reader, writer) = tokio::io::split(server);
        tokio::spawn(serve_stream(context.clone(), unspecified_peer(), reader, writer));
        client
    }

    async fn send(stream: &mut DuplexStream, message: &ClientMessage) {
        write_message(stream, &encode(message).unwrap(), MAX_MESSAGE_SIZE)
            .await
            .unwrap();
    }

    /// Read `joined` and the parity state that always follows it
    async fn recv_join(stream: &mut DuplexStream) -> (ServerMessage, GameSnapshot) {
        let joined = recv(stream).await;
        match recv(stream).await {
            ServerMessage::GameUpdateDelta { delta } => (joined, delta),
            other => panic!("expected parity state, got {other:?}"),
        }
    }

    async fn recv(stream: &mut DuplexStream) -> ServerMessage {
        let bytes = tokio::time::timeout(
            Duration::from_secs(2),
            read_message(stream, MAX_MESSAGE_SIZE),
        )
        .await
        .unwrap()
        .unwrap();
        decode_server(&bytes).unwrap()
    }

    fn join(room: &str) -> ClientMessage {
        ClientMessage::Join {
            room_id: room.into(),
        }
    }

    #[tokio::test]
    async fn test_two_clients_relay() {
        let ctx = context();
        let mut a = connect(&ctx);
        let mut b = connect(&ctx);

        send(&mut a, &join("room42")).await;
        let (joined, parity) = recv_join(&mut a).await;
        assert!(matches!(
            joined,
            ServerMessage::Joined {
                player: PlayerSlot::One,
                ..
            }
        ));
        assert!(parity.fields().is_empty());
        send(&mut b, &join("room42")).await;
        let (joined, _) = recv_join(&mut b).await;
        assert!(matches!(
            joined,
            ServerMessage::Joined {
                player: PlayerSlot::Two,
                ..
            }
        ));

        send(
            &mut a,
            &ClientMessage::GameUpdate {
                game_state: GameSnapshot {
                    paddle_x: Some(77.0),
                    ..Default::default()
                },
            },
        )
        .await;
        match recv(&mut b).await {
            ServerMessage::GameUpdateDelta { delta } => assert_eq!(delta.paddle_x, Some(77.0)),
            other => panic!("unexpected {other:?}"),
        }

        send(
            &mut a,
            &ClientMessage::SwitchPlayer(TurnHandover {
                current_player: PlayerSlot::Two,
                bricks: vec![],
                dropping_bricks: vec![],
            }),
        )
        .await;
        assert!(matches!(recv(&mut a).await, ServerMessage::SwitchPlayer(_)));
        assert!(matches!(recv(&mut b).await, ServerMessage::SwitchPlayer(_)));
        assert_eq!(ctx.metrics.deltas_forwarded.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_malformed_message_keeps_connection() {
        let ctx = context();
        let mut a = connect(&ctx);

        write_message(&mut a, b"{broken", MAX_MESSAGE_SIZE).await.unwrap();
        send(&mut a, &join("r")).await;
        assert!(matches!(recv(&mut a).await, ServerMessage::Joined { .. }));
        assert_eq!(ctx.metrics.malformed_messages.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_third_client_gets_error() {
        let ctx = context();
        let mut clients = vec![connect(&ctx), connect(&ctx), connect(&ctx)];
        for client in clients.iter_mut().take(2) {
            send(client, &join("full")).await;
            recv(client).await;
        }
        send(&mut clients[2], &join("full")).await;
        match recv(&mut clients[2]).await {
            ServerMessage::Error { message } => assert_eq!(message, "Room is full"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_disconnect_releases_room() {
        let ctx = context();
        let mut a = connect(&ctx);
        send(&mut a, &join("gone")).await;
        recv(&mut a).await;
        assert_eq!(ctx.lobby.read().await.room_count(), 1);

        drop(a);
        for _ in 0..100 {
            if ctx.lobby.read().await.room_count() == 0 && ctx.connections.lock().count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(ctx.lobby.read().await.room_count(), 0);
        assert_eq!(ctx.connections.lock().count(), 0);
    }
}
