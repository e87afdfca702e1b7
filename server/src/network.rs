//! Server network layer handling UDP communications and the tick loop

use crate::client_manager::ClientManager;
use crate::config::ServerConfig;
use crate::registry::SessionRegistry;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, PlayerId, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: PlayerId },
    Shutdown,
}

/// Messages sent from game loop to network tasks
#[derive(Debug)]
pub enum GameMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
}

/// Main server coordinating networking and the session registry
///
/// The registry is owned by the main loop and touched only from it, so
/// player commands and scheduled ticks never interleave.
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    registry: SessionRegistry,
    tick_duration: Duration,
    client_timeout: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(addr: &str, config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        config.game.validate()?;

        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(config.max_clients))),
            tick_duration: config.game.tick_duration,
            registry: SessionRegistry::new(config.game),
            client_timeout: config.client_timeout,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Handle for stopping the main loop from outside
    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();
        let timeout = self.client_timeout;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts(timeout)
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    /// Spawns task that turns Ctrl+C into an orderly shutdown
    fn spawn_shutdown_listener(&self) {
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C, shutting down gracefully...");
                let _ = server_tx.send(ServerMessage::Shutdown);
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn send_view(&self, client_id: PlayerId, addr: SocketAddr) {
        if let Some(view) = self.registry.view(client_id) {
            self.send_packet(Packet::SessionUpdate { view }, addr);
        }
    }

    /// Looks up the sender of a packet and records their activity
    async fn identify(&self, addr: SocketAddr) -> Option<PlayerId> {
        let mut clients = self.clients.write().await;
        let client_id = clients.find_client_by_addr(addr)?;
        clients.touch(client_id);
        Some(client_id)
    }

    /// Maps one client packet onto registry operations
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect {
                client_version,
                name,
            } => {
                info!(
                    "Client {} connecting from {} (version: {})",
                    name, addr, client_version
                );

                if client_version != PROTOCOL_VERSION {
                    let response = Packet::Disconnected {
                        reason: "Protocol version mismatch".to_string(),
                    };
                    self.send_packet(response, addr);
                    return;
                }

                // Remove existing connection if present
                let existing_client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };

                if let Some(existing_id) = existing_client_id {
                    info!("Removing existing client {} from {}", existing_id, addr);
                    let mut clients = self.clients.write().await;
                    clients.remove_client(&existing_id);
                    self.registry.remove(existing_id);
                }

                let client_id = {
                    let mut clients = self.clients.write().await;
                    clients.add_client(addr, name)
                };

                if let Some(client_id) = client_id {
                    self.registry.ensure(client_id);
                    self.send_packet(Packet::Connected { client_id }, addr);
                    self.send_view(client_id, addr);
                } else {
                    let response = Packet::Disconnected {
                        reason: "Server full".to_string(),
                    };
                    self.send_packet(response, addr);
                }
            }

            Packet::Start => {
                if let Some(client_id) = self.identify(addr).await {
                    self.registry.reset(client_id);
                    self.send_view(client_id, addr);
                }
            }

            Packet::Exit => {
                if let Some(client_id) = self.identify(addr).await {
                    self.registry.stop(client_id);
                    self.send_view(client_id, addr);
                }
            }

            Packet::Turn { direction } => {
                if let Some(client_id) = self.identify(addr).await {
                    self.registry.request_direction(client_id, direction);
                }
            }

            Packet::RequestLeaderboard => {
                if self.identify(addr).await.is_some() {
                    let entries = {
                        let clients = self.clients.read().await;
                        self.registry.leaderboard(&*clients)
                    };
                    self.send_packet(Packet::Leaderboard { entries }, addr);
                }
            }

            Packet::Heartbeat => {
                self.identify(addr).await;
            }

            Packet::Disconnect => {
                let client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };

                if let Some(client_id) = client_id {
                    let mut clients = self.clients.write().await;
                    clients.remove_client(&client_id);
                    self.registry.remove(client_id);
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Advances every running session and sends each player their view
    async fn tick(&mut self) {
        let deliveries = {
            let clients = self.clients.read().await;
            let updates = self.registry.tick_all(&*clients);
            updates
                .into_iter()
                .filter_map(|view| clients.addr_of(view.player_id).map(|addr| (view, addr)))
                .collect::<Vec<_>>()
        };

        for (view, addr) in deliveries {
            self.send_packet(Packet::SessionUpdate { view }, addr);
        }

        // Periodic monitoring, roughly every 30 seconds at the default rate
        let tick = self.registry.tick_count();
        if tick % 150 == 0 && !self.registry.is_empty() {
            debug!("Tick {}: {} sessions", tick, self.registry.len());
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        // Initialize concurrent tasks
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();
        self.spawn_shutdown_listener();

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Server started successfully ({}x{} board, {}ms ticks)",
            self.registry.config().width,
            self.registry.config().height,
            self.tick_duration.as_millis()
        );

        loop {
            tokio::select! {
                // Handle network events
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            self.registry.remove(client_id);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                // Handle server tick events
                _ = tick_interval.tick() => {
                    self.tick().await;
                },
            }
        }

        self.registry.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Direction;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_server_message_creation() {
        let packet = Packet::Turn {
            direction: Direction::Up,
        };
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080);

        let msg = ServerMessage::PacketReceived { packet, addr };

        match msg {
            ServerMessage::PacketReceived { packet: p, addr: a } => {
                assert_eq!(a, addr);
                match p {
                    Packet::Turn { direction } => assert_eq!(direction, Direction::Up),
                    _ => panic!("Unexpected packet type"),
                }
            }
            _ => panic!("Unexpected message type"),
        }
    }

    #[test]
    fn test_channel_communication() {
        let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

        assert!(tx.send(ServerMessage::ClientTimeout { client_id: 42 }).is_ok());

        match rx.try_recv().unwrap() {
            ServerMessage::ClientTimeout { client_id } => assert_eq!(client_id, 42),
            _ => panic!("Unexpected message type"),
        }
    }

    #[test]
    fn test_new_rejects_invalid_board() {
        let config = ServerConfig {
            game: crate::config::GameConfig {
                width: 2,
                ..Default::default()
            },
            ..Default::default()
        };

        let result = tokio_test::block_on(Server::new("127.0.0.1:0", config));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_connect_creates_session() {
        let mut server = Server::new("127.0.0.1:0", ServerConfig::default())
            .await
            .unwrap();
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();

        server
            .handle_packet(
                Packet::Connect {
                    client_version: PROTOCOL_VERSION,
                    name: "viper".to_string(),
                },
                addr,
            )
            .await;

        assert_eq!(server.registry.len(), 1);
        assert_eq!(server.clients.read().await.len(), 1);

        match server.game_rx.try_recv().unwrap() {
            GameMessage::SendPacket {
                packet: Packet::Connected { client_id },
                addr: to,
            } => {
                assert_eq!(client_id, 1);
                assert_eq!(to, addr);
            }
            other => panic!("Unexpected message {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_version_mismatch_is_refused() {
        let mut server = Server::new("127.0.0.1:0", ServerConfig::default())
            .await
            .unwrap();
        let addr: SocketAddr = "127.0.0.1:40001".parse().unwrap();

        server
            .handle_packet(
                Packet::Connect {
                    client_version: PROTOCOL_VERSION + 1,
                    name: "old".to_string(),
                },
                addr,
            )
            .await;

        assert!(server.registry.is_empty());
        match server.game_rx.try_recv().unwrap() {
            GameMessage::SendPacket {
                packet: Packet::Disconnected { reason },
                ..
            } => assert_eq!(reason, "Protocol version mismatch"),
            other => panic!("Unexpected message {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reconnect_replaces_session() {
        let mut server = Server::new("127.0.0.1:0", ServerConfig::default())
            .await
            .unwrap();
        let addr: SocketAddr = "127.0.0.1:40002".parse().unwrap();
        let connect = || Packet::Connect {
            client_version: PROTOCOL_VERSION,
            name: "viper".to_string(),
        };

        server.handle_packet(connect(), addr).await;
        server.handle_packet(connect(), addr).await;

        assert_eq!(server.registry.len(), 1);
        assert!(server.registry.session(1).is_none());
        assert!(server.registry.session(2).is_some());
    }

    #[tokio::test]
    async fn test_commands_from_unknown_address_are_ignored() {
        let mut server = Server::new("127.0.0.1:0", ServerConfig::default())
            .await
            .unwrap();
        let addr: SocketAddr = "127.0.0.1:40003".parse().unwrap();

        server.handle_packet(Packet::Start, addr).await;
        server
            .handle_packet(
                Packet::Turn {
                    direction: Direction::Up,
                },
                addr,
            )
            .await;
        server.handle_packet(Packet::Exit, addr).await;

        assert!(server.registry.is_empty());
        assert!(server.game_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_exit_and_disconnect() {
        let mut server = Server::new("127.0.0.1:0", ServerConfig::default())
            .await
            .unwrap();
        let addr: SocketAddr = "127.0.0.1:40004".parse().unwrap();

        server
            .handle_packet(
                Packet::Connect {
                    client_version: PROTOCOL_VERSION,
                    name: "viper".to_string(),
                },
                addr,
            )
            .await;
        server.handle_packet(Packet::Exit, addr).await;

        let session = server.registry.session(1).unwrap();
        assert!(!session.is_running());
        assert!(!session.is_game_over());

        server.handle_packet(Packet::Disconnect, addr).await;
        assert!(server.registry.is_empty());
        assert!(server.clients.read().await.is_empty());
    }
}
