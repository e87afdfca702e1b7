//! Integration tests for the snake session server
//!
//! These tests validate cross-component interactions and real network behavior.

use bincode::{deserialize, serialize};
use server::config::{GameConfig, ServerConfig};
use server::food::FoodSpawner;
use server::network::{Server, ServerMessage};
use server::registry::{PlayerDirectory, SessionRegistry};
use shared::{Cell, Coord, Direction, Packet, PlayerId, SessionView, PROTOCOL_VERSION};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

struct Everyone;

impl PlayerDirectory for Everyone {
    fn is_reachable(&self, _player_id: PlayerId) -> bool {
        true
    }

    fn display_name(&self, _player_id: PlayerId) -> Option<String> {
        None
    }
}

/// NETWORK PROTOCOL TESTS
mod protocol_tests {
    use super::*;

    async fn recv_packet(socket: &UdpSocket) -> Packet {
        let mut buf = [0u8; 2048];
        let (len, _) = timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
            .await
            .expect("timed out waiting for server")
            .unwrap();
        deserialize(&buf[..len]).unwrap()
    }

    async fn send_packet(socket: &UdpSocket, packet: &Packet, addr: SocketAddr) {
        socket.send_to(&serialize(packet).unwrap(), addr).await.unwrap();
    }

    /// Connects over real UDP and plays a few ticks
    #[tokio::test]
    async fn connect_and_receive_ticks() {
        let config = ServerConfig {
            game: GameConfig {
                tick_duration: Duration::from_millis(20),
                ..GameConfig::default()
            },
            ..ServerConfig::default()
        };
        let mut server = Server::new("127.0.0.1:0", config).await.unwrap();
        let server_addr = server.local_addr().unwrap();
        let shutdown = server.shutdown_handle();
        let handle = tokio::spawn(async move {
            let _ = server.run().await;
        });

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let connect = Packet::Connect {
            client_version: PROTOCOL_VERSION,
            name: "integration".to_string(),
        };
        send_packet(&client, &connect, server_addr).await;

        let client_id = match recv_packet(&client).await {
            Packet::Connected { client_id } => client_id,
            other => panic!("Expected Connected, got {:?}", other),
        };

        let mut heads = Vec::new();
        while heads.len() < 3 {
            if let Packet::SessionUpdate { view } = recv_packet(&client).await {
                assert_eq!(view.player_id, client_id);
                assert_eq!((view.width, view.height), (18, 12));
                heads.push(view.head().unwrap());
            }
        }
        assert_ne!(heads[0], heads[2]);

        send_packet(&client, &Packet::RequestLeaderboard, server_addr).await;
        loop {
            if let Packet::Leaderboard { entries } = recv_packet(&client).await {
                assert!(entries.is_empty());
                break;
            }
        }

        shutdown.send(ServerMessage::Shutdown).unwrap();
        timeout(Duration::from_secs(2), handle)
            .await
            .expect("server did not shut down")
            .unwrap();
    }

    /// Tests malformed packet handling
    #[test]
    fn malformed_packet_handling() {
        let valid_packet = Packet::Turn {
            direction: Direction::Left,
        };
        let valid_data = serialize(&valid_packet).unwrap();

        let truncated_data = &valid_data[..valid_data.len() / 2];
        let result: Result<Packet, _> = deserialize(truncated_data);
        assert!(result.is_err(), "Should fail to deserialize truncated packet");

        let mut corrupted_data = valid_data.clone();
        corrupted_data[0] = 0xFF;
        let result: Result<Packet, _> = deserialize(&corrupted_data);
        assert!(result.is_err(), "Should fail to deserialize corrupted packet");

        let empty_data: Vec<u8> = vec![];
        let result: Result<Packet, _> = deserialize(&empty_data);
        assert!(result.is_err(), "Should fail to deserialize empty packet");
    }
}

/// GAME LOGIC INTEGRATION TESTS
mod game_logic_tests {
    use super::*;

    fn registry(seed: u64) -> SessionRegistry {
        SessionRegistry::with_spawner(GameConfig::default(), FoodSpawner::seeded(seed))
    }

    fn assert_view_consistent(view: &SessionView) {
        let unique: HashSet<Coord> = view.body.iter().copied().collect();
        assert_eq!(unique.len(), view.body.len(), "duplicate body cell");
        if view.running {
            assert!(!unique.contains(&view.food), "food inside snake");
        }
        for cell in &view.body {
            assert!((0..view.width).contains(&cell.x));
            assert!((0..view.height).contains(&cell.y));
        }
    }

    /// Drives many sessions with scripted turns through the registry
    #[test]
    fn many_sessions_stay_consistent() {
        let mut registry = registry(5);
        let turns = [Direction::Up, Direction::Left, Direction::Down, Direction::Right];

        for id in 1..=8 {
            registry.ensure(id);
        }

        for tick in 0..400u32 {
            for id in 1..=8u32 {
                if (tick + id) % 7 == 0 {
                    registry.request_direction(id, turns[((tick / 7 + id) % 4) as usize]);
                }
            }
            for view in registry.tick_all(&Everyone) {
                assert_view_consistent(&view);
            }
        }
    }

    /// A player who crashes can start again and keeps their best
    #[test]
    fn restart_after_game_over_keeps_best() {
        let mut registry = registry(9);
        registry.ensure(1);

        registry.request_direction(1, Direction::Up);
        registry.tick_all(&Everyone);
        registry.request_direction(1, Direction::Left);
        registry.tick_all(&Everyone);
        registry.request_direction(1, Direction::Down);
        registry.tick_all(&Everyone);

        let over = registry.view(1).unwrap();
        assert!(over.game_over);
        assert!(!over.running);
        assert!(registry.tick_all(&Everyone).is_empty());

        registry.reset(1);
        let fresh = registry.view(1).unwrap();
        assert!(fresh.running);
        assert!(!fresh.game_over);
        assert_eq!(fresh.score, 0);
        assert_eq!(fresh.best, over.score);
        assert_eq!(fresh.body.len(), 4);
    }

    /// The rendered grid matches the body and food
    #[test]
    fn view_cells_match_session() {
        let mut registry = registry(3);
        registry.ensure(1);
        let view = registry.view(1).unwrap();
        let cells = view.cells();

        assert_eq!(cells.len(), 18 * 12);
        assert_eq!(cells.iter().filter(|c| **c == Cell::Head).count(), 1);
        assert_eq!(cells.iter().filter(|c| **c == Cell::Body).count(), 3);
        assert_eq!(cells.iter().filter(|c| **c == Cell::Food).count(), 1);
        assert_eq!(view.cell_at(Coord::new(9, 6)), Cell::Head);
        assert_eq!(view.cell_at(view.food), Cell::Food);
    }
}
