//! Console client that plays a few seconds of snake with random turns
//! and prints the leaderboard afterwards.

use bincode::{deserialize, serialize};
use clap::Parser;
use rand::seq::SliceRandom;
use shared::{is_opposite, Direction, Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{timeout, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Name shown on the leaderboard
    #[arg(short, long, default_value = "test-client")]
    name: String,

    /// How long to play, in seconds
    #[arg(short, long, default_value = "10")]
    duration: u64,
}

async fn send(
    socket: &UdpSocket,
    packet: &Packet,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    socket.send_to(&serialize(packet)?, addr).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let server_addr = args.server.parse::<SocketAddr>()?;

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Client socket bound to {}", socket.local_addr()?);

    let connect = Packet::Connect {
        client_version: PROTOCOL_VERSION,
        name: args.name.clone(),
    };
    println!("Sending connection request to {}", server_addr);
    send(&socket, &connect, server_addr).await?;

    let mut buf = [0u8; 2048];
    let (len, _) = timeout(Duration::from_secs(2), socket.recv_from(&mut buf)).await??;
    match deserialize::<Packet>(&buf[..len])? {
        Packet::Connected { client_id } => println!("Connected with client ID {}", client_id),
        other => {
            println!("Expected Connected but got: {:?}", other);
            return Ok(());
        }
    }

    send(&socket, &Packet::Start, server_addr).await?;

    let mut rng = rand::thread_rng();
    let mut heading = Direction::Right;
    let deadline = Instant::now() + Duration::from_secs(args.duration);

    while Instant::now() < deadline {
        let Ok(received) = timeout(Duration::from_millis(500), socket.recv_from(&mut buf)).await
        else {
            send(&socket, &Packet::Heartbeat, server_addr).await?;
            continue;
        };
        let (len, _) = received?;

        if let Ok(Packet::SessionUpdate { view }) = deserialize::<Packet>(&buf[..len]) {
            println!(
                "score {:>4}  best {:>4}  length {:>3}  {}",
                view.score,
                view.best,
                view.body.len(),
                if view.game_over { "GAME OVER" } else { "" }
            );

            if view.game_over {
                send(&socket, &Packet::Start, server_addr).await?;
                heading = Direction::Right;
                continue;
            }

            let choices: Vec<Direction> = Direction::ALL
                .iter()
                .copied()
                .filter(|d| !is_opposite(heading, *d))
                .collect();
            if let Some(direction) = choices.choose(&mut rng) {
                heading = *direction;
                send(&socket, &Packet::Turn { direction: heading }, server_addr).await?;
            }
        }
    }

    send(&socket, &Packet::Exit, server_addr).await?;
    send(&socket, &Packet::RequestLeaderboard, server_addr).await?;

    // Drain late session updates until the leaderboard arrives
    while let Ok(received) = timeout(Duration::from_secs(1), socket.recv_from(&mut buf)).await {
        let (len, _) = received?;
        if let Ok(Packet::Leaderboard { entries }) = deserialize::<Packet>(&buf[..len]) {
            println!("Leaderboard:");
            for (rank, entry) in entries.iter().enumerate() {
                println!("{:>2}. {:<12}  {:>4}", rank + 1, entry.display_name, entry.score);
            }
            break;
        }
    }

    send(&socket, &Packet::Disconnect, server_addr).await?;
    println!("Test client finished");

    Ok(())
}
