use clap::Parser;
use log::info;
use server::config::{GameConfig, ServerConfig};
use server::network::Server;
use shared::{BOARD_HEIGHT, BOARD_WIDTH, FOOD_SCORE, TICK_MILLIS};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Milliseconds between ticks
    #[arg(short, long, default_value_t = TICK_MILLIS)]
    tick_ms: u64,

    /// Maximum number of connected clients
    #[arg(short, long, default_value = "32")]
    max_clients: usize,

    /// Board width in cells
    #[arg(long, default_value_t = BOARD_WIDTH)]
    width: i32,

    /// Board height in cells
    #[arg(long, default_value_t = BOARD_HEIGHT)]
    height: i32,

    /// Points awarded per food eaten
    #[arg(long, default_value_t = FOOD_SCORE)]
    food_score: u32,

    /// Seconds of silence before a client is dropped
    #[arg(long, default_value = "5")]
    client_timeout_secs: u64,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            game: GameConfig {
                width: self.width,
                height: self.height,
                food_score: self.food_score,
                tick_duration: Duration::from_millis(self.tick_ms),
            },
            max_clients: self.max_clients,
            client_timeout: Duration::from_secs(self.client_timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    info!("Starting snake server on {}", address);
    if args.tick_ms != TICK_MILLIS {
        info!("Tick period {}ms differs from the reference {}ms", args.tick_ms, TICK_MILLIS);
    }

    let mut server = Server::new(&address, args.server_config()).await?;
    server.run().await?;

    Ok(())
}
