//! # Snake Session Server Library
//!
//! This library provides the authoritative game-state engine for a
//! tick-driven, multi-session Snake server. Every connected player plays
//! their own independent game on a toroidal board; all games advance
//! together on a fixed global tick, and the best score per player is kept
//! for the lifetime of the process.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server runs the only copy of every game. Clients send commands
//! (start, exit, turn) and receive a view of their board after each tick.
//!
//! ### Session Lifecycle
//! Sessions are created on a player's first interaction, reset in place for
//! each new game, stopped on explicit exit and dropped on disconnect.
//!
//! ### Leaderboard
//! Game-over scores are folded into a per-player best, ranked on request.
//!
//! ## Architecture Design
//!
//! ### Single-Writer Event Loop
//! The network server's main loop owns the `SessionRegistry` and is the only
//! code that mutates it. Player packets and scheduled ticks are handled one
//! at a time inside the same `select!` loop, so no locking is needed around
//! game state.
//!
//! ### UDP-Based Communication
//! Commands and views travel as bincode-encoded `shared::Packet`s over UDP.
//! A lost view is simply superseded by the next tick's view.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! One player's game: body, occupancy index, food, score, heading, and the
//! single-step tick engine.
//!
//! ### Food Module (`food`)
//! Free-cell selection with bounded random attempts and a full-scan fallback.
//!
//! ### Registry Module (`registry`)
//! Owns all sessions and the leaderboard; drives the per-tick sweep.
//!
//! ### Leaderboard Module (`leaderboard`)
//! Best score per player and the ranked top-N view.
//!
//! ### Client Manager Module (`client_manager`)
//! Connection tracking, display names and timeout cleanup; tells the
//! registry which players are reachable.
//!
//! ### Network Module (`network`)
//! UDP socket tasks, packet dispatch and the fixed-interval tick loop.
//!
//! ## Tick Rate
//! The reference pacing is one tick every 200ms. Clients that want to
//! match the original feel must not change it.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 18x12 board, 200ms ticks, 32 clients
//!     let mut server = Server::new("127.0.0.1:8080", ServerConfig::default()).await?;
//!
//!     // Runs until Ctrl+C:
//!     // - Receives commands and applies them to the player's session
//!     // - Advances every running session once per tick
//!     // - Sends each player a view of their board
//!     // - Drops sessions of clients that time out
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod food;
pub mod leaderboard;
pub mod network;
pub mod registry;
pub mod session;
