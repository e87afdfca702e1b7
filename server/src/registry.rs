//! Owner of every live session and of the leaderboard
//!
//! The registry is an explicitly owned object: whoever drives the tick
//! (the network server's main loop) holds it and feeds it both scheduled
//! ticks and player commands, so only one mutation is ever in flight.
//! Commands that name an unknown player are silently ignored.

use crate::config::GameConfig;
use crate::food::FoodSpawner;
use crate::leaderboard::Leaderboard;
use crate::session::{Session, TickOutcome};
use log::{debug, info};
use shared::{Direction, LeaderboardEntry, PlayerId, SessionView, LEADERBOARD_SIZE};
use std::collections::HashMap;

/// Source of player reachability and display names
///
/// Implemented by whatever tracks connections; the registry never decides
/// on its own whether a player is still around.
pub trait PlayerDirectory {
    fn is_reachable(&self, player_id: PlayerId) -> bool;
    fn display_name(&self, player_id: PlayerId) -> Option<String>;
}

pub struct SessionRegistry {
    config: GameConfig,
    sessions: HashMap<PlayerId, Session>,
    leaderboard: Leaderboard,
    spawner: FoodSpawner,
    tick: u64,
}

impl SessionRegistry {
    pub fn new(config: GameConfig) -> Self {
        Self::with_spawner(config, FoodSpawner::new())
    }

    pub fn with_spawner(config: GameConfig, spawner: FoodSpawner) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
            leaderboard: Leaderboard::new(),
            spawner,
            tick: 0,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Returns the player's session, starting a new game if none exists
    pub fn ensure(&mut self, player_id: PlayerId) -> &Session {
        if !self.sessions.contains_key(&player_id) {
            let session = Session::new(player_id, &self.config, &mut self.spawner);
            info!("Created session for player {}", player_id);
            if session.is_game_over() {
                self.leaderboard.record_score(player_id, session.score());
            }
            self.sessions.insert(player_id, session);
        }
        &self.sessions[&player_id]
    }

    /// Starts a fresh game for the player, creating the session if needed
    pub fn reset(&mut self, player_id: PlayerId) {
        match self.sessions.get_mut(&player_id) {
            Some(session) => {
                session.reset(&self.config, &mut self.spawner);
                info!("Player {} started a new game", player_id);
                if session.is_game_over() {
                    self.leaderboard.record_score(player_id, session.score());
                }
            }
            None => {
                self.ensure(player_id);
            }
        }
    }

    /// Pauses the player's game without ending it
    pub fn stop(&mut self, player_id: PlayerId) {
        if let Some(session) = self.sessions.get_mut(&player_id) {
            session.stop();
            info!("Player {} left their game", player_id);
        }
    }

    /// Drops the player's session; their leaderboard entry is kept
    pub fn remove(&mut self, player_id: PlayerId) -> bool {
        let removed = self.sessions.remove(&player_id).is_some();
        if removed {
            info!("Removed session for player {}", player_id);
        }
        removed
    }

    pub fn request_direction(&mut self, player_id: PlayerId, direction: Direction) {
        if let Some(session) = self.sessions.get_mut(&player_id) {
            if !session.request_direction(direction) {
                debug!("Ignored reversal to {} from player {}", direction, player_id);
            }
        }
    }

    /// Advances every running session whose player is reachable
    ///
    /// Returns a view of each session that advanced, for delivery to its
    /// player. Sessions of unreachable players are skipped but kept.
    pub fn tick_all<D: PlayerDirectory + ?Sized>(&mut self, players: &D) -> Vec<SessionView> {
        self.tick += 1;
        if self.sessions.is_empty() {
            return Vec::new();
        }

        let mut player_ids: Vec<PlayerId> = self.sessions.keys().copied().collect();
        player_ids.sort_unstable();

        let mut updates = Vec::new();
        for player_id in player_ids {
            let Some(session) = self.sessions.get_mut(&player_id) else {
                continue;
            };
            if !session.is_running() || !players.is_reachable(player_id) {
                continue;
            }

            let outcome = session.advance(&self.config, &mut self.spawner);
            if outcome.is_terminal() {
                let score = session.score();
                let improved = self.leaderboard.record_score(player_id, score);
                info!(
                    "Game over for player {} ({:?}) with score {}{}",
                    player_id,
                    outcome,
                    score,
                    if improved { ", new best" } else { "" }
                );
            } else if outcome == TickOutcome::Ate {
                debug!("Player {} ate, score {}", player_id, session.score());
            }

            let best = self.leaderboard.best(player_id).unwrap_or(0);
            updates.push(session.view(&self.config, best));
        }

        updates
    }

    pub fn session(&self, player_id: PlayerId) -> Option<&Session> {
        self.sessions.get(&player_id)
    }

    pub fn view(&self, player_id: PlayerId) -> Option<SessionView> {
        let best = self.best_score(player_id);
        self.sessions
            .get(&player_id)
            .map(|session| session.view(&self.config, best))
    }

    pub fn best_score(&self, player_id: PlayerId) -> u32 {
        self.leaderboard.best(player_id).unwrap_or(0)
    }

    /// Top scores with names resolved through `players`
    pub fn leaderboard<D: PlayerDirectory + ?Sized>(&self, players: &D) -> Vec<LeaderboardEntry> {
        self.leaderboard
            .ranked(LEADERBOARD_SIZE, |player_id| players.display_name(player_id))
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops all sessions and scores
    pub fn clear(&mut self) {
        self.sessions.clear();
        self.leaderboard.clear();
        self.tick = 0;
    }
}
