//! Best-ever score per player for the lifetime of the process

use shared::{LeaderboardEntry, PlayerId};
use std::collections::HashMap;

/// Display names longer than this are cut short
pub const MAX_NAME_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScoreEntry {
    player_id: PlayerId,
    best: u32,
}

/// Per-player best scores, kept in first-recorded order
///
/// Entries are never removed and a stored best never decreases. Ranking
/// uses a stable sort, so equal scores keep the order in which the players
/// first finished a game.
#[derive(Debug, Default)]
pub struct Leaderboard {
    entries: Vec<ScoreEntry>,
    index: HashMap<PlayerId, usize>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `score` if it beats the player's previous best
    ///
    /// Returns true when the stored value changed.
    pub fn record_score(&mut self, player_id: PlayerId, score: u32) -> bool {
        match self.index.get(&player_id) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                if score > entry.best {
                    entry.best = score;
                    true
                } else {
                    false
                }
            }
            None => {
                self.index.insert(player_id, self.entries.len());
                self.entries.push(ScoreEntry {
                    player_id,
                    best: score,
                });
                true
            }
        }
    }

    pub fn best(&self, player_id: PlayerId) -> Option<u32> {
        self.index.get(&player_id).map(|&i| self.entries[i].best)
    }

    /// Up to `n` `(player, best)` pairs, highest first
    pub fn top_n(&self, n: usize) -> Vec<(PlayerId, u32)> {
        let mut ranked: Vec<ScoreEntry> = self.entries.clone();
        ranked.sort_by(|a, b| b.best.cmp(&a.best));
        ranked
            .into_iter()
            .take(n)
            .map(|entry| (entry.player_id, entry.best))
            .collect()
    }

    /// Ranks the top `n` players, labelling each with `resolve_name`
    ///
    /// Players whose name cannot be resolved are labelled with their id.
    pub fn ranked<F>(&self, n: usize, resolve_name: F) -> Vec<LeaderboardEntry>
    where
        F: Fn(PlayerId) -> Option<String>,
    {
        self.top_n(n)
            .into_iter()
            .map(|(player_id, score)| {
                let name = resolve_name(player_id).unwrap_or_else(|| player_id.to_string());
                LeaderboardEntry {
                    display_name: display_label(&name),
                    player_id,
                    score,
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

fn display_label(name: &str) -> String {
    if name.is_empty() {
        return "unknown".to_string();
    }
    name.chars().take(MAX_NAME_LEN).collect()
}
