//! Per-player game state and the single-step tick engine
//!
//! A `Session` owns the snake body as an ordered deque (head first) plus an
//! occupancy set holding exactly the same cells. Both containers are private
//! and only change inside `reset` and `advance`, so the two never diverge:
//! `body.len() == occupancy.len()` whenever control is outside those calls.
//!
//! The board is a torus. There are no walls; the only ways a game ends are
//! the head running into an occupied cell and the board filling up so no
//! food can be placed.

use crate::config::GameConfig;
use crate::food::FoodSpawner;
use log::debug;
use shared::{is_opposite, step, Coord, Direction, PlayerId, SessionView, START_LENGTH};
use std::collections::{HashSet, VecDeque};

/// Result of advancing one session by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session was not running; nothing changed
    Idle,
    /// Snake moved without growing
    Moved,
    /// Snake ate food and grew by one cell
    Ate,
    /// Head would have entered an occupied cell; game over
    Collided,
    /// Snake ate the last food that fit on the board; game over
    BoardFull,
}

impl TickOutcome {
    pub fn is_terminal(self) -> bool {
        matches!(self, TickOutcome::Collided | TickOutcome::BoardFull)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    owner_id: PlayerId,
    running: bool,
    game_over: bool,
    score: u32,
    direction: Direction,
    pending_direction: Direction,
    body: VecDeque<Coord>,
    occupancy: HashSet<Coord>,
    food: Coord,
}

impl Session {
    /// Creates a session for `owner_id` in its starting configuration
    pub fn new(owner_id: PlayerId, config: &GameConfig, spawner: &mut FoodSpawner) -> Self {
        let mut session = Self {
            owner_id,
            running: false,
            game_over: false,
            score: 0,
            direction: Direction::Right,
            pending_direction: Direction::Right,
            body: VecDeque::with_capacity(START_LENGTH),
            occupancy: HashSet::with_capacity(START_LENGTH),
            food: Coord::new(0, 0),
        };
        session.reset(config, spawner);
        session
    }

    /// Restarts the game in place
    ///
    /// The snake is laid out horizontally through the board centre, head on
    /// the right, heading right. If no food can be placed the session ends
    /// immediately with `game_over` set.
    pub fn reset(&mut self, config: &GameConfig, spawner: &mut FoodSpawner) {
        self.score = 0;
        self.game_over = false;
        self.direction = Direction::Right;
        self.pending_direction = Direction::Right;
        self.body.clear();
        self.occupancy.clear();

        let start = Coord::new(config.width / 2, config.height / 2);
        for i in 0..START_LENGTH as i32 {
            let segment = Coord::new(start.x - i, start.y).wrapped(config.width, config.height);
            self.body.push_back(segment);
            self.occupancy.insert(segment);
        }

        self.running = true;
        self.place_food(config, spawner);
    }

    /// Queues a heading for the next tick
    ///
    /// Requests that reverse the committed heading are dropped. Returns
    /// whether the request was accepted.
    pub fn request_direction(&mut self, requested: Direction) -> bool {
        if is_opposite(self.direction, requested) {
            return false;
        }
        self.pending_direction = requested;
        true
    }

    /// Ends play without marking the game as lost
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advances the game by exactly one step
    pub fn advance(&mut self, config: &GameConfig, spawner: &mut FoodSpawner) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }
        let Some(head) = self.head() else {
            return TickOutcome::Idle;
        };

        self.direction = self.pending_direction;
        let next = step(head, self.direction).wrapped(config.width, config.height);

        // The tail has not moved yet, so chasing it is fatal too.
        if self.occupancy.contains(&next) {
            debug!("Player {} collided at {}", self.owner_id, next);
            self.finish();
            return TickOutcome::Collided;
        }

        self.body.push_front(next);
        self.occupancy.insert(next);

        if next == self.food {
            self.score += config.food_score;
            if !self.place_food(config, spawner) {
                return TickOutcome::BoardFull;
            }
            return TickOutcome::Ate;
        }

        if let Some(tail) = self.body.pop_back() {
            self.occupancy.remove(&tail);
        }
        TickOutcome::Moved
    }

    /// Returns false and ends the game when the board has no free cell
    fn place_food(&mut self, config: &GameConfig, spawner: &mut FoodSpawner) -> bool {
        match spawner.spawn(&self.occupancy, config.width, config.height) {
            Some(food) => {
                self.food = food;
                true
            }
            None => {
                debug!("Player {} filled the board", self.owner_id);
                self.finish();
                false
            }
        }
    }

    fn finish(&mut self) {
        self.running = false;
        self.game_over = true;
    }

    pub fn owner_id(&self) -> PlayerId {
        self.owner_id
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn pending_direction(&self) -> Direction {
        self.pending_direction
    }

    pub fn head(&self) -> Option<Coord> {
        self.body.front().copied()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn body(&self) -> impl Iterator<Item = &Coord> {
        self.body.iter()
    }

    pub fn occupies(&self, coord: Coord) -> bool {
        self.occupancy.contains(&coord)
    }

    pub fn food(&self) -> Coord {
        self.food
    }

    /// Snapshot for rendering; `best` comes from the leaderboard
    pub fn view(&self, config: &GameConfig, best: u32) -> SessionView {
        SessionView {
            player_id: self.owner_id,
            score: self.score,
            best,
            running: self.running,
            game_over: self.game_over,
            width: config.width,
            height: config.height,
            food: self.food,
            body: self.body.iter().copied().collect(),
        }
    }
}
