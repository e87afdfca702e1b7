use serde::{Deserialize, Serialize};
use std::fmt;

pub const BOARD_WIDTH: i32 = 18;
pub const BOARD_HEIGHT: i32 = 12;
pub const FOOD_SCORE: u32 = 10;
pub const START_LENGTH: usize = 4;
pub const FOOD_SPAWN_ATTEMPTS: usize = 200;
pub const TICK_MILLIS: u64 = 200;
pub const LEADERBOARD_SIZE: usize = 10;
pub const PROTOCOL_VERSION: u32 = 1;

pub type PlayerId = u32;

/// Wraps `v` into `[0, extent)` for any integer, including negatives.
pub fn wrap(v: i32, extent: i32) -> i32 {
    v.rem_euclid(extent)
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn wrapped(self, width: i32, height: i32) -> Self {
        Self {
            x: wrap(self.x, width),
            y: wrap(self.y, height),
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Unit displacement; `Up` increases `y`.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Direction::Up => "Up",
            Direction::Down => "Down",
            Direction::Left => "Left",
            Direction::Right => "Right",
        };
        write!(f, "{}", name)
    }
}

/// Moves one cell along `direction`. The result is not wrapped.
pub fn step(coord: Coord, direction: Direction) -> Coord {
    let (dx, dy) = direction.delta();
    Coord::new(coord.x + dx, coord.y + dy)
}

pub fn is_opposite(a: Direction, b: Direction) -> bool {
    matches!(
        (a, b),
        (Direction::Up, Direction::Down)
            | (Direction::Down, Direction::Up)
            | (Direction::Left, Direction::Right)
            | (Direction::Right, Direction::Left)
    )
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Head,
    Body,
    Food,
}

/// Read-only snapshot of one player's game, produced after every tick
/// and on demand for rendering.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionView {
    pub player_id: PlayerId,
    pub score: u32,
    pub best: u32,
    pub running: bool,
    pub game_over: bool,
    pub width: i32,
    pub height: i32,
    pub food: Coord,
    /// Head first, tail last.
    pub body: Vec<Coord>,
}

impl SessionView {
    pub fn head(&self) -> Option<Coord> {
        self.body.first().copied()
    }

    fn contains(&self, coord: Coord) -> bool {
        (0..self.width).contains(&coord.x) && (0..self.height).contains(&coord.y)
    }

    /// Grid size in cells, or `None` if it does not fit in memory
    fn area(&self) -> Option<usize> {
        let width = usize::try_from(self.width.max(0)).ok()?;
        let height = usize::try_from(self.height.max(0)).ok()?;
        width.checked_mul(height)
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        if !self.contains(coord) {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let x = usize::try_from(coord.x).ok()?;
        let y = usize::try_from(coord.y).ok()?;
        y.checked_mul(width)?.checked_add(x)
    }

    /// Row-major grid of `width * height` cells, row `y = 0` first.
    ///
    /// Views whose dimensions overflow `usize` produce an empty grid.
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = vec![Cell::Empty; self.area().unwrap_or(0)];

        if let Some(cell) = self.index(self.food).and_then(|i| cells.get_mut(i)) {
            *cell = Cell::Food;
        }
        for (n, coord) in self.body.iter().enumerate() {
            if let Some(cell) = self.index(*coord).and_then(|i| cells.get_mut(i)) {
                *cell = if n == 0 { Cell::Head } else { Cell::Body };
            }
        }

        cells
    }

    /// Contents of a single cell, without building the whole grid
    pub fn cell_at(&self, coord: Coord) -> Cell {
        if !self.contains(coord) {
            return Cell::Empty;
        }
        match self.body.iter().rposition(|segment| *segment == coord) {
            Some(0) => Cell::Head,
            Some(_) => Cell::Body,
            None if self.food == coord => Cell::Food,
            None => Cell::Empty,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub display_name: String,
    pub player_id: PlayerId,
    pub score: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Connect {
        client_version: u32,
        name: String,
    },
    Start,
    Exit,
    Turn {
        direction: Direction,
    },
    RequestLeaderboard,
    Heartbeat,
    Disconnect,

    Connected {
        client_id: PlayerId,
    },
    SessionUpdate {
        view: SessionView,
    },
    Leaderboard {
        entries: Vec<LeaderboardEntry>,
    },
    Disconnected {
        reason: String,
    },
}
