//! Food placement on a partially occupied board
//!
//! Placement first tries a bounded number of uniformly random cells, then
//! falls back to a row-major scan so a free cell is always found when one
//! exists. Worst-case cost is bounded by the board area.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{Coord, FOOD_SPAWN_ATTEMPTS};
use std::collections::HashSet;

pub struct FoodSpawner {
    rng: StdRng,
    attempts: usize,
}

impl FoodSpawner {
    /// Creates a spawner seeded from OS entropy
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Creates a reproducible spawner for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            attempts: FOOD_SPAWN_ATTEMPTS,
        }
    }

    /// Picks a cell outside `occupied`, or `None` when the board is full
    pub fn spawn(&mut self, occupied: &HashSet<Coord>, width: i32, height: i32) -> Option<Coord> {
        for _ in 0..self.attempts {
            let candidate = Coord::new(self.rng.gen_range(0..width), self.rng.gen_range(0..height));
            if !occupied.contains(&candidate) {
                return Some(candidate);
            }
        }

        (0..height)
            .flat_map(|y| (0..width).map(move |x| Coord::new(x, y)))
            .find(|cell| !occupied.contains(cell))
    }
}

impl Default for FoodSpawner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(width: i32, height: i32) -> HashSet<Coord> {
        (0..height)
            .flat_map(|y| (0..width).map(move |x| Coord::new(x, y)))
            .collect()
    }

    #[test]
    fn test_spawn_on_empty_board_is_in_bounds() {
        let mut spawner = FoodSpawner::seeded(1);
        let occupied = HashSet::new();

        for _ in 0..100 {
            let food = spawner.spawn(&occupied, 18, 12).unwrap();
            assert!((0..18).contains(&food.x));
            assert!((0..12).contains(&food.y));
        }
    }

    #[test]
    fn test_spawn_avoids_occupied_cells() {
        let mut spawner = FoodSpawner::seeded(2);
        let mut occupied = fill(6, 4);
        occupied.remove(&Coord::new(2, 1));
        occupied.remove(&Coord::new(5, 3));

        for _ in 0..50 {
            let food = spawner.spawn(&occupied, 6, 4).unwrap();
            assert!(!occupied.contains(&food));
        }
    }

    #[test]
    fn test_fallback_scan_finds_last_free_cell() {
        let mut spawner = FoodSpawner::seeded(3);
        spawner.attempts = 0;

        let mut occupied = fill(18, 12);
        occupied.remove(&Coord::new(17, 11));
        assert_eq!(spawner.spawn(&occupied, 18, 12), Some(Coord::new(17, 11)));
    }

    #[test]
    fn test_fallback_scan_is_row_major() {
        let mut spawner = FoodSpawner::seeded(4);
        spawner.attempts = 0;

        let mut occupied = fill(5, 5);
        occupied.remove(&Coord::new(4, 1));
        occupied.remove(&Coord::new(0, 2));
        assert_eq!(spawner.spawn(&occupied, 5, 5), Some(Coord::new(4, 1)));
    }

    #[test]
    fn test_full_board_returns_none() {
        let mut spawner = FoodSpawner::seeded(5);
        let occupied = fill(4, 3);
        assert_eq!(spawner.spawn(&occupied, 4, 3), None);
    }

    #[test]
    fn test_seeded_spawners_agree() {
        let occupied = HashSet::new();
        let mut a = FoodSpawner::seeded(42);
        let mut b = FoodSpawner::seeded(42);

        for _ in 0..10 {
            assert_eq!(a.spawn(&occupied, 18, 12), b.spawn(&occupied, 18, 12));
        }
    }
}
