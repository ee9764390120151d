//! Car population and the unassigned backlog
//!
//! Cars are generated once per reset from the color distribution table and
//! wait here, in order, until the allocator pulls them into a lane.

use rand::Rng;
use std::collections::VecDeque;

use super::types::Color;

/// Expand a `(color, count)` table in table order and shuffle the result
///
/// The shuffle is a Fisher-Yates pass from the last index down to 1, each
/// step swapping with a uniformly chosen index in `[0, i]`.
pub fn generate<R: Rng + ?Sized>(distribution: &[(Color, usize)], rng: &mut R) -> Vec<Color> {
    let mut cars: Vec<Color> = distribution
        .iter()
        .flat_map(|&(color, count)| std::iter::repeat(color).take(count))
        .collect();

    for i in (1..cars.len()).rev() {
        let j = rng.random_range(0..=i);
        cars.swap(i, j);
    }

    cars
}

/// FIFO backlog of cars that have not been placed into a lane yet
#[derive(Debug, Clone, Default)]
pub struct CarSource {
    backlog: VecDeque<Color>,
    /// Number of cars this source started with
    generated: usize,
}

impl CarSource {
    /// Build a freshly shuffled backlog from a distribution table
    pub fn generate<R: Rng + ?Sized>(distribution: &[(Color, usize)], rng: &mut R) -> Self {
        Self::from_cars(generate(distribution, rng))
    }

    /// Build a backlog holding exactly these cars, front first
    pub fn from_cars(cars: impl IntoIterator<Item = Color>) -> Self {
        let backlog: VecDeque<Color> = cars.into_iter().collect();
        let generated = backlog.len();
        Self { backlog, generated }
    }

    /// Remove up to `n` cars from the front of the backlog
    pub fn dequeue(&mut self, n: usize) -> Vec<Color> {
        let take = n.min(self.backlog.len());
        self.backlog.drain(..take).collect()
    }

    /// Put a car back at the front so it is retried first on the next tick
    pub fn requeue_front(&mut self, car: Color) {
        self.backlog.push_front(car);
    }

    pub fn len(&self) -> usize {
        self.backlog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backlog.is_empty()
    }

    pub fn generated(&self) -> usize {
        self.generated
    }

    pub fn iter(&self) -> impl Iterator<Item = &Color> {
        self.backlog.iter()
    }
}
