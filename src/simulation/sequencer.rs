//! Release sequencing onto the main conveyor
//!
//! The main conveyor is a single slot and the only exit from the line. Like an
//! intersection lock, it holds one car for a full tick before letting it go,
//! and only then picks the next lane to drain.

use std::collections::VecDeque;

use super::lane::LanePool;
use super::types::{Color, LaneId, LaneStatus};

/// The single-slot main conveyor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MainConveyor {
    /// Car in transit and the lane it came from; both or neither are present
    occupant: Option<(LaneId, Color)>,
}

impl MainConveyor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feeding_from(&self) -> Option<LaneId> {
        self.occupant.map(|(lane, _)| lane)
    }

    pub fn current_car(&self) -> Option<Color> {
        self.occupant.map(|(_, car)| car)
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    fn load(&mut self, lane: LaneId, car: Color) {
        self.occupant = Some((lane, car));
    }

    fn retire(&mut self) -> Option<Color> {
        self.occupant.take().map(|(_, car)| car)
    }
}

/// Bounded history of retired colors, oldest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentSequence {
    colors: VecDeque<Color>,
    capacity: usize,
}

impl RecentSequence {
    pub fn new(capacity: usize) -> Self {
        Self {
            colors: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, color: Color) {
        self.colors.push_back(color);
        while self.colors.len() > self.capacity {
            self.colors.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Color> {
        self.colors.iter()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Color> {
        self.colors.iter().copied().collect()
    }
}

/// What the conveyor did this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConveyorStep {
    /// A car left the line
    Retired(Color),
    /// A car moved from a lane onto the conveyor
    Loaded { lane: LaneId, car: Color },
    /// Nothing to release
    Idle,
}

/// A color group headed by `color` and the total weight of its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunCandidate {
    pub color: Color,
    /// Cars of `color` anywhere in the lanes headed by it
    pub weight: usize,
    /// First lane (by id) headed by `color`
    pub lane: LaneId,
}

/// Group releasable lanes by front color, in order of first appearance
pub fn run_candidates(lanes: &LanePool) -> Vec<RunCandidate> {
    let mut groups: Vec<RunCandidate> = Vec::new();

    for lane in lanes.iter() {
        if lane.status() == LaneStatus::Unavailable {
            continue;
        }
        let Some(front) = lane.front() else {
            continue;
        };
        let weight = lane.count_of(front);
        match groups.iter_mut().find(|group| group.color == front) {
            Some(group) => group.weight += weight,
            None => groups.push(RunCandidate {
                color: front,
                weight,
                lane: lane.id,
            }),
        }
    }

    groups
}

/// The lane to drain next: first lane of the heaviest color group
///
/// Ties between groups go to the one encountered first in lane-id order.
pub fn select_lane(lanes: &LanePool) -> Option<LaneId> {
    let mut best: Option<RunCandidate> = None;
    for candidate in run_candidates(lanes) {
        match best {
            Some(current) if candidate.weight <= current.weight => {}
            _ => best = Some(candidate),
        }
    }
    best.map(|candidate| candidate.lane)
}

/// Advance the conveyor by one tick
///
/// An occupied slot retires its car; an empty slot loads the front car of the
/// selected lane. A car therefore never loads and retires in the same tick.
pub fn advance(conveyor: &mut MainConveyor, lanes: &mut LanePool) -> ConveyorStep {
    if let Some(car) = conveyor.retire() {
        return ConveyorStep::Retired(car);
    }

    let Some(lane_id) = select_lane(lanes) else {
        return ConveyorStep::Idle;
    };
    match lanes.get_mut(lane_id).and_then(|lane| lane.pop_front()) {
        Some(car) => {
            conveyor.load(lane_id, car);
            ConveyorStep::Loaded { lane: lane_id, car }
        }
        None => ConveyorStep::Idle,
    }
}
