//! Buffer lanes
//!
//! Each lane is a capacity-bounded FIFO of cars bound to one oven. A lane's
//! status is never stored: it is derived on demand by [`derive_status`] from
//! occupancy and outage state, so no mutation can leave it stale.

use std::collections::VecDeque;
use std::time::Duration;

use super::config::LaneSpec;
use super::types::{Color, LaneId, LaneStatus, Outage, OvenId};

/// The single source of truth for a lane's status
pub fn derive_status(len: usize, capacity: usize, outage: Option<Outage>) -> LaneStatus {
    if outage.is_some() {
        LaneStatus::Unavailable
    } else if len >= capacity {
        LaneStatus::Full
    } else {
        LaneStatus::Active
    }
}

/// A buffer lane feeding the main conveyor
#[derive(Debug, Clone)]
pub struct Lane {
    pub id: LaneId,
    pub oven: OvenId,
    pub capacity: usize,
    /// Front is the oldest car and the next to be released
    cars: VecDeque<Color>,
    outage: Option<Outage>,
    /// When the last breakdown hit this lane
    pub last_breakdown: Option<Duration>,
    /// Breakdowns so far; a recovery only heals the one it was scheduled for
    breakdowns: u64,
}

impl Lane {
    pub fn new(id: LaneId, oven: OvenId, capacity: usize) -> Self {
        Self {
            id,
            oven,
            capacity,
            cars: VecDeque::with_capacity(capacity),
            outage: None,
            last_breakdown: None,
            breakdowns: 0,
        }
    }

    pub fn status(&self) -> LaneStatus {
        derive_status(self.cars.len(), self.capacity, self.outage)
    }

    pub fn is_available(&self) -> bool {
        self.outage.is_none()
    }

    pub fn outage(&self) -> Option<Outage> {
        self.outage
    }

    pub fn len(&self) -> usize {
        self.cars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }

    pub fn has_space(&self) -> bool {
        self.cars.len() < self.capacity
    }

    /// Car that will be released next
    pub fn front(&self) -> Option<Color> {
        self.cars.front().copied()
    }

    /// Most recently pushed car
    pub fn tail(&self) -> Option<Color> {
        self.cars.back().copied()
    }

    pub fn cars(&self) -> impl Iterator<Item = Color> + '_ {
        self.cars.iter().copied()
    }

    /// Number of cars of `color` anywhere in the lane
    pub fn count_of(&self, color: Color) -> usize {
        self.cars.iter().filter(|&&car| car == color).count()
    }

    /// Append a car; refused when the lane is already at capacity
    pub fn push(&mut self, car: Color) -> bool {
        if !self.has_space() {
            return false;
        }
        self.cars.push_back(car);
        true
    }

    pub fn pop_front(&mut self) -> Option<Color> {
        self.cars.pop_front()
    }

    /// Take the lane out of service because of a breakdown at `now`
    ///
    /// Returns the breakdown's sequence number on this lane, starting at 1.
    pub fn break_down(&mut self, now: Duration) -> u64 {
        self.outage = Some(Outage::Breakdown);
        self.last_breakdown = Some(now);
        self.breakdowns += 1;
        self.breakdowns
    }

    pub fn breakdowns(&self) -> u64 {
        self.breakdowns
    }

    /// Heal breakdown number `breakdown`
    ///
    /// Returns false when the lane is not broken down, or when it has broken
    /// down again since, which leaves the newer outage in place.
    pub fn recover(&mut self, breakdown: u64) -> bool {
        if self.outage == Some(Outage::Breakdown) && self.breakdowns == breakdown {
            self.outage = None;
            true
        } else {
            false
        }
    }

    /// Take the lane out of service from the control surface
    pub fn mark_unavailable(&mut self) {
        self.outage = Some(Outage::Manual);
    }

    /// Return the lane to service, whatever took it out
    pub fn mark_available(&mut self) {
        self.outage = None;
    }
}

/// The fixed set of buffer lanes
#[derive(Debug, Clone, Default)]
pub struct LanePool {
    lanes: Vec<Lane>,
}

impl LanePool {
    /// Build empty lanes from a lane table
    pub fn from_specs(specs: &[LaneSpec]) -> Self {
        let lanes = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| Lane::new(LaneId(index), spec.oven, spec.capacity))
            .collect();
        Self { lanes }
    }

    pub fn get(&self, id: LaneId) -> Option<&Lane> {
        self.lanes.get(id.0)
    }

    pub fn get_mut(&mut self, id: LaneId) -> Option<&mut Lane> {
        self.lanes.get_mut(id.0)
    }

    /// Lanes in lane-id order
    pub fn iter(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.iter()
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Lanes bound to `oven` that are not out of service
    pub fn eligible_for(&self, oven: OvenId) -> impl Iterator<Item = &Lane> {
        self.lanes
            .iter()
            .filter(move |lane| lane.oven == oven && lane.is_available())
    }

    pub fn with_status(&self, status: LaneStatus) -> impl Iterator<Item = &Lane> {
        self.lanes.iter().filter(move |lane| lane.status() == status)
    }

    /// Cars queued across all lanes
    pub fn queued_cars(&self) -> usize {
        self.lanes.iter().map(Lane::len).sum()
    }
}
