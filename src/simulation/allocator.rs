//! Lane allocation
//!
//! Places cars pulled from the backlog into buffer lanes. Under the default
//! [`AllocationStrategy::Continuation`] a lane whose last car has the same
//! color always wins over load balancing; only when no such lane exists does
//! the emptiest lane take the car. The other strategies exist to compare
//! against it.

use anyhow::bail;
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::car_source::CarSource;
use super::lane::{Lane, LanePool};
use super::oven::OvenRegistry;
use super::palette::{self, Band};
use super::types::{Color, LaneId, OvenId};

/// How a lane is picked among one oven's eligible lanes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStrategy {
    /// Same-color tail first, else the least-filled lane
    #[default]
    Continuation,
    /// First lane with room, ignoring color
    Fifo,
    /// Same-color tail first, else the first lane with room
    Greedy,
    /// Same-color tail first; rare colors go to the emptiest lane; anything
    /// else goes to the lane scoring best on band match and free space
    Hybrid,
}

impl AllocationStrategy {
    pub const ALL: [AllocationStrategy; 4] = [
        AllocationStrategy::Continuation,
        AllocationStrategy::Fifo,
        AllocationStrategy::Greedy,
        AllocationStrategy::Hybrid,
    ];

    /// Pick a lane among `oven`'s eligible lanes for a car of `color`
    pub fn select_lane(self, lanes: &LanePool, oven: OvenId, color: Color) -> Option<LaneId> {
        match self {
            AllocationStrategy::Continuation => select_lane(lanes, oven, color),
            AllocationStrategy::Fifo => first_with_space(lanes, oven),
            AllocationStrategy::Greedy => {
                continuation(lanes, oven, color).or_else(|| first_with_space(lanes, oven))
            }
            AllocationStrategy::Hybrid => hybrid(lanes, oven, color),
        }
    }
}

impl fmt::Display for AllocationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AllocationStrategy::Continuation => "continuation",
            AllocationStrategy::Fifo => "fifo",
            AllocationStrategy::Greedy => "greedy",
            AllocationStrategy::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

impl FromStr for AllocationStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuation" => Ok(AllocationStrategy::Continuation),
            "fifo" => Ok(AllocationStrategy::Fifo),
            "greedy" => Ok(AllocationStrategy::Greedy),
            "hybrid" => Ok(AllocationStrategy::Hybrid),
            other => bail!(
                "unknown allocation strategy '{}' (expected continuation, fifo, greedy or hybrid)",
                other
            ),
        }
    }
}

/// What happened to a single car
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Car was pushed onto this lane
    Placed(LaneId),
    /// Both ovens are stopped; the car waits without raising an alert
    NoActiveOven,
    /// Every eligible lane is full or out of service
    Saturated,
}

/// Outcome of one allocation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationReport {
    pub placed: Vec<(Color, LaneId)>,
    /// Cars placed on a lane of the other oven than the one they drew
    pub rerouted: usize,
    /// Cars put back at the front of the backlog, in backlog order
    pub requeued: Vec<Color>,
    /// Cars that found no lane at all
    pub saturated: usize,
}

fn with_space(lanes: &LanePool, oven: OvenId) -> impl Iterator<Item = &Lane> {
    lanes.eligible_for(oven).filter(|lane| lane.has_space())
}

/// First lane (in lane-id order) whose tail car is `color` and that has room
fn continuation(lanes: &LanePool, oven: OvenId, color: Color) -> Option<LaneId> {
    with_space(lanes, oven)
        .find(|lane| lane.tail() == Some(color))
        .map(|lane| lane.id)
}

fn first_with_space(lanes: &LanePool, oven: OvenId) -> Option<LaneId> {
    with_space(lanes, oven).next().map(|lane| lane.id)
}

/// Continuation first, then the least-filled lane with room
///
/// Ties between equally filled lanes go to the lowest lane id.
pub fn select_lane(lanes: &LanePool, oven: OvenId, color: Color) -> Option<LaneId> {
    if let Some(lane) = continuation(lanes, oven, color) {
        return Some(lane);
    }

    // min_by_key keeps the first of equal minima
    with_space(lanes, oven)
        .min_by_key(|lane| lane.len())
        .map(|lane| lane.id)
}

/// Score of a lane for the hybrid strategy: band match on the tail plus free slots
fn hybrid_score(lane: &Lane, band: Band) -> usize {
    let band_match = match lane.tail() {
        Some(tail) if palette::band(tail) == band => 20,
        _ => 0,
    };
    band_match + (lane.capacity - lane.len())
}

fn hybrid(lanes: &LanePool, oven: OvenId, color: Color) -> Option<LaneId> {
    if let Some(lane) = continuation(lanes, oven, color) {
        return Some(lane);
    }

    let band = palette::band(color);
    let score = |lane: &Lane| match band {
        Band::Rare => lane.capacity - lane.len(),
        _ => hybrid_score(lane, band),
    };

    // Strictly better replaces, so ties keep the lowest lane id
    let mut best: Option<(&Lane, usize)> = None;
    for lane in with_space(lanes, oven) {
        let candidate = score(lane);
        match best {
            Some((_, top)) if candidate <= top => {}
            _ => best = Some((lane, candidate)),
        }
    }
    best.map(|(lane, _)| lane.id)
}

/// Decide where a car of `color` goes when `primary` is the preferred oven
///
/// Does not mutate anything; [`place_car`] applies the decision.
pub fn choose_placement(
    lanes: &LanePool,
    ovens: &OvenRegistry,
    strategy: AllocationStrategy,
    color: Color,
    primary: OvenId,
) -> Placement {
    let alternate = primary.other();

    // A stopped primary oven hands the car to the alternate oven exclusively
    let candidates: Vec<OvenId> = match (ovens.is_active(primary), ovens.is_active(alternate)) {
        (true, true) => vec![primary, alternate],
        (true, false) => vec![primary],
        (false, true) => vec![alternate],
        (false, false) => return Placement::NoActiveOven,
    };

    candidates
        .iter()
        .find_map(|&oven| strategy.select_lane(lanes, oven, color))
        .map_or(Placement::Saturated, Placement::Placed)
}

/// Choose and apply a placement for one car
pub fn place_car(
    lanes: &mut LanePool,
    ovens: &OvenRegistry,
    strategy: AllocationStrategy,
    color: Color,
    primary: OvenId,
) -> Placement {
    let placement = choose_placement(lanes, ovens, strategy, color, primary);
    if let Placement::Placed(lane_id) = placement {
        let pushed = lanes
            .get_mut(lane_id)
            .map(|lane| lane.push(color))
            .unwrap_or(false);
        if !pushed {
            // Every strategy only returns lanes with room
            warn!("Lane {} refused {} after being selected", lane_id, color);
            return Placement::Saturated;
        }
    }
    placement
}

/// Pull up to `per_tick` cars from the backlog and place each of them
///
/// Every car picks its primary oven uniformly at random. Cars that cannot be
/// placed go back to the front of the backlog in their original order, so the
/// rest of the backlog is never reordered.
pub fn allocate<R: Rng + ?Sized>(
    source: &mut CarSource,
    lanes: &mut LanePool,
    ovens: &OvenRegistry,
    strategy: AllocationStrategy,
    rng: &mut R,
    per_tick: usize,
) -> AllocationReport {
    let mut report = AllocationReport::default();

    for color in source.dequeue(per_tick) {
        let primary = if rng.random_bool(0.5) {
            OvenId::O1
        } else {
            OvenId::O2
        };

        match place_car(lanes, ovens, strategy, color, primary) {
            Placement::Placed(lane_id) => {
                debug!("Placed {} on {} (primary oven {})", color, lane_id, primary);
                if lanes.get(lane_id).is_some_and(|lane| lane.oven != primary) {
                    report.rerouted += 1;
                }
                report.placed.push((color, lane_id));
            }
            Placement::NoActiveOven => {
                debug!("Both ovens stopped, holding {} in backlog", color);
                report.requeued.push(color);
            }
            Placement::Saturated => {
                warn!("No lane can take {}; buffer saturated", color);
                report.saturated += 1;
                report.requeued.push(color);
            }
        }
    }

    for &color in report.requeued.iter().rev() {
        source.requeue_front(color);
    }

    report
}
