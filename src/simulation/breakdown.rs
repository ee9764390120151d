//! Breakdown injection and recovery
//!
//! A low-probability roll each tick may knock one active lane out of service.
//! The lane heals on its own once a recovery timer fires; that timer runs on
//! the wall clock and ignores the running/paused state of the line.

use log::{debug, info};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::time::Duration;

use super::config::SimConfig;
use super::lane::LanePool;
use super::types::{LaneId, LaneStatus};

/// A pending one-shot recovery for a broken lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryTimer {
    pub lane: LaneId,
    /// World generation the breakdown happened in; stale after a reset
    pub generation: u64,
    /// Which breakdown of the lane this timer heals
    pub breakdown: u64,
    /// Moment the lane should heal, on the simulator's clock
    pub due: Duration,
}

/// Result of one breakdown roll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakdownRoll {
    /// The probability roll did not trigger
    Quiet,
    /// Triggered, but too few lanes were active to spare one
    TooFewActive,
    /// Triggered on a lane that broke down too recently
    CoolingDown(LaneId),
    /// A lane broke down and will heal when the timer fires
    Broke(RecoveryTimer),
}

/// Whether a lane last broken at `last` may break again at `now`
pub fn cooldown_elapsed(last: Option<Duration>, now: Duration, cooldown: Duration) -> bool {
    match last {
        None => true,
        Some(at) => now.saturating_sub(at) > cooldown,
    }
}

/// Roll for a breakdown at `now`
pub fn roll<R: Rng + ?Sized>(
    lanes: &mut LanePool,
    rng: &mut R,
    config: &SimConfig,
    now: Duration,
    generation: u64,
) -> BreakdownRoll {
    if !rng.random_bool(config.breakdown_probability) {
        return BreakdownRoll::Quiet;
    }

    let active: Vec<LaneId> = lanes
        .with_status(LaneStatus::Active)
        .map(|lane| lane.id)
        .collect();
    if active.len() <= config.min_active_lanes_for_breakdown {
        return BreakdownRoll::TooFewActive;
    }

    let Some(&target) = active.choose(rng) else {
        return BreakdownRoll::TooFewActive;
    };
    let Some(lane) = lanes.get_mut(target) else {
        return BreakdownRoll::TooFewActive;
    };

    if !cooldown_elapsed(lane.last_breakdown, now, config.breakdown_cooldown()) {
        debug!("{} rolled for breakdown but is still cooling down", target);
        return BreakdownRoll::CoolingDown(target);
    }

    let breakdown = lane.break_down(now);
    let timer = RecoveryTimer {
        lane: target,
        generation,
        breakdown,
        due: now + config.recovery_delay(),
    };
    info!(
        "Lane {} broke down at {:.1}s, recovery due at {:.1}s",
        target,
        now.as_secs_f64(),
        timer.due.as_secs_f64()
    );
    BreakdownRoll::Broke(timer)
}

/// Fire a recovery timer against the lanes of generation `current_generation`
///
/// Only a lane still down from the breakdown the timer was scheduled for is
/// restored. A stale generation, a manual outage, a lane already back in
/// service or one that has broken down again since is left alone.
pub fn recover(lanes: &mut LanePool, timer: &RecoveryTimer, current_generation: u64) -> bool {
    if timer.generation != current_generation {
        debug!(
            "Dropping recovery for {} from generation {}",
            timer.lane, timer.generation
        );
        return false;
    }

    let restored = lanes
        .get_mut(timer.lane)
        .map(|lane| lane.recover(timer.breakdown))
        .unwrap_or(false);
    if restored {
        info!("Lane {} recovered from breakdown", timer.lane);
    }
    restored
}
