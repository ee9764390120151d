//! Standalone paint line simulation module
//!
//! This module contains the whole color-sequencing engine: backlog, ovens,
//! buffer lanes, breakdowns, allocation and release. It has no notion of
//! wall-clock time or threads and can be driven tick by tick from tests or
//! from the runtime in [`crate::runtime`].

pub mod allocator;
pub mod breakdown;
mod car_source;
mod config;
mod lane;
mod metrics;
mod oven;
pub mod palette;
pub mod sequencer;
mod snapshot;
mod types;
mod world;

// Re-export public types for external use
pub use allocator::{AllocationReport, AllocationStrategy, Placement};
pub use breakdown::{BreakdownRoll, RecoveryTimer};
pub use car_source::CarSource;
pub use config::{
    LaneSpec, SimConfig, BREAKDOWN_COOLDOWN_SECS, BREAKDOWN_PROBABILITY, CARS_PER_TICK,
    COLOR_DISTRIBUTION, HOUR_SECS, LARGE_LANE_CAPACITY, MIN_ACTIVE_LANES_FOR_BREAKDOWN,
    RECENT_SEQUENCE_LEN, RECOVERY_DELAY_SECS, SMALL_LANE_CAPACITY, TICK_PERIOD_MS,
};
pub use lane::{derive_status, Lane, LanePool};
pub use metrics::LineMetrics;
pub use oven::{Oven, OvenRegistry};
pub use sequencer::{ConveyorStep, MainConveyor, RecentSequence};
pub use snapshot::{Kpis, LineView, MainLineView, OvenView, StatusSnapshot};
pub use types::{Color, LaneId, LaneStatus, OvenId, OvenStatus, Outage};
pub use world::{LineWorld, TickReport};
