//! Tunable constants for the paint line
//!
//! Every number the engine depends on lives here as a named default and can
//! be overridden through [`SimConfig`].

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::allocator::AllocationStrategy;
use super::types::{Color, OvenId};

/// Heartbeat period of the simulation clock
pub const TICK_PERIOD_MS: u64 = 500;
/// Cars pulled from the backlog on every tick
pub const CARS_PER_TICK: usize = 2;
/// Chance per tick that a breakdown is attempted
pub const BREAKDOWN_PROBABILITY: f64 = 0.02;
/// A breakdown is only attempted while more than this many lanes are active
pub const MIN_ACTIVE_LANES_FOR_BREAKDOWN: usize = 2;
/// Seconds a lane is protected from a new breakdown after the previous one
pub const BREAKDOWN_COOLDOWN_SECS: u64 = 15;
/// Seconds until a broken lane heals on its own
pub const RECOVERY_DELAY_SECS: u64 = 8;
/// Number of retired colors kept for display
pub const RECENT_SEQUENCE_LEN: usize = 15;
/// Length of the throughput window
pub const HOUR_SECS: u64 = 3600;

/// Capacity of lanes L1..L4
pub const SMALL_LANE_CAPACITY: usize = 14;
/// Capacity of lanes L5..L9
pub const LARGE_LANE_CAPACITY: usize = 16;

/// Cars of each color generated on reset (120 in total)
pub const COLOR_DISTRIBUTION: [(Color, usize); 12] = [
    (Color::C1, 25),
    (Color::C2, 20),
    (Color::C3, 15),
    (Color::C4, 15),
    (Color::C5, 12),
    (Color::C6, 8),
    (Color::C7, 7),
    (Color::C8, 6),
    (Color::C9, 4),
    (Color::C10, 3),
    (Color::C11, 3),
    (Color::C12, 2),
];

/// One entry of the lane table; the lane id is its position in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneSpec {
    pub oven: OvenId,
    pub capacity: usize,
}

impl LaneSpec {
    pub fn new(oven: OvenId, capacity: usize) -> Self {
        Self { oven, capacity }
    }
}

/// Full configuration of a paint line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub lanes: Vec<LaneSpec>,
    pub distribution: Vec<(Color, usize)>,
    pub tick_period_ms: u64,
    pub cars_per_tick: usize,
    pub breakdown_probability: f64,
    pub min_active_lanes_for_breakdown: usize,
    pub breakdown_cooldown_secs: u64,
    pub recovery_delay_secs: u64,
    pub recent_sequence_len: usize,
    pub hour_secs: u64,
    /// Lane choice within an oven
    pub strategy: AllocationStrategy,
    /// Seed for reproducible runs; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        let mut lanes = vec![LaneSpec::new(OvenId::O1, SMALL_LANE_CAPACITY); 4];
        lanes.extend(std::iter::repeat(LaneSpec::new(OvenId::O2, LARGE_LANE_CAPACITY)).take(5));

        Self {
            lanes,
            distribution: COLOR_DISTRIBUTION.to_vec(),
            tick_period_ms: TICK_PERIOD_MS,
            cars_per_tick: CARS_PER_TICK,
            breakdown_probability: BREAKDOWN_PROBABILITY,
            min_active_lanes_for_breakdown: MIN_ACTIVE_LANES_FOR_BREAKDOWN,
            breakdown_cooldown_secs: BREAKDOWN_COOLDOWN_SECS,
            recovery_delay_secs: RECOVERY_DELAY_SECS,
            recent_sequence_len: RECENT_SEQUENCE_LEN,
            hour_secs: HOUR_SECS,
            strategy: AllocationStrategy::default(),
            seed: None,
        }
    }
}

impl SimConfig {
    /// Default configuration with a fixed RNG seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: SimConfig = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.lanes.is_empty() {
            bail!("at least one lane is required");
        }
        if let Some(position) = self.lanes.iter().position(|lane| lane.capacity == 0) {
            bail!("lane L{} has zero capacity", position + 1);
        }
        if self.distribution.iter().map(|(_, count)| count).sum::<usize>() == 0 {
            bail!("color distribution generates no cars");
        }
        if !(0.0..=1.0).contains(&self.breakdown_probability) {
            bail!(
                "breakdown probability {} is outside [0, 1]",
                self.breakdown_probability
            );
        }
        if self.tick_period_ms == 0 {
            bail!("tick period must be positive");
        }
        if self.recent_sequence_len == 0 {
            bail!("recent sequence length must be positive");
        }
        if self.hour_secs == 0 {
            bail!("throughput window must be positive");
        }
        Ok(())
    }

    /// Total cars a reset generates
    pub fn total_cars(&self) -> usize {
        self.distribution.iter().map(|(_, count)| count).sum()
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn breakdown_cooldown(&self) -> Duration {
        Duration::from_secs(self.breakdown_cooldown_secs)
    }

    pub fn recovery_delay(&self) -> Duration {
        Duration::from_secs(self.recovery_delay_secs)
    }

    pub fn hour(&self) -> Duration {
        Duration::from_secs(self.hour_secs)
    }
}
