//! Main simulation world that ties everything together
//!
//! `LineWorld` owns the whole state of the paint line and advances it one
//! tick at a time. It never reads the wall clock: every time-dependent call
//! takes `now`, measured from the simulator's epoch.

use anyhow::{Context, Result};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::time::Duration;

use super::allocator::{self, AllocationReport};
use super::breakdown::{self, BreakdownRoll, RecoveryTimer};
use super::car_source::CarSource;
use super::config::SimConfig;
use super::lane::{Lane, LanePool};
use super::metrics::LineMetrics;
use super::oven::OvenRegistry;
use super::palette;
use super::sequencer::{self, ConveyorStep, MainConveyor, RecentSequence};
use super::snapshot::{Kpis, LineView, MainLineView, OvenView, StatusSnapshot};
use super::types::{LaneId, OvenId, OvenStatus};

/// Everything one tick did
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// False when the line was stopped or paused and nothing ran
    pub ran: bool,
    pub breakdown: BreakdownRoll,
    pub allocation: AllocationReport,
    pub conveyor: ConveyorStep,
}

impl TickReport {
    fn skipped() -> Self {
        Self {
            ran: false,
            breakdown: BreakdownRoll::Quiet,
            allocation: AllocationReport::default(),
            conveyor: ConveyorStep::Idle,
        }
    }

    /// Recovery the runtime has to schedule, if a lane broke down
    pub fn recovery(&self) -> Option<RecoveryTimer> {
        match self.breakdown {
            BreakdownRoll::Broke(timer) => Some(timer),
            _ => None,
        }
    }
}

/// The main simulation world
pub struct LineWorld {
    config: SimConfig,

    /// Unassigned cars
    pub source: CarSource,

    /// Buffer lanes
    pub lanes: LanePool,

    /// Both ovens
    pub ovens: OvenRegistry,

    /// Single-slot exit of the line
    pub conveyor: MainConveyor,

    /// Last retired colors
    pub recent: RecentSequence,

    pub metrics: LineMetrics,

    pub is_running: bool,
    pub is_paused: bool,

    /// Bumped on every reset so recovery timers from before it are ignored
    generation: u64,

    /// Cars generated at the last reset
    generated: usize,

    ticks: u64,

    rng: StdRng,
}

impl Default for LineWorld {
    fn default() -> Self {
        Self::build(SimConfig::default())
    }
}

impl LineWorld {
    fn build(config: SimConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let source = CarSource::generate(&config.distribution, &mut rng);

        Self {
            generated: source.generated(),
            source,
            lanes: LanePool::from_specs(&config.lanes),
            ovens: OvenRegistry::new(),
            conveyor: MainConveyor::new(),
            recent: RecentSequence::new(config.recent_sequence_len),
            metrics: LineMetrics::new(Duration::ZERO),
            is_running: false,
            is_paused: false,
            generation: 0,
            ticks: 0,
            rng,
            config,
        }
    }

    /// Create a world from a validated configuration
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate().context("invalid simulation config")?;
        Ok(Self::build(config))
    }

    /// Create a default world with a seeded RNG for reproducible simulations
    pub fn new_with_seed(seed: u64) -> Self {
        Self::build(SimConfig::seeded(seed))
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Cars generated at the last reset
    pub fn generated_cars(&self) -> usize {
        self.generated
    }

    /// Cars currently accounted for anywhere, plus those already retired
    ///
    /// Always equals [`generated_cars`](Self::generated_cars).
    pub fn accounted_cars(&self) -> usize {
        self.source.len()
            + self.lanes.queued_cars()
            + usize::from(self.conveyor.is_occupied())
            + self.metrics.total_processed
    }

    /// True once every generated car has left the line
    pub fn is_drained(&self) -> bool {
        self.metrics.total_processed == self.generated
    }

    pub fn start(&mut self) {
        if !self.is_running || self.is_paused {
            info!("Paint line started");
        }
        self.is_running = true;
        self.is_paused = false;
    }

    pub fn pause(&mut self) {
        if self.is_running && !self.is_paused {
            info!("Paint line paused");
        }
        self.is_paused = true;
    }

    /// Rebuild the whole line from scratch and stop it
    ///
    /// The backlog is regenerated and reshuffled, lanes emptied, both ovens
    /// restarted and the counters cleared. Outstanding recovery timers become
    /// stale because the generation changes.
    pub fn reset(&mut self, now: Duration) {
        self.source = CarSource::generate(&self.config.distribution, &mut self.rng);
        self.generated = self.source.generated();
        self.lanes = LanePool::from_specs(&self.config.lanes);
        self.ovens = OvenRegistry::new();
        self.conveyor = MainConveyor::new();
        self.recent = RecentSequence::new(self.config.recent_sequence_len);
        self.metrics = LineMetrics::new(now);
        self.is_running = false;
        self.is_paused = false;
        self.generation += 1;
        self.ticks = 0;
        info!(
            "Paint line reset: {} cars in backlog (generation {})",
            self.generated, self.generation
        );
    }

    /// Main simulation tick
    ///
    /// Breakdown roll, allocation, release, then alert recount. A no-op
    /// unless the line is running and not paused.
    pub fn tick(&mut self, now: Duration) -> TickReport {
        if !self.is_running || self.is_paused {
            return TickReport::skipped();
        }
        self.ticks += 1;

        let breakdown =
            breakdown::roll(&mut self.lanes, &mut self.rng, &self.config, now, self.generation);

        let allocation = allocator::allocate(
            &mut self.source,
            &mut self.lanes,
            &self.ovens,
            self.config.strategy,
            &mut self.rng,
            self.config.cars_per_tick,
        );
        if allocation.saturated > 0 {
            self.metrics.record_saturation(allocation.saturated);
        }
        self.metrics.reroutes += allocation.rerouted;

        let conveyor = sequencer::advance(&mut self.conveyor, &mut self.lanes);
        if let ConveyorStep::Retired(color) = conveyor {
            self.recent.push(color);
            self.metrics.record_retirement(color);
        }

        if self.metrics.roll_hour(now, self.config.hour()) {
            info!("Throughput window restarted at {:.1}s", now.as_secs_f64());
        }
        self.metrics.refresh_alerts(&self.lanes);

        TickReport {
            ran: true,
            breakdown,
            allocation,
            conveyor,
        }
    }

    /// Fire a breakdown recovery; runs regardless of running/paused state
    pub fn apply_recovery(&mut self, timer: &RecoveryTimer) -> bool {
        breakdown::recover(&mut self.lanes, timer, self.generation)
    }

    pub fn set_oven_status(&mut self, oven: OvenId, status: OvenStatus) {
        let previous = self.ovens.set_status(oven, status);
        if previous != status {
            info!("Oven {} is now {}", oven, status);
        }
    }

    fn lane_mut(&mut self, lane: LaneId) -> Result<&mut Lane> {
        let count = self.lanes.len();
        self.lanes
            .get_mut(lane)
            .with_context(|| format!("no lane {} (line has {} lanes)", lane, count))
    }

    /// Take a lane out of service from the control surface
    pub fn mark_lane_unavailable(&mut self, lane: LaneId) -> Result<()> {
        self.lane_mut(lane)?.mark_unavailable();
        warn!("Lane {} marked unavailable", lane);
        Ok(())
    }

    /// Put a lane back in service, clearing any outage
    pub fn mark_lane_available(&mut self, lane: LaneId) -> Result<()> {
        self.lane_mut(lane)?.mark_available();
        info!("Lane {} marked available", lane);
        Ok(())
    }

    /// Take an owned copy of the observable state
    pub fn snapshot(&self, now: Duration) -> StatusSnapshot {
        let ovens = self
            .ovens
            .iter()
            .map(|oven| (oven.id, OvenView { status: oven.status }))
            .collect();

        let lines: BTreeMap<LaneId, LineView> = self
            .lanes
            .iter()
            .map(|lane| {
                (
                    lane.id,
                    LineView {
                        status: lane.status(),
                        cars: lane.cars().collect(),
                        count: lane.len(),
                        capacity: lane.capacity,
                    },
                )
            })
            .collect();

        StatusSnapshot {
            kpis: Kpis {
                jph: self.metrics.jph(now),
                total_cars_processed: self.metrics.total_processed,
                active_alerts: self.metrics.active_alerts,
                changeovers: self.metrics.changeovers,
                overflow_events: self.metrics.overflow_events,
                reroutes: self.metrics.reroutes,
            },
            recent_sequence: self.recent.to_vec(),
            ovens,
            lines,
            main_line: MainLineView {
                feeding_from: self.conveyor.feeding_from(),
                current_car: self.conveyor.current_car(),
            },
            is_running: self.is_running,
            is_paused: self.is_paused,
        }
    }

    /// Print a summary of the world state
    pub fn print_summary(&self, now: Duration) {
        println!("=== Paint Line Summary ===");
        println!(
            "Time: {:.1}s | Ticks: {} | Strategy: {} | Running: {} | Paused: {}",
            now.as_secs_f64(),
            self.ticks,
            self.config.strategy,
            self.is_running,
            self.is_paused
        );
        println!(
            "Backlog: {} | Queued: {} | Generated: {}",
            self.source.len(),
            self.lanes.queued_cars(),
            self.generated
        );
        println!("{}", self.metrics.summary(now));

        println!("--- Ovens ---");
        for oven in self.ovens.iter() {
            println!("  {}: {}", oven.id, oven.status);
        }

        let recent: Vec<String> = self.recent.iter().map(|c| c.to_string()).collect();
        println!("--- Recent sequence ---");
        println!("  [{}]", recent.join(" "));
    }

    /// Draw the lanes and the conveyor in the terminal
    pub fn draw_lanes(&self) {
        for lane in self.lanes.iter() {
            let cars: Vec<String> = lane.cars().map(|c| format!("{:>4}", c.to_string())).collect();
            println!(
                "{:>3} [{}] {:<11} {:>2}/{:<2} |{}",
                lane.id.to_string(),
                lane.oven,
                lane.status().to_string(),
                lane.len(),
                lane.capacity,
                cars.join("")
            );
        }
        match (self.conveyor.feeding_from(), self.conveyor.current_car()) {
            (Some(lane), Some(car)) => println!(
                "Main conveyor <- {}: {} ({})",
                lane,
                car,
                palette::swatch(car).display_name
            ),
            _ => println!("Main conveyor: empty"),
        }
    }
}
