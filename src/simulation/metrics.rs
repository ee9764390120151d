//! Throughput and alert tracking for the paint line
//!
//! Counts retired cars, derives jobs-per-hour over a hard-reset hourly
//! window, and mirrors how many lanes are currently raising an alert.

use std::time::Duration;

use super::lane::LanePool;
use super::types::{Color, LaneStatus};

/// Running counters of the line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineMetrics {
    /// Cars that have left through the main conveyor since the last reset
    pub total_processed: usize,

    /// Cars retired since `hour_start`
    pub processed_this_hour: usize,

    /// Start of the current throughput window
    pub hour_start: Duration,

    /// Lanes currently full or unavailable
    pub active_alerts: usize,

    /// Cumulative count of cars that found no lane
    pub overflow_events: usize,

    /// Color changes between consecutively retired cars
    pub changeovers: usize,

    /// Cars placed on the other oven than the one they drew
    pub reroutes: usize,

    last_retired: Option<Color>,
}

impl LineMetrics {
    /// Fresh counters whose throughput window opens at `now`
    pub fn new(now: Duration) -> Self {
        Self {
            hour_start: now,
            ..Self::default()
        }
    }

    /// Record a car leaving the line
    pub fn record_retirement(&mut self, color: Color) {
        self.total_processed += 1;
        self.processed_this_hour += 1;
        if self.last_retired.is_some_and(|last| last != color) {
            self.changeovers += 1;
        }
        self.last_retired = Some(color);
    }

    /// Record cars the allocator could not place
    ///
    /// This bumps `active_alerts` as well, but [`refresh_alerts`] overwrites
    /// it at the end of every tick; `overflow_events` keeps the history.
    ///
    /// [`refresh_alerts`]: LineMetrics::refresh_alerts
    pub fn record_saturation(&mut self, cars: usize) {
        self.active_alerts += cars;
        self.overflow_events += cars;
    }

    /// Recount alerts from the instantaneous lane state
    pub fn refresh_alerts(&mut self, lanes: &LanePool) {
        self.active_alerts = lanes
            .iter()
            .filter(|lane| matches!(lane.status(), LaneStatus::Full | LaneStatus::Unavailable))
            .count();
    }

    /// Close the throughput window once a full `hour` has elapsed
    pub fn roll_hour(&mut self, now: Duration, hour: Duration) -> bool {
        if now.saturating_sub(self.hour_start) >= hour {
            self.processed_this_hour = 0;
            self.hour_start = now;
            true
        } else {
            false
        }
    }

    /// Jobs per hour in the current window, rounded to one decimal
    pub fn jph(&self, now: Duration) -> f64 {
        let hours = now.saturating_sub(self.hour_start).as_secs_f64() / 3600.0;
        if hours <= 0.0 {
            return 0.0;
        }
        let rate = self.processed_this_hour as f64 / hours;
        (rate * 10.0).round() / 10.0
    }

    /// Get a summary string for display
    pub fn summary(&self, now: Duration) -> String {
        format!(
            concat!(
                "Processed: {} | JPH: {:.1} | Alerts: {} | ",
                "Changeovers: {} | Overflows: {} | Reroutes: {}"
            ),
            self.total_processed,
            self.jph(now),
            self.active_alerts,
            self.changeovers,
            self.overflow_events,
            self.reroutes
        )
    }
}
