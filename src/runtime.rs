//! Wall-clock driver for the paint line
//!
//! [`Simulator`] serializes every mutation of a [`LineWorld`] behind one
//! mutex: the heartbeat thread, one-shot breakdown recovery timers, and
//! control commands all take the same lock. [`VirtualClock`] drives a world
//! on simulated time instead, for headless runs and tests.

use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::simulation::{
    LaneId, LineWorld, OvenId, OvenStatus, RecoveryTimer, StatusSnapshot, TickReport,
};

/// A control command from the operator console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Reset,
    Status,
    SetOven(OvenId, OvenStatus),
    LaneDown(LaneId),
    LaneUp(LaneId),
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let command = match words.as_slice() {
            ["start"] => Command::Start,
            ["pause"] => Command::Pause,
            ["reset"] => Command::Reset,
            ["status"] => Command::Status,
            ["quit"] | ["exit"] => Command::Quit,
            ["oven", oven, status] => Command::SetOven(oven.parse()?, status.parse()?),
            ["lane", lane, "down"] => Command::LaneDown(lane.parse()?),
            ["lane", lane, "up"] => Command::LaneUp(lane.parse()?),
            [] => bail!("empty command"),
            _ => bail!("unknown command '{}'", line.trim()),
        };
        Ok(command)
    }
}

/// Answer to a control command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The command was applied
    Ack(String),
    /// Current state, for `status`
    Status(Box<StatusSnapshot>),
    /// The console should exit
    Quit,
}

/// Thread-safe handle to a running paint line
pub struct Simulator {
    world: Arc<Mutex<LineWorld>>,
    epoch: Instant,
    tick_period: Duration,
    shutdown: Arc<AtomicBool>,
    heartbeat: Option<JoinHandle<()>>,
}

fn lock_world(world: &Mutex<LineWorld>) -> MutexGuard<'_, LineWorld> {
    // Every mutation completes under the lock, so a poisoned world is still consistent
    world.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Spawn a one-shot thread that heals a lane when its timer is due
fn schedule_recovery(world: Arc<Mutex<LineWorld>>, epoch: Instant, timer: RecoveryTimer) {
    thread::spawn(move || {
        let wait = timer.due.saturating_sub(epoch.elapsed());
        thread::sleep(wait);
        let restored = lock_world(&world).apply_recovery(&timer);
        debug!("Recovery timer for {} fired (restored: {})", timer.lane, restored);
    });
}

impl Simulator {
    /// Wrap a world; the clock starts now but no heartbeat runs yet
    pub fn new(world: LineWorld) -> Self {
        let tick_period = world.config().tick_period();
        Self {
            world: Arc::new(Mutex::new(world)),
            epoch: Instant::now(),
            tick_period,
            shutdown: Arc::new(AtomicBool::new(false)),
            heartbeat: None,
        }
    }

    /// Time since the simulator was created
    pub fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// Start the fixed-period heartbeat thread; calling it twice is a no-op
    pub fn spawn_heartbeat(&mut self) {
        if self.heartbeat.is_some() {
            return;
        }

        let world = Arc::clone(&self.world);
        let shutdown = Arc::clone(&self.shutdown);
        let epoch = self.epoch;
        let period = self.tick_period;

        self.heartbeat = Some(thread::spawn(move || {
            let mut next = Instant::now() + period;
            while !shutdown.load(Ordering::Relaxed) {
                thread::sleep(next.saturating_duration_since(Instant::now()));
                next += period;
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }

                let report = lock_world(&world).tick(epoch.elapsed());
                if let Some(timer) = report.recovery() {
                    schedule_recovery(Arc::clone(&world), epoch, timer);
                }
            }
            debug!("Heartbeat stopped");
        }));
        info!("Heartbeat running every {} ms", period.as_millis());
    }

    /// Run one tick immediately, outside the heartbeat
    pub fn tick_now(&self) -> TickReport {
        let report = lock_world(&self.world).tick(self.now());
        if let Some(timer) = report.recovery() {
            schedule_recovery(Arc::clone(&self.world), self.epoch, timer);
        }
        report
    }

    /// Apply a control command
    ///
    /// Lifecycle commands never fail; lane commands fail only for unknown lanes.
    pub fn apply(&self, command: Command) -> Result<Reply> {
        let now = self.now();
        let mut world = lock_world(&self.world);
        let reply = match command {
            Command::Start => {
                world.start();
                Reply::Ack("started".to_string())
            }
            Command::Pause => {
                world.pause();
                Reply::Ack("paused".to_string())
            }
            Command::Reset => {
                world.reset(now);
                Reply::Ack("reset".to_string())
            }
            Command::Status => Reply::Status(Box::new(world.snapshot(now))),
            Command::SetOven(oven, status) => {
                world.set_oven_status(oven, status);
                Reply::Ack(format!("oven {} {}", oven, status))
            }
            Command::LaneDown(lane) => {
                world.mark_lane_unavailable(lane)?;
                Reply::Ack(format!("lane {} unavailable", lane))
            }
            Command::LaneUp(lane) => {
                world.mark_lane_available(lane)?;
                Reply::Ack(format!("lane {} available", lane))
            }
            Command::Quit => Reply::Quit,
        };
        Ok(reply)
    }

    /// Owned copy of the current state
    pub fn snapshot(&self) -> StatusSnapshot {
        lock_world(&self.world).snapshot(self.now())
    }

    pub fn snapshot_json(&self) -> Result<String> {
        self.snapshot().to_json().context("failed to serialize status snapshot")
    }

    /// Run `f` with exclusive access to the world
    pub fn with_world<T>(&self, f: impl FnOnce(&mut LineWorld) -> T) -> T {
        f(&mut lock_world(&self.world))
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.heartbeat.take() {
            let _ = handle.join();
        }
    }
}

/// Simulated clock: advances a world one tick period at a time
///
/// Recovery timers are kept here and fire when simulated time reaches them,
/// before the tick at that moment and whether or not the line is paused.
pub struct VirtualClock {
    now: Duration,
    period: Duration,
    pending: Vec<RecoveryTimer>,
}

impl VirtualClock {
    pub fn new(period: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            period,
            pending: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Recovery timers that have not fired yet
    pub fn pending(&self) -> &[RecoveryTimer] {
        &self.pending
    }

    /// Move time forward one period, fire due recoveries, then tick
    pub fn advance(&mut self, world: &mut LineWorld) -> TickReport {
        self.now += self.period;
        self.fire_due(world);

        let report = world.tick(self.now);
        if let Some(timer) = report.recovery() {
            self.pending.push(timer);
        }
        report
    }

    fn fire_due(&mut self, world: &mut LineWorld) {
        let now = self.now;
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|timer| timer.due <= now);
        self.pending = waiting;
        for timer in due {
            world.apply_recovery(&timer);
        }
    }
}
