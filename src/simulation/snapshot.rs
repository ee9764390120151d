//! Immutable status snapshot
//!
//! Owned copy of everything an observer may read, shaped for the JSON status
//! endpoint. Taking one never hands out references into live state.

use serde::Serialize;
use std::collections::BTreeMap;

use super::types::{Color, LaneId, LaneStatus, OvenId, OvenStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub jph: f64,
    pub total_cars_processed: usize,
    pub active_alerts: usize,
    pub changeovers: usize,
    pub overflow_events: usize,
    pub reroutes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OvenView {
    pub status: OvenStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineView {
    pub status: LaneStatus,
    pub cars: Vec<Color>,
    pub count: usize,
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MainLineView {
    pub feeding_from: Option<LaneId>,
    pub current_car: Option<Color>,
}

/// Point-in-time copy of the whole line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub kpis: Kpis,
    /// Most recently retired colors, oldest first
    pub recent_sequence: Vec<Color>,
    pub ovens: BTreeMap<OvenId, OvenView>,
    pub lines: BTreeMap<LaneId, LineView>,
    pub main_line: MainLineView,
    pub is_running: bool,
    pub is_paused: bool,
}

impl StatusSnapshot {
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
