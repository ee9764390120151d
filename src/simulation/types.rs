//! Core types for the paint line simulation
//!
//! Identifiers, color tokens and the status enums shared by every component.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A car's paint color token
///
/// Cars carry nothing but their color, so a car *is* its color token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    C1,
    C2,
    C3,
    C4,
    C5,
    C6,
    C7,
    C8,
    C9,
    C10,
    C11,
    C12,
}

impl Color {
    pub const ALL: [Color; 12] = [
        Color::C1,
        Color::C2,
        Color::C3,
        Color::C4,
        Color::C5,
        Color::C6,
        Color::C7,
        Color::C8,
        Color::C9,
        Color::C10,
        Color::C11,
        Color::C12,
    ];

    /// Zero-based position of this color in [`Color::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.index() + 1)
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let number: usize = s
            .trim()
            .strip_prefix(['C', 'c'])
            .context("color tokens look like C1..C12")?
            .parse()
            .with_context(|| format!("invalid color token '{s}'"))?;
        match number.checked_sub(1).and_then(|i| Color::ALL.get(i)) {
            Some(color) => Ok(*color),
            None => bail!("unknown color token '{s}'"),
        }
    }
}

/// Identifier of a buffer lane
///
/// Lanes are numbered by their position in the lane table, so lane-id order
/// is index order. Displayed as `L1`, `L2`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaneId(pub usize);

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0 + 1)
    }
}

impl FromStr for LaneId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let number: usize = s
            .trim()
            .strip_prefix(['L', 'l'])
            .context("lane ids look like L1, L2, ...")?
            .parse()
            .with_context(|| format!("invalid lane id '{s}'"))?;
        if number == 0 {
            bail!("lane ids start at L1");
        }
        Ok(LaneId(number - 1))
    }
}

// Serialized as its display form so it can key JSON objects.
impl Serialize for LaneId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One of the two ovens feeding the buffer lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OvenId {
    O1,
    O2,
}

impl OvenId {
    pub const ALL: [OvenId; 2] = [OvenId::O1, OvenId::O2];

    /// The alternate oven
    pub fn other(self) -> OvenId {
        match self {
            OvenId::O1 => OvenId::O2,
            OvenId::O2 => OvenId::O1,
        }
    }
}

impl fmt::Display for OvenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OvenId::O1 => write!(f, "O1"),
            OvenId::O2 => write!(f, "O2"),
        }
    }
}

impl FromStr for OvenId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "O1" => Ok(OvenId::O1),
            "O2" => Ok(OvenId::O2),
            _ => bail!("unknown oven '{s}' (expected O1 or O2)"),
        }
    }
}

/// Status of a buffer lane, always derived from occupancy and outage state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneStatus {
    Active,
    Full,
    Unavailable,
}

impl fmt::Display for LaneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LaneStatus::Active => "active",
            LaneStatus::Full => "full",
            LaneStatus::Unavailable => "unavailable",
        };
        f.write_str(label)
    }
}

/// Operational state of an oven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OvenStatus {
    Active,
    Stopped,
}

impl fmt::Display for OvenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OvenStatus::Active => f.write_str("active"),
            OvenStatus::Stopped => f.write_str("stopped"),
        }
    }
}

impl FromStr for OvenStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" | "start" | "on" => Ok(OvenStatus::Active),
            "stopped" | "stop" | "off" => Ok(OvenStatus::Stopped),
            _ => bail!("unknown oven status '{s}' (expected active or stopped)"),
        }
    }
}

/// Why a lane is currently refusing cars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outage {
    /// Injected by the breakdown roll; heals on its own after the recovery delay
    Breakdown,
    /// Set from the control surface; only cleared from the control surface
    Manual,
}
