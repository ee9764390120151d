//! Oven registry
//!
//! Ovens only gate which lanes may accept cars. Both start active; the control
//! surface may stop and restart them at any time.

use super::types::{OvenId, OvenStatus};

/// An oven feeding a group of buffer lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Oven {
    pub id: OvenId,
    pub status: OvenStatus,
}

impl Oven {
    pub fn new(id: OvenId) -> Self {
        Self {
            id,
            status: OvenStatus::Active,
        }
    }
}

/// Status lookup for both ovens
#[derive(Debug, Clone)]
pub struct OvenRegistry {
    ovens: [Oven; 2],
}

impl Default for OvenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OvenRegistry {
    pub fn new() -> Self {
        Self {
            ovens: OvenId::ALL.map(Oven::new),
        }
    }

    fn slot(id: OvenId) -> usize {
        match id {
            OvenId::O1 => 0,
            OvenId::O2 => 1,
        }
    }

    pub fn get(&self, id: OvenId) -> &Oven {
        &self.ovens[Self::slot(id)]
    }

    pub fn is_active(&self, id: OvenId) -> bool {
        self.get(id).status == OvenStatus::Active
    }

    /// Set an oven's status, returning the previous one
    pub fn set_status(&mut self, id: OvenId, status: OvenStatus) -> OvenStatus {
        std::mem::replace(&mut self.ovens[Self::slot(id)].status, status)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Oven> {
        self.ovens.iter()
    }
}
