//! Paint Line Sequencing Library
//!
//! A discrete-time simulation of a paint-shop color-sequencing line that can
//! run headless on simulated time or on the wall clock behind a console.

pub mod runtime;
pub mod simulation;
