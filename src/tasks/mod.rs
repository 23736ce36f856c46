//! Background Tasks Module
//!
//! # Tasks
//! - Sweep: Removes entries that have not been used for a configured age

mod sweep;

pub use sweep::{spawn_sweep_from_config, spawn_sweep_task, MIN_SWEEP_INTERVAL};
