//! # Runner
//!
//! Worker fan-out for simulated sensors.
//!
//! Responsibilities:
//! - Build one backend, staging area and scheduler per unit
//! - Drive each unit through its exposures
//! - Run all units concurrently and aggregate their reports
//! - Derive the node number used in default sensor ids

pub mod error;
pub mod factory;
pub mod fanout;
pub mod node;
pub mod unit;

#[cfg(test)]
mod testing;

pub use error::{Result, RunnerError};
pub use factory::{BackendFactory, LocalBackendFactory, UriBackendFactory};
pub use fanout::{FanOut, FanOutReport};
pub use node::{local_node_number, node_number};
pub use unit::{run_unit, ExposureUnit, UnitPlan, UnitReport, UnitState};
