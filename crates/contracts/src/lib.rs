//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the simulator.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Exposure triggers are local wall-clock instants (`start_time + index * interval`)
//! - The obs-day used in artifact names is fixed when a unit starts

mod artifact;
mod config;
mod error;
mod schedule;
mod sensor_id;
mod transport;

pub use artifact::*;
pub use config::*;
pub use error::*;
pub use schedule::*;
pub use sensor_id::{SensorId, UnitId};
pub use transport::*;
