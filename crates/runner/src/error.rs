//! Runner error types

use contracts::ContractError;
use thiserror::Error;

/// Runner specific error
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Nothing to fan out
    #[error("no units to run")]
    NoUnits,

    /// A unit task panicked or was cancelled
    #[error("unit '{unit}' task failed: {message}")]
    UnitTask { unit: String, message: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl RunnerError {
    /// Create unit task error
    pub fn unit_task(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnitTask {
            unit: unit.into(),
            message: message.into(),
        }
    }
}

/// Result type for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;
