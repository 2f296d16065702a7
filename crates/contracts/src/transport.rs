//! TransportBackend trait - delivery interface used by every unit
//!
//! Defines the abstract "deliver this file" capability.

use std::path::Path;

use crate::{ArtifactPath, ContractError};

/// File delivery trait
///
/// All backend variants implement this trait. A backend is built once per unit
/// and invoked once per exposure; a failed call must leave it usable.
#[trait_variant::make(TransportBackend: Send)]
pub trait LocalTransportBackend {
    /// Backend name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver `local_file` to `remote` relative to the backend's destination root
    ///
    /// # Errors
    /// Returns a transfer error carrying the destination and cause
    async fn transfer(
        &mut self,
        local_file: &Path,
        remote: &ArtifactPath,
    ) -> Result<(), ContractError>;
}
