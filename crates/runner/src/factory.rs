//! Per-unit backend construction

use contracts::{ContractError, TransportBackend, TransportOptions, UnitId};
use transport::Backend;

/// Builds one backend for each unit, before its schedule starts
#[trait_variant::make(BackendFactory: Send)]
pub trait LocalBackendFactory {
    type Backend: TransportBackend + Send + 'static;

    /// # Errors
    /// Any error is fatal for the unit
    async fn connect(&self, unit: &UnitId) -> Result<Self::Backend, ContractError>;
}

/// Factory building the URI-selected [`Backend`]
#[derive(Debug, Clone)]
pub struct UriBackendFactory {
    uri: String,
    options: TransportOptions,
}

impl UriBackendFactory {
    pub fn new(uri: impl Into<String>, options: TransportOptions) -> Self {
        Self {
            uri: uri.into(),
            options,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl BackendFactory for UriBackendFactory {
    type Backend = Backend;

    async fn connect(&self, _unit: &UnitId) -> Result<Backend, ContractError> {
        Backend::connect(&self.uri, &self.options).await
    }
}
