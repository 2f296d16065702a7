//! Backend - URI-selected transport variant

use std::path::Path;

use contracts::{ArtifactPath, ContractError, TransportBackend, TransportOptions};
use tracing::info;

use crate::backends::{HttpPutBackend, ObjectStoreBackend, RemoteCopyBackend};
use crate::destination::Destination;

/// One of the supported transports, chosen by destination scheme
pub enum Backend {
    ObjectStore(ObjectStoreBackend),
    Http(HttpPutBackend),
    RemoteCopy(RemoteCopyBackend),
}

impl Backend {
    /// Parse `uri` and build the matching backend
    ///
    /// # Errors
    /// Configuration-kind errors only: unknown scheme, malformed URI, or a
    /// client that cannot be constructed.
    pub async fn connect(uri: &str, options: &TransportOptions) -> Result<Self, ContractError> {
        let destination = Destination::parse(uri)?;
        Self::from_destination(&destination, options).await
    }

    pub async fn from_destination(
        destination: &Destination,
        options: &TransportOptions,
    ) -> Result<Self, ContractError> {
        let backend = match destination {
            Destination::ObjectStore(target) => {
                Self::ObjectStore(ObjectStoreBackend::connect(target, options).await?)
            }
            Destination::Http { base_url } => {
                Self::Http(HttpPutBackend::connect(base_url, options)?)
            }
            Destination::RemoteCopy(target) => {
                Self::RemoteCopy(RemoteCopyBackend::new(target.clone(), options))
            }
        };
        info!(backend = backend.name(), destination = %destination, "Backend ready");
        Ok(backend)
    }
}

impl TransportBackend for Backend {
    fn name(&self) -> &str {
        match self {
            Self::ObjectStore(backend) => backend.name(),
            Self::Http(backend) => backend.name(),
            Self::RemoteCopy(backend) => backend.name(),
        }
    }

    async fn transfer(
        &mut self,
        local_file: &Path,
        remote: &ArtifactPath,
    ) -> Result<(), ContractError> {
        match self {
            Self::ObjectStore(backend) => backend.transfer(local_file, remote).await,
            Self::Http(backend) => backend.transfer(local_file, remote).await,
            Self::RemoteCopy(backend) => backend.transfer(local_file, remote).await,
        }
    }
}
