//! ObjectStoreBackend - GCS, S3 and local stores through `object_store`

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use contracts::{ArtifactPath, ContractError, TransportBackend, TransportOptions};
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{ClientOptions, ObjectStore, PutPayload};
use tracing::{debug, instrument, warn};

use crate::destination::{join_path, ObjectStoreTarget, StoreFlavor};

/// Key of the zero-byte object written when the backend is built
pub const PRIME_OBJECT: &str = ".null";

/// Delivers artifacts with a single `put` per file
pub struct ObjectStoreBackend {
    name: String,
    store: Arc<dyn ObjectStore>,
    prefix: Option<String>,
}

impl ObjectStoreBackend {
    /// Build the store client for `target` and prime it
    #[instrument(name = "object_store_connect", skip(target, options), fields(bucket = %target.bucket))]
    pub async fn connect(
        target: &ObjectStoreTarget,
        options: &TransportOptions,
    ) -> Result<Self, ContractError> {
        let (name, store) = build_store(target, options)?;
        let backend = Self::with_store(name, store, target.prefix.clone());
        if options.prime_object_store {
            backend.prime().await;
        }
        Ok(backend)
    }

    /// Wrap an existing store
    pub fn with_store(
        name: impl Into<String>,
        store: Arc<dyn ObjectStore>,
        prefix: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            store,
            prefix,
        }
    }

    /// Object key of a relative artifact path
    pub fn object_path(&self, relative: &str) -> ObjectPath {
        match &self.prefix {
            Some(prefix) => ObjectPath::from(join_path(prefix, relative)),
            None => ObjectPath::from(relative),
        }
    }

    /// Best-effort write of an empty object to warm up auth and connections
    pub async fn prime(&self) {
        let path = self.object_path(PRIME_OBJECT);
        match self.store.put(&path, PutPayload::default()).await {
            Ok(_) => debug!(backend = %self.name, key = %path, "Object store primed"),
            Err(e) => warn!(
                backend = %self.name,
                key = %path,
                error = %e,
                "Priming write failed, continuing"
            ),
        }
    }
}

fn client_options(options: &TransportOptions) -> ClientOptions {
    let mut client = ClientOptions::new();
    if let Some(timeout) = options.request_timeout() {
        client = client.with_timeout(timeout);
    }
    if let Some(timeout) = options.connect_timeout() {
        client = client.with_connect_timeout(timeout);
    }
    client
}

fn build_store(
    target: &ObjectStoreTarget,
    options: &TransportOptions,
) -> Result<(&'static str, Arc<dyn ObjectStore>), ContractError> {
    match &target.flavor {
        StoreFlavor::Gcs => {
            let store = GoogleCloudStorageBuilder::from_env()
                .with_bucket_name(&target.bucket)
                .with_client_options(client_options(options))
                .build()
                .map_err(|e| ContractError::backend_init("gcs", e.to_string()))?;
            Ok(("gcs", Arc::new(store)))
        }
        StoreFlavor::S3 => {
            let store = AmazonS3Builder::from_env()
                .with_bucket_name(&target.bucket)
                .with_client_options(client_options(options))
                .build()
                .map_err(|e| ContractError::backend_init("s3", e.to_string()))?;
            Ok(("s3", Arc::new(store)))
        }
        StoreFlavor::S3Compatible {
            endpoint,
            allow_http,
        } => {
            let store = AmazonS3Builder::from_env()
                .with_bucket_name(&target.bucket)
                .with_endpoint(endpoint)
                .with_allow_http(*allow_http)
                .with_virtual_hosted_style_request(false)
                .with_client_options(client_options(options))
                .build()
                .map_err(|e| ContractError::backend_init("s3", e.to_string()))?;
            Ok(("s3", Arc::new(store)))
        }
        StoreFlavor::Local { root } => {
            std::fs::create_dir_all(root)
                .map_err(|e| ContractError::backend_init("local", e.to_string()))?;
            let store = LocalFileSystem::new_with_prefix(root)
                .map_err(|e| ContractError::backend_init("local", e.to_string()))?;
            Ok(("local", Arc::new(store)))
        }
    }
}

impl TransportBackend for ObjectStoreBackend {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "object_store_transfer",
        skip(self, local_file),
        fields(backend = %self.name, remote = %remote)
    )]
    async fn transfer(
        &mut self,
        local_file: &Path,
        remote: &ArtifactPath,
    ) -> Result<(), ContractError> {
        let key = self.object_path(remote.as_str());
        let data = tokio::fs::read(local_file).await.map_err(|e| {
            ContractError::transfer(&self.name, key.to_string(), format!("read failed: {e}"))
        })?;
        let size = data.len();

        self.store
            .put(&key, PutPayload::from(Bytes::from(data)))
            .await
            .map_err(|e| ContractError::transfer(&self.name, key.to_string(), e.to_string()))?;

        debug!(key = %key, bytes = size, "Put complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::Destination;
    use chrono::NaiveDate;
    use contracts::{CameraTag, ObsDay};
    use object_store::memory::InMemory;

    fn artifact() -> ArtifactPath {
        let day = ObsDay::new(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        ArtifactPath::new(day, 10000, CameraTag::Mc, "0-0")
    }

    #[tokio::test]
    async fn test_put_under_prefix() {
        let store = Arc::new(InMemory::new());
        let mut backend = ObjectStoreBackend::with_store("memory", store.clone(), Some("cam".into()));

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.fits");
        std::fs::write(&file, b"exposure").unwrap();

        backend.transfer(&file, &artifact()).await.unwrap();

        let key = ObjectPath::from(format!("cam/{}", artifact()));
        let got = store.get(&key).await.unwrap().bytes().await.unwrap();
        assert_eq!(got.as_ref(), b"exposure");
    }

    #[tokio::test]
    async fn test_prime_writes_empty_object() {
        let store = Arc::new(InMemory::new());
        let backend = ObjectStoreBackend::with_store("memory", store.clone(), Some("cam".into()));
        backend.prime().await;

        let got = store
            .get(&ObjectPath::from("cam/.null"))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn test_missing_local_file_is_transfer_error() {
        let store = Arc::new(InMemory::new());
        let mut backend = ObjectStoreBackend::with_store("memory", store, None);
        let err = backend
            .transfer(Path::new("/nonexistent/a.fits"), &artifact())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), contracts::ErrorKind::Transfer);
    }

    #[tokio::test]
    async fn test_local_flavor_writes_files() {
        let dest = tempfile::tempdir().unwrap();
        let uri = format!("file://{}", dest.path().join("out").display());
        let Destination::ObjectStore(target) = Destination::parse(&uri).unwrap() else {
            panic!("expected object store");
        };

        let mut backend = ObjectStoreBackend::connect(&target, &TransportOptions::default())
            .await
            .unwrap();

        let src = dest.path().join("src.fits");
        std::fs::write(&src, b"pixels").unwrap();
        backend.transfer(&src, &artifact()).await.unwrap();
        backend.transfer(&src, &artifact()).await.unwrap();

        let written = artifact().to_local(&dest.path().join("out"));
        assert_eq!(std::fs::read(written).unwrap(), b"pixels");
        assert!(dest.path().join("out").join(".null").exists());
    }

    #[tokio::test]
    async fn test_failed_prime_is_not_fatal() {
        let dest = tempfile::tempdir().unwrap();
        // .null taken by a non-empty directory, so the priming put fails
        std::fs::create_dir_all(dest.path().join(PRIME_OBJECT).join("occupied")).unwrap();
        let uri = format!("file://{}", dest.path().display());
        let Destination::ObjectStore(target) = Destination::parse(&uri).unwrap() else {
            panic!("expected object store");
        };

        let mut backend = ObjectStoreBackend::connect(&target, &TransportOptions::default())
            .await
            .unwrap();
        assert!(dest.path().join(PRIME_OBJECT).is_dir());

        let src = dest.path().join("src.fits");
        std::fs::write(&src, b"pixels").unwrap();
        backend.transfer(&src, &artifact()).await.unwrap();
        assert_eq!(
            std::fs::read(artifact().to_local(dest.path())).unwrap(),
            b"pixels"
        );
    }
}
