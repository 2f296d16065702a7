//! HttpPutBackend - one PUT per artifact over a pooled client

use std::path::Path;

use contracts::{ArtifactPath, ContractError, TransportBackend, TransportOptions};
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client};
use tracing::{debug, instrument};

use crate::destination::join_path;

const BACKEND: &str = "http";

/// PUTs each file body to `base_url/<relative path>`
pub struct HttpPutBackend {
    client: Client,
    base_url: String,
}

impl HttpPutBackend {
    /// Build the client once; its connection pool lives as long as the unit
    pub fn connect(base_url: &str, options: &TransportOptions) -> Result<Self, ContractError> {
        let mut builder = Client::builder().tcp_keepalive(options.tcp_keepalive());
        if let Some(timeout) = options.request_timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = options.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ContractError::backend_init(BACKEND, e.to_string()))?;

        debug!(base_url, "HTTP client ready");
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, remote: &ArtifactPath) -> String {
        join_path(&self.base_url, remote.as_str())
    }
}

impl TransportBackend for HttpPutBackend {
    fn name(&self) -> &str {
        BACKEND
    }

    #[instrument(
        name = "http_transfer",
        skip(self, local_file),
        fields(remote = %remote)
    )]
    async fn transfer(
        &mut self,
        local_file: &Path,
        remote: &ArtifactPath,
    ) -> Result<(), ContractError> {
        let url = self.url_for(remote);
        let file = tokio::fs::File::open(local_file)
            .await
            .map_err(|e| ContractError::transfer(BACKEND, &url, format!("open failed: {e}")))?;
        let size = file
            .metadata()
            .await
            .map_err(|e| ContractError::transfer(BACKEND, &url, format!("stat failed: {e}")))?
            .len();

        // streamed from disk; the length keeps the request out of chunked encoding
        let response = self
            .client
            .put(&url)
            .header(CONTENT_LENGTH, size)
            .body(Body::from(file))
            .send()
            .await
            .map_err(|e| ContractError::transfer(BACKEND, &url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractError::TransferStatus {
                backend: BACKEND.to_string(),
                destination: url,
                status: status.as_u16(),
            });
        }

        debug!(url = %url, bytes = size, status = status.as_u16(), "PUT complete");
        Ok(())
    }
}
