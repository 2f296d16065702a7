//! StagingArea - unit-exclusive working directory

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

use contracts::{ArtifactPath, ContractError, UnitId};
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;
use tracing::{debug, instrument, warn};

/// Suffix appended to compressed artifacts
pub const GZIP_SUFFIX: &str = "gz";

/// One staged exposure, ready for transfer
#[derive(Debug, Clone)]
pub struct StagedArtifact {
    /// Destination-relative path (with `.gz` when compressed)
    pub artifact: ArtifactPath,
    /// Location inside the staging area
    pub local: PathBuf,
    /// Size of the staged file
    pub bytes: u64,
    /// Copy duration
    pub copy_ms: f64,
    /// Compression duration, when compressed
    pub compress_ms: Option<f64>,
}

/// Temporary directory owned by one unit
///
/// Removed with everything in it when dropped.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Create a fresh directory under `root`
    ///
    /// # Errors
    /// Failure here is a configuration error: the unit cannot start.
    pub fn create(root: &Path, unit: &UnitId) -> Result<Self, ContractError> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("camxfer-{}-", unit.sensor))
            .tempdir_in(root)
            .map_err(|e| {
                ContractError::config_validation(
                    "temp_dir",
                    format!("cannot create staging area under {}: {e}", root.display()),
                )
            })?;
        debug!(unit = %unit, path = %dir.path().display(), "Staging area created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Local location of an artifact inside this area
    pub fn local_path(&self, artifact: &ArtifactPath) -> PathBuf {
        artifact.to_local(self.dir.path())
    }

    /// Copy `source` to `artifact`'s relative path, optionally gzip it
    ///
    /// With `compress`, the uncompressed copy is removed and the returned
    /// artifact carries the `.gz` suffix. A compression failure never falls
    /// back to the uncompressed file.
    #[instrument(
        name = "staging_stage",
        skip(self, source),
        fields(artifact = %artifact, compress = compress)
    )]
    pub async fn stage(
        &self,
        source: &Path,
        artifact: &ArtifactPath,
        compress: bool,
    ) -> Result<StagedArtifact, ContractError> {
        let local = self.local_path(artifact);
        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ContractError::staging(artifact, e.to_string()))?;
        }

        let started = Instant::now();
        let bytes = tokio::fs::copy(source, &local).await.map_err(|e| {
            ContractError::staging(
                artifact,
                format!("copy from {} failed: {e}", source.display()),
            )
        })?;
        let copy_ms = started.elapsed().as_secs_f64() * 1000.0;
        observability::record_staging_copy_ms(copy_ms);
        debug!(bytes, copy_ms, "Copied");

        if !compress {
            return Ok(StagedArtifact {
                artifact: artifact.clone(),
                local,
                bytes,
                copy_ms,
                compress_ms: None,
            });
        }

        let compressed = artifact.with_suffix(GZIP_SUFFIX);
        let target = self.local_path(&compressed);

        let started = Instant::now();
        let result = {
            let (input, output) = (local.clone(), target.clone());
            tokio::task::spawn_blocking(move || gzip_file(&input, &output))
                .await
                .map_err(|e| io::Error::other(e.to_string()))
                .and_then(|r| r)
        };

        // the uncompressed copy is never kept
        remove_quietly(&local).await;

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                remove_quietly(&target).await;
                return Err(ContractError::compression(artifact, e.to_string()));
            }
        };
        let compress_ms = started.elapsed().as_secs_f64() * 1000.0;
        observability::record_staging_compress_ms(compress_ms);
        debug!(bytes, compress_ms, "Compressed");

        Ok(StagedArtifact {
            artifact: compressed,
            local: target,
            bytes,
            copy_ms,
            compress_ms: Some(compress_ms),
        })
    }

    /// Remove a staged file once it is no longer needed
    pub async fn release(&self, staged: &StagedArtifact) {
        remove_quietly(&staged.local).await;
    }
}

fn gzip_file(input: &Path, output: &Path) -> io::Result<u64> {
    let mut reader = BufReader::new(File::open(input)?);
    let writer = BufWriter::new(File::create(output)?);
    let mut encoder = GzEncoder::new(writer, Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    let writer = encoder.finish()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(file.metadata()?.len())
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove staged file");
        }
    }
}
