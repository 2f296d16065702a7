//! Destination URI parsing
//!
//! The scheme selects the backend variant; everything is validated here so
//! that a bad destination fails before any exposure is scheduled.

use std::fmt;
use std::path::PathBuf;

use contracts::ContractError;

/// Which object-store service a target points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreFlavor {
    /// Google Cloud Storage (`gsapi://`, `gs://`)
    Gcs,
    /// AWS S3 (`s3://`)
    S3,
    /// S3 API at a custom endpoint (`boto://`, `minio://`)
    S3Compatible { endpoint: String, allow_http: bool },
    /// Local directory (`file://`)
    Local { root: PathBuf },
}

/// Bucket, optional key prefix and service of an object-store destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStoreTarget {
    pub flavor: StoreFlavor,
    pub bucket: String,
    pub prefix: Option<String>,
}

/// Program used for remote copies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    Ssh,
    Bbcp,
}

/// Host and base directory of a remote-copy destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub mode: CopyMode,
    pub host: String,
    /// Base directory on the host; empty means the login directory
    pub base: String,
}

impl RemoteTarget {
    /// Full remote path of a relative artifact path
    pub fn remote_path(&self, relative: &str) -> String {
        join_path(&self.base, relative)
    }
}

/// Parsed destination URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    ObjectStore(ObjectStoreTarget),
    Http { base_url: String },
    RemoteCopy(RemoteTarget),
}

impl Destination {
    /// Parse a destination URI
    ///
    /// # Errors
    /// - `UnsupportedDestination` for unknown schemes
    /// - `MalformedDestination` for known schemes with missing parts
    pub fn parse(uri: &str) -> Result<Self, ContractError> {
        let uri = uri.trim();
        let Some((scheme, rest)) = uri.split_once("://") else {
            return parse_host_path(uri);
        };

        match scheme.to_ascii_lowercase().as_str() {
            "gsapi" | "gs" => object_store(uri, StoreFlavor::Gcs, rest),
            "s3" => object_store(uri, StoreFlavor::S3, rest),
            "boto" | "minio" => {
                let (host, rest) = split_first(rest);
                if host.is_empty() {
                    return Err(ContractError::malformed_destination(uri, "missing host"));
                }
                let allow_http = scheme.eq_ignore_ascii_case("minio");
                let endpoint = if allow_http {
                    format!("http://{host}")
                } else {
                    format!("https://{host}")
                };
                object_store(
                    uri,
                    StoreFlavor::S3Compatible {
                        endpoint,
                        allow_http,
                    },
                    rest,
                )
            }
            "file" => {
                if !rest.starts_with('/') {
                    return Err(ContractError::malformed_destination(
                        uri,
                        "file destinations need an absolute path (file:///dir)",
                    ));
                }
                Ok(Self::ObjectStore(ObjectStoreTarget {
                    flavor: StoreFlavor::Local {
                        root: PathBuf::from(rest),
                    },
                    bucket: String::new(),
                    prefix: None,
                }))
            }
            "http" | "https" => {
                let url = reqwest::Url::parse(uri)
                    .map_err(|e| ContractError::malformed_destination(uri, e.to_string()))?;
                if url.host_str().is_none() {
                    return Err(ContractError::malformed_destination(uri, "missing host"));
                }
                Ok(Self::Http {
                    base_url: uri.trim_end_matches('/').to_string(),
                })
            }
            "scp" => remote(uri, CopyMode::Ssh, rest),
            "bbcp" => remote(uri, CopyMode::Bbcp, rest),
            _ => Err(ContractError::UnsupportedDestination {
                uri: uri.to_string(),
            }),
        }
    }

    /// Backend name used in logs and metric labels
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::ObjectStore(target) => match target.flavor {
                StoreFlavor::Gcs => "gcs",
                StoreFlavor::S3 | StoreFlavor::S3Compatible { .. } => "s3",
                StoreFlavor::Local { .. } => "local",
            },
            Self::Http { .. } => "http",
            Self::RemoteCopy(target) => match target.mode {
                CopyMode::Ssh => "ssh",
                CopyMode::Bbcp => "bbcp",
            },
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectStore(target) => {
                match &target.flavor {
                    StoreFlavor::Gcs => write!(f, "gs://{}", target.bucket)?,
                    StoreFlavor::S3 => write!(f, "s3://{}", target.bucket)?,
                    StoreFlavor::S3Compatible { endpoint, .. } => {
                        write!(f, "{endpoint}/{}", target.bucket)?
                    }
                    StoreFlavor::Local { root } => write!(f, "file://{}", root.display())?,
                }
                if let Some(prefix) = &target.prefix {
                    write!(f, "/{prefix}")?;
                }
                Ok(())
            }
            Self::Http { base_url } => f.write_str(base_url),
            Self::RemoteCopy(target) => write!(f, "{}:{}", target.host, target.base),
        }
    }
}

/// `base/relative`, tolerating empty and slash-terminated bases
pub(crate) fn join_path(base: &str, relative: &str) -> String {
    if base.is_empty() {
        relative.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), relative)
    }
}

fn split_first(rest: &str) -> (&str, &str) {
    rest.split_once('/').unwrap_or((rest, ""))
}

fn object_store(uri: &str, flavor: StoreFlavor, rest: &str) -> Result<Destination, ContractError> {
    let (bucket, prefix) = split_first(rest);
    if bucket.is_empty() {
        return Err(ContractError::malformed_destination(uri, "missing bucket"));
    }
    let prefix = prefix.trim_matches('/');
    Ok(Destination::ObjectStore(ObjectStoreTarget {
        flavor,
        bucket: bucket.to_string(),
        prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
    }))
}

fn remote(uri: &str, mode: CopyMode, rest: &str) -> Result<Destination, ContractError> {
    let (host, path) = split_first(rest);
    if host.is_empty() {
        return Err(ContractError::malformed_destination(uri, "missing host"));
    }
    let base = if path.is_empty() {
        String::new()
    } else {
        format!("/{path}")
    };
    Ok(Destination::RemoteCopy(RemoteTarget {
        mode,
        host: host.to_string(),
        base,
    }))
}

/// `host:path` shorthand for ssh copies
fn parse_host_path(uri: &str) -> Result<Destination, ContractError> {
    match uri.split_once(':') {
        Some((host, path)) if !host.is_empty() && !host.contains('/') => {
            Ok(Destination::RemoteCopy(RemoteTarget {
                mode: CopyMode::Ssh,
                host: host.to_string(),
                base: path.to_string(),
            }))
        }
        _ => Err(ContractError::UnsupportedDestination {
            uri: uri.to_string(),
        }),
    }
}
