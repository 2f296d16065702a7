//! Layered error definitions
//!
//! Categorized by where the failure happens: configuration (before the timed
//! loop), staging and transfer (inside the loop, one exposure at a time).

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Destination URI with a scheme no backend handles
    #[error("unrecognized destination '{uri}'")]
    UnsupportedDestination { uri: String },

    /// Destination URI with a known scheme but unusable contents
    #[error("malformed destination '{uri}': {message}")]
    MalformedDestination { uri: String, message: String },

    /// No input image could be found for a sensor
    #[error("no input file for sensor '{sensor}' under {}", path.display())]
    MissingInput { sensor: String, path: PathBuf },

    /// Backend client could not be built
    #[error("backend '{backend}' initialization failed: {message}")]
    BackendInit { backend: String, message: String },

    // ===== Staging Errors =====
    /// Copy into the staging area failed
    #[error("staging '{artifact}' failed: {message}")]
    Staging { artifact: String, message: String },

    /// Compression of a staged artifact failed
    #[error("compressing '{artifact}' failed: {message}")]
    Compression { artifact: String, message: String },

    // ===== Transfer Errors =====
    /// Backend-specific delivery failure
    #[error("backend '{backend}' transfer to '{destination}' failed: {message}")]
    Transfer {
        backend: String,
        destination: String,
        message: String,
    },

    /// Remote side answered with a non-success status
    #[error("backend '{backend}' transfer to '{destination}' rejected with status {status}")]
    TransferStatus {
        backend: String,
        destination: String,
        status: u16,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Coarse classification used by the unit loop to decide fatal vs. skip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Prevents a unit from starting
    Configuration,
    /// Aborts one exposure before transfer
    Staging,
    /// Aborts one exposure's delivery
    Transfer,
    /// Anything else
    Other,
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create malformed destination error
    pub fn malformed_destination(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedDestination {
            uri: uri.into(),
            message: message.into(),
        }
    }

    /// Create backend initialization error
    pub fn backend_init(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendInit {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create staging error
    pub fn staging(artifact: impl ToString, message: impl Into<String>) -> Self {
        Self::Staging {
            artifact: artifact.to_string(),
            message: message.into(),
        }
    }

    /// Create compression error
    pub fn compression(artifact: impl ToString, message: impl Into<String>) -> Self {
        Self::Compression {
            artifact: artifact.to_string(),
            message: message.into(),
        }
    }

    /// Create transfer error
    pub fn transfer(
        backend: impl Into<String>,
        destination: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transfer {
            backend: backend.into(),
            destination: destination.into(),
            message: message.into(),
        }
    }

    /// Which part of the taxonomy this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigParse { .. }
            | Self::ConfigValidation { .. }
            | Self::UnsupportedDestination { .. }
            | Self::MalformedDestination { .. }
            | Self::MissingInput { .. }
            | Self::BackendInit { .. } => ErrorKind::Configuration,
            Self::Staging { .. } | Self::Compression { .. } => ErrorKind::Staging,
            Self::Transfer { .. } | Self::TransferStatus { .. } => ErrorKind::Transfer,
            Self::Io(_) | Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether the error must stop a unit before its timed loop
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = ContractError::UnsupportedDestination {
            uri: "ftp://x".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.is_fatal());

        let err = ContractError::staging("a.fits", "disk full");
        assert_eq!(err.kind(), ErrorKind::Staging);
        assert!(!err.is_fatal());

        let err = ContractError::TransferStatus {
            backend: "http".into(),
            destination: "http://h/a.fits".into(),
            status: 503,
        };
        assert_eq!(err.kind(), ErrorKind::Transfer);
        assert!(err.to_string().contains("503"));
    }
}
