//! # Staging
//!
//! Per-unit staging of exposure artifacts.
//!
//! Copies the read-only source image into a unit-exclusive temporary
//! directory at the artifact's relative path, optionally gzip-compressing it,
//! so that transfers read from the (typically RAM-backed) staging root.

mod area;
mod input;

pub use area::{StagedArtifact, StagingArea, GZIP_SUFFIX};
pub use input::{resolve_input, FALLBACK_IMAGE};
