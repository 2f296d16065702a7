//! Source image lookup

use std::path::{Path, PathBuf};

use contracts::{ContractError, SensorId};

/// Image used when no sensor-specific file exists
pub const FALLBACK_IMAGE: &str = "S00.fits";

/// Pick the source image for one sensor
///
/// A file input is used for every sensor. For a directory, the first
/// existing of `<sensor>.fits`, `<part after first '-'>.fits` and
/// `S00.fits` wins.
pub fn resolve_input(input: &Path, sensor: &SensorId) -> Result<PathBuf, ContractError> {
    if input.is_file() {
        return Ok(input.to_path_buf());
    }

    let missing = || ContractError::MissingInput {
        sensor: sensor.to_string(),
        path: input.to_path_buf(),
    };
    if !input.is_dir() {
        return Err(missing());
    }

    let mut candidates = vec![format!("{sensor}.fits")];
    if let Some((_, rest)) = sensor.split_once('-') {
        candidates.push(format!("{rest}.fits"));
    }
    candidates.push(FALLBACK_IMAGE.to_string());

    candidates
        .into_iter()
        .map(|name| input.join(name))
        .find(|path| path.is_file())
        .ok_or_else(missing)
}
