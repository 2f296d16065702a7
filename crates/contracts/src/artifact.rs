//! ArtifactPath - naming contract shared with destination-side tooling
//!
//! `YYYY-MM-DD/YYYYMMDD<seq:05>/<camera>_O_YYYYMMDD_<seq:05>-<sensor>.fits[.<ext>]`

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Camera whose file naming is simulated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraTag {
    /// Auxiliary telescope
    #[serde(rename = "AT")]
    At,
    /// Commissioning camera
    #[serde(rename = "CC")]
    Cc,
    /// Main camera
    #[default]
    #[serde(rename = "MC")]
    Mc,
}

impl CameraTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::At => "AT",
            Self::Cc => "CC",
            Self::Mc => "MC",
        }
    }
}

impl fmt::Display for CameraTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CameraTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AT" => Ok(Self::At),
            "CC" => Ok(Self::Cc),
            "MC" => Ok(Self::Mc),
            other => Err(format!("unknown camera tag '{other}' (expected AT, CC or MC)")),
        }
    }
}

/// Observation day, fixed once per unit run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObsDay(NaiveDate);

impl ObsDay {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// `YYYY-MM-DD`, used for the top-level directory
    pub fn dashed(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// `YYYYMMDD`, used inside directory and file names
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }
}

/// Relative destination path of one exposure's artifact
///
/// Always uses `/` separators regardless of platform, since it is also the
/// remote key/URL suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactPath {
    relative: String,
    sequence: u64,
}

impl ArtifactPath {
    /// Base file extension of every artifact
    pub const EXTENSION: &'static str = "fits";

    /// Build the path for one exposure
    pub fn new(obs_day: ObsDay, sequence: u64, camera: CameraTag, sensor: &str) -> Self {
        let day = obs_day.compact();
        let relative = format!(
            "{dashed}/{day}{sequence:05}/{camera}_O_{day}_{sequence:05}-{sensor}.{ext}",
            dashed = obs_day.dashed(),
            ext = Self::EXTENSION,
        );
        Self { relative, sequence }
    }

    /// Same artifact with an extra suffix (e.g. `gz`) appended
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self {
            relative: format!("{}.{}", self.relative, suffix),
            sequence: self.sequence,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.relative
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Directory part (`YYYY-MM-DD/YYYYMMDDnnnnn`)
    pub fn parent(&self) -> &str {
        self.relative
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("")
    }

    pub fn file_name(&self) -> &str {
        self.relative
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.relative)
    }

    /// Resolve against a local root using platform separators
    pub fn to_local(&self, root: &Path) -> PathBuf {
        self.relative
            .split('/')
            .fold(root.to_path_buf(), |path, part| path.join(part))
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative)
    }
}

impl AsRef<str> for ArtifactPath {
    fn as_ref(&self) -> &str {
        &self.relative
    }
}
