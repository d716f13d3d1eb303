use std::path::PathBuf;

use crate::LATEST_VERSION;

/// Which analyzer build to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    /// `latest` or an explicit release tag such as `0.27.1` or `v0.27.1`.
    pub version: String,
    /// `owner/name` of the hosting repository.
    pub repository: String,
    /// Executable and asset base name.
    pub variant: String,
}

impl ResolutionRequest {
    pub fn new(
        version: impl Into<String>,
        repository: impl Into<String>,
        variant: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            repository: repository.into(),
            variant: variant.into(),
        }
    }

    pub fn is_latest(&self) -> bool {
        self.version == LATEST_VERSION
    }
}

/// An executable analyzer on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledBinary {
    pub path: PathBuf,
    /// True when an existing binary was reused without any download.
    pub already_present: bool,
    /// Hex-encoded SHA-256 of the executable bytes.
    pub sha256: String,
}
