use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::install::archive;
use crate::install::error::ResolveError;
use crate::install::fingerprint::{fingerprint_file, sha256_hex};
use crate::install::release::{ReleaseClient, ReleaseHost, pinned_asset_name};
use crate::install::request::{InstalledBinary, ResolutionRequest};

/// Resolves a [`ResolutionRequest`] to an executable under `install_dir`.
///
/// The canonical path is `<install_dir>/<variant>`. A `latest` request
/// reuses whatever binary already sits there without touching the network;
/// a pinned version is downloaded and installed on every call.
pub struct ArtifactResolver<C> {
    client: C,
    host: ReleaseHost,
    install_dir: PathBuf,
    deadline: Option<Instant>,
}

/// Download location chosen for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AssetLocation {
    name: String,
    url: String,
}

impl<C: ReleaseClient> ArtifactResolver<C> {
    pub fn new(client: C, install_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            host: ReleaseHost::default(),
            install_dir: install_dir.into(),
            deadline: None,
        }
    }

    pub fn with_host(mut self, host: ReleaseHost) -> Self {
        self.host = host;
        self
    }

    /// No network request is started once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn install_path(&self, request: &ResolutionRequest) -> PathBuf {
        self.install_dir.join(&request.variant)
    }

    pub fn resolve(&self, request: &ResolutionRequest) -> Result<InstalledBinary, ResolveError> {
        let install_path = self.install_path(request);

        if is_present(&install_path)? && request.is_latest() {
            info!(
                path = %install_path.display(),
                version = %request.version,
                "using existing selene binary"
            );
            let sha256 = fingerprint_file(&install_path)?;
            return Ok(InstalledBinary {
                path: install_path,
                already_present: true,
                sha256,
            });
        }

        info!(
            version = %request.version,
            variant = %request.variant,
            repository = %request.repository,
            "downloading selene"
        );
        let asset = self.locate(request)?;
        info!(asset = %asset.name, url = %asset.url, "identified release asset");

        self.check_deadline(&asset.url)?;
        let mut download = NamedTempFile::new().map_err(ResolveError::filesystem(std::env::temp_dir()))?;
        let bytes = self.client.download(&asset.url, download.as_file_mut())?;
        download
            .as_file_mut()
            .flush()
            .map_err(ResolveError::filesystem(download.path()))?;
        debug!(bytes, path = %download.path().display(), "asset downloaded");

        let entry = archive::read_entry(download.path(), &request.variant)?;
        install_executable(&install_path, &entry.bytes)?;
        drop(download);

        let sha256 = sha256_hex(&entry.bytes);
        info!(
            path = %install_path.display(),
            entry = %entry.name,
            sha256 = %sha256,
            "selene installed"
        );

        Ok(InstalledBinary {
            path: install_path,
            already_present: false,
            sha256,
        })
    }

    fn locate(&self, request: &ResolutionRequest) -> Result<AssetLocation, ResolveError> {
        if request.is_latest() {
            let url = self.host.latest_release_url(&request.repository);
            self.check_deadline(&url)?;
            let release = self.client.fetch_release(&url)?;
            let asset = release.find_asset(&request.variant).ok_or_else(|| {
                ResolveError::NotFound(format!(
                    "no asset matching {}-<version>{} in the latest release of {}",
                    request.variant,
                    crate::install::release::PLATFORM_SUFFIX,
                    request.repository
                ))
            })?;
            return Ok(AssetLocation {
                name: asset.name.clone(),
                url: asset.browser_download_url.clone(),
            });
        }

        let name = pinned_asset_name(&request.variant, &request.version);
        let url = self
            .host
            .asset_url(&request.repository, &request.version, &name);
        Ok(AssetLocation { name, url })
    }

    fn check_deadline(&self, url: &str) -> Result<(), ResolveError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ResolveError::network(
                url,
                "timeout reached before the request was sent",
            )),
            _ => Ok(()),
        }
    }
}

/// `Ok(false)` only when the path does not exist; other stat failures are
/// reported instead of being mistaken for absence.
fn is_present(path: &Path) -> Result<bool, ResolveError> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ResolveError::Filesystem {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Write `bytes` next to `path` and atomically move them into place, so an
/// old binary is replaced rather than truncated while possibly in use.
fn install_executable(path: &Path, bytes: &[u8]) -> Result<(), ResolveError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(ResolveError::filesystem(dir))?;

    let mut staged = NamedTempFile::new_in(dir).map_err(ResolveError::filesystem(dir))?;
    staged
        .write_all(bytes)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(ResolveError::filesystem(staged.path()))?;
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        staged
            .as_file()
            .set_permissions(Permissions::from_mode(0o755))
            .map_err(ResolveError::filesystem(staged.path()))?;
    }

    staged
        .persist(path)
        .map_err(|e| ResolveError::Filesystem {
            path: path.to_path_buf(),
            source: e.error,
        })?;
    Ok(())
}
