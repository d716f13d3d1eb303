use std::io::{Read, Write};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;

use crate::TOOL_NAME;
use crate::install::error::ResolveError;

/// Suffix shared by every Linux release asset of the analyzer.
pub const PLATFORM_SUFFIX: &str = "-linux.zip";

/// Release listings larger than this are rejected rather than buffered.
const MAX_LISTING_BYTES: u64 = 10 << 20;

/// Bytes of an error response body kept for the error message.
const ERROR_BODY_EXCERPT: u64 = 1024;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl Release {
    /// First asset named `<variant>-...-linux.zip`.
    pub fn find_asset(&self, variant: &str) -> Option<&ReleaseAsset> {
        let prefix = format!("{variant}-");
        self.assets
            .iter()
            .find(|a| a.name.starts_with(&prefix) && a.name.ends_with(PLATFORM_SUFFIX))
    }
}

/// Asset file name for a pinned release tag; a leading `v` is not part of it.
pub fn pinned_asset_name(variant: &str, version: &str) -> String {
    let version = version.strip_prefix('v').unwrap_or(version);
    format!("{variant}-{version}{PLATFORM_SUFFIX}")
}

/// Where releases are listed and downloaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseHost {
    pub api_base: String,
    pub download_base: String,
}

impl Default for ReleaseHost {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            download_base: "https://github.com".to_string(),
        }
    }
}

impl ReleaseHost {
    pub fn latest_release_url(&self, repository: &str) -> String {
        format!(
            "{}/repos/{repository}/releases/latest",
            self.api_base.trim_end_matches('/')
        )
    }

    pub fn asset_url(&self, repository: &str, tag: &str, asset: &str) -> String {
        format!(
            "{}/{repository}/releases/download/{tag}/{asset}",
            self.download_base.trim_end_matches('/')
        )
    }
}

/// Transport used by the resolver. Implemented over HTTP in production and
/// by in-memory fakes in tests.
pub trait ReleaseClient {
    /// Fetch and decode a release listing.
    fn fetch_release(&self, url: &str) -> Result<Release, ResolveError>;

    /// Stream the body at `url` into `sink`, returning the byte count.
    fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, ResolveError>;
}

pub struct HttpReleaseClient {
    client: Client,
    token: Option<String>,
}

impl HttpReleaseClient {
    /// `token` is sent as a bearer token on release listing requests only.
    pub fn new(token: Option<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(format!("{TOOL_NAME}/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            token: token.filter(|t| !t.is_empty()),
        })
    }
}

impl ReleaseClient for HttpReleaseClient {
    fn fetch_release(&self, url: &str) -> Result<Release, ResolveError> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| ResolveError::network(url, e))?;
        let response = ensure_success(url, response)?;

        let mut body = Vec::new();
        response
            .take(MAX_LISTING_BYTES)
            .read_to_end(&mut body)
            .map_err(|e| ResolveError::network(url, e))?;
        debug!(url, bytes = body.len(), "fetched release listing");

        serde_json::from_slice(&body)
            .map_err(|e| ResolveError::network(url, format!("malformed release listing: {e}")))
    }

    fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, ResolveError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ResolveError::network(url, e))?;
        let mut response = ensure_success(url, response)?;

        response
            .copy_to(sink)
            .map_err(|e| ResolveError::network(url, e))
    }
}

fn ensure_success(url: &str, response: Response) -> Result<Response, ResolveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut excerpt = String::new();
    let _ = response.take(ERROR_BODY_EXCERPT).read_to_string(&mut excerpt);
    Err(ResolveError::network(
        url,
        format!("status {status}, body: {}", excerpt.trim()),
    ))
}
