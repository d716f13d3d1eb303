//! Run configuration.
//!
//! [`ActionInputs`] holds the raw values as the CI host supplies them.
//! [`ActionConfig::from_inputs`] applies path defaulting exactly once; every
//! core component then reads the resulting immutable [`ActionConfig`].

use std::path::PathBuf;
use std::time::Duration;

use crate::install::ResolutionRequest;
use crate::util::paths::join_clean;
use crate::{DEFAULT_REPOSITORY, DEFAULT_VARIANT, LATEST_VERSION};

/// Default directory the analyzer is installed into.
pub const DEFAULT_INSTALL_DIR: &str = "/usr/local/bin";

#[derive(Debug, Clone)]
pub struct ActionInputs {
    pub workspace_root: PathBuf,
    pub working_directory: PathBuf,
    pub config_path: Option<PathBuf>,
    pub lint_path: String,
    /// Extra analyzer arguments, whitespace separated.
    pub selene_args: String,
    pub fail_on_warnings: bool,
    pub report_as_annotations: bool,
    pub selene_version: String,
    pub selene_repo: String,
    pub selene_variant: String,
    pub github_token: Option<String>,
    pub install_dir: PathBuf,
    pub timeout: Option<Duration>,
}

impl Default for ActionInputs {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("."),
            working_directory: PathBuf::from("."),
            config_path: None,
            lint_path: ".".to_string(),
            selene_args: String::new(),
            fail_on_warnings: false,
            report_as_annotations: true,
            selene_version: LATEST_VERSION.to_string(),
            selene_repo: DEFAULT_REPOSITORY.to_string(),
            selene_variant: DEFAULT_VARIANT.to_string(),
            github_token: None,
            install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActionConfig {
    /// Root that annotation paths are expressed relative to.
    pub workspace_root: PathBuf,
    /// Directory the analyzer runs in; already joined under the workspace.
    pub working_directory: PathBuf,
    /// Analyzer config file; already joined under the working directory.
    pub config_path: Option<PathBuf>,
    /// Positional lint target, passed through untouched.
    pub lint_path: String,
    pub extra_args: Vec<String>,
    pub fail_on_warnings: bool,
    pub report_as_annotations: bool,
    pub resolution: ResolutionRequest,
    pub github_token: Option<String>,
    pub install_dir: PathBuf,
    /// Deadline for the whole resolve, run and decide sequence.
    pub timeout: Option<Duration>,
}

impl ActionConfig {
    pub fn from_inputs(inputs: ActionInputs) -> Self {
        let working_directory = join_clean(&inputs.workspace_root, &inputs.working_directory);
        let config_path = inputs
            .config_path
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| join_clean(&working_directory, &p));

        Self {
            workspace_root: inputs.workspace_root,
            working_directory,
            config_path,
            lint_path: inputs.lint_path,
            extra_args: inputs
                .selene_args
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            fail_on_warnings: inputs.fail_on_warnings,
            report_as_annotations: inputs.report_as_annotations,
            resolution: ResolutionRequest::new(
                inputs.selene_version,
                inputs.selene_repo,
                inputs.selene_variant,
            ),
            github_token: inputs.github_token.filter(|t| !t.is_empty()),
            install_dir: inputs.install_dir,
            timeout: inputs.timeout,
        }
    }
}
