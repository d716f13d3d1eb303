use std::path::PathBuf;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};

use selene_action_core::config::{ActionInputs, DEFAULT_INSTALL_DIR};
use selene_action_core::{DEFAULT_REPOSITORY, DEFAULT_VARIANT, LATEST_VERSION};

/// Every input can also be supplied through the CI host's `INPUT_*`
/// environment variables; flags win over the environment.
#[derive(Debug, Parser)]
#[command(
    name = "selene-action",
    version,
    about = "Run the selene Lua linter in CI and turn its findings into annotations"
)]
pub struct Args {
    /// Directory to run selene in, relative to the workspace
    #[arg(long, env = "INPUT_WORKING-DIRECTORY", default_value = ".")]
    pub working_directory: PathBuf,

    /// selene.toml to use, relative to the working directory
    #[arg(long, env = "INPUT_CONFIG-PATH")]
    pub config_path: Option<PathBuf>,

    /// File or directory to lint
    #[arg(long, env = "INPUT_LINT-PATH", default_value = ".")]
    pub lint_path: String,

    /// Extra arguments passed to selene, whitespace separated
    #[arg(long, env = "INPUT_SELENE-ARGS", default_value = "", allow_hyphen_values = true)]
    pub selene_args: String,

    /// Fail the run when warnings are reported
    #[arg(
        long,
        env = "INPUT_FAIL-ON-WARNINGS",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub fail_on_warnings: bool,

    /// Emit findings as workflow annotations
    #[arg(
        long,
        env = "INPUT_REPORT-AS-ANNOTATIONS",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "true",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub report_as_annotations: bool,

    /// selene release tag, or `latest`
    #[arg(long, env = "INPUT_SELENE-VERSION", default_value = LATEST_VERSION)]
    pub selene_version: String,

    /// Repository selene releases are downloaded from
    #[arg(long, env = "INPUT_SELENE-REPO", default_value = DEFAULT_REPOSITORY)]
    pub selene_repo: String,

    /// Executable and asset base name
    #[arg(long, env = "INPUT_SELENE-VARIANT", default_value = DEFAULT_VARIANT)]
    pub selene_variant: String,

    /// Workspace root annotation paths are relative to [default: current directory]
    #[arg(long, env = "GITHUB_WORKSPACE")]
    pub github_workspace: Option<PathBuf>,

    /// Token for release lookups
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Directory selene is installed into
    #[arg(long, env = "INPUT_INSTALL-DIR", default_value = DEFAULT_INSTALL_DIR)]
    pub install_dir: PathBuf,

    /// Give up and fail after this many seconds
    #[arg(long, env = "INPUT_TIMEOUT-SECS")]
    pub timeout_secs: Option<u64>,

    /// Only log warnings and errors
    #[arg(long, short, conflicts_with = "debug")]
    pub quiet: bool,

    /// Log debug details
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    pub fn into_inputs(self, current_dir: PathBuf) -> ActionInputs {
        ActionInputs {
            workspace_root: self.github_workspace.unwrap_or(current_dir),
            working_directory: self.working_directory,
            config_path: self.config_path,
            lint_path: self.lint_path,
            selene_args: self.selene_args,
            fail_on_warnings: self.fail_on_warnings,
            report_as_annotations: self.report_as_annotations,
            selene_version: self.selene_version,
            selene_repo: self.selene_repo,
            selene_variant: self.selene_variant,
            github_token: self.github_token,
            install_dir: self.install_dir,
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}
