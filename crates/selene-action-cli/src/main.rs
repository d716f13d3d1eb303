use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info};

use selene_action_core::config::ActionConfig;
use selene_action_core::install::HttpReleaseClient;
use selene_action_core::lint;
use selene_action_core::report::render;

mod args;

/// Per-request limit for release lookups and downloads.
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

fn main() -> Result<()> {
    let args = args::Args::parse();
    init_logging(args.quiet, args.debug);

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let config = ActionConfig::from_inputs(args.into_inputs(cwd));
    debug!(resolution = ?config.resolution, working_directory = %config.working_directory.display(), "configuration loaded");

    let http_timeout = config.timeout.map_or(HTTP_TIMEOUT, |t| t.min(HTTP_TIMEOUT));
    let client = HttpReleaseClient::new(config.github_token.clone(), http_timeout)
        .context("failed to build HTTP client")?;

    let mut stdout = io::stdout();
    let outcome = lint(&config, client, &mut stdout).context("failed to install selene")?;

    if config.report_as_annotations {
        for annotation in &outcome.annotations {
            println!("{}", render::workflow_command(annotation));
        }
    }

    if outcome.verdict.succeeded {
        info!(reason = %outcome.verdict.reason, "selene lint passed");
    } else {
        error!(reason = %outcome.verdict.reason, "selene lint failed");
    }

    std::process::exit(outcome.verdict.exit_code());
}

/// Initialize tracing/logging based on CLI flags.
fn init_logging(quiet: bool, debug: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let ansi = std::io::IsTerminal::is_terminal(&std::io::stderr());
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(ansi))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}
