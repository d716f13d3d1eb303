use std::io::Write;
use std::time::Instant;

use tracing::info;

use crate::config::ActionConfig;
use crate::install::{ArtifactResolver, InstalledBinary, ReleaseClient, ResolveError};
use crate::process::{InvocationSpec, RunOutput, run};
use crate::report::{Annotation, Tally, map_finding};
use crate::verdict::{Verdict, decide};

/// Everything one lint run produced.
#[derive(Debug)]
pub struct LintOutcome {
    pub binary: InstalledBinary,
    pub invocation: InvocationSpec,
    pub output: RunOutput,
    /// One per finding, in finding order.
    pub annotations: Vec<Annotation>,
    pub verdict: Verdict,
}

/// Resolve the analyzer, run it over the configured target and decide.
///
/// Only resolution failures are returned as errors. Anything that goes
/// wrong with the analyzer process itself ends up in a failing verdict.
/// The configured timeout covers resolution as well as the run: no
/// download starts once it has passed.
pub fn lint<C: ReleaseClient>(
    config: &ActionConfig,
    client: C,
    echo: &mut dyn Write,
) -> Result<LintOutcome, ResolveError> {
    let deadline = config.timeout.map(|t| Instant::now() + t);

    let resolver = ArtifactResolver::new(client, &config.install_dir).with_deadline(deadline);
    let binary = resolver.resolve(&config.resolution)?;

    let invocation = InvocationSpec::build(&binary.path, config);
    let output = run(&invocation, echo, deadline);

    let annotations: Vec<Annotation> = output
        .findings
        .iter()
        .map(|f| map_finding(f, &invocation.working_directory, &config.workspace_root))
        .collect();

    let verdict = decide(&output.result, &annotations, config.fail_on_warnings);

    let tally = Tally::of(&annotations);
    info!(
        exit_code = ?output.result.exit_code,
        failures = tally.failures,
        warnings = tally.warnings,
        notices = tally.notices,
        rule = verdict.rule,
        "selene run evaluated"
    );

    Ok(LintOutcome {
        binary,
        invocation,
        output,
        annotations,
        verdict,
    })
}
