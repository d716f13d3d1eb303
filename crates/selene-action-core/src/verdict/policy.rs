//! Verdict policy for an analyzer run.
//!
//! Responsibilities:
//! - Reduce the exit status and the collected annotations to pass/fail
//! - Keep rule precedence explicit and auditable
//! - Provide the process exit code for the wrapper
//!
//! Non-responsibilities:
//! - Running the analyzer or interpreting its output lines
//! - Emitting annotations
//!
//! The policy is an ordered rule list; the first rule whose condition
//! holds decides and no later rule is consulted:
//!
//!   1. any failure annotation            -> fail
//!   2. exit 0, no warning that must fail -> pass
//!   3. exit 0, warnings, fail-on-warnings -> fail
//!   4. exit 1, warnings tolerated         -> pass
//!   5. exit 1, fail-on-warnings           -> fail
//!   6. anything else                      -> fail (abnormal termination)
//!
//! Rule 1 outranks a clean exit status: parse errors can surface only as
//! structured findings while the analyzer still exits 0 or 1.

use crate::process::runner::ExecutionResult;
use crate::report::annotation::{Annotation, Tally};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub succeeded: bool,
    pub reason: String,
    /// 1-based position of the deciding rule.
    pub rule: usize,
}

impl Verdict {
    /// Exit code for the wrapper process.
    pub fn exit_code(&self) -> i32 {
        if self.succeeded { 0 } else { 1 }
    }
}

/// Inputs every rule may inspect.
#[derive(Debug, Clone)]
struct Evidence {
    /// Exit code of a normally terminated run; `None` otherwise.
    normal_exit: Option<i32>,
    termination: String,
    tally: Tally,
    fail_on_warnings: bool,
}

struct Rule {
    applies: fn(&Evidence) -> bool,
    succeeded: bool,
    reason: fn(&Evidence) -> String,
}

static POLICY: [Rule; 6] = [
    Rule {
        applies: has_failures,
        succeeded: false,
        reason: critical_errors,
    },
    Rule {
        applies: clean_exit_accepted,
        succeeded: true,
        reason: clean_exit,
    },
    Rule {
        applies: clean_exit_with_blocking_warnings,
        succeeded: false,
        reason: warnings_on_clean_exit,
    },
    Rule {
        applies: warnings_exit_tolerated,
        succeeded: true,
        reason: warnings_tolerated,
    },
    Rule {
        applies: warnings_exit_blocking,
        succeeded: false,
        reason: warnings_exit,
    },
    Rule {
        applies: always,
        succeeded: false,
        reason: abnormal_termination,
    },
];

fn has_failures(e: &Evidence) -> bool {
    e.tally.failures > 0
}

fn clean_exit_accepted(e: &Evidence) -> bool {
    e.normal_exit == Some(0) && !(e.fail_on_warnings && e.tally.warnings > 0)
}

fn clean_exit_with_blocking_warnings(e: &Evidence) -> bool {
    e.normal_exit == Some(0) && e.fail_on_warnings && e.tally.warnings > 0
}

fn warnings_exit_tolerated(e: &Evidence) -> bool {
    e.normal_exit == Some(1) && !e.fail_on_warnings
}

fn warnings_exit_blocking(e: &Evidence) -> bool {
    e.normal_exit == Some(1) && e.fail_on_warnings
}

fn always(_: &Evidence) -> bool {
    true
}

fn critical_errors(e: &Evidence) -> String {
    format!(
        "critical errors reported ({} failure annotation(s))",
        e.tally.failures
    )
}

fn clean_exit(e: &Evidence) -> String {
    if e.tally.warnings > 0 {
        format!(
            "analyzer exited cleanly; {} warning(s) tolerated",
            e.tally.warnings
        )
    } else {
        "analyzer exited cleanly".to_string()
    }
}

fn warnings_on_clean_exit(e: &Evidence) -> String {
    format!(
        "warnings present, fail-on-warnings enabled ({} warning annotation(s))",
        e.tally.warnings
    )
}

fn warnings_tolerated(_: &Evidence) -> String {
    "warnings present (exit code 1), fail-on-warnings disabled".to_string()
}

fn warnings_exit(_: &Evidence) -> String {
    "warnings present (exit code 1), fail-on-warnings enabled".to_string()
}

fn abnormal_termination(e: &Evidence) -> String {
    format!("abnormal analyzer termination: {}", e.termination)
}

/// Decide the run's outcome from the terminated process and all annotations.
///
/// Determinism guarantees:
/// - Same inputs produce an identical `Verdict`
/// - Annotation order does not matter, only per-level counts
pub fn decide(result: &ExecutionResult, annotations: &[Annotation], fail_on_warnings: bool) -> Verdict {
    let evidence = Evidence {
        normal_exit: if result.is_normal() {
            result.exit_code
        } else {
            None
        },
        termination: match (&result.termination_error, result.exit_code) {
            (Some(err), _) => err.to_string(),
            (None, Some(code)) => format!("exit code {code}"),
            (None, None) => "no exit status".to_string(),
        },
        tally: Tally::of(annotations),
        fail_on_warnings,
    };

    let (index, rule) = POLICY
        .iter()
        .enumerate()
        .find(|(_, rule)| (rule.applies)(&evidence))
        .unwrap_or((POLICY.len() - 1, &POLICY[POLICY.len() - 1]));

    Verdict {
        succeeded: rule.succeeded,
        reason: (rule.reason)(&evidence),
        rule: index + 1,
    }
}
