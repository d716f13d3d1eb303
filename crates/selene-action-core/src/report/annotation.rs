use std::path::Path;

use tracing::warn;

use crate::findings::{Finding, Severity};
use crate::util::paths::{join_clean, relative_to};

/// Annotation severity understood by the CI host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Notice,
    Warning,
    Failure,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Notice => "notice",
            Level::Warning => "warning",
            Level::Failure => "failure",
        }
    }
}

impl From<&Severity> for Level {
    fn from(severity: &Severity) -> Self {
        match severity {
            Severity::Error => Level::Failure,
            Severity::Warning => Level::Warning,
            Severity::Other(_) => Level::Notice,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inline CI annotation, derived from exactly one finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Path relative to the workspace root when it can be expressed so.
    pub file: String,
    pub line: u32,
    pub title: String,
    pub message: String,
    pub level: Level,
}

/// Annotation title for a finding, e.g. `Selene Warning (unused_variable)`.
pub fn title(finding: &Finding) -> String {
    format!("Selene {} ({})", finding.severity.display_name(), finding.code)
}

/// Convert a finding into an annotation.
///
/// Relative finding paths are resolved against `working_directory` and then
/// expressed relative to `workspace_root`. When that is impossible the
/// resolved path is used as is; mapping never fails.
pub fn map_finding(finding: &Finding, working_directory: &Path, workspace_root: &Path) -> Annotation {
    let resolved = join_clean(working_directory, Path::new(&finding.file));

    let file = match relative_to(&resolved, workspace_root) {
        Ok(relative) => relative,
        Err(err) => {
            warn!(error = %err, "using unnormalized path for annotation");
            resolved
        }
    };

    Annotation {
        file: file.display().to_string(),
        line: finding.line,
        title: title(finding),
        message: finding.message.clone(),
        level: Level::from(&finding.severity),
    }
}

/// Annotation counts per level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub failures: usize,
    pub warnings: usize,
    pub notices: usize,
}

impl Tally {
    pub fn of(annotations: &[Annotation]) -> Self {
        annotations.iter().fold(Tally::default(), |mut tally, a| {
            match a.level {
                Level::Failure => tally.failures += 1,
                Level::Warning => tally.warnings += 1,
                Level::Notice => tally.notices += 1,
            }
            tally
        })
    }
}
