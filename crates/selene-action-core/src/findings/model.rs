use serde::{Deserialize, Serialize};

/// Severity reported by the analyzer for one diagnostic.
///
/// The analyzer only documents `Error` and `Warning`; anything else is
/// preserved verbatim so it can still be displayed and annotated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Error,
    Warning,
    Other(String),
}

impl Severity {
    /// Human-readable name, used in annotation titles.
    pub fn display_name(&self) -> String {
        match self {
            Severity::Error => "Error".to_string(),
            Severity::Warning => "Warning".to_string(),
            Severity::Other(raw) => {
                let mut chars = raw.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

impl From<String> for Severity {
    fn from(raw: String) -> Self {
        if raw.eq_ignore_ascii_case("error") {
            Severity::Error
        } else if raw.eq_ignore_ascii_case("warning") {
            Severity::Warning
        } else {
            Severity::Other(raw)
        }
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => "Error".to_string(),
            Severity::Warning => "Warning".to_string(),
            Severity::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// One structured diagnostic decoded from the analyzer's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    /// Lint name, e.g. `unused_variable`.
    pub code: String,
    pub message: String,
    /// Path exactly as the analyzer printed it.
    pub file: String,
    pub line: u32,
    pub column: u32,
}
