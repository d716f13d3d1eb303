//! Line-level wire format of the analyzer's JSON display style.
//!
//! Each diagnostic is printed as one self-contained JSON object:
//!
//! ```text
//! {"severity":"Warning","code":"unused_variable","message":"...",
//!  "primary_label":{"filename":"src/init.lua","span":{"start_line":3,"start_column":7}}}
//! ```
//!
//! Extra fields (secondary labels, notes, byte offsets) are ignored.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::findings::model::{Finding, Severity};

#[derive(Debug, Error)]
#[error("line is not a valid finding record: {source}")]
pub struct DecodeError {
    #[from]
    source: serde_json::Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFinding {
    severity: Severity,
    code: String,
    message: String,
    primary_label: PrimaryLabel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PrimaryLabel {
    filename: String,
    span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Span {
    start_line: u32,
    start_column: u32,
}

impl From<WireFinding> for Finding {
    fn from(wire: WireFinding) -> Self {
        Finding {
            severity: wire.severity,
            code: wire.code,
            message: wire.message,
            file: wire.primary_label.filename,
            line: wire.primary_label.span.start_line,
            column: wire.primary_label.span.start_column,
        }
    }
}

impl From<&Finding> for WireFinding {
    fn from(finding: &Finding) -> Self {
        WireFinding {
            severity: finding.severity.clone(),
            code: finding.code.clone(),
            message: finding.message.clone(),
            primary_label: PrimaryLabel {
                filename: finding.file.clone(),
                span: Span {
                    start_line: finding.line,
                    start_column: finding.column,
                },
            },
        }
    }
}

/// Whether a line is shaped like a single structured record.
pub fn looks_structured(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('{') && trimmed.ends_with('}')
}

/// Decode a structured line into a [`Finding`].
///
/// Callers are expected to check [`looks_structured`] first; this function
/// does not special-case plain text and simply reports it as malformed.
pub fn decode_line(line: &str) -> Result<Finding, DecodeError> {
    let wire: WireFinding = serde_json::from_str(line.trim())?;
    Ok(wire.into())
}

/// Encode a finding back into its single-line wire representation.
pub fn encode(finding: &Finding) -> Result<String, serde_json::Error> {
    serde_json::to_string(&WireFinding::from(finding))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELENE_LINE: &str = r#"{"severity":"Warning","code":"unused_variable","message":"count is assigned a value, but never used","primary_label":{"filename":"src/init.lua","span":{"start":52,"start_line":3,"start_column":7,"end":57,"end_line":3,"end_column":12},"message":""},"notes":[],"secondary_labels":[]}"#;

    #[test]
    fn decodes_analyzer_output_ignoring_extra_fields() {
        assert!(looks_structured(SELENE_LINE));

        let finding = decode_line(SELENE_LINE).expect("valid record");
        assert_eq!(finding.severity, Severity::Warning);
        assert_eq!(finding.code, "unused_variable");
        assert_eq!(finding.file, "src/init.lua");
        assert_eq!(finding.line, 3);
        assert_eq!(finding.column, 7);
    }

    #[test]
    fn structured_detection_uses_trimmed_line() {
        assert!(looks_structured("  {\"a\":1}\r"));
        assert!(!looks_structured("not-json-at-all"));
        assert!(!looks_structured("{ unterminated"));
        assert!(!looks_structured("Results:"));
    }

    #[test]
    fn bracketed_garbage_fails_to_decode() {
        let line = "{not valid json}";
        assert!(looks_structured(line));
        assert!(decode_line(line).is_err());
    }

    #[test]
    fn record_missing_primary_label_fails_to_decode() {
        let line = r#"{"type":"Summary","errors":0,"warnings":2,"parse_errors":0}"#;
        assert!(decode_line(line).is_err());
    }

    #[test]
    fn encoded_finding_decodes_to_same_value() {
        let original = Finding {
            severity: Severity::Error,
            code: "parse_error".into(),
            message: "unexpected token `end`".into(),
            file: "lib/util.lua".into(),
            line: 41,
            column: 1,
        };

        let line = encode(&original).unwrap();
        assert!(looks_structured(&line));
        assert_eq!(decode_line(&line).unwrap(), original);
    }
}
