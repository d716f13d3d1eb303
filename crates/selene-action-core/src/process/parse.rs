use std::io::{self, BufRead, Write};

use tracing::warn;

use crate::findings::{Finding, decode_line, looks_structured};

/// Which analyzer stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub stream: Stream,
    pub text: String,
}

/// How a primary-stream line was interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    Finding,
    /// Looked structured but did not decode; kept as text.
    Malformed,
    Text,
}

/// Classifies primary-stream lines, echoing each one verbatim.
///
/// Every line is retained in arrival order regardless of class; findings
/// accumulate in the order their lines appeared.
#[derive(Debug, Default)]
pub struct OutputParser {
    lines: Vec<RawLine>,
    findings: Vec<Finding>,
    malformed: usize,
    echo_failed: bool,
}

impl OutputParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one line (without its terminator) and retain it.
    pub fn feed(&mut self, text: String) -> LineClass {
        let class = if looks_structured(&text) {
            match decode_line(&text) {
                Ok(finding) => {
                    self.findings.push(finding);
                    LineClass::Finding
                }
                Err(err) => {
                    warn!(error = %err, line = %text, "failed to decode structured selene output");
                    self.malformed += 1;
                    LineClass::Malformed
                }
            }
        } else {
            LineClass::Text
        };

        self.lines.push(RawLine {
            stream: Stream::Primary,
            text,
        });
        class
    }

    /// Echo `text` to `echo`, then classify and retain it.
    ///
    /// A failing echo sink is logged once and skipped afterwards so the
    /// stream keeps being drained.
    pub fn accept(&mut self, text: String, echo: &mut dyn Write) -> LineClass {
        if !self.echo_failed {
            if let Err(err) = writeln!(echo, "{text}").and_then(|()| echo.flush()) {
                warn!(error = %err, "console echo failed; continuing without echo");
                self.echo_failed = true;
            }
        }
        self.feed(text)
    }

    /// Read `reader` to the end, echoing and classifying each line.
    /// Read errors end consumption.
    pub fn consume<R: BufRead>(&mut self, reader: R, echo: &mut dyn Write) -> io::Result<()> {
        for_each_line(reader, |text| {
            self.accept(text, echo);
        })
    }

    pub fn lines(&self) -> &[RawLine] {
        &self.lines
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Number of structured-looking lines that failed to decode.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    pub fn into_parts(self) -> (Vec<RawLine>, Vec<Finding>) {
        (self.lines, self.findings)
    }
}

/// Split `reader` into lines, lossily decoded and without terminators.
pub fn for_each_line<R: BufRead>(mut reader: R, mut f: impl FnMut(String)) -> io::Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        f(strip_line_ending(&String::from_utf8_lossy(&buf)).to_string());
    }
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::Severity;

    const WARNING: &str = r#"{"severity":"Warning","code":"global_usage","message":"use of global `foo` is not allowed","primary_label":{"filename":"init.lua","span":{"start_line":1,"start_column":0}}}"#;
    const ERROR: &str = r#"{"severity":"Error","code":"parse_error","message":"unexpected token","primary_label":{"filename":"bad.lua","span":{"start_line":9,"start_column":4}}}"#;

    #[test]
    fn plain_text_never_becomes_a_finding() {
        let mut parser = OutputParser::new();
        assert_eq!(parser.feed("not-json-at-all".into()), LineClass::Text);

        assert!(parser.findings().is_empty());
        assert_eq!(parser.lines()[0].text, "not-json-at-all");
        assert_eq!(parser.lines()[0].stream, Stream::Primary);
    }

    #[test]
    fn malformed_record_is_kept_as_text() {
        let mut parser = OutputParser::new();
        assert_eq!(parser.feed("{not valid json}".into()), LineClass::Malformed);
        assert_eq!(parser.feed(WARNING.into()), LineClass::Finding);

        assert_eq!(parser.malformed(), 1);
        assert_eq!(parser.lines().len(), 2);
        assert_eq!(parser.lines()[0].text, "{not valid json}");
        assert_eq!(parser.findings().len(), 1);
    }

    #[test]
    fn consume_echoes_every_line_in_order() {
        let input = format!("{WARNING}\nResults:\r\n{{broken}}\n{ERROR}\n1 errors\n0 parse errors");
        let mut echo = Vec::new();

        let mut parser = OutputParser::new();
        parser.consume(input.as_bytes(), &mut echo).unwrap();

        let echoed = String::from_utf8(echo).unwrap();
        let expected = format!("{WARNING}\nResults:\n{{broken}}\n{ERROR}\n1 errors\n0 parse errors\n");
        assert_eq!(echoed, expected);

        let (lines, findings) = parser.into_parts();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1].text, "Results:");

        let severities: Vec<_> = findings.iter().map(|f| f.severity.clone()).collect();
        assert_eq!(severities, vec![Severity::Warning, Severity::Error]);
    }

    #[test]
    fn consume_tolerates_invalid_utf8() {
        let mut parser = OutputParser::new();
        parser
            .consume(&b"caf\xe9 ok\n"[..], &mut io::sink())
            .unwrap();

        assert_eq!(parser.lines()[0].text, "caf\u{fffd} ok");
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn consume_keeps_draining_when_echo_fails() {
        let input = format!("{WARNING}\n{ERROR}\n");
        let mut parser = OutputParser::new();

        parser.consume(input.as_bytes(), &mut BrokenSink).unwrap();

        assert_eq!(parser.findings().len(), 2);
    }
}
