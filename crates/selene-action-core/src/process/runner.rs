//! Launching the analyzer and draining its output.
//!
//! stdout and stderr are read by two reader threads while the calling
//! thread echoes and classifies stdout lines as they arrive. The analyzer
//! can fill either pipe first, so neither stream may wait for the other to
//! finish. Readers are never joined: processes forked by the analyzer can
//! hold the pipes open after it has been killed.

use std::io::{self, BufReader, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::findings::Finding;
use crate::process::invocation::InvocationSpec;
use crate::process::parse::{OutputParser, RawLine, Stream, for_each_line};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const STDERR_GRACE: Duration = Duration::from_millis(100);

/// Why the analyzer run did not end in a normal outcome.
///
/// Exit codes 0 (clean) and 1 (issues found) are normal; everything here
/// leads to a failing verdict.
#[derive(Debug, Error)]
pub enum TerminationError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for analyzer: {0}")]
    Wait(#[source] io::Error),

    #[error("analyzer exited with code {0}")]
    AbnormalExit(i32),

    #[error("analyzer was terminated by {0}")]
    Signalled(String),

    #[error("analyzer did not finish before the deadline")]
    TimedOut,
}

#[derive(Debug)]
pub struct ExecutionResult {
    /// `None` when the process never started or ended without a code.
    pub exit_code: Option<i32>,
    pub termination_error: Option<TerminationError>,
}

impl ExecutionResult {
    pub fn from_status(status: ExitStatus) -> Self {
        let termination_error = match status.code() {
            Some(0 | 1) => None,
            Some(code) => Some(TerminationError::AbnormalExit(code)),
            None => Some(TerminationError::Signalled(status.to_string())),
        };
        Self {
            exit_code: status.code(),
            termination_error,
        }
    }

    pub fn failed(error: TerminationError) -> Self {
        Self {
            exit_code: None,
            termination_error: Some(error),
        }
    }

    pub fn is_normal(&self) -> bool {
        self.termination_error.is_none()
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self.termination_error, Some(TerminationError::TimedOut))
    }
}

/// Everything observed during one analyzer run.
#[derive(Debug)]
pub struct RunOutput {
    /// stdout lines in emission order, followed by stderr lines.
    pub lines: Vec<RawLine>,
    pub findings: Vec<Finding>,
    pub stderr: String,
    pub result: ExecutionResult,
}

/// Run the analyzer to completion.
///
/// stdout is echoed line by line to `echo` while it is produced. If
/// `deadline` passes first the child is killed and the result is
/// [`TerminationError::TimedOut`], without waiting for its pipes to close.
pub fn run(
    spec: &InvocationSpec,
    echo: &mut dyn Write,
    deadline: Option<Instant>,
) -> RunOutput {
    if expired(deadline) {
        return not_started(TerminationError::TimedOut);
    }

    info!(
        dir = %spec.working_directory.display(),
        command = %spec.command_line(),
        "executing selene"
    );

    let spawned = Command::new(&spec.executable)
        .args(&spec.arguments)
        .current_dir(&spec.working_directory)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(source) => {
            return not_started(TerminationError::Spawn {
                program: spec.executable.display().to_string(),
                source,
            });
        }
    };

    let stdout = child.stdout.take();
    let (line_tx, lines_rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let Some(stdout) = stdout else { return };
        let read = for_each_line(BufReader::new(stdout), |text| {
            let _ = line_tx.send(text);
        });
        if let Err(err) = read {
            error!(error = %err, "error reading selene stdout");
        }
    });

    let stderr = child.stderr.take();
    let (stderr_tx, stderr_rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let mut bytes = Vec::new();
        if let Some(mut stderr) = stderr {
            if let Err(err) = stderr.read_to_end(&mut bytes) {
                error!(error = %err, "error reading selene stderr");
            }
        }
        let _ = stderr_tx.send(String::from_utf8_lossy(&bytes).into_owned());
    });

    let mut parser = OutputParser::new();
    drain_stdout(&lines_rx, &mut parser, echo, deadline);
    let result = wait(&mut child, deadline);
    let stderr_text = collect_stderr(&stderr_rx, result.is_timed_out(), deadline);

    if !stderr_text.trim().is_empty() {
        warn!("selene stderr:\n{}", stderr_text.trim_end());
    }
    debug!(
        exit_code = ?result.exit_code,
        malformed = parser.malformed(),
        findings = parser.findings().len(),
        "selene finished"
    );

    let (mut lines, findings) = parser.into_parts();
    lines.extend(stderr_text.lines().map(|text| RawLine {
        stream: Stream::Secondary,
        text: text.to_string(),
    }));

    RunOutput {
        lines,
        findings,
        stderr: stderr_text,
        result,
    }
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

/// Echo and classify stdout lines until the stream ends or the deadline
/// passes.
fn drain_stdout(
    lines: &Receiver<String>,
    parser: &mut OutputParser,
    echo: &mut dyn Write,
    deadline: Option<Instant>,
) {
    loop {
        let received = match deadline {
            Some(d) if Instant::now() >= d => return,
            Some(d) => lines.recv_timeout(d.saturating_duration_since(Instant::now())),
            None => lines.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(text) => {
                parser.accept(text, echo);
            }
            Err(_) => return,
        }
    }
}

/// stderr as collected by its reader. After a kill the reader gets a short
/// grace period and whatever it has not finished by then is dropped.
fn collect_stderr(stderr: &Receiver<String>, timed_out: bool, deadline: Option<Instant>) -> String {
    let received = match deadline {
        _ if timed_out => stderr.recv_timeout(STDERR_GRACE).map_err(|_| ()),
        Some(d) => stderr
            .recv_timeout(d.saturating_duration_since(Instant::now()))
            .map_err(|_| ()),
        None => stderr.recv().map_err(|_| ()),
    };
    received.unwrap_or_default()
}

fn not_started(error: TerminationError) -> RunOutput {
    error!(error = %error, "selene did not run");
    RunOutput {
        lines: Vec::new(),
        findings: Vec::new(),
        stderr: String::new(),
        result: ExecutionResult::failed(error),
    }
}

fn wait(child: &mut Child, deadline: Option<Instant>) -> ExecutionResult {
    let Some(deadline) = deadline else {
        return match child.wait() {
            Ok(status) => ExecutionResult::from_status(status),
            Err(err) => ExecutionResult::failed(TerminationError::Wait(err)),
        };
    };

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return ExecutionResult::from_status(status),
            Ok(None) if Instant::now() >= deadline => return kill(child),
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(err) => return ExecutionResult::failed(TerminationError::Wait(err)),
        }
    }
}

fn kill(child: &mut Child) -> ExecutionResult {
    warn!(pid = child.id(), "deadline reached, killing selene");
    if let Err(err) = child.kill() {
        warn!(error = %err, "failed to kill selene");
    }
    let _ = child.wait();
    ExecutionResult::failed(TerminationError::TimedOut)
}
