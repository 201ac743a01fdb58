//! The execution engine contract.
//!
//! The harness never interprets a fixture. It hands the fixture path and the
//! resolved [`TargetBackend`] to an engine and records what comes back.
//! Engines must not assume any ordering between calls; the suite runner may
//! call `execute` from several threads at once.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use fixa_corpus::TargetBackend;

/// Runs one fixture against one backend.
pub trait ExecutionEngine: Sync {
    fn execute(&self, fixture: &Path, backend: TargetBackend) -> Result<(), EngineError>;
}

impl<F> ExecutionEngine for F
where
    F: Fn(&Path, TargetBackend) -> Result<(), EngineError> + Sync,
{
    fn execute(&self, fixture: &Path, backend: TargetBackend) -> Result<(), EngineError> {
        self(fixture, backend)
    }
}

/// What an engine can report besides success.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The fixture ran and failed.
    #[error(transparent)]
    Failed(#[from] ExecutionFailure),
    /// The run was interrupted; the whole suite stops.
    #[error("execution cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn failed(message: impl Into<String>) -> Self {
        EngineError::Failed(ExecutionFailure::new(message))
    }
}

/// A failed execution with its cause chain, outermost first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionFailure {
    pub message: String,
    pub causes: Vec<String>,
}

impl ExecutionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        ExecutionFailure {
            message: message.into(),
            causes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    /// Capture an error and every `source()` below it.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut failure = ExecutionFailure::new(err.to_string());
        let mut source = err.source();
        while let Some(cause) = source {
            failure.causes.push(cause.to_string());
            source = cause.source();
        }
        failure
    }
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        for cause in &self.causes {
            write!(f, "\n  caused by: {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ExecutionFailure {}

/// Number of trailing stderr lines kept as failure causes.
const STDERR_TAIL: usize = 20;

#[cfg(unix)]
const SIGINT: i32 = 2;

/// Runs an external program once per fixture.
///
/// `{path}` and `{backend}` in the arguments are replaced by the fixture path
/// and backend name. Without a `{path}` placeholder the path is appended as
/// the last argument. The backend is also exported as `FIXA_BACKEND`.
#[derive(Clone, Debug)]
pub struct CommandEngine {
    program: PathBuf,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl CommandEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandEngine {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for one invocation, placeholders expanded.
    pub fn expand_args(&self, fixture: &Path, backend: TargetBackend) -> Vec<String> {
        let path = fixture.display().to_string();
        let mut has_path = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                has_path |= arg.contains("{path}");
                arg.replace("{path}", &path)
                    .replace("{backend}", backend.as_str())
            })
            .collect();
        if !has_path {
            args.push(path);
        }
        args
    }
}

impl ExecutionEngine for CommandEngine {
    fn execute(&self, fixture: &Path, backend: TargetBackend) -> Result<(), EngineError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.expand_args(fixture, backend))
            .env("FIXA_BACKEND", backend.as_str())
            .stdin(Stdio::null());
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|e| {
            ExecutionFailure::new(format!("cannot run '{}'", self.program.display()))
                .with_cause(e.to_string())
        })?;

        if output.status.success() {
            return Ok(());
        }
        if interrupted(output.status) {
            tracing::debug!(fixture = %fixture.display(), "engine process interrupted");
            return Err(EngineError::Cancelled);
        }

        let message = match output.status.code() {
            Some(code) => format!("'{}' exited with code {code}", self.program.display()),
            None => format!("'{}' was terminated by a signal", self.program.display()),
        };
        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
        let tail = &lines[lines.len().saturating_sub(STDERR_TAIL)..];

        Err(EngineError::Failed(ExecutionFailure {
            message,
            causes: tail.iter().map(|l| (*l).to_string()).collect(),
        }))
    }
}

#[cfg(unix)]
fn interrupted(status: ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.signal() == Some(SIGINT)
}

#[cfg(not(unix))]
fn interrupted(_status: ExitStatus) -> bool {
    false
}
