// Process specification and the runner's own settings

use ostrich_core::{OstrichError, Redirect, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything needed to launch one child process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
    pub env: Vec<(String, String)>,
    pub env_clear: bool,
    pub working_directory: Option<PathBuf>,
    pub input: Option<Vec<u8>>,
    pub stdin: Option<Redirect>,
    pub stdout: Redirect,
    pub stderr: Redirect,
    pub check: bool,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
            env: Vec::new(),
            env_clear: false,
            working_directory: None,
            input: None,
            stdin: None,
            stdout: Redirect::Inherit,
            stderr: Redirect::Inherit,
            check: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Start the child with an empty environment plus whatever `env` adds
    pub fn env_clear(mut self) -> Self {
        self.env_clear = true;
        self
    }

    pub fn with_working_directory<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.working_directory = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Bytes written to the child's stdin, which is then closed
    pub fn input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn stdin(mut self, redirect: Redirect) -> Self {
        self.stdin = Some(redirect);
        self
    }

    pub fn stdout(mut self, redirect: Redirect) -> Self {
        self.stdout = redirect;
        self
    }

    pub fn stderr(mut self, redirect: Redirect) -> Self {
        self.stderr = redirect;
        self
    }

    pub fn capture_stdout(self) -> Self {
        self.stdout(Redirect::Piped)
    }

    pub fn capture_stderr(self) -> Self {
        self.stderr(Redirect::Piped)
    }

    pub fn check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    /// Program followed by its arguments
    pub fn command_line(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Reject contradictory settings before anything is spawned.
    pub fn validate(&self) -> Result<()> {
        if self.program.is_empty() {
            return Err(OstrichError::invalid_argument("program must not be empty"));
        }
        if self.input.is_some() && self.stdin.is_some() {
            return Err(OstrichError::invalid_argument(
                "stdin and input arguments may not both be used.",
            ));
        }
        Ok(())
    }

    /// Effective stdin wiring: a pipe when input is given
    pub(crate) fn stdin_redirect(&self) -> Redirect {
        match (&self.input, self.stdin) {
            (Some(_), _) => Redirect::Piped,
            (None, Some(redirect)) => redirect,
            (None, None) => Redirect::Inherit,
        }
    }
}

/// Settings of the runner itself, shared across runs
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// How long to keep reading output after a timed-out child was killed
    pub drain_grace: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            drain_grace: Duration::from_secs(1),
        }
    }
}
