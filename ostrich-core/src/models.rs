use crate::error::{OstrichError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How a standard stream of a child process is wired up
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Redirect {
    /// Share the parent's stream
    #[default]
    Inherit,
    /// Connect a pipe; on stdout/stderr this captures the stream
    Piped,
    /// Discard (or read nothing, for stdin)
    Null,
}

impl Redirect {
    pub fn is_piped(self) -> bool {
        self == Redirect::Piped
    }
}

/// A process that has finished running
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletedProcess {
    /// Program followed by its arguments
    pub args: Vec<String>,
    /// Exit code, negative for signal termination, `None` if none was recorded
    pub returncode: Option<i32>,
    /// Captured standard output, `None` if not captured
    #[serde(with = "lossy_text")]
    pub stdout: Option<Vec<u8>>,
    /// Captured standard error, `None` if not captured
    #[serde(with = "lossy_text")]
    pub stderr: Option<Vec<u8>>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl CompletedProcess {
    pub fn new(args: Vec<String>, returncode: Option<i32>) -> Self {
        Self {
            args,
            returncode,
            stdout: None,
            stderr: None,
            duration: Duration::ZERO,
        }
    }

    pub fn with_output(mut self, stdout: Option<Vec<u8>>, stderr: Option<Vec<u8>>) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Fail with `CalledProcess` if the recorded exit code is non-zero.
    ///
    /// A missing exit code is not treated as a failure.
    pub fn check_returncode(&self) -> Result<()> {
        match self.returncode {
            Some(code) if code != 0 => Err(OstrichError::CalledProcess {
                returncode: code,
                cmd: self.args.clone(),
                stdout: self.stdout.clone(),
                stderr: self.stderr.clone(),
            }),
            _ => Ok(()),
        }
    }

    pub fn success(&self) -> bool {
        self.returncode == Some(0)
    }

    pub fn stdout_text(&self) -> Option<String> {
        self.stdout
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn stderr_text(&self) -> Option<String> {
        self.stderr
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

impl fmt::Display for CompletedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompletedProcess(args={:?}, returncode=", self.args)?;
        match self.returncode {
            Some(code) => write!(f, "{}", code)?,
            None => write!(f, "None")?,
        }
        if let Some(stdout) = &self.stdout {
            write!(f, ", stdout={:?}", String::from_utf8_lossy(stdout))?;
        }
        if let Some(stderr) = &self.stderr {
            write!(f, ", stderr={:?}", String::from_utf8_lossy(stderr))?;
        }
        write!(f, ")")
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Captured output as (lossily decoded) UTF-8 text instead of a byte array
mod lossy_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_str(&String::from_utf8_lossy(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let text = Option::<String>::deserialize(deserializer)?;
        Ok(text.map(String::into_bytes))
    }
}
