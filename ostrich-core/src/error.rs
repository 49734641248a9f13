use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OstrichError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    TypeMismatch(String),

    #[error("Decode error: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error("Command '{}' returned non-zero exit status {returncode}", display_cmd(.cmd))]
    CalledProcess {
        returncode: i32,
        cmd: Vec<String>,
        stdout: Option<Vec<u8>>,
        stderr: Option<Vec<u8>>,
    },

    #[error("Command '{}' timed out after {} seconds", display_cmd(.cmd), .timeout.as_secs_f64())]
    TimeoutExpired {
        cmd: Vec<String>,
        timeout: Duration,
        stdout: Option<Vec<u8>>,
        stderr: Option<Vec<u8>>,
    },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OstrichError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        OstrichError::InvalidArgument(message.into())
    }

    /// Captured standard output carried by a process failure, if any.
    pub fn stdout(&self) -> Option<&[u8]> {
        match self {
            OstrichError::CalledProcess { stdout, .. }
            | OstrichError::TimeoutExpired { stdout, .. } => stdout.as_deref(),
            _ => None,
        }
    }

    /// Captured standard error carried by a process failure, if any.
    pub fn stderr(&self) -> Option<&[u8]> {
        match self {
            OstrichError::CalledProcess { stderr, .. }
            | OstrichError::TimeoutExpired { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, OstrichError::TimeoutExpired { .. })
    }
}

fn display_cmd(cmd: &[String]) -> String {
    cmd.join(" ")
}

pub type Result<T> = std::result::Result<T, OstrichError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_called_process_display() {
        let err = OstrichError::CalledProcess {
            returncode: 47,
            cmd: vec!["sh".to_string(), "-c".to_string(), "exit 47".to_string()],
            stdout: None,
            stderr: None,
        };
        assert_eq!(
            err.to_string(),
            "Command 'sh -c exit 47' returned non-zero exit status 47"
        );
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_timeout_display_and_output() {
        let err = OstrichError::TimeoutExpired {
            cmd: vec!["sleep".to_string(), "10".to_string()],
            timeout: Duration::from_millis(500),
            stdout: Some(b"partial".to_vec()),
            stderr: None,
        };
        assert_eq!(err.to_string(), "Command 'sleep 10' timed out after 0.5 seconds");
        assert!(err.is_timeout());
        assert_eq!(err.stdout(), Some(&b"partial"[..]));
        assert_eq!(err.stderr(), None);
    }

    #[test]
    fn test_invalid_argument_message() {
        let err = OstrichError::invalid_argument("Can't mix absolute and relative paths");
        assert_eq!(err.to_string(), "Can't mix absolute and relative paths");
        assert_eq!(err.stdout(), None);
    }

    #[test]
    fn test_io_error_converts() {
        let err: OstrichError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, OstrichError::Io(_)));
        assert_eq!(err.to_string(), "IO error: boom");
    }
}
