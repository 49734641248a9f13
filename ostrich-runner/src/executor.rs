use crate::capability::timeout_supported;
use crate::collector::StreamCollector;
use crate::process::{ProcessSpec, RunnerConfig};
use ostrich_core::{CompletedProcess, OstrichError, Redirect, Result};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Runs child processes described by a [`ProcessSpec`]
#[derive(Clone, Default)]
pub struct ProcessRunner {
    config: RunnerConfig,
}

/// Pipe handlers of a running child
struct Streams {
    stdin: Option<JoinHandle<()>>,
    stdout: Option<StreamCollector>,
    stderr: Option<StreamCollector>,
}

impl Streams {
    async fn finish(&mut self) -> std::io::Result<()> {
        if let Some(stdout) = self.stdout.as_mut() {
            stdout.finish().await?;
        }
        if let Some(stderr) = self.stderr.as_mut() {
            stderr.finish().await?;
        }
        Ok(())
    }

    async fn finish_within(&mut self, grace: Duration) {
        if let Some(stdin) = self.stdin.take() {
            stdin.abort();
        }
        if let Some(stdout) = self.stdout.as_mut() {
            stdout.finish_within(grace).await;
        }
        if let Some(stderr) = self.stderr.as_mut() {
            stderr.finish_within(grace).await;
        }
    }

    fn into_output(self) -> (Option<Vec<u8>>, Option<Vec<u8>>) {
        (
            self.stdout.map(StreamCollector::into_bytes),
            self.stderr.map(StreamCollector::into_bytes),
        )
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the process described by `spec` to completion.
    ///
    /// Captured streams are drained while waiting, so a chatty child cannot
    /// block on a full pipe. The child is killed and reaped before any error
    /// is returned, and also if the returned future is dropped early.
    ///
    /// # Errors
    /// - `InvalidArgument` for a contradictory spec (nothing is spawned)
    /// - `Spawn` if the program cannot be started
    /// - `TimeoutExpired` with the output captured before the kill
    /// - `CalledProcess` for a non-zero exit when `spec.check` is set
    pub async fn run(&self, spec: &ProcessSpec) -> Result<CompletedProcess> {
        spec.validate()?;

        let cmd = spec.command_line();
        let started = Instant::now();
        let mut child = self.spawn(spec)?;

        info!(
            program = %spec.program,
            pid = ?child.id(),
            timeout_ms = ?spec.timeout.map(|t| t.as_millis()),
            "Spawned process"
        );

        let mut streams = Streams {
            stdin: child
                .stdin
                .take()
                .map(|stdin| spawn_input_writer(stdin, spec.input.clone().unwrap_or_default())),
            stdout: child.stdout.take().map(|out| StreamCollector::spawn("stdout", out)),
            stderr: child.stderr.take().map(|err| StreamCollector::spawn("stderr", err)),
        };

        let timeout = match spec.timeout {
            Some(timeout) if timeout_supported() => Some(timeout),
            Some(timeout) => {
                warn!(
                    program = %spec.program,
                    timeout_ms = timeout.as_millis() as u64,
                    "Timeouts are not supported on this host, ignoring"
                );
                None
            }
            None => None,
        };

        let waited = match timeout {
            Some(timeout) => {
                let outcome =
                    tokio::time::timeout(timeout, wait_and_drain(&mut child, &mut streams)).await;
                match outcome {
                    Ok(waited) => waited,
                    Err(_) => {
                        warn!(
                            program = %spec.program,
                            timeout_ms = timeout.as_millis() as u64,
                            "Process timed out, killing"
                        );
                        kill_and_reap(&mut child).await;
                        streams.finish_within(self.config.drain_grace).await;
                        let (stdout, stderr) = streams.into_output();
                        return Err(OstrichError::TimeoutExpired {
                            cmd,
                            timeout,
                            stdout,
                            stderr,
                        });
                    }
                }
            }
            None => wait_and_drain(&mut child, &mut streams).await,
        };

        let status = match waited {
            Ok(status) => status,
            Err(e) => {
                kill_and_reap(&mut child).await;
                streams.finish_within(self.config.drain_grace).await;
                return Err(OstrichError::Io(e));
            }
        };

        let returncode = exit_code(status);
        let duration = started.elapsed();
        let (stdout, stderr) = streams.into_output();

        info!(
            program = %spec.program,
            exit_code = ?returncode,
            duration_ms = duration.as_millis() as u64,
            "Process completed"
        );

        let completed = CompletedProcess::new(cmd, returncode)
            .with_output(stdout, stderr)
            .with_duration(duration);

        if spec.check {
            completed.check_returncode()?;
        }
        Ok(completed)
    }

    fn spawn(&self, spec: &ProcessSpec) -> Result<Child> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(stdio(spec.stdin_redirect()))
            .stdout(stdio(spec.stdout))
            .stderr(stdio(spec.stderr))
            .kill_on_drop(true);

        if spec.env_clear {
            command.env_clear();
        }
        command.envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(dir) = &spec.working_directory {
            command.current_dir(dir);
        }

        command.spawn().map_err(|source| OstrichError::Spawn {
            program: spec.program.clone(),
            source,
        })
    }
}

/// Run `spec` with a default [`ProcessRunner`].
pub async fn run(spec: &ProcessSpec) -> Result<CompletedProcess> {
    ProcessRunner::new().run(spec).await
}

/// Blocking variant of [`run`] for synchronous callers.
///
/// Builds a private current-thread runtime, so it must not be called from
/// inside an async context.
pub fn run_blocking(spec: &ProcessSpec) -> Result<CompletedProcess> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(spec))
}

async fn wait_and_drain(child: &mut Child, streams: &mut Streams) -> std::io::Result<ExitStatus> {
    let status = child.wait().await?;
    streams.finish().await?;
    Ok(status)
}

async fn kill_and_reap(child: &mut Child) {
    // `kill` sends SIGKILL and then waits, so the child is reaped here.
    if let Err(e) = child.kill().await {
        debug!(error = %e, "Kill failed, process already exited");
        let _ = child.wait().await;
    }
}

fn spawn_input_writer(mut stdin: ChildStdin, input: Vec<u8>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let written = async {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        }
        .await;
        match written {
            Ok(()) => {}
            // The child may exit without reading all of its input.
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Err(e) => debug!(error = %e, "Writing process input failed"),
        }
    })
}

fn stdio(redirect: Redirect) -> Stdio {
    match redirect {
        Redirect::Inherit => Stdio::inherit(),
        Redirect::Piped => Stdio::piped(),
        Redirect::Null => Stdio::null(),
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.code().or_else(|| status.signal().map(|signal| -signal))
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> Option<i32> {
    status.code()
}
