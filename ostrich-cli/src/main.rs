use clap::{Parser, Subcommand, ValueEnum};
use ostrich_core::{OstrichError, Redirect};
use ostrich_runner::{timeout_supported, ProcessRunner, ProcessSpec};
use ostrich_utils::{commonpath, get_safe_path, PathStyle};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::debug;

#[derive(Parser)]
#[command(name = "ostrich")]
#[command(about = "Path, text and process helpers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the longest common sub-path of the given paths
    Commonpath {
        /// Path syntax to apply
        #[arg(short, long, value_enum, default_value_t = StyleArg::Host)]
        style: StyleArg,

        /// Paths to compare
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Turn text into a name that is safe to use as a path component
    SafePath {
        text: String,
    },

    /// Run a command
    Run {
        /// Kill the command after this many seconds
        #[arg(short, long)]
        timeout: Option<f64>,

        /// Fail when the command exits non-zero
        #[arg(long)]
        check: bool,

        /// Capture stdout and stderr instead of passing them through
        #[arg(short, long)]
        capture: bool,

        /// Text written to the command's stdin
        #[arg(short, long)]
        input: Option<String>,

        /// Working directory for the command
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Extra environment variables (KEY=VALUE)
        #[arg(short, long = "env", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,

        /// Print the completed process as JSON
        #[arg(long)]
        json: bool,

        /// Program followed by its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Show what this host supports
    Capabilities,
}

#[derive(Clone, Copy, ValueEnum)]
enum StyleArg {
    Posix,
    Windows,
    Host,
}

impl From<StyleArg> for PathStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Posix => PathStyle::Posix,
            StyleArg::Windows => PathStyle::Windows,
            StyleArg::Host => PathStyle::host(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Commonpath { style, paths } => match commonpath(&paths, style.into()) {
            Ok(common) => println!("{}", common),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Commands::SafePath { text } => match get_safe_path(&text) {
            Ok(safe) => println!("{}", safe),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Commands::Run {
            timeout,
            check,
            capture,
            input,
            cwd,
            env,
            json,
            command,
        } => {
            let spec = build_spec(command, timeout, check, capture, input, cwd, env)?;
            let code = run_command(&spec, json).await?;
            process::exit(code);
        }
        Commands::Capabilities => {
            println!("timeout_supported={}", timeout_supported());
        }
    }

    Ok(())
}

fn build_spec(
    command: Vec<String>,
    timeout: Option<f64>,
    check: bool,
    capture: bool,
    input: Option<String>,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
) -> anyhow::Result<ProcessSpec> {
    let mut parts = command.into_iter();
    let program = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("No command given"))?;

    let mut spec = ProcessSpec::new(program).args(parts).check(check);

    if let Some(secs) = timeout {
        let timeout = Duration::try_from_secs_f64(secs)
            .map_err(|e| anyhow::anyhow!("Invalid timeout {}: {}", secs, e))?;
        spec = spec.with_timeout(timeout);
    }
    if capture {
        spec = spec.stdout(Redirect::Piped).stderr(Redirect::Piped);
    }
    if let Some(input) = input {
        spec = spec.input(input);
    }
    if let Some(dir) = cwd {
        spec = spec.with_working_directory(dir);
    }
    for (key, value) in env {
        spec = spec.env(key, value);
    }
    Ok(spec)
}

/// Run the command and return the exit code this CLI should exit with.
async fn run_command(spec: &ProcessSpec, json: bool) -> anyhow::Result<i32> {
    match ProcessRunner::new().run(spec).await {
        Ok(completed) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&completed)?);
            } else {
                write_captured(completed.stdout.as_deref(), completed.stderr.as_deref())?;
            }
            Ok(exit_status_for(completed.returncode))
        }
        Err(e @ OstrichError::CalledProcess { returncode, .. }) => {
            write_captured(e.stdout(), e.stderr())?;
            eprintln!("Error: {}", e);
            Ok(exit_status_for(Some(returncode)))
        }
        Err(e @ OstrichError::TimeoutExpired { .. }) => {
            write_captured(e.stdout(), e.stderr())?;
            eprintln!("Error: {}", e);
            Ok(124)
        }
        Err(OstrichError::Spawn { program, source }) if source.kind() == ErrorKind::NotFound => {
            Err(explain_not_found(spec, &program, source))
        }
        Err(e) => Err(e.into()),
    }
}

/// Tell a missing program apart from a missing working directory, which the
/// OS reports with the same error kind.
fn explain_not_found(spec: &ProcessSpec, program: &str, source: std::io::Error) -> anyhow::Error {
    let search_dir = match &spec.working_directory {
        Some(dir) => dir.clone(),
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(_) => return anyhow::anyhow!("Failed to spawn '{}': {}", program, source),
        },
    };
    if !search_dir.is_dir() {
        return anyhow::anyhow!(
            "Working directory not found: {} ({})",
            search_dir.display(),
            source
        );
    }
    match which::which_in(program, std::env::var_os("PATH"), &search_dir) {
        Ok(resolved) => {
            debug!(program = %program, resolved = %resolved.display(), "Program exists but failed to start");
            anyhow::anyhow!("Failed to spawn '{}': {}", program, source)
        }
        Err(e) => anyhow::anyhow!("Command not found: {} ({})", program, e),
    }
}

fn write_captured(stdout: Option<&[u8]>, stderr: Option<&[u8]>) -> std::io::Result<()> {
    if let Some(out) = stdout {
        std::io::stdout().write_all(out)?;
    }
    if let Some(err) = stderr {
        std::io::stderr().write_all(err)?;
    }
    Ok(())
}

/// Map a child exit code onto this process's exit code, shell style for signals
fn exit_status_for(returncode: Option<i32>) -> i32 {
    match returncode {
        Some(code) if code < 0 => 128 - code,
        Some(code) => code,
        None => 1,
    }
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}
