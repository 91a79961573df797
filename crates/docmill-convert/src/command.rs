//! Converter command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{ConvertError, ConvertResult};

/// Maximum bytes of stderr carried in an exit-failure diagnostic.
const STDERR_EXCERPT_MAX: usize = 2048;

/// Builder for headless `soffice` conversion commands.
///
/// The argument contract is fixed: headless mode, target format, output
/// directory, one input file.
#[derive(Debug, Clone)]
pub struct SofficeCommand {
    /// Converter binary (name or path)
    program: PathBuf,
    /// Input file path
    input: PathBuf,
    /// Directory the converter writes output files into
    output_dir: PathBuf,
    /// Conversion target (`format` or `format:filter_options`)
    target: String,
}

impl SofficeCommand {
    /// Create a new conversion command.
    pub fn new(
        input: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            program: default_soffice(),
            input: input.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            target: target.into(),
        }
    }

    /// Override the converter binary.
    pub fn with_program(mut self, program: impl AsRef<Path>) -> Self {
        self.program = program.as_ref().to_path_buf();
        self
    }

    /// Converter binary this command will run.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        vec![
            "--headless".to_string(),
            "--convert-to".to_string(),
            self.target.clone(),
            "--outdir".to_string(),
            self.output_dir.to_string_lossy().to_string(),
            self.input.to_string_lossy().to_string(),
        ]
    }
}

/// Output streams captured from a successful converter run.
#[derive(Debug, Default)]
pub struct ConvertOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runner for converter commands with deadline enforcement.
///
/// The deadline races the child process: whichever resolves first wins,
/// and a fired deadline kills the process with a non-catchable signal.
#[derive(Debug, Default)]
pub struct ConvertRunner {
    timeout: Option<Duration>,
}

impl ConvertRunner {
    /// Create a new runner with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the wall-clock deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run a converter command to completion.
    ///
    /// Resolves exactly once per invocation: with captured output on exit
    /// code 0, or with a spawn, exit-failure, or timeout error.
    pub async fn run(&self, cmd: &SofficeCommand) -> ConvertResult<ConvertOutput> {
        which::which(cmd.program())
            .map_err(|_| ConvertError::ConverterNotFound(cmd.program().display().to_string()))?;

        let args = cmd.build_args();
        debug!("Running converter: {} {}", cmd.program().display(), args.join(" "));

        let mut child = Command::new(cmd.program())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ConvertError::Spawn)?;

        let stdout = child.stdout.take().expect("stdout not captured");
        let stderr = child.stderr.take().expect("stderr not captured");

        // Drain both streams concurrently so the child never blocks on a
        // full pipe buffer.
        let stdout_task = tokio::spawn(read_to_end(stdout));
        let stderr_task = tokio::spawn(read_to_end(stderr));

        let status = if let Some(timeout) = self.timeout {
            match tokio::time::timeout(timeout, child.wait()).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(
                        "Converter exceeded {} ms deadline, killing process",
                        timeout.as_millis()
                    );
                    child.kill().await.ok();
                    stdout_task.abort();
                    stderr_task.abort();
                    return Err(ConvertError::Timeout(timeout.as_millis() as u64));
                }
            }
        } else {
            child.wait().await?
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(ConvertOutput { stdout, stderr })
        } else {
            Err(ConvertError::ExitFailure {
                code: status.code(),
                stderr: excerpt(&stderr),
            })
        }
    }
}

async fn read_to_end(mut reader: impl AsyncReadExt + Unpin) -> String {
    let mut buf = String::new();
    reader.read_to_string(&mut buf).await.ok();
    buf
}

/// Truncate diagnostics to a bounded excerpt.
fn excerpt(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.len() <= STDERR_EXCERPT_MAX {
        return trimmed.to_string();
    }
    trimmed.chars().take(STDERR_EXCERPT_MAX).collect()
}

fn default_soffice() -> PathBuf {
    std::env::var("SOFFICE_BIN")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("soffice"))
}

/// Check if the converter binary is available.
pub fn check_soffice() -> ConvertResult<PathBuf> {
    let program = default_soffice();
    which::which(&program)
        .map_err(|_| ConvertError::ConverterNotFound(program.display().to_string()))
}
