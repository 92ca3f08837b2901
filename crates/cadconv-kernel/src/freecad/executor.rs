//! `freecadcmd` process execution with timeout and output validation.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, error, info};

use crate::error::{KernelError, KernelResult};

/// Captured result of one `freecadcmd` run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutput {
    /// Standard output, empty when capture is disabled.
    pub stdout: String,
    /// Standard error, empty when capture is disabled.
    pub stderr: String,
    /// Wall-clock duration of the process.
    pub elapsed: Duration,
}

/// Runs generated scripts through the FreeCAD console executable.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    executable: PathBuf,
    timeout: Duration,
    capture_output: bool,
}

impl ScriptRunner {
    /// Create a runner for `executable`.
    pub fn new(executable: PathBuf, timeout_seconds: u64, capture_output: bool) -> Self {
        Self {
            executable,
            timeout: Duration::from_secs(timeout_seconds),
            capture_output,
        }
    }

    /// The executable this runner invokes.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Run `script` and wait for it, killing the process on timeout.
    ///
    /// The process is never retried: a failed export is reported as is.
    pub async fn run(&self, script: &Path) -> KernelResult<ExecutionOutput> {
        let script_str = script.to_str().ok_or_else(|| KernelError::InvalidUtf8Path {
            path: script.to_path_buf(),
        })?;

        let mut cmd = Command::new(&self.executable);

        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        let (stdout_cfg, stderr_cfg) = if self.capture_output {
            (Stdio::piped(), Stdio::piped())
        } else {
            (Stdio::null(), Stdio::null())
        };

        cmd.arg(script_str)
            .stdout(stdout_cfg)
            .stderr(stderr_cfg)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(
            executable = %self.executable.display(),
            script = %script.display(),
            timeout_s = self.timeout.as_secs(),
            "Spawning freecadcmd"
        );

        let start = Instant::now();
        let child = cmd.spawn()?;

        // Dropping the pending wait on timeout kills the child.
        tokio::select! {
            result = child.wait_with_output() => {
                let output = result?;
                let elapsed = start.elapsed();
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

                if !stderr.is_empty() {
                    debug!(stderr = %stderr, "freecadcmd stderr output");
                }

                if output.status.success() {
                    info!(elapsed_ms = elapsed.as_millis() as u64, "freecadcmd finished");
                    return Ok(ExecutionOutput { stdout, stderr, elapsed });
                }

                match output.status.code() {
                    Some(code) => {
                        error!(
                            code,
                            elapsed_ms = elapsed.as_millis() as u64,
                            stderr = %stderr,
                            "freecadcmd failed"
                        );
                        Err(KernelError::ProcessFailed { code, stderr, stdout })
                    }
                    None => {
                        error!("freecadcmd terminated by signal");
                        Err(KernelError::ProcessKilled)
                    }
                }
            }
            _ = tokio::time::sleep(self.timeout) => {
                error!(timeout_s = self.timeout.as_secs(), "freecadcmd timed out, killing");
                Err(KernelError::Timeout { timeout_seconds: self.timeout.as_secs() })
            }
        }
    }
}

/// Check that an export produced a non-empty file.
pub fn validate_output(path: &Path) -> KernelResult<u64> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(KernelError::OutputNotCreated {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    if metadata.len() == 0 {
        return Err(KernelError::OutputEmpty {
            path: path.to_path_buf(),
        });
    }
    Ok(metadata.len())
}
