//! Success checking and output capture on top of a [`CommandRunner`].

use crate::{CommandRunner, InstallError, ShellCommand};
use tracing::{debug, warn};

/// How a command's outcome is interpreted.
///
/// # Example
///
/// ```rust
/// use twinaos_installer::RunOptions;
///
/// // Default: non-zero exit is an error, stdout discarded
/// let opts = RunOptions::default();
/// assert!(opts.check_success);
/// assert!(!opts.capture_output);
///
/// // Cleanup: failures are logged and ignored
/// let opts = RunOptions::best_effort();
/// assert!(!opts.check_success);
///
/// // Read a value from stdout
/// let opts = RunOptions::default().capturing();
/// assert!(opts.capture_output);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Treat a non-zero exit (or a failed launch) as an error.
    ///
    /// Default: `true`
    pub check_success: bool,

    /// Return the process's stdout, trimmed.
    ///
    /// Default: `false`
    pub capture_output: bool,
}

impl RunOptions {
    /// Failures are logged and the output is returned as-is.
    pub const fn best_effort() -> Self {
        Self {
            check_success: false,
            capture_output: false,
        }
    }

    pub const fn capturing(self) -> Self {
        Self {
            capture_output: true,
            ..self
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            check_success: true,
            capture_output: false,
        }
    }
}

/// Outcome of a command that was not treated as a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if killed by a signal or never launched.
    pub exit_code: Option<i32>,
    /// Trimmed stdout when capture was requested.
    pub stdout: Option<String>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run `command` once through `runner`.
///
/// With `check_success` set, a launch failure or non-zero exit becomes
/// [`InstallError::ExternalCommand`] carrying the redacted command line, the
/// exit code and stderr. Without it, the failure is logged at `warn` and the
/// output is returned. There are no retries and no timeout.
///
/// # Example
///
/// ```rust,no_run
/// use twinaos_installer::shell::{run, RunOptions, ShellCommand, SystemRunner};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), twinaos_installer::InstallError> {
///     let uuid = run(
///         &SystemRunner,
///         &ShellCommand::new("blkid").args(["-s", "UUID", "-o", "value", "/dev/sda2"]),
///         RunOptions::default().capturing(),
///     )
///     .await?
///     .stdout;
///     println!("{:?}", uuid);
///     Ok(())
/// }
/// ```
pub async fn run<R>(
    runner: &R,
    command: &ShellCommand,
    options: RunOptions,
) -> Result<CommandOutput, InstallError>
where
    R: CommandRunner + ?Sized,
{
    debug!(command = %command, "running command");

    let raw = match runner.execute(command).await {
        Ok(raw) => raw,
        Err(e) if options.check_success => {
            return Err(InstallError::ExternalCommand {
                command: command.to_string(),
                exit_code: None,
                stderr: e.to_string(),
            });
        }
        Err(e) => {
            warn!(command = %command, error = %e, "could not launch command, ignoring");
            return Ok(CommandOutput::default());
        }
    };

    if !raw.is_success() {
        let stderr = String::from_utf8_lossy(&raw.stderr).to_string();
        if options.check_success {
            return Err(InstallError::ExternalCommand {
                command: command.to_string(),
                exit_code: raw.exit_code,
                stderr,
            });
        }
        warn!(
            command = %command,
            exit_code = ?raw.exit_code,
            stderr = %stderr.trim(),
            "command failed, ignoring"
        );
    }

    let stdout = options
        .capture_output
        .then(|| String::from_utf8_lossy(&raw.stdout).trim().to_string());

    Ok(CommandOutput {
        exit_code: raw.exit_code,
        stdout,
    })
}
