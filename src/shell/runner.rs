//! The process boundary.

use crate::ShellCommand;
use async_trait::async_trait;
use futures::future::join;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Raw result of running a process to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    /// Exit code, or `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl RawOutput {
    /// A successful exit with the given stdout.
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// A failed exit with the given code and stderr.
    pub fn failure(exit_code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Executes external commands.
///
/// Implementations run the command exactly once and report how it ended.
/// They do not interpret exit codes; that is done by [`run`](crate::shell::run).
/// An `Err` means the process could not be started or waited on.
///
/// # Example
///
/// A runner that pretends every command succeeds:
///
/// ```rust
/// use async_trait::async_trait;
/// use twinaos_installer::{CommandRunner, RawOutput, ShellCommand};
///
/// struct AlwaysOk;
///
/// #[async_trait]
/// impl CommandRunner for AlwaysOk {
///     async fn execute(&self, _command: &ShellCommand) -> std::io::Result<RawOutput> {
///         Ok(RawOutput::success(""))
///     }
/// }
/// ```
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn execute(&self, command: &ShellCommand) -> std::io::Result<RawOutput>;
}

/// Runs commands as child processes of the installer.
///
/// Stdout and stderr are piped and collected. Stdin is piped only when the
/// command carries input, and is closed after the input has been written.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn execute(&self, command: &ShellCommand) -> std::io::Result<RawOutput> {
        let mut cmd = Command::new(command.get_program());
        cmd.args(command.get_args())
            .kill_on_drop(true)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if command.get_stdin().is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let mut child = cmd.spawn()?;

        let stdin = child.stdin.take();
        let feed = async move {
            match (command.get_stdin(), stdin) {
                (Some(input), Some(mut stdin)) => {
                    stdin.write_all(input.as_bytes()).await?;
                    stdin.shutdown().await
                }
                _ => Ok(()),
            }
        };

        // Input is written while output is drained so neither side can fill
        // its pipe and stall the other.
        let (fed, output) = join(feed, child.wait_with_output()).await;
        let output = output?;
        match fed {
            // The child exited without reading all of its input; its exit
            // status and stderr say why.
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
            Err(e) => return Err(e),
            Ok(()) => {}
        }

        Ok(RawOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
