//! The installation engine.
//!
//! [`Installer`] owns the installation state, accepts at most one run at a
//! time, and drives the [`Step`] pipeline on a background task.

use crate::install::preflight::check_tools;
use crate::install::progress::{progress_stream, ProgressSnapshot, ProgressStream};
use crate::install::state::{InstallationState, SharedState};
use crate::install::steps::{Step, StepContext};
use crate::shell::{run, RunOptions};
use crate::{
    CommandRunner, InstallConfig, InstallError, InstallerOptions, ShellCommand, SystemRunner,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, info_span, Instrument};

/// Drives installations and exposes their progress.
///
/// Cloning is cheap; clones share the same state, so an HTTP layer can hand
/// one to every request handler.
///
/// # Example
///
/// ```rust,no_run
/// use futures::StreamExt;
/// use twinaos_installer::{InstallConfig, Installer, InstallerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), twinaos_installer::InstallError> {
///     let installer = Installer::new(InstallerOptions::default());
///     installer.preflight()?;
///
///     installer
///         .start(InstallConfig {
///             language: "en".to_string(),
///             timezone: "UTC".to_string(),
///             disk: "/dev/sda".to_string(),
///             username: "alice".to_string(),
///             password: "secret".to_string(),
///         })
///         .await?;
///
///     let mut progress = installer.subscribe();
///     while let Some(snapshot) = progress.next().await {
///         println!("{:>3}% {} | {}", snapshot.progress, snapshot.status, snapshot.message);
///     }
///     Ok(())
/// }
/// ```
pub struct Installer<R = SystemRunner> {
    inner: Arc<Inner<R>>,
}

struct Inner<R> {
    runner: R,
    options: InstallerOptions,
    state: SharedState,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Installer<SystemRunner> {
    /// Create an installer that runs real system commands.
    pub fn new(options: InstallerOptions) -> Self {
        Self::with_runner(SystemRunner, options)
    }
}

impl Default for Installer<SystemRunner> {
    fn default() -> Self {
        Self::new(InstallerOptions::default())
    }
}

impl<R> Clone for Installer<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> Installer<R>
where
    R: CommandRunner + 'static,
{
    /// Create an installer that executes commands through `runner`.
    pub fn with_runner(runner: R, options: InstallerOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                runner,
                options,
                state: SharedState::new(),
                task: Mutex::new(None),
            }),
        }
    }

    /// Options this installer was created with.
    pub fn options(&self) -> &InstallerOptions {
        &self.inner.options
    }

    /// Start an installation in the background.
    ///
    /// Returns as soon as the run has been accepted. Fails with
    /// [`InstallError::InvalidConfig`] if `config` does not validate and with
    /// [`InstallError::AlreadyRunning`] if a run is active; in both cases the
    /// state is left untouched.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(&self, config: InstallConfig) -> Result<(), InstallError> {
        config.validate()?;

        // Held from the claim until the handle is stored, so a fast run
        // followed by another start cannot swap handles.
        let mut task = self.inner.task.lock().await;

        let first = Step::PrepareDisk;
        if !self.inner.state.try_begin(first.status()) {
            return Err(InstallError::AlreadyRunning);
        }

        info!(disk = %config.disk, user = %config.username, "installation accepted");

        let inner = Arc::clone(&self.inner);
        let span = info_span!("installation", disk = %config.disk);
        let handle = tokio::spawn(async move { inner.run_installation(config).await }.instrument(span));

        *task = Some(handle);
        Ok(())
    }

    /// Copy of the full state, including the log.
    pub fn current_state(&self) -> InstallationState {
        self.inner.state.read()
    }

    /// Progress, status and latest log line, as sent to observers.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.inner.state.snapshot()
    }

    /// Whether a run is in progress.
    pub fn is_active(&self) -> bool {
        self.inner.state.is_active()
    }

    /// Stream progress snapshots until the current run ends.
    ///
    /// See [`ProgressStream`]. Every call returns an independent stream.
    pub fn subscribe(&self) -> ProgressStream {
        progress_stream(self.inner.state.subscribe(), self.inner.options.tick)
    }

    /// Wait for the task of the most recent run to finish.
    ///
    /// Returns immediately if no run was started. The run's own outcome is
    /// in [`current_state`](Self::current_state); this only fails if the task
    /// itself panicked or was cancelled.
    pub async fn wait(&self) -> Result<(), InstallError> {
        let handle = self.inner.task.lock().await.take();
        match handle {
            Some(handle) => handle
                .await
                .map_err(|e| InstallError::unexpected(format!("installation task failed: {}", e))),
            None => Ok(()),
        }
    }

    /// Check that the host has every tool the pipeline invokes.
    pub fn preflight(&self) -> Result<(), InstallError> {
        check_tools(self.inner.options.required_tools())
    }

    /// Reboot the machine, typically after a successful installation.
    ///
    /// Refused with [`InstallError::AlreadyRunning`] while a run is active.
    /// A [`start`](Self::start) issued while the reboot command runs waits
    /// for it to return.
    pub async fn reboot(&self) -> Result<(), InstallError> {
        let _task = self.inner.task.lock().await;
        if self.inner.state.is_active() {
            return Err(InstallError::AlreadyRunning);
        }

        let (program, args) = self
            .inner
            .options
            .reboot_command
            .split_first()
            .ok_or_else(|| InstallError::unexpected("no reboot command configured"))?;

        self.inner.state.log("Rebooting system...");
        let command = ShellCommand::new(program.as_str()).args(args.iter().cloned());
        run(&self.inner.runner, &command, RunOptions::default()).await?;
        Ok(())
    }
}

impl<R> Inner<R>
where
    R: CommandRunner,
{
    async fn run_installation(&self, config: InstallConfig) {
        // Releases the run slot even if a step panics.
        let _guard = self.state.guard();

        let ctx = StepContext {
            runner: &self.runner,
            options: &self.options,
            config: &config,
            state: &self.state,
        };

        match run_steps(&ctx).await {
            Ok(()) => self.state.complete(),
            Err(e) => self.state.fail(&e),
        }
    }
}

async fn run_steps<R>(ctx: &StepContext<'_, R>) -> Result<(), InstallError>
where
    R: CommandRunner + ?Sized,
{
    for step in Step::all() {
        ctx.state.set_status(step.status());
        ctx.state.log(step.announcement(ctx.config));
        step.run(ctx)
            .instrument(info_span!("step", name = step.name()))
            .await?;
        ctx.state.advance_to(step.checkpoint());
    }
    Ok(())
}
