//! Installation state and its single owner.

use crate::install::progress::ProgressSnapshot;
use crate::InstallError;
use chrono::Local;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info};

/// Status shown before the first run.
pub const READY_STATUS: &str = "Ready";

/// Status shown after a successful run.
pub const COMPLETE_STATUS: &str = "Installation complete!";

const COMPLETE_MESSAGE: &str = "TwinaOS installation completed successfully!";

/// How the most recent run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Failed,
}

/// Point-in-time copy of the installer's state.
///
/// Progress never decreases within a run and is 100 after a successful run.
/// The log keeps growing across runs; each entry is `[HH:MM:SS] message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallationState {
    /// True exactly while a run is executing.
    pub active: bool,
    /// Percentage, 0 to 100.
    pub progress: u8,
    /// Current phase or terminal message.
    pub status: String,
    /// Timestamped log entries, oldest first.
    pub log: Vec<String>,
    /// `None` before the first run and while a run is executing.
    pub outcome: Option<RunOutcome>,
}

impl Default for InstallationState {
    fn default() -> Self {
        Self {
            active: false,
            progress: 0,
            status: READY_STATUS.to_string(),
            log: Vec::new(),
            outcome: None,
        }
    }
}

impl InstallationState {
    /// True once a run has ended, successfully or not.
    pub fn is_terminal(&self) -> bool {
        !self.active && self.outcome.is_some()
    }

    pub fn last_message(&self) -> Option<&str> {
        self.log.last().map(String::as_str)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            progress: self.progress,
            status: self.status.clone(),
            message: self
                .last_message()
                .unwrap_or(ProgressSnapshot::EMPTY_LOG_MESSAGE)
                .to_string(),
        }
    }

    fn append(&mut self, message: &str) {
        let entry = format!("[{}] {}", Local::now().format("%H:%M:%S"), message);
        self.log.push(entry);
    }
}

/// Owner of the installation state.
///
/// Wraps the sending half of a watch channel. Every mutation happens inside
/// one `send_modify` call, so readers never see a half-applied update and the
/// lock is never held across command execution.
#[derive(Debug)]
pub(crate) struct SharedState {
    tx: watch::Sender<InstallationState>,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(InstallationState::default());
        Self { tx }
    }

    pub(crate) fn read(&self) -> InstallationState {
        self.tx.borrow().clone()
    }

    pub(crate) fn snapshot(&self) -> ProgressSnapshot {
        self.tx.borrow().snapshot()
    }

    pub(crate) fn is_active(&self) -> bool {
        self.tx.borrow().active
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<InstallationState> {
        self.tx.subscribe()
    }

    /// Atomically claim the run slot.
    ///
    /// Returns false, leaving the state untouched, if a run is active.
    pub(crate) fn try_begin(&self, status: &str) -> bool {
        self.tx.send_if_modified(|state| {
            if state.active {
                return false;
            }
            state.active = true;
            state.progress = 0;
            state.status = status.to_string();
            state.outcome = None;
            true
        })
    }

    pub(crate) fn log(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!("{}", message);
        self.tx.send_modify(|state| state.append(message));
    }

    pub(crate) fn set_status(&self, status: &str) {
        self.tx.send_modify(|state| state.status = status.to_string());
    }

    pub(crate) fn advance_to(&self, checkpoint: u8) {
        self.tx
            .send_modify(|state| state.progress = state.progress.max(checkpoint.min(100)));
    }

    pub(crate) fn complete(&self) {
        info!("{}", COMPLETE_MESSAGE);
        self.tx.send_modify(|state| {
            state.progress = 100;
            state.status = COMPLETE_STATUS.to_string();
            state.append(COMPLETE_MESSAGE);
            state.active = false;
            state.outcome = Some(RunOutcome::Completed);
        });
    }

    pub(crate) fn fail(&self, error: &InstallError) {
        error!(error = %error, "installation failed");
        self.tx.send_modify(|state| {
            state.status = format!("Installation failed: {}", error);
            state.append(&format!("ERROR: {}", error));
            state.active = false;
            state.outcome = Some(RunOutcome::Failed);
        });
    }

    /// Hold the run slot until the returned guard is dropped.
    pub(crate) fn guard(&self) -> RunGuard<'_> {
        RunGuard { state: self }
    }
}

/// Releases the run slot if the run ends without reaching a terminal state,
/// e.g. when the installation task panics.
pub(crate) struct RunGuard<'a> {
    state: &'a SharedState,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.state.is_active() {
            self.state
                .fail(&InstallError::unexpected("installation task ended abruptly"));
        }
    }
}
