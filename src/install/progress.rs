//! Progress reporting for installation runs.
//!
//! [`ProgressSnapshot`] is what observers see: progress, status and the most
//! recent log line. [`progress_stream`] turns the installer's state channel
//! into a lazy stream of snapshots, one per tick, that ends after the run
//! reaches a terminal state.

use crate::install::state::InstallationState;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// A point-in-time view of an installation, as sent to observers.
///
/// Serializes as `{"progress":..,"status":..,"message":..}`.
///
/// # Example
///
/// ```rust
/// use twinaos_installer::ProgressSnapshot;
///
/// let snapshot = ProgressSnapshot {
///     progress: 60,
///     status: "Configuring system...".to_string(),
///     message: "[12:00:01] Generating fstab...".to_string(),
/// };
/// assert!(!snapshot.is_complete());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Percentage, 0 to 100.
    pub progress: u8,
    /// Current phase or terminal message.
    pub status: String,
    /// Most recent log entry.
    pub message: String,
}

impl ProgressSnapshot {
    /// `message` used while the log is still empty.
    pub const EMPTY_LOG_MESSAGE: &'static str = "Starting...";

    pub fn is_complete(&self) -> bool {
        self.progress == 100
    }
}

/// Shortest interval between snapshots.
pub(crate) const MIN_TICK: Duration = Duration::from_millis(1);

/// Stream of snapshots produced by [`Installer::subscribe`](crate::Installer::subscribe).
pub type ProgressStream = BoxStream<'static, ProgressSnapshot>;

/// Build a snapshot stream over `rx`, emitting once per `tick`.
///
/// The first snapshot is emitted immediately on first poll. While no run has
/// ended, the latest state is sampled at every tick; ticks a slow consumer
/// misses are skipped, not queued. Once the state is terminal (or the
/// installer is gone) one final snapshot is emitted and the stream ends.
///
/// A zero `tick` is raised to [`MIN_TICK`].
pub(crate) fn progress_stream(
    rx: watch::Receiver<InstallationState>,
    tick: Duration,
) -> ProgressStream {
    struct Cursor {
        rx: watch::Receiver<InstallationState>,
        ticker: Option<Interval>,
    }

    let tick = tick.max(MIN_TICK);
    let cursor = Cursor { rx, ticker: None };

    stream::unfold(Some(cursor), move |cursor| async move {
        let mut cursor = cursor?;

        // Created on first poll so the stream can be built outside a runtime.
        let ticker = cursor.ticker.get_or_insert_with(|| {
            let mut ticker = interval(tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });
        ticker.tick().await;

        let closed = cursor.rx.has_changed().is_err();
        let (snapshot, terminal) = {
            let state = cursor.rx.borrow_and_update();
            (state.snapshot(), state.is_terminal())
        };

        if terminal || closed {
            Some((snapshot, None))
        } else {
            Some((snapshot, Some(cursor)))
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::state::RunOutcome;

    fn running(progress: u8, status: &str) -> InstallationState {
        InstallationState {
            active: true,
            progress,
            status: status.to_string(),
            log: vec![format!("[10:00:00] {}", status)],
            outcome: None,
        }
    }

    #[test]
    fn test_snapshot_serializes_wire_shape() {
        let snapshot = ProgressSnapshot {
            progress: 20,
            status: "Installing base system...".to_string(),
            message: "[10:00:00] Installing Debian base system...".to_string(),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["progress"], 20);
        assert_eq!(json["status"], "Installing base system...");
        assert_eq!(json["message"], "[10:00:00] Installing Debian base system...");
        assert_eq!(json.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_is_complete() {
        let mut snapshot = ProgressSnapshot {
            progress: 95,
            status: String::new(),
            message: String::new(),
        };
        assert!(!snapshot.is_complete());
        snapshot.progress = 100;
        assert!(snapshot.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ends_after_terminal_snapshot() {
        let (tx, rx) = watch::channel(running(60, "Configuring system..."));
        let mut stream = progress_stream(rx, Duration::from_secs(1));

        let first = stream.next().await.unwrap();
        assert_eq!(first.progress, 60);
        assert_eq!(first.status, "Configuring system...");

        tx.send_modify(|state| {
            state.active = false;
            state.progress = 100;
            state.status = "Installation complete!".to_string();
            state.outcome = Some(RunOutcome::Completed);
        });

        let last = stream.next().await.unwrap();
        assert_eq!(last.progress, 100);
        assert_eq!(last.status, "Installation complete!");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ends_on_failure() {
        let (tx, rx) = watch::channel(running(20, "Installing base system..."));
        let mut stream = progress_stream(rx, Duration::from_secs(1));
        stream.next().await.unwrap();

        tx.send_modify(|state| {
            state.active = false;
            state.status = "Installation failed: boom".to_string();
            state.outcome = Some(RunOutcome::Failed);
        });

        let last = stream.next().await.unwrap();
        assert_eq!(last.progress, 20);
        assert_eq!(last.status, "Installation failed: boom");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ticks_while_idle() {
        let (_tx, rx) = watch::channel(InstallationState::default());
        let snapshots: Vec<_> = progress_stream(rx, Duration::from_secs(1))
            .take(3)
            .collect()
            .await;
        assert_eq!(snapshots.len(), 3);
        assert!(snapshots.iter().all(|s| s.status == "Ready"));
        assert!(snapshots.iter().all(|s| s.message == "Starting..."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ends_when_installer_dropped() {
        let (tx, rx) = watch::channel(running(80, "Installing bootloader..."));
        let mut stream = progress_stream(rx, Duration::from_secs(1));
        drop(tx);
        let last = stream.next().await.unwrap();
        assert_eq!(last.progress, 80);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_cadence() {
        let (_tx, rx) = watch::channel(running(20, "Installing base system..."));
        let mut stream = progress_stream(rx, Duration::from_secs(1));
        let start = tokio::time::Instant::now();
        stream.next().await.unwrap();
        stream.next().await.unwrap();
        stream.next().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_tick_is_raised_to_minimum() {
        let (_tx, rx) = watch::channel(running(20, "Installing base system..."));
        let mut stream = progress_stream(rx, Duration::ZERO);
        let start = tokio::time::Instant::now();
        stream.next().await.unwrap();
        stream.next().await.unwrap();
        assert_eq!(start.elapsed(), MIN_TICK);
    }
}
