//! # twinaos-installer
//!
//! Installation engine for TwinaOS. It partitions a target disk, bootstraps
//! a Debian base system onto it, configures host identity and the primary
//! user, installs GRUB, and reports progress to any number of observers.
//!
//! The HTTP layer of the installer links this crate and calls three things:
//! [`Installer::start`], [`Installer::subscribe`] and
//! [`Installer::current_state`].
//!
//! ## Features
//!
//! - `Installer` engine enforcing a single active run
//! - `Step` pipeline: prepare-disk, install-base-system, configure-system,
//!   install-bootloader, finalize
//! - `ProgressStream` of snapshots at a fixed cadence
//! - `CommandRunner` seam for executing (or simulating) external tools
//!
//! ## Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use twinaos_installer::{InstallConfig, Installer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let installer = Installer::default();
//!     let config: InstallConfig = InstallConfig {
//!         language: "en".to_string(),
//!         timezone: "Europe/Berlin".to_string(),
//!         disk: "/dev/nvme0n1".to_string(),
//!         username: "alice".to_string(),
//!         password: "secret".to_string(),
//!     };
//!
//!     if let Err(e) = installer.start(config).await {
//!         eprintln!("{} ({})", e, e.fix_suggestion());
//!         return;
//!     }
//!
//!     let mut progress = installer.subscribe();
//!     while let Some(snapshot) = progress.next().await {
//!         println!("{}% {}", snapshot.progress, snapshot.status);
//!     }
//! }
//! ```

mod config;
pub mod install;
mod options;
pub mod shell;

pub use config::InstallConfig;
pub use install::{
    InstallError, InstallationState, Installer, ProgressSnapshot, ProgressStream, RunOutcome,
    Step, COMPLETE_STATUS, READY_STATUS,
};
pub use options::InstallerOptions;
pub use shell::{CommandOutput, CommandRunner, RawOutput, RunOptions, ShellCommand, SystemRunner};
