//! Installation orchestration.
//!
//! This module provides the [`Installer`] engine and everything it exposes:
//! the step pipeline, the shared state and the progress stream.
//!
//! # Example
//!
//! ```rust
//! use twinaos_installer::{Installer, InstallationState};
//!
//! let installer = Installer::default();
//! let state: InstallationState = installer.current_state();
//! assert!(!state.active);
//! assert_eq!(state.status, "Ready");
//! ```

mod engine;
mod errors;
mod layout;
mod preflight;
mod progress;
mod state;
mod steps;

pub use engine::Installer;
pub use errors::InstallError;
pub use progress::{ProgressSnapshot, ProgressStream};
pub use state::{InstallationState, RunOutcome, COMPLETE_STATUS, READY_STATUS};
pub use steps::Step;
