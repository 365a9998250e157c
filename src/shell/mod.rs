//! Shell executor.
//!
//! Every step of the pipeline talks to the outside world through this module:
//!
//! - [`ShellCommand`]: a program, its arguments and optional sensitive stdin
//! - [`CommandRunner`]: the process boundary, implemented by [`SystemRunner`]
//!   for real installs and by test doubles
//! - [`run`]: applies [`RunOptions`] (success checking, stdout capture) on top
//!   of any runner, so checking semantics never depend on the runner

mod command;
mod exec;
mod runner;

pub use command::ShellCommand;
pub use exec::{run, CommandOutput, RunOptions};
pub use runner::{CommandRunner, RawOutput, SystemRunner};
