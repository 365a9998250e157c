//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Semaphore;
use twinaos_installer::{
    CommandRunner, InstallConfig, Installer, InstallerOptions, RawOutput, ShellCommand,
};

pub const ROOT_UUID: &str = "5f0c3a4e-9d1b-4c6e-8a7f-2b1d0e9c8a71";
pub const EFI_UUID: &str = "3A1F-7C2E";

/// Records every command and answers from a script.
///
/// Clones share the same record, so a test can keep one clone while the
/// installer owns another.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<ShellCommand>>>,
    failures: Arc<Vec<(String, RawOutput)>>,
    blkid_output: Option<&'static str>,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation of `program` exit with `code`.
    ///
    /// Matches the program inside a chroot as well.
    pub fn fail_on(mut self, program: &str, code: i32, stderr: &str) -> Self {
        let mut failures = (*self.failures).clone();
        failures.push((program.to_string(), RawOutput::failure(code, stderr)));
        self.failures = Arc::new(failures);
        self
    }

    /// Answer every blkid call with `stdout` instead of a UUID.
    pub fn blkid_prints(mut self, stdout: &'static str) -> Self {
        self.blkid_output = Some(stdout);
        self
    }

    /// Sleep before answering each command.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Block each command until a permit is available on `gate`.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<ShellCommand> {
        self.calls.lock().unwrap().clone()
    }

    /// Program names as seen inside any chroot, in call order.
    pub fn programs(&self) -> Vec<String> {
        self.calls().iter().map(|c| effective_program(c).to_string()).collect()
    }

    /// Full command lines, in call order.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.argv().join(" ")).collect()
    }
}

fn effective_program(command: &ShellCommand) -> &str {
    if command.get_program() == "chroot" {
        command
            .get_args()
            .get(1)
            .map(String::as_str)
            .unwrap_or("chroot")
    } else {
        command.get_program()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn execute(&self, command: &ShellCommand) -> std::io::Result<RawOutput> {
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.expect("gate closed");
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.calls.lock().unwrap().push(command.clone());

        let program = effective_program(command);
        if let Some((_, output)) = self.failures.iter().find(|(p, _)| p == program) {
            return Ok(output.clone());
        }

        if program == "blkid" {
            if let Some(stdout) = self.blkid_output {
                return Ok(RawOutput::success(stdout));
            }
            let device = command.get_args().last().map(String::as_str).unwrap_or("");
            let uuid = if device.ends_with('2') { ROOT_UUID } else { EFI_UUID };
            return Ok(RawOutput::success(format!("{}\n", uuid)));
        }

        Ok(RawOutput::success(""))
    }
}

pub fn config() -> InstallConfig {
    InstallConfig {
        language: "en".to_string(),
        timezone: "UTC".to_string(),
        disk: "/dev/sdX".to_string(),
        username: "alice".to_string(),
        password: "secret".to_string(),
    }
}

/// Installer over `runner` with its root mounted in a fresh temp dir.
pub fn installer(runner: &RecordingRunner) -> (Installer<RecordingRunner>, TempDir) {
    let root = tempfile::tempdir().expect("tempdir");
    let options = InstallerOptions {
        mount_point: root.path().join("target"),
        tick: Duration::from_millis(5),
        ..Default::default()
    };
    (Installer::with_runner(runner.clone(), options), root)
}

/// Step-boundary log lines of a run on [`config`], in order.
pub const BOUNDARIES: [&str; 5] = [
    "Starting installation on /dev/sdX",
    "Installing Debian base system...",
    "Configuring system settings...",
    "Installing GRUB bootloader...",
    "Cleaning up and finalizing...",
];

/// The boundary lines present in `log`, with timestamps stripped.
pub fn boundaries_in(log: &[String]) -> Vec<String> {
    log.iter()
        .filter_map(|entry| entry.get(11..))
        .filter(|message| BOUNDARIES.contains(message))
        .map(str::to_string)
        .collect()
}
