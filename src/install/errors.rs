//! Error types for installation operations.
//!
//! Every fault the engine can report is an [`InstallError`]. Command failures
//! raised by the shell executor travel unchanged through the step that issued
//! them up to the engine, which turns them into the terminal status string.

use thiserror::Error;

/// Errors that can occur while validating, starting or running an installation.
///
/// Each variant can produce an actionable hint through
/// [`InstallError::fix_suggestion`], suitable for showing next to the status.
///
/// # Example
///
/// ```rust
/// use twinaos_installer::InstallError;
///
/// fn report(error: InstallError) {
///     eprintln!("Installation failed: {}", error);
///     eprintln!("To fix: {}", error.fix_suggestion());
/// }
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstallError {
    /// A required configuration field is missing or malformed.
    ///
    /// Raised before any state is touched.
    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig {
        /// Name of the offending field (e.g., "disk").
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// An installation is already in progress.
    #[error("Installation already in progress")]
    AlreadyRunning,

    /// An external command failed.
    ///
    /// Either the process exited non-zero, was killed by a signal, or could
    /// not be launched at all. In the latter two cases `exit_code` is `None`.
    #[error("Command `{command}` failed{}: {}", exit_suffix(.exit_code), trimmed(.stderr))]
    ExternalCommand {
        /// The command line that failed, with sensitive input redacted.
        command: String,
        /// Exit code of the process, if it exited normally.
        exit_code: Option<i32>,
        /// Standard error of the process, or the launch error.
        stderr: String,
    },

    /// A tool the pipeline depends on is not available on this host.
    #[error("Required tool not found: {name}")]
    MissingTool {
        /// Executable name that could not be found on PATH.
        name: String,
    },

    /// Any other fault raised while a step was running.
    #[error("Unexpected failure: {message}")]
    Unexpected {
        /// Description of the failure.
        message: String,
    },
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {}", code),
        None => String::new(),
    }
}

fn trimmed(text: &str) -> &str {
    text.trim()
}

impl InstallError {
    /// Get an actionable suggestion for fixing this error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use twinaos_installer::InstallError;
    ///
    /// let error = InstallError::AlreadyRunning;
    /// assert!(error.fix_suggestion().contains("Wait"));
    /// ```
    pub fn fix_suggestion(&self) -> &str {
        match self {
            Self::InvalidConfig { .. } => "Correct the highlighted field and submit the configuration again",
            Self::AlreadyRunning => "Wait for the current installation to finish before starting another",
            Self::ExternalCommand { exit_code: None, .. } => {
                "Make sure the installer runs as root and the command is installed on the live system"
            }
            Self::ExternalCommand { .. } => "See the command output above; the target disk may need to be checked or replaced",
            Self::MissingTool { .. } => "Install the missing tool on the live system and try again",
            Self::Unexpected { .. } => "Check the installer log for details and retry the installation",
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for InstallError {
    fn from(e: std::io::Error) -> Self {
        Self::unexpected(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_command_display_with_code() {
        let error = InstallError::ExternalCommand {
            command: "debootstrap --arch=amd64".to_string(),
            exit_code: Some(1),
            stderr: "E: Failed getting release file\n".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Command `debootstrap --arch=amd64` failed with exit code 1: E: Failed getting release file"
        );
    }

    #[test]
    fn test_external_command_display_without_code() {
        let error = InstallError::ExternalCommand {
            command: "parted -s /dev/sda mklabel gpt".to_string(),
            exit_code: None,
            stderr: "No such file or directory (os error 2)".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Command `parted -s /dev/sda mklabel gpt` failed: No such file or directory (os error 2)"
        );
    }

    #[test]
    fn test_invalid_config_display() {
        let error = InstallError::invalid("disk", "Missing required field: disk");
        assert_eq!(
            error.to_string(),
            "Invalid configuration: disk: Missing required field: disk"
        );
    }

    #[test]
    fn test_all_variants_have_fix() {
        let errors = vec![
            InstallError::invalid("username", "bad"),
            InstallError::AlreadyRunning,
            InstallError::ExternalCommand {
                command: "mount".to_string(),
                exit_code: Some(32),
                stderr: String::new(),
            },
            InstallError::ExternalCommand {
                command: "mount".to_string(),
                exit_code: None,
                stderr: String::new(),
            },
            InstallError::MissingTool {
                name: "debootstrap".to_string(),
            },
            InstallError::unexpected("boom"),
        ];

        for error in errors {
            assert!(
                !error.fix_suggestion().is_empty(),
                "fix_suggestion() should return non-empty string for {:?}",
                error
            );
        }
    }

    #[test]
    fn test_io_error_becomes_unexpected() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only file system");
        let error: InstallError = io.into();
        assert!(matches!(error, InstallError::Unexpected { .. }));
        assert!(error.to_string().contains("read-only file system"));
    }
}
