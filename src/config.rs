//! Caller-supplied installation configuration.
//!
//! This module provides [`InstallConfig`], the five answers the installer UI
//! collects before a run, and its validation. A config is immutable once it
//! has been accepted by [`Installer::start`](crate::Installer::start).

use crate::InstallError;
use regex::Regex;
use serde::Deserialize;
use std::fmt;

/// Configuration for a single installation run.
///
/// Fields missing from a deserialized payload default to empty strings, so
/// that [`validate`](InstallConfig::validate) can name the missing field
/// instead of failing inside the deserializer.
///
/// The `Debug` output never contains the password.
///
/// # Example
///
/// ```rust
/// use twinaos_installer::InstallConfig;
///
/// let config = InstallConfig {
///     language: "en".to_string(),
///     timezone: "Europe/Berlin".to_string(),
///     disk: "/dev/sda".to_string(),
///     username: "alice".to_string(),
///     password: "secret".to_string(),
/// };
/// assert!(config.validate().is_ok());
/// assert!(!format!("{:?}", config).contains("secret"));
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// UI language chosen by the user (e.g., "en", "de_DE.UTF-8").
    pub language: String,
    /// IANA time zone name (e.g., "UTC", "America/New_York").
    pub timezone: String,
    /// Target block device (e.g., "/dev/sda", "/dev/nvme0n1").
    pub disk: String,
    /// Login name of the primary user account.
    pub username: String,
    /// Password of the primary user account.
    pub password: String,
}

impl InstallConfig {
    /// Field names in the order they are checked.
    pub const REQUIRED_FIELDS: [&'static str; 5] =
        ["language", "timezone", "disk", "username", "password"];

    /// Check that every field is present and well-formed.
    ///
    /// Returns the first problem found as [`InstallError::InvalidConfig`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use twinaos_installer::{InstallConfig, InstallError};
    ///
    /// let config = InstallConfig {
    ///     disk: "/dev/sda".to_string(),
    ///     ..Default::default()
    /// };
    /// match config.validate() {
    ///     Err(InstallError::InvalidConfig { field, .. }) => assert_eq!(field, "language"),
    ///     other => panic!("unexpected: {:?}", other),
    /// }
    /// ```
    pub fn validate(&self) -> Result<(), InstallError> {
        for field in Self::REQUIRED_FIELDS {
            if self.field(field).trim().is_empty() {
                return Err(InstallError::invalid(
                    field,
                    format!("Missing required field: {}", field),
                ));
            }
        }

        validate_language(&self.language)?;
        validate_timezone(&self.timezone)?;
        validate_disk(&self.disk)?;
        validate_username(&self.username)?;
        validate_password(&self.password)?;
        Ok(())
    }

    fn field(&self, name: &str) -> &str {
        match name {
            "language" => &self.language,
            "timezone" => &self.timezone,
            "disk" => &self.disk,
            "username" => &self.username,
            _ => &self.password,
        }
    }
}

impl fmt::Debug for InstallConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallConfig")
            .field("language", &self.language)
            .field("timezone", &self.timezone)
            .field("disk", &self.disk)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn validate_language(language: &str) -> Result<(), InstallError> {
    let re = Regex::new(r"^[A-Za-z]{2,3}([_-][A-Za-z0-9]+)*(\.[A-Za-z0-9-]+)?$")
        .expect("Invalid language regex");
    if !re.is_match(language) {
        return Err(InstallError::invalid(
            "language",
            format!("Not a language code: {}", language),
        ));
    }
    Ok(())
}

fn validate_timezone(timezone: &str) -> Result<(), InstallError> {
    // The zone ends up as a symlink target under /usr/share/zoneinfo.
    let re = Regex::new(r"^[A-Za-z0-9_+-]+(/[A-Za-z0-9_+-]+)*$").expect("Invalid timezone regex");
    if !re.is_match(timezone) || timezone.split('/').any(|part| part.starts_with('-')) {
        return Err(InstallError::invalid(
            "timezone",
            format!("Not an IANA time zone name: {}", timezone),
        ));
    }
    Ok(())
}

fn validate_disk(disk: &str) -> Result<(), InstallError> {
    if !disk.starts_with("/dev/") || disk.len() == "/dev/".len() {
        return Err(InstallError::invalid(
            "disk",
            "Disk device must start with /dev/.",
        ));
    }
    if disk.chars().any(char::is_whitespace) || disk.contains("..") {
        return Err(InstallError::invalid(
            "disk",
            format!("Not a block device path: {}", disk),
        ));
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), InstallError> {
    let re = Regex::new(r"^[a-z_][a-z0-9_-]{0,31}$").expect("Invalid username regex");
    if !re.is_match(username) {
        return Err(InstallError::invalid(
            "username",
            "Username must start with a lowercase letter or underscore and contain only lowercase letters, digits, '_' or '-' (max 32)",
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), InstallError> {
    if password.contains(':') || password.contains('\n') || password.contains('\r') {
        return Err(InstallError::invalid(
            "password",
            "Password must not contain ':' or line breaks",
        ));
    }
    Ok(())
}
