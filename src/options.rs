//! Installer options.
//!
//! This module provides the [`InstallerOptions`] struct describing the
//! target distribution, the on-disk layout and the publisher cadence. The
//! defaults install Debian bookworm (amd64, minbase) with GRUB for UEFI.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration options for the installation engine.
///
/// Every field has a default, and deserialization accepts partial input, so
/// a host only needs to spell out what it overrides.
///
/// # Example
///
/// ```rust
/// use twinaos_installer::InstallerOptions;
/// use std::time::Duration;
///
/// // Defaults: /mnt/twinaos, Debian bookworm, one snapshot per second
/// let opts = InstallerOptions::default();
/// assert_eq!(opts.suite, "bookworm");
///
/// // Faster progress ticks and a different mirror
/// let opts = InstallerOptions {
///     tick: Duration::from_millis(250),
///     mirror: "http://ftp.de.debian.org/debian/".to_string(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InstallerOptions {
    /// Where the new root filesystem is mounted during the run.
    ///
    /// Default: `/mnt/twinaos`
    pub mount_point: PathBuf,

    /// Contents of the installed system's `/etc/hostname`.
    ///
    /// Default: `twinaos`
    pub hostname: String,

    /// Distribution suite passed to debootstrap.
    pub suite: String,

    /// Target architecture passed to debootstrap.
    pub arch: String,

    /// debootstrap variant.
    pub variant: String,

    /// Package mirror passed to debootstrap.
    pub mirror: String,

    /// End of the EFI system partition, in parted units.
    ///
    /// The EFI partition starts at `1MiB`; the data partition fills the rest.
    /// Default: `513MiB`
    pub efi_partition_end: String,

    /// `--target` for grub-install.
    pub bootloader_target: String,

    /// Packages installed inside the new root before grub-install runs.
    pub bootloader_packages: Vec<String>,

    /// Command (program followed by arguments) used by
    /// [`Installer::reboot`](crate::Installer::reboot).
    pub reboot_command: Vec<String>,

    /// Interval between progress snapshots, in milliseconds when
    /// deserialized. Zero is rejected.
    ///
    /// Default: 1 second
    #[serde(with = "millis")]
    pub tick: Duration,
}

impl InstallerOptions {
    /// Executables that must be on PATH for a run to succeed.
    ///
    /// Used by [`Installer::preflight`](crate::Installer::preflight). Tools
    /// that only run inside the new root (apt, grub-install) are not listed.
    pub fn required_tools(&self) -> Vec<&str> {
        let mut tools = vec![
            "parted",
            "mkfs.fat",
            "mkfs.ext4",
            "mount",
            "umount",
            "debootstrap",
            "blkid",
            "chroot",
        ];
        if let Some(reboot) = self.reboot_command.first() {
            tools.push(reboot);
        }
        tools
    }
}

impl Default for InstallerOptions {
    fn default() -> Self {
        Self {
            mount_point: PathBuf::from("/mnt/twinaos"),
            hostname: "twinaos".to_string(),
            suite: "bookworm".to_string(),
            arch: "amd64".to_string(),
            variant: "minbase".to_string(),
            mirror: "http://deb.debian.org/debian/".to_string(),
            efi_partition_end: "513MiB".to_string(),
            bootloader_target: "x86_64-efi".to_string(),
            bootloader_packages: vec![
                "grub-efi-amd64".to_string(),
                "linux-image-amd64".to_string(),
            ],
            reboot_command: vec!["reboot".to_string()],
            tick: Duration::from_secs(1),
        }
    }
}

mod millis {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match u64::deserialize(deserializer)? {
            0 => Err(D::Error::custom("tick must be at least 1 millisecond")),
            ms => Ok(Duration::from_millis(ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let opts = InstallerOptions::default();
        assert_eq!(opts.mount_point, PathBuf::from("/mnt/twinaos"));
        assert_eq!(opts.hostname, "twinaos");
        assert_eq!(opts.efi_partition_end, "513MiB");
    }

    #[test]
    fn test_default_distribution() {
        let opts = InstallerOptions::default();
        assert_eq!(opts.suite, "bookworm");
        assert_eq!(opts.arch, "amd64");
        assert_eq!(opts.variant, "minbase");
        assert_eq!(opts.mirror, "http://deb.debian.org/debian/");
        assert_eq!(opts.bootloader_target, "x86_64-efi");
        assert_eq!(
            opts.bootloader_packages,
            vec!["grub-efi-amd64", "linux-image-amd64"]
        );
    }

    #[test]
    fn test_default_tick() {
        let opts = InstallerOptions::default();
        assert_eq!(opts.tick, Duration::from_secs(1));
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let opts: InstallerOptions =
            serde_json::from_str(r#"{"hostname":"lab-01","tick":200}"#).unwrap();
        assert_eq!(opts.hostname, "lab-01");
        assert_eq!(opts.tick, Duration::from_millis(200));
        assert_eq!(opts.suite, "bookworm");
        assert_eq!(opts.mount_point, PathBuf::from("/mnt/twinaos"));
    }

    #[test]
    fn test_zero_tick_rejected() {
        let err = serde_json::from_str::<InstallerOptions>(r#"{"tick":0}"#).unwrap_err();
        assert!(err.to_string().contains("tick must be at least 1 millisecond"));
    }

    #[test]
    fn test_required_tools_include_reboot() {
        let opts = InstallerOptions {
            reboot_command: vec!["systemctl".to_string(), "reboot".to_string()],
            ..Default::default()
        };
        let tools = opts.required_tools();
        assert!(tools.contains(&"debootstrap"));
        assert!(tools.contains(&"chroot"));
        assert_eq!(tools.last(), Some(&"systemctl"));
    }
}
