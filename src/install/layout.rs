//! Target disk layout: partition device names, mount paths and fstab.

use std::path::{Path, PathBuf};

/// Partition number of the EFI system partition.
pub(crate) const EFI_PARTITION: u32 = 1;
/// Partition number of the root filesystem.
pub(crate) const ROOT_PARTITION: u32 = 2;

/// Where the EFI partition is mounted inside the installed system.
pub(crate) const EFI_MOUNT: &str = "/boot/efi";

/// Device path of partition `number` on `disk`.
///
/// Kernels name partitions of disks whose name ends in a digit with a `p`
/// separator: `/dev/nvme0n1` → `/dev/nvme0n1p2`, but `/dev/sda` → `/dev/sda2`.
pub(crate) fn partition_path(disk: &str, number: u32) -> String {
    if disk.ends_with(|c: char| c.is_ascii_digit()) {
        format!("{}p{}", disk, number)
    } else {
        format!("{}{}", disk, number)
    }
}

/// Host path of the EFI mount under `root`.
pub(crate) fn efi_dir(root: &Path) -> PathBuf {
    root.join(EFI_MOUNT.trim_start_matches('/'))
}

/// Contents of `/etc/fstab` for the installed system.
pub(crate) fn render_fstab(root_uuid: &str, efi_uuid: &str) -> String {
    format!(
        "UUID={} / ext4 defaults 0 1\nUUID={} {} vfat defaults 0 2\n",
        root_uuid, efi_uuid, EFI_MOUNT
    )
}
