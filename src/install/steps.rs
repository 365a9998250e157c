//! The installation pipeline.
//!
//! Each [`Step`] is a named unit of work with a fixed progress checkpoint.
//! Steps stop at the first failing command and hand the error back to the
//! engine unchanged; only [`Step::Finalize`] tolerates failures.

use crate::install::layout::{
    efi_dir, partition_path, render_fstab, EFI_MOUNT, EFI_PARTITION, ROOT_PARTITION,
};
use crate::install::state::SharedState;
use crate::shell::{run, CommandOutput, RunOptions};
use crate::{CommandRunner, InstallConfig, InstallError, InstallerOptions, ShellCommand};
use strum::IntoEnumIterator;

/// A stage of the installation, in execution order.
///
/// # Example
///
/// ```rust
/// use twinaos_installer::Step;
///
/// let checkpoints: Vec<u8> = Step::all().map(|s| s.checkpoint()).collect();
/// assert_eq!(checkpoints, [20, 60, 80, 95, 100]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum Step {
    /// Partition and format the target disk.
    PrepareDisk,
    /// Mount the new filesystems and bootstrap the base system.
    InstallBaseSystem,
    /// Write fstab and hostname, create the user, set the time zone.
    ConfigureSystem,
    /// Install kernel and GRUB and make the disk bootable.
    InstallBootloader,
    /// Unmount everything, best-effort.
    Finalize,
}

impl Step {
    /// All steps in execution order.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }

    /// Short identifier, e.g. `prepare-disk`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PrepareDisk => "prepare-disk",
            Self::InstallBaseSystem => "install-base-system",
            Self::ConfigureSystem => "configure-system",
            Self::InstallBootloader => "install-bootloader",
            Self::Finalize => "finalize",
        }
    }

    /// Progress reached when this step completes.
    ///
    /// These approximate relative cost; they are not measured.
    pub fn checkpoint(&self) -> u8 {
        match self {
            Self::PrepareDisk => 20,
            Self::InstallBaseSystem => 60,
            Self::ConfigureSystem => 80,
            Self::InstallBootloader => 95,
            Self::Finalize => 100,
        }
    }

    /// Status shown while this step runs.
    pub fn status(&self) -> &'static str {
        match self {
            Self::PrepareDisk => "Preparing disk...",
            Self::InstallBaseSystem => "Installing base system...",
            Self::ConfigureSystem => "Configuring system...",
            Self::InstallBootloader => "Installing bootloader...",
            Self::Finalize => "Finalizing installation...",
        }
    }

    /// Log line written when this step begins.
    pub fn announcement(&self, config: &InstallConfig) -> String {
        match self {
            Self::PrepareDisk => format!("Starting installation on {}", config.disk),
            Self::InstallBaseSystem => "Installing Debian base system...".to_string(),
            Self::ConfigureSystem => "Configuring system settings...".to_string(),
            Self::InstallBootloader => "Installing GRUB bootloader...".to_string(),
            Self::Finalize => "Cleaning up and finalizing...".to_string(),
        }
    }

    pub(crate) async fn run<R>(&self, ctx: &StepContext<'_, R>) -> Result<(), InstallError>
    where
        R: CommandRunner + ?Sized,
    {
        match self {
            Self::PrepareDisk => prepare_disk(ctx).await,
            Self::InstallBaseSystem => install_base_system(ctx).await,
            Self::ConfigureSystem => configure_system(ctx).await,
            Self::InstallBootloader => install_bootloader(ctx).await,
            Self::Finalize => finalize(ctx).await,
        }
    }
}

/// Everything a step needs for one run.
pub(crate) struct StepContext<'a, R: ?Sized> {
    pub(crate) runner: &'a R,
    pub(crate) options: &'a InstallerOptions,
    pub(crate) config: &'a InstallConfig,
    pub(crate) state: &'a SharedState,
}

impl<R> StepContext<'_, R>
where
    R: CommandRunner + ?Sized,
{
    async fn checked(&self, command: ShellCommand) -> Result<CommandOutput, InstallError> {
        run(self.runner, &command, RunOptions::default()).await
    }

    async fn in_root(&self, command: ShellCommand) -> Result<CommandOutput, InstallError> {
        self.checked(command.in_root(&self.options.mount_point)).await
    }

    fn partition(&self, number: u32) -> String {
        partition_path(&self.config.disk, number)
    }

    async fn filesystem_uuid(&self, device: &str) -> Result<String, InstallError> {
        let output = run(
            self.runner,
            &ShellCommand::new("blkid").args(["-s", "UUID", "-o", "value", device]),
            RunOptions::default().capturing(),
        )
        .await?;

        match output.stdout {
            Some(uuid) if !uuid.is_empty() => Ok(uuid),
            _ => Err(InstallError::unexpected(format!(
                "No filesystem UUID reported for {}",
                device
            ))),
        }
    }
}

async fn prepare_disk<R>(ctx: &StepContext<'_, R>) -> Result<(), InstallError>
where
    R: CommandRunner + ?Sized,
{
    let disk = ctx.config.disk.as_str();
    let efi_end = ctx.options.efi_partition_end.as_str();
    let parted = |args: &[&str]| {
        ShellCommand::new("parted")
            .arg("-s")
            .arg(disk)
            .args(args.iter().copied())
    };

    ctx.state.log(format!("Partitioning disk {}", disk));
    for command in [
        parted(&["mklabel", "gpt"]),
        parted(&["mkpart", "primary", "fat32", "1MiB", efi_end]),
        parted(&["set", "1", "esp", "on"]),
        parted(&["mkpart", "primary", "ext4", efi_end, "100%"]),
    ] {
        ctx.checked(command).await?;
    }

    ctx.state.log("Formatting partitions...");
    ctx.checked(
        ShellCommand::new("mkfs.fat")
            .arg("-F32")
            .arg(ctx.partition(EFI_PARTITION)),
    )
    .await?;
    ctx.checked(
        ShellCommand::new("mkfs.ext4")
            .arg("-F")
            .arg(ctx.partition(ROOT_PARTITION)),
    )
    .await?;
    Ok(())
}

async fn install_base_system<R>(ctx: &StepContext<'_, R>) -> Result<(), InstallError>
where
    R: CommandRunner + ?Sized,
{
    let root = &ctx.options.mount_point;
    let root_str = root.to_string_lossy();

    tokio::fs::create_dir_all(root).await?;
    ctx.checked(ShellCommand::new("mount").args([
        ctx.partition(ROOT_PARTITION),
        root_str.to_string(),
    ]))
    .await?;

    let efi = efi_dir(root);
    tokio::fs::create_dir_all(&efi).await?;
    ctx.checked(ShellCommand::new("mount").args([
        ctx.partition(EFI_PARTITION),
        efi.to_string_lossy().into_owned(),
    ]))
    .await?;

    ctx.state.log("Running debootstrap (this may take several minutes)...");
    ctx.checked(ShellCommand::new("debootstrap").args([
        format!("--arch={}", ctx.options.arch),
        format!("--variant={}", ctx.options.variant),
        ctx.options.suite.clone(),
        root_str.to_string(),
        ctx.options.mirror.clone(),
    ]))
    .await?;
    Ok(())
}

async fn configure_system<R>(ctx: &StepContext<'_, R>) -> Result<(), InstallError>
where
    R: CommandRunner + ?Sized,
{
    let etc = ctx.options.mount_point.join("etc");
    let username = ctx.config.username.as_str();

    ctx.state.log("Generating fstab...");
    let root_uuid = ctx.filesystem_uuid(&ctx.partition(ROOT_PARTITION)).await?;
    let efi_uuid = ctx.filesystem_uuid(&ctx.partition(EFI_PARTITION)).await?;
    tokio::fs::create_dir_all(&etc).await?;
    tokio::fs::write(etc.join("fstab"), render_fstab(&root_uuid, &efi_uuid)).await?;

    tokio::fs::write(etc.join("hostname"), format!("{}\n", ctx.options.hostname)).await?;

    ctx.state.log(format!("Creating user {}...", username));
    ctx.in_root(ShellCommand::new("useradd").args([
        "-m", "-s", "/bin/bash", "-G", "sudo", username,
    ]))
    .await?;

    // Credentials go through stdin so they never show up in the process list.
    ctx.in_root(
        ShellCommand::new("chpasswd")
            .with_stdin(format!("{}:{}\n", username, ctx.config.password)),
    )
    .await?;

    ctx.in_root(ShellCommand::new("ln").args([
        "-sf".to_string(),
        format!("/usr/share/zoneinfo/{}", ctx.config.timezone),
        "/etc/localtime".to_string(),
    ]))
    .await?;
    Ok(())
}

async fn install_bootloader<R>(ctx: &StepContext<'_, R>) -> Result<(), InstallError>
where
    R: CommandRunner + ?Sized,
{
    ctx.in_root(ShellCommand::new("apt").arg("update")).await?;
    ctx.in_root(
        ShellCommand::new("apt")
            .args(["install", "-y"])
            .args(ctx.options.bootloader_packages.iter().cloned()),
    )
    .await?;
    ctx.in_root(ShellCommand::new("grub-install").args([
        format!("--target={}", ctx.options.bootloader_target),
        format!("--efi-directory={}", EFI_MOUNT),
        ctx.config.disk.clone(),
    ]))
    .await?;
    ctx.in_root(ShellCommand::new("grub-mkconfig").args(["-o", "/boot/grub/grub.cfg"]))
        .await?;
    Ok(())
}

async fn finalize<R>(ctx: &StepContext<'_, R>) -> Result<(), InstallError>
where
    R: CommandRunner + ?Sized,
{
    let root = &ctx.options.mount_point;
    for target in [efi_dir(root), root.clone()] {
        let target = target.to_string_lossy().into_owned();
        let output = run(
            ctx.runner,
            &ShellCommand::new("umount").arg(target.as_str()),
            RunOptions::best_effort(),
        )
        .await?;
        if !output.success() {
            ctx.state.log(format!("Warning: could not unmount {}", target));
        }
    }
    Ok(())
}
