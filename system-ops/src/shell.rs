use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::{fs, process::Command};

use crate::traits::{CifsMount, SystemOps};

const PROC_MOUNTS: &str = "/proc/mounts";
const PROC_HOSTNAME: &str = "/proc/sys/kernel/hostname";
const CIFS_MODE_OPTIONS: &str = "rw,file_mode=0777,dir_mode=0777";

pub struct ShellOps;

impl ShellOps {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ShellOps {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SystemOps for ShellOps {
    type Error = anyhow::Error;

    async fn dir_exists(&self, path: &Path) -> Result<bool, Self::Error> {
        tracing::debug!("Calling 'dir_exists' on path: `{}`", path.display());
        Ok(path.is_dir())
    }

    async fn file_exists(&self, path: &Path) -> Result<bool, Self::Error> {
        tracing::debug!("Calling 'file_exists' on path: `{}`", path.display());
        Ok(path.is_file())
    }

    async fn is_mount_point(&self, path: &Path) -> Result<bool, Self::Error> {
        let canonical = fs::canonicalize(path)
            .await
            .with_context(|| format!("Canonicalizing mount point {}", path.display()))?;

        let mount_table = fs::read_to_string(PROC_MOUNTS)
            .await
            .context("Reading the mount table")?;

        Ok(mount_table
            .lines()
            .filter_map(|line| line.split_whitespace().nth(1))
            .any(|mount_point| PathBuf::from(decode_mount_path(mount_point)) == canonical))
    }

    async fn mount_cifs(&self, mount: &CifsMount, target: &Path) -> Result<(), Self::Error> {
        tracing::debug!("Mounting {} on `{}`", mount.share, target.display());

        let options = format!(
            "user={},password={},{}",
            mount.user, mount.password, CIFS_MODE_OPTIONS
        );

        let status = Command::new("mount")
            .arg("-t")
            .arg("cifs")
            .arg("-o")
            .arg(options)
            .arg(&mount.share)
            .arg(target)
            .status()
            .await
            .context("Running the mount command")?;

        if !status.success() {
            tracing::warn!("Mount command exited with {status}; relying on the mount re-check");
        }

        Ok(())
    }

    async fn unmount(&self, mount_point: &Path) -> Result<(), Self::Error> {
        tracing::debug!("Unmounting `{}`", mount_point.display());

        let status = Command::new("umount")
            .arg(mount_point)
            .status()
            .await
            .context("Running the umount command")?;

        if status.success() {
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "umount {} failed with exit code {}",
                mount_point.display(),
                status.code().unwrap_or(1)
            ))
        }
    }

    async fn make_dir(&self, path: &Path) -> Result<(), Self::Error> {
        tracing::debug!("Calling 'make_dir' on path: `{}`", path.display());
        fs::create_dir(path).await.map_err(Into::into)
    }

    async fn hostname(&self) -> Result<String, Self::Error> {
        let raw = fs::read_to_string(PROC_HOSTNAME)
            .await
            .context("Reading the kernel hostname")?;
        Ok(raw.trim().to_string())
    }

    async fn primary_mac(&self) -> Result<String, Self::Error> {
        let output = Command::new("ip")
            .args(["route", "show", "default"])
            .output()
            .await
            .context("Running the ip route command")?;

        if !output.status.success() {
            return Err(anyhow::anyhow!(
                "ip route show default failed with exit code {}",
                output.status.code().unwrap_or(1)
            ));
        }

        let route_table = String::from_utf8_lossy(&output.stdout);
        let interface = default_route_interface(&route_table)
            .ok_or_else(|| anyhow::anyhow!("No default route interface in: `{route_table}`"))?;

        let address = fs::read_to_string(format!("/sys/class/net/{interface}/address"))
            .await
            .with_context(|| format!("Reading the hardware address of interface {interface}"))?;

        Ok(address.trim().to_string())
    }

    async fn run_backup(&self, command: &Path, image_path: &Path) -> Result<i32, Self::Error> {
        tracing::debug!(
            "Running backup command: {} start -c {}",
            command.display(),
            image_path.display()
        );

        let status = Command::new(command)
            .arg("start")
            .arg("-c")
            .arg(image_path)
            .status()
            .await
            .with_context(|| format!("Launching the backup command {}", command.display()))?;

        Ok(status.code().unwrap_or(1))
    }
}

/// The operand of the `dev` keyword in the first default route line of
/// `ip route show default` output.
fn default_route_interface(route_output: &str) -> Option<&str> {
    let line = route_output.lines().find(|line| line.starts_with("default"))?;
    let mut tokens = line.split_whitespace();
    tokens.find(|token| *token == "dev")?;
    tokens.next()
}

/// Mount paths in /proc/mounts carry octal escapes for special characters
/// (e.g. `\040` for a space).
fn decode_mount_path(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        let digits: String = chars.by_ref().take(3).collect();
        match u8::from_str_radix(&digits, 8) {
            Ok(code) => result.push(char::from(code)),
            Err(_) => {
                result.push('\\');
                result.push_str(&digits);
            }
        }
    }
    result
}
