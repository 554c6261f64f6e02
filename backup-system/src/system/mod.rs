#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use mqtt_reporter::{STATE_BUSY, traits::StatusSink};
use system_ops::traits::{CifsMount, SystemOps};
use utils::time_getter::TimeGetter;

use crate::{
    config::BackupRunConfig,
    device::device_directory,
    error::BackupError,
    image::{RotationInterval, image_file_name},
};

pub const TOPIC_LAST_SUCCESS: &str = "last_success";
pub const TOPIC_LAST_ERROR_MESSAGE: &str = "last_error/message";
pub const TOPIC_LAST_ERROR_TIMESTAMP: &str = "last_error/timestamp";

/// One backup run, start to finish. The stages run strictly in order and the
/// first failing stage aborts the run with its [`BackupError`]; the caller
/// hands that to [`BackupSystem::handle_fatal`] exactly once.
pub struct BackupSystem {
    config: BackupRunConfig,
    ops: Box<dyn SystemOps<Error = anyhow::Error>>,
    time_getter: TimeGetter,
}

impl BackupSystem {
    #[must_use]
    pub fn new(
        config: BackupRunConfig,
        ops: Box<dyn SystemOps<Error = anyhow::Error>>,
        time_getter: TimeGetter,
    ) -> Self {
        Self {
            config,
            ops,
            time_getter,
        }
    }

    pub async fn run(&self, sink: &dyn StatusSink) -> Result<(), BackupError> {
        sink.publish_state(STATE_BUSY).await;

        let mount_point = self.config.cifs_target().to_path_buf();

        tracing::debug!("Checking mount point ({})...", mount_point.display());
        if !self.dir_exists(&mount_point).await {
            return Err(BackupError::InvalidMountPoint(mount_point));
        }

        self.mount_share(&mount_point).await;

        tracing::debug!("Checking mount point...");
        if !self.is_mounted(&mount_point).await {
            return Err(BackupError::MountFailed(mount_point));
        }

        let share_backup_path = mount_point.join(self.config.cifs_sub_dir());
        if !self.dir_exists(&share_backup_path).await {
            return Err(BackupError::InvalidBackupDirectory(share_backup_path));
        }

        let backup_path = self.ensure_device_directory(&share_backup_path).await?;

        let image = self.image_name();
        let image_path = backup_path.join(&image);

        if self.file_exists(&image_path).await {
            tracing::info!("Updating {image}");
        } else {
            tracing::info!("Full backup to {image}");
        }

        let exit_code = self
            .ops
            .run_backup(self.config.backup_command(), &image_path)
            .await
            .map_err(|e| BackupError::BackupCommandFailed(e.to_string()))?;
        if exit_code > 0 {
            return Err(BackupError::BackupStopped(exit_code));
        }

        self.ops
            .unmount(&mount_point)
            .await
            .map_err(|_| BackupError::UnmountFailed)?;

        let timestamp = self.time_getter.get_time().as_local_timestamp();
        sink.publish(TOPIC_LAST_SUCCESS, &timestamp).await;

        Ok(())
    }

    /// Report a fatal run error over MQTT and the log, unmount best-effort
    /// where the failed stage calls for it, and hand back the process exit
    /// code.
    pub async fn handle_fatal(&self, error: &BackupError, sink: &dyn StatusSink) -> i32 {
        sink.publish(TOPIC_LAST_ERROR_MESSAGE, &error.to_string())
            .await;
        sink.publish(
            TOPIC_LAST_ERROR_TIMESTAMP,
            &self.time_getter.get_time().as_local_timestamp(),
        )
        .await;

        let exit_code = error.exit_code();
        tracing::error!("{error} [ERR{exit_code}]");

        if error.unmount_on_failure() {
            let _ = self
                .ops
                .unmount(self.config.cifs_target())
                .await
                .inspect_err(|e| tracing::debug!("Best-effort unmount failed: {e}"));
        }

        exit_code
    }

    async fn mount_share(&self, mount_point: &Path) {
        if self.is_mounted(mount_point).await {
            return;
        }

        tracing::debug!("Mounting {}...", mount_point.display());
        let mount = CifsMount {
            share: self.config.cifs_share().to_string(),
            user: self.config.cifs_user().to_string(),
            password: self.config.cifs_password().to_string(),
        };

        // Whether the mount took is decided by the re-check that follows,
        // not by the command itself
        let _ = self
            .ops
            .mount_cifs(&mount, mount_point)
            .await
            .inspect_err(|e| tracing::warn!("Mount command could not be run: {e}"));
    }

    async fn ensure_device_directory(
        &self,
        share_backup_path: &Path,
    ) -> Result<PathBuf, BackupError> {
        let hostname = self
            .ops
            .hostname()
            .await
            .map_err(|e| BackupError::DeviceIdentityUnavailable(e.to_string()))?;
        let mac_address = self
            .ops
            .primary_mac()
            .await
            .map_err(|e| BackupError::DeviceIdentityUnavailable(e.to_string()))?;

        let directory_name = device_directory(&hostname, &mac_address);
        let backup_path = share_backup_path.join(&directory_name);

        if !self.dir_exists(&backup_path).await {
            tracing::info!("Creating directory {directory_name}...");
            let _ = self
                .ops
                .make_dir(&backup_path)
                .await
                .inspect_err(|e| tracing::warn!("Directory creation failed: {e}"));

            if !self.dir_exists(&backup_path).await {
                return Err(BackupError::DirectoryCreationFailed(backup_path));
            }
        }

        Ok(backup_path)
    }

    fn image_name(&self) -> String {
        let interval = RotationInterval::parse(self.config.full_backup_interval());
        let date = self.time_getter.get_time().as_local_date();
        image_file_name(self.config.image_base_name(), interval, date)
    }

    async fn dir_exists(&self, path: &Path) -> bool {
        self.ops.dir_exists(path).await.unwrap_or(false)
    }

    async fn file_exists(&self, path: &Path) -> bool {
        self.ops.file_exists(path).await.unwrap_or(false)
    }

    async fn is_mounted(&self, path: &Path) -> bool {
        self.ops.is_mount_point(path).await.unwrap_or(false)
    }
}
