use std::path::PathBuf;

/// Everything that can abort a backup run. Each variant carries the exact
/// process exit code and knows whether the share should still be unmounted
/// on the way out.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BackupError {
    #[error("Invalid mount point {}", .0.display())]
    InvalidMountPoint(PathBuf),
    #[error("Failed to mount backup volume {}", .0.display())]
    MountFailed(PathBuf),
    #[error("Invalid backup directory {}", .0.display())]
    InvalidBackupDirectory(PathBuf),
    #[error("Failed to resolve device identity: {0}")]
    DeviceIdentityUnavailable(String),
    #[error("Failed to create {}", .0.display())]
    DirectoryCreationFailed(PathBuf),
    #[error("Backup stopped with exit code {0}")]
    BackupStopped(i32),
    #[error("Backup command failed to run: {0}")]
    BackupCommandFailed(String),
    #[error("Failed to unmount the backup volume")]
    UnmountFailed,
}

impl BackupError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            BackupError::InvalidMountPoint(_) => 1,
            BackupError::MountFailed(_) => 2,
            BackupError::InvalidBackupDirectory(_) => 3,
            BackupError::DeviceIdentityUnavailable(_)
            | BackupError::DirectoryCreationFailed(_) => 4,
            BackupError::BackupStopped(_) | BackupError::BackupCommandFailed(_) => 5,
            BackupError::UnmountFailed => 6,
        }
    }

    /// Whether the fatal path should still try to unmount the share. Not
    /// before anything was mounted, and not after an unmount already failed.
    #[must_use]
    pub fn unmount_on_failure(&self) -> bool {
        match self {
            BackupError::InvalidMountPoint(_)
            | BackupError::MountFailed(_)
            | BackupError::UnmountFailed => false,
            BackupError::InvalidBackupDirectory(_)
            | BackupError::DeviceIdentityUnavailable(_)
            | BackupError::DirectoryCreationFailed(_)
            | BackupError::BackupStopped(_)
            | BackupError::BackupCommandFailed(_) => true,
        }
    }
}
