use std::path::Path;

use async_trait::async_trait;

/// What a CIFS mount needs besides the local target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CifsMount {
    pub share: String,
    pub user: String,
    pub password: String,
}

/// The operations a backup run needs from the operating system. Everything
/// that touches the mount table, the network stack or another process goes
/// through this trait, so tests can run the whole flow without any of them.
#[async_trait]
pub trait SystemOps: Send + Sync {
    type Error;

    async fn dir_exists(&self, path: &Path) -> Result<bool, Self::Error>;
    async fn file_exists(&self, path: &Path) -> Result<bool, Self::Error>;

    /// Whether `path` is currently a mount point.
    async fn is_mount_point(&self, path: &Path) -> Result<bool, Self::Error>;

    /// Issue the CIFS mount command. The command's own outcome does not
    /// decide anything; callers re-check with [`Self::is_mount_point`].
    async fn mount_cifs(&self, mount: &CifsMount, target: &Path) -> Result<(), Self::Error>;

    async fn unmount(&self, mount_point: &Path) -> Result<(), Self::Error>;

    async fn make_dir(&self, path: &Path) -> Result<(), Self::Error>;

    /// The device hostname.
    async fn hostname(&self) -> Result<String, Self::Error>;

    /// The hardware address of the default-route network interface, in the
    /// usual colon-separated form.
    async fn primary_mac(&self) -> Result<String, Self::Error>;

    /// Run the backup command against the given image path and return its
    /// exit code.
    async fn run_backup(&self, command: &Path, image_path: &Path) -> Result<i32, Self::Error>;
}
