use std::path::Path;

use async_trait::async_trait;
use system_ops::traits::{CifsMount, SystemOps};

#[must_use]
pub fn make_system_ops_mock() -> MockSystemOperations {
    MockSystemOperations::new()
}

mockall::mock! {
    pub SystemOperations {}

    #[async_trait]
    impl SystemOps for SystemOperations {
        type Error = anyhow::Error;

        async fn dir_exists(&self, path: &Path) -> Result<bool, anyhow::Error>;
        async fn file_exists(&self, path: &Path) -> Result<bool, anyhow::Error>;
        async fn is_mount_point(&self, path: &Path) -> Result<bool, anyhow::Error>;
        async fn mount_cifs(&self, mount: &CifsMount, target: &Path) -> Result<(), anyhow::Error>;
        async fn unmount(&self, mount_point: &Path) -> Result<(), anyhow::Error>;
        async fn make_dir(&self, path: &Path) -> Result<(), anyhow::Error>;
        async fn hostname(&self) -> Result<String, anyhow::Error>;
        async fn primary_mac(&self) -> Result<String, anyhow::Error>;
        async fn run_backup(&self, command: &Path, image_path: &Path) -> Result<i32, anyhow::Error>;
    }
}
