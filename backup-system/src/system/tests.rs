use std::path::Path;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use mockall::Sequence;
use mocks::{status_sink::make_status_sink_mock, system_ops::make_system_ops_mock};
use utils::{time::Time, time_getter::TimeGetter};

use super::*;
use crate::image;

const MOUNT_POINT: &str = "/media/backup";
const DEVICE_DIR: &str = "/media/backup/raspberrypi_b827eb123456";

fn test_config() -> BackupRunConfig {
    serde_json::from_str(r#"{"cifs": {"share": "//10.0.0.9/backup", "user": "pi", "password": "secret"}}"#)
        .unwrap()
}

fn fixed_time() -> Time {
    Time::from_secs_since_epoch(1_710_500_000)
}

// The filename the fixed time should produce with the default monthly
// interval, computed through the same naming routine so the expectation
// doesn't depend on the machine's timezone.
fn expected_image_name() -> String {
    image::image_file_name(
        "sdimage",
        image::RotationInterval::parse("monthly"),
        fixed_time().as_local_date(),
    )
}

fn identity_expectations(ops: &mut mocks::system_ops::MockSystemOperations) {
    ops.expect_hostname()
        .returning(|| Ok("raspberrypi".to_string()));
    ops.expect_primary_mac()
        .returning(|| Ok("b8:27:eb:12:34:56\n".to_string()));
}

#[tokio::test]
async fn successful_run_publishes_busy_then_success() {
    let mut ops = make_system_ops_mock();
    // Already mounted: any mount_cifs call would panic the mock
    ops.expect_is_mount_point().returning(|_| Ok(true));
    ops.expect_dir_exists().returning(|_| Ok(true));
    identity_expectations(&mut ops);
    ops.expect_file_exists().returning(|_| Ok(false));
    ops.expect_run_backup()
        .withf(|command, image_path| {
            command == Path::new("/opt/bkup_rpimage/bkup_rpimage.sh")
                && image_path == Path::new(DEVICE_DIR).join(expected_image_name())
        })
        .times(1)
        .returning(|_, _| Ok(0));
    ops.expect_unmount()
        .withf(|mount_point| mount_point == Path::new(MOUNT_POINT))
        .times(1)
        .returning(|_| Ok(()));

    let mut sink = make_status_sink_mock();
    let mut seq = Sequence::new();
    sink.expect_publish_state()
        .withf(|state| state == STATE_BUSY)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| ());
    sink.expect_publish()
        .withf(|topic, payload| topic == TOPIC_LAST_SUCCESS && !payload.is_empty())
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| ());

    let system = BackupSystem::new(
        test_config(),
        Box::new(ops),
        TimeGetter::fixed(fixed_time()),
    );

    system.run(&sink).await.unwrap();
}

#[tokio::test]
async fn missing_mount_point_aborts_before_anything_else() {
    let mut ops = make_system_ops_mock();
    ops.expect_dir_exists().times(1).returning(|_| Ok(false));

    let mut sink = make_status_sink_mock();
    sink.expect_publish_state()
        .withf(|state| state == STATE_BUSY)
        .times(1)
        .returning(|_| ());

    let system = BackupSystem::new(
        test_config(),
        Box::new(ops),
        TimeGetter::fixed(fixed_time()),
    );

    let error = system.run(&sink).await.unwrap_err();
    assert_eq!(
        error,
        BackupError::InvalidMountPoint(MOUNT_POINT.into())
    );
    assert_eq!(error.exit_code(), 1);
}

#[tokio::test]
async fn failed_mount_gives_code_2_after_one_mount_attempt() {
    let mut ops = make_system_ops_mock();
    ops.expect_dir_exists().returning(|_| Ok(true));
    ops.expect_is_mount_point().times(2).returning(|_| Ok(false));
    ops.expect_mount_cifs()
        .withf(|mount, target| {
            mount.share == "//10.0.0.9/backup"
                && mount.user == "pi"
                && mount.password == "secret"
                && target == Path::new(MOUNT_POINT)
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let mut sink = make_status_sink_mock();
    sink.expect_publish_state().returning(|_| ());

    let system = BackupSystem::new(
        test_config(),
        Box::new(ops),
        TimeGetter::fixed(fixed_time()),
    );

    let error = system.run(&sink).await.unwrap_err();
    assert_eq!(error, BackupError::MountFailed(MOUNT_POINT.into()));
    assert_eq!(error.exit_code(), 2);
}

#[tokio::test]
async fn missing_backup_directory_unmounts_on_the_fatal_path() {
    let config: BackupRunConfig =
        serde_json::from_str(r#"{"cifs": {"subDir": "rpi"}}"#).unwrap();

    let mut ops = make_system_ops_mock();
    ops.expect_is_mount_point().returning(|_| Ok(true));
    ops.expect_dir_exists()
        .returning(|path| Ok(path == Path::new(MOUNT_POINT)));
    // The fatal handler owes the share exactly one unmount attempt
    ops.expect_unmount().times(1).returning(|_| Ok(()));

    let mut sink = make_status_sink_mock();
    sink.expect_publish_state().returning(|_| ());
    let mut seq = Sequence::new();
    sink.expect_publish()
        .withf(|topic, payload| {
            topic == TOPIC_LAST_ERROR_MESSAGE
                && payload == "Invalid backup directory /media/backup/rpi"
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| ());
    sink.expect_publish()
        .withf(|topic, payload| topic == TOPIC_LAST_ERROR_TIMESTAMP && !payload.is_empty())
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| ());

    let system = BackupSystem::new(config, Box::new(ops), TimeGetter::fixed(fixed_time()));

    let error = system.run(&sink).await.unwrap_err();
    assert_eq!(
        error,
        BackupError::InvalidBackupDirectory("/media/backup/rpi".into())
    );

    let exit_code = system.handle_fatal(&error, &sink).await;
    assert_eq!(exit_code, 3);
}

#[tokio::test]
async fn device_directory_is_created_when_absent() {
    let created = Arc::new(AtomicBool::new(false));

    let mut ops = make_system_ops_mock();
    ops.expect_is_mount_point().returning(|_| Ok(true));
    {
        let created = created.clone();
        ops.expect_dir_exists().returning(move |path| {
            if path == Path::new(DEVICE_DIR) {
                Ok(created.load(Ordering::SeqCst))
            } else {
                Ok(true)
            }
        });
    }
    identity_expectations(&mut ops);
    {
        let created = created.clone();
        ops.expect_make_dir()
            .withf(|path| path == Path::new(DEVICE_DIR))
            .times(1)
            .returning(move |_| {
                created.store(true, Ordering::SeqCst);
                Ok(())
            });
    }
    ops.expect_file_exists().returning(|_| Ok(false));
    ops.expect_run_backup().returning(|_, _| Ok(0));
    ops.expect_unmount().times(1).returning(|_| Ok(()));

    let mut sink = make_status_sink_mock();
    sink.expect_publish_state().returning(|_| ());
    sink.expect_publish().returning(|_, _| ());

    let system = BackupSystem::new(
        test_config(),
        Box::new(ops),
        TimeGetter::fixed(fixed_time()),
    );

    system.run(&sink).await.unwrap();
    assert!(created.load(Ordering::SeqCst));
}

#[tokio::test]
async fn failed_directory_creation_gives_code_4() {
    let mut ops = make_system_ops_mock();
    ops.expect_is_mount_point().returning(|_| Ok(true));
    ops.expect_dir_exists()
        .returning(|path| Ok(path != Path::new(DEVICE_DIR)));
    identity_expectations(&mut ops);
    // The mkdir "succeeds" but the directory still isn't there afterwards
    ops.expect_make_dir().times(1).returning(|_| Ok(()));

    let mut sink = make_status_sink_mock();
    sink.expect_publish_state().returning(|_| ());

    let system = BackupSystem::new(
        test_config(),
        Box::new(ops),
        TimeGetter::fixed(fixed_time()),
    );

    let error = system.run(&sink).await.unwrap_err();
    assert_eq!(
        error,
        BackupError::DirectoryCreationFailed(DEVICE_DIR.into())
    );
    assert_eq!(error.exit_code(), 4);
}

#[tokio::test]
async fn unresolvable_device_identity_gives_code_4() {
    let mut ops = make_system_ops_mock();
    ops.expect_is_mount_point().returning(|_| Ok(true));
    ops.expect_dir_exists().returning(|_| Ok(true));
    ops.expect_hostname()
        .returning(|| Err(anyhow::anyhow!("no hostname")));

    let mut sink = make_status_sink_mock();
    sink.expect_publish_state().returning(|_| ());

    let system = BackupSystem::new(
        test_config(),
        Box::new(ops),
        TimeGetter::fixed(fixed_time()),
    );

    let error = system.run(&sink).await.unwrap_err();
    assert_eq!(
        error,
        BackupError::DeviceIdentityUnavailable("no hostname".to_string())
    );
    assert_eq!(error.exit_code(), 4);
}

#[tokio::test]
async fn failing_backup_command_reports_code_5_and_unmounts() {
    let mut ops = make_system_ops_mock();
    ops.expect_is_mount_point().returning(|_| Ok(true));
    ops.expect_dir_exists().returning(|_| Ok(true));
    identity_expectations(&mut ops);
    ops.expect_file_exists().returning(|_| Ok(false));
    ops.expect_run_backup().times(1).returning(|_, _| Ok(3));
    // Only the fatal handler unmounts; the success-path unmount never runs
    ops.expect_unmount().times(1).returning(|_| Ok(()));

    let mut sink = make_status_sink_mock();
    sink.expect_publish_state().returning(|_| ());
    sink.expect_publish()
        .withf(|topic, payload| {
            topic == TOPIC_LAST_ERROR_MESSAGE && payload == "Backup stopped with exit code 3"
        })
        .times(1)
        .returning(|_, _| ());
    sink.expect_publish()
        .withf(|topic, _| topic == TOPIC_LAST_ERROR_TIMESTAMP)
        .times(1)
        .returning(|_, _| ());

    let system = BackupSystem::new(
        test_config(),
        Box::new(ops),
        TimeGetter::fixed(fixed_time()),
    );

    let error = system.run(&sink).await.unwrap_err();
    assert_eq!(error, BackupError::BackupStopped(3));

    let exit_code = system.handle_fatal(&error, &sink).await;
    assert_eq!(exit_code, 5);
}

#[tokio::test]
async fn a_failed_unmount_is_not_retried_by_the_fatal_path() {
    let mut ops = make_system_ops_mock();
    ops.expect_is_mount_point().returning(|_| Ok(true));
    ops.expect_dir_exists().returning(|_| Ok(true));
    identity_expectations(&mut ops);
    ops.expect_file_exists().returning(|_| Ok(false));
    ops.expect_run_backup().returning(|_, _| Ok(0));
    // One failing unmount; a second call would overrun times(1) and panic
    ops.expect_unmount()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("target is busy")));

    let mut sink = make_status_sink_mock();
    sink.expect_publish_state().returning(|_| ());
    sink.expect_publish()
        .withf(|topic, _| topic == TOPIC_LAST_ERROR_MESSAGE || topic == TOPIC_LAST_ERROR_TIMESTAMP)
        .times(2)
        .returning(|_, _| ());

    let system = BackupSystem::new(
        test_config(),
        Box::new(ops),
        TimeGetter::fixed(fixed_time()),
    );

    let error = system.run(&sink).await.unwrap_err();
    assert_eq!(error, BackupError::UnmountFailed);

    let exit_code = system.handle_fatal(&error, &sink).await;
    assert_eq!(exit_code, 6);
}

#[tokio::test]
async fn an_existing_image_is_updated_in_place() {
    let mut ops = make_system_ops_mock();
    ops.expect_is_mount_point().returning(|_| Ok(true));
    ops.expect_dir_exists().returning(|_| Ok(true));
    identity_expectations(&mut ops);
    // The image is already on the share; the run proceeds identically and
    // leaves the incremental-vs-full decision to the backup command
    ops.expect_file_exists()
        .withf(|path| path == Path::new(DEVICE_DIR).join(expected_image_name()))
        .times(1)
        .returning(|_| Ok(true));
    ops.expect_run_backup().times(1).returning(|_, _| Ok(0));
    ops.expect_unmount().times(1).returning(|_| Ok(()));

    let mut sink = make_status_sink_mock();
    sink.expect_publish_state().returning(|_| ());
    sink.expect_publish().returning(|_, _| ());

    let system = BackupSystem::new(
        test_config(),
        Box::new(ops),
        TimeGetter::fixed(fixed_time()),
    );

    system.run(&sink).await.unwrap();
}
