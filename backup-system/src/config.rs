use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CIFS_USER: &str = "";
const DEFAULT_CIFS_PASSWORD: &str = "";
const DEFAULT_CIFS_SHARE: &str = "//10.0.0.2/backup";
const DEFAULT_CIFS_TARGET: &str = "/media/backup";
const DEFAULT_CIFS_SUB_DIR: &str = "";
const DEFAULT_BACKUP_COMMAND: &str = "/opt/bkup_rpimage/bkup_rpimage.sh";
const DEFAULT_IMAGE_BASE_NAME: &str = "sdimage";
const DEFAULT_FULL_BACKUP_INTERVAL: &str = "monthly";
const DEFAULT_MQTT_CLIENT_ID: &str = "rpi-backup";
const DEFAULT_MQTT_HOST: &str = "127.0.0.1";
const DEFAULT_MQTT_PORT: u16 = 1883;
const DEFAULT_MQTT_KEEPALIVE_SECONDS: u64 = 60;
const DEFAULT_MQTT_QOS: u8 = 0;
const DEFAULT_MQTT_TOPIC_NAMESPACE: &str = "pi/backup";
const DEFAULT_MQTT_RETAIN: bool = true;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Config file doesn't exist in the provided (or default) path: {0}")]
    ConfigFileDoesNotExist(PathBuf),
    #[error("File exists but it could not be read to a string for parsing: {0}")]
    FileExistsButCannotBeReadToString(std::io::Error),
    #[error("Could not parse file to config; either invalid json or missing config: {0}")]
    FileFormatCouldNotBeParsed(serde_json::Error),
}

/// The three settings sections, each a partial override of compiled-in
/// defaults. Unknown keys, in the file root and inside the sections, are
/// ignored.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct BackupRunConfig {
    #[serde(default)]
    cifs: CifsSection,
    #[serde(default)]
    backup: BackupSection,
    #[serde(default)]
    mqtt: MqttSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
struct CifsSection {
    user: Option<String>,
    password: Option<String>,
    share: Option<String>,
    target: Option<PathBuf>,
    #[serde(rename = "subDir")]
    sub_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
struct BackupSection {
    command: Option<PathBuf>,
    image_base_name: Option<String>,
    full_backup_interval: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
struct MqttSection {
    client_id: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    keepalive: Option<u64>,
    bind_address: Option<String>,
    username: Option<String>,
    password: Option<String>,
    qos: Option<u8>,
    pub_topic_namespace: Option<String>,
    retain: Option<bool>,
}

impl BackupRunConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<BackupRunConfig, ConfigError> {
        if !path.as_ref().exists() {
            return Err(ConfigError::ConfigFileDoesNotExist(
                path.as_ref().to_path_buf(),
            ));
        }

        let config_file_data = std::fs::read_to_string(path)
            .map_err(ConfigError::FileExistsButCannotBeReadToString)?;

        let config: BackupRunConfig = serde_json::from_str(&config_file_data)
            .map_err(ConfigError::FileFormatCouldNotBeParsed)?;

        Ok(config)
    }

    pub fn cifs_user(&self) -> &str {
        self.cifs.user.as_deref().unwrap_or(DEFAULT_CIFS_USER)
    }

    pub fn cifs_password(&self) -> &str {
        self.cifs
            .password
            .as_deref()
            .unwrap_or(DEFAULT_CIFS_PASSWORD)
    }

    pub fn cifs_share(&self) -> &str {
        self.cifs.share.as_deref().unwrap_or(DEFAULT_CIFS_SHARE)
    }

    pub fn cifs_target(&self) -> &Path {
        self.cifs
            .target
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_CIFS_TARGET))
    }

    pub fn cifs_sub_dir(&self) -> &str {
        self.cifs.sub_dir.as_deref().unwrap_or(DEFAULT_CIFS_SUB_DIR)
    }

    pub fn backup_command(&self) -> &Path {
        self.backup
            .command
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_BACKUP_COMMAND))
    }

    pub fn image_base_name(&self) -> &str {
        self.backup
            .image_base_name
            .as_deref()
            .unwrap_or(DEFAULT_IMAGE_BASE_NAME)
    }

    pub fn full_backup_interval(&self) -> &str {
        self.backup
            .full_backup_interval
            .as_deref()
            .unwrap_or(DEFAULT_FULL_BACKUP_INTERVAL)
    }

    pub fn mqtt_client_id(&self) -> &str {
        self.mqtt
            .client_id
            .as_deref()
            .unwrap_or(DEFAULT_MQTT_CLIENT_ID)
    }

    pub fn mqtt_host(&self) -> &str {
        self.mqtt.host.as_deref().unwrap_or(DEFAULT_MQTT_HOST)
    }

    pub fn mqtt_port(&self) -> u16 {
        self.mqtt.port.unwrap_or(DEFAULT_MQTT_PORT)
    }

    pub fn mqtt_keepalive_seconds(&self) -> u64 {
        self.mqtt.keepalive.unwrap_or(DEFAULT_MQTT_KEEPALIVE_SECONDS)
    }

    /// An empty configured value counts as unset, like the original default.
    pub fn mqtt_bind_address(&self) -> Option<&str> {
        self.mqtt
            .bind_address
            .as_deref()
            .filter(|address| !address.is_empty())
    }

    pub fn mqtt_username(&self) -> Option<&str> {
        self.mqtt.username.as_deref()
    }

    pub fn mqtt_password(&self) -> Option<&str> {
        self.mqtt.password.as_deref()
    }

    pub fn mqtt_qos(&self) -> u8 {
        self.mqtt.qos.unwrap_or(DEFAULT_MQTT_QOS)
    }

    pub fn mqtt_pub_topic_namespace(&self) -> &str {
        self.mqtt
            .pub_topic_namespace
            .as_deref()
            .unwrap_or(DEFAULT_MQTT_TOPIC_NAMESPACE)
    }

    pub fn mqtt_retain(&self) -> bool {
        self.mqtt.retain.unwrap_or(DEFAULT_MQTT_RETAIN)
    }
}
