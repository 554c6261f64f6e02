pub mod config;
pub mod device;
pub mod error;
pub mod image;
pub mod runner;
pub mod system;

use config::BackupRunConfig;
use mqtt_reporter::config::MqttReporterConfig;

impl From<&BackupRunConfig> for MqttReporterConfig {
    fn from(config: &BackupRunConfig) -> Self {
        MqttReporterConfig {
            client_id: config.mqtt_client_id().to_string(),
            host: config.mqtt_host().to_string(),
            port: config.mqtt_port(),
            keepalive_seconds: config.mqtt_keepalive_seconds(),
            bind_address: config.mqtt_bind_address().map(ToOwned::to_owned),
            username: config.mqtt_username().map(ToOwned::to_owned),
            password: config.mqtt_password().map(ToOwned::to_owned),
            qos: config.mqtt_qos(),
            pub_topic_namespace: config.mqtt_pub_topic_namespace().to_string(),
            retain: config.mqtt_retain(),
        }
    }
}
