/// Connection and publishing settings for the status reporter.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MqttReporterConfig {
    pub client_id: String,
    pub host: String,
    pub port: u16,
    pub keepalive_seconds: u64,
    /// Accepted for config compatibility; the transport cannot bind a local
    /// address, so a set value only produces a warning.
    pub bind_address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Numeric MQTT QoS level, 0 to 2.
    pub qos: u8,
    /// All topics are published under this namespace; the bare namespace
    /// itself carries the device state.
    pub pub_topic_namespace: String,
    pub retain: bool,
}
