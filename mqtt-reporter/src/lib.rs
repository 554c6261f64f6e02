use std::time::Duration;

use async_trait::async_trait;
use config::MqttReporterConfig;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, LastWill, MqttOptions, Outgoing, Packet, QoS,
};
use tokio::sync::oneshot;
use traits::StatusSink;

pub mod config;
pub mod traits;

/// Device state published on the bare namespace topic while a run is active.
pub const STATE_BUSY: &str = "busy";
/// Device state the broker shows when the connection is gone, either through
/// the last will or the clean shutdown.
pub const STATE_OFFLINE: &str = "offline";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_CHANNEL_CAPACITY: usize = 100;

#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("Broker rejected the connection: {0:?}")]
    ConnectionRefused(ConnectReturnCode),
    #[error("Connection failed before the broker acknowledged it: {0}")]
    Connection(#[from] rumqttc::ConnectionError),
    #[error("No connect acknowledgement within {CONNECT_TIMEOUT:?}")]
    Timeout,
}

/// Publishes run status over MQTT. The connection is established once, with
/// a last-will `offline` message registered, and driven by a background task
/// until [`MqttReporter::shutdown`].
pub struct MqttReporter {
    client: AsyncClient,
    namespace: String,
    qos: QoS,
    retain: bool,
    task_handle: Option<tokio::task::JoinHandle<()>>,
    stop_sender: Option<oneshot::Sender<()>>,
}

impl MqttReporter {
    /// Connect to the broker and wait for its acknowledgement, so that the
    /// first status publish cannot race the connection setup.
    pub async fn connect(config: MqttReporterConfig) -> anyhow::Result<Self> {
        let qos = qos_from_level(config.qos)?;
        let mqtt_options: MqttOptions = (&config).try_into()?;

        if let Some(bind_address) = &config.bind_address {
            tracing::warn!(
                "A bind address ({bind_address}) is configured, but binding the local address is not supported; ignoring it"
            );
        }

        tracing::info!(
            "Connecting to mqtt server: {}:{}",
            mqtt_options.broker_address().0,
            mqtt_options.broker_address().1,
        );

        let (client, mut eventloop) = AsyncClient::new(mqtt_options, REQUEST_CHANNEL_CAPACITY);

        wait_for_connack(&mut eventloop).await?;

        let (stop_sender, stop_receiver) = oneshot::channel();
        let task_handle = tokio::task::spawn(drive_eventloop(eventloop, stop_receiver));

        Ok(Self {
            client,
            namespace: config.pub_topic_namespace,
            qos,
            retain: config.retain,
            task_handle: Some(task_handle),
            stop_sender: Some(stop_sender),
        })
    }

    /// Announce `offline` on the namespace topic and tear the connection
    /// down cleanly. The broker ends up in the same retained state the last
    /// will would have produced.
    pub async fn shutdown(mut self) {
        self.publish_state(STATE_OFFLINE).await;

        let _ = self
            .client
            .disconnect()
            .await
            .inspect_err(|e| tracing::debug!("Mqtt disconnect request failed: {e}"));

        if let Some(task_handle) = self.task_handle.take() {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, task_handle).await.is_err() {
                tracing::debug!("Mqtt event loop did not stop in time");
                if let Some(stop_sender) = self.stop_sender.take() {
                    let _ = stop_sender.send(());
                }
            }
        }
    }
}

#[async_trait]
impl StatusSink for MqttReporter {
    async fn publish_state(&self, state: &str) {
        tracing::debug!("MQTT pub: {}: {}", self.namespace, state);
        let _ = self
            .client
            .publish(&self.namespace, self.qos, true, state)
            .await
            .inspect_err(|e| tracing::warn!("Publishing state `{state}` failed: {e}"));
    }

    async fn publish(&self, topic: &str, payload: &str) {
        let topic = format!("{}/{}", self.namespace, topic);
        tracing::debug!("MQTT pub: {topic}: {payload}");
        let _ = self
            .client
            .publish(topic.as_str(), self.qos, self.retain, payload)
            .await
            .inspect_err(|e| tracing::warn!("Publishing to `{topic}` failed: {e}"));
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<(), ConnectError> {
    tokio::time::timeout(CONNECT_TIMEOUT, async {
        loop {
            match eventloop.poll().await? {
                Event::Incoming(Packet::ConnAck(ack)) => {
                    if ack.code == ConnectReturnCode::Success {
                        tracing::debug!("Mqtt broker acknowledged the connection");
                        return Ok(());
                    }
                    return Err(ConnectError::ConnectionRefused(ack.code));
                }
                Event::Incoming(_) | Event::Outgoing(_) => (),
            }
        }
    })
    .await
    .map_err(|_elapsed| ConnectError::Timeout)?
}

async fn drive_eventloop(mut eventloop: EventLoop, mut stop_receiver: oneshot::Receiver<()>) {
    loop {
        match stop_receiver.try_recv() {
            Ok(()) => break,
            Err(e) => match e {
                oneshot::error::TryRecvError::Empty => (),
                oneshot::error::TryRecvError::Closed => break,
            },
        }

        match eventloop.poll().await {
            // The disconnect going out means every earlier publish request
            // has been flushed; nothing is left to drive.
            Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
            Ok(_) => (),
            Err(e) => {
                tracing::debug!("Mqtt connection error: {e}");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

fn qos_from_level(level: u8) -> anyhow::Result<QoS> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(anyhow::anyhow!(
            "Invalid qos level {other}; must be 0, 1 or 2"
        )),
    }
}

fn set_credentials(
    config: &MqttReporterConfig,
    mqtt_options: &mut MqttOptions,
) -> anyhow::Result<()> {
    match (&config.username, &config.password) {
        (Some(u), Some(p)) => {
            tracing::info!("Setting username and password for mqtt connection");
            mqtt_options.set_credentials(u, p);
        }
        (None, None) => {
            tracing::info!("No username and password used for mqtt connection");
        }
        (_, _) => {
            return Err(anyhow::anyhow!(
                "Username and password must be either both specified or both unspecified"
            ));
        }
    }

    Ok(())
}

impl TryFrom<&MqttReporterConfig> for MqttOptions {
    type Error = anyhow::Error;

    fn try_from(config: &MqttReporterConfig) -> Result<Self, Self::Error> {
        let mut mqtt_options = MqttOptions::new(&config.client_id, &config.host, config.port);
        mqtt_options.set_keep_alive(Duration::from_secs(config.keepalive_seconds));

        // The will makes sure the device registers as offline when the
        // connection is lost
        mqtt_options.set_last_will(LastWill::new(
            &config.pub_topic_namespace,
            STATE_OFFLINE,
            qos_from_level(config.qos)?,
            true,
        ));

        set_credentials(config, &mut mqtt_options)?;

        Ok(mqtt_options)
    }
}
