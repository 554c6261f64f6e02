use async_trait::async_trait;

/// Where run status gets reported. The mqtt reporter is the real sink; tests
/// substitute their own.
///
/// Publishing is fire-and-forget: a failed publish is logged and never fails
/// the run it reports on.
#[async_trait]
pub trait StatusSink: Send + Sync {
    /// Publish a device state (`busy`, `offline`) on the bare namespace
    /// topic, retained.
    async fn publish_state(&self, state: &str);

    /// Publish a payload on `<namespace>/<topic>` with the configured QoS
    /// and retain flag.
    async fn publish(&self, topic: &str, payload: &str);
}
