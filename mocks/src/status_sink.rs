use async_trait::async_trait;
use mqtt_reporter::traits::StatusSink;

#[must_use]
pub fn make_status_sink_mock() -> MockStatusReporter {
    MockStatusReporter::new()
}

mockall::mock! {
    pub StatusReporter {}

    #[async_trait]
    impl StatusSink for StatusReporter {
        async fn publish_state(&self, state: &str);
        async fn publish(&self, topic: &str, payload: &str);
    }
}
