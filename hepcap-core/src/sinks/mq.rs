use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, info};

use crate::sinks::Sink;
use crate::telemetry::Metrics;

/// Default message-queue sink: receives the raw wire bytes (not the decoded
/// form, per spec §3.2/§4.6) so downstream consumers can re-decode with
/// [`crate::codec::decode`].
///
/// Stands in for the out-of-scope concrete MQ client (spec §1, §6.3,
/// configured by `mqName`/`mqAddr`/`mqTopic`).
pub struct LoggingMqSink {
    name: String,
    topic: String,
    metrics: Arc<Metrics>,
}

impl LoggingMqSink {
    pub fn new(name: impl Into<String>, topic: impl Into<String>, metrics: Arc<Metrics>) -> Self {
        Self { name: name.into(), topic: topic.into(), metrics }
    }
}

impl Sink for LoggingMqSink {
    type Item = Bytes;

    async fn run(self, mut rx: Receiver<Self::Item>) {
        info!(name = %self.name, topic = %self.topic, "mq sink started");
        while let Some(wire) = rx.recv().await {
            self.metrics.mq_publishes_total.add(1, &[]);
            debug!(name = %self.name, topic = %self.topic, bytes = wire.len(), "mq publish");
        }
        info!(name = %self.name, topic = %self.topic, "mq sink stopped");
    }
}
