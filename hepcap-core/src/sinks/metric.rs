use std::sync::Arc;

use tokio::sync::mpsc::Receiver;
use tracing::{debug, info};

use crate::codec::Packet;
use crate::sinks::Sink;
use crate::telemetry::Metrics;

/// Default metrics sink: records arrivals via [`Metrics`], which is itself
/// scraped over the `/metrics` HTTP endpoint (spec §6.3, configured by
/// `promAddr`). The scrape surface is exposed separately by
/// [`crate::telemetry::start_metrics_server`]; this sink only counts.
pub struct LoggingMetricSink {
    metrics: Arc<Metrics>,
}

impl LoggingMetricSink {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

impl Sink for LoggingMetricSink {
    type Item = Arc<Packet>;

    async fn run(self, mut rx: Receiver<Self::Item>) {
        info!("metric sink started");
        while let Some(packet) = rx.recv().await {
            self.metrics.metric_exports_total.add(1, &[]);
            debug!(proto_type = packet.proto_type, "metric export");
        }
        info!("metric sink stopped");
    }
}
