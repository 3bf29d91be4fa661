use std::sync::Arc;

use tokio::sync::mpsc::Receiver;
use tracing::{debug, info};

use crate::codec::Packet;
use crate::sinks::Sink;
use crate::telemetry::Metrics;

/// Default database sink: records arrivals via `tracing` + [`Metrics`].
///
/// Stands in for the out-of-scope concrete SQL writer (spec §1, §6.3,
/// configured by `dbDriver`/`dbAddr`); a real backend is a drop-in [`Sink`]
/// implementation over the same `Receiver<Packet>`.
pub struct LoggingDbSink {
    driver: String,
    metrics: Arc<Metrics>,
}

impl LoggingDbSink {
    pub fn new(driver: impl Into<String>, metrics: Arc<Metrics>) -> Self {
        Self { driver: driver.into(), metrics }
    }
}

impl Sink for LoggingDbSink {
    type Item = Arc<Packet>;

    async fn run(self, mut rx: Receiver<Self::Item>) {
        info!(driver = %self.driver, "db sink started");
        while let Some(packet) = rx.recv().await {
            self.metrics.db_writes_total.add(1, &[]);
            debug!(driver = %self.driver, src = %packet.src_ip_string, dst = %packet.dst_ip_string, "db write");
        }
        info!(driver = %self.driver, "db sink stopped");
    }
}
