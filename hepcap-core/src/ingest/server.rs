//! `IngestServer`: the owning value that holds every long-lived task handle
//! and channel for one running instance of the pipeline (spec §9: "these
//! become named, owned fields on an ingest-server value, created at start
//! and torn down at stop, so tests can instantiate isolated servers").

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use crate::buffer::BufferPool;
use crate::codec::Packet;
use crate::config::Config;
use crate::error::Result;
use crate::error_reporter::{ErrorReporter, NoopReporter, SentryReporter};
use crate::ingest::dispatcher::{self, QueueDepths, SinkHandles};
use crate::ingest::{receiver, worker};
use crate::sinks::{LoggingDbSink, LoggingMetricSink, LoggingMqSink, Sink};
use crate::sip::{ScanningSipParser, SipParser};
use crate::stats::{self, Stats, StatsSnapshot};
use crate::telemetry::{self, Metrics};

/// Interval between stats reports (spec §4.7).
const STATS_PERIOD: Duration = Duration::from_secs(60);

/// Grace period the previous time-based shutdown used to allow (spec §4.4).
/// No longer slept on: shutdown now joins tasks deterministically (spec §9,
/// design note 4), but the constant is kept as the documented upper bound a
/// caller should expect `shutdown` to take in the worst case.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A running ingest pipeline: one UDP receiver, `W` workers, one stats
/// reporter, one consumer task per enabled sink, and (if configured) the
/// metrics scrape server.
pub struct IngestServer {
    shutdown_tx: watch::Sender<bool>,
    receiver_handle: JoinHandle<Result<()>>,
    worker_handles: Vec<JoinHandle<()>>,
    stats_handle: JoinHandle<()>,
    sink_handles: Vec<JoinHandle<()>>,
    metrics_server_handle: Option<JoinHandle<Result<()>>>,
    sinks: Arc<SinkHandles>,
    stats: Arc<Stats>,
    metrics: Arc<Metrics>,
}

impl IngestServer {
    /// Starts the pipeline with the default [`ScanningSipParser`] and an
    /// [`ErrorReporter`] selected by `config.sentry`.
    pub async fn start(config: Config) -> Result<Self> {
        let sip_parser: Arc<dyn SipParser> = Arc::new(ScanningSipParser);
        let error_reporter: Arc<dyn ErrorReporter> = match &config.sentry {
            Some(sentry) => Arc::new(SentryReporter::new(sentry.dsn.clone())),
            None => Arc::new(NoopReporter),
        };
        Self::start_with(config, sip_parser, error_reporter).await
    }

    /// Starts the pipeline with explicit [`SipParser`]/[`ErrorReporter`]
    /// implementations, so tests can substitute recording doubles without
    /// touching global state.
    pub async fn start_with(
        config: Config,
        sip_parser: Arc<dyn SipParser>,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> Result<Self> {
        let (metrics, registry) = telemetry::init_metrics()
            .map_err(|e| crate::error::HepError::Config(format!("failed to init metrics: {e}")))?;
        let metrics = Arc::new(metrics);

        let stats = Arc::new(Stats::new());
        let pool = Arc::new(BufferPool::with_capacity(config.hep.workers * 2));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let db_tx = config
            .db
            .as_ref()
            .map(|_| mpsc::channel::<Arc<Packet>>(dispatcher::QUEUE_CAPACITY));
        let mq_tx = config
            .mq
            .as_ref()
            .map(|_| mpsc::channel::<Bytes>(dispatcher::QUEUE_CAPACITY));
        let metric_tx = config
            .metrics
            .as_ref()
            .map(|_| mpsc::channel::<Arc<Packet>>(dispatcher::QUEUE_CAPACITY));

        let sinks = Arc::new(SinkHandles::new(
            db_tx.as_ref().map(|(tx, _)| tx.clone()),
            mq_tx.as_ref().map(|(tx, _)| tx.clone()),
            metric_tx.as_ref().map(|(tx, _)| tx.clone()),
            metrics.clone(),
        ));

        let mut sink_handles = Vec::new();
        if let (Some(db), Some((_, rx))) = (&config.db, db_tx) {
            let sink = LoggingDbSink::new(db.driver.clone(), metrics.clone());
            sink_handles.push(tokio::spawn(sink.run(rx)));
        }
        if let (Some(mq), Some((_, rx))) = (&config.mq, mq_tx) {
            let sink = LoggingMqSink::new(mq.name.clone(), mq.topic.clone(), metrics.clone());
            sink_handles.push(tokio::spawn(sink.run(rx)));
        }
        if let Some((_, rx)) = metric_tx {
            let sink = LoggingMetricSink::new(metrics.clone());
            sink_handles.push(tokio::spawn(sink.run(rx)));
        }

        let metrics_server_handle = match &config.metrics {
            Some(metrics_cfg) => {
                let addr = metrics_cfg.addr;
                let shutdown_rx = shutdown_rx.clone();
                Some(tokio::spawn(telemetry::start_metrics_server(addr, registry, shutdown_rx)))
            }
            None => None,
        };

        let (inbound_tx, inbound_rx) = mpsc::channel(config.hep.inbound_capacity);

        let receiver_handle = tokio::spawn(receiver::run(
            config.hep.addr,
            pool.clone(),
            inbound_tx,
            stats.clone(),
            shutdown_rx.clone(),
        ));

        let worker_count = config.hep.workers.max(1);
        let inbound_rx = Arc::new(tokio::sync::Mutex::new(inbound_rx));
        let mut worker_handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let inbound_rx = inbound_rx.clone();
            let pool = pool.clone();
            let sinks = sinks.clone();
            let stats = stats.clone();
            let metrics = metrics.clone();
            let sip_parser = sip_parser.clone();
            let error_reporter = error_reporter.clone();
            worker_handles.push(tokio::spawn(async move {
                worker_loop(inbound_rx, pool, sinks, stats, metrics, sip_parser, error_reporter).await
            }));
        }

        let stats_handle =
            tokio::spawn(stats::run_reporter(stats.clone(), sinks.clone(), STATS_PERIOD, shutdown_rx));

        info!(addr = %config.hep.addr, workers = worker_count, "ingest server started");

        Ok(Self {
            shutdown_tx,
            receiver_handle,
            worker_handles,
            stats_handle,
            sink_handles,
            metrics_server_handle,
            sinks,
            stats,
            metrics,
        })
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    pub fn queue_depths(&self) -> QueueDepths {
        self.sinks.queue_depths()
    }

    /// Deterministic shutdown (spec §9, design note 4): flip the watch so
    /// the receiver exits on its next timeout boundary, join it (which also
    /// drops the inbound sender, closing the channel), then join the
    /// workers as they drain-and-exit, then the sink consumers and stats
    /// reporter as their channels close behind them.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        match self.receiver_handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "receiver task exited with error"),
            Err(e) => tracing::warn!(error = %e, "receiver task panicked"),
        }
        for handle in self.worker_handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "worker task panicked");
            }
        }

        // the stats reporter holds its own Arc<SinkHandles> clone and exits
        // on the same shutdown watch; join it before dropping ours so the
        // sink channels are guaranteed to lose their last sender next
        if let Err(e) = self.stats_handle.await {
            tracing::warn!(error = %e, "stats reporter task panicked");
        }

        // dropping the last Arc<SinkHandles> closes the sink channels so
        // sink consumer tasks observe end-of-stream and return
        drop(self.sinks);

        for handle in self.sink_handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "sink task panicked");
            }
        }
        if let Some(handle) = self.metrics_server_handle {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "metrics server exited with error"),
                Err(e) => tracing::warn!(error = %e, "metrics server task panicked"),
            }
        }

        info!("ingest server stopped");
    }
}

#[allow(clippy::too_many_arguments)]
async fn worker_loop(
    inbound_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<receiver::InboundMessage>>>,
    pool: Arc<BufferPool>,
    sinks: Arc<SinkHandles>,
    stats: Arc<Stats>,
    metrics: Arc<Metrics>,
    sip_parser: Arc<dyn SipParser>,
    error_reporter: Arc<dyn ErrorReporter>,
) {
    loop {
        let message = {
            let mut rx = inbound_rx.lock().await;
            rx.recv().await
        };
        let Some(message) = message else { break };
        worker::process_one(message, &pool, &sinks, &stats, &metrics, &sip_parser, &error_reporter)
            .await;
    }
}
