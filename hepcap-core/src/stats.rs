//! Process-wide ingest counters (spec §3.3, §4.7) and the periodic reporter
//! that drains and logs them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::ingest::dispatcher::SinkHandles;

/// Atomic counters shared across the receiver, worker pool, and dispatcher.
///
/// Reset to zero after each periodic report.
#[derive(Debug, Default)]
pub struct Stats {
    pkt_count: AtomicU64,
    hep_count: AtomicU64,
    dup_count: AtomicU64,
    err_count: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSnapshot {
    pub pkt_count: u64,
    pub hep_count: u64,
    pub dup_count: u64,
    pub err_count: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr_pkt(&self) {
        self.pkt_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_hep(&self) {
        self.hep_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Hook for future deduplication (spec §9: declared but never
    /// incremented in the reference; the policy is not guessed here).
    #[allow(dead_code)]
    pub fn incr_dup(&self) {
        self.dup_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_err(&self) {
        self.err_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            pkt_count: self.pkt_count.load(Ordering::Relaxed),
            hep_count: self.hep_count.load(Ordering::Relaxed),
            dup_count: self.dup_count.load(Ordering::Relaxed),
            err_count: self.err_count.load(Ordering::Relaxed),
        }
    }

    /// Atomically read and zero all four counters (spec §4.7: "reset to
    /// zero after each periodic report").
    pub fn take(&self) -> StatsSnapshot {
        StatsSnapshot {
            pkt_count: self.pkt_count.swap(0, Ordering::Relaxed),
            hep_count: self.hep_count.swap(0, Ordering::Relaxed),
            dup_count: self.dup_count.swap(0, Ordering::Relaxed),
            err_count: self.err_count.swap(0, Ordering::Relaxed),
        }
    }
}

/// Runs until `shutdown` fires, emitting one info-level line per tick with
/// the counters (then zeroing them) and the current depth of each sink
/// queue (spec §4.7).
pub async fn run_reporter(
    stats: Arc<Stats>,
    sinks: Arc<SinkHandles>,
    period: Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await; // first tick fires immediately; skip it

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snap = stats.take();
                info!(
                    pkt_count = snap.pkt_count,
                    hep_count = snap.hep_count,
                    dup_count = snap.dup_count,
                    err_count = snap.err_count,
                    "ingest stats"
                );
                let depths = sinks.queue_depths();
                info!(
                    db_queue = depths.db,
                    mq_queue = depths.mq,
                    metric_queue = depths.metric,
                    "sink queue depths"
                );
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_resets_to_zero() {
        let stats = Stats::new();
        stats.incr_pkt();
        stats.incr_hep();
        stats.incr_err();

        let snap = stats.take();
        assert_eq!(snap.pkt_count, 1);
        assert_eq!(snap.hep_count, 1);
        assert_eq!(snap.err_count, 1);
        assert_eq!(snap.dup_count, 0);

        let after = stats.snapshot();
        assert_eq!(after.pkt_count, 0);
        assert_eq!(after.hep_count, 0);
        assert_eq!(after.err_count, 0);
    }
}
