use std::net::SocketAddr;

use serde::Deserialize;

/// Ingest-side configuration (spec §6.4: `hepAddr`, `hepWorkers`).
#[derive(Debug, Deserialize, Clone)]
pub struct HepConfig {
    /// UDP bind address for ingest.
    /// Example: "0.0.0.0:9060"
    pub addr: SocketAddr,
    /// Number of worker tasks in the decode/enrich/dispatch pool.
    /// Default: 4.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Capacity of the inbound queue between the UDP receiver and the
    /// worker pool. Default: 10_000, matching the per-sink queue capacity.
    #[serde(default = "default_inbound_capacity")]
    pub inbound_capacity: usize,
}

fn default_workers() -> usize {
    4
}

fn default_inbound_capacity() -> usize {
    10_000
}
