//! Prometheus scrape endpoint for the ingest pipeline's counters (spec §6.4
//! `promAddr`, §9 "C9 Telemetry").

mod metrics;
mod metrics_handler;
mod server;

pub use metrics::{init_metrics, Metrics};
pub use metrics_handler::handle_metrics;
pub use server::start_metrics_server;
