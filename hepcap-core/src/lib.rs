#![forbid(unsafe_code)]

//! HEP3 capture pipeline core: decode, SIP enrichment, buffer pool, and a
//! concurrent ingest-to-sinks dispatcher with bounded queues, worker
//! pooling, and backpressure handling.
//!
//! The database schema, message-queue client, and metrics exporter format
//! are out of scope; this crate speaks to them only through the [`sinks`]
//! trait and the [`telemetry`] counters.

pub mod buffer;
pub mod codec;
pub mod config;
pub mod error;
pub mod error_reporter;
pub mod ingest;
pub mod sinks;
pub mod sip;
pub mod stats;
pub mod telemetry;

pub use codec::Packet;
pub use config::{load_from_path, Config};
pub use error::{HepError, Result};
pub use ingest::IngestServer;
pub use stats::{Stats, StatsSnapshot};
