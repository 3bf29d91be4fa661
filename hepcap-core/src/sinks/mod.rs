//! Sink consumers (spec §6.3): opaque external workers draining one of the
//! dispatcher's three queues. The concrete DB/MQ/Prometheus clients are out
//! of scope (spec §1); the default implementations here stand in for them so
//! the crate is a runnable, testable whole, and are drop-in replaceable by
//! implementing [`Sink`] against a real backend.

mod db;
mod metric;
mod mq;

pub use db::LoggingDbSink;
pub use metric::LoggingMetricSink;
pub use mq::LoggingMqSink;

use std::future::Future;

use tokio::sync::mpsc::Receiver;

/// A sink consumer: drains its queue until the channel closes, then returns.
///
/// `Item` is the payload type the dispatcher hands this sink (a decoded
/// [`crate::codec::Packet`] for the DB and metric sinks, raw wire bytes for
/// the MQ sink).
pub trait Sink: Send + Sync + 'static {
    type Item: Send + 'static;

    fn run(self, rx: Receiver<Self::Item>) -> impl Future<Output = ()> + Send;
}
