//! The ingest pipeline: UDP receiver → worker pool → sink dispatcher (spec
//! §2, §4.4-§4.6), owned end-to-end by [`IngestServer`].

pub mod dispatcher;
pub mod receiver;
pub mod server;
pub mod worker;

pub use server::{IngestServer, SHUTDOWN_GRACE};
