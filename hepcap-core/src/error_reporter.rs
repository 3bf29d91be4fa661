//! Optional error-reporting hook for decode/enrichment failures (spec §6.4
//! `sentryDSN`, §9 design note: "should be behind a small interface so tests
//! can assert on emissions").

use std::sync::{Arc, Mutex};

use crate::error::HepError;

/// Sink for decode/enrichment failures the ingest pipeline wants surfaced to
/// an external aggregator. Implementations must not block the worker that
/// calls them for long; `report` is invoked inline on the hot path.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, err: &HepError);
}

/// Default reporter: discards everything. Used when `sentryDSN` is absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ErrorReporter for NoopReporter {
    fn report(&self, _err: &HepError) {}
}

/// Minimal DSN-holding reporter stand-in for a real Sentry client.
///
/// The concrete transport is out of scope (spec §1); this only logs, so a
/// `sentryDSN` configuration has an observable effect without pulling in a
/// Sentry SDK dependency the core doesn't otherwise need.
#[derive(Debug, Clone)]
pub struct SentryReporter {
    dsn: String,
}

impl SentryReporter {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self { dsn: dsn.into() }
    }
}

impl ErrorReporter for SentryReporter {
    fn report(&self, err: &HepError) {
        tracing::warn!(dsn = %self.dsn, error = %err, "reporting decode failure");
    }
}

/// Test double that records every emission for assertion.
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    emitted: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emissions(&self) -> Vec<String> {
        self.emitted.lock().expect("recording reporter mutex poisoned").clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, err: &HepError) {
        self.emitted.lock().expect("recording reporter mutex poisoned").push(err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_reporter_captures_emissions() {
        let reporter = RecordingReporter::new();
        reporter.report(&HepError::Magic);
        assert_eq!(reporter.emissions().len(), 1);
    }

    #[test]
    fn noop_reporter_drops_silently() {
        NoopReporter.report(&HepError::Magic);
    }
}
