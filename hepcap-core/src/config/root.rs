use serde::Deserialize;

use super::hep::HepConfig;
use super::logging::LoggingConfig;
use super::sinks::{DbConfig, MetricsConfig, MqConfig, SentryConfig};

/// Process-wide configuration, read once at startup (spec §6.4).
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Ingest-side settings: bind address and worker count.
    pub hep: HepConfig,
    /// Database sink. Enabled when present.
    #[serde(default)]
    pub db: Option<DbConfig>,
    /// Message-queue sink. Enabled when present.
    #[serde(default)]
    pub mq: Option<MqConfig>,
    /// Metrics sink and scrape server. Enabled when present.
    #[serde(default)]
    pub metrics: Option<MetricsConfig>,
    /// Optional error-reporting endpoint for decode failures.
    #[serde(default)]
    pub sentry: Option<SentryConfig>,
    /// Structured logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn db_enabled(&self) -> bool {
        self.db.is_some()
    }

    pub fn mq_enabled(&self) -> bool {
        self.mq.is_some()
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics.is_some()
    }
}
