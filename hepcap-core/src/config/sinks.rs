use serde::Deserialize;

/// Database sink configuration (spec §6.4: `dbDriver`, `dbAddr`).
/// Presence of this section enables the DB sink.
#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    /// SQL dialect the out-of-scope concrete writer should use.
    pub driver: String,
    /// Connection string/address for the database.
    pub addr: String,
}

/// Message-queue sink configuration (spec §6.4: `mqName`, `mqAddr`, `mqTopic`).
/// Presence of this section enables the MQ sink.
#[derive(Debug, Deserialize, Clone)]
pub struct MqConfig {
    /// Name of the MQ client/driver (e.g. "kafka", "nsq").
    pub name: String,
    /// Broker address.
    pub addr: String,
    /// Topic/queue to publish raw HEP bytes onto.
    pub topic: String,
}

/// Metrics sink configuration (spec §6.4: `promAddr`).
/// Presence of this section enables the metrics sink and its scrape server.
#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    /// Address the Prometheus scrape endpoint listens on.
    pub addr: std::net::SocketAddr,
}

/// Optional error-reporting endpoint for decode failures (spec §6.4: `sentryDSN`).
#[derive(Debug, Deserialize, Clone)]
pub struct SentryConfig {
    pub dsn: String,
}
