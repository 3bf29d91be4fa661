use serde::Deserialize;

/// Application-level structured logging configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    /// Default: "info". Can be overridden at runtime via `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Show module path (target) in log messages. Default: false.
    #[serde(default)]
    pub show_target: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}
