mod hep;
mod loader;
mod logging;
mod root;
mod sinks;

pub use hep::HepConfig;
pub use loader::load_from_path;
pub use logging::LoggingConfig;
pub use root::Config;
pub use sinks::{DbConfig, MetricsConfig, MqConfig, SentryConfig};
