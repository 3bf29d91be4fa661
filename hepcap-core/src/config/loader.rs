use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{HepError, Result};

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| HepError::Config(format!("failed to read config file: {e}")))?;
    let cfg: Config =
        toml::from_str(&txt).map_err(|e| HepError::Config(format!("failed to parse config: {e}")))?;

    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.hep.workers == 0 {
        return Err(HepError::Config("hep.workers must be at least 1".to_string()));
    }

    if let Some(mq) = &cfg.mq {
        if mq.topic.is_empty() {
            return Err(HepError::Config("mq.topic must not be empty".to_string()));
        }
    }

    if let Some(db) = &cfg.db {
        if db.driver.is_empty() {
            return Err(HepError::Config("db.driver must not be empty".to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_minimal_config() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, r#"[hep]
addr = "127.0.0.1:9060"
"#)
        .unwrap();

        let cfg = load_from_path(file.path()).expect("load");
        assert_eq!(cfg.hep.addr.to_string(), "127.0.0.1:9060");
        assert_eq!(cfg.hep.workers, 4);
        assert!(!cfg.db_enabled());
        assert!(!cfg.mq_enabled());
        assert!(!cfg.metrics_enabled());
    }

    #[test]
    fn loads_all_sinks() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            r#"
[hep]
addr = "127.0.0.1:9060"
workers = 8

[db]
driver = "postgres"
addr = "postgres://localhost/hep"

[mq]
name = "kafka"
addr = "localhost:9092"
topic = "hep3"

[metrics]
addr = "127.0.0.1:9096"
"#
        )
        .unwrap();

        let cfg = load_from_path(file.path()).expect("load");
        assert_eq!(cfg.hep.workers, 8);
        assert!(cfg.db_enabled());
        assert!(cfg.mq_enabled());
        assert!(cfg.metrics_enabled());
    }

    #[test]
    fn rejects_empty_topic() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            r#"
[hep]
addr = "127.0.0.1:9060"

[mq]
name = "kafka"
addr = "localhost:9092"
topic = ""
"#
        )
        .unwrap();

        assert!(matches!(load_from_path(file.path()), Err(HepError::Config(_))));
    }

    #[test]
    fn rejects_missing_file() {
        assert!(load_from_path("/does/not/exist.toml").is_err());
    }
}
