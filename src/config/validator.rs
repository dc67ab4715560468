//! Config validation: durations, pool sizes, timeouts.

use crate::config::{AppConfig, DbConfig};
use crate::error::ConfigError;
use std::time::Duration;

/// Pool idle timeout from `db.maxIdleTime`. Accepts humantime spans such as
/// `15m`, `250ms` or compound `1h30m`.
pub fn idle_timeout(db: &DbConfig) -> Result<Duration, ConfigError> {
    humantime::parse_duration(db.max_idle_time.trim()).map_err(|e| ConfigError::InvalidValue {
        key: "db.maxIdleTime",
        message: format!("'{}' is not a duration: {}", db.max_idle_time, e),
    })
}

pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    if config.db.dsn.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "db.dsn",
            message: "must be provided".into(),
        });
    }
    if config.db.max_open_conns == 0 {
        return Err(ConfigError::InvalidValue {
            key: "db.maxOpenConns",
            message: "must be at least 1".into(),
        });
    }
    if config.db.max_idle_conns > config.db.max_open_conns {
        return Err(ConfigError::InvalidValue {
            key: "db.maxIdleConns",
            message: format!("must not exceed maxOpenConns ({})", config.db.max_open_conns),
        });
    }
    idle_timeout(&config.db)?;
    if config.query_timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: "queryTimeoutSecs",
            message: "must be at least 1".into(),
        });
    }
    Ok(())
}
