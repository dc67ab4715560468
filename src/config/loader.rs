//! Load config from a JSON file, then apply environment overrides.

use crate::config::{validate, AppConfig};
use crate::error::ConfigError;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.json";

/// Reads `CONFIG_PATH` (default `config/default.json`), applies environment
/// overrides and validates. Call once at startup and pass the value on.
pub fn load() -> Result<AppConfig, ConfigError> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut config = load_file(Path::new(&path))?;
    apply_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

pub fn load_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&raw)?)
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        message: format!("'{}' is not a number", raw),
    })
}

/// Applies `DATABASE_URL`, `PORT`, `APP_ENV`, `DB_MAX_OPEN_CONNS`, `DB_MAX_IDLE_CONNS`,
/// `DB_MAX_IDLE_TIME` and `QUERY_TIMEOUT_SECS` from `lookup`.
pub fn apply_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dsn) = lookup("DATABASE_URL") {
        config.db.dsn = dsn;
    }
    if let Some(port) = lookup("PORT") {
        config.port = parse_number("PORT", &port)?;
    }
    if let Some(env) = lookup("APP_ENV") {
        config.env = env;
    }
    if let Some(n) = lookup("DB_MAX_OPEN_CONNS") {
        config.db.max_open_conns = parse_number("DB_MAX_OPEN_CONNS", &n)?;
    }
    if let Some(n) = lookup("DB_MAX_IDLE_CONNS") {
        config.db.max_idle_conns = parse_number("DB_MAX_IDLE_CONNS", &n)?;
    }
    if let Some(t) = lookup("DB_MAX_IDLE_TIME") {
        config.db.max_idle_time = t;
    }
    if let Some(n) = lookup("QUERY_TIMEOUT_SECS") {
        config.query_timeout_secs = parse_number("QUERY_TIMEOUT_SECS", &n)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn file_defaults_fill_missing_keys() {
        let config: AppConfig = serde_json::from_str(r#"{"db": {"dsn": "postgres://db/library"}}"#).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.env, "development");
        assert_eq!(config.db.max_open_conns, 25);
        assert_eq!(config.db.max_idle_time, "15m");
        assert_eq!(config.query_timeout_secs, 3);
    }

    #[test]
    fn overrides_win_over_file() {
        let vars: HashMap<&str, &str> = [
            ("DATABASE_URL", "postgres://other/library"),
            ("PORT", "8080"),
            ("APP_ENV", "production"),
            ("QUERY_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        apply_overrides(&mut config, |k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.db.dsn, "postgres://other/library");
        assert_eq!(config.port, 8080);
        assert!(config.is_production());
        assert_eq!(config.query_timeout_secs, 5);
    }

    #[test]
    fn bad_number_is_reported_with_key() {
        let mut config = AppConfig::default();
        let err = apply_overrides(&mut config, |k| (k == "PORT").then(|| "http".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
