//! Process configuration as read from `config/default.json`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// `development`, `staging` or `production`. Production switches logs to JSON.
    #[serde(default = "default_env")]
    pub env: String,
    pub db: DbConfig,
    #[serde(default = "default_query_timeout_secs", rename = "queryTimeoutSecs")]
    pub query_timeout_secs: u64,
    #[serde(default = "default_body_limit_bytes", rename = "bodyLimitBytes")]
    pub body_limit_bytes: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DbConfig {
    pub dsn: String,
    #[serde(default = "default_max_conns", rename = "maxOpenConns")]
    pub max_open_conns: u32,
    #[serde(default = "default_max_conns", rename = "maxIdleConns")]
    pub max_idle_conns: u32,
    /// Duration string such as `15m`.
    #[serde(default = "default_max_idle_time", rename = "maxIdleTime")]
    pub max_idle_time: String,
}

fn default_port() -> u16 {
    4000
}

fn default_env() -> String {
    "development".into()
}

fn default_query_timeout_secs() -> u64 {
    crate::models::DEFAULT_QUERY_TIMEOUT.as_secs()
}

fn default_body_limit_bytes() -> usize {
    1_048_576
}

fn default_max_conns() -> u32 {
    25
}

fn default_max_idle_time() -> String {
    "15m".into()
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env == "production"
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            dsn: "postgres://localhost/library".into(),
            max_open_conns: default_max_conns(),
            max_idle_conns: default_max_conns(),
            max_idle_time: default_max_idle_time(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: default_port(),
            env: default_env(),
            db: DbConfig::default(),
            query_timeout_secs: default_query_timeout_secs(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}
