use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite database URL.
    /// TOML: `database.url`. Default: `sqlite://quotes.db`.
    #[serde(default = "default_url")]
    pub url: String,

    /// Pool size. Values below 1 are treated as 1.
    /// TOML: `database.max_connections`. Default: `3`.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// SQLite busy timeout in seconds.
    /// TOML: `database.busy_timeout_secs`. Default: `5`.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,

    /// Deadline for a single store call, in milliseconds.
    /// TOML: `database.call_timeout_ms`. Default: `10000`.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

impl DatabaseConfig {
    /// Convenience constructor used by tests and tools pointing at an ad-hoc database.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections.max(1)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
            call_timeout_ms: default_call_timeout_ms(),
        }
    }
}

fn default_url() -> String {
    "sqlite://quotes.db".to_string()
}

fn default_max_connections() -> u32 {
    3
}

fn default_busy_timeout_secs() -> u64 {
    5
}

fn default_call_timeout_ms() -> u64 {
    10_000
}
