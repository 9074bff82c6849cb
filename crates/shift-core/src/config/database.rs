use serde::{Deserialize, Serialize};

/// Database configuration for the bundled Postgres backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL. Empty when no database is configured.
    #[serde(default)]
    pub url: String,

    /// Connection pool size. The migration lock holds one connection, so
    /// at least 2.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Pool checkout timeout in seconds.
    #[serde(default = "default_pool_timeout")]
    pub pool_timeout_secs: u64,

    /// Single-row table holding the checkpoint.
    #[serde(default = "default_status_table")]
    pub status_table: String,

    /// Append-only log of every checkpoint written.
    #[serde(default = "default_history_table")]
    pub history_table: String,
}

impl DatabaseConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_size: default_pool_size(),
            pool_timeout_secs: default_pool_timeout(),
            status_table: default_status_table(),
            history_table: default_history_table(),
        }
    }
}

fn default_pool_size() -> u32 {
    2
}

fn default_pool_timeout() -> u64 {
    30
}

fn default_status_table() -> String {
    "shift_status".to_string()
}

fn default_history_table() -> String {
    "shift_history".to_string()
}
