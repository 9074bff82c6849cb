mod database;

pub use database::DatabaseConfig;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ShiftError};

pub const ENV_MIGRATIONS_PATH: &str = "DBSHIFT_ABS_FOLDER_MIGRATIONS";
pub const ENV_CREATE_DISABLED: &str = "DBSHIFT_OPTION_IS_CREATE_DISABLED";
pub const ENV_DOWNGRADE_DISABLED: &str = "DBSHIFT_OPTION_IS_DOWNGRADE_DISABLED";
pub const ENV_UPGRADE_DISABLED: &str = "DBSHIFT_OPTION_IS_UPGRADE_DISABLED";
pub const ENV_DIRECTION_RULE: &str = "DBSHIFT_DIRECTION_RULE";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

/// Root configuration, passed explicitly into the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftConfig {
    /// Migration directory settings.
    #[serde(default)]
    pub migrations: MigrationsConfig,

    /// Operation switches.
    #[serde(default)]
    pub options: OptionsConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl ShiftConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ShiftError::Config(format!("Failed to read config file: {}", e)))?;

        debug!("Loaded configuration from {}", path.as_ref().display());
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let content = substitute_env_vars(content)?;

        toml::from_str(&content)
            .map_err(|e| ShiftError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from `DBSHIFT_*` variables resolved through `lookup`.
    ///
    /// Empty values count as unset. The migrations folder is required,
    /// every other variable is optional.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let path = get(ENV_MIGRATIONS_PATH)
            .ok_or_else(|| ShiftError::Config(format!("{} is not set", ENV_MIGRATIONS_PATH)))?;

        let mut config = ShiftConfig::default();
        config.migrations.path = PathBuf::from(path);

        if let Some(value) = get(ENV_CREATE_DISABLED) {
            config.options.create_disabled = parse_bool(ENV_CREATE_DISABLED, &value)?;
        }
        if let Some(value) = get(ENV_DOWNGRADE_DISABLED) {
            config.options.downgrade_disabled = parse_bool(ENV_DOWNGRADE_DISABLED, &value)?;
        }
        if let Some(value) = get(ENV_UPGRADE_DISABLED) {
            config.options.upgrade_disabled = parse_bool(ENV_UPGRADE_DISABLED, &value)?;
        }
        if let Some(value) = get(ENV_DIRECTION_RULE) {
            config.migrations.direction_rule = value.parse()?;
        }
        if let Some(url) = get(ENV_DATABASE_URL) {
            config.database.url = url;
        }

        Ok(config)
    }

    /// Check that the configuration can drive a run.
    pub fn validate(&self) -> Result<()> {
        let path = &self.migrations.path;
        if !path.exists() {
            return Err(ShiftError::Config(format!(
                "migrations folder does not exist at {}",
                path.display()
            )));
        }
        if !path.is_dir() {
            return Err(ShiftError::Config(format!(
                "migrations path {} is not a directory",
                path.display()
            )));
        }

        // The migration lock pins one connection for the whole run
        if self.database.is_configured() && self.database.pool_size < 2 {
            return Err(ShiftError::Config(format!(
                "database pool_size must be at least 2, got {}",
                self.database.pool_size
            )));
        }

        for table in [&self.database.status_table, &self.database.history_table] {
            if !is_identifier(table) {
                return Err(ShiftError::Config(format!(
                    "invalid table name '{}'",
                    table
                )));
            }
        }

        Ok(())
    }
}

/// Migration directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationsConfig {
    /// Flat directory holding the down/up file pairs.
    #[serde(default = "default_migrations_path")]
    pub path: PathBuf,

    /// How a file's direction is derived.
    #[serde(default)]
    pub direction_rule: DirectionRule,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            path: default_migrations_path(),
            direction_rule: DirectionRule::default(),
        }
    }
}

fn default_migrations_path() -> PathBuf {
    PathBuf::from("migrations")
}

/// How the catalog decides a file's direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionRule {
    /// Read the `up`/`down` word from the file name, falling back to the
    /// file's position when the word is missing.
    ///
    /// Unlike the legacy tool, a file's word wins over its position. Set
    /// `DBSHIFT_DIRECTION_RULE=positional` (or `direction_rule = "positional"`)
    /// to keep the old behavior.
    #[default]
    Tagged,
    /// Even positions in the sorted listing are downgrades, odd ones upgrades.
    Positional,
}

impl std::str::FromStr for DirectionRule {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tagged" => Ok(DirectionRule::Tagged),
            "positional" => Ok(DirectionRule::Positional),
            other => Err(ShiftError::Config(format!(
                "unknown direction rule '{}', expected 'tagged' or 'positional'",
                other
            ))),
        }
    }
}

/// Switches that refuse individual operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionsConfig {
    #[serde(default)]
    pub create_disabled: bool,

    #[serde(default)]
    pub upgrade_disabled: bool,

    #[serde(default)]
    pub downgrade_disabled: bool,
}

/// Boolean spellings accepted in environment variables.
fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ShiftError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, value
        ))),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Substitute environment variables in the format ${VAR_NAME}.
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ShiftError::Config(e.to_string()))?;
    let mut result = content.to_string();

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    Ok(result)
}
