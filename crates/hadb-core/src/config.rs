//! Configuration management for the synchronization core
//!
//! Loads configuration with priority:
//! 1. Specified config file
//! 2. hadb.toml in the current directory or one of its parents
//! 3. Defaults

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "hadb.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HaConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub codec: CodecConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How database metadata is retained between synchronization jobs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStrategy {
    /// Introspect on every request
    None,
    /// Introspect once per backend and keep the result until flushed
    #[default]
    Eager,
}

/// Metadata cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub strategy: CacheStrategy,
}

/// Credential codec selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    #[default]
    Plain,
    Base64,
}

/// Credential codec configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodecConfig {
    #[serde(default)]
    pub kind: CodecKind,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl HaConfig {
    /// Load configuration from hadb.toml, searching upwards from the current directory
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::find_config_file()?,
        };

        tracing::debug!("Loading configuration from: {:?}", config_path);

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))
    }

    /// Parse configuration from a TOML document
    pub fn from_toml(contents: &str) -> Result<Self> {
        let mut config: HaConfig = toml::from_str(contents)?;
        config.resolve_env_vars();
        Ok(config)
    }

    /// Find hadb.toml by searching current directory and parents
    fn find_config_file() -> Result<PathBuf> {
        let mut current = env::current_dir()?;

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Ok(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        Err(anyhow!("{} not found", CONFIG_FILE_NAME))
    }

    /// Resolve ${VAR_NAME} references to environment variables
    fn resolve_env_vars(&mut self) {
        if let Some(resolved) = Self::resolve_env_var(&self.logging.filter) {
            self.logging.filter = resolved;
        } else {
            self.logging.filter = default_log_filter();
        }
    }

    /// Resolve a single ${VAR_NAME} reference
    fn resolve_env_var(value: &str) -> Option<String> {
        if value.starts_with("${") && value.ends_with('}') {
            let var_name = &value[2..value.len() - 1];
            env::var(var_name).ok()
        } else {
            Some(value.to_string())
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HaConfig::default();
        assert_eq!(config.cache.strategy, CacheStrategy::Eager);
        assert_eq!(config.codec.kind, CodecKind::Plain);
        assert_eq!(config.logging.filter, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_parse_sections() {
        let config = HaConfig::from_toml(
            r#"
            [cache]
            strategy = "none"

            [codec]
            kind = "base64"

            [logging]
            filter = "hadb_sync=debug"
            json = true
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.strategy, CacheStrategy::None);
        assert_eq!(config.codec.kind, CodecKind::Base64);
        assert_eq!(config.logging.filter, "hadb_sync=debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let result = HaConfig::from_toml("[cache]\nstrategy = \"lazy\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_env_var() {
        unsafe {
            env::set_var("HADB_TEST_FILTER", "trace");
        }

        let resolved = HaConfig::resolve_env_var("${HADB_TEST_FILTER}");
        assert_eq!(resolved, Some("trace".to_string()));

        let not_var = HaConfig::resolve_env_var("warn");
        assert_eq!(not_var, Some("warn".to_string()));

        unsafe {
            env::remove_var("HADB_TEST_FILTER");
        }
    }

    #[test]
    fn test_load_from_file() {
        let path = env::temp_dir().join(format!("hadb-config-{}.toml", std::process::id()));
        fs::write(&path, "[codec]\nkind = \"base64\"\n").unwrap();

        let config = HaConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.codec.kind, CodecKind::Base64);
        assert_eq!(config.cache.strategy, CacheStrategy::Eager);

        fs::remove_file(&path).unwrap();
    }
}
