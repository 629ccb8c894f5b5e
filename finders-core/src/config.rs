use std::env;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, FinderError};

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

/// Bounds applied by search result sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Counts stop once this many rows matched; the UI shows `count_limit - 1` followed by `+`.
    pub count_limit: u32,
    pub default_per_page: u32,
    pub max_per_page: u32,
}

impl SearchConfig {
    pub const DEFAULT_COUNT_LIMIT: u32 = 100;
    pub const DEFAULT_PER_PAGE: u32 = 20;
    pub const DEFAULT_MAX_PER_PAGE: u32 = 100;
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            count_limit: Self::DEFAULT_COUNT_LIMIT,
            default_per_page: Self::DEFAULT_PER_PAGE,
            max_per_page: Self::DEFAULT_MAX_PER_PAGE,
        }
    }
}

/// Configuration shared across the finders crates.
#[derive(Debug, Clone, Default)]
pub struct FinderConfig {
    pub database_url: Option<String>,
    pub environment: Environment,
    pub log_level: Option<String>,
    pub search: SearchConfig,
}

impl FinderConfig {
    /// Loads configuration from the process environment (`DATABASE_URL`, `FINDERS_*`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::load(env::var("DATABASE_URL").ok(), "FINDERS_")
    }

    /// Loads configuration from env vars prefixed with the provided value (e.g. `ALERTS_`),
    /// including `{prefix}DATABASE_URL`.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let database_url = env::var(format!("{}DATABASE_URL", prefix)).ok();
        Self::load(database_url, prefix)
    }

    fn load(database_url: Option<String>, prefix: &str) -> Result<Self, ConfigError> {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);

        let environment = env::var(key("ENV"))
            .map(|raw| Environment::from_str(&raw))
            .unwrap_or_default();
        let log_level = env::var(key("LOG_LEVEL")).ok();

        let defaults = SearchConfig::default();
        let search = SearchConfig {
            count_limit: read_positive(&key("SEARCH_COUNT_LIMIT"), defaults.count_limit)?,
            default_per_page: read_positive(&key("SEARCH_PER_PAGE"), defaults.default_per_page)?,
            max_per_page: read_positive(&key("SEARCH_MAX_PER_PAGE"), defaults.max_per_page)?,
        };

        Ok(Self {
            database_url: database_url.filter(|url| !url.trim().is_empty()),
            environment,
            log_level,
            search,
        })
    }

    /// Returns the Postgres URL or the error to surface when none is configured.
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".into()))
    }

    /// Whether the service is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

/// Reads a count that must be at least 1.
fn read_positive(key: &str, default: u32) -> Result<u32, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<u32>() {
            Ok(value) if value >= 1 => Ok(value),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        },
        Err(_) => Ok(default),
    }
}

/// Helper that loads config and converts to the canonical finder error type.
pub fn load_finder_config() -> Result<FinderConfig, FinderError> {
    Ok(FinderConfig::from_env()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_variables() {
        let cfg = FinderConfig::from_env_with_prefix("CFGTEST_EMPTY_").expect("config should load");
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.search, SearchConfig::default());
        assert!(cfg.database_url().is_err());
    }

    #[test]
    fn reads_prefixed_variables() {
        env::set_var("CFGTEST_SET_DATABASE_URL", "postgres://example");
        env::set_var("CFGTEST_SET_ENV", "prod");
        env::set_var("CFGTEST_SET_SEARCH_COUNT_LIMIT", "50");
        env::set_var("CFGTEST_SET_SEARCH_PER_PAGE", " 10 ");

        let cfg = FinderConfig::from_env_with_prefix("CFGTEST_SET_").expect("config should load");
        assert!(cfg.is_production());
        assert_eq!(cfg.database_url().ok(), Some("postgres://example"));
        assert_eq!(cfg.search.count_limit, 50);
        assert_eq!(cfg.search.default_per_page, 10);
        assert_eq!(cfg.search.max_per_page, SearchConfig::DEFAULT_MAX_PER_PAGE);
    }

    #[test]
    fn rejects_non_numeric_limits() {
        env::set_var("CFGTEST_BAD_SEARCH_MAX_PER_PAGE", "lots");
        let err = FinderConfig::from_env_with_prefix("CFGTEST_BAD_").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "CFGTEST_BAD_SEARCH_MAX_PER_PAGE"));
    }

    #[test]
    fn rejects_zero_limits() {
        env::set_var("CFGTEST_ZERO_SEARCH_COUNT_LIMIT", "0");
        let err = FinderConfig::from_env_with_prefix("CFGTEST_ZERO_").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, ref value } if key == "CFGTEST_ZERO_SEARCH_COUNT_LIMIT" && value == "0"));

        env::set_var("CFGTEST_ZERO_PAGE_SEARCH_PER_PAGE", " 0 ");
        let err = FinderConfig::from_env_with_prefix("CFGTEST_ZERO_PAGE_").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "CFGTEST_ZERO_PAGE_SEARCH_PER_PAGE"));
    }
}
