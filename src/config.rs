use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

// ============================================================================
// Configuration - environment variables with defaults
// ============================================================================
//
// HTTP_HOST                        0.0.0.0
// HTTP_PORT                        8080
// STORE_BACKEND                    memory | postgres
// DATABASE_URL                     required for postgres
// DATABASE_MAX_CONNECTIONS         10
// DATABASE_ACQUIRE_TIMEOUT_SECS    5
// DATABASE_STATEMENT_TIMEOUT_SECS  30
// BATCH_FETCH_SIZE                 100
// SEED_DEMO_DATA                   true
//
// A value that is present but does not parse is an error, not a default.
//
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("batch fetch size must be greater than zero, got {0}")]
    BatchSize(i64),

    #[error("DATABASE_URL is required when STORE_BACKEND=postgres")]
    MissingDatabaseUrl,
}

/// Number of parent ids per batched to-many load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSize(usize);

impl BatchSize {
    pub fn new(size: i64) -> Result<Self, ConfigError> {
        match usize::try_from(size) {
            Ok(size) if size > 0 => Ok(Self(size)),
            _ => Err(ConfigError::BatchSize(size)),
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self(100)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            other => Err(format!("expected 'memory' or 'postgres', got '{other}'")),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Server-side `statement_timeout`; a query running longer fails as a store error.
    pub statement_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub batch_size: BatchSize,
    pub seed_demo_data: bool,
}

impl AppConfig {
    /// Load from the process environment. Call `dotenvy::dotenv()` first to
    /// pick up a local `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = parse_or(&lookup, "STORE_BACKEND", StoreBackend::Memory)?;
        let database_url = lookup("DATABASE_URL").unwrap_or_default();
        if backend == StoreBackend::Postgres && database_url.trim().is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        Ok(Self {
            server: ServerConfig {
                host: lookup("HTTP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "HTTP_PORT", 8080)?,
            },
            store: StoreConfig {
                backend,
                database_url,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
                acquire_timeout_secs: parse_or(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?,
                statement_timeout_secs: parse_or(&lookup, "DATABASE_STATEMENT_TIMEOUT_SECS", 30)?,
            },
            batch_size: BatchSize::new(parse_or(&lookup, "BATCH_FETCH_SIZE", 100)?)?,
            seed_demo_data: parse_or(&lookup, "SEED_DEMO_DATA", true)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.max_connections, 10);
        assert_eq!(config.store.statement_timeout_secs, 30);
        assert_eq!(config.batch_size.get(), 100);
        assert!(config.seed_demo_data);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HTTP_PORT", "9000"),
            ("BATCH_FETCH_SIZE", "1"),
            ("SEED_DEMO_DATA", "false"),
            ("STORE_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://localhost/jpashop"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.batch_size.get(), 1);
        assert!(!config.seed_demo_data);
        assert_eq!(config.store.backend, StoreBackend::Postgres);
    }

    #[test]
    fn test_non_positive_batch_size_is_rejected() {
        assert_eq!(load(&[("BATCH_FETCH_SIZE", "0")]).unwrap_err(), ConfigError::BatchSize(0));
        assert_eq!(load(&[("BATCH_FETCH_SIZE", "-5")]).unwrap_err(), ConfigError::BatchSize(-5));
        assert!(BatchSize::new(0).is_err());
    }

    #[test]
    fn test_unparseable_value_is_an_error() {
        let err = load(&[("HTTP_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "HTTP_PORT", .. }));

        let err = load(&[("STORE_BACKEND", "mongo")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "STORE_BACKEND", .. }));
    }

    #[test]
    fn test_postgres_requires_url() {
        let err = load(&[("STORE_BACKEND", "postgres")]).unwrap_err();
        assert_eq!(err, ConfigError::MissingDatabaseUrl);
    }
}
