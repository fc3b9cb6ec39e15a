//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Unset or unparsable numeric values fall
//! back to their defaults; malformed addresses and unknown enum values are
//! rejected.

use std::fmt;
use std::net::SocketAddr;

/// Default CORS origin, the local development frontend.
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Configuration errors raised by [`RegistryConfig::from_env`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `LISTEN_ADDR` is not a socket address.
    #[error("invalid LISTEN_ADDR {value:?}: {source}")]
    InvalidListenAddr {
        /// The rejected value.
        value: String,
        /// Parser error.
        source: std::net::AddrParseError,
    },

    /// An enumerated setting has an unknown value.
    #[error("invalid {key}: {value:?} (expected one of {expected})")]
    InvalidChoice {
        /// Environment variable name.
        key: &'static str,
        /// The rejected value.
        value: String,
        /// Accepted values.
        expected: &'static str,
    },
}

/// Which executor backs the snapshot store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// PostgreSQL through `sqlx`.
    Postgres,
    /// Process-local tables; contents are lost on exit.
    Memory,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Pretty,
    /// One JSON object per event.
    Json,
}

/// PostgreSQL connection settings.
///
/// `url` takes precedence; otherwise the connection is assembled from the
/// individual parts, which are passed to the driver as-is.
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Full connection string from `DATABASE_URL`, if set.
    pub url: Option<String>,
    /// Server host name.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login role.
    pub user: String,
    /// Login password; empty means none.
    pub password: String,
    /// Database name.
    pub database: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// Minimum idle connections kept open.
    pub min_connections: u32,
    /// Timeout in seconds for acquiring a connection.
    pub connect_timeout_secs: u64,
    /// Whether to apply pending migrations at startup.
    pub run_migrations: bool,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "****"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("run_migrations", &self.run_migrations)
            .finish_non_exhaustive()
    }
}

/// Top-level service configuration.
///
/// Loaded once at startup via [`RegistryConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Socket address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
    /// Snapshot store backend.
    pub storage: StorageBackend,
    /// PostgreSQL settings, used by [`StorageBackend::Postgres`].
    pub database: DatabaseConfig,
    /// The single origin allowed by CORS.
    pub cors_origin: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Log output format.
    pub log_format: LogFormat,
}

impl RegistryConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` first to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `LISTEN_ADDR`, `STORAGE_BACKEND` or
    /// `LOG_FORMAT` is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let listen_value = env_or("LISTEN_ADDR", "0.0.0.0:3001");
        let listen_addr = listen_value
            .parse()
            .map_err(|source| ConfigError::InvalidListenAddr {
                value: listen_value.clone(),
                source,
            })?;

        let storage = parse_storage_backend(&env_or("STORAGE_BACKEND", "postgres"))?;
        let log_format = parse_log_format(&env_or("LOG_FORMAT", "pretty"))?;

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            host: env_or("DB_HOST", "localhost"),
            port: parse_env("DB_PORT", 5432),
            user: env_or("DB_USER", "postgres"),
            password: env_or("DB_PASSWORD", ""),
            database: env_or("DB_DATABASE", "astronauts"),
            max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10),
            min_connections: parse_env("DATABASE_MIN_CONNECTIONS", 1),
            connect_timeout_secs: parse_env("DATABASE_CONNECT_TIMEOUT_SECS", 5),
            run_migrations: parse_env_bool("DATABASE_RUN_MIGRATIONS", true),
        };

        Ok(Self {
            listen_addr,
            storage,
            database,
            cors_origin: env_or("CORS_ORIGIN", DEFAULT_CORS_ORIGIN),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 30),
            log_format,
        })
    }
}

fn parse_storage_backend(value: &str) -> Result<StorageBackend, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
        "memory" => Ok(StorageBackend::Memory),
        _ => Err(ConfigError::InvalidChoice {
            key: "STORAGE_BACKEND",
            value: value.to_string(),
            expected: "postgres, memory",
        }),
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "pretty" | "text" => Ok(LogFormat::Pretty),
        "json" => Ok(LogFormat::Json),
        _ => Err(ConfigError::InvalidChoice {
            key: "LOG_FORMAT",
            value: value.to_string(),
            expected: "pretty, json",
        }),
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("true") | Some("TRUE") | Some("1") => true,
        Some("false") | Some("FALSE") | Some("0") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_debug_hides_secrets() {
        let config = DatabaseConfig {
            url: Some("postgres://astro:secret@db/astronauts".to_string()),
            host: "db".to_string(),
            port: 5432,
            user: "astro".to_string(),
            password: "secret".to_string(),
            database: "astronauts".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 5,
            run_migrations: true,
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("astronauts"));
    }

    #[test]
    fn storage_backend_choices() {
        assert!(matches!(
            parse_storage_backend("Memory"),
            Ok(StorageBackend::Memory)
        ));
        assert!(matches!(
            parse_storage_backend("postgresql"),
            Ok(StorageBackend::Postgres)
        ));
        assert!(matches!(
            parse_storage_backend("mysql"),
            Err(ConfigError::InvalidChoice {
                key: "STORAGE_BACKEND",
                ..
            })
        ));
    }

    #[test]
    fn log_format_choices() {
        assert!(matches!(parse_log_format("JSON"), Ok(LogFormat::Json)));
        assert!(matches!(parse_log_format("pretty"), Ok(LogFormat::Pretty)));
        assert!(parse_log_format("xml").is_err());
    }

    #[test]
    fn missing_variables_fall_back_to_defaults() {
        assert_eq!(parse_env("ASTRONAUT_REGISTRY_TEST_UNSET_NUMBER", 7u32), 7);
        assert!(parse_env_bool("ASTRONAUT_REGISTRY_TEST_UNSET_FLAG", true));
    }
}
