//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use serde::Deserialize;
use std::net::Ipv4Addr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0), // Bind to 0.0.0.0 for Docker
            port: 3000,
            request_timeout_secs: 30,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_pool_size: usize,
    pub require_tls: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "homefinder".to_string(),
            max_pool_size: 10,
            require_tls: false,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3001".to_string()],
        }
    }
}

/// Token and product key secrets.
///
/// Both secrets are mandatory: a server that cannot verify tokens
/// must not start.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub token_secret: String,
    pub product_key_secret: String,
    pub token_ttl_secs: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"<redacted>")
            .field("product_key_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

/// Default identity token lifetime (1 hour)
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Longest accepted identity token lifetime (1 year)
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 3600;

/// Complete application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = ServerConfig {
            host: var("HOST")
                .and_then(|h| h.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().port),
            request_timeout_secs: var("REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().request_timeout_secs),
        };

        let max_pool_size = var("DB_MAX_CONNECTIONS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        // Try to load DATABASE_URL first, fall back to individual vars
        let database = if let Some(database_url) = var("DATABASE_URL") {
            Self::parse_database_url(&database_url, max_pool_size)?
        } else {
            let defaults = DatabaseConfig::default();
            DatabaseConfig {
                host: var("DB_HOST").unwrap_or(defaults.host),
                port: var("DB_PORT")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.port),
                user: var("DB_USER").unwrap_or(defaults.user),
                password: var("DB_PASSWORD").unwrap_or_default(),
                database: var("DB_NAME").unwrap_or(defaults.database),
                max_pool_size,
                require_tls: false,
            }
        };

        let cors = CorsConfig {
            allowed_origins: var("ALLOWED_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        let auth = AuthConfig {
            token_secret: required(&var, "JSON_TOKEN_SECRET")?,
            product_key_secret: required(&var, "PRODUCT_KEY_SECRET")?,
            token_ttl_secs: match var("TOKEN_TTL_SECS") {
                Some(raw) => raw
                    .parse::<i64>()
                    .ok()
                    .filter(|ttl| (1..=MAX_TOKEN_TTL_SECS).contains(ttl))
                    .ok_or_else(|| {
                        ConfigError::InvalidValue(format!("TOKEN_TTL_SECS={}", raw))
                    })?,
                None => DEFAULT_TOKEN_TTL_SECS,
            },
        };

        Ok(Self {
            server,
            database,
            cors,
            auth,
        })
    }

    /// Parse a DATABASE_URL connection string (postgresql://...)
    fn parse_database_url(url: &str, max_pool_size: usize) -> Result<DatabaseConfig, ConfigError> {
        let parsed = url::Url::parse(url).map_err(|_| {
            ConfigError::InvalidValue(
                "Invalid DATABASE_URL format (expected postgresql://...)".to_string(),
            )
        })?;

        if !matches!(parsed.scheme(), "postgres" | "postgresql") {
            return Err(ConfigError::InvalidValue(format!(
                "Unsupported DATABASE_URL scheme: {}",
                parsed.scheme()
            )));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| ConfigError::InvalidValue("Missing host in DATABASE_URL".to_string()))?
            .to_string();

        let database = parsed.path().trim_start_matches('/').to_string();
        if database.is_empty() {
            return Err(ConfigError::InvalidValue(
                "Missing database name in DATABASE_URL".to_string(),
            ));
        }

        let require_tls = parsed
            .query_pairs()
            .any(|(k, v)| k == "sslmode" && v == "require");

        Ok(DatabaseConfig {
            port: parsed.port().unwrap_or(5432),
            user: parsed.username().to_string(),
            password: parsed.password().map(|p| p.to_string()).unwrap_or_default(),
            database,
            max_pool_size,
            require_tls,
            host,
        })
    }
}

fn required<F>(var: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingVar(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const SECRETS: [(&str, &str); 2] = [
        ("JSON_TOKEN_SECRET", "token-secret"),
        ("PRODUCT_KEY_SECRET", "product-secret"),
    ];

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(config.port, 3000);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_default_database_config() {
        let config = DatabaseConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
    }

    #[test]
    fn missing_token_secret_is_fatal() {
        let err = Settings::from_lookup(lookup(&[("PRODUCT_KEY_SECRET", "x")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref k) if k == "JSON_TOKEN_SECRET"));
    }

    #[test]
    fn blank_token_secret_is_fatal() {
        let err = Settings::from_lookup(lookup(&[
            ("JSON_TOKEN_SECRET", "   "),
            ("PRODUCT_KEY_SECRET", "x"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }

    #[test]
    fn defaults_apply_when_only_secrets_are_set() {
        let settings = Settings::from_lookup(lookup(&SECRETS)).unwrap();
        assert_eq!(settings.auth.token_ttl_secs, DEFAULT_TOKEN_TTL_SECS);
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.database.database, "homefinder");
    }

    #[test]
    fn parses_database_url() {
        let mut pairs = SECRETS.to_vec();
        pairs.push((
            "DATABASE_URL",
            "postgresql://realtor:pw@db.example.com:6543/homes?sslmode=require",
        ));
        let settings = Settings::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(settings.database.host, "db.example.com");
        assert_eq!(settings.database.port, 6543);
        assert_eq!(settings.database.user, "realtor");
        assert_eq!(settings.database.password, "pw");
        assert_eq!(settings.database.database, "homes");
        assert!(settings.database.require_tls);
    }

    #[test]
    fn rejects_non_postgres_url() {
        let mut pairs = SECRETS.to_vec();
        pairs.push(("DATABASE_URL", "mysql://u:p@host/db"));
        assert!(Settings::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn rejects_non_positive_ttl() {
        let mut pairs = SECRETS.to_vec();
        pairs.push(("TOKEN_TTL_SECS", "0"));
        assert!(matches!(
            Settings::from_lookup(lookup(&pairs)),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn rejects_ttl_above_one_year() {
        let too_long = (MAX_TOKEN_TTL_SECS + 1).to_string();
        let max = MAX_TOKEN_TTL_SECS.to_string();

        let mut pairs = SECRETS.to_vec();
        pairs.push(("TOKEN_TTL_SECS", too_long.as_str()));
        assert!(matches!(
            Settings::from_lookup(lookup(&pairs)),
            Err(ConfigError::InvalidValue(_))
        ));

        let mut pairs = SECRETS.to_vec();
        pairs.push(("TOKEN_TTL_SECS", "9223372036854775807"));
        assert!(Settings::from_lookup(lookup(&pairs)).is_err());

        let mut pairs = SECRETS.to_vec();
        pairs.push(("TOKEN_TTL_SECS", max.as_str()));
        let settings = Settings::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(settings.auth.token_ttl_secs, MAX_TOKEN_TTL_SECS);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let settings = Settings::from_lookup(lookup(&SECRETS)).unwrap();
        let printed = format!("{:?}", settings.auth);
        assert!(!printed.contains("token-secret"));
        assert!(!printed.contains("product-secret"));
    }
}
