//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).
//! Every required value is checked up front so the process fails fast at startup.

use serde::Deserialize;
use std::env;

use super::duration::parse_duration;

/// Longest accepted `JWT_EXPIRES`, ten years
pub const MAX_TOKEN_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub bus: BusConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// HTTP listener for the health endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Message bus connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct BusConfig {
    /// Candidate servers, tried in order at startup
    pub servers: Vec<String>,
    #[serde(default = "default_bus_max_connections")]
    pub max_connections: u32,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Token signing configuration
#[derive(Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    /// Clock skew tolerated when checking `exp`, in seconds
    #[serde(default)]
    pub leeway: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("expires_in", &self.expires_in)
            .field("leeway", &self.leeway)
            .finish()
    }
}

// Default value functions
fn default_app_name() -> String {
    "auth-service".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_bus_max_connections() -> u32 {
    16
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or malformed
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingVar(key))
        };
        let parsed_or = |key: &'static str, default: u32| -> Result<u32, ConfigError> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(key, raw)),
                None => Ok(default),
            }
        };

        let port_raw = required("APP_PORT")?;
        let port = port_raw
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("APP_PORT", port_raw.clone()))?;

        let servers: Vec<String> = required("BUS_SERVERS")?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if servers.is_empty() {
            return Err(ConfigError::MissingVar("BUS_SERVERS"));
        }

        let expires_raw = required("JWT_EXPIRES")?;
        let expires = parse_duration(&expires_raw)
            .map_err(|e| ConfigError::InvalidValue("JWT_EXPIRES", e.to_string()))?;
        if expires.as_secs() == 0 {
            return Err(ConfigError::InvalidValue(
                "JWT_EXPIRES",
                "token lifetime must be at least one second".to_string(),
            ));
        }
        if expires.as_secs() > MAX_TOKEN_LIFETIME_SECS {
            return Err(ConfigError::InvalidValue(
                "JWT_EXPIRES",
                format!("token lifetime must not exceed {MAX_TOKEN_LIFETIME_SECS} seconds"),
            ));
        }
        let expires_in = i64::try_from(expires.as_secs())
            .map_err(|_| ConfigError::InvalidValue("JWT_EXPIRES", expires_raw.clone()))?;

        let leeway = match lookup("JWT_LEEWAY") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_LEEWAY", raw))?,
            None => 0,
        };

        let env = match lookup("APP_ENV") {
            Some(raw) => Environment::parse(&raw).ok_or(ConfigError::InvalidValue("APP_ENV", raw))?,
            None => default_env(),
        };

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            server: ServerConfig {
                host: lookup("APP_HOST").unwrap_or_else(default_host),
                port,
            },
            bus: BusConfig {
                servers,
                max_connections: parsed_or("BUS_MAX_CONNECTIONS", default_bus_max_connections())?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", default_max_connections())?,
                min_connections: parsed_or("DATABASE_MIN_CONNECTIONS", default_min_connections())?,
            },
            jwt: JwtConfig {
                secret: required("JWT_SECRET")?,
                issuer: required("JWT_ISSUER")?,
                expires_in,
                leeway,
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
