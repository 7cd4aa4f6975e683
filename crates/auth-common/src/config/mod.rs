//! Configuration structs

mod app_config;
mod duration;

pub use app_config::{
    AppConfig, AppSettings, BusConfig, ConfigError, DatabaseConfig, Environment, JwtConfig,
    ServerConfig,
};
pub use duration::{parse_duration, DurationParseError};
