//! Redis connection pool using deadpool-redis.
//!
//! Provides a managed pool of Redis connections for publishing requests and
//! replies.

use deadpool_redis::{Config, Pool, Runtime};

/// Redis pool configuration
#[derive(Debug, Clone)]
pub struct RedisPoolConfig {
    /// Redis connection URL (e.g., `redis://localhost:6379`)
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: usize,
}

impl Default for RedisPoolConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            max_connections: 16,
        }
    }
}

/// Error type for Redis pool operations
#[derive(Debug, thiserror::Error)]
pub enum RedisPoolError {
    #[error("Failed to create Redis pool: {0}")]
    CreatePool(String),

    #[error("Failed to get connection from pool: {0}")]
    GetConnection(#[from] deadpool_redis::PoolError),

    #[error("Redis command error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No bus server reachable (tried {0})")]
    NoServerAvailable(usize),
}

/// Result type for Redis pool operations
pub type RedisResult<T> = Result<T, RedisPoolError>;

/// Managed Redis connection pool
#[derive(Clone)]
pub struct RedisPool {
    pool: Pool,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPool")
            .field("status", &self.pool.status())
            .finish()
    }
}

/// Strip credentials before a URL reaches the logs
pub(crate) fn redact_url(url: &str) -> &str {
    url.split('@').next_back().unwrap_or(url)
}

impl RedisPool {
    /// Create a new Redis pool with the given configuration
    ///
    /// The pool is lazy: no connection is opened until the first `get`.
    pub fn new(config: RedisPoolConfig) -> RedisResult<Self> {
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?;

        tracing::info!(
            url = %redact_url(&config.url),
            max_connections = config.max_connections,
            "Redis pool created"
        );

        Ok(Self { pool })
    }

    /// Connect to the first server in `servers` that answers `PING`
    ///
    /// Returns the pool together with the URL it was built from, so the
    /// subscriber side can attach to the same server.
    pub async fn connect_first(
        servers: &[String],
        max_connections: usize,
    ) -> RedisResult<(Self, String)> {
        for url in servers {
            let pool = match Self::new(RedisPoolConfig {
                url: url.clone(),
                max_connections,
            }) {
                Ok(pool) => pool,
                Err(e) => {
                    tracing::warn!(url = %redact_url(url), error = %e, "Skipping bus server");
                    continue;
                }
            };

            match pool.health_check().await {
                Ok(()) => {
                    tracing::info!(url = %redact_url(url), "Connected to bus server");
                    return Ok((pool, url.clone()));
                }
                Err(e) => {
                    tracing::warn!(url = %redact_url(url), error = %e, "Bus server not answering");
                }
            }
        }

        Err(RedisPoolError::NoServerAvailable(servers.len()))
    }

    /// Get a connection from the pool
    pub async fn get(&self) -> RedisResult<deadpool_redis::Connection> {
        self.pool.get().await.map_err(RedisPoolError::GetConnection)
    }

    /// Check if the pool is healthy by pinging Redis
    pub async fn health_check(&self) -> RedisResult<()> {
        let mut conn = self.get().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}
