//! # auth-db
//!
//! Credential store implementing the `auth-core` repository port with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! - Connection pool management (connect once at startup)
//! - Schema bootstrap
//! - Database model with SQLx `FromRow` derive
//! - Entity ↔ Model mapper
//! - Repository implementation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth_db::{create_pool, run_migrations, DatabaseConfig, PgUserRepository};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::default()).await?;
//!     run_migrations(&pool).await?;
//!     let user_repo = PgUserRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, run_migrations, DatabaseConfig, PgPool};
pub use repositories::PgUserRepository;
