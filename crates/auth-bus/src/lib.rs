//! # auth-bus
//!
//! Request/reply messaging over Redis pub/sub.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool, picked
//!   from an ordered list of candidate servers
//! - **Subjects**: `auth.register`, `auth.login`, `auth.verify` and per-client
//!   reply inboxes
//! - **Envelopes**: correlation id, reply channel and JSON payload
//! - **Responder**: serves requests by handing them to a [`RequestHandler`]
//! - **Client**: `request(subject, payload, timeout)` for callers and tests
//!
//! ## Example
//!
//! ```ignore
//! use auth_bus::{BusClient, RedisPool, Subject};
//! use std::time::Duration;
//!
//! let (pool, url) = RedisPool::connect_first(&servers, 16).await?;
//! let client = BusClient::connect(pool, &url).await?;
//!
//! let reply: serde_json::Value = client
//!     .request(&Subject::Login, &serde_json::json!({"email": "a@x.com", "password": "pw123"}), Duration::from_secs(5))
//!     .await?;
//! ```

pub mod client;
pub mod pool;
pub mod pubsub;
pub mod responder;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export pubsub types
pub use pubsub::{
    BusReply, BusRequest, Publisher, ReceivedMessage, Subject, Subscriber, SubscriberBuilder,
    SubscriberConfig, SubscriberError, SubscriberResult, INBOX_PREFIX, LOGIN_SUBJECT,
    REGISTER_SUBJECT, VERIFY_SUBJECT,
};

// Re-export client and responder
pub use client::{BusClient, BusError, BusResult};
pub use responder::{serve, RequestHandler};
