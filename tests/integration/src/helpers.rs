//! Test helpers for integration tests
//!
//! Provides utilities for wiring the credential service over an in-memory or
//! Postgres store, and for running the bus responder against a live Redis.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use auth_bus::{serve, BusClient, BusResult, Publisher, RedisPool, Subject, SubscriberResult};
use auth_common::{AppConfig, JwtService};
use auth_db::{create_pool, run_migrations, DatabaseConfig, PgUserRepository};
use auth_server::CredentialHandler;
use auth_service::{CredentialService, ServiceContextBuilder};
use serde_json::Value;
use tokio::sync::{watch, Mutex, MutexGuard};
use tokio::task::JoinHandle;

use crate::mock_repos::MockUserRepository;

/// Secret shared by every test signer
pub const TEST_JWT_SECRET: &str = "integration-test-secret-key-long-enough";

/// Timeout for a single bus request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Serializes tests that answer the shared request subjects
///
/// A subject takes one responder at a time, so tests serving the same
/// subjects have to take turns.
static BUS_LOCK: Mutex<()> = Mutex::const_new(());

/// Check that the variables a test needs are set
///
/// Loads `.env` first. Prints why the test is skipped when something is missing.
pub fn check_test_env(vars: &[&str]) -> bool {
    let _ = dotenvy::dotenv();

    for var in vars {
        if std::env::var(var).map_or(true, |v| v.trim().is_empty()) {
            eprintln!("Skipping test: {var} not set");
            return false;
        }
    }
    true
}

/// Token signer with a fixed secret and a 15 minute lifetime
pub fn test_jwt_service() -> JwtService {
    JwtService::new(TEST_JWT_SECRET, "auth-service", 900)
}

/// Credential service over an in-memory store
///
/// Returns the store too, so tests can inspect what was persisted.
pub fn mock_service() -> (Arc<CredentialService>, MockUserRepository) {
    let repo = MockUserRepository::new();
    let ctx = ServiceContextBuilder::new()
        .user_repo(Arc::new(repo.clone()))
        .jwt_service(Arc::new(test_jwt_service()))
        .build()
        .expect("all dependencies provided");
    (Arc::new(CredentialService::new(ctx)), repo)
}

/// Credential service over the Postgres database at `DATABASE_URL`
pub async fn pg_service() -> Result<Arc<CredentialService>> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let pool = create_pool(&DatabaseConfig {
        url,
        max_connections: 4,
        ..Default::default()
    })
    .await?;
    run_migrations(&pool).await?;

    let ctx = ServiceContextBuilder::new()
        .user_repo(Arc::new(PgUserRepository::new(pool)))
        .jwt_service(Arc::new(test_jwt_service()))
        .build()?;
    Ok(Arc::new(CredentialService::new(ctx)))
}

/// Load the full process configuration from the environment
pub fn test_config() -> Result<AppConfig> {
    Ok(AppConfig::from_env()?)
}

/// Bus servers listed in `BUS_SERVERS`
pub fn bus_servers() -> Vec<String> {
    std::env::var("BUS_SERVERS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// A bus responder serving one credential service, plus a client to call it
pub struct TestBus {
    client: BusClient,
    publisher: Publisher,
    url: String,
    shutdown: watch::Sender<bool>,
    responder: Option<JoinHandle<SubscriberResult<()>>>,
    _guard: MutexGuard<'static, ()>,
}

impl TestBus {
    /// Serve the three credential subjects
    pub async fn start(service: Arc<CredentialService>) -> Result<Self> {
        Self::start_with_subjects(service, &Subject::REQUESTS).await
    }

    /// Serve an arbitrary set of subjects
    ///
    /// Returns once the responder is subscribed to every one of them.
    pub async fn start_with_subjects(
        service: Arc<CredentialService>,
        subjects: &[Subject],
    ) -> Result<Self> {
        let guard = BUS_LOCK.lock().await;

        let (pool, url) = RedisPool::connect_first(&bus_servers(), 4).await?;
        let handler = Arc::new(CredentialHandler::new(service));
        let publisher = Publisher::new(pool.clone());

        // The previous test's responder may still be closing its connection
        for subject in subjects {
            wait_for_subscribers(&publisher, subject, |count| count == 0).await?;
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let responder = {
            let url = url.clone();
            let subjects = subjects.to_vec();
            let publisher = publisher.clone();
            tokio::spawn(async move {
                serve(&url, publisher, &subjects, handler, async move {
                    let _ = shutdown_rx.wait_for(|stop| *stop).await;
                })
                .await
            })
        };

        for subject in subjects {
            wait_for_subscribers(&publisher, subject, |count| count > 0).await?;
        }

        let client = BusClient::connect(pool, &url).await?;

        Ok(Self {
            client,
            publisher,
            url,
            shutdown,
            responder: Some(responder),
            _guard: guard,
        })
    }

    /// The client used for requests
    pub fn client(&self) -> &BusClient {
        &self.client
    }

    /// Publisher on the same bus server as the responder
    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// URL of the bus server the responder listens on
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a JSON request and wait for the reply
    pub async fn request(&self, subject: &Subject, payload: &Value) -> BusResult<Value> {
        self.client.request(subject, payload, REQUEST_TIMEOUT).await
    }

    /// Stop the responder and wait for it to unsubscribe
    pub async fn stop(mut self) -> Result<()> {
        let _ = self.shutdown.send(true);
        if let Some(responder) = self.responder.take() {
            responder.await??;
        }
        Ok(())
    }
}

impl Drop for TestBus {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

/// Poll the subscriber count of `subject` until `done` accepts it
async fn wait_for_subscribers(
    publisher: &Publisher,
    subject: &Subject,
    done: impl Fn(u64) -> bool,
) -> Result<()> {
    let mut count = 0;
    for _ in 0..100 {
        count = publisher.subscriber_count(subject).await?;
        if done(count) {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    bail!("{subject} stuck at {count} subscribers")
}
