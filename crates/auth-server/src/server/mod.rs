//! Server setup and initialization
//!
//! Connects every dependency once, then runs the bus responder and the
//! health server side by side until a shutdown signal arrives.

use std::sync::Arc;

use auth_bus::{serve, Publisher, RedisPool, Subject};
use auth_common::{AppConfig, AppError, JwtService};
use auth_db::{create_pool, run_migrations, DatabaseConfig, PgUserRepository};
use auth_service::{CredentialService, ServiceContextBuilder};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use crate::bus::CredentialHandler;
use crate::middleware::apply_middleware;
use crate::routes::create_router;
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let router = create_router();
    let router = apply_middleware(router);
    router.with_state(state)
}

/// Initialize all dependencies and create AppState
///
/// Returns the state and the URL of the bus server that answered.
pub async fn create_app_state(config: AppConfig) -> Result<(AppState, String), AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&DatabaseConfig::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    run_migrations(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    info!("Connecting to bus...");
    let (bus_pool, bus_url) =
        RedisPool::connect_first(&config.bus.servers, config.bus.max_connections as usize)
            .await
            .map_err(|e| AppError::Bus(e.to_string()))?;

    let jwt_service = Arc::new(JwtService::from_config(&config.jwt));
    let user_repo = Arc::new(PgUserRepository::new(pool.clone()));

    let ctx = ServiceContextBuilder::new()
        .user_repo(user_repo)
        .jwt_service(jwt_service)
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    let state = AppState::new(CredentialService::new(ctx), pool, bus_pool);
    Ok((state, bus_url))
}

/// Run the HTTP health server until `shutdown` flips
pub async fn run_server(
    app: Router,
    address: &str,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(address)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {address}: {e}")))?;

    info!("Health server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the bus responder until `shutdown` flips
pub async fn run_responder(
    state: &AppState,
    bus_url: &str,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), AppError> {
    let handler = Arc::new(CredentialHandler::new(state.service().clone()));
    let publisher = Publisher::new(state.bus_pool().clone());
    let subjects = Subject::REQUESTS;

    serve(bus_url, publisher, &subjects, handler, async move {
        let _ = shutdown.wait_for(|stop| *stop).await;
    })
    .await
    .map_err(|e| AppError::Bus(e.to_string()))
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let address = config.server.address();

    let (state, bus_url) = create_app_state(config).await?;
    let app = create_app(state.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let responder = {
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { run_responder(&state, &bus_url, shutdown).await })
    };

    let server = run_server(app, &address, shutdown_rx);
    tokio::pin!(server);

    let http = tokio::select! {
        result = &mut server => result,
        () = shutdown_signal() => {
            let _ = shutdown_tx.send(true);
            server.await
        }
    };

    // The health server may have failed on its own; stop the responder too
    let _ = shutdown_tx.send(true);
    let bus = responder.await.map_err(AppError::internal)?;

    if let Err(e) = &bus {
        error!(error = %e, "Bus responder stopped with error");
    }
    http.and(bus)
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, stopping...");
}
