//! End-to-end Tests
//!
//! These tests require:
//! - Running PostgreSQL instance
//! - Running Redis instance
//! - Environment variables: DATABASE_URL, BUS_SERVERS, and for the health
//!   probes the full process configuration (APP_PORT, JWT_SECRET, JWT_ISSUER,
//!   JWT_EXPIRES)
//!
//! Run with: cargo test -p integration-tests --test e2e_tests

use auth_bus::{BusError, Subject};
use auth_common::ErrorResponse;
use auth_server::server::{create_app, create_app_state};
use auth_service::AuthResponse;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use integration_tests::*;
use tower::ServiceExt;

const STORE_VARS: &[&str] = &["DATABASE_URL", "BUS_SERVERS"];
const PROCESS_VARS: &[&str] = &[
    "APP_PORT",
    "DATABASE_URL",
    "BUS_SERVERS",
    "JWT_SECRET",
    "JWT_ISSUER",
    "JWT_EXPIRES",
];

// ============================================================================
// Credential Flow
// ============================================================================

#[tokio::test]
async fn test_register_then_login_against_postgres() {
    if !check_test_env(STORE_VARS) {
        return;
    }

    let service = pg_service().await.expect("Failed to connect to database");
    let bus = TestBus::start(service).await.expect("Failed to start responder");
    let email = unique_email();

    let reply = bus
        .request(&Subject::Register, &register_payload(&email, "A", TEST_PASSWORD))
        .await
        .expect("register failed");
    let registered: AuthResponse = serde_json::from_value(reply).unwrap();

    match bus
        .request(&Subject::Register, &register_payload(&email, "A", TEST_PASSWORD))
        .await
    {
        Err(BusError::Remote(error)) => {
            assert_eq!(error, ErrorResponse::new(400, "User already exists"));
        }
        other => panic!("expected duplicate rejection, got {other:?}"),
    }

    let reply = bus
        .request(&Subject::Login, &login_payload(&email, TEST_PASSWORD))
        .await
        .expect("login failed");
    let logged_in: AuthResponse = serde_json::from_value(reply).unwrap();
    assert_eq!(logged_in.user, registered.user);

    let reply = bus
        .request(&Subject::Verify, &verify_payload(&logged_in.token))
        .await
        .expect("verify failed");
    let verified: AuthResponse = serde_json::from_value(reply).unwrap();
    assert_eq!(verified.user.id, registered.user.id);

    bus.stop().await.unwrap();
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    if !check_test_env(PROCESS_VARS) {
        return;
    }

    let config = test_config().expect("Failed to load configuration");
    let (state, _) = create_app_state(config)
        .await
        .expect("Failed to initialize dependencies");
    let app = create_app(state);

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ready");
    assert_eq!(json["checks"]["database"], "healthy");
    assert_eq!(json["checks"]["bus"], "healthy");
}
