//! Bus Integration Tests
//!
//! These tests require:
//! - Running Redis instance
//! - Environment variables: BUS_SERVERS
//!
//! The store is in-memory, so no database is needed.
//!
//! Run with: cargo test -p integration-tests --test bus_tests

use std::sync::Arc;

use auth_bus::{serve, BusError, Subject, SubscriberError};
use auth_server::CredentialHandler;
use auth_common::ErrorResponse;
use auth_service::AuthResponse;
use futures_util::future::join_all;
use integration_tests::*;
use serde_json::json;

fn remote(result: Result<serde_json::Value, BusError>) -> ErrorResponse {
    match result {
        Err(BusError::Remote(error)) => error,
        other => panic!("expected an error reply, got {other:?}"),
    }
}

#[tokio::test]
async fn test_round_trip_over_bus() {
    if !check_test_env(&["BUS_SERVERS"]) {
        return;
    }

    let (service, _) = mock_service();
    let bus = TestBus::start(service).await.expect("Failed to start responder");
    let email = unique_email();

    let reply = bus
        .request(&Subject::Register, &register_payload(&email, "A", TEST_PASSWORD))
        .await
        .expect("register failed");
    let registered: AuthResponse = serde_json::from_value(reply).unwrap();
    assert_eq!(registered.user.email, email);

    let duplicate = remote(
        bus.request(&Subject::Register, &register_payload(&email, "A", TEST_PASSWORD))
            .await,
    );
    assert_eq!(duplicate, ErrorResponse::new(400, "User already exists"));

    let wrong = remote(
        bus.request(&Subject::Login, &login_payload(&email, "pw124"))
            .await,
    );
    assert_eq!(wrong, ErrorResponse::new(400, "User/Password not valid"));

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
    assert_eq!(verified.user, registered.user);

    let rejected = remote(bus.request(&Subject::Verify, &verify_payload("garbage")).await);
    assert_eq!(rejected, ErrorResponse::new(401, "Invalid token"));

    bus.stop().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_requests_are_correlated() {
    if !check_test_env(&["BUS_SERVERS"]) {
        return;
    }

    let (service, repo) = mock_service();
    let bus = TestBus::start(service).await.expect("Failed to start responder");

    let emails: Vec<String> = (0..10).map(|_| unique_email()).collect();
    let requests = emails.iter().map(|email| {
        let payload = register_payload(email, "A", TEST_PASSWORD);
        let bus = &bus;
        async move { bus.request(&Subject::Register, &payload).await }
    });

    let replies = join_all(requests).await;
    for (email, reply) in emails.iter().zip(replies) {
        let response: AuthResponse = serde_json::from_value(reply.unwrap()).unwrap();
        assert_eq!(&response.user.email, email);
    }
    assert_eq!(repo.len(), emails.len());

    bus.stop().await.unwrap();
}

#[tokio::test]
async fn test_unknown_subject_is_not_found() {
    if !check_test_env(&["BUS_SERVERS"]) {
        return;
    }

    let reset = Subject::custom(format!("auth.reset.{}", unique_suffix()));
    let (service, _) = mock_service();
    let bus = TestBus::start_with_subjects(service, std::slice::from_ref(&reset))
        .await
        .expect("Failed to start responder");

    let error = remote(bus.request(&reset, &json!({})).await);
    assert_eq!(error.status, 404);
    assert_eq!(error.message, format!("Unknown subject: {reset}"));

    bus.stop().await.unwrap();
}

#[tokio::test]
async fn test_no_responders() {
    if !check_test_env(&["BUS_SERVERS"]) {
        return;
    }

    let (service, _) = mock_service();
    let bus = TestBus::start_with_subjects(service, &[])
        .await
        .expect("Failed to start responder");

    let nobody = Subject::custom(format!("auth.nobody.{}", unique_suffix()));
    let result = bus.request(&nobody, &json!({})).await;
    assert!(matches!(result, Err(BusError::NoResponders(_))));

    bus.stop().await.unwrap();
}

#[tokio::test]
async fn test_second_responder_is_refused() {
    if !check_test_env(&["BUS_SERVERS"]) {
        return;
    }

    let (service, repo) = mock_service();
    let bus = TestBus::start(service).await.expect("Failed to start responder");

    let (other, _) = mock_service();
    let result = serve(
        bus.url(),
        bus.publisher().clone(),
        &Subject::REQUESTS,
        Arc::new(CredentialHandler::new(other)),
        async {},
    )
    .await;
    assert!(matches!(result, Err(SubscriberError::SubjectTaken(_))));

    // The original responder still answers alone
    let email = unique_email();
    bus.request(&Subject::Register, &register_payload(&email, "A", TEST_PASSWORD))
        .await
        .expect("register failed");
    let reply = bus
        .request(&Subject::Login, &login_payload(&email, TEST_PASSWORD))
        .await
        .expect("login failed");
    let logged_in: AuthResponse = serde_json::from_value(reply).unwrap();
    assert_eq!(logged_in.user.email, email);
    assert_eq!(repo.len(), 1);

    bus.stop().await.unwrap();
}
