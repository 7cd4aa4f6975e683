//! Credential flows through the bus handler, without a broker
//!
//! Exercises the same JSON in, JSON out path the responder uses, over an
//! in-memory store. No external services required.
//!
//! Run with: cargo test -p integration-tests --test handler_tests

use std::sync::Arc;

use auth_bus::{RequestHandler, Subject};
use auth_common::ErrorResponse;
use auth_server::CredentialHandler;
use auth_service::AuthResponse;
use integration_tests::*;
use serde_json::{json, Value};

fn handler() -> (CredentialHandler, MockUserRepository) {
    let (service, repo) = mock_service();
    (CredentialHandler::new(service), repo)
}

async fn call(handler: &CredentialHandler, subject: Subject, payload: Value) -> Result<AuthResponse, ErrorResponse> {
    handler
        .handle(&subject, payload)
        .await
        .map(|data| serde_json::from_value(data).expect("reply is an AuthResponse"))
}

// ============================================================================
// Full Flow
// ============================================================================

#[tokio::test]
async fn test_register_login_verify_flow() {
    let (handler, repo) = handler();
    let email = unique_email();

    let registered = call(&handler, Subject::Register, register_payload(&email, "A", TEST_PASSWORD))
        .await
        .unwrap();
    assert_eq!(registered.user.email, email);
    assert_eq!(registered.user.name, "A");
    assert!(!registered.token.is_empty());

    let duplicate = call(&handler, Subject::Register, register_payload(&email, "B", "other"))
        .await
        .unwrap_err();
    assert_eq!(duplicate, ErrorResponse::new(400, "User already exists"));
    assert_eq!(repo.len(), 1);

    let wrong = call(&handler, Subject::Login, login_payload(&email, "pw124"))
        .await
        .unwrap_err();
    assert_eq!(wrong, ErrorResponse::new(400, "User/Password not valid"));

    let logged_in = call(&handler, Subject::Login, login_payload(&email, TEST_PASSWORD))
        .await
        .unwrap();
    assert_eq!(logged_in.user, registered.user);

    let verified = call(&handler, Subject::Verify, verify_payload(&logged_in.token))
        .await
        .unwrap();
    assert_eq!(verified.user, registered.user);
    assert!(!verified.token.is_empty());

    // A re-signed token verifies in turn
    let again = call(&handler, Subject::Verify, verify_payload(&verified.token))
        .await
        .unwrap();
    assert_eq!(again.user, registered.user);
}

#[tokio::test]
async fn test_password_is_stored_hashed() {
    let (handler, repo) = handler();
    let email = unique_email();

    call(&handler, Subject::Register, register_payload(&email, "A", TEST_PASSWORD))
        .await
        .unwrap();

    let stored = repo.get(&email).unwrap();
    assert_ne!(stored.password_hash, TEST_PASSWORD);
    assert!(stored.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn test_reply_never_carries_digest() {
    let (handler, _) = handler();

    let reply = handler
        .handle(&Subject::Register, register_payload(&unique_email(), "A", TEST_PASSWORD))
        .await
        .unwrap();

    let user = reply["user"].as_object().unwrap();
    let mut keys: Vec<_> = user.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["email", "id", "name"]);
}

// ============================================================================
// Rejections
// ============================================================================

#[tokio::test]
async fn test_login_unknown_email_matches_wrong_password() {
    let (handler, _) = handler();

    let error = call(&handler, Subject::Login, login_payload(&unique_email(), TEST_PASSWORD))
        .await
        .unwrap_err();
    assert_eq!(error, ErrorResponse::new(400, "User/Password not valid"));
}

#[tokio::test]
async fn test_register_validation_errors() {
    let (handler, repo) = handler();

    let error = call(&handler, Subject::Register, register_payload("not-an-email", "A", TEST_PASSWORD))
        .await
        .unwrap_err();
    assert_eq!(error.status, 400);
    assert!(error.message.contains("email must be a valid email address"));

    let error = call(&handler, Subject::Register, register_payload(&unique_email(), "", ""))
        .await
        .unwrap_err();
    assert_eq!(error.status, 400);
    assert!(error.message.contains("name should not be empty"));
    assert!(error.message.contains("password should not be empty"));

    assert!(repo.is_empty());
}

#[tokio::test]
async fn test_malformed_payload() {
    let (handler, _) = handler();

    let error = call(&handler, Subject::Register, json!({ "email": "a@x.com" }))
        .await
        .unwrap_err();
    assert_eq!(error.status, 400);
    assert!(error.message.starts_with("Invalid payload"));

    let error = call(&handler, Subject::Verify, json!("just a string"))
        .await
        .unwrap_err();
    assert_eq!(error.status, 400);
}

#[tokio::test]
async fn test_verify_rejects_bad_tokens() {
    let (handler, _) = handler();
    let expected = ErrorResponse::new(401, "Invalid token");

    for token in ["", "garbage", "a.b.c"] {
        let error = call(&handler, Subject::Verify, verify_payload(token))
            .await
            .unwrap_err();
        assert_eq!(error, expected, "token {token:?}");
    }

    // Signed with another secret
    let foreign = auth_common::JwtService::new("some-other-secret", "auth-service", 900)
        .sign(&json!({ "id": uuid::Uuid::new_v4(), "email": "a@x.com", "name": "A" }))
        .unwrap();
    let error = call(&handler, Subject::Verify, verify_payload(&foreign))
        .await
        .unwrap_err();
    assert_eq!(error, expected);
}

#[tokio::test]
async fn test_unknown_subject() {
    let (handler, _) = handler();

    let error = handler
        .handle(&Subject::custom("auth.reset"), json!({}))
        .await
        .unwrap_err();
    assert_eq!(error, ErrorResponse::new(404, "Unknown subject: auth.reset"));
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_concurrent_registrations_one_wins() {
    let (handler, repo) = handler();
    let handler = Arc::new(handler);
    let email = unique_email();

    let attempts: Vec<_> = (0..8)
        .map(|i| {
            let handler = handler.clone();
            let payload = register_payload(&email, &format!("user-{i}"), TEST_PASSWORD);
            tokio::spawn(async move { handler.handle(&Subject::Register, payload).await })
        })
        .collect();

    let mut created = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert_eq!(e, ErrorResponse::new(400, "User already exists")),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(repo.len(), 1);
}
