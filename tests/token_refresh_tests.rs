// SPDX-License-Identifier: MIT

//! Token refresh tests: the 5-minute safety margin, refresh-token retention,
//! and refresh serialization.

use chrono::{Duration as ChronoDuration, Utc};
use overlay_studio::error::AppError;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::MemoryCredentialStore;

#[tokio::test]
async fn test_fresh_token_returned_without_network_call() {
    let server = MockServer::start().await;
    let store = MemoryCredentialStore::new();
    store.seed(
        "user-1",
        common::connected_credential("at-1", "rt-1", Utc::now() + ChronoDuration::hours(1)),
    );
    let service = common::canva_service(store.clone(), &server.uri());

    let token = service.ensure_fresh_token("user-1").await.unwrap();

    assert_eq!(token, "at-1");
    assert!(
        server.received_requests().await.unwrap().is_empty(),
        "a comfortably valid token must not trigger a refresh"
    );
}

#[tokio::test]
async fn test_token_inside_margin_is_refreshed() {
    let server = MockServer::start().await;
    let store = MemoryCredentialStore::new();
    // Expires in 1 minute: inside the 5-minute margin, counts as stale
    store.seed(
        "user-1",
        common::connected_credential("at-1", "rt-1", Utc::now() + ChronoDuration::minutes(1)),
    );
    let service = common::canva_service(store.clone(), &server.uri());

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(header("authorization", common::basic_auth_header().as_str()))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=rt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-2",
            "refresh_token": "rt-2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = service.ensure_fresh_token("user-1").await.unwrap();

    assert_eq!(token, "at-2");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);

    let credential = store.snapshot("user-1").unwrap();
    assert_eq!(credential.access_token.as_deref(), Some("at-2"));
    assert_eq!(credential.refresh_token.as_deref(), Some("rt-2"));
}

#[tokio::test]
async fn test_refresh_without_rotated_token_keeps_old_one() {
    let server = MockServer::start().await;
    let store = MemoryCredentialStore::new();
    store.seed(
        "user-1",
        common::connected_credential("at-1", "rt-1", Utc::now() - ChronoDuration::minutes(10)),
    );
    let service = common::canva_service(store.clone(), &server.uri());

    // Response omits refresh_token entirely
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = service.ensure_fresh_token("user-1").await.unwrap();
    assert_eq!(token, "at-2");

    let credential = store.snapshot("user-1").unwrap();
    assert_eq!(
        credential.refresh_token.as_deref(),
        Some("rt-1"),
        "prior refresh token must survive"
    );
    assert_eq!(credential.access_token.as_deref(), Some("at-2"));
}

#[tokio::test]
async fn test_refresh_rejection_surfaces_and_preserves_credential() {
    let server = MockServer::start().await;
    let store = MemoryCredentialStore::new();
    store.seed(
        "user-1",
        common::connected_credential("at-1", "rt-1", Utc::now() - ChronoDuration::minutes(10)),
    );
    let service = common::canva_service(store.clone(), &server.uri());

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"error": "invalid_grant"})),
        )
        .mount(&server)
        .await;

    let result = service.ensure_fresh_token("user-1").await;
    assert!(matches!(result, Err(AppError::TokenRefresh(_))));

    // The stored record is untouched; the user must re-connect
    let credential = store.snapshot("user-1").unwrap();
    assert_eq!(credential.access_token.as_deref(), Some("at-1"));
    assert_eq!(credential.refresh_token.as_deref(), Some("rt-1"));
}

#[tokio::test]
async fn test_never_connected_user_fails_without_network() {
    let server = MockServer::start().await;
    let store = MemoryCredentialStore::new();
    store.add_user("user-1");
    let service = common::canva_service(store.clone(), &server.uri());

    let result = service.ensure_fresh_token("user-1").await;
    assert!(matches!(result, Err(AppError::NotConnected)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_calls_perform_a_single_refresh() {
    let server = MockServer::start().await;
    let store = MemoryCredentialStore::new();
    store.seed(
        "user-1",
        common::connected_credential("at-1", "rt-1", Utc::now() - ChronoDuration::minutes(10)),
    );
    let service = common::canva_service(store.clone(), &server.uri());

    // Only one refresh may reach the provider; the loser of the lock race
    // must pick up the winner's stored token instead.
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-2",
            "refresh_token": "rt-2",
            "expires_in": 3600
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    let (a, b) = tokio::join!(
        service.ensure_fresh_token("user-1"),
        service.ensure_fresh_token("user-1"),
    );

    assert_eq!(a.unwrap(), "at-2");
    assert_eq!(b.unwrap(), "at-2");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
