//! End-to-end tests: `WardenBuilder` + `HttpBackend` against a mock auth
//! service, with real stores.

use std::time::Duration;

use serde_json::json;
use warden::prelude::*;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =========================================================================
// Mock auth service
// =========================================================================

async fn auth_service() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "abc",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "username": "bob",
            "email": "bob@example.com",
            "is_active": true,
            "created_at": "2024-05-01T12:00:00"
        })))
        .mount(&server)
        .await;
    server
}

async fn mount_verify(server: &MockServer, valid: bool) {
    Mock::given(method("GET"))
        .and(path("/auth/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": valid,
            "user_id": 1,
            "username": "bob"
        })))
        .mount(server)
        .await;
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_login_over_http_authenticates() {
    let server = auth_service().await;
    let warden = WardenBuilder::new().base_url(&server.uri()).build().unwrap();

    let session = warden.login("bob", "pw").await.unwrap();

    assert_eq!(session.status, SessionStatus::Authenticated);
    assert_eq!(session.user.unwrap().id, UserId::from(1_u64));
    assert_eq!(warden.authorization_value().as_deref(), Some("Bearer abc"));
}

#[tokio::test]
async fn test_login_rejected_over_http_surfaces_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Invalid credentials"})),
        )
        .mount(&server)
        .await;
    let warden = WardenBuilder::new().base_url(&server.uri()).build().unwrap();

    let err: WardenError = warden.login("bob", "wrong").await.unwrap_err().into();

    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(warden.status(), SessionStatus::Anonymous);
}

#[tokio::test]
async fn test_session_survives_restart_in_file_store() {
    let server = auth_service().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");

    let first = WardenBuilder::new()
        .base_url(&server.uri())
        .store(FileStore::new(&file))
        .build()
        .unwrap();
    let original = first.login("bob", "pw").await.unwrap();
    drop(first);

    let second = WardenBuilder::new()
        .base_url(&server.uri())
        .store(FileStore::new(&file))
        .build()
        .unwrap();
    let restored = second.restore();

    assert!(restored.is_authenticated());
    assert_eq!(restored.token, original.token);
    assert_eq!(restored.expires_at, original.expires_at);

    second.logout();
    assert!(!file.exists());
}

#[tokio::test]
async fn test_verify_invalid_over_http_then_logout() {
    let server = auth_service().await;
    mount_verify(&server, false).await;
    let store = MemoryStore::new();
    let warden = WardenBuilder::new()
        .base_url(&server.uri())
        .store(store.clone())
        .build()
        .unwrap();
    warden.login("bob", "pw").await.unwrap();

    assert!(!warden.verify_or_logout().await);

    assert_eq!(warden.status(), SessionStatus::Anonymous);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_remote_logout_reaches_backend() {
    let server = auth_service().await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let warden = WardenBuilder::new()
        .base_url(&server.uri())
        .session_config(SessionConfig {
            remote_logout: true,
            ..SessionConfig::default()
        })
        .build()
        .unwrap();
    warden.login("bob", "pw").await.unwrap();

    warden.logout();

    // Fire-and-forget: wait for the spawned request to land.
    for _ in 0..50 {
        let requests = server.received_requests().await.unwrap_or_default();
        if requests.iter().any(|r| r.url.path() == "/auth/logout") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(!warden.is_authenticated());
    server.verify().await;
}
