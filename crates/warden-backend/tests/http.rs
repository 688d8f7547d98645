//! Integration tests for the HTTP backend.
//!
//! Each test starts a `wiremock` server that plays the auth backend, so
//! the real `reqwest` client, URL joining, and status/body mapping are
//! all exercised end to end.

#[cfg(feature = "http")]
mod http {
    use serde_json::json;
    use warden_backend::{AuthBackend, BackendConfig, BackendError, HttpBackend};
    use warden_protocol::{LoginRequest, UserId};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn backend_for(server: &MockServer) -> HttpBackend {
        HttpBackend::new(BackendConfig::with_base_url(server.uri()))
            .expect("client should build")
    }

    fn bob_json() -> serde_json::Value {
        json!({
            "id": 1,
            "username": "bob",
            "email": "bob@example.com",
            "is_active": true,
            "created_at": "2024-05-01T12:00:00"
        })
    }

    // =====================================================================
    // login
    // =====================================================================

    #[tokio::test]
    async fn test_login_success_returns_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"username": "bob", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "abc",
                "token_type": "bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let token = backend
            .login(&LoginRequest::new("bob", "pw"))
            .await
            .expect("login should succeed");

        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, Some(3600));
    }

    #[tokio::test]
    async fn test_login_401_maps_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"detail": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let err = backend
            .login(&LoginRequest::new("bob", "wrongpass"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            BackendError::Rejected {
                status: 401,
                detail: Some("Invalid credentials".into()),
            }
        );
    }

    #[tokio::test]
    async fn test_login_422_uses_first_validation_msg() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "detail": [
                    {"loc": ["body", "password"], "msg": "field required", "type": "missing"}
                ]
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let err = backend
            .login(&LoginRequest::new("bob", ""))
            .await
            .unwrap_err();

        assert_eq!(err.detail(), Some("field required"));
    }

    #[tokio::test]
    async fn test_login_500_plain_text_has_no_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(500).set_body_string("Internal Server Error"),
            )
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let err = backend
            .login(&LoginRequest::new("bob", "pw"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BackendError::Rejected {
                status: 500,
                detail: None
            }
        ));
    }

    #[tokio::test]
    async fn test_login_malformed_body_returns_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"token": "abc"})),
            )
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let err = backend
            .login(&LoginRequest::new("bob", "pw"))
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_login_empty_token_returns_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "",
                "token_type": "bearer"
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let err = backend
            .login(&LoginRequest::new("bob", "pw"))
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_login_unreachable_backend_returns_transport_error() {
        // Nothing listens on port 9 (discard) on a test machine.
        let backend =
            HttpBackend::new(BackendConfig::with_base_url("http://127.0.0.1:9"))
                .unwrap();

        let err = backend
            .login(&LoginRequest::new("bob", "pw"))
            .await
            .unwrap_err();

        assert!(err.is_transport(), "expected transport error, got {err:?}");
    }

    // =====================================================================
    // current_user / verify / logout
    // =====================================================================

    #[tokio::test]
    async fn test_current_user_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(bob_json()))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let user = backend.current_user("abc").await.unwrap();

        assert_eq!(user.id, UserId::from("1"));
        assert_eq!(user.username, "bob");
    }

    #[tokio::test]
    async fn test_verify_valid_false_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/verify"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"valid": false})),
            )
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let verdict = backend.verify("abc").await.unwrap();

        assert!(!verdict.valid);
    }

    #[tokio::test]
    async fn test_verify_401_returns_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/verify"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"detail": "Token expired"})),
            )
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let err = backend.verify("abc").await.unwrap_err();

        assert_eq!(err.detail(), Some("Token expired"));
    }

    #[tokio::test]
    async fn test_logout_posts_with_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        backend.logout("abc").await.expect("logout should succeed");
    }

    #[tokio::test]
    async fn test_logout_404_returns_rejected() {
        // Backends without a logout route answer 404; callers ignore it.
        let server = MockServer::start().await;

        let backend = backend_for(&server).await;
        let err = backend.logout("abc").await.unwrap_err();

        assert!(matches!(err, BackendError::Rejected { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_custom_base_path_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "valid": true, "user_id": 1, "username": "bob"
            })))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(BackendConfig::with_base_url(format!(
            "{}/api/v1/",
            server.uri()
        )))
        .unwrap();
        let verdict = backend.verify("abc").await.unwrap();

        assert!(verdict.valid);
        assert_eq!(verdict.user_id, Some(UserId::from("1")));
    }
}
