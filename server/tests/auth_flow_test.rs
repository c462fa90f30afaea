//! Authentication tests covering the login endpoint and the bearer guard.
//!
//! Every route except `POST /auth/login` and `GET /health` sits behind the
//! token middleware. These tests verify:
//!
//! 1. Logins against the configured credential list issue decodable tokens
//! 2. Bad credentials and malformed login bodies are rejected
//! 3. Every protected route refuses missing, expired, tampered, and
//!    wrongly-signed tokens before touching the database

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use stagepass_server::auth::{decode_token, Claims};
use stagepass_server::config::{Config, DeletePolicy};
use stagepass_server::db::create_memory_pool;
use stagepass_server::routes::{create_router, AppState};

const TEST_SECRET: &str = "integration-test-secret";

/// Every route that must sit behind the bearer guard.
const PROTECTED_ROUTES: &[(&str, &str)] = &[
    ("GET", "/events"),
    ("POST", "/events"),
    ("GET", "/events/1"),
    ("PUT", "/events/1"),
    ("DELETE", "/events/1"),
    ("GET", "/events/1/resources"),
    ("POST", "/events/1/resources"),
    ("DELETE", "/events/1/resources/1"),
    ("GET", "/artists"),
    ("POST", "/artists"),
    ("GET", "/artists/1"),
    ("PUT", "/artists/1"),
    ("DELETE", "/artists/1"),
    ("GET", "/resources"),
    ("POST", "/resources"),
    ("GET", "/resources/1"),
    ("PUT", "/resources/1"),
    ("DELETE", "/resources/1"),
];

// ============================================================================
// Test Helpers
// ============================================================================

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        users: vec![
            ("john".to_string(), "cena".to_string()),
            ("batman".to_string(), "pass".to_string()),
        ],
        delete_policy: DeletePolicy::Restrict,
        port: 8080,
    }
}

async fn test_app() -> Router {
    let pool = create_memory_pool().await.expect("pool created");
    create_router(AppState::new(test_config(), pool))
}

fn login_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn bearer_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn encode_claims(claims: &Claims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("claims encode")
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> Response {
    app.clone()
        .oneshot(login_request(
            &json!({ "username": username, "password": password }),
        ))
        .await
        .unwrap()
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn login_issues_decodable_token() {
    let app = test_app().await;

    let response = login(&app, "john", "cena").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let token = body["jwt_token"].as_str().expect("token string");

    let claims = decode_token(token, TEST_SECRET).expect("valid token");
    assert_eq!(claims.sub, 1);
    assert_eq!(claims.username, "john");
    assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    assert!((claims.iat - unix_now()).abs() < 60);
}

#[tokio::test]
async fn each_user_gets_its_own_subject() {
    let app = test_app().await;

    let response = login(&app, "batman", "pass").await;
    assert_eq!(response.status(), StatusCode::OK);

    let token = body_json(response).await["jwt_token"]
        .as_str()
        .unwrap()
        .to_string();
    let claims = decode_token(&token, TEST_SECRET).expect("valid token");
    assert_eq!(claims.sub, 2);
    assert_eq!(claims.username, "batman");
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = test_app().await;

    for (username, password) in [("john", "wrong"), ("nobody", "cena"), ("", "")] {
        let response = login(&app, username, password).await;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "expected 401 for {username:?}/{password:?}"
        );
        let error = body_json(response).await;
        assert_eq!(error["code"], "unauthorized");
    }
}

#[tokio::test]
async fn login_rejects_malformed_bodies() {
    let app = test_app().await;

    // Missing password
    let response = app
        .clone()
        .oneshot(login_request(&json!({ "username": "john" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Unknown field
    let response = app
        .oneshot(login_request(
            &json!({ "username": "john", "password": "cena", "remember_me": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ============================================================================
// Bearer Guard
// ============================================================================

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = test_app().await;

    for (method, uri) in PROTECTED_ROUTES {
        let request = Request::builder()
            .method(*method)
            .uri(*uri)
            .body(Body::empty())
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "expected 401 for {method} {uri} without a token"
        );
    }
}

#[tokio::test]
async fn valid_token_grants_access() {
    let app = test_app().await;

    let response = login(&app, "john", "cena").await;
    let token = body_json(response).await["jwt_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(bearer_request("GET", "/events", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = test_app().await;

    let now = unix_now();
    let token = encode_claims(
        &Claims {
            sub: 1,
            username: "john".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        },
        TEST_SECRET,
    );

    let response = app
        .oneshot(bearer_request("GET", "/events", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_wrong_secret_is_rejected() {
    let app = test_app().await;

    let now = unix_now();
    let token = encode_claims(
        &Claims {
            sub: 1,
            username: "john".to_string(),
            iat: now,
            exp: now + 3600,
        },
        "some-other-secret",
    );

    let response = app
        .oneshot(bearer_request("GET", "/events", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let app = test_app().await;

    let response = login(&app, "john", "cena").await;
    let token = body_json(response).await["jwt_token"]
        .as_str()
        .unwrap()
        .to_string();

    // Corrupting the signature segment must break verification
    let tampered = format!("{token}AA");
    let response = app
        .clone()
        .oneshot(bearer_request("GET", "/events", &tampered))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // So must a token that is not a JWT at all
    let response = app
        .oneshot(bearer_request("GET", "/events", "not-a-jwt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rejected_writes_do_not_persist() {
    let app = test_app().await;

    // An unauthenticated create is refused outright
    let request = Request::builder()
        .method("POST")
        .uri("/artists")
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({ "name": "Nina", "event_id": 1 }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Nothing reached the database
    let response = login(&app, "john", "cena").await;
    let token = body_json(response).await["jwt_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(bearer_request("GET", "/artists", &token))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!([]));
}

// ============================================================================
// Open Routes
// ============================================================================

#[tokio::test]
async fn health_needs_no_token() {
    let app = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["uptime_seconds"].is_u64());
}
