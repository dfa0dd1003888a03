//! End-to-end API tests driven through the router with `oneshot`.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use marketstall_backend::{
    app::build_app,
    auth::jwt::JwtHandler,
    auth::models::{Role, User},
    config::Config,
};
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_SECRET: &str = "integration-test-secret-key-12345";

fn test_app() -> (Router, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let config = Config {
        database_path: temp_file.path().to_str().unwrap().to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        token_ttl: Duration::days(7),
    };
    (build_app(&config).unwrap(), temp_file)
}

async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = request(
        app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn register_then_login_roundtrip() {
    let (app, _db) = test_app();

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({
            "email": "alice@example.com",
            "password": "secret123",
            "name": "Alice",
            "phone": "0812345678"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["role"], "user");
    assert!(body.get("password_hash").is_none());

    // Wrong password: uniform invalid-credentials error
    let (status, body) = request(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email or password");

    // Unknown email: indistinguishable from wrong password
    let (status, body) = request(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email or password");

    // Correct credentials: token plus sanitized user view
    let token = login(&app, "alice@example.com", "secret123").await;

    let (status, body) = request(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn duplicate_registration_rejected() {
    let (app, _db) = test_app();

    let payload = json!({
        "email": "bob@example.com",
        "password": "secret123",
        "name": "Bob"
    });

    let (status, _) = request(&app, Method::POST, "/api/register", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(&app, Method::POST, "/api/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already registered");

    // First account still works
    login(&app, "bob@example.com", "secret123").await;
}

#[tokio::test]
async fn registration_validation() {
    let (app, _db) = test_app();

    // Missing fields
    let (status, _) = request(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({ "email": "", "password": "secret123", "name": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Weak password
    let (status, body) = request(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({ "email": "x@example.com", "password": "short", "name": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password must be at least 8 characters");

    // Unknown stall association
    let (status, body) = request(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({
            "email": "y@example.com",
            "password": "secret123",
            "name": "Y",
            "stall_number": "Z9"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Stall not found");
}

#[tokio::test]
async fn missing_token_is_unauthorized_never_forbidden() {
    let (app, _db) = test_app();

    // Admin-gated endpoint without any token: the gate reports the missing
    // token before any role logic runs.
    let (status, body) = request(&app, Method::GET, "/api/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing authorization token");
}

#[tokio::test]
async fn foreign_and_expired_tokens_rejected() {
    let (app, _db) = test_app();

    let user = User {
        id: Uuid::new_v4(),
        email: "mallory@example.com".to_string(),
        name: "Mallory".to_string(),
        phone: None,
        password_hash: "hash".to_string(),
        role: Role::Admin,
        stall_id: None,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    // Well-formed claims signed with the wrong secret
    let foreign = JwtHandler::new("some-other-secret".to_string(), Duration::days(7));
    let (token, _) = foreign.issue(&user).unwrap();
    let (status, body) = request(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid token");

    // Correct secret, expiry already in the past
    let expired = JwtHandler::new(TEST_SECRET.to_string(), Duration::seconds(-60));
    let (token, _) = expired.issue(&user).unwrap();
    let (status, body) = request(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Token expired");

    // Garbage
    let (status, _) = request(&app, Method::GET, "/api/auth/me", Some("junk"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn role_gating_and_booking_flow() {
    let (app, _db) = test_app();

    // Default admin is seeded at store init
    let admin_token = login(&app, "admin@example.com", "admin1234").await;

    let (status, _) = request(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({ "email": "carol@example.com", "password": "secret123", "name": "Carol" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_token = login(&app, "carol@example.com", "secret123").await;

    // User cannot create stalls
    let stall_payload = json!({ "stall_number": "A1", "size": "2x2", "price_per_day": 100.0 });
    let (status, body) = request(
        &app,
        Method::POST,
        "/api/stalls",
        Some(&user_token),
        Some(stall_payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Insufficient permissions");

    // Admin can
    let (status, stall) = request(
        &app,
        Method::POST,
        "/api/stalls",
        Some(&admin_token),
        Some(stall_payload),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let stall_id = stall["id"].as_i64().unwrap();

    // Any authenticated user can browse stalls
    let (status, stalls) = request(&app, Method::GET, "/api/stalls", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stalls.as_array().unwrap().len(), 1);

    // User books the stall; subject comes from the token
    let (status, booking) = request(
        &app,
        Method::POST,
        "/api/bookings",
        Some(&user_token),
        Some(json!({ "stall_id": stall_id, "start_date": "2025-02-01", "end_date": "2025-02-03" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["status"], "pending");
    let booking_id = booking["id"].as_i64().unwrap();

    // User sees it under /api/bookings/me but cannot list all bookings
    let (status, mine) = request(&app, Method::GET, "/api/bookings/me", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, _) = request(&app, Method::GET, "/api/bookings", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin confirms the booking; invalid status strings are rejected
    let (status, _) = request(
        &app,
        Method::PATCH,
        &format!("/api/bookings/{}/status", booking_id),
        Some(&admin_token),
        Some(json!({ "status": "done" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = request(
        &app,
        Method::PATCH,
        &format!("/api/bookings/{}/status", booking_id),
        Some(&admin_token),
        Some(json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "confirmed");
}

#[tokio::test]
async fn profile_update_flow() {
    let (app, _db) = test_app();

    let (status, _) = request(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({ "email": "dave@example.com", "password": "secret123", "name": "Dave" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = login(&app, "dave@example.com", "secret123").await;

    let (status, profile) = request(&app, Method::GET, "/api/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "Dave");
    assert!(profile["phone"].is_null());

    let (status, updated) = request(
        &app,
        Method::PUT,
        "/api/profile",
        Some(&token),
        Some(json!({ "phone": "0899999999" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phone"], "0899999999");
    assert_eq!(updated["name"], "Dave");

    // Credentials unaffected by the profile path
    login(&app, "dave@example.com", "secret123").await;
}

#[tokio::test]
async fn admin_user_management() {
    let (app, _db) = test_app();

    let admin_token = login(&app, "admin@example.com", "admin1234").await;

    // Admin mints an elevated account
    let (status, created) = request(
        &app,
        Method::POST,
        "/api/admin/users",
        Some(&admin_token),
        Some(json!({
            "email": "ops@example.com",
            "password": "opsopsops",
            "name": "Ops",
            "role": "admin"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["role"], "admin");

    let (status, users) = request(&app, Method::GET, "/api/admin/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    // Self-deletion is rejected
    let (status, me) = request(&app, Method::GET, "/api/auth/me", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let my_id = me["id"].as_str().unwrap().to_string();
    let (status, _) = request(
        &app,
        Method::DELETE,
        &format!("/api/admin/users/{}", my_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Deleting the other admin works
    let other_id = created["id"].as_str().unwrap().to_string();
    let (status, _) = request(
        &app,
        Method::DELETE,
        &format!("/api/admin/users/{}", other_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Plain users are locked out of user management
    let (status, _) = request(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({ "email": "eve@example.com", "password": "secret123", "name": "Eve" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_token = login(&app, "eve@example.com", "secret123").await;

    let (status, _) = request(&app, Method::GET, "/api/admin/users", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
