//! API Integration Tests
//!
//! Every test drives the full router with `oneshot` over the in-memory
//! credential store, so no database is needed.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use registrar_api::{create_router, create_router_for_testing, state::AppState};
use registrar_core::{Account, Role};
use serde_json::{json, Value};
use tower::ServiceExt;

const STUDENT_EMAIL: &str = "student@example.edu";
const STUDENT_PASSWORD: &str = "correct-horse-battery";
const ADMIN_EMAIL: &str = "admin@example.edu";
const ADMIN_PASSWORD: &str = "admin-password-123";

/// Helper to create a test request
fn create_json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn authed_request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let mut request = create_json_request(method, uri, body);
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    request
}

fn login_request(uri: &str, email: &str, password: &str) -> Request<Body> {
    create_json_request(
        "POST",
        uri,
        Some(json!({ "email": email, "password": password })),
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

struct TestApp {
    state: Arc<AppState>,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let state = Arc::new(AppState::for_testing());
        let router = create_router(state.clone());
        Self { state, router }
    }

    async fn seed(&self, email: &str, password: &str, role: Role) -> Account {
        self.seed_with(email, password, role, |_| {}).await
    }

    async fn seed_with(
        &self,
        email: &str,
        password: &str,
        role: Role,
        customize: impl FnOnce(&mut Account),
    ) -> Account {
        let hash = self.state.auth.hasher().hash(password).unwrap();
        let mut account = Account::new(email, hash, role, "Test", "User");
        customize(&mut account);
        self.state.auth.accounts().create(account).await.unwrap()
    }

    async fn stored(&self, account: &Account) -> Account {
        self.state
            .auth
            .accounts()
            .find_by_id(account.id)
            .await
            .unwrap()
            .unwrap()
    }

    async fn token_for(&self, email: &str, password: &str) -> String {
        let (status, body) = send(
            &self.router,
            login_request("/api/auth/login", email, password),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = create_router_for_testing();

    for uri in ["/health", "/api/health"] {
        let (status, body) = send(
            &app,
            Request::builder().uri(uri).body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
        assert!(body["data"]["version"].is_string());
    }
}

#[tokio::test]
async fn test_readiness_check() {
    let app = create_router_for_testing();
    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/api/ready")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ready"], true);
}

#[tokio::test]
async fn test_security_headers_on_api_responses() {
    let app = create_router_for_testing();
    let response = app
        .oneshot(login_request("/api/auth/login", "x@example.edu", "whatever"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
}

// =============================================================================
// Registration Tests
// =============================================================================

#[tokio::test]
async fn test_register_returns_account_and_usable_token() {
    let app = TestApp::new();

    let (status, body) = send(
        &app.router,
        create_json_request(
            "POST",
            "/api/auth/register",
            Some(json!({
                "firstName": "Jane",
                "lastName": "Doe",
                "email": "Jane.Doe@Example.edu",
                "password": "a-good-password",
                "studentId": "S-100",
                "major": "Physics"
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["email"], "jane.doe@example.edu");
    assert_eq!(body["data"]["user"]["role"], "student");
    assert_eq!(body["data"]["user"]["mustChangePassword"], false);
    assert!(body["data"]["user"].get("passwordHash").is_none());
    assert!(body["data"]["user"].get("password_hash").is_none());

    let token = body["data"]["token"].as_str().unwrap();
    let (status, me) = send(
        &app.router,
        authed_request("GET", "/api/auth/me", token, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["user"]["studentId"], "S-100");
}

#[tokio::test]
async fn test_register_cannot_choose_role() {
    let app = TestApp::new();

    let (status, body) = send(
        &app.router,
        create_json_request(
            "POST",
            "/api/auth/register",
            Some(json!({
                "firstName": "Eve",
                "lastName": "Sneaky",
                "email": "eve@example.edu",
                "password": "a-good-password",
                "role": "admin"
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["user"]["role"], "student");
}

#[tokio::test]
async fn test_register_without_password_uses_default() {
    let app = TestApp::new();

    let (status, body) = send(
        &app.router,
        create_json_request(
            "POST",
            "/api/auth/register",
            Some(json!({
                "firstName": "Sam",
                "lastName": "Lee",
                "email": "sam@example.edu",
                "studentId": "2024001"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["user"]["mustChangePassword"], true);

    app.token_for("sam@example.edu", "2024001123").await;
}

#[tokio::test]
async fn test_duplicate_registration_conflicts_and_keeps_first_account() {
    let app = TestApp::new();
    let first = json!({
        "firstName": "Jane",
        "lastName": "Doe",
        "email": "jane@example.edu",
        "password": "first-password"
    });
    let (status, _) = send(
        &app.router,
        create_json_request("POST", "/api/auth/register", Some(first)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let second = json!({
        "firstName": "Impostor",
        "lastName": "Doe",
        "email": "JANE@example.edu",
        "password": "second-password"
    });
    let (status, body) = send(
        &app.router,
        create_json_request("POST", "/api/auth/register", Some(second)),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "DUPLICATE_EMAIL");

    // first account unchanged
    let token = app.token_for("jane@example.edu", "first-password").await;
    let (_, me) = send(
        &app.router,
        authed_request("GET", "/api/auth/me", &token, None),
    )
    .await;
    assert_eq!(me["data"]["user"]["firstName"], "Jane");
    assert_eq!(app.state.auth.accounts().count(None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_duplicate_student_id_conflicts() {
    let app = TestApp::new();
    app.seed_with("a@example.edu", "password-a", Role::Student, |a| {
        a.student_id = Some("S-1".to_string())
    })
    .await;

    let (status, body) = send(
        &app.router,
        create_json_request(
            "POST",
            "/api/auth/register",
            Some(json!({
                "firstName": "B",
                "lastName": "B",
                "email": "b@example.edu",
                "studentId": "S-1"
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_STUDENT_ID");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = create_router_for_testing();

    let (status, body) = send(
        &app,
        create_json_request(
            "POST",
            "/api/auth/register",
            Some(json!({ "firstName": "", "lastName": "Doe", "email": "not-an-email" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["success"], false);
}

// =============================================================================
// Login Tests
// =============================================================================

#[tokio::test]
async fn test_login_missing_credentials() {
    let app = create_router_for_testing();

    for body in [json!({}), json!({ "email": "a@example.edu" }), json!({ "password": "x" })] {
        let (status, response) = send(
            &app,
            create_json_request("POST", "/api/auth/login", Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["code"], "MISSING_CREDENTIALS");
    }
}

#[tokio::test]
async fn test_login_malformed_body() {
    let app = create_router_for_testing();
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("Content-Type", "application/json")
        .body(Body::from("{\"email\":"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let app = create_router_for_testing();
    let padding = "x".repeat(20 * 1024);

    let (status, body) = send(
        &app,
        login_request("/api/auth/login", "a@example.edu", &padding),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new();
    let account = app.seed(STUDENT_EMAIL, STUDENT_PASSWORD, Role::Student).await;

    let mut request = login_request("/api/auth/login", "  Student@Example.EDU ", STUDENT_PASSWORD);
    request
        .headers_mut()
        .insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["id"], account.id.to_string());
    assert!(body["data"]["token"].is_string());

    let token = body["data"]["token"].as_str().unwrap();
    assert_eq!(app.state.auth.tokens().verify(token).unwrap(), account.id);

    let stored = app.stored(&account).await;
    assert!(stored.last_login.is_some());
    assert_eq!(stored.last_login_ip.as_deref(), Some("203.0.113.7"));
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
    let app = TestApp::new();
    app.seed(STUDENT_EMAIL, STUDENT_PASSWORD, Role::Student).await;

    let (unknown_status, mut unknown) = send(
        &app.router,
        login_request("/api/auth/login", "ghost@example.edu", STUDENT_PASSWORD),
    )
    .await;
    let (wrong_status, mut wrong) = send(
        &app.router,
        login_request("/api/auth/login", STUDENT_EMAIL, "not-the-password"),
    )
    .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, unknown_status);
    assert_eq!(wrong["data"]["attemptsRemaining"], 4);

    // identical apart from the attempts-remaining count
    unknown.as_object_mut().unwrap().remove("data");
    wrong.as_object_mut().unwrap().remove("data");
    assert_eq!(unknown, wrong);
    assert_eq!(unknown["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_five_failures_lock_and_sixth_skips_hasher() {
    let app = TestApp::new();
    let account = app.seed(STUDENT_EMAIL, STUDENT_PASSWORD, Role::Student).await;

    for expected_remaining in [4, 3, 2, 1, 0] {
        let (status, body) = send(
            &app.router,
            login_request("/api/auth/login", STUDENT_EMAIL, "wrong-password"),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["data"]["attemptsRemaining"], expected_remaining);
    }

    let stored = app.stored(&account).await;
    assert_eq!(stored.failed_login_attempts, 5);
    assert!(stored.is_locked_at(Utc::now()));

    let verifications = app.state.auth.hasher().verification_count();
    let (status, body) = send(
        &app.router,
        login_request("/api/auth/login", STUDENT_EMAIL, STUDENT_PASSWORD),
    )
    .await;

    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["code"], "ACCOUNT_LOCKED");
    assert_eq!(body["data"]["lockTimeRemaining"], 15);
    assert_eq!(app.state.auth.hasher().verification_count(), verifications);
}

#[tokio::test]
async fn test_success_resets_failure_counter() {
    let app = TestApp::new();
    let account = app
        .seed_with(STUDENT_EMAIL, STUDENT_PASSWORD, Role::Student, |a| {
            a.failed_login_attempts = 3
        })
        .await;

    let (status, _) = send(
        &app.router,
        login_request("/api/auth/login", STUDENT_EMAIL, STUDENT_PASSWORD),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let stored = app.stored(&account).await;
    assert_eq!(stored.failed_login_attempts, 0);
    assert!(stored.lock_until.is_none());
}

#[tokio::test]
async fn test_expired_lock_allows_login_and_clears_state() {
    let app = TestApp::new();
    let account = app
        .seed_with(STUDENT_EMAIL, STUDENT_PASSWORD, Role::Student, |a| {
            a.failed_login_attempts = 5;
            a.lock_until = Some(Utc::now() - Duration::minutes(1));
        })
        .await;

    let (status, body) = send(
        &app.router,
        login_request("/api/auth/login", STUDENT_EMAIL, STUDENT_PASSWORD),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let stored = app.stored(&account).await;
    assert_eq!(stored.failed_login_attempts, 0);
    assert!(stored.lock_until.is_none());
}

#[tokio::test]
async fn test_failure_after_expired_lock_starts_fresh_cycle() {
    let app = TestApp::new();
    let account = app
        .seed_with(STUDENT_EMAIL, STUDENT_PASSWORD, Role::Student, |a| {
            a.failed_login_attempts = 5;
            a.lock_until = Some(Utc::now() - Duration::minutes(1));
        })
        .await;

    let (status, body) = send(
        &app.router,
        login_request("/api/auth/login", STUDENT_EMAIL, "wrong-password"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"]["attemptsRemaining"], 4);

    let stored = app.stored(&account).await;
    assert_eq!(stored.failed_login_attempts, 1);
    assert!(stored.lock_until.is_none());
}

#[tokio::test]
async fn test_concurrent_failure_storm_locks_account() {
    let app = TestApp::new();
    let account = app.seed(STUDENT_EMAIL, STUDENT_PASSWORD, Role::Student).await;

    let requests = (0..10).map(|_| {
        let router = app.router.clone();
        async move {
            let response = router
                .oneshot(login_request(
                    "/api/auth/login",
                    STUDENT_EMAIL,
                    "wrong-password",
                ))
                .await
                .unwrap();
            response.status()
        }
    });
    let statuses = futures::future::join_all(requests).await;

    assert!(statuses
        .iter()
        .all(|s| *s == StatusCode::UNAUTHORIZED || *s == StatusCode::LOCKED));
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == StatusCode::UNAUTHORIZED)
            .count(),
        5
    );

    let stored = app.stored(&account).await;
    assert_eq!(stored.failed_login_attempts, 5);
    assert!(stored.is_locked_at(Utc::now()));
}

// =============================================================================
// Admin Login Tests
// =============================================================================

#[tokio::test]
async fn test_admin_login_returns_security_details() {
    let app = TestApp::new();
    app.seed_with(ADMIN_EMAIL, ADMIN_PASSWORD, Role::Admin, |a| {
        a.must_change_password = true
    })
    .await;

    let mut request = login_request("/api/auth/admin-login", ADMIN_EMAIL, ADMIN_PASSWORD);
    request
        .headers_mut()
        .insert("x-real-ip", "198.51.100.20".parse().unwrap());
    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["role"], "admin");
    assert_eq!(body["data"]["security"]["loginIp"], "198.51.100.20");
    assert_eq!(body["data"]["security"]["requiresPasswordChange"], true);

    let expiry: chrono::DateTime<Utc> =
        serde_json::from_value(body["data"]["security"]["sessionExpiry"].clone()).unwrap();
    assert!(expiry > Utc::now() + Duration::days(29));
}

#[tokio::test]
async fn test_student_on_admin_login_is_forbidden_and_counter_untouched() {
    let app = TestApp::new();
    let account = app.seed(STUDENT_EMAIL, STUDENT_PASSWORD, Role::Student).await;

    let (status, body) = send(
        &app.router,
        login_request("/api/auth/admin-login", STUDENT_EMAIL, STUDENT_PASSWORD),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "INSUFFICIENT_PRIVILEGES");

    let stored = app.stored(&account).await;
    assert_eq!(stored.failed_login_attempts, 0);
    assert!(stored.last_login.is_none());
}

#[tokio::test]
async fn test_admin_login_unknown_email() {
    let app = create_router_for_testing();
    let (status, body) = send(
        &app,
        login_request("/api/auth/admin-login", "nobody@example.edu", "whatever-pass"),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
}

// =============================================================================
// Access Control Tests
// =============================================================================

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = create_router_for_testing();
    let (status, body) = send(&app, create_json_request("GET", "/api/auth/me", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "NO_TOKEN");
}

#[tokio::test]
async fn test_protected_route_with_bad_tokens() {
    let app = create_router_for_testing();

    let (status, body) = send(
        &app,
        authed_request("GET", "/api/auth/me", "not.a.token", None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");

    let mut basic = create_json_request("GET", "/api/auth/me", None);
    basic
        .headers_mut()
        .insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
    let (status, body) = send(&app, basic).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_token_for_locked_account_is_refused() {
    let app = TestApp::new();
    let account = app
        .seed_with(STUDENT_EMAIL, STUDENT_PASSWORD, Role::Student, |a| {
            a.failed_login_attempts = 5;
            a.lock_until = Some(Utc::now() + Duration::minutes(9));
        })
        .await;
    let token = app.state.auth.tokens().issue(account.id).unwrap().token;

    let (status, body) = send(
        &app.router,
        authed_request("GET", "/api/auth/me", &token, None),
    )
    .await;

    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["code"], "ACCOUNT_LOCKED");
    assert_eq!(body["data"]["lockTimeRemaining"], 9);
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = TestApp::new();
    let student = app.seed(STUDENT_EMAIL, STUDENT_PASSWORD, Role::Student).await;
    let other = app
        .seed("other@example.edu", "other-password", Role::Student)
        .await;
    app.seed(ADMIN_EMAIL, ADMIN_PASSWORD, Role::Admin).await;

    let student_token = app.token_for(STUDENT_EMAIL, STUDENT_PASSWORD).await;
    let admin_token = app.token_for(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, body) = send(
        &app.router,
        authed_request("GET", "/api/users", &student_token, None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "INSUFFICIENT_PRIVILEGES");

    let (status, body) = send(
        &app.router,
        authed_request("GET", "/api/users?role=student", &admin_token, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["users"].as_array().unwrap().len(), 2);

    // self lookup is allowed, other accounts are not
    let (status, _) = send(
        &app.router,
        authed_request(
            "GET",
            &format!("/api/users/{}", student.id),
            &student_token,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app.router,
        authed_request(
            "GET",
            &format!("/api/users/{}", other.id),
            &student_token,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app.router,
        authed_request("GET", "/api/users/not-a-uuid", &admin_token, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_admin_can_unlock_account() {
    let app = TestApp::new();
    let locked = app
        .seed_with(STUDENT_EMAIL, STUDENT_PASSWORD, Role::Student, |a| {
            a.failed_login_attempts = 5;
            a.lock_until = Some(Utc::now() + Duration::minutes(15));
        })
        .await;
    app.seed(ADMIN_EMAIL, ADMIN_PASSWORD, Role::Admin).await;
    let admin_token = app.token_for(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, _) = send(
        &app.router,
        authed_request(
            "POST",
            &format!("/api/users/{}/unlock", locked.id),
            &admin_token,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    app.token_for(STUDENT_EMAIL, STUDENT_PASSWORD).await;
}

// =============================================================================
// Account Self-Service Tests
// =============================================================================

#[tokio::test]
async fn test_change_password_flow() {
    let app = TestApp::new();
    app.seed(STUDENT_EMAIL, STUDENT_PASSWORD, Role::Student).await;
    let token = app.token_for(STUDENT_EMAIL, STUDENT_PASSWORD).await;

    let (status, body) = send(
        &app.router,
        authed_request(
            "PUT",
            "/api/auth/change-password",
            &token,
            Some(json!({ "currentPassword": "wrong", "newPassword": "brand-new-password" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app.router,
        authed_request(
            "PUT",
            "/api/auth/change-password",
            &token,
            Some(json!({
                "currentPassword": STUDENT_PASSWORD,
                "newPassword": "brand-new-password"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app.router,
        login_request("/api/auth/login", STUDENT_EMAIL, STUDENT_PASSWORD),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    app.token_for(STUDENT_EMAIL, "brand-new-password").await;
}

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::new();
    app.seed(STUDENT_EMAIL, STUDENT_PASSWORD, Role::Student).await;
    let token = app.token_for(STUDENT_EMAIL, STUDENT_PASSWORD).await;

    let (status, body) = send(
        &app.router,
        authed_request(
            "PUT",
            "/api/auth/profile",
            &token,
            Some(json!({ "firstName": "  Renamed " })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["firstName"], "Renamed");
    assert_eq!(body["data"]["user"]["lastName"], "User");
}

#[tokio::test]
async fn test_logout_acknowledges() {
    let app = TestApp::new();
    app.seed(STUDENT_EMAIL, STUDENT_PASSWORD, Role::Student).await;
    let token = app.token_for(STUDENT_EMAIL, STUDENT_PASSWORD).await;

    let (status, body) = send(
        &app.router,
        authed_request("POST", "/api/auth/logout", &token, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = send(&app.router, create_json_request("POST", "/api/auth/logout", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
