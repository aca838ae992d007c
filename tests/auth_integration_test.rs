//! Registration, login, profile and the bearer-token gate.

mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::{response_json, TestApp, TEST_PASSWORD};
use flyshop_api::entities::{user, UserRole};
use flyshop_api::errors::ServiceError;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn register_login_and_fetch_profile() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "email": "Angler@Example.com",
                "password": "mayfly-hatch-42",
                "first_name": "Norman",
                "last_name": "Maclean"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["user"]["email"], "angler@example.com");
    assert_eq!(body["data"]["user"]["role"], "CUSTOMER");
    assert!(body["data"]["user"].get("password_hash").is_none());

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": "angler@example.com", "password": "mayfly-hatch-42"})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["token_type"], "Bearer");

    let response = app
        .request(Method::GET, "/api/v1/auth/profile", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["first_name"], "Norman");
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = TestApp::new().await;
    let payload = json!({
        "email": "dup@example.com",
        "password": "streamer-strip-9",
        "first_name": "Lefty",
        "last_name": "Kreh"
    });

    let first = app
        .request(Method::POST, "/api/v1/auth/register", Some(payload.clone()), None)
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .request(Method::POST, "/api/v1/auth/register", Some(payload), None)
        .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn email_unique_index_violation_maps_to_conflict() {
    let app = TestApp::new().await;
    let (existing, _) = app.create_user(UserRole::Customer).await;

    let now = Utc::now();
    let err = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(existing.email.clone()),
        password_hash: Set(existing.password_hash.clone()),
        first_name: Set("Lefty".into()),
        last_name: Set("Kreh".into()),
        phone: Set(None),
        role: Set(UserRole::Customer),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(app.db())
    .await
    .map_err(|e| ServiceError::on_unique_violation(e, "User with this email already exists"))
    .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(err.status_code(), StatusCode::CONFLICT);
    assert_eq!(err.error_code(), "CONFLICT");
}

#[tokio::test]
async fn register_rejects_invalid_input() {
    let app = TestApp::new().await;
    for payload in [
        json!({"email": "not-an-email", "password": "long-enough-1", "first_name": "A", "last_name": "B"}),
        json!({"email": "short@example.com", "password": "short", "first_name": "A", "last_name": "B"}),
        json!({"email": "blank@example.com", "password": "long-enough-1", "first_name": "", "last_name": "B"}),
    ] {
        let response = app
            .request(Method::POST, "/api/v1/auth/register", Some(payload), None)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = TestApp::new().await;
    let (user, _) = app.create_user(UserRole::Customer).await;

    let wrong_password = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": user.email, "password": "definitely-wrong"})),
            None,
        )
        .await;
    let unknown_email = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": "nobody@example.com", "password": TEST_PASSWORD})),
            None,
        )
        .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response_json(wrong_password).await["message"],
        response_json(unknown_email).await["message"]
    );
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let app = TestApp::new().await;
    let (user, token) = app.create_user(UserRole::Customer).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/change-password",
            Some(json!({"current_password": "guess-work-123", "new_password": "new-leader-6x"})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/change-password",
            Some(json!({"current_password": TEST_PASSWORD, "new_password": "new-leader-6x"})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": user.email, "password": "new-leader-6x"})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_reject_missing_or_forged_tokens() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/auth/profile", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_MISSING_TOKEN");

    let response = app
        .request(
            Method::GET,
            "/api/v1/auth/profile",
            None,
            Some("eyJhbGciOiJIUzI1NiJ9.e30.forged"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_passes_every_permission_gate() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.create_user(UserRole::Admin).await;

    for uri in ["/api/v1/orders", "/api/v1/orders/my-orders"] {
        let response = app.request(Method::GET, uri, None, Some(&admin_token)).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }

    let response = app
        .request(
            Method::POST,
            "/api/v1/categories",
            Some(json!({"name": "Admin Picks"})),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn health_and_docs_are_public() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["database"], "healthy");

    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}
