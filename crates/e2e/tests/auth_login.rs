//! POST /api/auth/login against the in-process app

use serde_json::json;
use shopfront_e2e::seed::{seed_admin, UserOverrides, DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD};
use shopfront_e2e::TestContext;

#[tokio::test]
async fn logs_in_with_valid_credentials() {
    let ctx = TestContext::start().expect("fixture");
    seed_admin(&ctx, UserOverrides::default()).expect("seed admin");

    let (status, body) = ctx
        .post_json(
            "/api/auth/login",
            &json!({ "email": DEFAULT_ADMIN_EMAIL, "password": DEFAULT_ADMIN_PASSWORD }),
        )
        .await
        .expect("login request");

    assert_eq!(status, 200);
    assert_eq!(body["success"], json!(true));
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["email"], json!(DEFAULT_ADMIN_EMAIL));
    // The stored hash must never appear on the wire
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password_hash").is_none());

    ctx.cleanup().log();
    ctx.teardown();
}

#[tokio::test]
async fn rejects_invalid_password() {
    let ctx = TestContext::start().expect("fixture");
    seed_admin(&ctx, UserOverrides::default()).expect("seed admin");

    let (status, body) = ctx
        .post_json(
            "/api/auth/login",
            &json!({ "email": DEFAULT_ADMIN_EMAIL, "password": "wrong" }),
        )
        .await
        .expect("login request");

    assert_eq!(status, 400);
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));

    ctx.cleanup().log();
    ctx.teardown();
}

#[tokio::test]
async fn rejects_unknown_email_and_missing_fields() {
    let ctx = TestContext::start().expect("fixture");

    let (status, body) = ctx
        .post_json(
            "/api/auth/login",
            &json!({ "email": "nobody@example.com", "password": "whatever" }),
        )
        .await
        .expect("login request");
    assert_eq!(status, 400);
    assert!(body["error"].is_string());

    let (status, body) = ctx
        .post_json("/api/auth/login", &json!({ "password": "whatever" }))
        .await
        .expect("login request");
    assert_eq!(status, 400);
    assert!(body["error"].is_string());

    let (status, body) = ctx
        .post_json("/api/auth/login", &json!({ "email": DEFAULT_ADMIN_EMAIL }))
        .await
        .expect("login request");
    assert_eq!(status, 400);
    assert!(body["error"].is_string());

    ctx.cleanup().log();
    ctx.teardown();
}

#[tokio::test]
async fn seeded_credentials_can_be_overridden() {
    let ctx = TestContext::start().expect("fixture");
    seed_admin(
        &ctx,
        UserOverrides {
            email: Some("ops@example.com".into()),
            password: Some("another-secret".into()),
            ..Default::default()
        },
    )
    .expect("seed admin");

    let (status, body) = ctx
        .post_json(
            "/api/auth/login",
            &json!({ "email": "ops@example.com", "password": "another-secret" }),
        )
        .await
        .expect("login request");

    assert_eq!(status, 200);
    assert_eq!(body["success"], json!(true));

    ctx.cleanup().log();
    ctx.teardown();
}
