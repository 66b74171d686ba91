mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{set_cookie, TestServer};

#[tokio::test]
async fn health_endpoint_is_public() -> Result<()> {
    let server = TestServer::spawn().await?;
    let res = server.anonymous().get("/health").await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_anonymous_requests() -> Result<()> {
    let server = TestServer::spawn().await?;
    let anonymous = server.anonymous();

    for path in ["/auth/me", "/businesses", "/people", "/tags", "/categories", "/tasks"] {
        let res = anonymous.get(path).await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "GET {}", path);
        let body: Value = res.json().await?;
        assert_eq!(body["message"], "Unauthorized", "GET {}", path);
    }

    let res = anonymous.post("/businesses", &json!({ "name": "Acme" })).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(server.db.businesses().list().await?.is_empty(), "rejected write left a row behind");
    Ok(())
}

#[tokio::test]
async fn register_sets_cookie_and_identifies_user() -> Result<()> {
    let server = TestServer::spawn().await?;
    let mut session = server.anonymous();

    let res = session.register("ada@example.com", "s3cret").await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let cookie = set_cookie(&res).expect("register should set a cookie");
    assert!(cookie.starts_with("auth-token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=604800"));

    let body: Value = res.json().await?;
    assert_eq!(body["email"], "ada@example.com");
    assert!(body.get("passwordHash").is_none() && body.get("password_hash").is_none());

    let me: Value = session.get("/auth/me").await?.json().await?;
    assert_eq!(me["id"], body["id"]);
    assert_eq!(me["email"], "ada@example.com");
    Ok(())
}

#[tokio::test]
async fn register_validates_and_rejects_duplicates() -> Result<()> {
    let server = TestServer::spawn().await?;
    let anonymous = server.anonymous();

    let res = anonymous
        .post("/auth/register", &json!({ "email": "ada@example.com" }))
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    server.signed_in_as("ada@example.com").await?;
    let mut again = server.anonymous();
    let res = again.register("ada@example.com", "other").await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert!(again.cookie.is_none());
    Ok(())
}

#[tokio::test]
async fn login_failures_are_indistinguishable() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.signed_in_as("ada@example.com").await?;

    let mut wrong_password = server.anonymous();
    let res = wrong_password.login("ada@example.com", "nope").await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let wrong_password_body: Value = res.json().await?;

    let mut unknown_email = server.anonymous();
    let res = unknown_email.login("nobody@example.com", "nope").await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let unknown_email_body: Value = res.json().await?;

    assert_eq!(wrong_password_body, unknown_email_body);
    assert_eq!(wrong_password_body["message"], "Invalid credentials");

    let res = server
        .anonymous()
        .post("/auth/login", &json!({ "email": "ada@example.com" }))
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_with_correct_password_opens_a_session() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.signed_in_as("ada@example.com").await?;

    let mut session = server.anonymous();
    let res = session
        .login("ada@example.com", "correct horse battery staple")
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(session.cookie.is_some());

    let res = session.get("/businesses").await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn forged_cookie_is_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;
    let mut session = server.anonymous();
    session.cookie = Some("auth-token=not.a.token".to_string());

    let res = session.get("/auth/me").await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn token_of_deleted_user_is_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = server.signed_in_as("ada@example.com").await?;
    assert_eq!(session.get("/auth/me").await?.status(), StatusCode::OK);

    let user = server
        .db
        .users()
        .find_by_email("ada@example.com")
        .await?
        .expect("user exists");
    server.db.users().delete(&user.id).await?;

    let res = session.get("/auth/me").await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn logout_clears_the_cookie() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = server.signed_in().await?;

    let res = session.post("/auth/logout", &json!({})).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = set_cookie(&res).expect("logout should reset the cookie");
    assert!(cookie.starts_with("auth-token=;"));
    assert!(cookie.contains("Max-Age=0"));
    Ok(())
}
