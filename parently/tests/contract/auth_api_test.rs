//! 認証API Contract Tests
//!
//! POST /api/v1/auth/{register,login,refresh,logout}, GET /api/v1/auth/me

use crate::support::app::create_test_app;
use crate::support::http::{get, post_json, register_parent};
use axum::http::StatusCode;
use serde_json::json;

// ---------------------------------------------------------------------------
// POST /api/v1/auth/register
// ---------------------------------------------------------------------------

/// 親アカウントの登録成功（201、ユーザーとトークンペア）
#[tokio::test]
async fn test_register_parent_success() {
    let ctx = create_test_app().await;

    let (status, body) = post_json(
        &ctx.app,
        "/api/v1/auth/register",
        None,
        &json!({
            "email": "parent@example.com",
            "password": "password123",
            "name": "Alex",
            "userType": "parent",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["email"], "parent@example.com");
    assert_eq!(body["data"]["user"]["userType"], "parent");
    assert!(body["data"]["tokens"]["accessToken"].is_string());
    assert!(body["data"]["tokens"]["refreshToken"].is_string());
    assert_eq!(body["data"]["tokens"]["expiresIn"], 900);
    // パスワードハッシュは決して返さない
    assert!(!body.to_string().contains("passwordHash"));
}

/// メールアドレス重複は409
#[tokio::test]
async fn test_register_duplicate_email_conflict() {
    let ctx = create_test_app().await;
    register_parent(&ctx.app, "dup@example.com").await;

    let (status, body) = post_json(
        &ctx.app,
        "/api/v1/auth/register",
        None,
        &json!({
            "email": "dup@example.com",
            "password": "password123",
            "name": "Again",
            "userType": "parent",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

/// 不正なメールアドレスは400
#[tokio::test]
async fn test_register_invalid_email_rejected() {
    let ctx = create_test_app().await;

    let (status, _body) = post_json(
        &ctx.app,
        "/api/v1/auth/register",
        None,
        &json!({
            "email": "not-an-email",
            "password": "password123",
            "name": "X",
            "userType": "parent",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// 短すぎるパスワードは400
#[tokio::test]
async fn test_register_short_password_rejected() {
    let ctx = create_test_app().await;

    let (status, _body) = post_json(
        &ctx.app,
        "/api/v1/auth/register",
        None,
        &json!({
            "email": "p2@example.com",
            "password": "short",
            "name": "X",
            "userType": "parent",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// 子どもアカウントのparentIdは実在する親でなければ400
#[tokio::test]
async fn test_register_child_with_unknown_parent_rejected() {
    let ctx = create_test_app().await;

    let (status, _body) = post_json(
        &ctx.app,
        "/api/v1/auth/register",
        None,
        &json!({
            "email": "kid@example.com",
            "password": "password123",
            "name": "Kid",
            "userType": "child",
            "parentId": "00000000-0000-0000-0000-000000000000",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// 実在する親の下に子どもを登録できる
#[tokio::test]
async fn test_register_child_under_parent() {
    let ctx = create_test_app().await;
    let (_token, parent_id) = register_parent(&ctx.app, "p@example.com").await;

    let (status, body) = post_json(
        &ctx.app,
        "/api/v1/auth/register",
        None,
        &json!({
            "email": "kid@example.com",
            "password": "password123",
            "name": "Kid",
            "userType": "child",
            "parentId": parent_id,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["user"]["parentId"], parent_id);
}

// ---------------------------------------------------------------------------
// POST /api/v1/auth/login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_login_success() {
    let ctx = create_test_app().await;
    register_parent(&ctx.app, "login@example.com").await;

    let (status, body) = post_json(
        &ctx.app,
        "/api/v1/auth/login",
        None,
        &json!({"email": "login@example.com", "password": "password123"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"]["tokens"]["accessToken"].is_string());
    assert_eq!(body["data"]["user"]["email"], "login@example.com");
}

/// 誤ったパスワードは401
#[tokio::test]
async fn test_login_wrong_password() {
    let ctx = create_test_app().await;
    register_parent(&ctx.app, "login2@example.com").await;

    let (status, body) = post_json(
        &ctx.app,
        "/api/v1/auth/login",
        None,
        &json!({"email": "login2@example.com", "password": "wrong-password"}),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

/// 未登録メールアドレスもパスワード誤りと同じ401
#[tokio::test]
async fn test_login_unknown_email_same_error() {
    let ctx = create_test_app().await;

    let (status, body) = post_json(
        &ctx.app,
        "/api/v1/auth/login",
        None,
        &json!({"email": "ghost@example.com", "password": "password123"}),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication error: Invalid email or password");
}

// ---------------------------------------------------------------------------
// POST /api/v1/auth/refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_refresh_returns_new_access_token() {
    let ctx = create_test_app().await;

    let (_, body) = post_json(
        &ctx.app,
        "/api/v1/auth/register",
        None,
        &json!({
            "email": "r@example.com",
            "password": "password123",
            "name": "R",
            "userType": "parent",
        }),
    )
    .await;
    let refresh_token = body["data"]["tokens"]["refreshToken"].as_str().unwrap();

    let (status, body) = post_json(
        &ctx.app,
        "/api/v1/auth/refresh",
        None,
        &json!({"refreshToken": refresh_token}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["accessToken"].is_string());
    assert_eq!(body["data"]["expiresIn"], 900);
}

/// refreshTokenフィールド欠落は400
#[tokio::test]
async fn test_refresh_missing_token_field() {
    let ctx = create_test_app().await;

    let (status, _body) = post_json(&ctx.app, "/api/v1/auth/refresh", None, &json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// 不正なリフレッシュトークンは401
#[tokio::test]
async fn test_refresh_invalid_token() {
    let ctx = create_test_app().await;

    let (status, _body) = post_json(
        &ctx.app,
        "/api/v1/auth/refresh",
        None,
        &json!({"refreshToken": "not.a.token"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

/// アクセストークンはリフレッシュトークンとして使えない
#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let ctx = create_test_app().await;
    let (access_token, _) = register_parent(&ctx.app, "swap@example.com").await;

    let (status, _body) = post_json(
        &ctx.app,
        "/api/v1/auth/refresh",
        None,
        &json!({"refreshToken": access_token}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// GET /api/v1/auth/me, POST /api/v1/auth/logout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_me_returns_current_user() {
    let ctx = create_test_app().await;
    let (token, user_id) = register_parent(&ctx.app, "me@example.com").await;

    let (status, body) = get(&ctx.app, "/api/v1/auth/me", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["id"], user_id);
    assert_eq!(body["data"]["user"]["email"], "me@example.com");
}

/// トークンなしの保護ルートは401
#[tokio::test]
async fn test_me_requires_token() {
    let ctx = create_test_app().await;
    let (status, _body) = get(&ctx.app, "/api/v1/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

/// 改ざんトークンは401
#[tokio::test]
async fn test_me_rejects_garbage_token() {
    let ctx = create_test_app().await;
    let (status, _body) = get(&ctx.app, "/api/v1/auth/me", Some("bogus.token.here")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_succeeds() {
    let ctx = create_test_app().await;
    let (token, _) = register_parent(&ctx.app, "bye@example.com").await;

    let (status, body) = post_json(&ctx.app, "/api/v1/auth/logout", Some(&token), &json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Logged out successfully");
}
