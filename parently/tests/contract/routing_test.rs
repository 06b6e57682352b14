//! ルーティング・共通レスポンス Contract Tests
//!
//! GET /health, GET /api/v1, 404フォールバック

use crate::support::app::create_test_app;
use crate::support::http::get;
use axum::http::StatusCode;

#[tokio::test]
async fn test_health_is_public() {
    let ctx = create_test_app().await;

    let (status, body) = get(&ctx.app, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["environment"], "test");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_api_index_lists_endpoints() {
    let ctx = create_test_app().await;

    let (status, body) = get(&ctx.app, "/api/v1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Parently API");
    assert_eq!(body["endpoints"]["parent"], "/api/v1/parent");
}

/// 未知のパスは404とエンドポイント一覧を返す
#[tokio::test]
async fn test_unknown_path_returns_json_404() {
    let ctx = create_test_app().await;

    let (status, body) = get(&ctx.app, "/api/v2/nothing", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["endpoints"]["auth"], "/api/v1/auth");
}
