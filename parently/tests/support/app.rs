//! テスト用アプリケーションビルダー
//!
//! `sqlite::memory:`プールとモックAIエンドポイントでAppStateを
//! 組み立て、`.oneshot()`スタイルのテストに使うRouterを返す。

use axum::Router;
use parently::config::AiConfig;
use parently::crypto::FieldCipher;
use parently::{ai, api, cache, db, ratelimit, AppState};
use sqlx::SqlitePool;
use std::time::Duration;

/// テストアプリ一式
pub struct TestContext {
    /// `.oneshot()`対象のルーター
    pub app: Router,
    /// テストDBプール（直接のデータ準備用）
    pub db_pool: SqlitePool,
    /// AppStateと同じ鍵のフィールド暗号
    pub cipher: FieldCipher,
}

/// AIエンドポイントなしのテストアプリを作成
///
/// AI呼び出しは即座に失敗し、各操作の静的フォールバックが返る。
#[allow(dead_code)]
pub async fn create_test_app() -> TestContext {
    // 到達不能なポートを指す（AI呼び出しはフォールバック経路になる）
    create_test_app_with_ai("http://127.0.0.1:9").await
}

/// モックAIエンドポイントを指すテストアプリを作成
pub async fn create_test_app_with_ai(ai_base_url: &str) -> TestContext {
    let db_pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");
    db::migrations::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");

    let cipher = FieldCipher::new("contract-test-encryption-key");

    let ai_client = ai::client::AiClient::new(&AiConfig {
        api_key: "test-key".to_string(),
        base_url: ai_base_url.to_string(),
        timeout: Duration::from_secs(2),
        max_retries: 1,
    })
    .expect("Failed to build AI client");

    let state = AppState {
        db_pool: db_pool.clone(),
        jwt_secret: "contract_test_jwt_secret_12345678".to_string(),
        cipher: cipher.clone(),
        cache: cache::TtlCache::new(),
        rate_limiter: ratelimit::RateLimiter::new(),
        ai: ai_client,
        environment: "test".to_string(),
    };

    TestContext {
        app: api::create_app(state),
        db_pool,
        cipher,
    }
}
