//! Parently Backend Server
//!
//! 育児・家計アシスタントのバックエンドAPI（認証、チェックイン、
//! AIチャットプロキシ、子どもタスク管理、AIプラン/インサイト生成）

#![warn(missing_docs)]

/// 共通型定義（エラー、認証クレーム）
pub mod common;

/// REST APIハンドラー
pub mod api;

/// 認証・認可機能
pub mod auth;

/// データベースアクセス
pub mod db;

/// AIクライアント（Anthropic Messages APIプロキシ）
pub mod ai;

/// TTL付きキーバリューキャッシュ
pub mod cache;

/// 固定ウィンドウレートリミッター
pub mod ratelimit;

/// フィールド暗号化（AES-256-GCM）
pub mod crypto;

/// リクエストボディ検証ヘルパー
pub mod validation;

/// 設定管理（環境変数ヘルパー）
pub mod config;

/// ロギング初期化ユーティリティ
pub mod logging;

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// データベース接続プール
    pub db_pool: sqlx::SqlitePool,
    /// JWT秘密鍵
    pub jwt_secret: String,
    /// 自由記述カラム用のフィールド暗号
    pub cipher: crypto::FieldCipher,
    /// TTLキャッシュ（プラン、AI応答、インサイト、レート制限ウィンドウ）
    pub cache: cache::TtlCache,
    /// レートリミッター
    pub rate_limiter: ratelimit::RateLimiter,
    /// AIクライアント
    pub ai: ai::client::AiClient,
    /// デプロイ環境名（ヘルスチェックで返す）
    pub environment: String,
}
