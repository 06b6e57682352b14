// 共通モジュール

/// エラー型定義
pub mod error;

/// 認証関連のデータモデル（ロール、クレーム、トークンペア）
pub mod auth;
