//! データベースアクセス層
//!
//! SQLiteベースのデータ永続化

/// データベースマイグレーション
pub mod migrations;

/// ユーザー管理
pub mod users;

/// 親のチェックイン
pub mod checkins;

/// デイリープラン
pub mod plans;

/// 親のAIチャット履歴
pub mod chat_messages;

/// 子どものタスク
pub mod child_tasks;

/// 子どものAIチャット履歴
pub mod child_messages;

/// 家計ゴール
pub mod goals;

/// 子どもインサイト
pub mod insights;
