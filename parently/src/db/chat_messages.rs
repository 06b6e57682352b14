// 親のAIチャット履歴CRUD操作
//
// メッセージと応答は保存時にフィールド暗号で暗号化される。

use crate::common::error::ApiError;
use crate::crypto::FieldCipher;
use crate::db::users::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

/// 親のチャットメッセージ（復号済み）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// メッセージID
    pub id: Uuid,
    /// ユーザーID
    pub user_id: Uuid,
    /// ユーザーの発話（平文）
    pub message: String,
    /// AIの応答（平文）
    pub response: String,
    /// 複雑度スコア（1-5）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity_score: Option<i64>,
    /// 使用モデル（haiku/sonnet）
    pub ai_model: String,
    /// 作成日時
    pub created_at: DateTime<Utc>,
}

/// チャットメッセージを保存
pub async fn create(
    pool: &SqlitePool,
    cipher: &FieldCipher,
    user_id: Uuid,
    message: &str,
    response: &str,
    complexity_score: Option<i64>,
    ai_model: &str,
) -> Result<ChatMessage, ApiError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO chat_messages (id, user_id, message_encrypted, response_encrypted, complexity_score, ai_model, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(cipher.encrypt(message)?)
    .bind(cipher.encrypt(response)?)
    .bind(complexity_score)
    .bind(ai_model)
    .bind(now.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to save chat message: {}", e)))?;

    Ok(ChatMessage {
        id,
        user_id,
        message: message.to_string(),
        response: response.to_string(),
        complexity_score,
        ai_model: ai_model.to_string(),
        created_at: now,
    })
}

/// 直近のチャット履歴を新しい順に取得
pub async fn list_recent(
    pool: &SqlitePool,
    cipher: &FieldCipher,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<ChatMessage>, ApiError> {
    let rows = sqlx::query_as::<_, ChatMessageRow>(
        "SELECT id, user_id, message_encrypted, response_encrypted, complexity_score, ai_model, created_at
         FROM chat_messages WHERE user_id = ? ORDER BY created_at DESC LIMIT ?",
    )
    .bind(user_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to list chat messages: {}", e)))?;

    rows.into_iter().map(|r| r.into_message(cipher)).collect()
}

// SQLiteからの行取得用の内部型
#[derive(sqlx::FromRow)]
struct ChatMessageRow {
    id: String,
    user_id: String,
    message_encrypted: String,
    response_encrypted: String,
    complexity_score: Option<i64>,
    ai_model: String,
    created_at: String,
}

impl ChatMessageRow {
    fn into_message(self, cipher: &FieldCipher) -> Result<ChatMessage, ApiError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| ApiError::Database(format!("Invalid message id: {}", e)))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| ApiError::Database(format!("Invalid user id: {}", e)))?;

        Ok(ChatMessage {
            id,
            user_id,
            message: cipher.decrypt(&self.message_encrypted)?,
            response: cipher.decrypt(&self.response_encrypted)?,
            complexity_score: self.complexity_score,
            ai_model: self.ai_model,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}
