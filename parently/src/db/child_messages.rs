// 子どものAIチャット履歴CRUD操作

use crate::common::error::ApiError;
use crate::crypto::FieldCipher;
use crate::db::users::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

/// 子どものチャットメッセージ（復号済み）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildMessage {
    /// メッセージID
    pub id: Uuid,
    /// 子どもユーザーID
    pub user_id: Uuid,
    /// 子どもの発話（平文）
    pub message: String,
    /// AIの応答（平文）
    pub ai_response: String,
    /// 作成日時
    pub created_at: DateTime<Utc>,
}

/// チャットメッセージを保存
pub async fn create(
    pool: &SqlitePool,
    cipher: &FieldCipher,
    user_id: Uuid,
    message: &str,
    ai_response: &str,
) -> Result<ChildMessage, ApiError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO child_messages (id, user_id, message_encrypted, ai_response_encrypted, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(cipher.encrypt(message)?)
    .bind(cipher.encrypt(ai_response)?)
    .bind(now.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to save child message: {}", e)))?;

    Ok(ChildMessage {
        id,
        user_id,
        message: message.to_string(),
        ai_response: ai_response.to_string(),
        created_at: now,
    })
}

/// 直近のチャット履歴を新しい順に取得
pub async fn list_recent(
    pool: &SqlitePool,
    cipher: &FieldCipher,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<ChildMessage>, ApiError> {
    let rows = sqlx::query_as::<_, ChildMessageRow>(
        "SELECT id, user_id, message_encrypted, ai_response_encrypted, created_at
         FROM child_messages WHERE user_id = ? ORDER BY created_at DESC LIMIT ?",
    )
    .bind(user_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to list child messages: {}", e)))?;

    rows.into_iter().map(|r| r.into_message(cipher)).collect()
}

/// 子どものメッセージ総数を取得
pub async fn count(pool: &SqlitePool, user_id: Uuid) -> Result<i64, ApiError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM child_messages WHERE user_id = ?")
        .bind(user_id.to_string())
        .fetch_one(pool)
        .await
        .map_err(|e| ApiError::Database(format!("Failed to count child messages: {}", e)))
}

// SQLiteからの行取得用の内部型
#[derive(sqlx::FromRow)]
struct ChildMessageRow {
    id: String,
    user_id: String,
    message_encrypted: String,
    ai_response_encrypted: String,
    created_at: String,
}

impl ChildMessageRow {
    fn into_message(self, cipher: &FieldCipher) -> Result<ChildMessage, ApiError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| ApiError::Database(format!("Invalid message id: {}", e)))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| ApiError::Database(format!("Invalid user id: {}", e)))?;

        Ok(ChildMessage {
            id,
            user_id,
            message: cipher.decrypt(&self.message_encrypted)?,
            ai_response: cipher.decrypt(&self.ai_response_encrypted)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}
