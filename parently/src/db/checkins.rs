// 親のチェックインCRUD操作
//
// notesカラムは保存時にフィールド暗号で暗号化される。

use crate::common::error::ApiError;
use crate::crypto::FieldCipher;
use crate::db::users::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

/// チェックイン種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckinType {
    /// 朝のチェックイン
    Morning,
    /// 夜のチェックイン
    Evening,
}

impl CheckinType {
    /// DB格納用の文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckinType::Morning => "morning",
            CheckinType::Evening => "evening",
        }
    }

    /// DB文字列からのパース
    pub fn parse(s: &str) -> Option<CheckinType> {
        match s {
            "morning" => Some(CheckinType::Morning),
            "evening" => Some(CheckinType::Evening),
            _ => None,
        }
    }
}

/// 親のチェックイン（復号済み）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentCheckin {
    /// チェックインID
    pub id: Uuid,
    /// ユーザーID
    pub user_id: Uuid,
    /// チェックイン種別
    pub checkin_type: CheckinType,
    /// 感情状態（1-10）
    pub emotional_state: i64,
    /// 家計ストレス（1-10）
    pub financial_stress: i64,
    /// メモ（平文）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// 想定外の出費
    pub unexpected_expenses: f64,
    /// 作成日時
    pub created_at: DateTime<Utc>,
}

/// チェックインを作成
///
/// # Arguments
/// * `pool` - データベース接続プール
/// * `cipher` - フィールド暗号（notesの暗号化に使用）
/// * `user_id` - 親ユーザーID
/// * `checkin_type` - チェックイン種別
/// * `emotional_state` - 感情状態（1-10、検証済み）
/// * `financial_stress` - 家計ストレス（1-10、検証済み）
/// * `notes` - メモ（平文、省略可）
/// * `unexpected_expenses` - 想定外の出費
#[allow(clippy::too_many_arguments)]
pub async fn create(
    pool: &SqlitePool,
    cipher: &FieldCipher,
    user_id: Uuid,
    checkin_type: CheckinType,
    emotional_state: i64,
    financial_stress: i64,
    notes: Option<&str>,
    unexpected_expenses: f64,
) -> Result<ParentCheckin, ApiError> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let notes_encrypted = notes.map(|n| cipher.encrypt(n)).transpose()?;

    sqlx::query(
        "INSERT INTO parent_checkins (id, user_id, checkin_type, emotional_state, financial_stress, notes_encrypted, unexpected_expenses, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(checkin_type.as_str())
    .bind(emotional_state)
    .bind(financial_stress)
    .bind(notes_encrypted)
    .bind(unexpected_expenses)
    .bind(now.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to create checkin: {}", e)))?;

    Ok(ParentCheckin {
        id,
        user_id,
        checkin_type,
        emotional_state,
        financial_stress,
        notes: notes.map(|n| n.to_string()),
        unexpected_expenses,
        created_at: now,
    })
}

/// 直近のチェックインを新しい順に取得
pub async fn list_recent(
    pool: &SqlitePool,
    cipher: &FieldCipher,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<ParentCheckin>, ApiError> {
    let rows = sqlx::query_as::<_, CheckinRow>(
        "SELECT id, user_id, checkin_type, emotional_state, financial_stress, notes_encrypted, unexpected_expenses, created_at
         FROM parent_checkins WHERE user_id = ? ORDER BY created_at DESC LIMIT ?",
    )
    .bind(user_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to list checkins: {}", e)))?;

    rows.into_iter().map(|r| r.into_checkin(cipher)).collect()
}

// SQLiteからの行取得用の内部型
#[derive(sqlx::FromRow)]
struct CheckinRow {
    id: String,
    user_id: String,
    checkin_type: String,
    emotional_state: i64,
    financial_stress: i64,
    notes_encrypted: Option<String>,
    unexpected_expenses: f64,
    created_at: String,
}

impl CheckinRow {
    fn into_checkin(self, cipher: &FieldCipher) -> Result<ParentCheckin, ApiError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| ApiError::Database(format!("Invalid checkin id: {}", e)))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| ApiError::Database(format!("Invalid user id: {}", e)))?;
        let checkin_type = CheckinType::parse(&self.checkin_type).ok_or_else(|| {
            ApiError::Database(format!("Invalid checkin_type: {}", self.checkin_type))
        })?;
        let notes = self
            .notes_encrypted
            .as_deref()
            .map(|n| cipher.decrypt(n))
            .transpose()?;

        Ok(ParentCheckin {
            id,
            user_id,
            checkin_type,
            emotional_state: self.emotional_state,
            financial_stress: self.financial_stress,
            notes,
            unexpected_expenses: self.unexpected_expenses,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}
