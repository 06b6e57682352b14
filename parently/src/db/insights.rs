// 子どもインサイトCRUD操作
//
// AIが生成したインサイトの永続化。読み取りは主にキャッシュ経由だが、
// 履歴としてDBにも残す。

use crate::common::error::ApiError;
use crate::db::users::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

/// 子どもインサイト
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildInsight {
    /// インサイトID
    pub id: Uuid,
    /// 親ユーザーID
    pub parent_id: Uuid,
    /// 子どもユーザーID
    pub child_id: Uuid,
    /// インサイト本文（AI生成サマリー）
    pub insight_content: String,
    /// 推奨アクション（"; "区切り）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
    /// 対象日（YYYY-MM-DD）
    pub insight_date: String,
    /// 作成日時
    pub created_at: DateTime<Utc>,
}

/// インサイトを保存
pub async fn create(
    pool: &SqlitePool,
    parent_id: Uuid,
    child_id: Uuid,
    insight_content: &str,
    recommendations: Option<&str>,
    insight_date: &str,
) -> Result<ChildInsight, ApiError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO child_insights (id, parent_id, child_id, insight_content, recommendations, insight_date, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(parent_id.to_string())
    .bind(child_id.to_string())
    .bind(insight_content)
    .bind(recommendations)
    .bind(insight_date)
    .bind(now.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to save insight: {}", e)))?;

    Ok(ChildInsight {
        id,
        parent_id,
        child_id,
        insight_content: insight_content.to_string(),
        recommendations: recommendations.map(|r| r.to_string()),
        insight_date: insight_date.to_string(),
        created_at: now,
    })
}

/// 指定した子どもの最新インサイトを取得
pub async fn latest_for_child(
    pool: &SqlitePool,
    parent_id: Uuid,
    child_id: Uuid,
) -> Result<Option<ChildInsight>, ApiError> {
    let row = sqlx::query_as::<_, InsightRow>(
        "SELECT id, parent_id, child_id, insight_content, recommendations, insight_date, created_at
         FROM child_insights WHERE parent_id = ? AND child_id = ?
         ORDER BY created_at DESC LIMIT 1",
    )
    .bind(parent_id.to_string())
    .bind(child_id.to_string())
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to find insight: {}", e)))?;

    row.map(|r| r.into_insight()).transpose()
}

// SQLiteからの行取得用の内部型
#[derive(sqlx::FromRow)]
struct InsightRow {
    id: String,
    parent_id: String,
    child_id: String,
    insight_content: String,
    recommendations: Option<String>,
    insight_date: String,
    created_at: String,
}

impl InsightRow {
    fn into_insight(self) -> Result<ChildInsight, ApiError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| ApiError::Database(format!("Invalid insight id: {}", e)))?;
        let parent_id = Uuid::parse_str(&self.parent_id)
            .map_err(|e| ApiError::Database(format!("Invalid parent id: {}", e)))?;
        let child_id = Uuid::parse_str(&self.child_id)
            .map_err(|e| ApiError::Database(format!("Invalid child id: {}", e)))?;
        Ok(ChildInsight {
            id,
            parent_id,
            child_id,
            insight_content: self.insight_content,
            recommendations: self.recommendations,
            insight_date: self.insight_date,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}
