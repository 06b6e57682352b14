// デイリープランCRUD操作
//
// (user_id, plan_date)ごとに1行。再生成時は新しい行で上書きする。

use crate::common::error::ApiError;
use crate::db::users::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

/// デイリープラン
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPlan {
    /// プランID
    pub id: Uuid,
    /// ユーザーID
    pub user_id: Uuid,
    /// プラン本体（AI生成JSON）
    pub plan_content: serde_json::Value,
    /// 対象日（YYYY-MM-DD）
    pub plan_date: String,
    /// 作成日時
    pub created_at: DateTime<Utc>,
}

/// プランを保存（同じ日のプランがあれば置き換え）
pub async fn upsert(
    pool: &SqlitePool,
    user_id: Uuid,
    plan_date: &str,
    plan_content: &serde_json::Value,
) -> Result<DailyPlan, ApiError> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let content_json = serde_json::to_string(plan_content)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize plan: {}", e)))?;

    sqlx::query(
        "INSERT OR REPLACE INTO daily_plans (id, user_id, plan_content, plan_date, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(&content_json)
    .bind(plan_date)
    .bind(now.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to save plan: {}", e)))?;

    Ok(DailyPlan {
        id,
        user_id,
        plan_content: plan_content.clone(),
        plan_date: plan_date.to_string(),
        created_at: now,
    })
}

/// 指定日のプランを取得
pub async fn find_by_date(
    pool: &SqlitePool,
    user_id: Uuid,
    plan_date: &str,
) -> Result<Option<DailyPlan>, ApiError> {
    let row = sqlx::query_as::<_, PlanRow>(
        "SELECT id, user_id, plan_content, plan_date, created_at
         FROM daily_plans WHERE user_id = ? AND plan_date = ?",
    )
    .bind(user_id.to_string())
    .bind(plan_date)
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to find plan: {}", e)))?;

    row.map(|r| r.into_plan()).transpose()
}

// SQLiteからの行取得用の内部型
#[derive(sqlx::FromRow)]
struct PlanRow {
    id: String,
    user_id: String,
    plan_content: String,
    plan_date: String,
    created_at: String,
}

impl PlanRow {
    fn into_plan(self) -> Result<DailyPlan, ApiError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| ApiError::Database(format!("Invalid plan id: {}", e)))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| ApiError::Database(format!("Invalid user id: {}", e)))?;
        let plan_content = serde_json::from_str(&self.plan_content)
            .map_err(|e| ApiError::Database(format!("Invalid plan content: {}", e)))?;

        Ok(DailyPlan {
            id,
            user_id,
            plan_content,
            plan_date: self.plan_date,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}
