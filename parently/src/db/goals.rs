// 家計ゴールCRUD操作

use crate::common::error::ApiError;
use crate::db::users::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

/// ゴール種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    /// 貯蓄
    Savings,
    /// 家族の活動資金
    Activity,
    /// 緊急予備資金
    Emergency,
}

impl GoalType {
    /// DB格納用の文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Savings => "savings",
            GoalType::Activity => "activity",
            GoalType::Emergency => "emergency",
        }
    }

    /// DB文字列からのパース
    pub fn parse(s: &str) -> Option<GoalType> {
        match s {
            "savings" => Some(GoalType::Savings),
            "activity" => Some(GoalType::Activity),
            "emergency" => Some(GoalType::Emergency),
            _ => None,
        }
    }
}

/// 家計ゴール
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialGoal {
    /// ゴールID
    pub id: Uuid,
    /// ユーザーID
    pub user_id: Uuid,
    /// タイトル
    pub title: String,
    /// 説明
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 目標金額
    pub target_amount: f64,
    /// 現在の積立額
    pub current_amount: f64,
    /// ゴール種別
    pub goal_type: GoalType,
    /// 目標期日（YYYY-MM-DD）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<String>,
    /// 作成日時
    pub created_at: DateTime<Utc>,
}

/// ゴールを作成（current_amountは0から開始）
pub async fn create(
    pool: &SqlitePool,
    user_id: Uuid,
    title: &str,
    description: Option<&str>,
    target_amount: f64,
    goal_type: GoalType,
    target_date: Option<&str>,
) -> Result<FinancialGoal, ApiError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO financial_goals (id, user_id, title, description, target_amount, current_amount, goal_type, target_date, created_at)
         VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(title)
    .bind(description)
    .bind(target_amount)
    .bind(goal_type.as_str())
    .bind(target_date)
    .bind(now.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to create goal: {}", e)))?;

    Ok(FinancialGoal {
        id,
        user_id,
        title: title.to_string(),
        description: description.map(|d| d.to_string()),
        target_amount,
        current_amount: 0.0,
        goal_type,
        target_date: target_date.map(|d| d.to_string()),
        created_at: now,
    })
}

/// ユーザーのゴール一覧を新しい順に取得
pub async fn list(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<FinancialGoal>, ApiError> {
    let rows = sqlx::query_as::<_, GoalRow>(
        "SELECT id, user_id, title, description, target_amount, current_amount, goal_type, target_date, created_at
         FROM financial_goals WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to list goals: {}", e)))?;

    rows.into_iter().map(|r| r.into_goal()).collect()
}

/// 積立額を更新
pub async fn update_progress(
    pool: &SqlitePool,
    goal_id: Uuid,
    current_amount: f64,
) -> Result<(), ApiError> {
    sqlx::query("UPDATE financial_goals SET current_amount = ? WHERE id = ?")
        .bind(current_amount)
        .bind(goal_id.to_string())
        .execute(pool)
        .await
        .map_err(|e| ApiError::Database(format!("Failed to update goal progress: {}", e)))?;

    Ok(())
}

// SQLiteからの行取得用の内部型
#[derive(sqlx::FromRow)]
struct GoalRow {
    id: String,
    user_id: String,
    title: String,
    description: Option<String>,
    target_amount: f64,
    current_amount: f64,
    goal_type: String,
    target_date: Option<String>,
    created_at: String,
}

impl GoalRow {
    fn into_goal(self) -> Result<FinancialGoal, ApiError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| ApiError::Database(format!("Invalid goal id: {}", e)))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| ApiError::Database(format!("Invalid user id: {}", e)))?;
        let goal_type = GoalType::parse(&self.goal_type)
            .ok_or_else(|| ApiError::Database(format!("Invalid goal_type: {}", self.goal_type)))?;

        Ok(FinancialGoal {
            id,
            user_id,
            title: self.title,
            description: self.description,
            target_amount: self.target_amount,
            current_amount: self.current_amount,
            goal_type,
            target_date: self.target_date,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}
