// 子どものタスクCRUD操作

use crate::common::error::ApiError;
use crate::db::users::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

/// タスク種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// 宿題・学習
    Homework,
    /// 社会性・お手伝い
    Social,
    /// お金の学習
    Financial,
}

impl TaskType {
    /// DB格納用の文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Homework => "homework",
            TaskType::Social => "social",
            TaskType::Financial => "financial",
        }
    }

    /// DB文字列からのパース
    pub fn parse(s: &str) -> Option<TaskType> {
        match s {
            "homework" => Some(TaskType::Homework),
            "social" => Some(TaskType::Social),
            "financial" => Some(TaskType::Financial),
            _ => None,
        }
    }
}

/// 子どものタスク
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildTask {
    /// タスクID
    pub id: Uuid,
    /// 子どもユーザーID
    pub user_id: Uuid,
    /// タイトル
    pub title: String,
    /// 説明
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// タスク種別
    pub task_type: TaskType,
    /// 獲得ポイント
    pub points: i64,
    /// 完了済みか
    pub completed: bool,
    /// 完了日時
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// 作成日時
    pub created_at: DateTime<Utc>,
}

/// タスクを作成
pub async fn create(
    pool: &SqlitePool,
    user_id: Uuid,
    title: &str,
    description: Option<&str>,
    task_type: TaskType,
    points: i64,
) -> Result<ChildTask, ApiError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO child_tasks (id, user_id, title, description, task_type, points, completed, completed_at, created_at)
         VALUES (?, ?, ?, ?, ?, ?, 0, NULL, ?)",
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(title)
    .bind(description)
    .bind(task_type.as_str())
    .bind(points)
    .bind(now.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to create task: {}", e)))?;

    Ok(ChildTask {
        id,
        user_id,
        title: title.to_string(),
        description: description.map(|d| d.to_string()),
        task_type,
        points,
        completed: false,
        completed_at: None,
        created_at: now,
    })
}

/// タスク一覧を取得（completedで絞り込み可能）
pub async fn list(
    pool: &SqlitePool,
    user_id: Uuid,
    completed: Option<bool>,
) -> Result<Vec<ChildTask>, ApiError> {
    let base = "SELECT id, user_id, title, description, task_type, points, completed, completed_at, created_at
         FROM child_tasks WHERE user_id = ?";

    let rows = match completed {
        Some(flag) => {
            sqlx::query_as::<_, TaskRow>(&format!("{} AND completed = ? ORDER BY created_at DESC", base))
                .bind(user_id.to_string())
                .bind(flag as i32)
                .fetch_all(pool)
                .await
        }
        None => {
            sqlx::query_as::<_, TaskRow>(&format!("{} ORDER BY created_at DESC", base))
                .bind(user_id.to_string())
                .fetch_all(pool)
                .await
        }
    }
    .map_err(|e| ApiError::Database(format!("Failed to list tasks: {}", e)))?;

    rows.into_iter().map(|r| r.into_task()).collect()
}

/// IDでタスクを検索
pub async fn find_by_id(pool: &SqlitePool, task_id: Uuid) -> Result<Option<ChildTask>, ApiError> {
    let row = sqlx::query_as::<_, TaskRow>(
        "SELECT id, user_id, title, description, task_type, points, completed, completed_at, created_at
         FROM child_tasks WHERE id = ?",
    )
    .bind(task_id.to_string())
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to find task: {}", e)))?;

    row.map(|r| r.into_task()).transpose()
}

/// タスクを完了にする
pub async fn complete(pool: &SqlitePool, task_id: Uuid) -> Result<(), ApiError> {
    sqlx::query("UPDATE child_tasks SET completed = 1, completed_at = ? WHERE id = ?")
        .bind(Utc::now().to_rfc3339())
        .bind(task_id.to_string())
        .execute(pool)
        .await
        .map_err(|e| ApiError::Database(format!("Failed to complete task: {}", e)))?;

    Ok(())
}

/// 獲得済みポイント合計（完了タスクのみ）
pub async fn earned_points(pool: &SqlitePool, user_id: Uuid) -> Result<i64, ApiError> {
    sqlx::query_scalar(
        "SELECT COALESCE(SUM(points), 0) FROM child_tasks WHERE user_id = ? AND completed = 1",
    )
    .bind(user_id.to_string())
    .fetch_one(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to sum earned points: {}", e)))
}

/// 未完了タスクの獲得可能ポイント合計
pub async fn available_points(pool: &SqlitePool, user_id: Uuid) -> Result<i64, ApiError> {
    sqlx::query_scalar(
        "SELECT COALESCE(SUM(points), 0) FROM child_tasks WHERE user_id = ? AND completed = 0",
    )
    .bind(user_id.to_string())
    .fetch_one(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to sum available points: {}", e)))
}

// SQLiteからの行取得用の内部型
#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    user_id: String,
    title: String,
    description: Option<String>,
    task_type: String,
    points: i64,
    completed: i64,
    completed_at: Option<String>,
    created_at: String,
}

impl TaskRow {
    fn into_task(self) -> Result<ChildTask, ApiError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| ApiError::Database(format!("Invalid task id: {}", e)))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| ApiError::Database(format!("Invalid user id: {}", e)))?;
        let task_type = TaskType::parse(&self.task_type)
            .ok_or_else(|| ApiError::Database(format!("Invalid task_type: {}", self.task_type)))?;
        let completed_at = self
            .completed_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;

        Ok(ChildTask {
            id,
            user_id,
            title: self.title,
            description: self.description,
            task_type,
            points: self.points,
            completed: self.completed != 0,
            completed_at,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}
