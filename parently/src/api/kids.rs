//! 子ども向けAPI
//!
//! キッズチャット、タスクとポイント、親によるタスク作成・
//! メッセージ履歴・サマリー閲覧。

use crate::auth::middleware::{require_child, require_own_child, require_parent};
use crate::common::auth::AuthUser;
use crate::common::error::{ApiError, ApiResult};
use crate::db::child_tasks::TaskType;
use crate::ratelimit::RateLimitKind;
use crate::{cache, db, validation, AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// サマリーに含める直近メッセージ件数
const SUMMARY_RECENT_MESSAGES: i64 = 5;
/// サマリーのメッセージプレビュー長（文字数）
const SUMMARY_PREVIEW_CHARS: usize = 50;

/// キッズチャットリクエスト
#[derive(Debug, Deserialize)]
pub struct KidMessageRequest {
    /// 子どものメッセージ
    pub message: String,
}

/// タスク一覧クエリ
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    /// 完了状態での絞り込み
    pub completed: Option<bool>,
}

/// タスク完了リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTaskRequest {
    /// 対象タスクID
    pub task_id: Uuid,
}

/// 対象の子どもを指定するクエリ
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildQuery {
    /// 子どもユーザーID
    pub child_id: Option<Uuid>,
}

/// メッセージ履歴クエリ
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageListQuery {
    /// 子どもユーザーID
    pub child_id: Option<Uuid>,
    /// 取得件数（1-100、デフォルト20）
    pub limit: Option<i64>,
}

/// タスク作成リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// タイトル
    pub title: String,
    /// 説明
    pub description: Option<String>,
    /// タスク種別
    pub task_type: TaskType,
    /// 獲得ポイント（1-100、デフォルト10）
    pub points: Option<i64>,
}

impl CreateTaskRequest {
    fn validate(&self) -> ApiResult<()> {
        validation::validate_length("title", &self.title, 1, 100)?;
        if let Some(ref description) = self.description {
            validation::validate_length("description", description, 0, 500)?;
        }
        if let Some(points) = self.points {
            validation::validate_task_points(points)?;
        }
        Ok(())
    }
}

fn required_child_id(child_id: Option<Uuid>) -> ApiResult<Uuid> {
    child_id.ok_or_else(|| ApiError::Validation("childId is required".to_string()))
}

/// POST /api/v1/kids/message - キッズチャット
///
/// 常にHaikuを使い、応答を30分キャッシュする。
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<KidMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    require_child(&user)?;
    state
        .rate_limiter
        .check(&user.id.to_string(), RateLimitKind::Chat)
        .await?;
    validation::validate_length("message", &request.message, 1, 1000)?;

    let hash = cache::message_hash(&request.message);
    let cache_key = cache::ai_response_key(user.id, &hash);
    if let Some(mut cached) = state.cache.get(&cache_key).await {
        if let Some(object) = cached.as_object_mut() {
            object.insert("cached".to_string(), json!(true));
        }
        return Ok(super::success(cached));
    }

    let response = state.ai.child_chat(&request.message).await;

    db::child_messages::create(
        &state.db_pool,
        &state.cipher,
        user.id,
        &request.message,
        &response,
    )
    .await?;

    let data = json!({
        "response": response,
        "model": "haiku",
    });
    state
        .cache
        .set(&cache_key, data.clone(), cache::AI_RESPONSE_TTL)
        .await;

    let mut body = data;
    if let Some(object) = body.as_object_mut() {
        object.insert("cached".to_string(), json!(false));
    }
    Ok(super::success(body))
}

/// GET /api/v1/kids/tasks?completed= - タスク一覧とポイント
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<impl IntoResponse> {
    require_child(&user)?;
    state
        .rate_limiter
        .check(&user.id.to_string(), RateLimitKind::General)
        .await?;

    let tasks = db::child_tasks::list(&state.db_pool, user.id, query.completed).await?;
    let earned = db::child_tasks::earned_points(&state.db_pool, user.id).await?;
    let available = db::child_tasks::available_points(&state.db_pool, user.id).await?;

    Ok(super::success(json!({
        "tasks": tasks,
        "points": {
            "total": earned,
            "available": available,
        },
    })))
}

/// POST /api/v1/kids/tasks/complete - タスク完了
///
/// 自分のタスクでなければ、存在の有無を漏らさないよう404を返す。
///
/// # Returns
/// * `200 OK` - 獲得ポイント
/// * `404 Not Found` - タスクが存在しない、または他人のタスク
/// * `409 Conflict` - 完了済み
pub async fn complete_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CompleteTaskRequest>,
) -> ApiResult<impl IntoResponse> {
    require_child(&user)?;
    state
        .rate_limiter
        .check(&user.id.to_string(), RateLimitKind::General)
        .await?;

    let task = db::child_tasks::find_by_id(&state.db_pool, request.task_id)
        .await?
        .filter(|task| task.user_id == user.id)
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if task.completed {
        return Err(ApiError::Conflict("Task already completed".to_string()));
    }

    db::child_tasks::complete(&state.db_pool, task.id).await?;
    tracing::info!(task_id = %task.id, user_id = %user.id, points = task.points, "Task completed");

    Ok(super::success(json!({
        "message": "Task completed successfully!",
        "pointsEarned": task.points,
        "taskId": task.id,
    })))
}

/// POST /api/v1/kids/tasks?childId= - タスク作成（親のみ）
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ChildQuery>,
    Json(request): Json<CreateTaskRequest>,
) -> ApiResult<impl IntoResponse> {
    require_parent(&user)?;
    state
        .rate_limiter
        .check(&user.id.to_string(), RateLimitKind::General)
        .await?;
    request.validate()?;

    let child_id = required_child_id(query.child_id)?;
    let child = require_own_child(&state.db_pool, &user, child_id).await?;

    let task = db::child_tasks::create(
        &state.db_pool,
        child.id,
        &request.title,
        request.description.as_deref(),
        request.task_type,
        request.points.unwrap_or(10),
    )
    .await?;

    Ok((StatusCode::CREATED, super::success(json!({"task": task}))))
}

/// GET /api/v1/kids/messages?childId=&limit= - メッセージ履歴（親のみ）
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<MessageListQuery>,
) -> ApiResult<impl IntoResponse> {
    require_parent(&user)?;
    state
        .rate_limiter
        .check(&user.id.to_string(), RateLimitKind::General)
        .await?;

    let child_id = required_child_id(query.child_id)?;
    let child = require_own_child(&state.db_pool, &user, child_id).await?;

    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let messages =
        db::child_messages::list_recent(&state.db_pool, &state.cipher, child.id, limit).await?;

    Ok(super::success(json!({"messages": messages})))
}

/// GET /api/v1/kids/summary?childId= - 子どもサマリー（親のみ）
///
/// タスク・ポイント・直近メッセージ（50文字プレビュー）のロールアップ。
pub async fn get_summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ChildQuery>,
) -> ApiResult<impl IntoResponse> {
    require_parent(&user)?;
    state
        .rate_limiter
        .check(&user.id.to_string(), RateLimitKind::General)
        .await?;

    let child_id = required_child_id(query.child_id)?;
    let child = require_own_child(&state.db_pool, &user, child_id).await?;

    let tasks = db::child_tasks::list(&state.db_pool, child.id, None).await?;
    let completed = tasks.iter().filter(|t| t.completed).count();
    let pending = tasks.len() - completed;

    let earned = db::child_tasks::earned_points(&state.db_pool, child.id).await?;
    let available = db::child_tasks::available_points(&state.db_pool, child.id).await?;

    let message_count = db::child_messages::count(&state.db_pool, child.id).await?;
    let recent = db::child_messages::list_recent(
        &state.db_pool,
        &state.cipher,
        child.id,
        SUMMARY_RECENT_MESSAGES,
    )
    .await?;

    let recent_messages: Vec<serde_json::Value> = recent
        .iter()
        .map(|m| {
            json!({
                "message": truncate_preview(&m.message),
                "createdAt": m.created_at.to_rfc3339(),
            })
        })
        .collect();
    let last_message = recent.first().map(|m| m.created_at.to_rfc3339());

    Ok(super::success(json!({
        "child": {
            "id": child.id,
            "name": child.name,
        },
        "tasks": {
            "total": tasks.len(),
            "completed": completed,
            "pending": pending,
        },
        "points": {
            "total": earned,
            "available": available,
        },
        "recentActivity": {
            "lastMessage": last_message,
            "messageCount": message_count,
            "recentMessages": recent_messages,
        },
    })))
}

/// メッセージプレビューを50文字に切り詰める
fn truncate_preview(message: &str) -> String {
    if message.chars().count() <= SUMMARY_PREVIEW_CHARS {
        message.to_string()
    } else {
        let truncated: String = message.chars().take(SUMMARY_PREVIEW_CHARS).collect();
        format!("{}...", truncated)
    }
}
