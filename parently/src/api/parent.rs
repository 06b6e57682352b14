//! 親向けAPI
//!
//! チェックイン、デイリープラン、AIチャット、進捗、子どもインサイト、
//! 家計ゴール。すべて親アカウント専用。

use crate::auth::middleware::require_parent;
use crate::common::auth::AuthUser;
use crate::common::error::{ApiError, ApiResult};
use crate::db::checkins::CheckinType;
use crate::db::goals::GoalType;
use crate::ratelimit::RateLimitKind;
use crate::{cache, db, validation, AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

/// チェックイン作成リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckinRequest {
    /// チェックイン種別（morning/evening）
    pub checkin_type: CheckinType,
    /// 感情状態（1-10）
    pub emotional_state: i64,
    /// 家計ストレス（1-10）
    pub financial_stress: i64,
    /// メモ
    pub notes: Option<String>,
    /// 想定外の出費
    pub unexpected_expenses: Option<f64>,
}

impl CheckinRequest {
    fn validate(&self) -> ApiResult<()> {
        validation::validate_scale("emotionalState", self.emotional_state)?;
        validation::validate_scale("financialStress", self.financial_stress)?;
        if let Some(ref notes) = self.notes {
            validation::validate_length("notes", notes, 0, 2000)?;
        }
        if let Some(expenses) = self.unexpected_expenses {
            if !expenses.is_finite() || expenses < 0.0 {
                return Err(ApiError::Validation(
                    "unexpectedExpenses must be a non-negative amount".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// プラン取得クエリ
#[derive(Debug, Deserialize)]
pub struct PlanQuery {
    /// 対象日（YYYY-MM-DD、省略時は今日）
    pub date: Option<String>,
}

/// チャットリクエスト
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// ユーザーメッセージ
    pub message: String,
}

/// 進捗取得クエリ
#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    /// 取得件数（1-50、デフォルト10）
    pub limit: Option<i64>,
}

/// ゴール作成リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    /// タイトル
    pub title: String,
    /// 説明
    pub description: Option<String>,
    /// 目標金額
    pub target_amount: f64,
    /// ゴール種別
    pub goal_type: GoalType,
    /// 目標期日（YYYY-MM-DD）
    pub target_date: Option<String>,
}

impl CreateGoalRequest {
    fn validate(&self) -> ApiResult<()> {
        validation::validate_length("title", &self.title, 1, 100)?;
        if let Some(ref description) = self.description {
            validation::validate_length("description", description, 0, 500)?;
        }
        validation::validate_positive_amount("targetAmount", self.target_amount)?;
        if let Some(ref date) = self.target_date {
            validation::validate_iso_date("targetDate", date)?;
        }
        Ok(())
    }
}

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// POST /api/v1/parent/checkin - チェックイン作成
///
/// # Returns
/// * `201 Created` - 作成されたチェックイン
/// * `400 Bad Request` - 検証エラー
/// * `429 Too Many Requests` - レート制限超過（5回/分）
pub async fn create_checkin(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CheckinRequest>,
) -> ApiResult<impl IntoResponse> {
    require_parent(&user)?;
    state
        .rate_limiter
        .check(&user.id.to_string(), RateLimitKind::Checkin)
        .await?;
    request.validate()?;

    let checkin = db::checkins::create(
        &state.db_pool,
        &state.cipher,
        user.id,
        request.checkin_type,
        request.emotional_state,
        request.financial_stress,
        request.notes.as_deref(),
        request.unexpected_expenses.unwrap_or(0.0),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        super::success(json!({"checkin": checkin})),
    ))
}

/// GET /api/v1/parent/plan?date= - デイリープラン取得
///
/// キャッシュ（24時間）→ 生成の順で解決する。生成時は直近5件の
/// チェックインと現在のゴールをコンテキストに使い、DBにも保存する。
pub async fn get_plan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PlanQuery>,
) -> ApiResult<impl IntoResponse> {
    require_parent(&user)?;
    state
        .rate_limiter
        .check(&user.id.to_string(), RateLimitKind::Plan)
        .await?;

    let date = match query.date {
        Some(date) => {
            validation::validate_iso_date("date", &date)?;
            date
        }
        None => today(),
    };

    let cache_key = cache::plan_key(user.id, &date);
    if let Some(cached) = state.cache.get(&cache_key).await {
        return Ok(super::success(json!({
            "plan": cached,
            "date": date,
            "cached": true,
        })));
    }

    let recent_checkins = db::checkins::list_recent(&state.db_pool, &state.cipher, user.id, 5).await?;
    let goals = db::goals::list(&state.db_pool, user.id).await?;
    let goal_titles: Vec<String> = goals.iter().map(|g| g.title.clone()).collect();

    let plan = state.ai.generate_plan(&recent_checkins, &goal_titles).await;
    let plan_value = serde_json::to_value(&plan)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize plan: {}", e)))?;

    db::plans::upsert(&state.db_pool, user.id, &date, &plan_value).await?;
    state
        .cache
        .set(&cache_key, plan_value.clone(), cache::PLAN_TTL)
        .await;

    Ok(super::success(json!({
        "plan": plan_value,
        "date": date,
        "cached": false,
    })))
}

/// POST /api/v1/parent/chat - AIチャット
///
/// メッセージハッシュでキャッシュ（30分）を引き、ミス時は直近の
/// チェックインからコンテキストを組み立ててAIを呼ぶ。
pub async fn chat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<impl IntoResponse> {
    require_parent(&user)?;
    state
        .rate_limiter
        .check(&user.id.to_string(), RateLimitKind::Chat)
        .await?;
    validation::validate_length("message", &request.message, 1, 2000)?;

    let hash = cache::message_hash(&request.message);
    let cache_key = cache::ai_response_key(user.id, &hash);
    if let Some(mut cached) = state.cache.get(&cache_key).await {
        if let Some(object) = cached.as_object_mut() {
            object.insert("cached".to_string(), json!(true));
        }
        return Ok(super::success(cached));
    }

    // 直近チェックインの状態をコンテキストとして渡す
    let recent = db::checkins::list_recent(&state.db_pool, &state.cipher, user.id, 3).await?;
    let context = recent.first().map(|checkin| {
        format!(
            "Recent emotional state: {}/10, Financial stress: {}/10",
            checkin.emotional_state, checkin.financial_stress
        )
    });

    let reply = state.ai.handle_chat(&request.message, context.as_deref()).await;

    db::chat_messages::create(
        &state.db_pool,
        &state.cipher,
        user.id,
        &request.message,
        &reply.response,
        Some(reply.complexity_score),
        &reply.model,
    )
    .await?;

    let data = json!({
        "response": reply.response,
        "model": reply.model,
        "complexityScore": reply.complexity_score,
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

/// GET /api/v1/parent/progress?limit= - 進捗と推移
///
/// 直近のチェックイン・チャット履歴と、時系列（古い順）の
/// 感情/家計ストレス推移を返す。
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ProgressQuery>,
) -> ApiResult<impl IntoResponse> {
    require_parent(&user)?;
    state
        .rate_limiter
        .check(&user.id.to_string(), RateLimitKind::General)
        .await?;

    let limit = query.limit.unwrap_or(10).clamp(1, 50);

    let checkins = db::checkins::list_recent(&state.db_pool, &state.cipher, user.id, limit).await?;
    let chat_history =
        db::chat_messages::list_recent(&state.db_pool, &state.cipher, user.id, limit).await?;

    let emotional: Vec<serde_json::Value> = checkins
        .iter()
        .rev()
        .map(|c| json!({"date": c.created_at.to_rfc3339(), "value": c.emotional_state}))
        .collect();
    let financial: Vec<serde_json::Value> = checkins
        .iter()
        .rev()
        .map(|c| json!({"date": c.created_at.to_rfc3339(), "value": c.financial_stress}))
        .collect();

    Ok(super::success(json!({
        "checkins": checkins,
        "chatHistory": chat_history,
        "trends": {
            "emotional": emotional,
            "financial": financial,
        },
    })))
}

/// GET /api/v1/parent/insights - 子どもごとのAIインサイト
///
/// 子どもごとにキャッシュ（2時間）を引き、ミス時は直近20件の
/// 子どもメッセージと直近10件の親チェックインから生成する。
/// メッセージのない子どもはスキップする。
pub async fn get_insights(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    require_parent(&user)?;
    state
        .rate_limiter
        .check(&user.id.to_string(), RateLimitKind::Insights)
        .await?;

    let children = db::users::list_children(&state.db_pool, user.id).await?;
    let mut entries = Vec::with_capacity(children.len());

    for child in children {
        let cache_key = cache::insights_key(child.id);
        if let Some(cached) = state.cache.get(&cache_key).await {
            entries.push(json!({
                "childId": child.id,
                "childName": child.name,
                "insights": cached,
                "cached": true,
            }));
            continue;
        }

        let messages =
            db::child_messages::list_recent(&state.db_pool, &state.cipher, child.id, 20).await?;
        if messages.is_empty() {
            continue;
        }
        let checkins =
            db::checkins::list_recent(&state.db_pool, &state.cipher, user.id, 10).await?;

        let content = state.ai.generate_child_insights(&messages, &checkins).await;
        let value = serde_json::to_value(&content)
            .map_err(|e| ApiError::Internal(format!("Failed to serialize insights: {}", e)))?;

        let recommendations = if content.recommendations.is_empty() {
            None
        } else {
            Some(content.recommendations.join("; "))
        };
        db::insights::create(
            &state.db_pool,
            user.id,
            child.id,
            &content.summary,
            recommendations.as_deref(),
            &today(),
        )
        .await?;

        state
            .cache
            .set(&cache_key, value.clone(), cache::INSIGHTS_TTL)
            .await;

        entries.push(json!({
            "childId": child.id,
            "childName": child.name,
            "insights": value,
            "cached": false,
        }));
    }

    Ok(super::success(json!({"insights": entries})))
}

/// POST /api/v1/parent/goals - ゴール作成
pub async fn create_goal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateGoalRequest>,
) -> ApiResult<impl IntoResponse> {
    require_parent(&user)?;
    state
        .rate_limiter
        .check(&user.id.to_string(), RateLimitKind::General)
        .await?;
    request.validate()?;

    let goal = db::goals::create(
        &state.db_pool,
        user.id,
        &request.title,
        request.description.as_deref(),
        request.target_amount,
        request.goal_type,
        request.target_date.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, super::success(json!({"goal": goal}))))
}

/// GET /api/v1/parent/goals - ゴール一覧
pub async fn list_goals(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    require_parent(&user)?;
    state
        .rate_limiter
        .check(&user.id.to_string(), RateLimitKind::General)
        .await?;

    let goals = db::goals::list(&state.db_pool, user.id).await?;
    Ok(super::success(json!({"goals": goals})))
}
