//! REST APIハンドラー
//!
//! `/api/v1/{auth,parent,kids}`のルートグループと共通レスポンス形式。
//! 成功時は`{"success": true, "data": ...}`、失敗時は
//! `{"success": false, "error": "..."}`を返す。

use crate::auth::middleware::require_auth;
use crate::common::error::ApiError;
use crate::AppState;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// 認証API（登録、ログイン、リフレッシュ、me、ログアウト）
pub mod auth;

/// 親向けAPI（チェックイン、プラン、チャット、進捗、インサイト、ゴール）
pub mod parent;

/// 子ども向けAPI（キッズチャット、タスク、サマリー）
pub mod kids;

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        // サーバー側エラーの詳細はログにのみ残す
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Rate limited: {}", self);
        }

        let payload = json!({
            "success": false,
            "error": self.client_message(),
        });

        (status, Json(payload)).into_response()
    }
}

/// 成功レスポンスの共通エンベロープ
pub(crate) fn success<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "data": data,
    }))
}

/// axumアプリケーションを構築
///
/// 認証が必要なグループには`require_auth`ミドルウェアを
/// `route_layer`で適用する。
pub fn create_app(state: AppState) -> Router {
    let auth_public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh));

    let auth_protected = Router::new()
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let parent_routes = Router::new()
        .route("/checkin", post(parent::create_checkin))
        .route("/plan", get(parent::get_plan))
        .route("/chat", post(parent::chat))
        .route("/progress", get(parent::get_progress))
        .route("/insights", get(parent::get_insights))
        .route("/goals", post(parent::create_goal).get(parent::list_goals))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let kids_routes = Router::new()
        .route("/message", post(kids::send_message))
        .route("/tasks", get(kids::list_tasks).post(kids::create_task))
        .route("/tasks/complete", post(kids::complete_task))
        .route("/messages", get(kids::list_messages))
        .route("/summary", get(kids::get_summary))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/api/v1", get(index))
        .nest("/api/v1/auth", auth_public.merge(auth_protected))
        .nest("/api/v1/parent", parent_routes)
        .nest("/api/v1/kids", kids_routes)
        .fallback(not_found)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORSレイヤーを構築
///
/// `PARENTLY_ALLOWED_ORIGINS`が未設定の場合は全オリジンを許可する。
fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = crate::config::allowed_origins()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// GET /health - ヘルスチェック
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": state.environment,
    }))
}

/// GET /api/v1 - APIインデックス
async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Parently API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": endpoint_index(),
    }))
}

/// 404フォールバック（利用可能なエンドポイント一覧付き）
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": "Not found",
            "endpoints": endpoint_index(),
        })),
    )
}

fn endpoint_index() -> serde_json::Value {
    json!({
        "health": "/health",
        "auth": "/api/v1/auth",
        "parent": "/api/v1/parent",
        "kids": "/api/v1/kids",
    })
}
