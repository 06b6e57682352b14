//! 認証API
//!
//! 登録、ログイン、トークンリフレッシュ、認証情報確認、ログアウト

use crate::auth::middleware::client_identifier;
use crate::auth::{jwt, password};
use crate::common::auth::{AuthUser, PublicUser, UserRole};
use crate::common::error::{ApiError, ApiResult};
use crate::ratelimit::RateLimitKind;
use crate::{cache, db, validation, AppState};
use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use uuid::Uuid;

/// ユーザー登録リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// メールアドレス
    pub email: String,
    /// パスワード（平文、保存前にハッシュ化）
    pub password: String,
    /// 表示名
    pub name: String,
    /// ユーザーロール
    pub user_type: UserRole,
    /// 親ユーザーID（childアカウント用）
    pub parent_id: Option<Uuid>,
}

impl RegisterRequest {
    fn validate(&self) -> ApiResult<()> {
        validation::validate_email(&self.email)?;
        // bcryptは72バイトまでしか見ないため上限を合わせる
        validation::validate_length("password", &self.password, 8, 72)?;
        validation::validate_length("name", &self.name, 1, 100)?;
        Ok(())
    }
}

/// ログインリクエスト
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// メールアドレス
    pub email: String,
    /// パスワード
    pub password: String,
}

/// トークンリフレッシュリクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// リフレッシュトークン
    pub refresh_token: Option<String>,
}

/// POST /api/v1/auth/register - ユーザー登録
///
/// # Returns
/// * `201 Created` - ユーザーとトークンペア
/// * `400 Bad Request` - 検証エラー、存在しない親ID
/// * `409 Conflict` - メールアドレス重複
/// * `429 Too Many Requests` - レート制限超過
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let identifier = client_identifier(&headers, peer.map(|c| c.0));
    state
        .rate_limiter
        .check(&identifier, RateLimitKind::General)
        .await?;

    request.validate()?;

    // childアカウントのparentIdは実在する親を指していなければならない
    if let Some(parent_id) = request.parent_id {
        let parent = db::users::find_by_id(&state.db_pool, parent_id).await?;
        match parent {
            Some(ref user) if user.user_type == UserRole::Parent => {}
            _ => {
                return Err(ApiError::Validation(
                    "parentId does not reference an existing parent".to_string(),
                ))
            }
        }
    }

    let password_hash = password::hash_password(&request.password)?;
    let user = db::users::create(
        &state.db_pool,
        request.email.trim(),
        &request.name,
        &password_hash,
        request.user_type,
        request.parent_id,
    )
    .await?;

    let tokens = jwt::create_token_pair(&user, &state.jwt_secret)?;
    tracing::info!(user_id = %user.id, role = user.user_type.as_str(), "User registered");

    Ok((
        StatusCode::CREATED,
        super::success(json!({
            "user": PublicUser::from(&user),
            "tokens": tokens,
        })),
    ))
}

/// POST /api/v1/auth/login - ログイン
///
/// ユーザーが存在しない場合とパスワード不一致の場合は同じ401を
/// 返し、登録済みメールアドレスの推測を防ぐ。
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let identifier = client_identifier(&headers, peer.map(|c| c.0));
    state
        .rate_limiter
        .check(&identifier, RateLimitKind::General)
        .await?;

    let user = db::users::find_by_email(&state.db_pool, request.email.trim())
        .await?
        .ok_or_else(|| {
            ApiError::Authentication("Invalid email or password".to_string())
        })?;

    if !password::verify_password(&request.password, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(ApiError::Authentication(
            "Invalid email or password".to_string(),
        ));
    }

    let tokens = jwt::create_token_pair(&user, &state.jwt_secret)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(super::success(json!({
        "user": PublicUser::from(&user),
        "tokens": tokens,
    })))
}

/// POST /api/v1/auth/refresh - アクセストークン再発行
///
/// # Returns
/// * `200 OK` - 新しいアクセストークン
/// * `400 Bad Request` - refreshTokenフィールド欠落
/// * `401 Unauthorized` - トークン不正・期限切れ・ユーザー削除済み
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<impl IntoResponse> {
    let token = request
        .refresh_token
        .ok_or_else(|| ApiError::Validation("refreshToken is required".to_string()))?;

    let claims = jwt::verify_refresh_token(&token, &state.jwt_secret)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::Authentication("Invalid token subject".to_string()))?;

    let user = db::users::find_by_id(&state.db_pool, user_id)
        .await?
        .ok_or_else(|| ApiError::Authentication("User no longer exists".to_string()))?;

    let access_token = jwt::create_access_token(&user, &state.jwt_secret)?;

    Ok(super::success(json!({
        "accessToken": access_token,
        "expiresIn": jwt::ACCESS_TOKEN_TTL_SECS,
    })))
}

/// GET /api/v1/auth/me - 現在のユーザー情報
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let row = db::users::find_by_id(&state.db_pool, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(super::success(json!({"user": PublicUser::from(&row)})))
}

/// POST /api/v1/auth/logout - ログアウト
///
/// トークンはステートレスなので失効はさせず、ユーザーの
/// キャッシュエントリだけを破棄する。
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    state
        .cache
        .remove_prefix(&format!("plan:{}:", user.id))
        .await;
    state
        .cache
        .remove_prefix(&format!("ai_response:{}:", user.id))
        .await;
    state.cache.remove(&cache::insights_key(user.id)).await;

    // インサイトキャッシュは子どもID単位なので、親は子どもの分も破棄する
    for child in db::users::list_children(&state.db_pool, user.id).await? {
        state.cache.remove(&cache::insights_key(child.id)).await;
    }

    tracing::info!(user_id = %user.id, "User logged out");
    Ok(super::success(json!({"message": "Logged out successfully"})))
}
