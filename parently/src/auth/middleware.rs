// 認証ミドルウェアとロールガード

use crate::common::auth::{AuthUser, User, UserRole};
use crate::common::error::{ApiError, ApiResult};
use crate::{auth, db, AppState};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use sqlx::SqlitePool;
use std::net::SocketAddr;
use uuid::Uuid;

/// AuthorizationヘッダーからBearerトークンを取り出す
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// JWT認証ミドルウェア
///
/// Bearerトークンを検証し、トークンの持ち主がまだ存在することを
/// DBで確認したうえで`AuthUser`をrequest extensionに挿入する。
///
/// # Errors
/// * `ApiError::Authentication` - ヘッダー欠落、ユーザー削除済み
/// * `ApiError::Jwt` - トークン不正・期限切れ
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(req.headers())
        .ok_or_else(|| ApiError::Authentication("Missing authorization header".to_string()))?
        .to_string();

    let claims = auth::jwt::verify_access_token(&token, &state.jwt_secret)?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::Authentication("Invalid token subject".to_string()))?;

    // トークン発行後にユーザーが削除されている場合は拒否
    let user = db::users::find_by_id(&state.db_pool, user_id)
        .await?
        .ok_or_else(|| ApiError::Authentication("User no longer exists".to_string()))?;

    let auth_user = AuthUser {
        id: user.id,
        email: user.email,
        role: user.user_type,
        parent_id: user.parent_id,
    };
    req.extensions_mut().insert(auth_user);

    Ok(next.run(req).await)
}

/// 親アカウントのみ許可
pub fn require_parent(user: &AuthUser) -> ApiResult<()> {
    if user.role == UserRole::Parent {
        Ok(())
    } else {
        Err(ApiError::Authorization(
            "Parent account required".to_string(),
        ))
    }
}

/// 子どもアカウントのみ許可
pub fn require_child(user: &AuthUser) -> ApiResult<()> {
    if user.role == UserRole::Child {
        Ok(())
    } else {
        Err(ApiError::Authorization("Child account required".to_string()))
    }
}

/// 指定IDが呼び出し親の子どもであることを確認して返す
///
/// 他人の子どもかどうかを漏らさないため、存在しない場合と
/// 所有していない場合のどちらも404を返す。
pub async fn require_own_child(
    pool: &SqlitePool,
    user: &AuthUser,
    child_id: Uuid,
) -> ApiResult<User> {
    let child = db::users::find_by_id(pool, child_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Child not found".to_string()))?;

    if child.user_type != UserRole::Child || child.parent_id != Some(user.id) {
        return Err(ApiError::NotFound("Child not found".to_string()));
    }

    Ok(child)
}

/// レート制限用のクライアント識別子
///
/// 認証前のエンドポイントではユーザーIDが使えないため、
/// `x-forwarded-for`の先頭ホップ、なければ接続元アドレスを使う。
pub fn client_identifier(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_hop) = forwarded.split(',').next() {
            let trimmed = first_hop.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
