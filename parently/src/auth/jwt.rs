// JWT生成と検証（jsonwebtoken実装）
//
// アクセストークンとリフレッシュトークンは別の鍵で署名する。
// リフレッシュ鍵はアクセス鍵に"_refresh"を連結して導出するため、
// 片方のトークンをもう片方として使うことはできない。

use crate::common::auth::{AccessClaims, RefreshClaims, TokenPair, User};
use crate::common::error::ApiError;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

/// アクセストークン有効期限（15分）
pub const ACCESS_TOKEN_TTL_SECS: i64 = 900;
/// リフレッシュトークン有効期限（7日）
pub const REFRESH_TOKEN_TTL_SECS: i64 = 604_800;

/// リフレッシュトークン用の署名鍵を導出
fn refresh_secret(secret: &str) -> String {
    format!("{}_refresh", secret)
}

/// アクセストークンを生成
///
/// # Arguments
/// * `user` - 発行対象ユーザー
/// * `secret` - JWTシークレットキー
///
/// # Returns
/// * `Ok(String)` - JWTトークン（3つのドット区切り部分）
/// * `Err(ApiError)` - 生成失敗
pub fn create_access_token(user: &User, secret: &str) -> Result<String, ApiError> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(chrono::Duration::seconds(ACCESS_TOKEN_TTL_SECS))
        .ok_or_else(|| ApiError::Jwt("Failed to calculate expiration time".to_string()))?
        .timestamp() as usize;

    let claims = AccessClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.user_type,
        parent_id: user.parent_id.map(|id| id.to_string()),
        iat: now.timestamp() as usize,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Jwt(format!("Failed to create access token: {}", e)))
}

/// リフレッシュトークンを生成
///
/// # Arguments
/// * `user_id` - 発行対象ユーザーID
/// * `secret` - JWTシークレットキー（内部で"_refresh"鍵に導出）
pub fn create_refresh_token(user_id: Uuid, secret: &str) -> Result<String, ApiError> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(chrono::Duration::seconds(REFRESH_TOKEN_TTL_SECS))
        .ok_or_else(|| ApiError::Jwt("Failed to calculate expiration time".to_string()))?
        .timestamp() as usize;

    let claims = RefreshClaims {
        sub: user_id.to_string(),
        token_type: "refresh".to_string(),
        iat: now.timestamp() as usize,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(refresh_secret(secret).as_bytes()),
    )
    .map_err(|e| ApiError::Jwt(format!("Failed to create refresh token: {}", e)))
}

/// アクセストークンとリフレッシュトークンのペアを生成
pub fn create_token_pair(user: &User, secret: &str) -> Result<TokenPair, ApiError> {
    Ok(TokenPair {
        access_token: create_access_token(user, secret)?,
        refresh_token: create_refresh_token(user.id, secret)?,
        expires_in: ACCESS_TOKEN_TTL_SECS as usize,
        refresh_expires_in: REFRESH_TOKEN_TTL_SECS as usize,
    })
}

/// アクセストークンを検証
///
/// # Returns
/// * `Ok(AccessClaims)` - 検証済みクレーム
/// * `Err(ApiError)` - 検証失敗（無効なトークン、期限切れなど）
pub fn verify_access_token(token: &str, secret: &str) -> Result<AccessClaims, ApiError> {
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| ApiError::Jwt(format!("Failed to verify access token: {}", e)))
}

/// リフレッシュトークンを検証
///
/// 署名鍵の違いに加えて`token_type`クレームも確認する。
pub fn verify_refresh_token(token: &str, secret: &str) -> Result<RefreshClaims, ApiError> {
    let claims = decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(refresh_secret(secret).as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| ApiError::Jwt(format!("Failed to verify refresh token: {}", e)))?;

    if claims.token_type != "refresh" {
        return Err(ApiError::Jwt("Not a refresh token".to_string()));
    }

    Ok(claims)
}
