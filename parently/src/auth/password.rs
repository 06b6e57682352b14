// パスワードハッシュ化と検証（bcrypt実装）

use crate::common::error::ApiError;
use bcrypt::{hash, verify};

/// パスワードハッシュ化のコスト
const HASH_COST: u32 = 10;

/// パスワードをbcryptでハッシュ化
///
/// # Arguments
/// * `password` - ハッシュ化するパスワード
///
/// # Returns
/// * `Ok(String)` - bcryptハッシュ文字列（$2b$で始まる）
/// * `Err(ApiError)` - ハッシュ化失敗
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    hash(password, HASH_COST)
        .map_err(|e| ApiError::PasswordHash(format!("Failed to hash password: {}", e)))
}

/// パスワードを検証
///
/// # Arguments
/// * `password` - 検証する平文パスワード
/// * `hash` - bcryptハッシュ文字列
///
/// # Returns
/// * `Ok(true)` - パスワード一致
/// * `Ok(false)` - パスワード不一致
/// * `Err(ApiError)` - 検証失敗
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    verify(password, hash)
        .map_err(|e| ApiError::PasswordHash(format!("Failed to verify password: {}", e)))
}
