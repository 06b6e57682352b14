// ユーザーCRUD操作

use crate::common::auth::{User, UserRole};
use crate::common::error::ApiError;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// ユーザーを作成
///
/// # Arguments
/// * `pool` - データベース接続プール
/// * `email` - メールアドレス（一意）
/// * `name` - 表示名
/// * `password_hash` - bcryptハッシュ化されたパスワード
/// * `user_type` - ユーザーロール
/// * `parent_id` - 親ユーザーID（childの場合のみ）
///
/// # Returns
/// * `Ok(User)` - 作成されたユーザー
/// * `Err(ApiError::Conflict)` - メールアドレス重複
pub async fn create(
    pool: &SqlitePool,
    email: &str,
    name: &str,
    password_hash: &str,
    user_type: UserRole,
    parent_id: Option<Uuid>,
) -> Result<User, ApiError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO users (id, email, name, password_hash, user_type, parent_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(user_type.as_str())
    .bind(parent_id.map(|p| p.to_string()))
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            ApiError::Conflict("Email already registered".to_string())
        } else {
            ApiError::Database(format!("Failed to create user: {}", e))
        }
    })?;

    Ok(User {
        id,
        email: email.to_string(),
        name: name.to_string(),
        password_hash: password_hash.to_string(),
        user_type,
        parent_id,
        created_at: now,
        updated_at: now,
    })
}

/// メールアドレスでユーザーを検索
///
/// # Returns
/// * `Ok(Some(User))` - ユーザーが見つかった
/// * `Ok(None)` - ユーザーが見つからなかった
/// * `Err(ApiError)` - 検索失敗
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, ApiError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, name, password_hash, user_type, parent_id, created_at, updated_at
         FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to find user: {}", e)))?;

    row.map(|r| r.into_user()).transpose()
}

/// IDでユーザーを検索
pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>, ApiError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, name, password_hash, user_type, parent_id, created_at, updated_at
         FROM users WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to find user: {}", e)))?;

    row.map(|r| r.into_user()).transpose()
}

/// 指定した親に属する子どもユーザー一覧を取得
pub async fn list_children(pool: &SqlitePool, parent_id: Uuid) -> Result<Vec<User>, ApiError> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, name, password_hash, user_type, parent_id, created_at, updated_at
         FROM users WHERE parent_id = ? AND user_type = 'child' ORDER BY created_at ASC",
    )
    .bind(parent_id.to_string())
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to list children: {}", e)))?;

    rows.into_iter().map(|r| r.into_user()).collect()
}

// SQLiteからの行取得用の内部型
#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    password_hash: String,
    user_type: String,
    parent_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn into_user(self) -> Result<User, ApiError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| ApiError::Database(format!("Invalid user id: {}", e)))?;
        let user_type = UserRole::parse(&self.user_type)
            .ok_or_else(|| ApiError::Database(format!("Invalid user_type: {}", self.user_type)))?;
        let parent_id = self
            .parent_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| ApiError::Database(format!("Invalid parent_id: {}", e)))?;
        let created_at = parse_timestamp(&self.created_at)?;
        let updated_at = parse_timestamp(&self.updated_at)?;

        Ok(User {
            id,
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
            user_type,
            parent_id,
            created_at,
            updated_at,
        })
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::Database(format!("Invalid timestamp '{}': {}", raw, e)))
}
