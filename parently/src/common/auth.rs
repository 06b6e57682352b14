// 認証関連のデータモデル

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ユーザーロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// 親（チェックイン、プラン、インサイト、ゴール、タスク作成）
    Parent,
    /// 子ども（キッズチャット、タスク完了）
    Child,
}

impl UserRole {
    /// DB格納用の文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Parent => "parent",
            UserRole::Child => "child",
        }
    }

    /// DB文字列からのパース
    pub fn parse(s: &str) -> Option<UserRole> {
        match s {
            "parent" => Some(UserRole::Parent),
            "child" => Some(UserRole::Child),
            _ => None,
        }
    }
}

/// ユーザー
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// ユーザーID
    pub id: Uuid,
    /// メールアドレス（一意）
    pub email: String,
    /// 表示名
    pub name: String,
    /// パスワードハッシュ（bcrypt）
    pub password_hash: String,
    /// ユーザーロール
    pub user_type: UserRole,
    /// 親ユーザーID（childの場合のみ）
    pub parent_id: Option<Uuid>,
    /// 作成日時
    pub created_at: DateTime<Utc>,
    /// 更新日時
    pub updated_at: DateTime<Utc>,
}

/// クライアント向けのユーザー表現（password_hashを含まない）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    /// ユーザーID
    pub id: Uuid,
    /// メールアドレス
    pub email: String,
    /// 表示名
    pub name: String,
    /// ユーザーロール
    pub user_type: UserRole,
    /// 親ユーザーID（childの場合のみ）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    /// 作成日時
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            user_type: user.user_type,
            parent_id: user.parent_id,
            created_at: user.created_at,
        }
    }
}

/// アクセストークンのJWTクレーム
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// ユーザーID（JWT sub claim）
    pub sub: String,
    /// メールアドレス
    pub email: String,
    /// ユーザーロール
    pub role: UserRole,
    /// 親ユーザーID（childの場合のみ）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// 発行時刻（Unix timestamp）
    pub iat: usize,
    /// 有効期限（Unix timestamp、JWT exp claim）
    pub exp: usize,
}

/// リフレッシュトークンのJWTクレーム
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// ユーザーID（JWT sub claim）
    pub sub: String,
    /// トークン種別（常に "refresh"）
    pub token_type: String,
    /// 発行時刻（Unix timestamp）
    pub iat: usize,
    /// 有効期限（Unix timestamp、JWT exp claim）
    pub exp: usize,
}

/// 認証済みユーザー（ミドルウェアがrequest extensionに挿入）
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// ユーザーID
    pub id: Uuid,
    /// メールアドレス
    pub email: String,
    /// ユーザーロール
    pub role: UserRole,
    /// 親ユーザーID（childの場合のみ）
    pub parent_id: Option<Uuid>,
}

/// トークンペア（ログイン/登録時のレスポンス用）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// アクセストークン（15分）
    pub access_token: String,
    /// リフレッシュトークン（7日）
    pub refresh_token: String,
    /// アクセストークン有効期限（秒）
    pub expires_in: usize,
    /// リフレッシュトークン有効期限（秒）
    pub refresh_expires_in: usize,
}
