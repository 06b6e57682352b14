//! エンドポイント別レートリミッター
//!
//! 固定ウィンドウ方式。識別子（ユーザーIDまたはクライアントIP）と
//! エンドポイント種別ごとにカウントし、超過時は429相当のエラーを返す。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::common::error::{ApiError, ApiResult};

/// レート制限の対象種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitKind {
    /// AIチャット（親・子ども共通）
    Chat,
    /// 親のチェックイン送信
    Checkin,
    /// デイリープラン生成
    Plan,
    /// 子どもインサイト生成
    Insights,
    /// その他のエンドポイント
    General,
}

impl RateLimitKind {
    /// ウィンドウあたりの許容リクエスト数
    pub fn limit(&self) -> u32 {
        match self {
            RateLimitKind::Chat => 10,
            RateLimitKind::Checkin => 5,
            RateLimitKind::Plan => 3,
            RateLimitKind::Insights => 2,
            RateLimitKind::General => 30,
        }
    }

    /// ウィンドウ長
    pub fn window(&self) -> Duration {
        match self {
            RateLimitKind::Chat => Duration::from_secs(60),
            RateLimitKind::Checkin => Duration::from_secs(60),
            RateLimitKind::Plan => Duration::from_secs(300),
            RateLimitKind::Insights => Duration::from_secs(600),
            RateLimitKind::General => Duration::from_secs(60),
        }
    }

    /// キャッシュキー用の種別名
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitKind::Chat => "chat",
            RateLimitKind::Checkin => "checkin",
            RateLimitKind::Plan => "plan",
            RateLimitKind::Insights => "insights",
            RateLimitKind::General => "general",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started_at: Instant,
    lifetime: Duration,
}

/// 固定ウィンドウレートリミッター
#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, Window>>>,
}

impl RateLimiter {
    /// 空の状態でリミッターを作成
    pub fn new() -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// リクエスト1件をカウントし、制限内かどうか判定する
    ///
    /// # Arguments
    /// * `identifier` - ユーザーIDまたはクライアントIP
    /// * `kind` - レート制限の対象種別
    ///
    /// # Returns
    /// * `Ok(())` - 制限内（カウント済み）
    /// * `Err(ApiError::RateLimited)` - 超過。`retry_after_secs`はウィンドウ残り秒数
    pub async fn check(&self, identifier: &str, kind: RateLimitKind) -> ApiResult<()> {
        let key = format!("{}:{}", kind.as_str(), identifier);
        let now = Instant::now();
        let mut windows = self.windows.write().await;

        // 期限切れウィンドウを破棄する。IPキーのエントリが溜まり続けないよう
        // チェックのたびに全体を掃除する
        windows.retain(|_, window| now.duration_since(window.started_at) < window.lifetime);

        let window = windows.entry(key).or_insert(Window {
            count: 0,
            started_at: now,
            lifetime: kind.window(),
        });

        if window.count >= kind.limit() {
            let elapsed = now.duration_since(window.started_at);
            let remaining = kind.window().saturating_sub(elapsed);
            let retry_after_secs = remaining.as_secs().max(1);
            return Err(ApiError::RateLimited { retry_after_secs });
        }

        window.count += 1;
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
