//! TTL付きインメモリキャッシュ
//!
//! AIプラン、AIチャット応答、子どもインサイトの生成結果を保持する。
//! エントリは有効期限付きで、期限切れは読み取り時に遅延削除する。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

/// デイリープランのキャッシュ保持期間（24時間）
pub const PLAN_TTL: Duration = Duration::from_secs(86400);
/// AIチャット応答のキャッシュ保持期間（30分）
pub const AI_RESPONSE_TTL: Duration = Duration::from_secs(1800);
/// 子どもインサイトのキャッシュ保持期間（2時間）
pub const INSIGHTS_TTL: Duration = Duration::from_secs(7200);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// TTL付きキー・バリューキャッシュ
#[derive(Debug, Clone)]
pub struct TtlCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl TtlCache {
    /// 空のキャッシュを作成
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// キーに対応する値を取得
    ///
    /// 期限切れのエントリは削除し`None`を返す。
    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // 期限切れエントリを削除
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.expires_at <= Instant::now() {
                entries.remove(key);
            }
        }
        None
    }

    /// 値をTTL付きで格納
    pub async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// キーを削除
    pub async fn remove(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }

    /// 指定プレフィックスで始まるキーをすべて削除
    ///
    /// タスク完了時に`insights:{child_id}`系の無効化などに使う。
    pub async fn remove_prefix(&self, prefix: &str) {
        let mut entries = self.entries.write().await;
        entries.retain(|key, _| !key.starts_with(prefix));
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

/// デイリープランのキャッシュキー
pub fn plan_key(user_id: Uuid, plan_date: &str) -> String {
    format!("plan:{}:{}", user_id, plan_date)
}

/// AIチャット応答のキャッシュキー
pub fn ai_response_key(user_id: Uuid, message_hash: &str) -> String {
    format!("ai_response:{}:{}", user_id, message_hash)
}

/// 子どもインサイトのキャッシュキー
pub fn insights_key(child_id: Uuid) -> String {
    format!("insights:{}", child_id)
}

/// チャットメッセージのハッシュ（キャッシュキー用）
///
/// SHA-256の16進表現の先頭16文字。同一メッセージの再送を
/// キャッシュヒットさせるために使う。
pub fn message_hash(message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..16].to_string()
}
