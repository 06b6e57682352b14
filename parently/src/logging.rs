//! ロギング初期化ユーティリティ
//!
//! tracing-subscriberによる構造化ログ。`RUST_LOG`でフィルタを制御する。

use tracing_subscriber::{fmt, EnvFilter};

/// ロギングを初期化する
///
/// `RUST_LOG`が未設定の場合は`parently=info,tower_http=warn`を既定とする。
/// 二重初期化はエラーを返す（テストでは無視してよい）。
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("parently=info,tower_http=warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()?;

    Ok(())
}
