//! Parently Backend Server Entry Point

use clap::Parser;
use parently::{ai, api, cache, config, crypto, db, logging, ratelimit, AppState};
use std::net::SocketAddr;
use tracing::info;

/// 育児・家計アシスタントのバックエンドAPIサーバー
#[derive(Parser, Debug)]
#[command(name = "parently", version, about)]
struct Cli {
    /// バインドするホスト
    #[arg(long, env = "PARENTLY_HOST", default_value = "0.0.0.0")]
    host: String,

    /// バインドするポート
    #[arg(long, env = "PARENTLY_PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init().expect("failed to initialize logging");
    info!("Parently backend v{}", env!("CARGO_PKG_VERSION"));

    let database_url = config::get_env("PARENTLY_DATABASE_URL").unwrap_or_else(|| {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .expect("Failed to get home directory");
        format!("sqlite:{}/.parently/parently.db", home)
    });

    let db_pool = db::migrations::initialize_database(&database_url)
        .await
        .expect("Failed to initialize database");
    info!("Database initialized");

    let jwt_secret =
        config::get_env("PARENTLY_JWT_SECRET").expect("PARENTLY_JWT_SECRET must be set");
    let encryption_key =
        config::get_env("PARENTLY_ENCRYPTION_KEY").expect("PARENTLY_ENCRYPTION_KEY must be set");
    let cipher = crypto::FieldCipher::new(&encryption_key);

    let ai_config = config::AiConfig::from_env();
    let ai_client = ai::client::AiClient::new(&ai_config).expect("Failed to build AI client");

    let state = AppState {
        db_pool,
        jwt_secret,
        cipher,
        cache: cache::TtlCache::new(),
        rate_limiter: ratelimit::RateLimiter::new(),
        ai: ai_client,
        environment: config::get_env_or("PARENTLY_ENVIRONMENT", "development"),
    };

    let app = api::create_app(state);

    let bind_addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    info!("Parently server listening on {}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    info!("Server shutdown complete");
}

/// シャットダウンシグナルを待機
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}
