//! Configuration management via environment variables
//!
//! Provides typed helper functions for reading environment variables and
//! grouped config structs for the server, AI client and CORS settings.

use std::time::Duration;

/// Get an environment variable
///
/// # Arguments
/// * `name` - The environment variable name
///
/// # Returns
/// * `Some(value)` - The environment variable value
/// * `None` - The variable is not set
pub fn get_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Get an environment variable with a default value
pub fn get_env_or(name: &str, default: &str) -> String {
    get_env(name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable, parsing to a specific type
///
/// Returns the default if the variable is not set or fails to parse.
pub fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    get_env(name).and_then(|s| s.parse().ok()).unwrap_or(default)
}

/// AI client configuration (Anthropic Messages API)
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// API key sent as the `x-api-key` header
    pub api_key: String,
    /// Base URL of the API (overridable for tests)
    pub base_url: String,
    /// Per-call timeout
    pub timeout: Duration,
    /// Number of attempts before giving up
    pub max_retries: u32,
}

impl AiConfig {
    /// Load AI configuration from environment variables.
    ///
    /// `PARENTLY_ANTHROPIC_API_KEY` is required in production; an empty key is
    /// tolerated so that tests can run against a mock endpoint.
    pub fn from_env() -> Self {
        Self {
            api_key: get_env_or("PARENTLY_ANTHROPIC_API_KEY", ""),
            base_url: get_env_or("PARENTLY_ANTHROPIC_BASE_URL", "https://api.anthropic.com"),
            timeout: Duration::from_secs(get_env_parse("PARENTLY_AI_TIMEOUT_SECS", 10u64)),
            max_retries: get_env_parse("PARENTLY_AI_MAX_RETRIES", 3u32),
        }
    }
}

/// CORS許可オリジン一覧を環境変数から取得
///
/// `PARENTLY_ALLOWED_ORIGINS` をカンマ区切りで解釈し、空要素は捨てる。
pub fn allowed_origins() -> Vec<String> {
    get_env_or("PARENTLY_ALLOWED_ORIGINS", "")
        .split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}
