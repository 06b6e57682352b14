// Anthropic Messages API呼び出しと各AI操作
//
// 生のAPI呼び出し（call_claude）だけがエラーを返す。各操作は
// 呼び出し失敗やJSONパース失敗時に静的フォールバックへ縮退し、
// リクエスト全体を失敗させない。

use crate::ai::{prompts, ModelTier};
use crate::common::error::ApiError;
use crate::config::AiConfig;
use crate::db::checkins::ParentCheckin;
use crate::db::child_messages::ChildMessage;
use serde::Serialize;
use std::time::Duration;

/// 複雑度評価の結果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityEvaluation {
    /// 複雑度スコア（1-5）
    pub complexity_score: i64,
    /// 評価理由
    pub reasoning: String,
}

/// 生成されたデイリープラン
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPlanContent {
    /// 今日のプラン
    pub plan: String,
    /// 注力領域
    pub focus_areas: Vec<String>,
    /// 具体的なヒント
    pub tips: Vec<String>,
}

/// チャット応答
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// AIの応答本文
    pub response: String,
    /// 使用モデル（haiku/sonnet）
    pub model: String,
    /// 複雑度スコア（1-5）
    pub complexity_score: i64,
}

/// 子どもインサイト
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildInsightContent {
    /// 子どもの状態サマリー
    pub summary: String,
    /// 感情状態の総合評価
    pub emotional_state: String,
    /// 気になる点
    pub concerns: Vec<String>,
    /// 親への推奨
    pub recommendations: Vec<String>,
    /// 提案アクション
    pub suggested_actions: Vec<String>,
}

/// Anthropic Messages APIクライアント
#[derive(Debug, Clone)]
pub struct AiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    max_retries: u32,
}

impl AiClient {
    /// 設定からクライアントを作成
    pub fn new(config: &AiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries.max(1),
        })
    }

    /// メッセージの複雑度を評価（1-5）
    ///
    /// 失敗時は中間値3にフォールバックする。
    pub async fn evaluate_complexity(&self, message: &str) -> ComplexityEvaluation {
        let prompt = prompts::complexity_prompt(message);

        match self.call_claude(&prompt, ModelTier::Haiku).await {
            Ok(text) => match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(value) => ComplexityEvaluation {
                    complexity_score: value["complexityScore"].as_i64().unwrap_or(3).clamp(1, 5),
                    reasoning: value["reasoning"]
                        .as_str()
                        .unwrap_or("Complexity evaluated")
                        .to_string(),
                },
                Err(e) => {
                    tracing::warn!("Complexity evaluation returned invalid JSON: {}", e);
                    Self::default_complexity()
                }
            },
            Err(e) => {
                tracing::error!("Complexity evaluation failed: {}", e);
                Self::default_complexity()
            }
        }
    }

    fn default_complexity() -> ComplexityEvaluation {
        ComplexityEvaluation {
            complexity_score: 3,
            reasoning: "Default complexity score due to evaluation error".to_string(),
        }
    }

    /// 直近のチェックインからデイリープランを生成
    pub async fn generate_plan(
        &self,
        recent_checkins: &[ParentCheckin],
        current_goals: &[String],
    ) -> DailyPlanContent {
        let prompt = prompts::plan_prompt(recent_checkins, current_goals);

        match self.call_claude(&prompt, ModelTier::Haiku).await {
            Ok(text) => match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(value) => DailyPlanContent {
                    plan: value["plan"]
                        .as_str()
                        .unwrap_or("Focus on family well-being today")
                        .to_string(),
                    focus_areas: string_array(&value["focusAreas"])
                        .unwrap_or_else(|| vec!["parenting".to_string(), "finances".to_string()]),
                    tips: string_array(&value["tips"]).unwrap_or_else(|| {
                        vec![
                            "Take time for yourself".to_string(),
                            "Review family budget".to_string(),
                        ]
                    }),
                },
                Err(e) => {
                    tracing::warn!("Plan generation returned invalid JSON: {}", e);
                    Self::default_plan()
                }
            },
            Err(e) => {
                tracing::error!("Plan generation failed: {}", e);
                Self::default_plan()
            }
        }
    }

    fn default_plan() -> DailyPlanContent {
        DailyPlanContent {
            plan: "Focus on family well-being and financial stability today".to_string(),
            focus_areas: vec!["parenting".to_string(), "finances".to_string()],
            tips: vec![
                "Take time for yourself".to_string(),
                "Review family budget".to_string(),
                "Connect with your child".to_string(),
            ],
        }
    }

    /// 親向けチャット
    ///
    /// まず複雑度を評価し、スコア3以下はHaiku、4以上はSonnetを使う。
    pub async fn handle_chat(&self, message: &str, user_context: Option<&str>) -> ChatResponse {
        let complexity = self.evaluate_complexity(message).await;
        let tier = if complexity.complexity_score <= 3 {
            ModelTier::Haiku
        } else {
            ModelTier::Sonnet
        };

        let prompt = prompts::chat_prompt(message, user_context);

        match self.call_claude(&prompt, tier).await {
            Ok(response) => ChatResponse {
                response,
                model: tier.as_str().to_string(),
                complexity_score: complexity.complexity_score,
            },
            Err(e) => {
                tracing::error!("Chat handling failed: {}", e);
                Self::fallback_chat_response()
            }
        }
    }

    /// 子ども向けチャット（常にHaiku）
    pub async fn child_chat(&self, message: &str) -> String {
        let prompt = prompts::child_chat_prompt(message);

        match self.call_claude(&prompt, ModelTier::Haiku).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Child chat failed: {}", e);
                Self::fallback_chat_response().response
            }
        }
    }

    fn fallback_chat_response() -> ChatResponse {
        ChatResponse {
            response: "I apologize, but I'm having trouble processing your request right now. \
                       Please try again in a moment."
                .to_string(),
            model: ModelTier::Haiku.as_str().to_string(),
            complexity_score: 3,
        }
    }

    /// 子どものメッセージと親のチェックインからインサイトを生成（常にSonnet）
    pub async fn generate_child_insights(
        &self,
        child_messages: &[ChildMessage],
        parent_checkins: &[ParentCheckin],
    ) -> ChildInsightContent {
        let prompt = prompts::insights_prompt(child_messages, parent_checkins);

        match self.call_claude(&prompt, ModelTier::Sonnet).await {
            Ok(text) => match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(value) => ChildInsightContent {
                    summary: value["summary"]
                        .as_str()
                        .unwrap_or("Child appears to be doing well")
                        .to_string(),
                    emotional_state: value["emotionalState"]
                        .as_str()
                        .unwrap_or("Stable")
                        .to_string(),
                    concerns: string_array(&value["concerns"]).unwrap_or_default(),
                    recommendations: string_array(&value["recommendations"]).unwrap_or_default(),
                    suggested_actions: string_array(&value["suggestedActions"]).unwrap_or_default(),
                },
                Err(e) => {
                    tracing::warn!("Insight generation returned invalid JSON: {}", e);
                    Self::default_insights()
                }
            },
            Err(e) => {
                tracing::error!("Insight generation failed: {}", e);
                Self::default_insights()
            }
        }
    }

    fn default_insights() -> ChildInsightContent {
        ChildInsightContent {
            summary: "Unable to generate insights at this time".to_string(),
            emotional_state: "Unknown".to_string(),
            concerns: vec![],
            recommendations: vec!["Continue monitoring child's messages".to_string()],
            suggested_actions: vec!["Check in with your child".to_string()],
        }
    }

    /// Messages APIをリトライ付きで呼び出す
    ///
    /// # Returns
    /// * `Ok(String)` - 応答テキスト（トリム済み）
    /// * `Err(ApiError::AiUpstream)` - 全リトライ失敗
    pub async fn call_claude(&self, prompt: &str, tier: ModelTier) -> Result<String, ApiError> {
        let url = format!("{}/v1/messages", self.base_url);
        let payload = serde_json::json!({
            "model": tier.api_name(),
            "max_tokens": tier.max_tokens(),
            "messages": [{"role": "user", "content": prompt}],
        });

        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            match self.try_call(&url, &payload).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::warn!("AI API attempt {} failed: {}", attempt, e);
                    last_error = e;
                    if attempt < self.max_retries {
                        // 指数バックオフ（2^attempt秒）
                        tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
                    }
                }
            }
        }

        Err(ApiError::AiUpstream(format!(
            "AI API failed after {} attempts: {}",
            self.max_retries, last_error
        )))
    }

    async fn try_call(&self, url: &str, payload: &serde_json::Value) -> Result<String, String> {
        let response = self
            .http
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(payload)
            .send()
            .await
            .map_err(|e| format!("request error: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("API request failed: {}", status));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("invalid response body: {}", e))?;

        body["content"][0]["text"]
            .as_str()
            .map(|t| t.trim().to_string())
            .ok_or_else(|| "Invalid response format from AI API".to_string())
    }
}

fn string_array(value: &serde_json::Value) -> Option<Vec<String>> {
    value.as_array().map(|items| {
        items
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect()
    })
}
