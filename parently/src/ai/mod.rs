//! AIクライアント（Anthropic Messages APIプロキシ）
//!
//! 複雑度評価でモデル階層を選び、リトライ付きでMessages APIを呼ぶ。
//! 各操作は失敗時に静的フォールバックへ縮退する。

/// HTTPクライアントと各AI操作
pub mod client;

/// プロンプト組み立て
pub mod prompts;

/// モデル階層
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// 低コスト・低レイテンシ（複雑度3以下、子どもチャット）
    Haiku,
    /// 高品質（複雑度4以上、インサイト生成）
    Sonnet,
}

impl ModelTier {
    /// Messages APIに渡すモデル名
    pub fn api_name(&self) -> &'static str {
        match self {
            ModelTier::Haiku => "claude-3-haiku-20240307",
            ModelTier::Sonnet => "claude-3-sonnet-20240229",
        }
    }

    /// 応答の最大トークン数
    pub fn max_tokens(&self) -> u32 {
        match self {
            ModelTier::Haiku => 1000,
            ModelTier::Sonnet => 2000,
        }
    }

    /// DB・レスポンス用の短縮名
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Haiku => "haiku",
            ModelTier::Sonnet => "sonnet",
        }
    }
}
