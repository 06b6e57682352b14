// AI操作ごとのプロンプト組み立て

use crate::db::checkins::ParentCheckin;
use crate::db::child_messages::ChildMessage;

/// 複雑度評価プロンプト（1-5、JSON応答を要求）
pub fn complexity_prompt(message: &str) -> String {
    format!(
        r#"Evaluate the complexity of this parenting/financial question on a scale of 1-5:
1 = Simple factual question
2 = Basic advice needed
3 = Moderate complexity requiring context
4 = Complex situation requiring analysis
5 = Very complex requiring deep understanding

Question: "{}"

Respond with JSON format:
{{
  "complexityScore": number,
  "reasoning": "brief explanation"
}}"#,
        message
    )
}

/// デイリープラン生成プロンプト
pub fn plan_prompt(recent_checkins: &[ParentCheckin], current_goals: &[String]) -> String {
    let emotional: Vec<String> = recent_checkins
        .iter()
        .map(|c| format!("{}/10", c.emotional_state))
        .collect();
    let stress: Vec<String> = recent_checkins
        .iter()
        .map(|c| format!("{}/10", c.financial_stress))
        .collect();
    let goals = if current_goals.is_empty() {
        "None specified".to_string()
    } else {
        current_goals.join(", ")
    };

    format!(
        r#"As a parenting and family finance AI assistant, create a concise daily plan based on this context:

Recent emotional states: {}
Recent financial stress: {}
Current goals: {}

Create a brief, actionable plan with:
1. Main focus for today
2. 2-3 specific tips
3. One financial action item

Format as JSON:
{{
  "plan": "brief daily plan",
  "focusAreas": ["area1", "area2"],
  "tips": ["tip1", "tip2", "tip3"]
}}"#,
        emotional.join(", "),
        stress.join(", "),
        goals
    )
}

/// 親向けチャットプロンプト
pub fn chat_prompt(message: &str, user_context: Option<&str>) -> String {
    let context_line = user_context
        .map(|c| format!("Context: {}\n", c))
        .unwrap_or_default();

    format!(
        r#"You are Parently, an AI assistant for parents and family finances.
{}User message: "{}"

Provide a helpful, empathetic response that addresses parenting and/or financial concerns.
Keep it concise but thorough."#,
        context_line, message
    )
}

/// 子ども向けチャットプロンプト
pub fn child_chat_prompt(message: &str) -> String {
    format!(
        r#"You are Parently, a friendly AI assistant for children.
The child is asking: "{}"

Respond in a warm, encouraging, and age-appropriate way. Keep it simple and positive.
If they're asking about money or family, give simple, helpful advice.
Use emojis occasionally to make it friendly."#,
        message
    )
}

/// 子どもインサイト生成プロンプト
pub fn insights_prompt(
    child_messages: &[ChildMessage],
    parent_checkins: &[ParentCheckin],
) -> String {
    let messages: Vec<String> = child_messages
        .iter()
        .map(|m| format!("- \"{}\" ({})", m.message, m.created_at.to_rfc3339()))
        .collect();
    let checkins: Vec<String> = parent_checkins
        .iter()
        .map(|c| {
            format!(
                "- Emotional: {}/10, Financial stress: {}/10 ({})",
                c.emotional_state,
                c.financial_stress,
                c.created_at.to_rfc3339()
            )
        })
        .collect();

    format!(
        r#"Analyze this child-parent interaction data and provide insights for the parent:

Child's recent messages:
{}

Parent's recent check-ins:
{}

Provide insights in JSON format:
{{
  "summary": "brief summary of child's emotional state and concerns",
  "emotionalState": "overall emotional assessment",
  "concerns": ["concern1", "concern2"],
  "recommendations": ["recommendation1", "recommendation2"],
  "suggestedActions": ["action1", "action2"]
}}"#,
        messages.join("\n"),
        checkins.join("\n")
    )
}
