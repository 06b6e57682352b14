//! 親向けAPI Contract Tests
//!
//! POST /api/v1/parent/{checkin,chat,goals},
//! GET /api/v1/parent/{plan,progress,insights,goals}

use crate::support::app::{create_test_app, create_test_app_with_ai};
use crate::support::http::{get, post_json, register_child, register_parent};
use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn messages_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "content": [{"type": "text", "text": text}],
    }))
}

async fn mock_ai(text: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(messages_response(text))
        .mount(&server)
        .await;
    server
}

// ---------------------------------------------------------------------------
// POST /api/v1/parent/checkin
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_checkin_created() {
    let ctx = create_test_app().await;
    let (token, _) = register_parent(&ctx.app, "p@example.com").await;

    let (status, body) = post_json(
        &ctx.app,
        "/api/v1/parent/checkin",
        Some(&token),
        &json!({
            "checkinType": "morning",
            "emotionalState": 7,
            "financialStress": 4,
            "notes": "slept well",
            "unexpectedExpenses": 12.5,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["checkin"]["emotionalState"], 7);
    assert_eq!(body["data"]["checkin"]["checkinType"], "morning");
    assert_eq!(body["data"]["checkin"]["notes"], "slept well");
}

/// 1-10範囲外は400
#[tokio::test]
async fn test_checkin_scale_out_of_range() {
    let ctx = create_test_app().await;
    let (token, _) = register_parent(&ctx.app, "p@example.com").await;

    let (status, _body) = post_json(
        &ctx.app,
        "/api/v1/parent/checkin",
        Some(&token),
        &json!({
            "checkinType": "evening",
            "emotionalState": 11,
            "financialStress": 4,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// 子どもアカウントは親ルートにアクセスできない
#[tokio::test]
async fn test_checkin_forbidden_for_child() {
    let ctx = create_test_app().await;
    let (_ptoken, parent_id) = register_parent(&ctx.app, "p@example.com").await;
    let (kid_token, _) = register_child(&ctx.app, "kid@example.com", &parent_id).await;

    let (status, _body) = post_json(
        &ctx.app,
        "/api/v1/parent/checkin",
        Some(&kid_token),
        &json!({
            "checkinType": "morning",
            "emotionalState": 5,
            "financialStress": 5,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

/// チェックインは5回/分でレート制限される
#[tokio::test]
async fn test_checkin_rate_limited_after_five() {
    let ctx = create_test_app().await;
    let (token, _) = register_parent(&ctx.app, "p@example.com").await;

    let payload = json!({
        "checkinType": "morning",
        "emotionalState": 5,
        "financialStress": 5,
    });

    for _ in 0..5 {
        let (status, _) =
            post_json(&ctx.app, "/api/v1/parent/checkin", Some(&token), &payload).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) =
        post_json(&ctx.app, "/api/v1/parent/checkin", Some(&token), &payload).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
}

// ---------------------------------------------------------------------------
// GET /api/v1/parent/plan
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_plan_generated_then_cached() {
    let server = mock_ai(
        r#"{"plan": "Review the budget together", "focusAreas": ["finances"], "tips": ["start small"]}"#,
    )
    .await;
    let ctx = create_test_app_with_ai(&server.uri()).await;
    let (token, _) = register_parent(&ctx.app, "p@example.com").await;

    let (status, body) = get(&ctx.app, "/api/v1/parent/plan?date=2026-08-25", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cached"], false);
    assert_eq!(body["data"]["date"], "2026-08-25");
    assert_eq!(body["data"]["plan"]["plan"], "Review the budget together");

    // 2回目は同じ内容がキャッシュから返る
    let (status, body) = get(&ctx.app, "/api/v1/parent/plan?date=2026-08-25", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cached"], true);
    assert_eq!(body["data"]["plan"]["plan"], "Review the budget together");
}

/// AI不達でも静的フォールバックのプランが返る
#[tokio::test]
async fn test_plan_falls_back_without_ai() {
    let ctx = create_test_app().await;
    let (token, _) = register_parent(&ctx.app, "p@example.com").await;

    let (status, body) = get(&ctx.app, "/api/v1/parent/plan", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["plan"]["plan"]
        .as_str()
        .unwrap()
        .contains("family well-being"));
}

/// 不正な日付形式は400
#[tokio::test]
async fn test_plan_invalid_date() {
    let ctx = create_test_app().await;
    let (token, _) = register_parent(&ctx.app, "p@example.com").await;

    let (status, _body) = get(&ctx.app, "/api/v1/parent/plan?date=08/25/2026", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// プランは3回/5分でレート制限される
#[tokio::test]
async fn test_plan_rate_limited_after_three() {
    let server = mock_ai(r#"{"plan": "p", "focusAreas": [], "tips": []}"#).await;
    let ctx = create_test_app_with_ai(&server.uri()).await;
    let (token, _) = register_parent(&ctx.app, "p@example.com").await;

    for _ in 0..3 {
        let (status, _) = get(&ctx.app, "/api/v1/parent/plan", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _body) = get(&ctx.app, "/api/v1/parent/plan", Some(&token)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

// ---------------------------------------------------------------------------
// POST /api/v1/parent/chat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_chat_returns_response_and_caches() {
    // 複雑度評価とチャット本体の両方に同じテキストが返る
    let server = mock_ai(r#"{"complexityScore": 2, "reasoning": "simple"}"#).await;
    let ctx = create_test_app_with_ai(&server.uri()).await;
    let (token, _) = register_parent(&ctx.app, "p@example.com").await;

    let (status, body) = post_json(
        &ctx.app,
        "/api/v1/parent/chat",
        Some(&token),
        &json!({"message": "How do I start an allowance?"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["model"], "haiku");
    assert_eq!(body["data"]["complexityScore"], 2);
    assert_eq!(body["data"]["cached"], false);

    // 同じメッセージはキャッシュヒット
    let (status, body) = post_json(
        &ctx.app,
        "/api/v1/parent/chat",
        Some(&token),
        &json!({"message": "How do I start an allowance?"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cached"], true);
}

/// AI不達時は謝罪フォールバックを返す（エラーにはしない）
#[tokio::test]
async fn test_chat_falls_back_without_ai() {
    let ctx = create_test_app().await;
    let (token, _) = register_parent(&ctx.app, "p@example.com").await;

    let (status, body) = post_json(
        &ctx.app,
        "/api/v1/parent/chat",
        Some(&token),
        &json!({"message": "help me"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["response"]
        .as_str()
        .unwrap()
        .contains("trouble processing"));
}

/// 空のメッセージは400
#[tokio::test]
async fn test_chat_empty_message_rejected() {
    let ctx = create_test_app().await;
    let (token, _) = register_parent(&ctx.app, "p@example.com").await;

    let (status, _body) = post_json(
        &ctx.app,
        "/api/v1/parent/chat",
        Some(&token),
        &json!({"message": ""}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// GET /api/v1/parent/progress
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_progress_includes_trends() {
    let ctx = create_test_app().await;
    let (token, _) = register_parent(&ctx.app, "p@example.com").await;

    for (emotional, stress) in [(4, 8), (7, 3)] {
        let (status, _) = post_json(
            &ctx.app,
            "/api/v1/parent/checkin",
            Some(&token),
            &json!({
                "checkinType": "morning",
                "emotionalState": emotional,
                "financialStress": stress,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = get(&ctx.app, "/api/v1/parent/progress", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["checkins"].as_array().unwrap().len(), 2);
    let emotional = body["data"]["trends"]["emotional"].as_array().unwrap();
    assert_eq!(emotional.len(), 2);
    // 推移は古い順
    assert_eq!(emotional[0]["value"], 4);
    assert_eq!(emotional[1]["value"], 7);
    assert_eq!(body["data"]["trends"]["financial"][0]["value"], 8);
}

// ---------------------------------------------------------------------------
// GET /api/v1/parent/insights
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_insights_generated_per_child() {
    let server = mock_ai(
        r#"{"summary": "Curious about saving", "emotionalState": "Positive", "concerns": [], "recommendations": ["keep answers simple"], "suggestedActions": ["talk at dinner"]}"#,
    )
    .await;
    let ctx = create_test_app_with_ai(&server.uri()).await;
    let (token, parent_id) = register_parent(&ctx.app, "p@example.com").await;
    let (_kid_token, kid_id) = register_child(&ctx.app, "kid@example.com", &parent_id).await;

    // 子どものメッセージを直接準備する
    let kid_uuid = kid_id.parse().unwrap();
    parently::db::child_messages::create(
        &ctx.db_pool,
        &ctx.cipher,
        kid_uuid,
        "why do we save money?",
        "Saving is like a piggy bank!",
    )
    .await
    .unwrap();

    let (status, body) = get(&ctx.app, "/api/v1/parent/insights", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    let entries = body["data"]["insights"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["childId"], kid_id);
    assert_eq!(entries[0]["cached"], false);
    assert_eq!(entries[0]["insights"]["summary"], "Curious about saving");

    // 2回目はキャッシュから
    let (_, body) = get(&ctx.app, "/api/v1/parent/insights", Some(&token)).await;
    assert_eq!(body["data"]["insights"][0]["cached"], true);
}

/// ログアウトで子どものインサイトキャッシュも破棄される
#[tokio::test]
async fn test_logout_clears_child_insights_cache() {
    let server = mock_ai(
        r#"{"summary": "Curious about saving", "emotionalState": "Positive", "concerns": [], "recommendations": [], "suggestedActions": []}"#,
    )
    .await;
    let ctx = create_test_app_with_ai(&server.uri()).await;
    let (token, parent_id) = register_parent(&ctx.app, "p@example.com").await;
    let (_kid_token, kid_id) = register_child(&ctx.app, "kid@example.com", &parent_id).await;

    let kid_uuid = kid_id.parse().unwrap();
    parently::db::child_messages::create(
        &ctx.db_pool,
        &ctx.cipher,
        kid_uuid,
        "why do we save money?",
        "Saving is like a piggy bank!",
    )
    .await
    .unwrap();

    let (_, body) = get(&ctx.app, "/api/v1/parent/insights", Some(&token)).await;
    assert_eq!(body["data"]["insights"][0]["cached"], false);

    let (status, _) =
        post_json(&ctx.app, "/api/v1/auth/logout", Some(&token), &json!({})).await;
    assert_eq!(status, StatusCode::OK);

    // キャッシュが消えているので再生成になる
    let (_, body) = get(&ctx.app, "/api/v1/parent/insights", Some(&token)).await;
    assert_eq!(body["data"]["insights"][0]["cached"], false);
}

/// メッセージのない子どもはスキップされる
#[tokio::test]
async fn test_insights_skips_children_without_messages() {
    let ctx = create_test_app().await;
    let (token, parent_id) = register_parent(&ctx.app, "p@example.com").await;
    register_child(&ctx.app, "kid@example.com", &parent_id).await;

    let (status, body) = get(&ctx.app, "/api/v1/parent/insights", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["insights"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// POST/GET /api/v1/parent/goals
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_goal_create_and_list() {
    let ctx = create_test_app().await;
    let (token, _) = register_parent(&ctx.app, "p@example.com").await;

    let (status, body) = post_json(
        &ctx.app,
        "/api/v1/parent/goals",
        Some(&token),
        &json!({
            "title": "Summer camp fund",
            "targetAmount": 500.0,
            "goalType": "activity",
            "targetDate": "2026-12-01",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["goal"]["currentAmount"], 0.0);

    let (status, body) = get(&ctx.app, "/api/v1/parent/goals", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let goals = body["data"]["goals"].as_array().unwrap();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0]["title"], "Summer camp fund");
}

/// 金額が正でなければ400
#[tokio::test]
async fn test_goal_rejects_non_positive_amount() {
    let ctx = create_test_app().await;
    let (token, _) = register_parent(&ctx.app, "p@example.com").await;

    let (status, _body) = post_json(
        &ctx.app,
        "/api/v1/parent/goals",
        Some(&token),
        &json!({
            "title": "Broken goal",
            "targetAmount": -10.0,
            "goalType": "savings",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
