//! リクエストボディ検証ヘルパー
//!
//! 各APIのDTOが`validate()`から呼び出す共通チェック。失敗は
//! すべて`ApiError::Validation`（400）になる。

use crate::common::error::ApiError;

/// メールアドレスの形式チェック
///
/// 厳密なRFC検証ではなく、`@`とドメインのドットの存在だけを見る。
pub fn validate_email(email: &str) -> Result<(), ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() || trimmed.len() > 254 {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }

    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.ends_with('.') {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }

    Ok(())
}

/// 文字列長の範囲チェック（文字数ベース）
pub fn validate_length(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ApiError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ApiError::Validation(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}

/// 1-10スケール値のチェック（感情状態、金銭ストレス）
pub fn validate_scale(field: &str, value: i64) -> Result<(), ApiError> {
    if !(1..=10).contains(&value) {
        return Err(ApiError::Validation(format!(
            "{} must be between 1 and 10",
            field
        )));
    }
    Ok(())
}

/// タスクポイントのチェック（1-100）
pub fn validate_task_points(points: i64) -> Result<(), ApiError> {
    if !(1..=100).contains(&points) {
        return Err(ApiError::Validation(
            "points must be between 1 and 100".to_string(),
        ));
    }
    Ok(())
}

/// 正の金額チェック
pub fn validate_positive_amount(field: &str, amount: f64) -> Result<(), ApiError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::Validation(format!(
            "{} must be a positive amount",
            field
        )));
    }
    Ok(())
}

/// ISO日付（YYYY-MM-DD）のチェック
pub fn validate_iso_date(field: &str, value: &str) -> Result<(), ApiError> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ApiError::Validation(format!("{} must be an ISO date (YYYY-MM-DD)", field))
    })?;
    Ok(())
}
