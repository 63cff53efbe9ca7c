pub mod admin_service;
pub mod api_key_service;
pub mod dashboard_service;
pub mod franchise_service;
pub mod marketplace_service;
pub mod plan_service;
pub mod strategy_service;
pub mod support_service;
pub mod user_service;
pub mod wallet_service;

use shared::{AppError, AppResult};

/// Trimmed, non-empty text of at most `max_chars` characters
pub(crate) fn required_text(field: &str, value: &str, max_chars: usize) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    if value.chars().count() > max_chars {
        return Err(AppError::validation(format!(
            "{} must be at most {} characters",
            field, max_chars
        )));
    }
    Ok(value.to_string())
}

/// `required_text` that also refuses line breaks and other control characters
pub(crate) fn single_line_text(field: &str, value: &str, max_chars: usize) -> AppResult<String> {
    let value = required_text(field, value, max_chars)?;
    if value.chars().any(char::is_control) {
        return Err(AppError::validation(format!(
            "{} cannot contain line breaks or control characters",
            field
        )));
    }
    Ok(value)
}

/// Trimmed optional text; blank input becomes `None`
pub(crate) fn optional_text(field: &str, value: Option<&str>, max_chars: usize) -> AppResult<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => required_text(field, v, max_chars).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("name", "  RSI swing ", 100).unwrap(), "RSI swing");
        assert!(required_text("name", "   ", 100).is_err());
        assert!(required_text("name", &"x".repeat(101), 100).is_err());
        assert!(required_text("name", &"x".repeat(100), 100).is_ok());
    }

    #[test]
    fn test_single_line_text() {
        assert_eq!(single_line_text("name", " Dip buyer ", 100).unwrap(), "Dip buyer");
        assert!(single_line_text("name", "Dip\nimport os", 100).is_err());
        assert!(single_line_text("name", "Dip\rx", 100).is_err());
        assert!(single_line_text("name", "Dip\tbuyer", 100).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text("label", Some("  "), 10).unwrap(), None);
        assert_eq!(optional_text("label", Some(" main "), 10).unwrap(), Some("main".to_string()));
        assert_eq!(optional_text("label", None, 10).unwrap(), None);
    }
}
