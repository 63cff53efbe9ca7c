//! Rule objects submitted by users when building a strategy.

use serde::{Deserialize, Serialize};

/// Comparison between an indicator and a threshold or another indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = ">", alias = "gt")]
    Gt,
    #[serde(rename = "<", alias = "lt")]
    Lt,
    #[serde(rename = ">=", alias = "gte")]
    Gte,
    #[serde(rename = "<=", alias = "lte")]
    Lte,
    #[serde(rename = "==", alias = "eq")]
    Eq,
    #[serde(rename = "crosses_above")]
    CrossesAbove,
    #[serde(rename = "crosses_below")]
    CrossesBelow,
}

impl Comparison {
    /// Python operator for the plain comparisons, `None` for crosses
    pub fn operator(&self) -> Option<&'static str> {
        match self {
            Comparison::Gt => Some(">"),
            Comparison::Lt => Some("<"),
            Comparison::Gte => Some(">="),
            Comparison::Lte => Some("<="),
            Comparison::Eq => Some("=="),
            Comparison::CrossesAbove | Comparison::CrossesBelow => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    #[serde(alias = "buy")]
    Entry,
    #[serde(alias = "sell")]
    Exit,
}

/// Reference to another indicator on the right-hand side of a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRef {
    pub indicator: String,
    #[serde(default)]
    pub period: Option<u32>,
}

/// A single condition, e.g. `RSI(14) < 30 => entry`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRule {
    pub indicator: String,
    #[serde(default)]
    pub period: Option<u32>,
    pub comparison: Comparison,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub compare_to: Option<IndicatorRef>,
    pub action: RuleAction,
}

impl StrategyRule {
    pub fn threshold(indicator: &str, period: u32, comparison: Comparison, value: f64, action: RuleAction) -> Self {
        Self {
            indicator: indicator.to_string(),
            period: Some(period),
            comparison,
            value: Some(value),
            compare_to: None,
            action,
        }
    }

    pub fn versus(
        indicator: &str,
        period: u32,
        comparison: Comparison,
        other: &str,
        other_period: u32,
        action: RuleAction,
    ) -> Self {
        Self {
            indicator: indicator.to_string(),
            period: Some(period),
            comparison,
            value: None,
            compare_to: Some(IndicatorRef {
                indicator: other.to_string(),
                period: Some(other_period),
            }),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_from_json() {
        let rule: StrategyRule = serde_json::from_value(json!({
            "indicator": "rsi",
            "period": 14,
            "comparison": "<",
            "value": 30,
            "action": "entry"
        }))
        .unwrap();
        assert_eq!(rule.comparison, Comparison::Lt);
        assert_eq!(rule.value, Some(30.0));
        assert_eq!(rule.action, RuleAction::Entry);
        assert!(rule.compare_to.is_none());
    }

    #[test]
    fn test_rule_aliases() {
        let rule: StrategyRule = serde_json::from_value(json!({
            "indicator": "EMA",
            "period": 9,
            "comparison": "crosses_above",
            "compare_to": { "indicator": "EMA", "period": 21 },
            "action": "buy"
        }))
        .unwrap();
        assert_eq!(rule.comparison, Comparison::CrossesAbove);
        assert_eq!(rule.action, RuleAction::Entry);
        assert_eq!(rule.compare_to.unwrap().period, Some(21));

        let gt: Comparison = serde_json::from_value(json!("gte")).unwrap();
        assert_eq!(gt, Comparison::Gte);
    }

    #[test]
    fn test_unknown_comparison_rejected() {
        let result: Result<Comparison, _> = serde_json::from_value(json!("!="));
        assert!(result.is_err());
    }
}
